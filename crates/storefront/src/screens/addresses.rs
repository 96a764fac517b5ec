//! Saved address list, in manage or checkout mode.
//!
//! Addresses are identified by position only, so after any delete the list
//! is refetched, and no index-based action is accepted while a delete is in
//! flight.

use capelli_core::Address;

use crate::api::{ApiCall, ApiReply};
use crate::navigation::Route;
use crate::session::SessionState;

use super::{Action, Block, Effect, Loadable, Screen, ScreenEvent, View, header, require_session};

pub struct AddressListScreen {
    checkout: bool,
    session: SessionState,
    addresses: Loadable<Vec<Address>>,
    generation: u64,
    deleting: Option<usize>,
    message: Option<String>,
}

impl AddressListScreen {
    #[must_use]
    pub const fn new(checkout: bool) -> Self {
        Self {
            checkout,
            session: SessionState::Unresolved,
            addresses: Loadable::Loading,
            generation: 0,
            deleting: None,
            message: None,
        }
    }

    #[must_use]
    pub const fn addresses(&self) -> Option<&Vec<Address>> {
        self.addresses.loaded()
    }

    #[must_use]
    pub const fn is_deleting(&self) -> bool {
        self.deleting.is_some()
    }

    fn fetch(&mut self) -> Vec<Effect> {
        let Some(token) = self.session.token().cloned() else {
            return Vec::new();
        };
        self.generation += 1;
        self.addresses = Loadable::Loading;
        vec![Effect::Api(ApiCall::GetAddresses {
            token,
            generation: self.generation,
        })]
    }

    /// The address at `index`, if index-based actions are allowed now.
    fn pick(&mut self, index: usize) -> Option<Address> {
        if self.deleting.is_some() {
            self.message = Some("Please wait until the address is removed.".to_string());
            return None;
        }
        let address = self.addresses.loaded()?.get(index).cloned();
        if address.is_none() {
            self.message = Some(format!("No address at position {index}"));
        }
        address
    }

    fn select(&mut self, index: usize) -> Vec<Effect> {
        let Some(address) = self.pick(index) else {
            return Vec::new();
        };
        let route = if self.checkout {
            Route::Checkout {
                address_index: index,
            }
        } else {
            Route::EditAddress { index, address }
        };
        vec![Effect::navigate(route)]
    }

    fn edit(&mut self, index: usize) -> Vec<Effect> {
        self.pick(index)
            .map(|address| Effect::navigate(Route::EditAddress { index, address }))
            .into_iter()
            .collect()
    }

    fn remove(&mut self, index: usize) -> Vec<Effect> {
        if self.checkout {
            return Vec::new();
        }
        let Some(token) = self.session.token().cloned() else {
            return Vec::new();
        };
        if self.pick(index).is_none() {
            return Vec::new();
        }
        self.deleting = Some(index);
        vec![Effect::Api(ApiCall::DeleteAddress { token, index })]
    }
}

impl Screen for AddressListScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Mounted | ScreenEvent::Focused => vec![Effect::read_session()],
            ScreenEvent::ParamsChanged(Route::SelectAddress { checkout }) => {
                self.checkout = checkout;
                Vec::new()
            }
            ScreenEvent::ParamsChanged(_) => Vec::new(),
            ScreenEvent::Session(session) => {
                self.session = session;
                let redirect = require_session(&self.session);
                if redirect.is_empty() { self.fetch() } else { redirect }
            }
            ScreenEvent::Reply(ApiReply::Addresses { generation, result }) => {
                if generation == self.generation {
                    self.addresses = result.into();
                }
                Vec::new()
            }
            ScreenEvent::Reply(ApiReply::AddressDeleted { index, result }) => {
                self.deleting = None;
                if let Err(e) = result {
                    self.message = Some(format!("Could not remove address {index}: {e}"));
                }
                self.fetch()
            }
            ScreenEvent::Reply(_) => Vec::new(),
            ScreenEvent::Input(action) => {
                self.message = None;
                match action {
                    Action::SelectAddress(index) => self.select(index),
                    Action::EditAddress(index) => self.edit(index),
                    Action::RemoveAddress(index) => self.remove(index),
                    Action::NewAddress if self.session.token().is_some() => {
                        vec![Effect::navigate(Route::AddAddress)]
                    }
                    Action::Retry if self.addresses.is_failed() => self.fetch(),
                    other => header(other),
                }
            }
        }
    }

    fn view(&self) -> View {
        let mut view = View::new("Addresses");

        match &self.addresses {
            Loadable::Loading => view.push(Block::Loading),
            Loadable::Failed(message) => view.error(message.clone(), true),
            Loadable::Loaded(addresses) if addresses.is_empty() => view.text("No Addresses"),
            Loadable::Loaded(addresses) => {
                let secondary = if self.checkout { "Edit" } else { "Remove" };
                for (index, address) in addresses.iter().enumerate() {
                    let note = if self.deleting == Some(index) {
                        "Removing...".to_string()
                    } else {
                        secondary.to_string()
                    };
                    view.push(Block::Item {
                        label: format!("{index}: {}", address.line1),
                        detail: address.to_string(),
                        note: Some(note),
                    });
                }
            }
        }

        if let Some(message) = &self.message {
            view.push(Block::Notice(message.clone()));
        }
        view.button("New Address", "new-address");
        view
    }
}
