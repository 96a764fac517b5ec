//! Checkout: editable cart lines plus a shipping address.

use capelli_core::Address;

use crate::api::{ApiCall, ApiReply};
use crate::cart::{CartCache, CartPhase};
use crate::config::MutationPolicy;
use crate::navigation::{NavAction, Route};
use crate::session::SessionState;

use super::cart_page::{apply_cart_reply, apply_line_action, push_lines, push_notice};
use super::{Action, Block, Effect, Loadable, Screen, ScreenEvent, View, header};

pub struct CheckoutScreen {
    cart: CartCache,
    address_index: usize,
    addresses: Loadable<Vec<Address>>,
    address_generation: u64,
    message: Option<String>,
}

impl CheckoutScreen {
    #[must_use]
    pub fn new(policy: MutationPolicy, address_index: usize) -> Self {
        Self {
            cart: CartCache::new(policy),
            address_index,
            addresses: Loadable::Loading,
            address_generation: 0,
            message: None,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartCache {
        &self.cart
    }

    /// The address at the route's index, once addresses are loaded.
    #[must_use]
    pub fn shipping_address(&self) -> Option<&Address> {
        self.addresses.loaded()?.get(self.address_index)
    }

    fn fetch_addresses(&mut self) -> Option<Effect> {
        let token = self.cart.session().token()?.clone();
        self.address_generation += 1;
        self.addresses = Loadable::Loading;
        Some(Effect::Api(ApiCall::GetAddresses {
            token,
            generation: self.address_generation,
        }))
    }

    fn refresh(&mut self) -> Vec<Effect> {
        let cart = self.cart.refresh().map(Effect::Api);
        cart.into_iter().chain(self.fetch_addresses()).collect()
    }

    fn choose_shipping(&self) -> Vec<Effect> {
        match self.addresses.loaded() {
            Some(addresses) if addresses.is_empty() => vec![Effect::navigate(Route::AddAddress)],
            Some(_) => vec![Effect::navigate(Route::SelectAddress { checkout: true })],
            None => Vec::new(),
        }
    }

    fn submit_order(&mut self) -> Vec<Effect> {
        if self.cart.phase() != &CartPhase::Loaded || self.cart.is_empty() {
            self.message = Some("Nothing in Cart".to_string());
            return Vec::new();
        }
        if self.shipping_address().is_none() {
            self.message = Some("No shipping address selected!".to_string());
            return Vec::new();
        }
        tracing::info!(
            lines = self.cart.lines().len(),
            subtotal = %self.cart.subtotal(),
            "Order submitted"
        );
        vec![Effect::Nav(NavAction::Reset(Route::Home))]
    }
}

impl Screen for CheckoutScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Mounted | ScreenEvent::Focused => vec![Effect::read_session()],
            ScreenEvent::ParamsChanged(Route::Checkout { address_index }) => {
                self.address_index = address_index;
                Vec::new()
            }
            ScreenEvent::ParamsChanged(_) => Vec::new(),
            ScreenEvent::Session(session) => {
                if session == SessionState::Anonymous {
                    self.cart.on_session(session);
                    return vec![Effect::replace(Route::Login)];
                }
                let cart = self.cart.on_session(session).map(Effect::Api);
                cart.into_iter().chain(self.fetch_addresses()).collect()
            }
            ScreenEvent::Reply(reply) => {
                if let Err(ApiReply::Addresses { generation, result }) =
                    apply_cart_reply(&mut self.cart, reply)
                    && generation == self.address_generation
                {
                    self.addresses = result.into();
                }
                Vec::new()
            }
            ScreenEvent::Input(action) => {
                self.message = None;
                match apply_line_action(&mut self.cart, action) {
                    Ok(effects) => effects,
                    Err(Action::Retry) => self.refresh(),
                    Err(Action::ChooseShipping) => self.choose_shipping(),
                    Err(Action::SubmitOrder) => self.submit_order(),
                    Err(other) => header(other),
                }
            }
        }
    }

    fn view(&self) -> View {
        let mut view = View::new("Checkout");

        match self.cart.phase() {
            CartPhase::Unresolved | CartPhase::Anonymous | CartPhase::Loading => {
                view.push(Block::Loading);
                return view;
            }
            CartPhase::Failed(message) => {
                view.error(message.clone(), true);
                push_notice(&mut view, &self.cart);
            }
            CartPhase::Loaded if self.cart.is_empty() => view.text("Nothing in Cart"),
            CartPhase::Loaded => push_lines(&mut view, &self.cart),
        }

        view.text("Shipping Address");
        match &self.addresses {
            Loadable::Loading => view.text("Loading..."),
            Loadable::Failed(message) => view.error(message.clone(), true),
            Loadable::Loaded(addresses) if addresses.is_empty() => {
                view.button("Add Address", "ship");
            }
            Loadable::Loaded(addresses) => {
                if let Some(address) = addresses.get(self.address_index) {
                    view.text(address.to_string());
                    view.button("Change Address", "ship");
                } else {
                    view.button("Choose Address", "ship");
                }
            }
        }

        if let Some(message) = &self.message {
            view.push(Block::Notice(message.clone()));
        }
        view.button("Submit Order", "order");
        view
    }
}
