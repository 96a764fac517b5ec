//! Add or edit one address.

use capelli_core::{Address, UsState};

use crate::api::{ApiCall, ApiReply};
use crate::navigation::{NavAction, Route};
use crate::session::SessionState;

use super::{Action, Block, Effect, Field, Screen, ScreenEvent, View, header, input, require_session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Add,
    Edit(usize),
}

pub struct AddressFormScreen {
    mode: Mode,
    session: SessionState,
    line1: String,
    line2: String,
    state: UsState,
    zip_code: String,
    error: Option<String>,
    saving: bool,
}

impl AddressFormScreen {
    /// Empty form; the state picker starts at the first state.
    #[must_use]
    pub fn add() -> Self {
        Self {
            mode: Mode::Add,
            session: SessionState::Unresolved,
            line1: String::new(),
            line2: String::new(),
            state: UsState::default(),
            zip_code: String::new(),
            error: None,
            saving: false,
        }
    }

    /// Form prefilled with the address at `index`.
    #[must_use]
    pub fn edit(index: usize, address: Address) -> Self {
        Self {
            mode: Mode::Edit(index),
            line1: address.line1,
            line2: address.line2,
            state: address.state,
            zip_code: address.zip_code,
            ..Self::add()
        }
    }

    fn set(&mut self, field: Field, value: String) {
        self.error = None;
        match field {
            Field::Line1 => self.line1 = value,
            Field::Line2 => self.line2 = value,
            Field::Zip => self.zip_code = value,
            Field::State => match value.parse::<UsState>() {
                Ok(state) => self.state = state,
                Err(e) => self.error = Some(e.to_string()),
            },
            _ => {}
        }
    }

    fn validate(&self) -> Result<Address, &'static str> {
        if self.line1.trim().is_empty() {
            return Err("No address line 1 provided!");
        }
        if self.zip_code.trim().is_empty() {
            return Err("No zip code provided!");
        }
        Ok(Address {
            line1: self.line1.trim().to_string(),
            line2: self.line2.trim().to_string(),
            state: self.state,
            zip_code: self.zip_code.trim().to_string(),
        })
    }

    fn submit(&mut self) -> Vec<Effect> {
        if self.saving {
            return Vec::new();
        }
        let Some(token) = self.session.token().cloned() else {
            return Vec::new();
        };
        let address = match self.validate() {
            Ok(address) => address,
            Err(message) => {
                self.error = Some(message.to_string());
                return Vec::new();
            }
        };

        self.saving = true;
        let call = match self.mode {
            Mode::Add => ApiCall::AddAddress { token, address },
            Mode::Edit(index) => ApiCall::ChangeAddress {
                token,
                index,
                address,
            },
        };
        vec![Effect::Api(call)]
    }
}

impl Screen for AddressFormScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Mounted => vec![Effect::read_session()],
            ScreenEvent::ParamsChanged(Route::EditAddress { index, address }) => {
                *self = Self {
                    session: self.session.clone(),
                    ..Self::edit(index, address)
                };
                Vec::new()
            }
            ScreenEvent::Session(session) => {
                self.session = session;
                require_session(&self.session)
            }
            ScreenEvent::Reply(ApiReply::AddressSaved(result)) => {
                self.saving = false;
                match result {
                    Ok(()) => vec![Effect::Nav(NavAction::Back)],
                    Err(e) => {
                        self.error = Some(e.to_string());
                        Vec::new()
                    }
                }
            }
            ScreenEvent::Input(action) => match action {
                Action::SetField(field, value) => {
                    self.set(field, value);
                    Vec::new()
                }
                Action::Submit => self.submit(),
                other => header(other),
            },
            ScreenEvent::Focused | ScreenEvent::ParamsChanged(_) | ScreenEvent::Reply(_) => {
                Vec::new()
            }
        }
    }

    fn view(&self) -> View {
        let title = match self.mode {
            Mode::Add => "Add Address",
            Mode::Edit(_) => "Edit Address",
        };
        let mut view = View::new(title);
        view.push(input(Field::Line1, "Address Line 1", &self.line1, None));
        view.push(input(Field::Line2, "Address Line 2", &self.line2, None));
        view.push(input(Field::State, "State", self.state.code(), None));
        view.push(input(Field::Zip, "Zip Code", &self.zip_code, None));

        if let Some(error) = &self.error {
            view.push(Block::Notice(error.clone()));
        }
        if self.saving {
            view.push(Block::Loading);
        } else {
            let label = match self.mode {
                Mode::Add => "ADD",
                Mode::Edit(_) => "SAVE",
            };
            view.button(label, "submit");
        }
        view
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::screens::testing::{calls, input, logged_in, logged_out, nav, set};

    fn filled() -> AddressFormScreen {
        let mut screen = AddressFormScreen::add();
        screen.handle(ScreenEvent::Mounted);
        screen.handle(logged_in());
        screen.handle(set(Field::Line1, "1 Main St"));
        screen.handle(set(Field::Zip, "73301"));
        screen
    }

    #[test]
    fn test_anonymous_redirects() {
        let mut screen = AddressFormScreen::add();
        let effects = screen.handle(logged_out());
        assert_eq!(nav(&effects), Some(&NavAction::Replace(Route::Login)));
    }

    #[test]
    fn test_default_state_is_first() {
        let screen = AddressFormScreen::add();
        assert!(screen.view().contains("AL"));
    }

    #[test]
    fn test_required_fields() {
        let mut screen = AddressFormScreen::add();
        screen.handle(logged_in());
        assert!(screen.handle(input(Action::Submit)).is_empty());
        assert!(screen.view().contains("No address line 1 provided!"));

        screen.handle(set(Field::Line1, "1 Main St"));
        assert!(screen.handle(input(Action::Submit)).is_empty());
        assert!(screen.view().contains("No zip code provided!"));
    }

    #[test]
    fn test_invalid_state_is_inline() {
        let mut screen = filled();
        screen.handle(set(Field::State, "QQ"));
        assert!(screen.view().contains("unknown state code"));
        screen.handle(set(Field::State, "tx"));
        assert!(screen.view().contains("TX"));
    }

    #[test]
    fn test_add_then_back() {
        let mut screen = filled();
        screen.handle(set(Field::State, "TX"));
        let effects = screen.handle(input(Action::Submit));
        let calls = calls(&effects);
        let [ApiCall::AddAddress { address, .. }] = calls.as_slice() else {
            panic!("expected add address");
        };
        assert_eq!(address.to_record(), "1 Main St~~TX~73301");
        assert!(screen.view().is_loading());

        let effects = screen.handle(ScreenEvent::Reply(ApiReply::AddressSaved(Ok(()))));
        assert_eq!(nav(&effects), Some(&NavAction::Back));
    }

    #[test]
    fn test_edit_sends_index() {
        let existing = Address::parse_record("9 Elm~Unit 4~WA~98101").unwrap();
        let mut screen = AddressFormScreen::edit(2, existing);
        screen.handle(logged_in());
        assert!(screen.view().contains("Unit 4"));

        screen.handle(set(Field::Line2, ""));
        let effects = screen.handle(input(Action::Submit));
        assert!(matches!(
            calls(&effects)[..],
            [ApiCall::ChangeAddress { index: 2, .. }]
        ));
    }

    #[test]
    fn test_failure_stays() {
        let mut screen = filled();
        screen.handle(input(Action::Submit));
        let effects = screen.handle(ScreenEvent::Reply(ApiReply::AddressSaved(Err(
            ApiError::Rejected("User not found!".to_string()),
        ))));
        assert!(effects.is_empty());
        assert!(screen.view().contains("User not found!"));
    }
}
