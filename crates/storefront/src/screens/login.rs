//! Login form.

use secrecy::{ExposeSecret, SecretString};

use crate::api::{ApiCall, ApiError, ApiReply, AuthOutcome};
use crate::navigation::{NavAction, Route};

use super::{Action, Block, Effect, Field, Screen, ScreenEvent, SessionOp, View, header, input};

pub struct LoginScreen {
    username: String,
    password: SecretString,
    error: Option<String>,
    pending: bool,
}

impl LoginScreen {
    #[must_use]
    pub fn new() -> Self {
        Self {
            username: String::new(),
            password: SecretString::from(String::new()),
            error: None,
            pending: false,
        }
    }

    fn submit(&mut self) -> Vec<Effect> {
        if self.pending {
            return Vec::new();
        }
        let username = self.username.trim();
        if username.is_empty() {
            self.error = Some("No username provided!".to_string());
            return Vec::new();
        }
        if self.password.expose_secret().is_empty() {
            self.error = Some("No password provided!".to_string());
            return Vec::new();
        }

        self.error = None;
        self.pending = true;
        vec![Effect::Api(ApiCall::Login {
            username: username.to_string(),
            password: self.password.clone(),
        })]
    }
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self::new()
    }
}

/// Effects for a finished login or signup request.
///
/// A token is persisted before the account screen replaces the form, so the
/// account screen's session read sees it.
pub(super) fn auth_effects(
    result: Result<AuthOutcome, ApiError>,
    error: &mut Option<String>,
) -> Vec<Effect> {
    match result {
        Ok(AuthOutcome::Authenticated(token)) => vec![
            Effect::Session(SessionOp::Store(token)),
            Effect::replace(Route::Account),
        ],
        Ok(AuthOutcome::Rejected(message)) => {
            *error = Some(message);
            Vec::new()
        }
        Err(e) => {
            *error = Some(e.to_string());
            Vec::new()
        }
    }
}

impl Screen for LoginScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Reply(ApiReply::Auth(result)) => {
                self.pending = false;
                auth_effects(result, &mut self.error)
            }
            ScreenEvent::Input(action) => match action {
                Action::SetField(Field::Username, value) => {
                    self.username = value;
                    Vec::new()
                }
                Action::SetField(Field::Password, value) => {
                    self.password = SecretString::from(value);
                    Vec::new()
                }
                Action::Submit => self.submit(),
                Action::SignUp => vec![Effect::navigate(Route::SignUp)],
                Action::Back => vec![Effect::Nav(NavAction::PopToTop)],
                other => header(other),
            },
            ScreenEvent::Mounted
            | ScreenEvent::Focused
            | ScreenEvent::ParamsChanged(_)
            | ScreenEvent::Session(_)
            | ScreenEvent::Reply(_) => Vec::new(),
        }
    }

    fn view(&self) -> View {
        let mut view = View::new("Login")
            .with(input(Field::Username, "Username", &self.username, None))
            .with(input(
                Field::Password,
                "Password",
                self.password.expose_secret(),
                None,
            ));
        if let Some(error) = &self.error {
            view.push(Block::Notice(error.clone()));
        }
        if self.pending {
            view.push(Block::Loading);
        } else {
            view.button("LOGIN", "submit");
        }
        view.text("Don't have an account?");
        view.button("Sign Up", "signup");
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::USER_NOT_FOUND;
    use crate::screens::testing::{calls, input, nav, set, token};

    fn filled() -> LoginScreen {
        let mut screen = LoginScreen::new();
        screen.handle(set(Field::Username, " shopper "));
        screen.handle(set(Field::Password, "hunter22"));
        screen
    }

    #[test]
    fn test_missing_fields_send_nothing() {
        let mut screen = LoginScreen::new();
        assert!(screen.handle(input(Action::Submit)).is_empty());
        assert!(screen.view().contains("No username provided!"));

        screen.handle(set(Field::Username, "shopper"));
        assert!(screen.handle(input(Action::Submit)).is_empty());
        assert!(screen.view().contains("No password provided!"));
    }

    #[test]
    fn test_submit_sends_trimmed_username() {
        let mut screen = filled();
        let effects = screen.handle(input(Action::Submit));
        let calls = calls(&effects);
        let [ApiCall::Login { username, .. }] = calls.as_slice() else {
            panic!("expected a login call, got {calls:?}");
        };
        assert_eq!(username, "shopper");
        assert!(screen.view().is_loading());
        assert!(!screen.view().contains("hunter22"));

        // Double submit while pending is ignored.
        assert!(screen.handle(input(Action::Submit)).is_empty());
    }

    #[test]
    fn test_success_stores_token_then_shows_account() {
        let mut screen = filled();
        screen.handle(input(Action::Submit));
        let effects = screen.handle(ScreenEvent::Reply(ApiReply::Auth(Ok(
            AuthOutcome::Authenticated(token()),
        ))));
        assert!(matches!(
            effects.as_slice(),
            [
                Effect::Session(SessionOp::Store(_)),
                Effect::Nav(NavAction::Replace(Route::Account))
            ]
        ));
    }

    #[test]
    fn test_rejection_is_shown() {
        let mut screen = filled();
        screen.handle(input(Action::Submit));
        let effects = screen.handle(ScreenEvent::Reply(ApiReply::Auth(Ok(
            AuthOutcome::Rejected(USER_NOT_FOUND.to_string()),
        ))));
        assert!(effects.is_empty());
        let view = screen.view();
        assert!(view.contains(USER_NOT_FOUND));
        assert!(!view.is_loading());
    }

    #[test]
    fn test_transport_error_is_shown() {
        let mut screen = filled();
        screen.handle(input(Action::Submit));
        screen.handle(ScreenEvent::Reply(ApiReply::Auth(Err(ApiError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        }))));
        assert!(screen.view().contains("bad gateway"));
    }

    #[test]
    fn test_navigation() {
        let mut screen = LoginScreen::new();
        let effects = screen.handle(input(Action::SignUp));
        assert_eq!(nav(&effects), Some(&NavAction::Navigate(Route::SignUp)));
        let effects = screen.handle(input(Action::Back));
        assert_eq!(nav(&effects), Some(&NavAction::PopToTop));
    }
}
