//! Account creation form.

use secrecy::{ExposeSecret, SecretString};

use crate::api::{ApiCall, ApiReply};
use crate::navigation::Route;

use super::login::auth_effects;
use super::{Action, Block, Effect, Field, Screen, ScreenEvent, View, header, input};

pub struct SignupScreen {
    email: String,
    confirm_email: String,
    username: String,
    password: SecretString,
    confirm_password: SecretString,
    error: Option<String>,
    pending: bool,
}

impl SignupScreen {
    #[must_use]
    pub fn new() -> Self {
        Self {
            email: String::new(),
            confirm_email: String::new(),
            username: String::new(),
            password: SecretString::from(String::new()),
            confirm_password: SecretString::from(String::new()),
            error: None,
            pending: false,
        }
    }

    /// Shown under the confirmation field once it has been typed into.
    fn email_hint(&self) -> Option<String> {
        (!self.confirm_email.is_empty() && self.confirm_email != self.email)
            .then(|| "Emails do not match!".to_string())
    }

    fn password_hint(&self) -> Option<String> {
        let confirm = self.confirm_password.expose_secret();
        (!confirm.is_empty() && confirm != self.password.expose_secret())
            .then(|| "Passwords do not match!".to_string())
    }

    /// First failing check, in form order.
    fn validate(&self) -> Result<(), &'static str> {
        let password = self.password.expose_secret();
        let confirm_password = self.confirm_password.expose_secret();
        if self.email.trim().is_empty() {
            Err("No email provided!")
        } else if self.confirm_email.trim().is_empty() {
            Err("No confirmation email provided!")
        } else if self.username.trim().is_empty() {
            Err("No username provided!")
        } else if password.is_empty() {
            Err("No password provided!")
        } else if confirm_password.is_empty() {
            Err("No confirmation password provided!")
        } else if self.email.trim() != self.confirm_email.trim() {
            Err("Emails do not match!")
        } else if password != confirm_password {
            Err("Passwords do not match!")
        } else {
            Ok(())
        }
    }

    fn submit(&mut self) -> Vec<Effect> {
        if self.pending {
            return Vec::new();
        }
        if let Err(message) = self.validate() {
            self.error = Some(message.to_string());
            return Vec::new();
        }

        self.error = None;
        self.pending = true;
        vec![Effect::Api(ApiCall::Signup {
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })]
    }
}

impl Default for SignupScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for SignupScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Reply(ApiReply::Auth(result)) => {
                self.pending = false;
                auth_effects(result, &mut self.error)
            }
            ScreenEvent::Input(action) => match action {
                Action::SetField(field, value) => {
                    match field {
                        Field::Email => self.email = value,
                        Field::ConfirmEmail => self.confirm_email = value,
                        Field::Username => self.username = value,
                        Field::Password => self.password = SecretString::from(value),
                        Field::ConfirmPassword => {
                            self.confirm_password = SecretString::from(value);
                        }
                        _ => {}
                    }
                    Vec::new()
                }
                Action::Submit => self.submit(),
                Action::Login => vec![Effect::navigate(Route::Login)],
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
        let mut view = View::new("Sign Up")
            .with(input(Field::Email, "Email", &self.email, None))
            .with(input(
                Field::ConfirmEmail,
                "Confirm Email",
                &self.confirm_email,
                self.email_hint(),
            ))
            .with(input(Field::Username, "Username", &self.username, None))
            .with(input(
                Field::Password,
                "Password",
                self.password.expose_secret(),
                None,
            ))
            .with(input(
                Field::ConfirmPassword,
                "Confirm Password",
                self.confirm_password.expose_secret(),
                self.password_hint(),
            ));
        if let Some(error) = &self.error {
            view.push(Block::Notice(error.clone()));
        }
        if self.pending {
            view.push(Block::Loading);
        } else {
            view.button("SIGN UP", "submit");
        }
        view.text("Already have an account?");
        view.button("Login", "login");
        view
    }
}
