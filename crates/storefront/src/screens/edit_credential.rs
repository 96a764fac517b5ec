//! Change one credential.

use secrecy::{ExposeSecret, SecretString};

use capelli_core::CredentialKind;

use crate::api::{ApiCall, ApiReply, CredentialOutcome};
use crate::navigation::{NavAction, Route};
use crate::session::SessionState;

use super::{
    Action, Block, Effect, Field, Loadable, Screen, ScreenEvent, View, header, input,
    require_session,
};

pub struct EditCredentialScreen {
    kind: CredentialKind,
    session: SessionState,
    current: Loadable<String>,
    value: SecretString,
    confirmation: SecretString,
    error: Option<String>,
    saving: bool,
}

impl EditCredentialScreen {
    #[must_use]
    pub fn new(kind: CredentialKind) -> Self {
        Self {
            kind,
            session: SessionState::Unresolved,
            current: Loadable::Loading,
            value: SecretString::from(String::new()),
            confirmation: SecretString::from(String::new()),
            error: None,
            saving: false,
        }
    }

    /// The form fields for the new value and, where needed, its confirmation.
    const fn fields(kind: CredentialKind) -> (Field, Option<Field>) {
        match kind {
            CredentialKind::Username => (Field::Username, None),
            CredentialKind::Email => (Field::Email, Some(Field::ConfirmEmail)),
            CredentialKind::Password => (Field::Password, Some(Field::ConfirmPassword)),
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        let value = self.value.expose_secret();
        let confirmation = self.confirmation.expose_secret();
        match self.kind {
            CredentialKind::Username if value.is_empty() => Err("No Username provided!"),
            CredentialKind::Email if value.is_empty() => Err("No Email provided!"),
            CredentialKind::Email if value != confirmation => Err("Emails do not match!"),
            CredentialKind::Password if value.is_empty() => Err("No Password provided!"),
            CredentialKind::Password if value != confirmation => Err("Passwords do not match!"),
            _ => Ok(()),
        }
    }

    fn submit(&mut self) -> Vec<Effect> {
        if self.saving {
            return Vec::new();
        }
        let Some(token) = self.session.token().cloned() else {
            return Vec::new();
        };
        if let Err(message) = self.validate() {
            self.error = Some(message.to_string());
            return Vec::new();
        }

        self.error = None;
        self.saving = true;
        vec![Effect::Api(ApiCall::ChangeCredential {
            token,
            kind: self.kind,
            value: self.value.clone(),
        })]
    }
}

impl Screen for EditCredentialScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Mounted => vec![Effect::read_session()],
            ScreenEvent::ParamsChanged(Route::EditCredential(kind)) => {
                *self = Self::new(kind);
                vec![Effect::read_session()]
            }
            ScreenEvent::Session(session) => {
                self.session = session;
                let redirect = require_session(&self.session);
                if !redirect.is_empty() {
                    return redirect;
                }
                match self.session.token() {
                    Some(token) if self.kind.is_viewable() => {
                        vec![Effect::Api(ApiCall::GetCredential {
                            token: token.clone(),
                            kind: self.kind,
                        })]
                    }
                    _ => Vec::new(),
                }
            }
            ScreenEvent::Reply(ApiReply::Credential { kind, result }) if kind == self.kind => {
                self.current = result.into();
                Vec::new()
            }
            ScreenEvent::Reply(ApiReply::CredentialChanged(result)) => {
                self.saving = false;
                match result {
                    Ok(CredentialOutcome::Changed) => vec![Effect::Nav(NavAction::Back)],
                    Ok(CredentialOutcome::Rejected(message)) => {
                        self.error = Some(message);
                        Vec::new()
                    }
                    Err(e) => {
                        self.error = Some(e.to_string());
                        Vec::new()
                    }
                }
            }
            ScreenEvent::Input(action) => match action {
                Action::SetField(field, value) => {
                    let (primary, confirm) = Self::fields(self.kind);
                    if field == primary {
                        self.value = SecretString::from(value);
                    } else if Some(field) == confirm {
                        self.confirmation = SecretString::from(value);
                    }
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
        let mut view = View::new(format!("Edit {}", self.kind));

        if self.kind.is_viewable() {
            let current = match &self.current {
                Loadable::Loading => "Loading...".to_string(),
                Loadable::Loaded(value) => value.clone(),
                Loadable::Failed(message) => message.clone(),
            };
            view.text(format!("Current {}: {current}", self.kind));
        }

        let (primary, confirm) = Self::fields(self.kind);
        let new_label = match self.kind {
            CredentialKind::Email => "New Email",
            CredentialKind::Username => "New Username",
            CredentialKind::Password => "New Password",
        };
        view.push(input(primary, new_label, self.value.expose_secret(), None));
        if let Some(confirm) = confirm {
            let label = match self.kind {
                CredentialKind::Email => "Confirm New Email",
                _ => "Confirm New Password",
            };
            view.push(input(confirm, label, self.confirmation.expose_secret(), None));
        }

        if let Some(error) = &self.error {
            view.push(Block::Notice(error.clone()));
        }
        if self.saving {
            view.push(Block::Loading);
        } else {
            view.button("SAVE", "submit");
        }
        view
    }
}
