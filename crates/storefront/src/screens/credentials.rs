//! Credential picker.

use capelli_core::CredentialKind;

use crate::navigation::Route;

use super::{Action, Effect, Screen, ScreenEvent, View, header};

pub struct CredentialListScreen;

impl Screen for CredentialListScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Input(Action::SelectCredential(kind)) => {
                vec![Effect::navigate(Route::EditCredential(kind))]
            }
            ScreenEvent::Input(other) => header(other),
            _ => Vec::new(),
        }
    }

    fn view(&self) -> View {
        let mut view = View::new("Select Credential");
        for kind in CredentialKind::ALL {
            view.button(
                kind.as_str(),
                format!("credential {}", kind.as_str().to_lowercase()),
            );
        }
        view
    }
}
