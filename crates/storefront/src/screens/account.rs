//! Account hub: addresses, credentials and logout.

use crate::api::ApiCall;
use crate::navigation::Route;
use crate::session::SessionState;

use super::{Action, Block, Effect, Screen, ScreenEvent, SessionOp, View, header, require_session};

pub struct AccountScreen {
    session: SessionState,
}

impl AccountScreen {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            session: SessionState::Unresolved,
        }
    }

    /// Clear local state first so nothing after this point sees the old
    /// token, then tell the backend.
    fn logout(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::Session(SessionOp::Clear)];
        if let Some(token) = self.session.token() {
            effects.push(Effect::Api(ApiCall::Logout {
                token: token.clone(),
            }));
        }
        effects.push(Effect::replace(Route::Login));
        effects
    }
}

impl Default for AccountScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for AccountScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Mounted | ScreenEvent::Focused => vec![Effect::read_session()],
            ScreenEvent::Session(session) => {
                self.session = session;
                require_session(&self.session)
            }
            ScreenEvent::Input(action) => match action {
                Action::EditAddresses if self.session.token().is_some() => {
                    vec![Effect::navigate(Route::SelectAddress { checkout: false })]
                }
                Action::EditCredentials if self.session.token().is_some() => {
                    vec![Effect::navigate(Route::SelectCredential)]
                }
                Action::Logout if self.session.is_resolved() => self.logout(),
                other => header(other),
            },
            ScreenEvent::ParamsChanged(_) | ScreenEvent::Reply(_) => Vec::new(),
        }
    }

    fn view(&self) -> View {
        let mut view = View::new("Account");
        if self.session.token().is_none() {
            view.push(Block::Loading);
            return view;
        }
        view.button("Edit Addresses", "addresses");
        view.button("Edit Credentials", "credentials");
        view.button("LOGOUT", "logout");
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::NavAction;
    use crate::screens::testing::{calls, input, logged_in, logged_out, nav, reads_session};

    #[test]
    fn test_anonymous_replaced_with_login() {
        let mut screen = AccountScreen::new();
        assert!(reads_session(&screen.handle(ScreenEvent::Mounted)));
        assert!(screen.view().is_loading());

        let effects = screen.handle(logged_out());
        assert_eq!(nav(&effects), Some(&NavAction::Replace(Route::Login)));
    }

    #[test]
    fn test_menu() {
        let mut screen = AccountScreen::new();
        assert!(screen.handle(logged_in()).is_empty());
        assert!(screen.view().contains("Edit Addresses"));

        let effects = screen.handle(input(Action::EditAddresses));
        assert_eq!(
            nav(&effects),
            Some(&NavAction::Navigate(Route::SelectAddress { checkout: false }))
        );
        let effects = screen.handle(input(Action::EditCredentials));
        assert_eq!(
            nav(&effects),
            Some(&NavAction::Navigate(Route::SelectCredential))
        );
    }

    #[test]
    fn test_logout_clears_then_notifies_then_redirects() {
        let mut screen = AccountScreen::new();
        screen.handle(logged_in());
        let effects = screen.handle(input(Action::Logout));

        assert!(matches!(
            effects.as_slice(),
            [
                Effect::Session(SessionOp::Clear),
                Effect::Api(ApiCall::Logout { .. }),
                Effect::Nav(NavAction::Replace(Route::Login)),
            ]
        ));
        assert_eq!(calls(&effects).len(), 1);
    }
}
