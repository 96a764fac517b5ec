//! Screen runtime.
//!
//! [`App`] owns the navigation stack and performs the effects screens ask
//! for. Session operations are awaited in place; API calls run concurrently
//! and their replies are routed back to the screen that issued them by
//! [`ScreenId`]. A reply whose screen has been unmounted is dropped.
//!
//! Everything runs on one thread. Screens are driven strictly one event at a
//! time, so a screen never observes a half-applied effect.

use std::collections::VecDeque;

use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tracing::{debug, info, instrument};

use crate::api::{ApiCall, ApiReply, StorefrontApi};
use crate::error::{add_breadcrumb, report};
use crate::navigation::{Focus, NavAction, NavStack, Route, ScreenId};
use crate::screens::{self, Action, Effect, Screen, ScreenContext, ScreenEvent, SessionOp, View};
use crate::session::{SessionState, SessionStore};

type PendingReply = LocalBoxFuture<'static, (ScreenId, ApiReply)>;

/// The running storefront.
pub struct App<A, S> {
    api: A,
    session: S,
    ctx: ScreenContext,
    stack: NavStack<Box<dyn Screen>>,
    in_flight: FuturesUnordered<PendingReply>,
    queue: VecDeque<(ScreenId, ScreenEvent)>,
}

impl<A, S> App<A, S>
where
    A: StorefrontApi + Clone + 'static,
    S: SessionStore,
{
    pub fn new(api: A, session: S, ctx: ScreenContext) -> Self {
        Self {
            api,
            session,
            ctx,
            stack: NavStack::new(),
            in_flight: FuturesUnordered::new(),
            queue: VecDeque::new(),
        }
    }

    /// Mount the home screen. Requests it issues are left in flight.
    pub async fn start(&mut self) {
        self.navigate(NavAction::Reset(Route::Home));
        self.drain().await;
    }

    /// Hand a shopper action to the top screen.
    #[instrument(skip(self))]
    pub async fn dispatch(&mut self, action: Action) {
        let Some(top) = self.stack.top() else {
            debug!("No screen mounted");
            return;
        };
        self.queue.push_back((top.id, ScreenEvent::Input(action)));
        self.drain().await;
    }

    /// Wait for one in-flight reply and deliver it.
    ///
    /// Returns `false` when nothing was in flight.
    pub async fn step(&mut self) -> bool {
        let Some((id, reply)) = self.in_flight.next().await else {
            return false;
        };
        if let Some(error) = reply.error() {
            if error.is_fault() {
                report(error, "Backend request failed");
            }
        }
        self.queue.push_back((id, ScreenEvent::Reply(reply)));
        self.drain().await;
        true
    }

    /// Deliver replies until no request is in flight.
    pub async fn settle(&mut self) {
        self.drain().await;
        while self.step().await {}
    }

    /// What the top screen shows.
    #[must_use]
    pub fn view(&self) -> Option<View> {
        self.stack.top().map(|entry| entry.screen.view())
    }

    #[must_use]
    pub fn route(&self) -> Option<&Route> {
        self.stack.top().map(|entry| &entry.route)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Routes from bottom to top.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.stack.routes()
    }

    /// Number of requests still in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Deliver queued events until the queue is empty.
    async fn drain(&mut self) {
        while let Some((id, event)) = self.queue.pop_front() {
            let Some(entry) = self.stack.get_mut(id) else {
                debug!(screen = %id, ?event, "Dropping event for unmounted screen");
                continue;
            };
            let effects = entry.screen.handle(event);
            for effect in effects {
                self.perform(id, effect).await;
            }
        }
    }

    async fn perform(&mut self, id: ScreenId, effect: Effect) {
        match effect {
            Effect::Session(op) => self.session_op(id, op).await,
            Effect::Api(call) => self.send(id, call),
            Effect::Nav(action) => self.navigate(action),
        }
    }

    async fn session_op(&mut self, id: ScreenId, op: SessionOp) {
        match op {
            SessionOp::Read => {
                let token = match self.session.load().await {
                    Ok(token) => token,
                    Err(e) => {
                        report(&e, "Session read failed; continuing logged out");
                        None
                    }
                };
                self.queue
                    .push_back((id, ScreenEvent::Session(SessionState::resolved(token))));
            }
            SessionOp::Store(token) => {
                if let Err(e) = self.session.store(&token).await {
                    report(&e, "Session write failed");
                }
            }
            SessionOp::Clear => {
                if let Err(e) = self.session.clear().await {
                    report(&e, "Session clear failed");
                }
            }
        }
    }

    fn send(&self, id: ScreenId, call: ApiCall) {
        debug!(screen = %id, call = call.name(), "Sending request");
        let api = self.api.clone();
        self.in_flight
            .push(async move { (id, call.execute(&api).await) }.boxed_local());
    }

    fn navigate(&mut self, action: NavAction) {
        let message = describe(&action);
        let ctx = &self.ctx;
        let transition = self.stack.apply(action, |route| screens::build(route, ctx));

        let depth = self.stack.depth().to_string();
        add_breadcrumb("navigation", &message, Some(&[("depth", depth.as_str())]));
        info!(depth = self.stack.depth(), removed = transition.removed.len(), "{message}");

        match transition.focus {
            Focus::Mounted(id) => self.queue.push_back((id, ScreenEvent::Mounted)),
            Focus::Revealed {
                id,
                params,
                refocused,
            } => {
                if let Some(route) = params {
                    self.queue.push_back((id, ScreenEvent::ParamsChanged(route)));
                }
                if refocused {
                    self.queue.push_back((id, ScreenEvent::Focused));
                }
            }
            Focus::Unchanged => {}
        }
    }
}

fn describe(action: &NavAction) -> String {
    match action {
        NavAction::Navigate(route) => format!("Navigate {route}"),
        NavAction::Replace(route) => format!("Replace {route}"),
        NavAction::Reset(route) => format!("Reset {route}"),
        NavAction::Back => "Back".to_string(),
        NavAction::PopToTop => "Pop to top".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use secrecy::SecretString;

    use capelli_core::{
        Address, CartLine, CatalogEntry, CredentialKind, Price, Product, Quantity, UsState,
    };

    use super::*;
    use crate::api::{ApiError, AuthOutcome, CredentialOutcome, NewCartItem};
    use crate::screens::Field;
    use crate::session::{MemorySessionStore, SessionToken};

    const TOKEN: &str = "0123456789abcdef0123456789abcdef";

    #[derive(Default)]
    struct StubState {
        cart: Vec<CartLine>,
        addresses: Vec<Address>,
        calls: Vec<&'static str>,
    }

    /// In-memory backend with one registered user.
    #[derive(Clone, Default)]
    struct StubApi(Rc<RefCell<StubState>>);

    impl StubApi {
        fn calls(&self) -> Vec<&'static str> {
            self.0.borrow().calls.clone()
        }

        fn record(&self, name: &'static str) {
            self.0.borrow_mut().calls.push(name);
        }
    }

    fn clipper() -> Product {
        Product {
            title: "Wahl Magic Clip".to_string(),
            image: "https://img/clip.png".to_string(),
            category: "Clippers".to_string(),
            price: Price::parse("124.99").unwrap(),
        }
    }

    impl StorefrontApi for StubApi {
        async fn products(&self) -> Result<Vec<CatalogEntry>, ApiError> {
            self.record("products");
            Ok(vec![CatalogEntry::Product(clipper())])
        }

        async fn signup(
            &self,
            _email: &str,
            _username: &str,
            _password: &SecretString,
        ) -> Result<AuthOutcome, ApiError> {
            self.record("signup");
            Ok(AuthOutcome::Authenticated(SessionToken::new(TOKEN)))
        }

        async fn login(
            &self,
            username: &str,
            _password: &SecretString,
        ) -> Result<AuthOutcome, ApiError> {
            self.record("login");
            if username == "shopper" {
                Ok(AuthOutcome::Authenticated(SessionToken::new(TOKEN)))
            } else {
                Ok(AuthOutcome::Rejected("User not found!".to_string()))
            }
        }

        async fn logout(&self, _token: &SessionToken) -> Result<(), ApiError> {
            self.record("logout");
            Ok(())
        }

        async fn add_to_cart(&self, _token: &SessionToken, item: &NewCartItem) -> Result<(), ApiError> {
            self.record("add_to_cart");
            self.0.borrow_mut().cart.push(CartLine {
                title: item.title.clone(),
                image: item.image.clone(),
                price: item.price,
                quantity: item.quantity,
            });
            Ok(())
        }

        async fn cart(&self, _token: &SessionToken) -> Result<Vec<CartLine>, ApiError> {
            self.record("cart");
            Ok(self.0.borrow().cart.clone())
        }

        async fn update_cart_quantity(
            &self,
            _token: &SessionToken,
            _title: &str,
            _quantity: Quantity,
        ) -> Result<(), ApiError> {
            self.record("update_cart_quantity");
            Ok(())
        }

        async fn delete_cart_line(&self, _token: &SessionToken, _title: &str) -> Result<(), ApiError> {
            self.record("delete_cart_line");
            Ok(())
        }

        async fn addresses(&self, _token: &SessionToken) -> Result<Vec<Address>, ApiError> {
            self.record("addresses");
            Ok(self.0.borrow().addresses.clone())
        }

        async fn add_address(&self, _token: &SessionToken, address: &Address) -> Result<(), ApiError> {
            self.record("add_address");
            self.0.borrow_mut().addresses.push(address.clone());
            Ok(())
        }

        async fn change_address(
            &self,
            _token: &SessionToken,
            _index: usize,
            _address: &Address,
        ) -> Result<(), ApiError> {
            self.record("change_address");
            Ok(())
        }

        async fn delete_address(&self, _token: &SessionToken, _index: usize) -> Result<(), ApiError> {
            self.record("delete_address");
            Ok(())
        }

        async fn username(&self, _token: &SessionToken) -> Result<String, ApiError> {
            self.record("username");
            Ok("shopper".to_string())
        }

        async fn email(&self, _token: &SessionToken) -> Result<String, ApiError> {
            self.record("email");
            Ok("shopper@example.com".to_string())
        }

        async fn change_credential(
            &self,
            _token: &SessionToken,
            _kind: CredentialKind,
            _value: &SecretString,
        ) -> Result<CredentialOutcome, ApiError> {
            self.record("change_credential");
            Ok(CredentialOutcome::Changed)
        }
    }

    async fn started(session: MemorySessionStore) -> (App<StubApi, MemorySessionStore>, StubApi) {
        let api = StubApi::default();
        let mut app = App::new(api.clone(), session, ScreenContext::default());
        app.start().await;
        app.settle().await;
        (app, api)
    }

    fn route_names<A, S>(app: &App<A, S>) -> Vec<&'static str>
    where
        A: StorefrontApi + Clone + 'static,
        S: SessionStore,
    {
        app.routes().map(Route::name).collect()
    }

    #[tokio::test]
    async fn test_start_loads_home() {
        let (app, api) = started(MemorySessionStore::new()).await;
        assert_eq!(route_names(&app), vec!["Home"]);
        assert_eq!(api.calls(), vec!["products"]);
        assert!(app.view().unwrap().contains("Wahl Magic Clip"));
        assert_eq!(app.pending(), 0);
    }

    #[tokio::test]
    async fn test_login_then_add_to_cart() {
        let session = MemorySessionStore::new();
        let (mut app, api) = started(session.clone()).await;

        app.dispatch(Action::OpenProduct("magic clip".to_string())).await;
        app.settle().await;
        assert_eq!(app.route().map(Route::name), Some("Product"));

        // Anonymous add goes to login.
        app.dispatch(Action::AddToCart).await;
        assert_eq!(app.route(), Some(&Route::Login));

        app.dispatch(Action::SetField(Field::Username, "shopper".to_string())).await;
        app.dispatch(Action::SetField(Field::Password, "pw".to_string())).await;
        app.dispatch(Action::Submit).await;
        app.settle().await;
        assert_eq!(route_names(&app), vec!["Home", "Product", "Account"]);
        assert_eq!(session.load().await.unwrap().unwrap().expose(), TOKEN);

        app.dispatch(Action::Back).await;
        app.settle().await;
        assert_eq!(app.route().map(Route::name), Some("Product"));
        app.dispatch(Action::AddToCart).await;
        app.settle().await;
        assert!(app.view().unwrap().contains("View in Cart"));

        app.dispatch(Action::AddToCart).await;
        app.settle().await;
        assert_eq!(app.route(), Some(&Route::Cart));
        assert!(app.view().unwrap().contains("Wahl Magic Clip"));
        assert!(api.calls().contains(&"add_to_cart"));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let session = MemorySessionStore::with_token(&SessionToken::new(TOKEN));
        let (mut app, api) = started(session.clone()).await;

        app.dispatch(Action::Account).await;
        app.settle().await;
        assert_eq!(app.route(), Some(&Route::Account));

        app.dispatch(Action::Logout).await;
        app.settle().await;
        assert_eq!(app.route(), Some(&Route::Login));
        assert!(session.is_empty().await);
        assert!(api.calls().contains(&"logout"));
    }

    #[tokio::test]
    async fn test_reply_for_popped_screen_is_dropped() {
        let session = MemorySessionStore::with_token(&SessionToken::new(TOKEN));
        let (mut app, api) = started(session).await;

        app.dispatch(Action::Cart).await;
        assert_eq!(app.pending(), 1);
        app.dispatch(Action::Back).await;
        app.settle().await;

        assert_eq!(route_names(&app), vec!["Home"]);
        assert_eq!(api.calls(), vec!["products", "cart"]);
    }

    #[tokio::test]
    async fn test_add_address_then_select_for_checkout() {
        let session = MemorySessionStore::with_token(&SessionToken::new(TOKEN));
        let (mut app, api) = started(session).await;
        api.0.borrow_mut().cart.push(CartLine {
            title: clipper().title,
            image: clipper().image,
            price: clipper().price,
            quantity: Quantity::ONE,
        });

        app.dispatch(Action::Cart).await;
        app.settle().await;
        app.dispatch(Action::Checkout).await;
        app.settle().await;
        app.dispatch(Action::ChooseShipping).await;
        app.settle().await;
        assert_eq!(app.route(), Some(&Route::AddAddress));

        app.dispatch(Action::SetField(Field::Line1, "1 Main St".to_string())).await;
        app.dispatch(Action::SetField(Field::State, "NY".to_string())).await;
        app.dispatch(Action::SetField(Field::Zip, "10001".to_string())).await;
        app.dispatch(Action::Submit).await;
        app.settle().await;

        assert_eq!(route_names(&app), vec!["Home", "Cart", "Checkout"]);
        assert_eq!(
            api.0.borrow().addresses.first().map(|a| a.state),
            Some(UsState::NY)
        );
        let view = app.view().unwrap();
        assert!(view.contains("1 Main St"));
        assert!(view.contains("Change Address"));
    }
}
