//! Screens.
//!
//! Every screen is a plain state machine. It receives [`ScreenEvent`]s,
//! answers with [`Effect`]s for the runtime to perform, and describes itself
//! as a [`View`]. Screens never perform I/O, so each one is unit-tested by
//! feeding events and inspecting effects.
//!
//! # Lifecycle
//!
//! 1. `Mounted` when pushed
//! 2. `Session`, `Reply` as effects complete
//! 3. `ParamsChanged` and/or `Focused` when revealed again
//! 4. `Input` for shopper actions

mod account;
mod address_form;
mod addresses;
mod cart_page;
mod checkout;
mod credentials;
mod edit_credential;
mod home;
mod login;
mod product;
mod search;
mod signup;

pub use account::AccountScreen;
pub use address_form::AddressFormScreen;
pub use addresses::AddressListScreen;
pub use cart_page::CartScreen;
pub use checkout::CheckoutScreen;
pub use credentials::CredentialListScreen;
pub use edit_credential::EditCredentialScreen;
pub use home::HomeScreen;
pub use login::LoginScreen;
pub use product::ProductScreen;
pub use search::SearchScreen;
pub use signup::SignupScreen;

use core::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use capelli_core::{Banner, CatalogEntry, CredentialKind, Product};

use crate::api::{ApiCall, ApiError, ApiReply};
use crate::config::{MutationPolicy, StorefrontSettings};
use crate::navigation::{NavAction, ProductRef, Route, SearchQuery};
use crate::session::{SessionState, SessionToken};

// =============================================================================
// Events and effects
// =============================================================================

/// Something that happened to a screen.
#[derive(Debug)]
pub enum ScreenEvent {
    /// The screen was pushed onto the stack.
    Mounted,
    /// The screen became the top again.
    Focused,
    /// `Navigate` reached this screen with different parameters.
    ParamsChanged(Route),
    /// A session read completed.
    Session(SessionState),
    /// An API call issued by this screen completed.
    Reply(ApiReply),
    /// The shopper did something.
    Input(Action),
}

/// A local session storage operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOp {
    /// Read the token; answered with [`ScreenEvent::Session`].
    Read,
    /// Persist a token.
    Store(SessionToken),
    /// Remove every stored key.
    Clear,
}

/// Work a screen asks the runtime to do.
#[derive(Debug)]
pub enum Effect {
    Session(SessionOp),
    Api(ApiCall),
    Nav(NavAction),
}

impl Effect {
    #[must_use]
    pub const fn navigate(route: Route) -> Self {
        Self::Nav(NavAction::Navigate(route))
    }

    #[must_use]
    pub const fn replace(route: Route) -> Self {
        Self::Nav(NavAction::Replace(route))
    }

    #[must_use]
    pub const fn read_session() -> Self {
        Self::Session(SessionOp::Read)
    }
}

/// Input fields across all forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Email,
    ConfirmEmail,
    Username,
    Password,
    ConfirmPassword,
    Line1,
    Line2,
    State,
    Zip,
    Quantity,
}

impl Field {
    pub const ALL: [Self; 10] = [
        Self::Email,
        Self::ConfirmEmail,
        Self::Username,
        Self::Password,
        Self::ConfirmPassword,
        Self::Line1,
        Self::Line2,
        Self::State,
        Self::Zip,
        Self::Quantity,
    ];

    /// Name used in `set <field> <value>`.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::ConfirmEmail => "confirm-email",
            Self::Username => "username",
            Self::Password => "password",
            Self::ConfirmPassword => "confirm-password",
            Self::Line1 => "line1",
            Self::Line2 => "line2",
            Self::State => "state",
            Self::Zip => "zip",
            Self::Quantity => "quantity",
        }
    }

    /// Whether values are hidden when rendered.
    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::Password | Self::ConfirmPassword)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown field: {s}"))
    }
}

/// A shopper action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Header
    Back,
    Home,
    Cart,
    Account,

    Retry,
    SelectCategory(String),
    Search(String),
    OpenProduct(String),
    AddToCart,
    SetLineQuantity { title: String, input: String },
    RemoveLine(String),
    Checkout,
    ChooseShipping,
    SubmitOrder,
    SelectAddress(usize),
    EditAddress(usize),
    RemoveAddress(usize),
    NewAddress,
    EditAddresses,
    EditCredentials,
    SelectCredential(CredentialKind),
    Logout,
    Login,
    SignUp,
    SetField(Field, String),
    Submit,
}

// =============================================================================
// Views
// =============================================================================

/// One piece of a rendered screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text(String),
    /// Activity indicator.
    Loading,
    /// A recoverable error; `retry` offers the retry command.
    Error { message: String, retry: bool },
    /// A passing notice, e.g. a cart divergence warning.
    Notice(String),
    /// Category menu.
    Menu(Vec<String>),
    /// A list row.
    Item {
        label: String,
        detail: String,
        note: Option<String>,
    },
    Input {
        field: Field,
        label: &'static str,
        value: String,
        error: Option<String>,
    },
    Button { label: String, command: String },
}

/// What a screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl View {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn text(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Text(text.into()));
    }

    pub fn button(&mut self, label: impl Into<String>, command: impl Into<String>) {
        self.blocks.push(Block::Button {
            label: label.into(),
            command: command.into(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>, retry: bool) {
        self.blocks.push(Block::Error {
            message: message.into(),
            retry,
        });
    }

    /// Whether any visible text contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.title.contains(needle)
            || self.blocks.iter().any(|block| match block {
                Block::Text(s) | Block::Notice(s) => s.contains(needle),
                Block::Error { message, .. } => message.contains(needle),
                Block::Menu(items) => items.iter().any(|s| s.contains(needle)),
                Block::Item {
                    label,
                    detail,
                    note,
                } => {
                    label.contains(needle)
                        || detail.contains(needle)
                        || note.as_deref().is_some_and(|s| s.contains(needle))
                }
                Block::Input { value, error, .. } => {
                    value.contains(needle) || error.as_deref().is_some_and(|s| s.contains(needle))
                }
                Block::Button { label, .. } => label.contains(needle),
                Block::Loading => false,
            })
    }

    /// Whether the view is showing an activity indicator.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.blocks.contains(&Block::Loading)
    }
}

/// Build an input block, masking secrets.
fn input(field: Field, label: &'static str, value: &str, error: Option<String>) -> Block {
    let value = if field.is_secret() {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    Block::Input {
        field,
        label,
        value,
        error,
    }
}

// =============================================================================
// Shared state
// =============================================================================

/// Remote data a screen is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Loadable<T> {
    #[default]
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Loadable<T> {
    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Loading | Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl<T> From<Result<T, ApiError>> for Loadable<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// Storefront data every screen may render.
#[derive(Debug, Clone)]
pub struct ScreenContext {
    pub categories: Arc<[String]>,
    pub banner: Option<Banner>,
    pub mutation_policy: MutationPolicy,
}

impl From<&StorefrontSettings> for ScreenContext {
    fn from(settings: &StorefrontSettings) -> Self {
        Self {
            categories: settings.categories.iter().cloned().collect(),
            banner: settings.banner.clone(),
            mutation_policy: settings.mutation_policy,
        }
    }
}

impl Default for ScreenContext {
    fn default() -> Self {
        Self::from(&StorefrontSettings::default())
    }
}

impl ScreenContext {
    /// Label of the home entry in the category menu.
    #[must_use]
    pub fn home_label(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }
}

// =============================================================================
// Screen trait
// =============================================================================

/// A mounted screen.
pub trait Screen {
    /// React to an event.
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect>;

    /// Describe the current state.
    fn view(&self) -> View;
}

/// Build the screen for `route`.
#[must_use]
pub fn build(route: &Route, ctx: &ScreenContext) -> Box<dyn Screen> {
    match route {
        Route::Home => Box::new(HomeScreen::new(ctx.clone())),
        Route::Search(query) => Box::new(SearchScreen::new(ctx.clone(), query.clone())),
        Route::Product(product) => Box::new(ProductScreen::new(product.clone())),
        Route::Cart => Box::new(CartScreen::new(ctx.mutation_policy)),
        Route::Checkout { address_index } => {
            Box::new(CheckoutScreen::new(ctx.mutation_policy, *address_index))
        }
        Route::Account => Box::new(AccountScreen::new()),
        Route::SelectAddress { checkout } => Box::new(AddressListScreen::new(*checkout)),
        Route::AddAddress => Box::new(AddressFormScreen::add()),
        Route::EditAddress { index, address } => {
            Box::new(AddressFormScreen::edit(*index, address.clone()))
        }
        Route::SelectCredential => Box::new(CredentialListScreen),
        Route::EditCredential(kind) => Box::new(EditCredentialScreen::new(*kind)),
        Route::Login => Box::new(LoginScreen::new()),
        Route::SignUp => Box::new(SignupScreen::new()),
    }
}

/// Header navigation shared by every screen.
///
/// Returns the effects for header actions and logs anything else as not
/// available on the current screen.
fn header(action: Action) -> Vec<Effect> {
    match action {
        Action::Back => vec![Effect::Nav(NavAction::Back)],
        Action::Home => vec![Effect::replace(Route::Home)],
        Action::Cart => vec![Effect::navigate(Route::Cart)],
        Action::Account => vec![Effect::navigate(Route::Account)],
        other => {
            debug!(action = ?other, "Action not available on this screen");
            Vec::new()
        }
    }
}

/// Redirect to login when the session resolved absent.
fn require_session(session: &SessionState) -> Vec<Effect> {
    if matches!(session, SessionState::Anonymous) {
        vec![Effect::replace(Route::Login)]
    } else {
        Vec::new()
    }
}

// =============================================================================
// Catalog helpers
// =============================================================================

/// Route for a category menu selection.
fn category_route(ctx: &ScreenContext, label: &str) -> Route {
    if ctx
        .home_label()
        .is_some_and(|home| home.eq_ignore_ascii_case(label.trim()))
    {
        Route::Home
    } else {
        Route::Search(SearchQuery::Category(label.trim().to_string()))
    }
}

/// Route for a search box submission; blank queries go nowhere.
fn search_route(query: &str) -> Option<Route> {
    let query = query.trim();
    (!query.is_empty()).then(|| Route::Search(SearchQuery::Text(query.to_string())))
}

/// Find a product by exact title, falling back to the first partial match.
fn find_product<'a>(
    products: impl Iterator<Item = &'a Product> + Clone,
    title: &str,
) -> Option<&'a Product> {
    let title = title.trim();
    let mut partial = products.clone();
    let mut exact = products;
    exact
        .find(|product| product.title.eq_ignore_ascii_case(title))
        .or_else(|| partial.find(|product| product.title_matches(title)))
}

fn product_item(product: &Product) -> Block {
    Block::Item {
        label: product.title.clone(),
        detail: product.price.to_string(),
        note: None,
    }
}

fn open_product(product: &Product) -> Effect {
    Effect::navigate(Route::Product(ProductRef::from(product)))
}

fn products_of(entries: &[CatalogEntry]) -> impl Iterator<Item = &Product> + Clone {
    entries.iter().filter_map(CatalogEntry::as_product)
}
