//! Navigation stack.
//!
//! Routes are typed values with their parameters inline. The stack follows
//! the usual mobile stack-navigator rules:
//!
//! - `Navigate` pops back to an existing screen of the same kind (handing it
//!   the new parameters), or pushes a new screen if none exists
//! - `Replace` swaps the top screen for a new one
//! - `Back` pops the top screen
//! - `PopToTop` pops everything above the root
//! - `Reset` discards the whole stack
//!
//! A screen that becomes the top again after others were popped above it is
//! *revealed* and receives a focus event.

use core::fmt;
use core::mem;

use capelli_core::{Address, CartLine, CredentialKind, Price, Product};

/// What the search screen was opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// A category menu label.
    Category(String),
    /// Free text from the search box.
    Text(String),
}

impl SearchQuery {
    /// Whether `product` belongs in the results. Banners never match.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::Category(category) => product.in_category(category),
            Self::Text(text) => product.title_matches(text),
        }
    }
}

/// Product data carried to the product screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRef {
    pub title: String,
    pub image: String,
    pub price: Price,
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            image: product.image.clone(),
            price: product.price,
        }
    }
}

impl From<&CartLine> for ProductRef {
    fn from(line: &CartLine) -> Self {
        Self {
            title: line.title.clone(),
            image: line.image.clone(),
            price: line.price,
        }
    }
}

/// A screen and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Search(SearchQuery),
    Product(ProductRef),
    Cart,
    Checkout {
        /// Position of the selected shipping address.
        address_index: usize,
    },
    Account,
    SelectAddress {
        /// Picking an address for checkout rather than managing the list.
        checkout: bool,
    },
    AddAddress,
    EditAddress {
        index: usize,
        address: Address,
    },
    SelectCredential,
    EditCredential(CredentialKind),
    Login,
    SignUp,
}

impl Route {
    /// Whether two routes are the same screen kind, ignoring parameters.
    #[must_use]
    pub fn same_kind(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Screen name for logs and breadcrumbs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Search(_) => "SearchAndCategories",
            Self::Product(_) => "ProductPage",
            Self::Cart => "CartPage",
            Self::Checkout { .. } => "CheckoutPage",
            Self::Account => "Account",
            Self::SelectAddress { .. } => "SelectAddress",
            Self::AddAddress => "AddAddress",
            Self::EditAddress { .. } => "EditAddress",
            Self::SelectCredential => "SelectCredential",
            Self::EditCredential(_) => "EditCredential",
            Self::Login => "Login",
            Self::SignUp => "SignUp",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
    Navigate(Route),
    Replace(Route),
    Back,
    PopToTop,
    Reset(Route),
}

/// Identity of one mounted screen instance.
///
/// Ids are never reused, so a reply addressed to a popped screen can never
/// reach a later screen of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenId(u64);

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A mounted screen.
#[derive(Debug)]
pub struct Entry<T> {
    pub id: ScreenId,
    pub route: Route,
    pub screen: T,
}

/// What happened to the top of the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    /// A new screen was mounted.
    Mounted(ScreenId),
    /// An existing screen became (or stayed) the top.
    Revealed {
        id: ScreenId,
        /// New parameters, when `Navigate` changed them.
        params: Option<Route>,
        /// Whether the screen was covered before this transition.
        refocused: bool,
    },
    /// Nothing changed (e.g. `Back` on the root screen).
    Unchanged,
}

/// Result of applying a [`NavAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub focus: Focus,
    /// Screens that were unmounted, top first.
    pub removed: Vec<ScreenId>,
}

/// The screen stack. Generic over the screen type so the rules can be
/// tested without real screens.
#[derive(Debug)]
pub struct NavStack<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> Default for NavStack<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> NavStack<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mounted screens.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn top(&self) -> Option<&Entry<T>> {
        self.entries.last()
    }

    /// Look up a mounted screen by id.
    pub fn get_mut(&mut self, id: ScreenId) -> Option<&mut Entry<T>> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ScreenId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Routes from bottom to top.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.entries.iter().map(|entry| &entry.route)
    }

    /// Apply `action`, building new screens with `build`.
    pub fn apply(&mut self, action: NavAction, build: impl FnOnce(&Route) -> T) -> Transition {
        match action {
            NavAction::Navigate(route) => self.navigate(route, build),
            NavAction::Replace(route) => {
                let removed = self.entries.pop().map(|entry| entry.id).into_iter().collect();
                let id = self.push(route, build);
                Transition {
                    focus: Focus::Mounted(id),
                    removed,
                }
            }
            NavAction::Back => {
                if self.entries.len() <= 1 {
                    return Self::unchanged();
                }
                let removed = self.truncate(self.entries.len() - 1);
                self.reveal(removed)
            }
            NavAction::PopToTop => {
                if self.entries.len() <= 1 {
                    return Self::unchanged();
                }
                let removed = self.truncate(1);
                self.reveal(removed)
            }
            NavAction::Reset(route) => {
                let removed = self.truncate(0);
                let id = self.push(route, build);
                Transition {
                    focus: Focus::Mounted(id),
                    removed,
                }
            }
        }
    }

    fn navigate(&mut self, route: Route, build: impl FnOnce(&Route) -> T) -> Transition {
        let Some(position) = self.entries.iter().rposition(|entry| entry.route.same_kind(&route))
        else {
            let id = self.push(route, build);
            return Transition {
                focus: Focus::Mounted(id),
                removed: Vec::new(),
            };
        };

        let refocused = position + 1 < self.entries.len();
        let removed = self.truncate(position + 1);
        let Some(entry) = self.entries.last_mut() else {
            return Self::unchanged();
        };
        let params = (entry.route != route).then(|| {
            entry.route = route.clone();
            route
        });

        Transition {
            focus: Focus::Revealed {
                id: entry.id,
                params,
                refocused,
            },
            removed,
        }
    }

    fn push(&mut self, route: Route, build: impl FnOnce(&Route) -> T) -> ScreenId {
        let id = ScreenId(self.next_id);
        self.next_id += 1;
        let screen = build(&route);
        self.entries.push(Entry { id, route, screen });
        id
    }

    /// Keep the bottom `len` entries; return removed ids, top first.
    fn truncate(&mut self, len: usize) -> Vec<ScreenId> {
        let mut removed = Vec::new();
        while self.entries.len() > len {
            if let Some(entry) = self.entries.pop() {
                removed.push(entry.id);
            }
        }
        removed
    }

    fn reveal(&self, removed: Vec<ScreenId>) -> Transition {
        let focus = self.entries.last().map_or(Focus::Unchanged, |entry| Focus::Revealed {
            id: entry.id,
            params: None,
            refocused: true,
        });
        Transition { focus, removed }
    }

    const fn unchanged() -> Transition {
        Transition {
            focus: Focus::Unchanged,
            removed: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stack(routes: &[Route]) -> NavStack<()> {
        let mut stack = NavStack::new();
        for route in routes {
            stack.apply(NavAction::Navigate(route.clone()), |_| ());
        }
        stack
    }

    fn names(stack: &NavStack<()>) -> Vec<&'static str> {
        stack.routes().map(Route::name).collect()
    }

    #[test]
    fn test_navigate_pushes_new_kinds() {
        let stack = stack(&[Route::Home, Route::Cart, Route::Account]);
        assert_eq!(names(&stack), vec!["Home", "CartPage", "Account"]);
    }

    #[test]
    fn test_navigate_pops_back_to_existing_kind_with_params() {
        let mut stack = stack(&[
            Route::Home,
            Route::Cart,
            Route::Checkout { address_index: 0 },
            Route::SelectAddress { checkout: true },
        ]);
        let checkout_id = stack.entries.get(2).unwrap().id;

        let transition = stack.apply(NavAction::Navigate(Route::Checkout { address_index: 2 }), |_| ());

        assert_eq!(names(&stack), vec!["Home", "CartPage", "CheckoutPage"]);
        assert_eq!(transition.removed.len(), 1);
        assert_eq!(
            transition.focus,
            Focus::Revealed {
                id: checkout_id,
                params: Some(Route::Checkout { address_index: 2 }),
                refocused: true,
            }
        );
        assert_eq!(stack.top().unwrap().route, Route::Checkout { address_index: 2 });
    }

    #[test]
    fn test_navigate_to_top_with_same_params_is_quiet() {
        let mut stack = stack(&[Route::Home, Route::Cart]);
        let transition = stack.apply(NavAction::Navigate(Route::Cart), |_| ());
        assert!(matches!(
            transition.focus,
            Focus::Revealed {
                params: None,
                refocused: false,
                ..
            }
        ));
        assert!(transition.removed.is_empty());
    }

    #[test]
    fn test_replace_and_back() {
        let mut stack = stack(&[Route::Home, Route::Account]);
        let account_id = stack.top().unwrap().id;

        let transition = stack.apply(NavAction::Replace(Route::Login), |_| ());
        assert_eq!(names(&stack), vec!["Home", "Login"]);
        assert_eq!(transition.removed, vec![account_id]);
        assert!(!stack.contains(account_id));

        let transition = stack.apply(NavAction::Back, |_| ());
        assert_eq!(names(&stack), vec!["Home"]);
        assert!(matches!(transition.focus, Focus::Revealed { refocused: true, .. }));

        let transition = stack.apply(NavAction::Back, |_| ());
        assert_eq!(transition.focus, Focus::Unchanged);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut stack = stack(&[Route::Home, Route::Cart]);
        let first_cart = stack.top().unwrap().id;
        stack.apply(NavAction::Back, |_| ());
        stack.apply(NavAction::Navigate(Route::Cart), |_| ());
        assert_ne!(stack.top().unwrap().id, first_cart);
    }

    #[test]
    fn test_pop_to_top_and_reset() {
        let mut stack = stack(&[Route::Home, Route::Account, Route::SelectCredential]);
        let transition = stack.apply(NavAction::PopToTop, |_| ());
        assert_eq!(names(&stack), vec!["Home"]);
        assert_eq!(transition.removed.len(), 2);

        let mut stack = self::stack(&[Route::Home, Route::Cart, Route::Checkout { address_index: 0 }]);
        let transition = stack.apply(NavAction::Reset(Route::Home), |_| ());
        assert_eq!(names(&stack), vec!["Home"]);
        assert_eq!(transition.removed.len(), 3);
        assert!(matches!(transition.focus, Focus::Mounted(_)));
    }

    #[test]
    fn test_same_kind_ignores_params() {
        assert!(Route::EditCredential(CredentialKind::Email)
            .same_kind(&Route::EditCredential(CredentialKind::Password)));
        assert!(!Route::Cart.same_kind(&Route::Checkout { address_index: 0 }));
    }
}
