//! Product page: quantity input and add to cart.

use capelli_core::Quantity;

use crate::api::{ApiCall, ApiReply, NewCartItem};
use crate::navigation::{ProductRef, Route};
use crate::session::SessionState;

use super::{Action, Block, Effect, Field, Screen, ScreenEvent, View, header, input};

/// Progress of the add-to-cart button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddState {
    Idle,
    Pending,
    /// The button now reads *View in Cart*.
    Added,
    Failed(String),
}

pub struct ProductScreen {
    product: ProductRef,
    session: SessionState,
    quantity: String,
    quantity_error: Option<String>,
    add: AddState,
}

impl ProductScreen {
    #[must_use]
    pub const fn new(product: ProductRef) -> Self {
        Self {
            product,
            session: SessionState::Unresolved,
            quantity: String::new(),
            quantity_error: None,
            add: AddState::Idle,
        }
    }

    #[must_use]
    pub const fn add_state(&self) -> &AddState {
        &self.add
    }

    fn add_to_cart(&mut self) -> Vec<Effect> {
        match self.add {
            AddState::Added => return vec![Effect::navigate(Route::Cart)],
            AddState::Pending => return Vec::new(),
            AddState::Idle | AddState::Failed(_) => {}
        }
        let token = match &self.session {
            SessionState::Unresolved => return Vec::new(),
            SessionState::Anonymous => return vec![Effect::navigate(Route::Login)],
            SessionState::Authenticated(token) => token.clone(),
        };
        let quantity = match Quantity::parse_input(&self.quantity) {
            Ok(quantity) => quantity,
            Err(e) => {
                self.quantity_error = Some(e.to_string());
                return Vec::new();
            }
        };

        self.quantity_error = None;
        self.add = AddState::Pending;
        vec![Effect::Api(ApiCall::AddToCart {
            token,
            item: NewCartItem {
                title: self.product.title.clone(),
                image: self.product.image.clone(),
                price: self.product.price,
                quantity,
            },
        })]
    }
}

impl Screen for ProductScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            // Re-read on focus: the shopper may have logged in meanwhile.
            ScreenEvent::Mounted | ScreenEvent::Focused => vec![Effect::read_session()],
            ScreenEvent::ParamsChanged(Route::Product(product)) => {
                *self = Self {
                    session: self.session.clone(),
                    ..Self::new(product)
                };
                Vec::new()
            }
            ScreenEvent::Session(session) => {
                self.session = session;
                Vec::new()
            }
            ScreenEvent::Reply(ApiReply::AddedToCart(result)) => {
                self.add = match result {
                    Ok(()) => AddState::Added,
                    Err(e) => AddState::Failed(e.to_string()),
                };
                Vec::new()
            }
            ScreenEvent::Input(action) => match action {
                Action::SetField(Field::Quantity, value) => {
                    self.quantity = value;
                    self.quantity_error = None;
                    Vec::new()
                }
                Action::AddToCart => self.add_to_cart(),
                Action::Retry if matches!(self.add, AddState::Failed(_)) => self.add_to_cart(),
                other => header(other),
            },
            _ => Vec::new(),
        }
    }

    fn view(&self) -> View {
        let mut view = View::new(self.product.title.clone());
        view.text(self.product.price.to_string());
        view.text(self.product.image.clone());
        view.push(input(
            Field::Quantity,
            "Quantity",
            &self.quantity,
            self.quantity_error.clone(),
        ));

        match &self.add {
            AddState::Pending => view.push(Block::Loading),
            AddState::Added => view.button("View in Cart", "add"),
            AddState::Failed(message) => {
                view.error(message.clone(), true);
                view.button("Add to cart", "add");
            }
            AddState::Idle => view.button("Add to cart", "add"),
        }
        view
    }
}
