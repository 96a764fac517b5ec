//! Cart screen.

use crate::api::ApiReply;
use crate::cart::{CartCache, CartPhase};
use crate::config::MutationPolicy;
use crate::navigation::{ProductRef, Route};

use super::{Action, Block, Effect, Screen, ScreenEvent, View, header};

pub struct CartScreen {
    cart: CartCache,
}

impl CartScreen {
    #[must_use]
    pub fn new(policy: MutationPolicy) -> Self {
        Self {
            cart: CartCache::new(policy),
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartCache {
        &self.cart
    }
}

/// Apply a cart-related reply, handing back any reply that is not about the
/// cart.
pub(super) fn apply_cart_reply(cart: &mut CartCache, reply: ApiReply) -> Result<(), ApiReply> {
    match reply {
        ApiReply::Cart { generation, result } => {
            cart.on_cart(generation, result);
        }
        ApiReply::QuantityUpdated { title, seq, result } => {
            cart.on_quantity_result(&title, seq, result);
        }
        ApiReply::CartLineDeleted { title, seq, result } => {
            cart.on_delete_result(&title, seq, result);
        }
        other => return Err(other),
    }
    Ok(())
}

/// Handle line edits shared by the cart and checkout screens, handing back
/// any other action.
pub(super) fn apply_line_action(cart: &mut CartCache, action: Action) -> Result<Vec<Effect>, Action> {
    match action {
        Action::SetLineQuantity { title, input } => {
            cart.dismiss_notice();
            let call = cart.change_quantity(&title, &input);
            Ok(call.map(Effect::Api).into_iter().collect())
        }
        Action::RemoveLine(title) => {
            cart.dismiss_notice();
            Ok(cart.remove(&title).map(Effect::Api).into_iter().collect())
        }
        Action::OpenProduct(title) => Ok(cart
            .lines()
            .iter()
            .find(|line| line.title.eq_ignore_ascii_case(title.trim()))
            .map(|line| Effect::navigate(Route::Product(ProductRef::from(line))))
            .into_iter()
            .collect()),
        other => Err(other),
    }
}

/// Render cart lines with their inline quantity errors.
pub(super) fn push_lines(view: &mut View, cart: &CartCache) {
    for line in cart.lines() {
        view.push(Block::Item {
            label: line.title.clone(),
            detail: format!("{} x {}", line.price, line.quantity),
            note: cart
                .quantity_error(&line.title)
                .map(|e| format!("Quantity: {e}")),
        });
    }
    view.text(format!("Subtotal: {}", cart.subtotal()));
    push_notice(view, cart);
}

pub(super) fn push_notice(view: &mut View, cart: &CartCache) {
    if let Some(notice) = cart.notice() {
        view.push(Block::Notice(notice.to_string()));
    }
}

impl Screen for CartScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Mounted | ScreenEvent::Focused => vec![Effect::read_session()],
            ScreenEvent::Session(session) => {
                self.cart.on_session(session).map(Effect::Api).into_iter().collect()
            }
            ScreenEvent::Reply(reply) => {
                let _ = apply_cart_reply(&mut self.cart, reply);
                Vec::new()
            }
            ScreenEvent::Input(action) => match apply_line_action(&mut self.cart, action) {
                Ok(effects) => effects,
                Err(Action::Retry) => self.cart.refresh().map(Effect::Api).into_iter().collect(),
                Err(Action::Login) if self.cart.phase() == &CartPhase::Anonymous => {
                    vec![Effect::navigate(Route::Login)]
                }
                Err(Action::Checkout)
                    if self.cart.phase() == &CartPhase::Loaded && !self.cart.is_empty() =>
                {
                    vec![Effect::navigate(Route::Checkout { address_index: 0 })]
                }
                Err(other) => header(other),
            },
            ScreenEvent::ParamsChanged(_) => Vec::new(),
        }
    }

    fn view(&self) -> View {
        let mut view = View::new("Cart");
        match self.cart.phase() {
            CartPhase::Unresolved | CartPhase::Loading => view.push(Block::Loading),
            CartPhase::Anonymous => {
                view.text("No User Logged in!");
                view.button("LOGIN", "login");
            }
            CartPhase::Failed(message) => {
                view.error(message.clone(), true);
                push_notice(&mut view, &self.cart);
            }
            CartPhase::Loaded if self.cart.is_empty() => view.text("Nothing in Cart"),
            CartPhase::Loaded => {
                push_lines(&mut view, &self.cart);
                view.button("Checkout", "checkout");
            }
        }
        view
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, ApiError};
    use crate::navigation::NavAction;
    use crate::screens::testing::{calls, input, logged_in, logged_out, nav, reads_session};
    use capelli_core::CartLine;

    fn lines() -> Vec<CartLine> {
        vec![
            CartLine::parse_record("Wahl Senior~img~89.99~1").unwrap(),
            CartLine::parse_record("Andis Master~img~10~2").unwrap(),
        ]
    }

    fn loaded() -> CartScreen {
        let mut screen = CartScreen::new(MutationPolicy::Optimistic);
        screen.handle(ScreenEvent::Mounted);
        let effects = screen.handle(logged_in());
        let calls = calls(&effects);
        let [ApiCall::GetCart { generation, .. }] = calls.as_slice() else {
            panic!("expected cart fetch");
        };
        let generation = *generation;
        screen.handle(ScreenEvent::Reply(ApiReply::Cart {
            generation,
            result: Ok(lines()),
        }));
        screen
    }

    #[test]
    fn test_anonymous_shows_login_prompt() {
        let mut screen = CartScreen::new(MutationPolicy::Optimistic);
        assert!(reads_session(&screen.handle(ScreenEvent::Mounted)));
        assert!(screen.view().is_loading());

        assert!(screen.handle(logged_out()).is_empty());
        let view = screen.view();
        assert!(view.contains("No User Logged in!"));
        assert!(view.contains("LOGIN"));

        let effects = screen.handle(input(Action::Login));
        assert_eq!(nav(&effects), Some(&NavAction::Navigate(Route::Login)));
    }

    #[test]
    fn test_loaded_cart() {
        let screen = loaded();
        let view = screen.view();
        assert!(view.contains("Wahl Senior"));
        assert!(view.contains("Subtotal: $109.99"));
    }

    #[test]
    fn test_empty_cart() {
        let mut screen = CartScreen::new(MutationPolicy::Optimistic);
        screen.handle(logged_in());
        screen.handle(ScreenEvent::Reply(ApiReply::Cart {
            generation: screen.cart().generation(),
            result: Ok(vec![]),
        }));
        assert!(screen.view().contains("Nothing in Cart"));
        assert!(screen.handle(input(Action::Checkout)).is_empty());
    }

    #[test]
    fn test_quantity_edit_is_local_first() {
        let mut screen = loaded();
        let effects = screen.handle(input(Action::SetLineQuantity {
            title: "Andis Master".to_string(),
            input: "5".to_string(),
        }));
        let calls = calls(&effects);
        let [ApiCall::UpdateQuantity { seq, .. }] = calls.as_slice() else {
            panic!("expected a quantity update");
        };
        let seq = *seq;
        assert_eq!(screen.cart().lines()[1].quantity.get(), 5);
        assert!(screen.view().contains("Subtotal: $139.99"));

        screen.handle(ScreenEvent::Reply(ApiReply::QuantityUpdated {
            title: "Andis Master".to_string(),
            seq,
            result: Err(ApiError::Status {
                status: 500,
                body: String::new(),
            }),
        }));
        assert_eq!(screen.cart().lines()[1].quantity.get(), 5);
        assert!(screen.view().contains("out of date"));
    }

    #[test]
    fn test_invalid_quantity_shows_inline() {
        let mut screen = loaded();
        let effects = screen.handle(input(Action::SetLineQuantity {
            title: "Andis Master".to_string(),
            input: "abc".to_string(),
        }));
        assert!(effects.is_empty());
        assert!(screen.view().contains("Quantity: quantity must be a whole number"));
    }

    #[test]
    fn test_unknown_line_shows_notice() {
        let mut screen = loaded();
        let effects = screen.handle(input(Action::SetLineQuantity {
            title: "Oster Fast Feed".to_string(),
            input: "2".to_string(),
        }));
        assert!(effects.is_empty());
        assert!(screen.view().contains("Oster Fast Feed is not in the cart"));
    }

    #[test]
    fn test_edit_after_failed_refetch_shows_notice() {
        let mut screen = loaded();
        screen.handle(ScreenEvent::Focused);
        screen.handle(logged_in());
        screen.handle(ScreenEvent::Reply(ApiReply::Cart {
            generation: screen.cart().generation(),
            result: Err(ApiError::Status {
                status: 502,
                body: String::new(),
            }),
        }));

        let effects = screen.handle(input(Action::RemoveLine("Wahl Senior".to_string())));
        assert!(effects.is_empty());
        let view = screen.view();
        assert!(view.contains("Backend returned 502"));
        assert!(view.contains("The cart could not be loaded; retry first."));
    }

    #[test]
    fn test_remove_line() {
        let mut screen = loaded();
        let effects = screen.handle(input(Action::RemoveLine("Wahl Senior".to_string())));
        assert!(matches!(
            calls(&effects)[..],
            [ApiCall::DeleteCartLine { .. }]
        ));
        assert_eq!(screen.cart().lines().len(), 1);
    }

    #[test]
    fn test_focus_refetches() {
        let mut screen = loaded();
        assert!(reads_session(&screen.handle(ScreenEvent::Focused)));
        let effects = screen.handle(logged_in());
        assert!(matches!(calls(&effects)[..], [ApiCall::GetCart { .. }]));
        assert!(screen.view().is_loading());
    }

    #[test]
    fn test_checkout_and_open_product() {
        let mut screen = loaded();
        let effects = screen.handle(input(Action::Checkout));
        assert_eq!(
            nav(&effects),
            Some(&NavAction::Navigate(Route::Checkout { address_index: 0 }))
        );

        let effects = screen.handle(input(Action::OpenProduct("wahl senior".to_string())));
        assert!(matches!(
            nav(&effects),
            Some(NavAction::Navigate(Route::Product(_)))
        ));
    }
}
