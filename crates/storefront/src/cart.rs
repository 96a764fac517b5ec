//! Local cart cache.
//!
//! The backend owns the cart. Cart and checkout screens keep a local copy so
//! quantity edits and removals show immediately, and reconcile it with the
//! server on every session resolution, focus and retry.
//!
//! ```text
//! Unresolved ──session absent──▶ Anonymous
//!     │
//!     └──session present──▶ Loading ──ok──▶ Loaded
//!                              ▲      └─err─▶ Failed
//!                              └── focus / retry
//! ```
//!
//! Each fetch gets a new generation number. A reply carrying an older
//! generation is dropped, so a slow early fetch cannot overwrite a later one.

use std::collections::HashMap;

use tracing::{debug, warn};

use capelli_core::{CartLine, Price, Quantity, cart_subtotal};

use crate::api::{ApiCall, ApiError};
use crate::config::MutationPolicy;
use crate::session::{SessionState, SessionToken};

/// Where the cache is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartPhase {
    /// Waiting for the session read.
    Unresolved,
    /// No one is logged in.
    Anonymous,
    /// A fetch is in flight.
    Loading,
    /// Lines reflect the last fetch plus local edits.
    Loaded,
    /// The last fetch failed; the message is shown with a retry action.
    Failed(String),
}

/// A line edit sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEdit {
    Quantity(Quantity),
    Removed,
}

/// Unanswered mutations on one line.
///
/// Every mutation carries a sequence number. The newest edit wins: a failed
/// edit is only undone when nothing newer is in flight, and it is undone to
/// the newest edit the server confirmed.
#[derive(Debug, Clone)]
struct PendingLine {
    /// The line as first seen, for reinsertion after an undone removal.
    template: CartLine,
    index: usize,
    confirmed: (u64, LineEdit),
    in_flight: Vec<(u64, LineEdit)>,
}

impl PendingLine {
    fn newest(&self) -> LineEdit {
        match self.in_flight.last() {
            Some(&(seq, edit)) if seq > self.confirmed.0 => edit,
            _ => self.confirmed.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CartCache {
    session: SessionState,
    phase: CartPhase,
    lines: Vec<CartLine>,
    generation: u64,
    policy: MutationPolicy,
    next_seq: u64,
    pending: HashMap<String, PendingLine>,
    input_errors: HashMap<String, String>,
    notice: Option<String>,
}

impl CartCache {
    #[must_use]
    pub fn new(policy: MutationPolicy) -> Self {
        Self {
            session: SessionState::Unresolved,
            phase: CartPhase::Unresolved,
            lines: Vec::new(),
            generation: 0,
            policy,
            next_seq: 0,
            pending: HashMap::new(),
            input_errors: HashMap::new(),
            notice: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> &CartPhase {
        &self.phase
    }

    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line totals over the local lines.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        cart_subtotal(&self.lines)
    }

    /// Generation of the most recent fetch.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Divergence notice from a failed mutation.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Inline error for the quantity input of `title`.
    #[must_use]
    pub fn quantity_error(&self, title: &str) -> Option<&str> {
        self.input_errors.get(title).map(String::as_str)
    }

    /// Record the session read result. Starts a fetch when logged in.
    pub fn on_session(&mut self, session: SessionState) -> Option<ApiCall> {
        self.session = session;
        match self.session {
            SessionState::Unresolved => {
                self.phase = CartPhase::Unresolved;
                None
            }
            SessionState::Anonymous => {
                self.phase = CartPhase::Anonymous;
                self.lines.clear();
                self.pending.clear();
                None
            }
            SessionState::Authenticated(_) => self.refresh(),
        }
    }

    /// Refetch the cart, e.g. on focus or retry. Does nothing unless logged in.
    pub fn refresh(&mut self) -> Option<ApiCall> {
        let token = self.session.token()?.clone();
        self.generation += 1;
        self.phase = CartPhase::Loading;
        debug!(generation = self.generation, "Fetching cart");
        Some(ApiCall::GetCart {
            token,
            generation: self.generation,
        })
    }

    /// Apply a fetch result. Returns `false` when the reply was superseded.
    pub fn on_cart(&mut self, generation: u64, result: Result<Vec<CartLine>, ApiError>) -> bool {
        if generation != self.generation || self.phase != CartPhase::Loading {
            debug!(
                generation,
                current = self.generation,
                "Ignoring superseded cart reply"
            );
            return false;
        }
        match result {
            Ok(lines) => {
                self.lines = lines;
                self.phase = CartPhase::Loaded;
                self.pending.clear();
                self.input_errors.clear();
            }
            Err(e) => {
                warn!(error = %e, "Cart fetch failed");
                self.phase = CartPhase::Failed(e.to_string());
            }
        }
        true
    }

    /// Apply a typed quantity to the local line and build the update call.
    ///
    /// Empty input means 1. Invalid input is kept as an inline error on the
    /// line; an unknown line or a cart that is not loaded leaves a notice.
    /// No call is made in any of those cases.
    pub fn change_quantity(&mut self, title: &str, input: &str) -> Option<ApiCall> {
        let token = self.mutable_token()?;
        let index = self.position(title)?;
        let quantity = match Quantity::parse_input(input) {
            Ok(quantity) => quantity,
            Err(e) => {
                self.input_errors.insert(title.to_string(), e.to_string());
                return None;
            }
        };
        self.input_errors.remove(title);
        if self.lines.get(index).map(|line| line.quantity) == Some(quantity) {
            return None;
        }

        let seq = self.track(index, LineEdit::Quantity(quantity))?;
        self.show(title);
        Some(ApiCall::UpdateQuantity {
            token,
            title: title.to_string(),
            quantity,
            seq,
        })
    }

    /// Drop the line locally and build the delete call.
    pub fn remove(&mut self, title: &str) -> Option<ApiCall> {
        let token = self.mutable_token()?;
        let index = self.position(title)?;
        let seq = self.track(index, LineEdit::Removed)?;
        self.input_errors.remove(title);
        self.show(title);
        Some(ApiCall::DeleteCartLine {
            token,
            title: title.to_string(),
            seq,
        })
    }

    pub fn on_quantity_result(&mut self, title: &str, seq: u64, result: Result<(), ApiError>) {
        self.settle(title, seq, result, "update");
    }

    pub fn on_delete_result(&mut self, title: &str, seq: u64, result: Result<(), ApiError>) {
        self.settle(title, seq, result, "remove");
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn mutable_token(&mut self) -> Option<SessionToken> {
        let refusal = match self.phase {
            CartPhase::Loaded => return self.session.token().cloned(),
            CartPhase::Failed(_) => "The cart could not be loaded; retry first.",
            CartPhase::Unresolved | CartPhase::Loading => "The cart is still loading.",
            CartPhase::Anonymous => "Log in to change your cart.",
        };
        self.notice = Some(refusal.to_string());
        None
    }

    fn position(&mut self, title: &str) -> Option<usize> {
        let index = self.lines.iter().position(|line| line.title == title);
        if index.is_none() {
            self.notice = Some(format!("{title} is not in the cart"));
        }
        index
    }

    fn track(&mut self, index: usize, edit: LineEdit) -> Option<u64> {
        let line = self.lines.get(index)?;
        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending
            .entry(line.title.clone())
            .or_insert_with(|| PendingLine {
                template: line.clone(),
                index,
                confirmed: (0, LineEdit::Quantity(line.quantity)),
                in_flight: Vec::new(),
            })
            .in_flight
            .push((seq, edit));
        Some(seq)
    }

    /// Make the local line match the newest edit of `title`.
    fn show(&mut self, title: &str) {
        let Some(pending) = self.pending.get(title) else {
            return;
        };
        let position = self.lines.iter().position(|line| line.title == title);
        match (pending.newest(), position) {
            (LineEdit::Quantity(quantity), Some(index)) => {
                if let Some(line) = self.lines.get_mut(index) {
                    line.quantity = quantity;
                }
            }
            (LineEdit::Quantity(quantity), None) => {
                let line = CartLine {
                    quantity,
                    ..pending.template.clone()
                };
                let index = pending.index.min(self.lines.len());
                self.lines.insert(index, line);
            }
            (LineEdit::Removed, Some(index)) => {
                self.lines.remove(index);
            }
            (LineEdit::Removed, None) => {}
        }
    }

    fn settle(&mut self, title: &str, seq: u64, result: Result<(), ApiError>, verb: &str) {
        let Some(pending) = self.pending.get_mut(title) else {
            debug!(title, seq, "Ignoring cart {verb} reply after refetch");
            return;
        };
        let Some(at) = pending.in_flight.iter().position(|&(s, _)| s == seq) else {
            debug!(title, seq, "Ignoring unknown cart {verb} reply");
            return;
        };
        let (_, edit) = pending.in_flight.remove(at);
        let superseded =
            pending.confirmed.0 > seq || pending.in_flight.iter().any(|&(s, _)| s > seq);

        match result {
            Ok(()) => {
                if seq > pending.confirmed.0 {
                    pending.confirmed = (seq, edit);
                }
            }
            Err(e) if superseded => {
                warn!(title, seq, error = %e, "Cart {verb} failed; a newer edit is pending");
            }
            Err(e) => {
                warn!(title, seq, error = %e, "Cart {verb} failed");
                self.notice = Some(match self.policy {
                    MutationPolicy::Rollback => format!("Could not {verb} {title}; change undone."),
                    MutationPolicy::Optimistic => {
                        format!("Could not {verb} {title}; your cart may be out of date.")
                    }
                });
            }
        }

        let settled = pending.in_flight.is_empty();
        if self.policy == MutationPolicy::Rollback {
            self.show(title);
        }
        if settled {
            self.pending.remove(title);
        }
    }
}
