//! Cart lines as shipped by the backend.

use serde::{Deserialize, Serialize};

use super::record::{self, RecordError};
use super::{Price, Quantity};

/// One product entry in a shopper's cart.
///
/// The backend has no line ids: the product title is the line's identity,
/// so titles are unique within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product title (line identity).
    pub title: String,
    /// Product image URL.
    pub image: String,
    /// Unit price.
    pub price: Price,
    /// Number of units.
    pub quantity: Quantity,
}

impl CartLine {
    /// Parse a `title~image~price~quantity` record.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] when a field is missing or extra, the title
    /// is blank, the price is not a non-negative decimal, or the quantity is
    /// not a positive integer.
    pub fn parse_record(raw: &str) -> Result<Self, RecordError> {
        let [title, image, price, quantity] = record::split::<4>(raw)?;

        let title = record::required("title", title)?;
        let price = Price::parse(record::required("price", price)?).map_err(|e| {
            RecordError::InvalidField {
                field: "price",
                reason: e.to_string(),
            }
        })?;
        let quantity = Quantity::parse(record::required("quantity", quantity)?).map_err(|e| {
            RecordError::InvalidField {
                field: "quantity",
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            title: title.to_string(),
            image: image.to_string(),
            price,
            quantity,
        })
    }

    /// Encode as a backend record.
    #[must_use]
    pub fn to_record(&self) -> String {
        record::join(&[
            &self.title,
            &self.image,
            &self.price.amount().to_string(),
            &self.quantity.to_string(),
        ])
    }

    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Sum of all line totals.
#[must_use]
pub fn cart_subtotal(lines: &[CartLine]) -> Price {
    lines.iter().map(CartLine::line_total).sum()
}
