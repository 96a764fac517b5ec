//! Shipping addresses.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::{self, RecordError};

/// Error returned when a two-letter code is not a US state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown state code: {0:?}")]
pub struct StateCodeError(pub String);

macro_rules! us_states {
    ($($code:ident),+ $(,)?) => {
        /// A US state, by its two-letter postal code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        pub enum UsState {
            #[default]
            $($code),+
        }

        impl UsState {
            /// Every state, in picker order.
            pub const ALL: &'static [Self] = &[$(Self::$code),+];

            /// The two-letter postal code.
            #[must_use]
            pub const fn code(self) -> &'static str {
                match self {
                    $(Self::$code => stringify!($code)),+
                }
            }
        }
    };
}

// `#[default]` lands on the first variant, matching the picker's initial value.
us_states!(
    AL, AK, AZ, AR, CA, CO, CT, DE, FL, GA, HI, ID, IL, IN, IA, KS, KY, LA, ME, MD, MA, MI, MN, MS,
    MO, MT, NE, NV, NH, NJ, NM, NY, NC, ND, OH, OK, OR, PA, RI, SC, SD, TN, TX, UT, VT, VA, WA, WV,
    WI, WY,
);

impl FromStr for UsState {
    type Err = StateCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| StateCodeError(s.to_string()))
    }
}

impl fmt::Display for UsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A shipping address.
///
/// Addresses carry no id; the backend identifies them by their position in
/// the list it returns. Any deletion shifts the positions of later entries,
/// so indices must not be reused across a refetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// First address line.
    pub line1: String,
    /// Second address line (may be empty).
    pub line2: String,
    /// State.
    pub state: UsState,
    /// ZIP code.
    pub zip_code: String,
}

impl Address {
    /// Parse a `line1~line2~state~zip` record.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] when the field count is wrong, line 1 or the
    /// ZIP code is blank, or the state is not a US postal code.
    pub fn parse_record(raw: &str) -> Result<Self, RecordError> {
        let [line1, line2, state, zip_code] = record::split::<4>(raw)?;

        let line1 = record::required("line1", line1)?;
        let state = record::required("state", state)?
            .parse::<UsState>()
            .map_err(|e| RecordError::InvalidField {
                field: "state",
                reason: e.to_string(),
            })?;
        let zip_code = record::required("zip_code", zip_code)?;

        Ok(Self {
            line1: line1.to_string(),
            line2: line2.to_string(),
            state,
            zip_code: zip_code.to_string(),
        })
    }

    /// Encode as a backend record.
    #[must_use]
    pub fn to_record(&self) -> String {
        record::join(&[&self.line1, &self.line2, self.state.code(), &self.zip_code])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.line1)?;
        if !self.line2.is_empty() {
            writeln!(f, "{}", self.line2)?;
        }
        write!(f, "{} {}", self.state, self.zip_code)
    }
}
