pub mod error;
pub mod format;
pub mod traits;
pub mod types;

pub use error::*;
pub use format::{format_currency, format_currency_with_unit, parse_amount, UNKNOWN};
pub use traits::*;
pub use types::*;
