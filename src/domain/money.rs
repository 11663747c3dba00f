use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Money is an arbitrary-precision decimal so repeated arithmetic never drifts.
/// Comparisons are exact; there is no epsilon anywhere in the ledger.
pub type Amount = Decimal;

/// Currency used when the caller does not pick one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Format an amount with two fraction digits.
/// Example: 1000 -> "1000.00", 12.345 -> "12.35"
pub fn format_amount(amount: Amount) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Format an amount prefixed by its currency code, e.g. "USD 1000.00".
pub fn format_money(currency: &str, amount: Amount) -> String {
    format!("{} {}", currency, format_amount(amount))
}

/// Parse a decimal string into an amount.
/// Example: "50.00" -> 50.00, "12.5" -> 12.5, "100" -> 100
///
/// The sign is preserved; positivity is a business rule checked by the services.
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }
    Decimal::from_str(input).map_err(|_| ParseAmountError::InvalidFormat)
}

/// Normalize a currency code: trimmed, upper-cased, exactly three ASCII letters.
pub fn normalize_currency(input: &str) -> Result<String, CurrencyError> {
    let code = input.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(CurrencyError(input.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "amount is empty"),
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyError(pub String);

impl fmt::Display for CurrencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid currency code '{}'", self.0)
    }
}

impl std::error::Error for CurrencyError {}
