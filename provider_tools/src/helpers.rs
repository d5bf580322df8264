use ogw_common::Cents;
use serde::{Deserialize, Deserializer};

use crate::ProviderApiError;

/// Parses a decimal price as sent by the carrier, e.g. `"23.5"` or `"1234.56"`.
pub fn parse_decimal_price(price: &str) -> Result<Cents, ProviderApiError> {
    let price = price.trim();
    let invalid = |reason: &str| ProviderApiError::InvalidCurrencyAmount(format!("{price}: {reason}"));
    let (whole, frac) = price.split_once('.').unwrap_or((price, ""));
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected digits before the decimal point"));
    }
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected at most two decimal digits"));
    }
    let whole = whole.parse::<i64>().map_err(|e| invalid(&e.to_string()))?;
    let cents = format!("{frac:0<2}").parse::<i64>().map_err(|e| invalid(&e.to_string()))?;
    Ok(Cents::from(whole * 100 + cents))
}

/// Accepts an id that the provider sends either as a JSON number or a string.
pub fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        S(String),
        N(i64),
    }
    Ok(match Id::deserialize(d)? {
        Id::S(s) => s,
        Id::N(n) => n.to_string(),
    })
}
