//! Fixed-point money amounts with at most 12 digits, 2 of them after the decimal point.

use std::fmt::Display;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The maximum number of digits in an amount.
pub const AMOUNT_MAX_DIGITS: u32 = 12;
/// The maximum number of digits after the decimal point in an amount.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

const INVALID_NUMBER_MESSAGE: &str = "A valid number is required.";

/// An amount of money stored as a whole number of cents.
///
/// Amounts are written to JSON as strings with exactly two decimal places,
/// e.g. `"12.50"`, so that clients never see floating point rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount as a whole number of cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// The amount as a decimal number with two decimal places.
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.0, AMOUNT_DECIMAL_PLACES)
    }

    /// Parse an amount from a JSON number or numeric string.
    ///
    /// # Errors
    ///
    /// Returns the validation message for the first rule the value breaks:
    /// not a number, too many digits in total, too many decimal places, or
    /// too many digits before the decimal point.
    pub fn parse(value: &Value) -> Result<Self, String> {
        let text = match value {
            Value::Number(number) => number.to_string(),
            Value::String(text) => text.trim().to_owned(),
            _ => return Err(INVALID_NUMBER_MESSAGE.to_owned()),
        };

        let decimal = Decimal::from_str_exact(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| INVALID_NUMBER_MESSAGE.to_owned())?;

        Self::from_decimal(decimal)
    }

    /// Create an amount from a decimal number.
    ///
    /// Trailing zeros after the decimal point count towards the digit limits,
    /// so `1.500` is rejected.
    ///
    /// # Errors
    ///
    /// Returns the validation message for the first digit limit `decimal` breaks.
    pub fn from_decimal(decimal: Decimal) -> Result<Self, String> {
        let digits = decimal.mantissa().unsigned_abs().to_string().len() as u32;
        let scale = decimal.scale();

        let (total_digits, whole_digits, decimal_places) = if scale == 0 {
            (digits, digits, 0)
        } else if digits > scale {
            (digits, digits - scale, scale)
        } else {
            (scale, 0, scale)
        };

        let max_whole_digits = AMOUNT_MAX_DIGITS - AMOUNT_DECIMAL_PLACES;

        if total_digits > AMOUNT_MAX_DIGITS {
            return Err(format!(
                "Ensure that there are no more than {AMOUNT_MAX_DIGITS} digits in total."
            ));
        }

        if decimal_places > AMOUNT_DECIMAL_PLACES {
            return Err(format!(
                "Ensure that there are no more than {AMOUNT_DECIMAL_PLACES} decimal places."
            ));
        }

        if whole_digits > max_whole_digits {
            return Err(format!(
                "Ensure that there are no more than {max_whole_digits} digits before the decimal point."
            ));
        }

        let mut decimal = decimal;
        decimal.rescale(AMOUNT_DECIMAL_PLACES);

        // Fits in an i64 after the digit checks above.
        i64::try_from(decimal.mantissa())
            .map(Self)
            .map_err(|_| INVALID_NUMBER_MESSAGE.to_owned())
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_decimal())
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Amount::parse(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod amount_tests {
    use serde_json::json;

    use super::Amount;

    #[test]
    fn parses_numeric_string() {
        assert_eq!(Amount::parse(&json!("12.50")), Ok(Amount::from_cents(1250)));
        assert_eq!(Amount::parse(&json!(" 7 ")), Ok(Amount::from_cents(700)));
        assert_eq!(Amount::parse(&json!("-0.05")), Ok(Amount::from_cents(-5)));
    }

    #[test]
    fn parses_json_number() {
        assert_eq!(Amount::parse(&json!(12.5)), Ok(Amount::from_cents(1250)));
        assert_eq!(Amount::parse(&json!(3)), Ok(Amount::from_cents(300)));
    }

    #[test]
    fn rejects_non_numbers() {
        for value in [json!("abc"), json!(""), json!(true), json!([1]), json!("NaN")] {
            assert_eq!(
                Amount::parse(&value),
                Err("A valid number is required.".to_owned()),
                "value {value}"
            );
        }
    }

    #[test]
    fn rejects_too_many_decimal_places() {
        assert_eq!(
            Amount::parse(&json!("1.005")),
            Err("Ensure that there are no more than 2 decimal places.".to_owned())
        );
        assert_eq!(
            Amount::parse(&json!("1.500")),
            Err("Ensure that there are no more than 2 decimal places.".to_owned())
        );
    }

    #[test]
    fn rejects_too_many_digits() {
        assert_eq!(
            Amount::parse(&json!("1234567890123")),
            Err("Ensure that there are no more than 12 digits in total.".to_owned())
        );
        assert_eq!(
            Amount::parse(&json!("12345678901.5")),
            Err("Ensure that there are no more than 10 digits before the decimal point.".to_owned())
        );
    }

    #[test]
    fn accepts_largest_amount() {
        assert_eq!(
            Amount::parse(&json!("9999999999.99")),
            Ok(Amount::from_cents(999_999_999_999))
        );
    }

    #[test]
    fn serializes_with_two_decimal_places() {
        assert_eq!(
            serde_json::to_value(Amount::from_cents(1250)).unwrap(),
            json!("12.50")
        );
        assert_eq!(
            serde_json::to_value(Amount::from_cents(-5)).unwrap(),
            json!("-0.05")
        );
        assert_eq!(serde_json::to_value(Amount::from_cents(0)).unwrap(), json!("0.00"));
    }
}
