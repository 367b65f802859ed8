use std::str::FromStr;

use serde_json::Value;

use crate::bot::{
    currency::{Currency, CurrencyError, PriceKind},
    schema::OptionKind,
};

/* Options turns the untyped, ordered option list of a command
 * into typed values. Pure functions only.
 */

#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum OptionError {
    #[error("Insufficient command options")]
    InsufficientOptions,
    #[error("{0}")]
    InvalidTag(CurrencyError),
    #[error("Invalid amount: unexpected {0} value")]
    AmountParseError(&'static str),
    #[error("Amount must not be negative.")]
    NegativeAmount,
}

impl From<CurrencyError> for OptionError {
    fn from(currency_error: CurrencyError) -> OptionError {
        OptionError::InvalidTag(currency_error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    pub name: String,
    pub kind: OptionKind,
    pub value: Value,
}

impl CommandOption {
    pub fn new(name: &str, kind: OptionKind, value: Value) -> Self {
        CommandOption {
            name: name.to_string(),
            kind,
            value,
        }
    }
}

// Amount as received, before it is normalised for a computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    Integer(i64),
    Float(f64),
}

impl NumericValue {
    /* Robux count: floats are rounded half away from zero.
     * Negative counts are rejected, and so are floats past the i64 range.
     */
    pub fn to_robux(self) -> Result<u64, OptionError> {
        match self {
            NumericValue::Integer(value) => {
                u64::try_from(value).map_err(|_| OptionError::NegativeAmount)
            }
            NumericValue::Float(value) => {
                let rounded = value.round();
                if rounded < 0.0 {
                    Err(OptionError::NegativeAmount)
                } else if rounded > i64::MAX as f64 {
                    Err(OptionError::AmountParseError("out-of-range number"))
                } else {
                    Ok(rounded as u64)
                }
            }
        }
    }

    // Fiat amount, kept as is.
    pub fn to_fiat(self) -> Result<f64, OptionError> {
        let value = match self {
            NumericValue::Integer(value) => value as f64,
            NumericValue::Float(value) => value,
        };
        if value < 0.0 {
            Err(OptionError::NegativeAmount)
        } else {
            Ok(value)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOptions<T> {
    pub tag: T,
    pub amount: NumericValue,
}

// Name of the JSON shape, for diagnostics.
fn value_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// Resolves an amount to an integer or a float. Everything else is rejected.
pub fn parse_amount(value: &Value) -> Result<NumericValue, OptionError> {
    match value {
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(NumericValue::Integer(integer))
            } else {
                match number.as_f64() {
                    Some(float) if float.is_finite() => Ok(NumericValue::Float(float)),
                    _ => Err(OptionError::AmountParseError("non-finite number")),
                }
            }
        }
        other => Err(OptionError::AmountParseError(value_shape(other))),
    }
}

/* Reads the first option as a tag (price kind or currency), the second as an amount.
 * Fails before looking at any value if fewer than two options are present.
 */
pub fn parse_options<T>(options: &[CommandOption]) -> Result<ParsedOptions<T>, OptionError>
where
    T: FromStr<Err = CurrencyError>,
{
    if options.len() < 2 {
        return Err(OptionError::InsufficientOptions);
    }

    let tag = match &options[0].value {
        Value::String(text) => text.parse::<T>()?,
        other => other.to_string().parse::<T>()?,
    };
    let amount = parse_amount(&options[1].value)?;

    Ok(ParsedOptions { tag, amount })
}

pub fn parse_price_options(options: &[CommandOption]) -> Result<(PriceKind, u64), OptionError> {
    let parsed = parse_options::<PriceKind>(options)?;
    Ok((parsed.tag, parsed.amount.to_robux()?))
}

pub fn parse_currency_options(options: &[CommandOption]) -> Result<(Currency, f64), OptionError> {
    let parsed = parse_options::<Currency>(options)?;
    Ok((parsed.tag, parsed.amount.to_fiat()?))
}
