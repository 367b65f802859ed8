use std::{fmt, str::FromStr};

/* Currency contains the value types shared by every part of the bot.
 * Robux price kinds, the two fiat currencies, and rates between them.
 * Nothing in here performs I/O.
 */

#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum CurrencyError {
    #[error("Invalid type \"{0}\". Use 'b/t' or 'a/t'.")]
    UnknownPriceKind(String),
    #[error("Invalid currency \"{0}\". Use 'GBP' or 'USD'.")]
    InvalidCurrency(String),
    #[error("Exchange rate {rate} for {from} to {to} is not positive")]
    InvalidRate {
        from: Currency,
        to: Currency,
        rate: f64,
    },
}

/* How the seller receives the Robux.
 * b/t: the quoted amount already nets the platform fee.
 * a/t: the gamepass has to be marked up so the seller nets the quoted amount.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriceKind {
    BuyThenTransfer,
    AssetThenTransfer,
}

impl PriceKind {
    pub fn tag(&self) -> &'static str {
        match self {
            PriceKind::BuyThenTransfer => "b/t",
            PriceKind::AssetThenTransfer => "a/t",
        }
    }
}

// Exact match only, no case folding or trimming.
impl FromStr for PriceKind {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b/t" => Ok(PriceKind::BuyThenTransfer),
            "a/t" => Ok(PriceKind::AssetThenTransfer),
            _ => Err(CurrencyError::UnknownPriceKind(s.to_string())),
        }
    }
}

impl fmt::Display for PriceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    GBP,
    USD,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::GBP => "GBP",
            Currency::USD => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::GBP => "£",
            Currency::USD => "$",
        }
    }

    // The other currency of the pair.
    pub fn counterpart(&self) -> Currency {
        match self {
            Currency::GBP => Currency::USD,
            Currency::USD => Currency::GBP,
        }
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GBP" => Ok(Currency::GBP),
            "USD" => Ok(Currency::USD),
            _ => Err(CurrencyError::InvalidCurrency(s.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyAmount {
    pub currency: Currency,
    pub magnitude: f64,
}

impl CurrencyAmount {
    pub fn new(currency: Currency, magnitude: f64) -> Self {
        CurrencyAmount {
            currency,
            magnitude,
        }
    }
}

// Two decimal places, symbol first: £0.45, $61.00.
impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), self.magnitude)
    }
}

/* A single directed rate, from -> to.
 * Only constructible with a finite, positive rate, so a bad rate
 * never reaches any arithmetic.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRate {
    from: Currency,
    to: Currency,
    rate: f64,
}

impl ExchangeRate {
    pub fn new(from: Currency, to: Currency, rate: f64) -> Result<Self, CurrencyError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CurrencyError::InvalidRate { from, to, rate });
        }
        Ok(ExchangeRate { from, to, rate })
    }

    pub fn from(&self) -> Currency {
        self.from
    }

    pub fn to(&self) -> Currency {
        self.to
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn apply(&self, magnitude: f64) -> f64 {
        magnitude * self.rate
    }
}
