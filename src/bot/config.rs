use std::{env, str::FromStr, sync::Arc};

use super::{
    api::{ExchangeRateApi, FixedRate, RateFetchError, RateSource},
    currency::CurrencyError,
    processor::{PricingPolicy, RateTable, RoundingBuffer},
};

/* Config reads the bot's settings from the environment once, at startup.
 * Everything built from it is immutable afterwards.
 */

pub const DEFAULT_RATE_BT: f64 = 0.0045;
pub const DEFAULT_RATE_AT: f64 = 0.00675;
pub const DEFAULT_MARKUP_RATE: f64 = 0.30;
pub const DEFAULT_GBP_TO_USD_RATE: f64 = 1.22;
pub const DEFAULT_EXCHANGE_RATE_API_URL: &str = "https://api.exchangerate-api.com/v4";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVariable(&'static str),
    #[error("{0} has an invalid value: {1}")]
    InvalidValue(&'static str, String),
    #[error("{0}")]
    InvalidRate(CurrencyError),
    #[error("{0}")]
    RateSourceError(RateFetchError),
}

impl From<CurrencyError> for ConfigError {
    fn from(currency_error: CurrencyError) -> ConfigError {
        ConfigError::InvalidRate(currency_error)
    }
}

impl From<RateFetchError> for ConfigError {
    fn from(fetch_error: RateFetchError) -> ConfigError {
        ConfigError::RateSourceError(fetch_error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateSourceConfig {
    Fixed { gbp_to_usd: f64 },
    Live { base_url: String, api_key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub token: String,
    pub rate_bt: f64,
    pub rate_at: f64,
    pub policy: PricingPolicy,
    pub rate_source: RateSourceConfig,
}

// Parses an optional variable, falling back to a default when unset.
fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key, value)),
        None => Ok(default),
    }
}

fn positive_rate<F>(lookup: &F, key: &'static str, default: f64) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let rate = parse_or(lookup, key, default)?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ConfigError::InvalidValue(key, rate.to_string()));
    }
    Ok(rate)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("TELOXIDE_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingVariable("TELOXIDE_TOKEN"))?;

        let rate_bt = positive_rate(&lookup, "ROBUX_RATE_BT", DEFAULT_RATE_BT)?;
        let rate_at = positive_rate(&lookup, "ROBUX_RATE_AT", DEFAULT_RATE_AT)?;

        let markup_rate = parse_or(&lookup, "ROBUX_MARKUP_RATE", DEFAULT_MARKUP_RATE)?;
        if !(0.0..1.0).contains(&markup_rate) {
            return Err(ConfigError::InvalidValue(
                "ROBUX_MARKUP_RATE",
                markup_rate.to_string(),
            ));
        }

        let rounding_buffer = if parse_or(&lookup, "GAMEPASS_ROUNDING_BUFFER", false)? {
            RoundingBuffer::AddOne
        } else {
            RoundingBuffer::None
        };

        let rate_source = match lookup("EXCHANGE_RATE_API_KEY").filter(|key| !key.is_empty()) {
            Some(api_key) => RateSourceConfig::Live {
                base_url: lookup("EXCHANGE_RATE_API_URL")
                    .unwrap_or_else(|| DEFAULT_EXCHANGE_RATE_API_URL.to_string()),
                api_key,
            },
            None => RateSourceConfig::Fixed {
                gbp_to_usd: positive_rate(&lookup, "GBP_TO_USD_RATE", DEFAULT_GBP_TO_USD_RATE)?,
            },
        };

        Ok(Config {
            token,
            rate_bt,
            rate_at,
            policy: PricingPolicy {
                markup_rate,
                rounding_buffer,
            },
            rate_source,
        })
    }

    pub fn rate_table(&self) -> RateTable {
        RateTable::new(self.rate_bt, self.rate_at)
    }

    pub fn build_rate_source(&self) -> Result<Arc<dyn RateSource>, ConfigError> {
        let source: Arc<dyn RateSource> = match &self.rate_source {
            RateSourceConfig::Fixed { gbp_to_usd } => Arc::new(FixedRate::new(*gbp_to_usd)?),
            RateSourceConfig::Live { base_url, api_key } => {
                Arc::new(ExchangeRateApi::new(base_url, api_key)?)
            }
        };
        Ok(source)
    }
}
