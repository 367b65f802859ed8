use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::currency::{Currency, CurrencyError, ExchangeRate};

/* API contains the logic for calling external APIs.
 * Links the bot's logic with the exchange rates it needs from the internet.
 * Called and used by the Processor only.
 * Rates are fetched on every call. Nothing is cached, retried or timed out.
 */

#[derive(thiserror::Error, Debug)]
pub enum RateFetchError {
    #[error("Exchange rate API key is not configured")]
    MissingApiKey,
    #[error("Failed to fetch exchange rate: {0}")]
    RequestError(reqwest::Error),
    #[error("Received non-200 response: {0}")]
    StatusError(StatusCode),
    #[error("Invalid response format")]
    InvalidFormat,
    #[error("Exchange rate not found for {0} to {1}")]
    RateNotFound(Currency, Currency),
    #[error("{0}")]
    InvalidRate(CurrencyError),
}

impl From<reqwest::Error> for RateFetchError {
    fn from(request_error: reqwest::Error) -> RateFetchError {
        RateFetchError::RequestError(request_error)
    }
}

impl From<CurrencyError> for RateFetchError {
    fn from(currency_error: CurrencyError) -> RateFetchError {
        RateFetchError::InvalidRate(currency_error)
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self, from: Currency, to: Currency) -> Result<ExchangeRate, RateFetchError>;
}

/* Fixed rate between GBP and USD.
 * The single rate serves both directions.
 */
#[derive(Debug, Clone, Copy)]
pub struct FixedRate {
    gbp_to_usd: ExchangeRate,
}

impl FixedRate {
    pub fn new(gbp_to_usd: f64) -> Result<Self, CurrencyError> {
        Ok(FixedRate {
            gbp_to_usd: ExchangeRate::new(Currency::GBP, Currency::USD, gbp_to_usd)?,
        })
    }
}

#[async_trait]
impl RateSource for FixedRate {
    async fn fetch(&self, from: Currency, to: Currency) -> Result<ExchangeRate, RateFetchError> {
        let rate = match (from, to) {
            (Currency::GBP, Currency::USD) => self.gbp_to_usd.rate(),
            (Currency::USD, Currency::GBP) => 1.0 / self.gbp_to_usd.rate(),
            _ => 1.0,
        };
        Ok(ExchangeRate::new(from, to, rate)?)
    }
}

/* Live rates from an ExchangeRate-API compatible service.
 * GET <base_url>/latest/<FROM>?apikey=..&base=<FROM>&symbols=<TO>
 * Each direction is fetched on its own.
 */
#[derive(Debug, Clone)]
pub struct ExchangeRateApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRateApi {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, RateFetchError> {
        if api_key.is_empty() {
            return Err(RateFetchError::MissingApiKey);
        }

        let mut h = header::HeaderMap::new();
        h.insert(
            "Accept",
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder().default_headers(h).build()?;

        Ok(ExchangeRateApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn latest_url(&self, from: Currency) -> String {
        format!("{}/latest/{}", self.base_url, from.code())
    }

    pub fn latest_request(
        &self,
        from: Currency,
        to: Currency,
    ) -> Result<reqwest::Request, RateFetchError> {
        let request = self
            .client
            .get(self.latest_url(from))
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("base", from.code()),
                ("symbols", to.code()),
            ])
            .build()?;
        Ok(request)
    }
}

#[async_trait]
impl RateSource for ExchangeRateApi {
    async fn fetch(&self, from: Currency, to: Currency) -> Result<ExchangeRate, RateFetchError> {
        let request = self.latest_request(from, to)?;
        let response = self.client.execute(request).await?;
        check_status(response.status())?;

        let body: Value = response.json().await?;
        let rate = parse_latest(body, from, to)?;
        log::debug!("Fetched exchange rate {} -> {}: {}", from, to, rate.rate());
        Ok(rate)
    }
}

pub fn check_status(status: StatusCode) -> Result<(), RateFetchError> {
    if status != StatusCode::OK {
        return Err(RateFetchError::StatusError(status));
    }
    Ok(())
}

// Body of a `latest` response. Only the rates are read.
#[derive(Debug, Deserialize)]
pub struct LatestRates {
    #[serde(default)]
    pub rates: Option<Value>,
}

// Any body that is not an object with a `rates` object is an invalid format.
pub fn parse_latest(
    body: Value,
    from: Currency,
    to: Currency,
) -> Result<ExchangeRate, RateFetchError> {
    let latest: LatestRates =
        serde_json::from_value(body).map_err(|_| RateFetchError::InvalidFormat)?;
    parse_rate(&latest, from, to)
}

// Reads `rates.<TO>` from a response body.
pub fn parse_rate(
    body: &LatestRates,
    from: Currency,
    to: Currency,
) -> Result<ExchangeRate, RateFetchError> {
    let rates = match &body.rates {
        Some(Value::Object(rates)) => rates,
        _ => return Err(RateFetchError::InvalidFormat),
    };

    let rate = rates
        .get(to.code())
        .and_then(Value::as_f64)
        .ok_or(RateFetchError::RateNotFound(from, to))?;

    Ok(ExchangeRate::new(from, to, rate)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: Value) -> LatestRates {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_fixed_rate_both_directions() {
        let source = FixedRate::new(1.22).unwrap();

        let forward = source.fetch(Currency::GBP, Currency::USD).await.unwrap();
        assert_eq!(forward.rate(), 1.22);

        let backward = source.fetch(Currency::USD, Currency::GBP).await.unwrap();
        assert!((backward.apply(61.0) - 50.0).abs() < 1e-9);

        let same = source.fetch(Currency::GBP, Currency::GBP).await.unwrap();
        assert_eq!(same.rate(), 1.0);
    }

    #[test]
    fn test_fixed_rate_rejects_non_positive() {
        assert!(FixedRate::new(0.0).is_err());
        assert!(FixedRate::new(-1.0).is_err());
    }

    #[test]
    fn test_parse_rate() {
        let latest = body(json!({ "base": "GBP", "rates": { "USD": 1.27, "EUR": 1.17 } }));
        let rate = parse_rate(&latest, Currency::GBP, Currency::USD).unwrap();
        assert_eq!(rate.rate(), 1.27);

        // Integer rates are accepted too
        let latest = body(json!({ "rates": { "USD": 2 } }));
        assert_eq!(
            parse_rate(&latest, Currency::GBP, Currency::USD).unwrap().rate(),
            2.0
        );
    }

    #[test]
    fn test_parse_rate_failures() {
        let missing_rates = body(json!({ "result": "error" }));
        assert!(matches!(
            parse_rate(&missing_rates, Currency::GBP, Currency::USD),
            Err(RateFetchError::InvalidFormat)
        ));

        let missing_target = body(json!({ "rates": { "EUR": 1.17 } }));
        assert!(matches!(
            parse_rate(&missing_target, Currency::GBP, Currency::USD),
            Err(RateFetchError::RateNotFound(Currency::GBP, Currency::USD))
        ));

        let malformed = body(json!({ "rates": { "USD": "1.27" } }));
        assert!(matches!(
            parse_rate(&malformed, Currency::GBP, Currency::USD),
            Err(RateFetchError::RateNotFound(_, _))
        ));

        let zero = body(json!({ "rates": { "USD": 0.0 } }));
        assert!(matches!(
            parse_rate(&zero, Currency::GBP, Currency::USD),
            Err(RateFetchError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_malformed_bodies_are_invalid_format() {
        for malformed in [
            json!({ "rates": 5 }),
            json!({ "rates": [1.27] }),
            json!({ "rates": null }),
            json!([{ "USD": 1.27 }]),
            json!("USD"),
        ] {
            assert!(
                matches!(
                    parse_latest(malformed.clone(), Currency::GBP, Currency::USD),
                    Err(RateFetchError::InvalidFormat)
                ),
                "{malformed} should be an invalid format"
            );
        }

        let rate = parse_latest(json!({ "rates": { "GBP": 0.79 } }), Currency::USD, Currency::GBP);
        assert_eq!(rate.unwrap().rate(), 0.79);
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        for status in [
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            assert!(matches!(
                check_status(status),
                Err(RateFetchError::StatusError(code)) if code == status
            ));
        }
    }

    #[test]
    fn test_latest_request() {
        let api = ExchangeRateApi::new("https://rates.example.com/v4/", "secret").unwrap();
        let request = api.latest_request(Currency::USD, Currency::GBP).unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        let url = request.url();
        assert_eq!(url.host_str(), Some("rates.example.com"));
        assert_eq!(url.path(), "/v4/latest/USD");
        assert_eq!(url.query(), Some("apikey=secret&base=USD&symbols=GBP"));
    }

    #[test]
    fn test_exchange_rate_api_requires_key() {
        assert!(matches!(
            ExchangeRateApi::new("https://api.exchangerate-api.com/v4", ""),
            Err(RateFetchError::MissingApiKey)
        ));

        let api = ExchangeRateApi::new("https://api.exchangerate-api.com/v4/", "key").unwrap();
        assert_eq!(
            api.latest_url(Currency::GBP),
            "https://api.exchangerate-api.com/v4/latest/GBP"
        );
    }
}
