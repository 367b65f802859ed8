use std::{collections::HashMap, sync::Arc};

use super::{
    api::{RateFetchError, RateSource},
    currency::{Currency, CurrencyAmount, CurrencyError, PriceKind},
};

/* Processor is the overall logic center of the bot.
 * It owns the pricing arithmetic: Robux to GBP per price kind,
 * the marked up gamepass price, and conversions between GBP and USD.
 * It is built once at startup and shared read-only between requests.
 */

#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    #[error("{0}")]
    UnknownPriceKind(CurrencyError),
    #[error("{0}")]
    RateFetchError(RateFetchError),
    #[error("Amount is too large to price.")]
    AmountOutOfRange,
}

impl From<RateFetchError> for ProcessError {
    fn from(fetch_error: RateFetchError) -> ProcessError {
        ProcessError::RateFetchError(fetch_error)
    }
}

// Absorbs binary float error before flooring.
const FLOOR_EPSILON: f64 = 1e-9;

/* GBP per Robux, per price kind.
 * Immutable once built.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: HashMap<PriceKind, f64>,
}

impl RateTable {
    pub fn new(buy_then_transfer: f64, asset_then_transfer: f64) -> Self {
        RateTable::from_entries([
            (PriceKind::BuyThenTransfer, buy_then_transfer),
            (PriceKind::AssetThenTransfer, asset_then_transfer),
        ])
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (PriceKind, f64)>,
    {
        RateTable {
            rates: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, kind: PriceKind) -> Option<f64> {
        self.rates.get(&kind).copied()
    }
}

// Whether a unit is added after rounding the marked up gamepass price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingBuffer {
    #[default]
    None,
    AddOne,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingPolicy {
    pub markup_rate: f64,
    pub rounding_buffer: RoundingBuffer,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            markup_rate: 0.30,
            rounding_buffer: RoundingBuffer::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionRequest {
    pub kind: PriceKind,
    pub robux_amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionResult {
    pub robux_amount: u64,
    pub gamepass_price: u64,
    pub gbp_amount: f64,
    pub usd_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertQuote {
    pub from: CurrencyAmount,
    pub to: CurrencyAmount,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobuxQuote {
    pub paid: CurrencyAmount,
    pub gbp_amount: f64,
    pub usd_amount: f64,
    pub robux_amount: u64,
}

pub struct Processor {
    rate_table: RateTable,
    policy: PricingPolicy,
    rate_source: Arc<dyn RateSource>,
}

impl Processor {
    pub fn new(
        rate_table: RateTable,
        policy: PricingPolicy,
        rate_source: Arc<dyn RateSource>,
    ) -> Self {
        Processor {
            rate_table,
            policy,
            rate_source,
        }
    }

    pub fn lookup_rate(&self, kind: PriceKind) -> Result<f64, ProcessError> {
        self.rate_table.get(kind).ok_or_else(|| {
            ProcessError::UnknownPriceKind(CurrencyError::UnknownPriceKind(kind.tag().to_string()))
        })
    }

    pub fn compute_gbp_amount(&self, kind: PriceKind, amount: u64) -> Result<f64, ProcessError> {
        Ok(amount as f64 * self.lookup_rate(kind)?)
    }

    // What the seller keeps from a sale at `price`.
    pub fn net_proceeds(&self, price: u64) -> u64 {
        (price as f64 * (1.0 - self.policy.markup_rate) + FLOOR_EPSILON).floor() as u64
    }

    /* b/t: the amount itself.
     * a/t: round(amount / (1 - markup)), plus one under the AddOne policy,
     * then raised until the seller nets at least `amount`.
     * Fails when the price does not fit in a u64.
     */
    pub fn compute_gamepass_price(
        &self,
        kind: PriceKind,
        amount: u64,
    ) -> Result<u64, ProcessError> {
        match kind {
            PriceKind::BuyThenTransfer => Ok(amount),
            PriceKind::AssetThenTransfer => {
                let marked_up = (amount as f64 / (1.0 - self.policy.markup_rate)).round();
                // u64::MAX as f64 is 2^64, one past the largest u64
                if marked_up >= u64::MAX as f64 {
                    return Err(ProcessError::AmountOutOfRange);
                }

                let mut price = match self.policy.rounding_buffer {
                    RoundingBuffer::None => marked_up as u64,
                    RoundingBuffer::AddOne => (marked_up as u64)
                        .checked_add(1)
                        .ok_or(ProcessError::AmountOutOfRange)?,
                };
                while self.net_proceeds(price) < amount {
                    price = price.checked_add(1).ok_or(ProcessError::AmountOutOfRange)?;
                }
                Ok(price)
            }
        }
    }

    pub async fn convert_gbp_to_usd(&self, gbp: f64) -> Result<f64, ProcessError> {
        let rate = self.rate_source.fetch(Currency::GBP, Currency::USD).await?;
        Ok(rate.apply(gbp))
    }

    pub async fn convert_usd_to_gbp(&self, usd: f64) -> Result<f64, ProcessError> {
        let rate = self.rate_source.fetch(Currency::USD, Currency::GBP).await?;
        Ok(rate.apply(usd))
    }

    // The markup lives in the per kind rate; USD is derived from GBP last.
    pub async fn price(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionResult, ProcessError> {
        let gbp_amount = self.compute_gbp_amount(request.kind, request.robux_amount)?;
        let gamepass_price = self.compute_gamepass_price(request.kind, request.robux_amount)?;
        let usd_amount = self.convert_gbp_to_usd(gbp_amount).await?;

        Ok(ConversionResult {
            robux_amount: request.robux_amount,
            gamepass_price,
            gbp_amount,
            usd_amount,
        })
    }

    pub async fn convert(
        &self,
        currency: Currency,
        amount: f64,
    ) -> Result<ConvertQuote, ProcessError> {
        let converted = match currency {
            Currency::GBP => self.convert_gbp_to_usd(amount).await?,
            Currency::USD => self.convert_usd_to_gbp(amount).await?,
        };

        Ok(ConvertQuote {
            from: CurrencyAmount::new(currency, amount),
            to: CurrencyAmount::new(currency.counterpart(), converted),
        })
    }

    // Robux affordable at the b/t rate.
    pub async fn robux(&self, currency: Currency, amount: f64) -> Result<RobuxQuote, ProcessError> {
        let (gbp_amount, usd_amount) = match currency {
            Currency::GBP => (amount, self.convert_gbp_to_usd(amount).await?),
            Currency::USD => (self.convert_usd_to_gbp(amount).await?, amount),
        };

        let rate = self.lookup_rate(PriceKind::BuyThenTransfer)?;
        let robux_amount = (gbp_amount / rate + FLOOR_EPSILON).floor();
        if robux_amount >= u64::MAX as f64 {
            return Err(ProcessError::AmountOutOfRange);
        }

        Ok(RobuxQuote {
            paid: CurrencyAmount::new(currency, amount),
            gbp_amount,
            usd_amount,
            robux_amount: robux_amount as u64,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::bot::{api::FixedRate, currency::ExchangeRate};

    pub(crate) fn fixed_processor(policy: PricingPolicy) -> Processor {
        Processor::new(
            RateTable::new(0.0045, 0.00675),
            policy,
            Arc::new(FixedRate::new(1.22).unwrap()),
        )
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    // Live-style source with asymmetric rates per direction.
    struct AsymmetricRates;

    #[async_trait]
    impl RateSource for AsymmetricRates {
        async fn fetch(
            &self,
            from: Currency,
            to: Currency,
        ) -> Result<ExchangeRate, RateFetchError> {
            let rate = match (from, to) {
                (Currency::GBP, Currency::USD) => 1.25,
                (Currency::USD, Currency::GBP) => 0.75,
                _ => 1.0,
            };
            Ok(ExchangeRate::new(from, to, rate)?)
        }
    }

    struct FailingRates;

    #[async_trait]
    impl RateSource for FailingRates {
        async fn fetch(
            &self,
            _from: Currency,
            _to: Currency,
        ) -> Result<ExchangeRate, RateFetchError> {
            Err(RateFetchError::InvalidFormat)
        }
    }

    #[test]
    fn test_buy_then_transfer_is_identity() {
        let processor = fixed_processor(PricingPolicy::default());
        for amount in [0, 1, 7, 100, 143, 9_999, 1_000_000] {
            assert_eq!(
                processor.compute_gamepass_price(PriceKind::BuyThenTransfer, amount).unwrap(),
                amount
            );
        }
    }

    #[test]
    fn test_asset_then_transfer_markup() {
        let processor = fixed_processor(PricingPolicy::default());
        assert_eq!(
            processor.compute_gamepass_price(PriceKind::AssetThenTransfer, 100).unwrap(),
            143
        );
        assert_eq!(
            processor.compute_gamepass_price(PriceKind::AssetThenTransfer, 0).unwrap(),
            0
        );

        let buffered = fixed_processor(PricingPolicy {
            rounding_buffer: RoundingBuffer::AddOne,
            ..PricingPolicy::default()
        });
        assert_eq!(
            buffered.compute_gamepass_price(PriceKind::AssetThenTransfer, 100).unwrap(),
            144
        );
    }

    #[test]
    fn test_asset_then_transfer_always_nets_amount() {
        for policy in [RoundingBuffer::None, RoundingBuffer::AddOne] {
            let processor = fixed_processor(PricingPolicy {
                rounding_buffer: policy,
                ..PricingPolicy::default()
            });
            for amount in 0..5_000 {
                let price = processor
                    .compute_gamepass_price(PriceKind::AssetThenTransfer, amount)
                    .unwrap();
                assert!(price >= amount);
                assert!(
                    processor.net_proceeds(price) >= amount,
                    "{price} nets less than {amount}"
                );
            }
        }
    }

    #[test]
    fn test_rounding_shortfall_is_raised() {
        // round(1 / 0.7) = 1, which would net nothing
        let processor = fixed_processor(PricingPolicy::default());
        assert_eq!(
            processor.compute_gamepass_price(PriceKind::AssetThenTransfer, 1).unwrap(),
            2
        );
    }

    #[test]
    fn test_oversized_prices_fail_instead_of_overflowing() {
        // 2^63 / 0.4 is past u64::MAX
        let processor = fixed_processor(PricingPolicy {
            markup_rate: 0.6,
            rounding_buffer: RoundingBuffer::None,
        });
        assert!(matches!(
            processor.compute_gamepass_price(PriceKind::AssetThenTransfer, i64::MAX as u64),
            Err(ProcessError::AmountOutOfRange)
        ));

        let buffered = fixed_processor(PricingPolicy {
            markup_rate: 0.5,
            rounding_buffer: RoundingBuffer::AddOne,
        });
        assert!(matches!(
            buffered.compute_gamepass_price(PriceKind::AssetThenTransfer, u64::MAX),
            Err(ProcessError::AmountOutOfRange)
        ));
        // 2^62 / 0.5 = 2^63 still fits, plus the buffer
        assert_eq!(
            buffered
                .compute_gamepass_price(PriceKind::AssetThenTransfer, 1 << 62)
                .unwrap(),
            (1 << 63) + 1
        );
        assert_eq!(
            buffered
                .compute_gamepass_price(PriceKind::BuyThenTransfer, u64::MAX)
                .unwrap(),
            u64::MAX
        );
    }

    #[tokio::test]
    async fn test_oversized_robux_quote_fails() {
        let processor = fixed_processor(PricingPolicy::default());
        assert!(matches!(
            processor.robux(Currency::GBP, 1e300).await,
            Err(ProcessError::AmountOutOfRange)
        ));
        assert!(matches!(
            processor
                .price(ConversionRequest {
                    kind: PriceKind::AssetThenTransfer,
                    robux_amount: u64::MAX,
                })
                .await,
            Err(ProcessError::AmountOutOfRange)
        ));
    }

    #[test]
    fn test_lookup_rate_missing_kind() {
        let processor = Processor::new(
            RateTable::from_entries([(PriceKind::BuyThenTransfer, 0.0045)]),
            PricingPolicy::default(),
            Arc::new(FixedRate::new(1.22).unwrap()),
        );
        assert_eq!(processor.lookup_rate(PriceKind::BuyThenTransfer).unwrap(), 0.0045);
        assert!(matches!(
            processor.lookup_rate(PriceKind::AssetThenTransfer),
            Err(ProcessError::UnknownPriceKind(_))
        ));
        assert!(processor
            .compute_gbp_amount(PriceKind::AssetThenTransfer, 100)
            .is_err());
    }

    #[tokio::test]
    async fn test_price_buy_then_transfer() {
        let processor = fixed_processor(PricingPolicy::default());
        let result = processor
            .price(ConversionRequest {
                kind: PriceKind::BuyThenTransfer,
                robux_amount: 100,
            })
            .await
            .unwrap();

        assert_eq!(result.robux_amount, 100);
        assert_eq!(result.gamepass_price, 100);
        assert_close(result.gbp_amount, 0.45);
        assert_close(result.usd_amount, 0.549);
    }

    #[tokio::test]
    async fn test_price_asset_then_transfer() {
        let processor = fixed_processor(PricingPolicy::default());
        let result = processor
            .price(ConversionRequest {
                kind: PriceKind::AssetThenTransfer,
                robux_amount: 100,
            })
            .await
            .unwrap();

        assert_eq!(result.gamepass_price, 143);
        assert_close(result.gbp_amount, 0.675);
        assert_close(result.usd_amount, 0.8235);
    }

    #[tokio::test]
    async fn test_convert() {
        let processor = fixed_processor(PricingPolicy::default());

        let quote = processor.convert(Currency::GBP, 50.0).await.unwrap();
        assert_eq!(quote.from, CurrencyAmount::new(Currency::GBP, 50.0));
        assert_eq!(quote.to.currency, Currency::USD);
        assert_close(quote.to.magnitude, 61.0);

        let quote = processor.convert(Currency::USD, 61.0).await.unwrap();
        assert_eq!(quote.to.currency, Currency::GBP);
        assert_close(quote.to.magnitude, 50.0);
    }

    #[tokio::test]
    async fn test_live_rates_are_not_assumed_symmetric() {
        let processor = Processor::new(
            RateTable::new(0.0045, 0.00675),
            PricingPolicy::default(),
            Arc::new(AsymmetricRates),
        );
        assert_close(processor.convert_gbp_to_usd(100.0).await.unwrap(), 125.0);
        assert_close(processor.convert_usd_to_gbp(100.0).await.unwrap(), 75.0);
    }

    #[tokio::test]
    async fn test_robux() {
        let processor = fixed_processor(PricingPolicy::default());

        let quote = processor.robux(Currency::GBP, 10.0).await.unwrap();
        assert_eq!(quote.robux_amount, 2222);
        assert_close(quote.gbp_amount, 10.0);
        assert_close(quote.usd_amount, 12.2);

        // 9 / 0.0045 is exactly 2000 on paper
        let quote = processor.robux(Currency::GBP, 9.0).await.unwrap();
        assert_eq!(quote.robux_amount, 2000);

        let quote = processor.robux(Currency::USD, 12.2).await.unwrap();
        assert_eq!(quote.paid, CurrencyAmount::new(Currency::USD, 12.2));
        assert_close(quote.gbp_amount, 10.0);
    }

    #[tokio::test]
    async fn test_rate_failures_propagate() {
        let processor = Processor::new(
            RateTable::new(0.0045, 0.00675),
            PricingPolicy::default(),
            Arc::new(FailingRates),
        );
        let result = processor
            .price(ConversionRequest {
                kind: PriceKind::BuyThenTransfer,
                robux_amount: 100,
            })
            .await;
        assert!(matches!(result, Err(ProcessError::RateFetchError(_))));
        assert!(processor.convert(Currency::GBP, 1.0).await.is_err());
        assert!(processor.robux(Currency::USD, 1.0).await.is_err());
    }
}
