use crate::bot::{
    currency::{Currency, CurrencyAmount, PriceKind},
    processor::{ConversionResult, ConvertQuote, RobuxQuote},
    schema::CommandSchema,
};

use super::constants::{
    EMBED_COLOR, ERROR_PREFIX, HELP_INTRODUCTION, LABEL_GAMEPASS_PRICE, ROBUX_SYMBOL,
    TITLE_CONVERT, TITLE_HELP, TITLE_PRICE, TITLE_ROBUX,
};

/* Format builds the payloads handed to the platform.
 * Either a structured embed, or a plain error message. Never both.
 * Nothing in here sends anything.
 */

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub label: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub fields: Vec<EmbedField>,
    pub color: u32,
    pub ephemeral: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Embed(Embed),
    Error(String),
}

impl Embed {
    fn new(title: &str, description: String) -> Self {
        Embed {
            title: title.to_string(),
            description,
            fields: Vec::new(),
            color: EMBED_COLOR,
            ephemeral: false,
        }
    }

    fn field(mut self, label: &str, value: String) -> Self {
        self.fields.push(EmbedField {
            label: label.to_string(),
            value,
            inline: true,
        });
        self
    }

    fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

pub fn format_robux(amount: u64) -> String {
    format!("{amount} {ROBUX_SYMBOL}")
}

fn amount_label(currency: Currency) -> String {
    format!("Amount in {currency}")
}

pub fn price_response(kind: PriceKind, result: &ConversionResult) -> Response {
    let gbp = CurrencyAmount::new(Currency::GBP, result.gbp_amount);
    let usd = CurrencyAmount::new(Currency::USD, result.usd_amount);

    let embed = Embed::new(
        TITLE_PRICE,
        format!(
            "Conversion Type: {kind}\nAmount of Robux: {}",
            result.robux_amount
        ),
    )
    .field(LABEL_GAMEPASS_PRICE, format_robux(result.gamepass_price))
    .field(&amount_label(Currency::GBP), gbp.to_string())
    .field(&amount_label(Currency::USD), usd.to_string());

    Response::Embed(embed)
}

pub fn convert_response(quote: &ConvertQuote) -> Response {
    let embed = Embed::new(TITLE_CONVERT, String::new())
        .field(&amount_label(quote.from.currency), quote.from.to_string())
        .field(&amount_label(quote.to.currency), quote.to.to_string());

    Response::Embed(embed)
}

// "£10.00 affords 2222 R$ ($12.20)"
pub fn robux_response(quote: &RobuxQuote) -> Response {
    let other = match quote.paid.currency {
        Currency::GBP => CurrencyAmount::new(Currency::USD, quote.usd_amount),
        Currency::USD => CurrencyAmount::new(Currency::GBP, quote.gbp_amount),
    };

    let embed = Embed::new(
        TITLE_ROBUX,
        format!(
            "{} affords {} ({other})",
            quote.paid,
            format_robux(quote.robux_amount)
        ),
    );

    Response::Embed(embed)
}

pub fn help_response(commands: &[CommandSchema]) -> Response {
    let mut description = HELP_INTRODUCTION.to_string();
    for command in commands {
        description.push_str(&format!("\n{}: {}", command.usage(), command.description));
    }

    Response::Embed(Embed::new(TITLE_HELP, description).ephemeral())
}

pub fn error_response(error: &dyn std::error::Error) -> Response {
    Response::Error(format!("{ERROR_PREFIX}: {error}"))
}
