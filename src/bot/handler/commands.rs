use crate::bot::{
    processor::{ConversionRequest, Processor},
    schema::COMMANDS,
};

use super::{
    format::{convert_response, help_response, price_response, robux_response},
    options::{parse_currency_options, parse_price_options, CommandOption},
    utils::HandlerResult,
};

/* Price command.
 * Price of an amount of Robux in GBP and USD, and the gamepass price to list.
 */
pub async fn action_price(processor: &Processor, options: &[CommandOption]) -> HandlerResult {
    let (kind, robux_amount) = parse_price_options(options)?;
    let result = processor
        .price(ConversionRequest { kind, robux_amount })
        .await?;
    Ok(price_response(kind, &result))
}

/* Convert command.
 * Converts an amount of GBP to USD, or USD to GBP.
 */
pub async fn action_convert(processor: &Processor, options: &[CommandOption]) -> HandlerResult {
    let (currency, amount) = parse_currency_options(options)?;
    let quote = processor.convert(currency, amount).await?;
    Ok(convert_response(&quote))
}

/* Robux command.
 * Robux affordable with an amount of GBP or USD.
 */
pub async fn action_robux(processor: &Processor, options: &[CommandOption]) -> HandlerResult {
    let (currency, amount) = parse_currency_options(options)?;
    let quote = processor.robux(currency, amount).await?;
    Ok(robux_response(&quote))
}

/* Help command.
 * Displays a list of commands available to the user.
 */
pub async fn action_help() -> HandlerResult {
    Ok(help_response(COMMANDS))
}
