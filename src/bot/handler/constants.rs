/* Fixed texts and styling used when building responses. */

pub const EMBED_COLOR: u32 = 0x0096FF;

pub const ROBUX_SYMBOL: &str = "R$";

pub const TITLE_PRICE: &str = "Price Calculation";
pub const TITLE_CONVERT: &str = "Currency Conversion";
pub const TITLE_ROBUX: &str = "Robux Calculation";
pub const TITLE_HELP: &str = "Available Commands";

pub const LABEL_GAMEPASS_PRICE: &str = "Gamepass Price";

pub const HELP_INTRODUCTION: &str = "Here are the available commands and their usage:";

pub const ERROR_PREFIX: &str = "Error";
