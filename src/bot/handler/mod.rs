// Exported functions
pub use self::commands::{action_convert, action_help, action_price, action_robux};
pub use self::format::{error_response, format_robux, help_response};
pub use self::options::{parse_amount, parse_currency_options, parse_options, parse_price_options};

// Exported structs and types
pub use self::format::{Embed, EmbedField, Response};
pub use self::options::{CommandOption, NumericValue, OptionError, ParsedOptions};
pub use self::utils::{BotError, HandlerResult};

// Submodules
mod commands;
mod constants;
mod format;
mod options;
mod utils;
