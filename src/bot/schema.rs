/* Schema describes the commands the bot answers to.
 * The platform adapter registers these and uses the declared option kinds
 * to type the arguments it receives. The router trusts the names in here.
 */

pub const COMMAND_PRICE: &str = "price";
pub const COMMAND_CONVERT: &str = "convert";
pub const COMMAND_ROBUX: &str = "robux";
pub const COMMAND_HELP: &str = "help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub choices: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub options: &'static [OptionSchema],
}

const CURRENCY_OPTION: OptionSchema = OptionSchema {
    name: "currency",
    description: "Currency to convert from (GBP or USD)",
    kind: OptionKind::String,
    choices: &["GBP", "USD"],
};

const FIAT_AMOUNT_OPTION: OptionSchema = OptionSchema {
    name: "amount",
    description: "Amount to convert",
    kind: OptionKind::Number,
    choices: &[],
};

pub const COMMANDS: &[CommandSchema] = &[
    CommandSchema {
        name: COMMAND_HELP,
        description: "Display the available commands and their usage",
        options: &[],
    },
    CommandSchema {
        name: COMMAND_PRICE,
        description: "Calculate the price in GBP and USD for a given amount of Robux",
        options: &[
            OptionSchema {
                name: "type",
                description: "Conversion type (b/t or a/t)",
                kind: OptionKind::String,
                choices: &["b/t", "a/t"],
            },
            OptionSchema {
                name: "amount",
                description: "Amount of Robux",
                kind: OptionKind::Integer,
                choices: &[],
            },
        ],
    },
    CommandSchema {
        name: COMMAND_CONVERT,
        description: "Convert between GBP and USD",
        options: &[CURRENCY_OPTION, FIAT_AMOUNT_OPTION],
    },
    CommandSchema {
        name: COMMAND_ROBUX,
        description: "Convert GBP or USD to the amount of Robux",
        options: &[CURRENCY_OPTION, FIAT_AMOUNT_OPTION],
    },
];

pub fn find_command(name: &str) -> Option<&'static CommandSchema> {
    COMMANDS.iter().find(|command| command.name == name)
}

impl CommandSchema {
    // Usage line, e.g. "/price <type> <amount>".
    pub fn usage(&self) -> String {
        let mut usage = format!("/{}", self.name);
        for option in self.options {
            usage.push_str(&format!(" <{}>", option.name));
        }
        usage
    }
}
