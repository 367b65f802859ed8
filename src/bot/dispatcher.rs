use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Number, Value};
use teloxide::{
    prelude::*,
    types::{BotCommand, ChatId, Me, MessageId, ParseMode, UserId},
    utils::{
        command::parse_command,
        markdown::{bold, escape},
    },
    RequestError,
};
use tokio::sync::mpsc;

use super::{
    handler::{CommandOption, Embed, Response},
    router::{DeliveryError, InboundEvent, Interaction, Responder, Router},
    schema::{find_command, OptionKind, COMMANDS},
};

/* Dispatcher connects the bot to Telegram.
 * Incoming command messages are turned into interactions and queued for the Router.
 * Responses come back through TelegramResponder, rendered as MarkdownV2.
 */

const EVENT_QUEUE_SIZE: usize = 256;

pub type EventSender = mpsc::Sender<InboundEvent<TelegramResponder>>;

#[derive(Clone)]
pub struct TelegramResponder {
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    invoker: Option<UserId>,
    bot_username: String,
}

#[async_trait]
impl Responder for TelegramResponder {
    async fn deliver(&self, response: &Response) -> Result<(), DeliveryError> {
        match response {
            // Ephemeral embeds go to the invoker's private chat
            Response::Embed(embed) if embed.ephemeral => {
                let user_id = self.invoker.ok_or(DeliveryError::NoRecipient)?;
                self.bot
                    .send_message(ChatId::from(user_id), render_embed(embed, &self.bot_username))
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
            }
            Response::Embed(embed) => {
                self.bot
                    .send_message(self.chat_id, render_embed(embed, &self.bot_username))
                    .parse_mode(ParseMode::MarkdownV2)
                    .reply_to_message_id(self.message_id)
                    .await?;
            }
            Response::Error(message) => {
                self.bot
                    .send_message(self.chat_id, message.as_str())
                    .reply_to_message_id(self.message_id)
                    .await?;
            }
        }
        Ok(())
    }
}

/* Utility functions */

// Embed as MarkdownV2: bold title, description, one line per field, footer.
pub fn render_embed(embed: &Embed, bot_username: &str) -> String {
    let mut text = bold(&escape(&embed.title));

    if !embed.description.is_empty() {
        text.push_str(&format!("\n\n{}", escape(&embed.description)));
    }

    if !embed.fields.is_empty() {
        text.push('\n');
        for field in &embed.fields {
            text.push_str(&format!(
                "\n{} {}",
                bold(&escape(&format!("{}:", field.label))),
                escape(&field.value)
            ));
        }
    }

    text.push_str(&format!(
        "\n\n{}",
        escape(&format!("Powered by @{bot_username}"))
    ));
    text
}

// Types an argument by the option kind the command declares for it.
fn typed_value(kind: OptionKind, arg: &str) -> Value {
    match kind {
        OptionKind::String => Value::String(arg.to_string()),
        OptionKind::Integer | OptionKind::Number => {
            if let Ok(integer) = arg.parse::<i64>() {
                Value::from(integer)
            } else if let Some(number) = arg.parse::<f64>().ok().and_then(Number::from_f64) {
                Value::Number(number)
            } else {
                Value::String(arg.to_string())
            }
        }
    }
}

/* Positional arguments to command options.
 * Arguments past the declared options, or of unknown commands, stay strings.
 */
pub fn build_options(command: &str, args: &[&str]) -> Vec<CommandOption> {
    let declared = find_command(command)
        .map(|schema| schema.options)
        .unwrap_or(&[]);

    args.iter()
        .enumerate()
        .map(|(index, arg)| match declared.get(index) {
            Some(option) => {
                CommandOption::new(option.name, option.kind, typed_value(option.kind, arg))
            }
            None => CommandOption::new(
                &format!("arg{index}"),
                OptionKind::String,
                Value::String(arg.to_string()),
            ),
        })
        .collect()
}

/* Endpoint handler functions */

// Every command message is queued; the Router decides what to answer.
async fn handle_message(bot: Bot, msg: Message, me: Me, events: EventSender) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some((command, args)) = parse_command(text, me.username()) else {
        return Ok(());
    };

    let event = InboundEvent {
        interaction: Interaction {
            id: format!("{}:{}", msg.chat.id.0, msg.id.0),
            command: command.to_string(),
            options: build_options(command, &args),
        },
        responder: TelegramResponder {
            bot,
            chat_id: msg.chat.id,
            message_id: msg.id,
            invoker: msg.from().map(|user| user.id),
            bot_username: me.username().to_string(),
        },
    };

    if events.send(event).await.is_err() {
        log::error!("Router is not accepting interactions, dropping /{}", command);
    }
    Ok(())
}

// Registers the command schema with Telegram.
pub async fn register_commands(bot: &Bot) -> Result<(), RequestError> {
    let commands = COMMANDS
        .iter()
        .map(|command| BotCommand::new(command.name, command.description));
    bot.set_my_commands(commands).await?;
    log::info!("Registered {} commands", COMMANDS.len());
    Ok(())
}

/* Main Dispatch function */
pub async fn run_dispatcher(bot: Bot, router: Arc<Router>) {
    let (sender, receiver) = mpsc::channel::<InboundEvent<TelegramResponder>>(EVENT_QUEUE_SIZE);
    let server = tokio::spawn(router.serve(receiver));

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![sender])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    // The dispatcher owned the only sender, so the router drains and stops
    if let Err(error) = server.await {
        log::error!("Router task failed: {}", error);
    }
}
