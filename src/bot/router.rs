use std::sync::Arc;

use async_trait::async_trait;
use teloxide::RequestError;
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinSet},
};

use super::{
    handler::{
        action_convert, action_help, action_price, action_robux, BotError, CommandOption,
        HandlerResult, Response,
    },
    processor::Processor,
    schema::{COMMAND_CONVERT, COMMAND_HELP, COMMAND_PRICE, COMMAND_ROBUX},
};

/* Router is the front-facing agent of the bot.
 * It receives interactions from the platform adapter, picks the handler for the
 * command, and is the only place that hands a response to the platform.
 * Every interaction runs in its own task, and is answered at most once.
 */

#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("Request error: {0}")]
    RequestError(RequestError),
    #[error("No recipient for response")]
    NoRecipient,
}

impl From<RequestError> for DeliveryError {
    fn from(request_error: RequestError) -> DeliveryError {
        DeliveryError::RequestError(request_error)
    }
}

#[async_trait]
pub trait Responder: Send + Sync {
    async fn deliver(&self, response: &Response) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: String,
    pub command: String,
    pub options: Vec<CommandOption>,
}

pub struct InboundEvent<R> {
    pub interaction: Interaction,
    pub responder: R,
}

/* Single-use response slot for one interaction.
 * The slot is spent as soon as a delivery is attempted, even if it fails.
 */
pub struct ResponseSlot<R> {
    responder: R,
    responded: bool,
}

impl<R: Responder> ResponseSlot<R> {
    pub fn new(responder: R) -> Self {
        ResponseSlot {
            responder,
            responded: false,
        }
    }

    pub fn has_responded(&self) -> bool {
        self.responded
    }

    pub async fn respond(&mut self, response: Response) -> Result<(), BotError> {
        if self.responded {
            return Err(BotError::AlreadyResponded);
        }
        self.responded = true;
        self.responder.deliver(&response).await?;
        Ok(())
    }
}

pub struct Router {
    processor: Arc<Processor>,
}

impl Router {
    pub fn new(processor: Arc<Processor>) -> Self {
        Router { processor }
    }

    /* Runs the handler for a command.
     * Unknown commands produce nothing.
     */
    pub async fn handle(&self, interaction: &Interaction) -> Option<HandlerResult> {
        let processor = self.processor.as_ref();
        let options = interaction.options.as_slice();

        let result = match interaction.command.as_str() {
            COMMAND_PRICE => action_price(processor, options).await,
            COMMAND_CONVERT => action_convert(processor, options).await,
            COMMAND_ROBUX => action_robux(processor, options).await,
            COMMAND_HELP => action_help().await,
            _ => return None,
        };
        Some(result)
    }

    // Handles one interaction and answers it through its slot.
    pub async fn dispatch<R: Responder>(
        &self,
        interaction: &Interaction,
        slot: &mut ResponseSlot<R>,
    ) {
        let response = match self.handle(interaction).await {
            None => {
                log::debug!(
                    "Ignoring unknown command /{} in interaction {}",
                    interaction.command,
                    interaction.id
                );
                return;
            }
            Some(Ok(response)) => {
                log::info!(
                    "Answered /{} in interaction {}",
                    interaction.command,
                    interaction.id
                );
                response
            }
            Some(Err(error)) => {
                log::warn!(
                    "Failed /{} in interaction {}: {}",
                    interaction.command,
                    interaction.id,
                    error
                );
                match error.to_response() {
                    Some(response) => response,
                    None => return,
                }
            }
        };

        if let Err(error) = slot.respond(response).await {
            log::error!(
                "Cannot respond to interaction {}: {}",
                interaction.id,
                error
            );
        }
    }

    /* Serves events until the sender side is closed.
     * One task per event; finished tasks are reaped as they complete.
     */
    pub async fn serve<R>(self: Arc<Self>, mut events: mpsc::Receiver<InboundEvent<R>>)
    where
        R: Responder + 'static,
    {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let router = Arc::clone(&self);
                        tasks.spawn(async move {
                            let mut slot = ResponseSlot::new(event.responder);
                            router.dispatch(&event.interaction, &mut slot).await;
                        });
                    }
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_task_result(joined),
            }
        }

        while let Some(joined) = tasks.join_next().await {
            log_task_result(joined);
        }
        log::info!("Router stopped, all interactions handled");
    }
}

fn log_task_result(joined: Result<(), JoinError>) {
    if let Err(error) = joined {
        log::error!("Interaction task failed: {}", error);
    }
}
