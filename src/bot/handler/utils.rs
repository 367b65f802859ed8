use crate::bot::{processor::ProcessError, router::DeliveryError};

use super::{
    format::{error_response, Response},
    options::OptionError,
};

/* Common utilites for handlers. */

pub type HandlerResult = Result<Response, BotError>;

#[derive(thiserror::Error, Debug)]
pub enum BotError {
    #[error("User error: {0}")]
    UserError(OptionError),
    #[error("Process error: {0}")]
    ProcessError(ProcessError),
    #[error("Delivery error: {0}")]
    DeliveryError(DeliveryError),
    #[error("Interaction has already been responded to")]
    AlreadyResponded,
}

impl From<OptionError> for BotError {
    fn from(option_error: OptionError) -> BotError {
        BotError::UserError(option_error)
    }
}

impl From<ProcessError> for BotError {
    fn from(process_error: ProcessError) -> BotError {
        BotError::ProcessError(process_error)
    }
}

impl From<DeliveryError> for BotError {
    fn from(delivery_error: DeliveryError) -> BotError {
        BotError::DeliveryError(delivery_error)
    }
}

impl BotError {
    // Message to show the user, if the user can still be told anything.
    pub fn to_response(&self) -> Option<Response> {
        match self {
            BotError::UserError(error) => Some(error_response(error)),
            BotError::ProcessError(error) => Some(error_response(error)),
            BotError::DeliveryError(_) | BotError::AlreadyResponded => None,
        }
    }
}
