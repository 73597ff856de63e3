use thiserror::Error;

use kubedeck_types::{ApiError, ItemId, UserMessage};

use crate::batch::BatchFailure;

/// Errors raised by the console core
#[derive(Clone, Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A batch verb the resource type does not declare. Callers should never
    /// offer such verbs, so this indicates a wiring mistake.
    #[error("{verb} is not supported for {resource}")]
    UnsupportedVerb {
        verb: &'static str,
        resource: String,
    },

    #[error(transparent)]
    Batch(#[from] BatchFailure),

    #[error("no cluster selected")]
    NoCluster,

    #[error("nothing selected")]
    EmptySelection,

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("action '{0}' is disabled for this item")]
    ActionDisabled(String),

    #[error("action '{0}' is not available for this item")]
    ActionHidden(String),

    #[error("item {0} is not in the current list")]
    UnknownItem(ItemId),

    #[error("another operation is still running")]
    Busy,

    #[error("invalid label: {0}")]
    InvalidLabel(String),
}

impl UserMessage for ConsoleError {
    fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            Self::Batch(failure) => failure.user_message(),
            other => other.to_string(),
        }
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
