/// Asks the operator whether to go ahead with an action.
///
/// Injected into anything that creates resources on the user's account, so
/// automated and test runs can approve without a terminal.
pub trait Confirmer: Send + Sync {
    /// Show `message` and return the operator's answer.
    fn confirm(&self, message: &str) -> Result<bool, ConfirmError>;
}

/// Approves everything; used for `--automate-all` and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl Confirmer for AutoApprove {
    fn confirm(&self, message: &str) -> Result<bool, ConfirmError> {
        tracing::debug!(%message, "confirmation skipped");
        Ok(true)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to read confirmation")]
pub struct ConfirmError {
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// The operator chose not to continue. Not a failure: the process exits
/// successfully after printing the message.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Declined {
    pub message: String,
}

impl Declined {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
