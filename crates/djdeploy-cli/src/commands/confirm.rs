use djdeploy_cloud::{ConfirmError, Confirmer};

/// Asks on the terminal, defaulting to "no".
pub struct InteractiveConfirmer;

impl Confirmer for InteractiveConfirmer {
    fn confirm(&self, message: &str) -> Result<bool, ConfirmError> {
        println!("{message}");
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Are you sure you want to do this?")
            .default(false)
            .interact()
            .map_err(|e| ConfirmError {
                source: Box::new(e),
            })?;
        tracing::debug!(confirmed, "confirmation answered");
        Ok(confirmed)
    }
}
