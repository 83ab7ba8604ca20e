use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Placeholder shown wherever a secret argument would be printed.
pub const REDACTED: &str = "[REDACTED]";

/// A gcloud invocation whose secret arguments never show up when displayed.
///
/// `Display` renders the full command line (`gcloud sql instances create ...`)
/// with secret values replaced by [`REDACTED`]; only [`as_args`](Self::as_args)
/// exposes them, for the executor.
#[derive(Clone, Default)]
pub struct GcloudCommand {
    args: Vec<String>,
    secret_positions: Vec<usize>,
}

impl GcloudCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            secret_positions: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append `--name value`.
    pub fn flag(self, name: &str, value: impl Into<String>) -> Self {
        self.arg(name).arg(value)
    }

    /// Append `--name value` where the value is hidden from display.
    pub fn secret_flag(mut self, name: &str, value: &SecretString) -> Self {
        self.args.push(name.to_owned());
        self.secret_positions.push(self.args.len());
        self.args.push(value.expose_secret().to_owned());
        self
    }

    pub fn as_args(&self) -> &[String] {
        &self.args
    }

    pub fn has_secrets(&self) -> bool {
        !self.secret_positions.is_empty()
    }
}

impl fmt::Display for GcloudCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("gcloud")?;
        for (i, arg) in self.args.iter().enumerate() {
            if self.secret_positions.contains(&i) {
                write!(f, " {REDACTED}")?;
            } else if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for GcloudCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GcloudCommand")
            .field(&self.to_string())
            .finish()
    }
}
