use crate::gcloud::GcloudError;

/// Captured result of a buffered gcloud invocation.
///
/// A non-zero exit is data here, not an error: probes read it to decide
/// whether a resource exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Build an output, trimming surrounding whitespace from both streams.
    pub fn new(code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            code,
            stdout: stdout.trim().to_owned(),
            stderr: stderr.trim().to_owned(),
        }
    }

    /// Shorthand for a successful run printing `stdout`.
    pub fn ok(stdout: &str) -> Self {
        Self::new(0, stdout, "")
    }

    /// Shorthand for a failed run printing `stderr`.
    pub fn failed(code: i32, stderr: &str) -> Self {
        Self::new(code, "", stderr)
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Abstraction over gcloud CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks
/// or scripted fakes.
#[allow(async_fn_in_trait)]
pub trait GcloudExecutor: Send + Sync {
    /// Execute a gcloud command and capture its output.
    async fn exec(&self, args: &[String]) -> Result<CommandOutput, GcloudError>;

    /// Execute a gcloud command, streaming output to the terminal.
    /// Returns the exit code.
    async fn exec_streaming(&self, args: &[String]) -> Result<i32, GcloudError>;
}

/// Real gcloud CLI executor.
pub struct RealExecutor;

impl GcloudExecutor for RealExecutor {
    async fn exec(&self, args: &[String]) -> Result<CommandOutput, GcloudError> {
        use std::process::Stdio;

        let output = tokio::process::Command::new("gcloud")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GcloudError::NotFound { source: e })?;

        Ok(CommandOutput::new(
            // arch-lint: allow(no-silent-result-drop) reason="no exit code means gcloud was killed by a signal; reported as -1"
            output.status.code().unwrap_or(-1),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        ))
    }

    async fn exec_streaming(&self, args: &[String]) -> Result<i32, GcloudError> {
        use std::process::Stdio;

        let status = tokio::process::Command::new("gcloud")
            .args(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| GcloudError::NotFound { source: e })?;

        // arch-lint: allow(no-silent-result-drop) reason="no exit code means gcloud was killed by a signal; reported as -1"
        Ok(status.code().unwrap_or(-1))
    }
}
