#[derive(Debug, thiserror::Error)]
pub enum GcloudError {
    #[error("gcloud CLI not found; install it from https://cloud.google.com/sdk/docs/install")]
    NotFound { source: std::io::Error },

    #[error("command failed with exit code {code}: {command}\n{stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },
}
