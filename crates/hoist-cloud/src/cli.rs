#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{program} CLI not found — is it installed and on PATH?")]
    NotFound {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} command failed: {args:?}\n{stderr}")]
    CommandFailed {
        program: String,
        args: Vec<String>,
        stderr: String,
    },

    #[error("{program} output was not valid UTF-8")]
    InvalidUtf8 {
        program: String,
        source: std::string::FromUtf8Error,
    },

    #[error("failed to write to {program} stdin")]
    StdinWrite {
        program: String,
        source: std::io::Error,
    },
}

impl CliError {
    /// Whether the command ran and reported `marker` on stderr.
    ///
    /// Used to tell a service's "no such resource" answer apart from
    /// every other failure.
    pub fn stderr_contains(&self, marker: &str) -> bool {
        matches!(self, Self::CommandFailed { stderr, .. } if stderr.contains(marker))
    }
}
