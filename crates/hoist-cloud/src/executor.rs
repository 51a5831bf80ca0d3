use crate::cli::CliError;

/// Abstraction over external CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait CliExecutor: Send + Sync {
    /// Execute a command and capture stdout.
    async fn exec(&self, args: &[String]) -> Result<String, CliError>;

    /// Execute a command, streaming output to the terminal.
    async fn exec_streaming(&self, args: &[String]) -> Result<(), CliError>;

    /// Execute a command with data piped to stdin.
    async fn exec_with_stdin(&self, args: &[String], stdin_data: &[u8])
    -> Result<String, CliError>;
}

/// Executor that spawns a real program (`aws` or `docker`).
#[derive(Debug, Clone)]
pub struct RealExecutor {
    program: &'static str,
}

impl RealExecutor {
    pub fn aws() -> Self {
        Self { program: "aws" }
    }

    pub fn docker() -> Self {
        Self { program: "docker" }
    }

    fn command(&self, args: &[String]) -> tokio::process::Command {
        tracing::debug!(program = self.program, ?args, "exec");
        let mut cmd = tokio::process::Command::new(self.program);
        cmd.args(args);
        cmd
    }

    fn not_found(&self, source: std::io::Error) -> CliError {
        CliError::NotFound {
            program: self.program.to_owned(),
            source,
        }
    }

    fn captured(&self, args: &[String], output: std::process::Output) -> Result<String, CliError> {
        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| CliError::InvalidUtf8 {
                program: self.program.to_owned(),
                source: e,
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(CliError::CommandFailed {
                program: self.program.to_owned(),
                args: args.to_vec(),
                stderr,
            })
        }
    }
}

impl CliExecutor for RealExecutor {
    async fn exec(&self, args: &[String]) -> Result<String, CliError> {
        use std::process::Stdio;

        let output = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.not_found(e))?;

        self.captured(args, output)
    }

    async fn exec_streaming(&self, args: &[String]) -> Result<(), CliError> {
        use std::process::Stdio;

        let status = self
            .command(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| self.not_found(e))?;

        if status.success() {
            Ok(())
        } else {
            Err(CliError::CommandFailed {
                program: self.program.to_owned(),
                args: args.to_vec(),
                stderr: format!("exit code: {status}"),
            })
        }
    }

    async fn exec_with_stdin(
        &self,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, CliError> {
        use std::process::Stdio;
        use tokio::io::AsyncWriteExt;

        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.not_found(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            let stdin_err = |e: std::io::Error| CliError::StdinWrite {
                program: self.program.to_owned(),
                source: e,
            };
            stdin.write_all(stdin_data).await.map_err(stdin_err)?;
            stdin.shutdown().await.map_err(stdin_err)?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.not_found(e))?;

        self.captured(args, output)
    }
}
