use std::{future::Future, process::Stdio};

use tokio::{
    io::{AsyncRead, AsyncWrite},
    process::{Child, ChildStdin, ChildStdout, Command},
};

use crate::error::ProcessError;

/// A running language server the client talks to over its standard streams.
pub trait ServerProcess {
    type Stdin: AsyncWrite + Unpin;
    type Stdout: AsyncRead + Unpin;

    /// Hands over the server's output and input streams. Succeeds once.
    fn take_stdio(&mut self) -> Result<(Self::Stdout, Self::Stdin), ProcessError>;

    /// Waits for the server to terminate, returning its exit code if it exited normally.
    fn wait(&mut self) -> impl Future<Output = Result<Option<i32>, ProcessError>>;

    fn kill(&mut self) -> impl Future<Output = Result<(), ProcessError>>;
}

/// A server spawned as a child process, stderr shared with ours.
pub struct ChildServer {
    child: Child,
}

impl ChildServer {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, ProcessError> {
        tracing::debug!(program, ?args, "Spawning language server.");
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        Ok(Self { child })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

impl ServerProcess for ChildServer {
    type Stdin = ChildStdin;
    type Stdout = ChildStdout;

    fn take_stdio(&mut self) -> Result<(ChildStdout, ChildStdin), ProcessError> {
        match (self.child.stdout.take(), self.child.stdin.take()) {
            (Some(stdout), Some(stdin)) => Ok((stdout, stdin)),
            (stdout, stdin) => {
                let missing_pipe = match stdin.is_none() {
                    true => "stdin",
                    false => "stdout",
                };
                // Hand back the pipe that was present.
                self.child.stdout = stdout;
                self.child.stdin = stdin;
                Err(ProcessError::MissingPipe(missing_pipe))
            }
        }
    }

    async fn wait(&mut self) -> Result<Option<i32>, ProcessError> {
        let exit_status = self.child.wait().await?;
        tracing::debug!(%exit_status, "Language server terminated.");
        Ok(exit_status.code())
    }

    async fn kill(&mut self) -> Result<(), ProcessError> {
        Ok(self.child.kill().await?)
    }
}
