//! External process boundary
//!
//! `tar`, `bzcat` and friends are driven through `std::process` since the
//! archive adapters are synchronous readers. Streaming children are wrapped
//! in a reader that reaps them at EOF and kills them when dropped early.

use crate::error::{FryerError, FryerResult};
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use tracing::debug;

/// Run a command to completion, failing on a non-zero exit
pub fn run(program: &str, args: &[&str]) -> FryerResult<()> {
    let command = describe(program, args);
    debug!("Executing: {}", command);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| FryerError::command_failed(command.clone(), e))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(FryerError::command_exec(command, stderr.trim()))
    }
}

/// Spawn a command and read its standard output as a byte stream
pub fn spawn_reader(program: &str, args: &[&str], cwd: Option<&Path>) -> FryerResult<ChildReader> {
    let command = describe(program, args);
    debug!("Streaming: {}", command);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| FryerError::command_failed(command.clone(), e))?;
    let Some(stdout) = child.stdout.take() else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(FryerError::Internal(format!("{} has no stdout pipe", command)));
    };

    Ok(ChildReader {
        child,
        stdout,
        command,
        reaped: false,
    })
}

/// Standard output of a running child process
pub struct ChildReader {
    child: Child,
    stdout: ChildStdout,
    command: String,
    reaped: bool,
}

impl ChildReader {
    /// OS process id, mostly useful for diagnostics
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl Read for ChildReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.stdout.read(buf)?;
        if n == 0 && !buf.is_empty() && !self.reaped {
            self.reaped = true;
            let status = self.child.wait()?;
            if !status.success() {
                return Err(io::Error::other(format!(
                    "{} exited with {}",
                    self.command, status
                )));
            }
        }
        Ok(n)
    }
}

impl Drop for ChildReader {
    fn drop(&mut self) {
        if !self.reaped {
            debug!("Terminating: {}", self.command);
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn describe(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
