//! Image builds through a container engine CLI
//!
//! Runs `<program> build -q -f <dockerfile> [-t <tag>] -` with the build
//! context piped to stdin. Works with the docker CLI and compatible tools.

use crate::error::{FryerError, FryerResult};
use crate::orchestration::build_error_output;
use crate::orchestration::builder::{BuildParams, ImageBuilder};
use crate::source::checksum::CHUNK_SIZE;
use crate::stream::ByteSource;
use async_trait::async_trait;
use std::io::{self, Read};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Chunks buffered between the context reader and the engine's stdin
const PIPE_DEPTH: usize = 4;

/// Image builder driving an engine command line
pub struct CliImageBuilder {
    program: String,
}

impl CliImageBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for one build invocation, context read from stdin
    pub fn build_args(params: &BuildParams) -> Vec<String> {
        let mut args = vec!["build".to_string(), "-q".to_string()];
        if params.remove_intermediate {
            args.push("--rm".to_string());
        }
        args.push("-f".to_string());
        args.push(params.dockerfile.clone());
        if let Some(tag) = &params.tag {
            args.push("-t".to_string());
            args.push(tag.clone());
        }
        args.push("-".to_string());
        args
    }
}

impl Default for CliImageBuilder {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait]
impl ImageBuilder for CliImageBuilder {
    async fn build_image(&self, context: ByteSource, params: &BuildParams) -> FryerResult<String> {
        let args = Self::build_args(params);
        let command = format!("{} {}", self.program, args.join(" "));
        info!("Building image: {}", command);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FryerError::command_failed(command.clone(), e))?;

        let (Some(mut stdin), Some(mut stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(FryerError::Internal(format!(
                "{} spawned without piped stdio",
                command
            )));
        };

        let (tx, mut rx) = mpsc::channel::<io::Result<Vec<u8>>>(PIPE_DEPTH);
        let pump = tokio::task::spawn_blocking(move || pump_context(context, tx));

        let write = async move {
            while let Some(chunk) = rx.recv().await {
                let chunk = chunk.map_err(|e| FryerError::io("reading build context", e))?;
                stdin
                    .write_all(&chunk)
                    .await
                    .map_err(|e| FryerError::io("writing build context to engine", e))?;
            }
            stdin
                .shutdown()
                .await
                .map_err(|e| FryerError::io("closing engine stdin", e))
            // Dropping `rx` on any early return stops the pump
        };
        let read_out = async {
            let mut out = String::new();
            stdout.read_to_string(&mut out).await.map(|_| out)
        };
        let read_err = async {
            let mut err = String::new();
            stderr.read_to_string(&mut err).await.map(|_| err)
        };

        let (written, out, err) = tokio::join!(write, read_out, read_err);
        let out = out.map_err(|e| FryerError::io("reading engine output", e))?;
        let err = err.map_err(|e| FryerError::io("reading engine output", e))?;

        let status = child
            .wait()
            .await
            .map_err(|e| FryerError::command_failed(command.clone(), e))?;
        let streamed = pump
            .await
            .map_err(|e| FryerError::Internal(format!("context pump panicked: {}", e)))?;
        debug!(bytes = streamed, "Build context streamed");

        if !status.success() {
            return Err(FryerError::BuildFailed(build_error_output(&out, &err)));
        }
        written?;

        parse_image_id(&out).ok_or_else(|| {
            FryerError::BuildFailed(format!("{} printed no image id", self.program))
        })
    }

    fn engine_name(&self) -> &str {
        &self.program
    }
}

/// Read the context on a blocking thread and hand chunks to the writer.
///
/// Stops when the context ends, fails, or the writer goes away; the context
/// is dropped on return either way.
fn pump_context(mut context: ByteSource, tx: mpsc::Sender<io::Result<Vec<u8>>>) -> u64 {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        match context.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.blocking_send(Ok(buf[..n].to_vec())).is_err() {
                    break;
                }
                total += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                break;
            }
        }
    }
    total
}

/// Last non-empty line of quiet build output
fn parse_image_id(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(str::to_string)
}
