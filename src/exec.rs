//! Launching external programs with their output streamed to the console

use crate::errors::RunError;
use futures_util::StreamExt;
use std::process::Stdio;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
    task,
};

static PASSTHROUGH_COLOR: &str = "\x1b[36m";
static BOLD: &str = "\x1b[1m";
static RESET: &str = "\x1b[m";

/// Render text in the console's bold face
pub fn bold(text: &str) -> String {
    format!("{}{}{}", BOLD, text, RESET)
}

/// Run an external program, mirroring its output to the console line by line
///
/// stdout and stderr are drained by two concurrent tasks. Lines from the two
/// streams may interleave, but each stream stays in order. Both drain tasks
/// are joined before the exit status is inspected, so no output can trail
/// whatever the caller prints next.
///
/// There is no timeout; this blocks until the program exits.
pub async fn stream_command(program: &str, args: &[String]) -> Result<(), RunError> {
    log::debug!("exec {} {:?}", program, args);
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| RunError::SpawnFailed {
            program: program.to_owned(),
            source,
        })?;

    let stdout = child.stdout.take().expect("child stdout is piped");
    let stderr = child.stderr.take().expect("child stderr is piped");
    let stdout_task = task::spawn(drain_lines(stdout));
    let stderr_task = task::spawn(drain_lines(stderr));

    let status = child.await?;
    stdout_task.await?;
    stderr_task.await?;

    if status.success() {
        Ok(())
    } else {
        Err(RunError::CommandFailed {
            program: program.to_owned(),
            status,
        })
    }
}

async fn drain_lines<R: AsyncRead + Unpin>(stream: R) {
    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines.next().await {
        match line {
            Ok(line) => println!("{}{}{}", PASSTHROUGH_COLOR, line, RESET),
            Err(err) => {
                log::warn!("error reading subprocess output, {:?}", err);
                break;
            }
        }
    }
}
