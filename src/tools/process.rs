// src/tools/process.rs

//! Helpers for running the Python tooling as child processes.
//!
//! Arguments are always passed as argv, never through a shell.

use anyhow::{bail, Context, Result};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Run a command to completion, failing on a non-zero exit status.
///
/// The child's STDOUT is redirected to our STDERR so that STDOUT stays
/// reserved for progress output and the final URL line.
pub async fn run_checked(cmd: &mut Command, what: &str) -> Result<()> {
    debug!(command = ?cmd.as_std(), "running {}", what);

    let status = cmd
        .stdin(std::process::Stdio::null())
        .stdout(std::io::stderr())
        .stderr(std::io::stderr())
        .status()
        .await
        .with_context(|| format!("Failed to spawn {}", what))?;

    if !status.success() {
        bail!("{} exited with {}", what, status);
    }

    Ok(())
}

/// Shared, append-only handle to the progress log.
#[derive(Clone)]
pub struct LogFile {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl LogFile {
    /// Create (or truncate) the log so it only reflects the current run.
    pub async fn create(path: PathBuf) -> Result<Self> {
        let file = File::create(&path)
            .await
            .with_context(|| format!("Failed to create progress log {:?}", path))?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    async fn append(&self, line: &str) {
        let mut file = self.file.lock().await;
        let written = async {
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            warn!(path = %self.path.display(), error = %e, "failed to append to progress log");
        }
    }
}

/// Copy a child stream line by line into the log (and optionally to our
/// STDERR). Returns the last `keep` lines.
///
/// The stream is drained to EOF whatever it contains. Bytes that are not
/// UTF-8 are replaced, and only repeated read errors end the copy early: a
/// closed pipe kills the child with SIGPIPE on its next write.
pub async fn pump<R>(reader: R, log: Option<LogFile>, echo: bool, keep: usize) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf: Vec<u8> = Vec::new();
    let mut window: VecDeque<String> = VecDeque::with_capacity(keep);
    let mut read_errors = 0usize;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                read_errors += 1;
                warn!(error = %e, "failed to read child output");
                if read_errors >= MAX_READ_ERRORS {
                    break;
                }
                continue;
            }
        }

        let line = decode_line(&buf);

        if let Some(log) = &log {
            log.append(&line).await;
        }
        if echo {
            eprintln!("{}", line);
        }
        if keep > 0 {
            if window.len() == keep {
                window.pop_front();
            }
            window.push_back(line);
        }
    }

    window.into_iter().collect()
}

/// Read failures tolerated before a pipe is given up.
const MAX_READ_ERRORS: usize = 16;

/// One raw line without its terminator, lossily decoded.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
