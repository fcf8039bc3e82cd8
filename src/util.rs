// src/util.rs

use anyhow::{bail, Context, Result};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Read a UTF-8 file into a String with a clear error message.
///
/// This is mainly used for:
/// - the user parameters file
/// - the executed notebook
/// - the optional config file
pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {:?}", path))
}

/// Ensure a directory exists (create it if missing).
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {:?}", path))
}

/// Bytes read per step when scanning a file backwards for its tail.
const TAIL_CHUNK: u64 = 8 * 1024;

/// Return the last `n` lines of a text file.
///
/// Only the end of the file is read, growing backwards one chunk at a time
/// until `n` complete lines are covered. Invalid UTF-8 is replaced rather
/// than rejected.
///
/// A file that does not exist yet yields no lines: the progress log is only
/// created once the execution process starts writing to it.
pub fn tail_lines(path: &Path, n: usize) -> Result<Vec<String>> {
    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to open {:?}", path));
        }
    };
    if n == 0 {
        return Ok(Vec::new());
    }

    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat {:?}", path))?
        .len();

    let mut start = len;
    let mut buf: Vec<u8> = Vec::new();
    while start > 0 {
        let step = TAIL_CHUNK.min(start);
        start -= step;

        let mut chunk = vec![0u8; step as usize];
        file.seek(SeekFrom::Start(start))
            .and_then(|_| file.read_exact(&mut chunk))
            .with_context(|| format!("Failed to read {:?}", path))?;
        chunk.extend_from_slice(&buf);
        buf = chunk;

        // n full lines need n separators before the final (possibly
        // unterminated) line; anything before them is a partial line.
        let body = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        if body.iter().filter(|&&b| b == b'\n').count() >= n {
            break;
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(n);

    Ok(lines[skip..].iter().map(|l| l.to_string()).collect())
}

/// Parse a boolean-ish action input.
///
/// Accepted (case-insensitive, trimmed):
/// - true: "true", "1", "yes", "on"
/// - false: "", "false", "0", "no", "off"
pub fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "" | "false" | "0" | "no" | "off" => Ok(false),
        other => bail!("Expected a boolean value, got {:?}", other),
    }
}

/// Escape a message for use as the data of a workflow command such as
/// `::error::`, so a multi-line message stays one annotation.
pub fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
