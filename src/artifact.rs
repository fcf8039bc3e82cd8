// src/artifact.rs

//! Reading the executed notebook after the run.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::util::read_to_string;

/// Notebook metadata key holding the hosted execution link.
pub const EXECUTION_URL_KEY: &str = "executed_notebook_url";

/// Read `metadata.executed_notebook_url` from a notebook file.
///
/// `Ok(None)` when the field is absent, null, or empty.
pub fn read_execution_url(notebook: &Path) -> Result<Option<String>> {
    let raw = read_to_string(notebook)?;
    let parsed: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Output notebook is not valid JSON: {:?}", notebook))?;

    let url = parsed
        .get("metadata")
        .and_then(|m| m.get(EXECUTION_URL_KEY))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(url)
}

/// Best-effort variant used by the runner: any problem is a warning.
pub fn execution_url(notebook: &Path) -> Option<String> {
    match read_execution_url(notebook) {
        Ok(Some(url)) => Some(url),
        Ok(None) => {
            warn!(path = %notebook.display(), "output notebook has no execution URL");
            None
        }
        Err(e) => {
            let error = format!("{:#}", e);
            warn!(path = %notebook.display(), %error, "could not read output notebook");
            None
        }
    }
}

/// The line printed when an execution URL is available.
pub fn url_line(url: &str) -> String {
    format!("Notebook run can be found at {}", url)
}
