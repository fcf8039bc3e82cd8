// src/context.rs

//! Structured contexts handed to the runner by the CI environment.
//!
//! The workflow passes three JSON blobs (`RUNNER`, `SECRETS`, `GITHUB`).
//! They are parsed and validated once, at the CLI boundary, and travel
//! through the rest of the program as the typed structs below.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Secrets forwarded to the execution process as environment variables.
pub const FORWARDED_SECRETS: [&str; 2] = ["NOTEABLE_DOMAIN", "NOTEABLE_TOKEN"];

/// Runner context (`${{ toJson(runner) }}`).
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerContext {
    #[serde(default)]
    pub os: String,

    #[serde(default)]
    pub tool_cache: Option<PathBuf>,

    /// Scratch directory; every derived path except the progress log lives here.
    pub temp: PathBuf,

    #[serde(default)]
    pub workspace: Option<PathBuf>,
}

impl RunnerContext {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Runner context is not valid JSON")
    }
}

/// GitHub context (`${{ toJson(github) }}`).
///
/// Only `workspace` is interpreted; the whole object is kept as-is so it
/// can be injected into the notebook parameters.
#[derive(Debug, Clone)]
pub struct GithubContext {
    raw: Value,
    workspace: PathBuf,
}

impl GithubContext {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw: Value =
            serde_json::from_str(raw).context("GitHub context is not valid JSON")?;

        let workspace = raw
            .get("workspace")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .context("GitHub context is missing `workspace`")?;

        Ok(Self { raw, workspace })
    }

    pub fn workspace(&self) -> &PathBuf {
        &self.workspace
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Resolve a dot-path into the context.
    ///
    /// Object keys and array indices are both supported:
    /// `event.pull_request.number`, `event.commits.0.id`.
    ///
    /// Returns `None` as soon as a segment cannot be resolved.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut current = &self.raw;

        for segment in path.split('.') {
            if segment.is_empty() {
                return None;
            }

            if let Ok(index) = segment.parse::<usize>() {
                if let Some(v) = current.get(index) {
                    current = v;
                    continue;
                }
            }
            current = current.get(segment)?;
        }

        Some(current)
    }
}

/// Secrets map (`${{ toJson(secrets) }}`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Secrets(BTreeMap<String, Value>);

impl Secrets {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Secrets context is not a valid JSON object")
    }

    /// Look up a secret as a string.
    ///
    /// Non-string scalars are rendered with their JSON text; `null` counts
    /// as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Environment variables to forward to the execution process.
    pub fn forwarded_env(&self) -> BTreeMap<String, String> {
        FORWARDED_SECRETS
            .iter()
            .filter_map(|key| self.get(key).map(|v| (key.to_string(), v)))
            .collect()
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.0).context("Failed to serialise secrets")
    }
}
