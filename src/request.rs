// src/request.rs

//! The immutable description of one notebook execution.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::util::read_to_string;

/// Notebook parameters (name -> any JSON value).
pub type Parameters = Map<String, Value>;

/// Parameters injected into every run, before the user's own.
#[derive(Debug, Clone)]
pub struct InjectedParameters {
    /// Where the secrets map was dumped (`secretsPath`).
    pub secrets_path: PathBuf,

    /// The full GitHub context (`github`).
    pub github: Value,
}

impl InjectedParameters {
    pub fn into_map(self) -> Parameters {
        let mut map = Parameters::new();
        map.insert(
            "secretsPath".to_string(),
            Value::String(self.secrets_path.display().to_string()),
        );
        map.insert("github".to_string(), self.github);
        map
    }
}

/// Layer user parameters on top of the injected defaults.
///
/// A user key with the same name as an injected one wins.
pub fn merge_parameters(injected: InjectedParameters, user: Parameters) -> Parameters {
    let mut merged = injected.into_map();
    merged.extend(user);
    merged
}

/// Load the user parameters file.
///
/// `None`, an empty path, or a path that does not exist all mean "no user
/// parameters". A file that exists must hold a JSON object.
pub fn load_user_parameters(path: Option<&Path>) -> Result<Parameters> {
    let path = match path {
        Some(p) if !p.as_os_str().is_empty() && p.exists() => p,
        _ => return Ok(Parameters::new()),
    };

    let raw = read_to_string(path)?;
    let parsed: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Parameters file is not valid JSON: {:?}", path))?;

    match parsed {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!(
            "Parameters file must hold a JSON object of {{ name: value }}: {:?}",
            path
        ),
    }
}

/// One notebook execution. Built once, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    input_path: PathBuf,
    output_path: PathBuf,
    parameters: Parameters,
    report_mode: bool,
}

impl ExecutionRequest {
    pub fn new(
        input_path: PathBuf,
        output_path: PathBuf,
        parameters: Parameters,
        report_mode: bool,
    ) -> Self {
        Self {
            input_path,
            output_path,
            parameters,
            report_mode,
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn report_mode(&self) -> bool {
        self.report_mode
    }
}
