use anyhow::{bail, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::process::run_checked;
use super::HtmlConverter;

/// `python -m nbconvert <notebook> --to html`, which writes the HTML next to
/// the notebook.
#[derive(Debug, Clone)]
pub struct NbconvertConverter {
    python: String,
}

impl NbconvertConverter {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

/// Where nbconvert puts the HTML rendering of `notebook`.
pub fn html_path(notebook: &Path) -> PathBuf {
    notebook.with_extension("html")
}

#[async_trait]
impl HtmlConverter for NbconvertConverter {
    async fn convert(&self, notebook: &Path) -> Result<PathBuf> {
        let mut cmd = Command::new(&self.python);
        cmd.args(["-m", "nbconvert"]).arg(notebook).args(["--to", "html"]);

        run_checked(&mut cmd, "nbconvert").await?;

        let html = html_path(notebook);
        if !html.exists() {
            bail!("nbconvert finished but {:?} was not written", html);
        }
        Ok(html)
    }
}
