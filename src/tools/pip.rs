use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use super::process::run_checked;
use super::PackageInstaller;

/// Installs papermill and friends with pip, then registers a local kernel
/// so notebooks can also be executed without a remote engine.
#[derive(Debug, Clone)]
pub struct PipInstaller {
    python: String,
    packages: Vec<String>,
}

impl PipInstaller {
    pub fn new(python: impl Into<String>, packages: Vec<String>) -> Self {
        Self {
            python: python.into(),
            packages,
        }
    }

    fn python(&self) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.arg("-m");
        cmd
    }
}

#[async_trait]
impl PackageInstaller for PipInstaller {
    async fn install(&self) -> Result<()> {
        if self.packages.is_empty() {
            bail!("No packages configured for installation");
        }

        info!(packages = ?self.packages, "installing notebook tooling");
        run_checked(
            self.python()
                .args(["pip", "install"])
                .args(&self.packages),
            "pip install",
        )
        .await?;

        info!("installing ipykernel");
        run_checked(
            self.python().args(["pip", "install", "ipykernel"]),
            "pip install ipykernel",
        )
        .await?;

        run_checked(
            self.python().args(["ipykernel", "install", "--user"]),
            "ipykernel install",
        )
        .await?;

        Ok(())
    }
}
