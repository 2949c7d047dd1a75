use async_trait::async_trait;
use eyre::{bail, Context, Result};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::SecretStore;

/// Reads secrets from GCP Secret Manager through the `gcloud` CLI, using
/// whatever account and project the CLI is configured with.
#[derive(Debug, Clone)]
pub struct GcloudSecretStore {
    binary: String,
}

impl Default for GcloudSecretStore {
    fn default() -> Self {
        Self {
            binary: "gcloud".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListedSecret {
    name: String,
}

/// Listed names are fully qualified, `projects/{project}/secrets/{name}`.
fn secret_listed(listing: &[u8], name: &str) -> Result<bool> {
    let secrets: Vec<ListedSecret> =
        serde_json::from_slice(listing).context("Parsing gcloud secrets listing")?;
    Ok(secrets
        .iter()
        .any(|secret| secret.name.rsplit('/').next() == Some(name)))
}

impl GcloudSecretStore {
    /// Use a specific `gcloud` executable
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        debug!(binary = %self.binary, ?args, "Running gcloud");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to execute `{}`", self.binary))?;
        if !output.status.success() {
            bail!(
                "`{} {}` exited with {}: {}",
                self.binary,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl SecretStore for GcloudSecretStore {
    #[instrument(skip(self))]
    async fn exists(&self, name: &str) -> Result<bool> {
        let filter = format!("name={name}");
        let listing = self
            .run(&["secrets", "list", "--filter", &filter, "--format=json"])
            .await?;
        secret_listed(&listing, name)
    }

    #[instrument(skip(self))]
    async fn access(&self, name: &str) -> Result<String> {
        let payload = self
            .run(&["secrets", "versions", "access", "latest", "--secret", name])
            .await?;
        String::from_utf8(payload).with_context(|| format!("Secret {name} is not valid UTF-8"))
    }
}
