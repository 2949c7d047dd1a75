use std::fmt::Debug;

use async_trait::async_trait;
use eyre::Result;

/// Read access to the secret manager holding API keys and key material
#[async_trait]
pub trait SecretStore: Debug + Send + Sync {
    /// Whether a secret with this name exists
    async fn exists(&self, name: &str) -> Result<bool>;
    /// The latest version of the secret's payload
    async fn access(&self, name: &str) -> Result<String>;
}
