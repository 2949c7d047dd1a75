//! Settings of the infra tooling.
//!
//! An environment is described by a single JSON file, `config/<environment>.json`,
//! holding the agent policy of every deployment context in that environment:
//!
//! ```json
//! {
//!   "environment": "testnet3",
//!   "tracing": { "fmt": "pretty", "level": "info" },
//!   "agents": {
//!     "hyperlane": {
//!       "environment": "testnet3",
//!       "namespace": "testnet3",
//!       "runEnv": "testnet3",
//!       "context": "hyperlane",
//!       ...
//!     }
//!   }
//! }
//! ```
//!
//! ### Configuration value precedence
//!
//! Configuration key/value pairs are loaded in the following order, with later
//! sources taking precedence:
//!
//! 1. The environment file `config/<environment>.json`.
//! 2. The order of configs in `CONFIG_FILES` with each sequential one
//!    overwriting previous ones as appropriate.
//! 3. Configuration env vars with the prefix `HYP_INFRA`, whose names follow
//!    the JSON object hierarchy, e.g.
//!    `export HYP_INFRA_AGENTS_HYPERLANE_AWS_REGION=us-east-1`.
//!    Each name component matches an existing key ignoring case, so
//!    `HYP_INFRA_AGENTS_HYPERLANE_RUNENV` overrides `runEnv`. Keys absent from
//!    every file are inserted lowercase.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::Path;

use eyre::Result;
use serde::Deserialize;

use hyperlane_infra_core::{Context, InfraError};

pub use agent::*;
pub use checkpoint_syncer::*;
pub use trace::*;
pub use validator_set::*;

mod agent;
mod checkpoint_syncer;
mod loader;
mod trace;
mod validator_set;

pub use loader::ENV_PREFIX;

/// Everything known about one deploy environment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraSettings {
    /// Deploy environment name
    pub environment: String,
    /// Agent policy per deployment context
    pub agents: BTreeMap<Context, AgentConfig>,
    /// Logging configuration
    #[serde(default)]
    pub tracing: TracingConfig,
}

impl InfraSettings {
    /// Load and validate `environment` from `./config`, `CONFIG_FILES` and the
    /// process environment.
    pub fn load(environment: &str) -> Result<Self> {
        Self::load_from(Path::new("./config"), environment, env::vars().collect())
    }

    /// Load and validate `environment` from `config_dir` with `env` standing in
    /// for the process environment.
    pub fn load_from(
        config_dir: &Path,
        environment: &str,
        env: HashMap<String, String>,
    ) -> Result<Self> {
        let settings: Self = loader::load_settings_object(config_dir, environment, env)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every context belongs to this environment and is itself valid.
    pub fn validate(&self) -> Result<(), InfraError> {
        for (context, agent) in &self.agents {
            if agent.context != *context {
                return Err(InfraError::config(format!(
                    "Agent config under `{context}` declares context `{}`",
                    agent.context
                )));
            }
            if agent.environment != self.environment {
                return Err(InfraError::config(format!(
                    "Agent config {context} belongs to environment `{}`, not `{}`",
                    agent.environment, self.environment
                )));
            }
            agent.validate()?;
        }
        Ok(())
    }

    /// The agent config of a context
    pub fn agent_config(&self, context: Context) -> Result<&AgentConfig, InfraError> {
        self.agents.get(&context).ok_or_else(|| {
            InfraError::config(format!(
                "No agent config found for {}:{context}",
                self.environment
            ))
        })
    }
}
