use derive_new::new;
use eyre::Result;
use tracing::debug;

use hyperlane_infra_core::{
    GasPaymentEnforcementConf, GasPaymentEnforcementPolicy, InfraError,
    SerializableGasPaymentEnforcementConf,
};

use crate::SecretStore;

/// Fails with [`InfraError::SecretMissing`] unless `name` exists.
pub async fn require_secret(
    secrets: &dyn SecretStore,
    name: String,
    purpose: &'static str,
) -> Result<()> {
    if secrets.exists(&name).await? {
        debug!(secret = %name, "Found required secret");
        Ok(())
    } else {
        Err(InfraError::SecretMissing { purpose, name }.into())
    }
}

/// Name of the price oracle API key secret
pub fn coingecko_secret_name(run_env: &str) -> String {
    format!("{run_env}-coingecko-api-key")
}

/// Name of the Gelato API key secret
pub fn gelato_secret_name(run_env: &str) -> String {
    format!("{run_env}-gelato-api-key")
}

/// Turns a relayer's gas payment enforcement into the form the relayer reads.
#[derive(Debug, new)]
pub struct GasEnforcementCompiler<'a> {
    run_env: &'a str,
    secrets: &'a dyn SecretStore,
}

impl<'a> GasEnforcementCompiler<'a> {
    /// Checks the secrets the policy depends on and encodes the whitelist as
    /// a JSON string.
    pub async fn compile(
        &self,
        conf: &GasPaymentEnforcementConf,
    ) -> Result<SerializableGasPaymentEnforcementConf> {
        // The price oracle is only consulted when comparing against estimated costs
        if conf.policy == GasPaymentEnforcementPolicy::MeetsEstimatedCost {
            require_secret(
                self.secrets,
                coingecko_secret_name(self.run_env),
                "CoinGecko API Key",
            )
            .await?;
        }

        let whitelist = conf
            .whitelist
            .as_ref()
            .map(|list| list.compile().to_json_string())
            .transpose()?;
        Ok(SerializableGasPaymentEnforcementConf {
            policy: conf.policy.clone(),
            whitelist,
        })
    }
}
