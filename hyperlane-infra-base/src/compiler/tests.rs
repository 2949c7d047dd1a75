use async_trait::async_trait;
use eyre::Result;
use mockall::mock;
use serde_json::json;

use hyperlane_infra_core::{ChainName, GasPaymentEnforcementPolicy, InfraError, KeyConfig};

use super::*;
use crate::provisioning::{InMemoryProvisioner, Resource};
use crate::settings::AgentConfig;
use crate::SecretStore;

mock! {
    #[derive(Debug)]
    pub Secrets {}

    #[async_trait]
    impl SecretStore for Secrets {
        async fn exists(&self, name: &str) -> Result<bool>;
        async fn access(&self, name: &str) -> Result<String>;
    }
}

/// Secret store that must not be consulted
fn no_secrets() -> MockSecrets {
    let mut secrets = MockSecrets::new();
    secrets.expect_exists().never();
    secrets.expect_access().never();
    secrets
}

fn secrets_with(present: &'static [&'static str]) -> MockSecrets {
    let mut secrets = MockSecrets::new();
    secrets
        .expect_exists()
        .returning(move |name| Ok(present.contains(&name)));
    secrets
}

fn agent_config(aws: bool, gas_policy: serde_json::Value) -> AgentConfig {
    let mut config = json!({
        "environment": "testnet3",
        "namespace": "testnet3",
        "runEnv": "testnet3",
        "context": "hyperlane",
        "environmentChainNames": ["test1", "goerli", "fuji"],
        "contextChainNames": ["test1", "goerli"],
        "validatorSets": {
            "test1": {
                "threshold": 2,
                "validators": [
                    {
                        "name": "test1-0",
                        "address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                        "checkpointSyncer": {"type": "localStorage", "path": "/tmp/hyperlane-test-test1-validator-0"}
                    },
                    {
                        "name": "partner",
                        "address": "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc",
                        "checkpointSyncer": {"type": "localStorage", "path": "/tmp/partner"},
                        "readonly": true
                    },
                    {
                        "name": "test1-1",
                        "address": "0x90f79bf6eb2c4f870365e785982e1f101e93b906",
                        "checkpointSyncer": {"type": "localStorage", "path": "/tmp/hyperlane-test-test1-validator-1"}
                    }
                ]
            },
            "goerli": {
                "threshold": 2,
                "validators": [
                    {
                        "name": "abacus",
                        "address": "0x05a9b5efe9f61f9142453d8e9f61565f333c6768",
                        "checkpointSyncer": {"type": "s3", "bucket": "hyperlane-testnet3-goerli-validator-0", "region": "us-east-1"}
                    },
                    {
                        "name": "partner",
                        "address": "0x43a59a0c5aa2fa86bc4d1e9f3e8d4bd5b2bc8d2d",
                        "checkpointSyncer": {"type": "s3", "bucket": "partner-goerli", "region": "eu-west-1"},
                        "readonly": true
                    },
                    {
                        "name": "abacus-2",
                        "address": "0x3ea6c8fd8db2c4b5e3a1ee0d1f0ad9c5b6e1c7a1",
                        "checkpointSyncer": {"type": "s3", "bucket": "hyperlane-testnet3-goerli-validator-1", "region": "us-east-1"}
                    }
                ]
            }
        },
        "validator": {
            "default": {"interval": 5, "reorgPeriod": 1},
            "chainOverrides": {"goerli": {"reorgPeriod": 2}}
        },
        "relayer": {
            "default": {
                "gasPaymentEnforcement": {"policy": gas_policy},
                "whitelist": {"routers": {
                    "test1": "0x0000000000000000000000000000000000000001",
                    "goerli": "0x0000000000000000000000000000000000000002"
                }},
                "transactionGasLimit": 750000,
                "skipTransactionGasLimitFor": ["goerli", "fuji"]
            }
        },
        "rolesWithKeys": ["validator", "relayer"]
    });
    if aws {
        config["aws"] = json!({"region": "us-east-1"});
    }
    serde_json::from_value(config).unwrap()
}

fn none_policy() -> serde_json::Value {
    json!({"type": "none"})
}

#[tokio::test]
async fn readonly_validators_get_no_agent() {
    let agent = agent_config(false, none_policy());
    let provisioner = InMemoryProvisioner::default();
    let secrets = no_secrets();
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);

    let validators = builder
        .validator_configs(ChainName::Test1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(validators.len(), 2);
    assert!(validators.iter().all(|v| v.validator == KeyConfig::External));
    assert_eq!(validators[0].interval, 5);
    assert_eq!(validators[0].reorg_period, 1);
    assert_eq!(validators[1].origin_chain_name, ChainName::Test1);
    // Local storage validators are run outside the cluster
    assert_eq!(provisioner.creations(), 0);
}

#[tokio::test]
async fn s3_validators_are_provisioned_by_operated_index() {
    let agent = agent_config(true, none_policy());
    let provisioner = InMemoryProvisioner::default();
    let secrets = no_secrets();
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);

    let validators = builder
        .validator_configs(ChainName::Goerli)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(validators.len(), 2);
    assert_eq!(validators[0].reorg_period, 2);
    assert_eq!(
        validators[1].validator,
        KeyConfig::Managed {
            id: "alias/hyperlane-testnet3-key-goerli-validator-1".into(),
            region: "us-east-1".into(),
        }
    );

    let resources = provisioner.resources();
    assert!(resources.contains(&Resource::Identity(
        "hyperlane-testnet3-goerli-validator-1".into()
    )));
    assert!(resources.contains(&Resource::Bucket(
        "hyperlane-testnet3-goerli-validator-1".into()
    )));
    assert!(!resources.contains(&Resource::Bucket("partner-goerli".into())));
}

#[tokio::test]
async fn s3_validators_without_aws_keys_use_external_keys() {
    let agent = agent_config(false, none_policy());
    let provisioner = InMemoryProvisioner::default();
    let secrets = no_secrets();
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);

    let validators = builder
        .validator_configs(ChainName::Goerli)
        .await
        .unwrap()
        .unwrap();
    assert!(validators.iter().all(|v| v.validator == KeyConfig::External));
    assert!(provisioner
        .resources()
        .iter()
        .all(|r| !matches!(r, Resource::Key(_))));
    // identity and bucket for both operated validators
    assert_eq!(provisioner.creations(), 4);
}

#[tokio::test]
async fn meets_estimated_cost_requires_price_oracle_secret() {
    let agent = agent_config(false, json!({"type": "meetsEstimatedCost"}));
    let provisioner = InMemoryProvisioner::default();

    let secrets = secrets_with(&[]);
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);
    let err = builder.relayer_config(ChainName::Test1).await.unwrap_err();
    match err.downcast_ref::<InfraError>() {
        Some(InfraError::SecretMissing { name, .. }) => {
            assert_eq!(name, "testnet3-coingecko-api-key")
        }
        other => panic!("unexpected error {other:?}"),
    }

    let secrets = secrets_with(&["testnet3-coingecko-api-key"]);
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);
    let relayer = builder
        .relayer_config(ChainName::Test1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        relayer.gas_payment_enforcement.policy,
        GasPaymentEnforcementPolicy::MeetsEstimatedCost
    );
}

#[tokio::test]
async fn relayer_config_serializes_lists_and_limits() {
    let agent = agent_config(false, json!({"type": "minimum", "payment": "1"}));
    let provisioner = InMemoryProvisioner::default();
    let secrets = no_secrets();
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);

    let relayer = builder
        .relayer_config(ChainName::Test1)
        .await
        .unwrap()
        .unwrap();
    // readonly validators are still read from
    assert_eq!(relayer.multisig_checkpoint_syncer.checkpoint_syncers.len(), 3);
    assert!(relayer
        .multisig_checkpoint_syncer
        .checkpoint_syncers
        .contains_key("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc"));
    assert_eq!(relayer.transaction_gas_limit.as_deref(), Some("750000"));
    assert_eq!(
        relayer.skip_transaction_gas_limit_for.as_deref(),
        Some("goerli,fuji")
    );
    assert_eq!(relayer.blacklist, None);

    let whitelist: serde_json::Value =
        serde_json::from_str(relayer.whitelist.as_deref().unwrap()).unwrap();
    assert_eq!(whitelist.as_array().unwrap().len(), 2);

    let json = serde_json::to_value(&relayer).unwrap();
    assert_eq!(json["originChainName"], "test1");
    assert_eq!(
        json["gasPaymentEnforcement"],
        json!({"policy": {"type": "minimum", "payment": "1"}})
    );
    assert!(json.get("blacklist").is_none());
}

#[tokio::test]
async fn disabled_agents_produce_nothing() {
    let mut agent = agent_config(false, none_policy());
    agent.relayer = None;
    agent.validator = None;
    let provisioner = InMemoryProvisioner::default();
    let secrets = no_secrets();
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);

    assert_eq!(builder.relayer_config(ChainName::Goerli).await.unwrap(), None);
    assert_eq!(builder.validator_configs(ChainName::Goerli).await.unwrap(), None);

    let runtime = builder.build(ChainName::Goerli).await.unwrap();
    assert_eq!(runtime.signers, None);
    assert!(!runtime.relayer_requires_aws_credentials);
}

#[tokio::test]
async fn missing_validator_set_names_chain_and_context() {
    let agent = agent_config(false, none_policy());
    let provisioner = InMemoryProvisioner::default();
    let secrets = no_secrets();
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);

    let err = builder.relayer_config(ChainName::Fuji).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Configuration error: No validator set configured for fuji in testnet3:hyperlane"
    );
}

#[tokio::test]
async fn gelato_chains_require_api_key() {
    let mut agent = agent_config(false, none_policy());
    agent.gelato = Some(crate::settings::GelatoConfig {
        enabled_chains: vec![ChainName::Goerli],
    });
    let provisioner = InMemoryProvisioner::default();

    let secrets = secrets_with(&[]);
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);
    let err = builder.build_all().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<InfraError>(),
        Some(InfraError::SecretMissing { .. })
    ));

    let secrets = secrets_with(&["testnet3-gelato-api-key"]);
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);
    let configs = builder.build_all().await.unwrap();
    assert_eq!(
        configs[&ChainName::Goerli].transaction_submission_type,
        TransactionSubmissionType::Gelato
    );
    assert_eq!(
        configs[&ChainName::Test1].transaction_submission_type,
        TransactionSubmissionType::Signer
    );
}

#[tokio::test]
async fn aws_credentials_follow_keys_and_s3_syncers() {
    let agent = agent_config(false, none_policy());
    let provisioner = InMemoryProvisioner::default();
    let keys = KeyPolicyResolver::new(&agent, ChainName::Test1, &provisioner);
    let local_set = &agent.validator_sets[&ChainName::Test1];
    assert!(!keys
        .relayer_requires_aws_credentials(local_set)
        .await
        .unwrap());
    assert_eq!(provisioner.creations(), 0);

    let keys = KeyPolicyResolver::new(&agent, ChainName::Goerli, &provisioner);
    let s3_set = &agent.validator_sets[&ChainName::Goerli];
    assert!(keys.relayer_requires_aws_credentials(s3_set).await.unwrap());
    assert_eq!(
        provisioner.resources(),
        vec![Resource::Identity("hyperlane-testnet3-goerli-relayer".into())]
    );

    let agent = agent_config(true, none_policy());
    let provisioner = InMemoryProvisioner::default();
    let keys = KeyPolicyResolver::new(&agent, ChainName::Test1, &provisioner);
    assert!(keys
        .relayer_requires_aws_credentials(&agent.validator_sets[&ChainName::Test1])
        .await
        .unwrap());
    assert!(provisioner.resources().contains(&Resource::Key(
        "alias/hyperlane-testnet3-key-test1-relayer".into()
    )));
}

#[tokio::test]
async fn build_all_covers_every_context_chain() {
    let agent = agent_config(true, none_policy());
    let provisioner = InMemoryProvisioner::default();
    let secrets = no_secrets();
    let builder = AgentConfigBuilder::new(&agent, &provisioner, &secrets);

    let configs = builder.build_all().await.unwrap();
    assert_eq!(
        configs.keys().copied().collect::<Vec<_>>(),
        vec![ChainName::Goerli, ChainName::Test1]
    );

    let test1 = &configs[&ChainName::Test1];
    assert_eq!(test1.domain, 13371);
    assert!(test1.relayer_requires_aws_credentials);
    let signers = test1.signers.as_ref().unwrap();
    assert_eq!(signers.len(), 2);
    assert_eq!(
        signers[&ChainName::Goerli],
        KeyConfig::Managed {
            id: "alias/hyperlane-testnet3-key-test1-relayer".into(),
            region: "us-east-1".into(),
        }
    );
}
