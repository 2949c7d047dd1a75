use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use ethers::signers::Signer;
use eyre::Context as _;
use tracing::info;

use hyperlane_infra_base::compiler::AgentConfigBuilder;
use hyperlane_infra_base::deterministic_keys::{
    derivation_path, deterministic_key, nonce_for, DeterministicKeyRole, DETERMINISTIC_NONCES,
};
use hyperlane_infra_base::provisioning::{AwsProvisioner, InMemoryProvisioner};
use hyperlane_infra_base::settings::{AgentConfig, InfraSettings};
use hyperlane_infra_base::verifier::{status_counts, CheckpointConsistencyVerifier};
use hyperlane_infra_base::{GcloudSecretStore, Provisioner};
use hyperlane_infra_core::{ChainName, Context};

#[derive(Args)]
pub struct AgentConfigArgs {
    /// Only build the config of this chain
    #[arg(long)]
    chain: Option<ChainName>,
    /// Record the cloud resources that would be ensured instead of creating them
    #[arg(long)]
    dry_run: bool,
    /// Write the config here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
pub struct VerifyValidatorsArgs {
    /// Chains to verify, all chains with a validator set when omitted
    #[arg(long = "chain")]
    chains: Vec<ChainName>,
    /// Only compare the latest `count` checkpoints
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    count: Option<u32>,
}

#[derive(Args)]
pub struct DeterministicKeyArgs {
    /// interchainAccount | testRecipient | create2Factory
    #[arg(long)]
    role: DeterministicKeyRole,
}

#[derive(Subcommand)]
/// Subcommands
pub enum SubCommands {
    /// Compile the runtime config of a context's agents
    AgentConfig(AgentConfigArgs),
    /// Compare the checkpoints of every validator of a chain against the first
    VerifyValidators(VerifyValidatorsArgs),
    /// Print the address of a deterministic infrastructure key
    DeterministicKey(DeterministicKeyArgs),
}

#[derive(Parser)]
#[command(version, about = "Hyperlane agent infrastructure tooling")]
pub struct Opts {
    #[command(subcommand)]
    sub: SubCommands,

    /// Deploy environment, e.g. testnet3
    #[arg(short, long)]
    environment: String,
    /// Deployment context
    #[arg(short, long, default_value = "hyperlane")]
    context: Context,
    /// Directory holding `<environment>.json`
    #[arg(long, default_value = "./config")]
    config_dir: PathBuf,
}

async fn agent_config(agent: &AgentConfig, args: &AgentConfigArgs) -> Result<()> {
    let secrets = GcloudSecretStore::default();
    let provisioner: Box<dyn Provisioner> = if args.dry_run {
        Box::<InMemoryProvisioner>::default()
    } else {
        Box::new(AwsProvisioner::new()?)
    };
    let builder = AgentConfigBuilder::new(agent, provisioner.as_ref(), &secrets);

    let config = match args.chain {
        Some(chain) => serde_json::to_value(builder.build(chain).await?)?,
        None => serde_json::to_value(builder.build_all().await?)?,
    };
    let rendered = serde_json::to_string_pretty(&config)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("Writing {path:?}"))?;
            info!(?path, "Wrote agent config");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

async fn verify_validators(agent: &AgentConfig, args: &VerifyValidatorsArgs) -> Result<()> {
    let validator_sets: BTreeMap<_, _> = agent
        .validator_sets
        .iter()
        .filter(|(chain, _)| args.chains.is_empty() || args.chains.contains(chain))
        .map(|(chain, set)| (*chain, set.clone()))
        .collect();

    let verifier = CheckpointConsistencyVerifier::new(args.count);
    for (chain, result) in verifier.verify_all(&validator_sets).await {
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                eprintln!("Could not verify {chain}: {err:#}");
                continue;
            }
        };
        for candidate in &report.candidates {
            match &candidate.outcome {
                Ok(metrics) if candidate.is_valid() == Some(true) => {
                    println!("{} has valid checkpoints for {chain}", candidate.name);
                    println!("{}", serde_json::to_string(&status_counts(metrics))?);
                }
                Ok(metrics) => {
                    println!(
                        "{} has >=1 non-valid checkpoints for {chain}",
                        candidate.name
                    );
                    println!("{}", serde_json::to_string(metrics)?);
                    if let Some(first) = candidate.first_non_valid() {
                        println!("First non-valid index: {}", first.index);
                    }
                }
                Err(err) => println!(
                    "{} could not be compared against {} for {chain}: {err:#}",
                    candidate.name, report.control
                ),
            }
        }
    }
    Ok(())
}

async fn print_deterministic_key(opts: &Opts, args: &DeterministicKeyArgs) -> Result<()> {
    let secrets = GcloudSecretStore::default();
    let wallet = deterministic_key(
        &secrets,
        &opts.environment,
        opts.context,
        args.role,
        DETERMINISTIC_NONCES,
    )
    .await?;
    println!("Role: {}", args.role);
    println!(
        "Path: {}",
        derivation_path(args.role, nonce_for(DETERMINISTIC_NONCES, args.role))
    );
    println!("Address: {:?}", wallet.address());
    Ok(())
}

async fn _main() -> Result<()> {
    let opts = Opts::parse();
    let settings =
        InfraSettings::load_from(&opts.config_dir, &opts.environment, env::vars().collect())?;
    settings.tracing.start_tracing()?;

    match &opts.sub {
        SubCommands::AgentConfig(args) => {
            agent_config(settings.agent_config(opts.context)?, args).await
        }
        SubCommands::VerifyValidators(args) => {
            verify_validators(settings.agent_config(opts.context)?, args).await
        }
        SubCommands::DeterministicKey(args) => print_deterministic_key(&opts, args).await,
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(_main())
}
