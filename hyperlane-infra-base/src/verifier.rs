//! Cross-checks the checkpoints published by the validators of a chain.
//!
//! The first validator of a set is the control. Every other validator is a
//! candidate whose checkpoint roots are compared index by index against the
//! control's, producing a [`CheckpointMetric`] per index.

use std::collections::BTreeMap;

use eyre::Result;
use futures_util::{
    future::join_all,
    stream::{self, StreamExt, TryStreamExt},
};
use itertools::Itertools;
use tracing::{error, info, instrument, warn};

use hyperlane_infra_core::{ChainName, CheckpointMetric, InfraError, H160, H256};

use crate::settings::{Validator, ValidatorSet};
use crate::CheckpointSyncer;

/// Checkpoint requests in flight per validator
const MAX_CONCURRENT_FETCHES: usize = 16;

/// Builds the checkpoint syncer a validator publishes to
pub type SyncerFactory = dyn Fn(&Validator) -> Result<Box<dyn CheckpointSyncer>> + Send + Sync;

/// Outcome of comparing one candidate against the control
#[derive(Debug)]
pub struct CandidateReport {
    /// Validator name
    pub name: String,
    /// Validator address
    pub address: H160,
    /// Metric per compared index, or why the comparison was inconclusive
    pub outcome: Result<Vec<CheckpointMetric>, InfraError>,
}

impl CandidateReport {
    /// `Some(true)` if every compared index is valid, `None` if inconclusive
    pub fn is_valid(&self) -> Option<bool> {
        self.outcome
            .as_ref()
            .ok()
            .map(|metrics| metrics.iter().all(CheckpointMetric::is_valid))
    }

    /// The first index that is not valid
    pub fn first_non_valid(&self) -> Option<&CheckpointMetric> {
        self.outcome
            .as_ref()
            .ok()?
            .iter()
            .find(|metric| !metric.is_valid())
    }
}

/// Result of verifying one chain
#[derive(Debug)]
pub struct ChainReport {
    /// Chain verified
    pub chain: ChainName,
    /// Name of the control validator
    pub control: String,
    /// One report per candidate, in validator set order
    pub candidates: Vec<CandidateReport>,
}

impl ChainReport {
    /// Whether every candidate was conclusively valid
    pub fn all_valid(&self) -> bool {
        self.candidates.iter().all(|c| c.is_valid() == Some(true))
    }
}

/// Checkpoints the control validator published
struct ControlStream {
    start: u32,
    latest: Option<u32>,
    roots: BTreeMap<u32, H256>,
}

/// First index to compare when limited to the trailing `count` indices
fn start_index(latest: Option<u32>, count: Option<u32>) -> u32 {
    match (latest, count) {
        (Some(latest), Some(count)) => latest.saturating_add(1).saturating_sub(count),
        _ => 0,
    }
}

/// Roots published at `start..=end`, keyed by the index they were requested
/// under.
async fn fetch_roots(
    syncer: &dyn CheckpointSyncer,
    start: u32,
    end: Option<u32>,
) -> Result<BTreeMap<u32, H256>> {
    let Some(end) = end else {
        return Ok(BTreeMap::new());
    };
    let checkpoints: Vec<_> = stream::iter(start..=end)
        .map(|index| async move {
            let signed = syncer.fetch_checkpoint(index).await?;
            Ok::<_, eyre::Report>(signed.map(|signed| (index, signed.value.root)))
        })
        .buffered(MAX_CONCURRENT_FETCHES)
        .try_collect()
        .await?;
    Ok(checkpoints.into_iter().flatten().collect())
}

/// Compares checkpoint streams of validators of the same chain
pub struct CheckpointConsistencyVerifier {
    count: Option<u32>,
    build_syncer: Box<SyncerFactory>,
}

impl std::fmt::Debug for CheckpointConsistencyVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointConsistencyVerifier")
            .field("count", &self.count)
            .finish()
    }
}

impl CheckpointConsistencyVerifier {
    /// A verifier reading from each validator's configured checkpoint syncer.
    /// `count` limits comparison to the trailing `count` indices of the
    /// control.
    pub fn new(count: Option<u32>) -> Self {
        Self::with_syncer_factory(count, Box::new(|v: &Validator| v.checkpoint_syncer.build()))
    }

    /// A verifier reading checkpoints through `build_syncer`
    pub fn with_syncer_factory(count: Option<u32>, build_syncer: Box<SyncerFactory>) -> Self {
        Self {
            count,
            build_syncer,
        }
    }

    async fn control_stream(&self, syncer: &dyn CheckpointSyncer) -> Result<ControlStream> {
        let latest = syncer.latest_index().await?;
        let start = start_index(latest, self.count);
        let roots = fetch_roots(syncer, start, latest).await?;
        Ok(ControlStream {
            start,
            latest,
            roots,
        })
    }

    /// Compare `candidate` over the control's range. Indices published after
    /// the control stream was read are not compared.
    async fn compare(
        &self,
        control: &ControlStream,
        candidate: &Validator,
    ) -> Result<Vec<CheckpointMetric>> {
        let syncer = (self.build_syncer)(candidate)?;
        let roots = fetch_roots(syncer.as_ref(), control.start, control.latest).await?;

        Ok(control
            .latest
            .map(|latest| control.start..=latest)
            .into_iter()
            .flatten()
            .map(|index| {
                CheckpointMetric::compare(
                    index,
                    control.roots.get(&index).copied(),
                    roots.get(&index).copied(),
                )
            })
            .collect())
    }

    /// Verify every candidate of `chain` against the first validator. Every
    /// validator must publish to S3. A failing candidate is reported as
    /// inconclusive without affecting the others.
    #[instrument(skip(self, validator_set))]
    pub async fn verify_chain(
        &self,
        chain: ChainName,
        validator_set: &ValidatorSet,
    ) -> Result<ChainReport> {
        if self.count == Some(0) {
            return Err(InfraError::config("Checkpoint count must be at least 1").into());
        }
        if let Some(local) = validator_set
            .validators
            .iter()
            .find(|v| !v.checkpoint_syncer.is_s3())
        {
            return Err(InfraError::UnsupportedSyncer {
                chain,
                validator: local.name.clone(),
            }
            .into());
        }
        let Some((control, candidates)) = validator_set.validators.split_first() else {
            return Err(InfraError::config(format!("Validator set of {chain} is empty")).into());
        };

        let control_syncer = (self.build_syncer)(control)?;
        let stream = self
            .control_stream(control_syncer.as_ref())
            .await
            .map_err(|err| InfraError::Comparison {
                chain,
                validator: control.name.clone(),
                source: err.into(),
            })?;

        let candidates = join_all(candidates.iter().map(|candidate| {
            let stream = &stream;
            async move {
                let outcome = self.compare(stream, candidate).await.map_err(|err| {
                    error!(%chain, validator = %candidate.name, ?err, "Failed to compare checkpoints");
                    InfraError::Comparison {
                        chain,
                        validator: candidate.name.clone(),
                        source: err.into(),
                    }
                });
                CandidateReport {
                    name: candidate.name.clone(),
                    address: candidate.address,
                    outcome,
                }
            }
        }))
        .await;

        for report in &candidates {
            match (report.is_valid(), report.first_non_valid()) {
                (Some(true), _) => info!("{} has valid checkpoints for {chain}", report.name),
                (Some(false), first) => warn!(
                    first_non_valid = ?first,
                    metrics = ?report.outcome.as_ref().ok(),
                    "{} has >=1 non-valid checkpoints for {chain}",
                    report.name
                ),
                (None, _) => {}
            }
        }

        Ok(ChainReport {
            chain,
            control: control.name.clone(),
            candidates,
        })
    }

    /// Verify every chain concurrently. Completes only once every chain has.
    pub async fn verify_all(
        &self,
        validator_sets: &BTreeMap<ChainName, ValidatorSet>,
    ) -> Vec<(ChainName, Result<ChainReport>)> {
        let results = join_all(
            validator_sets
                .iter()
                .map(|(chain, set)| async move { (*chain, self.verify_chain(*chain, set).await) }),
        )
        .await;
        let failed = results.iter().filter(|(_, r)| r.is_err()).map(|(c, _)| c).join(",");
        if !failed.is_empty() {
            warn!(chains = %failed, "Could not verify all chains");
        }
        results
    }
}

/// Count of metrics per status, for summaries
pub fn status_counts(metrics: &[CheckpointMetric]) -> BTreeMap<String, usize> {
    metrics
        .iter()
        .map(|metric| format!("{:?}", metric.status).to_uppercase())
        .counts()
        .into_iter()
        .collect()
}
