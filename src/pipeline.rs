//! Bad-bot pipeline.
//!
//! Pure composition of the classifier, resolver, scorer and merger: one
//! fingerprint in, one outcome out. The pipeline holds no state between
//! invocations and adds no logic of its own; every collaborator failure
//! aborts the invocation and propagates untouched.

use std::net::IpAddr;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::blocklist::{BlockListError, BlockListMerger};
use crate::classify::{ClassifiedAddress, InvalidAddressError, IpVersion};
use crate::fingerprint::RequestFingerprint;
use crate::geolocation::{GeolocationError, GeolocationResolver};
use crate::score::ConfidenceScorer;

/// Anything that can abort a pipeline invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Address(#[from] InvalidAddressError),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error(transparent)]
    BlockList(#[from] BlockListError),
}

/// Classification and scoring result of one invocation, returned whether or
/// not the request was blocked.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// The source address as it arrived
    pub source_address: String,

    /// Canonical single-host network of the source
    pub network: String,

    /// IP version of the source
    pub version: IpVersion,

    /// Confidence score
    pub score: u32,

    /// Whether the score reached the threshold and the network was merged
    /// into the block list
    pub is_bot: bool,

    /// Names of the scoring rules that fired
    pub reasons: Vec<&'static str>,
}

/// Orchestrates classify → resolve → score → merge for one fingerprint.
pub struct BadBotPipeline {
    scorer: ConfidenceScorer,
    resolver: Arc<dyn GeolocationResolver>,
    merger: BlockListMerger,
}

impl BadBotPipeline {
    pub fn new(
        scorer: ConfidenceScorer,
        resolver: Arc<dyn GeolocationResolver>,
        merger: BlockListMerger,
    ) -> Self {
        Self {
            scorer,
            resolver,
            merger,
        }
    }

    /// Process one fingerprint. Geolocation is consulted for IPv4 sources
    /// only; IPv6 scores with geolocation absent. A confirmed bot's network
    /// is merged into the block list for its IP version before the outcome
    /// is returned.
    pub async fn process(
        &self,
        fingerprint: &RequestFingerprint,
    ) -> Result<PipelineOutcome, PipelineError> {
        let address: IpAddr = crate::classify::parse_address(&fingerprint.source_address)?;
        let classified = ClassifiedAddress::from_ip(address);

        let geolocation = match address {
            IpAddr::V4(v4) => Some(self.resolver.resolve(v4).await?),
            IpAddr::V6(_) => None,
        };

        let verdict = self
            .scorer
            .score(fingerprint, &classified, geolocation.as_deref());

        if verdict.is_bot {
            self.merger
                .block(classified.version, &classified.network)
                .await?;
        }

        Ok(PipelineOutcome {
            source_address: fingerprint.source_address.clone(),
            network: classified.network,
            version: classified.version,
            score: verdict.score,
            is_bot: verdict.is_bot,
            reasons: verdict.reasons,
        })
    }
}
