//! Honeypot-triggered bot classifier and block-list maintainer.
//!
//! Scores requests that hit a honeypot trap endpoint for bot-ness and, at
//! or above a confidence threshold, merges the source network into a
//! shared per-IP-version block list.
//!
//! # Features
//!
//! - Additive confidence scoring from a declarative rule table (user agent,
//!   crawler signatures, HTTP method, geolocation, SQLi/XSS content)
//! - Canonical single-host network classification (`/32`, expanded `/128`)
//! - Optimistic-versioned block-list merging with bounded conflict retries
//! - Cached HTTP geolocation lookup for IPv4 sources
//!
//! # Example
//!
//! ```ignore
//! use bad_bots::{BadBotPipeline, RequestFingerprint};
//!
//! let outcome = pipeline.process(&fingerprint).await?;
//! if outcome.is_bot {
//!     println!("blocked {}", outcome.network);
//! }
//! ```

pub mod blocklist;
pub mod classify;
pub mod config;
pub mod fingerprint;
pub mod geolocation;
pub mod pipeline;
pub mod score;
pub mod signature;
pub mod store;

pub use blocklist::{BlockListError, BlockListMerger};
pub use classify::{classify, ClassifiedAddress, InvalidAddressError, IpVersion};
pub use config::BadBotsConfig;
pub use fingerprint::{HoneypotEvent, RequestFingerprint};
pub use pipeline::{BadBotPipeline, PipelineError, PipelineOutcome};
pub use score::{BotVerdict, ConfidenceScorer};
pub use signature::{CrawlerSignatures, SignatureMatcher};
pub use store::{BlockListStore, InMemoryBlockListStore};
