//! Crawler signature matching.
//!
//! Tests a User-Agent string against known automated-client signatures.
//! The built-in set covers crawlers, command-line tools, HTTP libraries and
//! headless browsers; deployments extend it with configured patterns.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Signature patterns of known automated clients.
static CRAWLER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Generic crawler markers
        r"(?i)bot\b",
        r"(?i)crawl",
        r"(?i)spider",
        r"(?i)scrape",
        r"(?i)slurp",
        r"(?i)archiver",
        r"(?i)fetcher",
        r"(?i)mediapartners",
        r"(?i)facebookexternalhit",
        // Command-line tools
        r"(?i)curl/",
        r"(?i)wget",
        r"(?i)httpie",
        // HTTP libraries
        r"(?i)python-requests",
        r"(?i)python-urllib",
        r"(?i)go-http-client",
        r"(?i)\bjava/",
        r"(?i)libwww",
        r"(?i)okhttp",
        r"(?i)node-fetch",
        r"(?i)axios",
        // Headless browsers and automation
        r"(?i)headless",
        r"(?i)phantomjs",
        r"(?i)puppeteer",
        r"(?i)playwright",
        r"(?i)selenium",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("built-in signature pattern"))
    .collect()
});

/// A configured signature pattern failed to compile.
#[derive(Debug, Error)]
#[error("invalid signature pattern {pattern:?}: {source}")]
pub struct SignatureError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Reports whether a User-Agent matches known automated-client signatures.
/// Pure and synchronous; implementations must not touch the network.
pub trait SignatureMatcher: Send + Sync {
    fn matches(&self, user_agent: &str) -> bool;
}

/// Regex-backed signature matcher over the built-in crawler set plus any
/// configured extra patterns.
pub struct CrawlerSignatures {
    extra: Vec<Regex>,
}

impl CrawlerSignatures {
    /// Matcher over the built-in signature set only.
    pub fn builtin() -> Self {
        Self { extra: Vec::new() }
    }

    /// Matcher over the built-in set extended with configured patterns.
    /// Extra patterns are matched case-insensitively, like the built-ins.
    pub fn with_patterns(patterns: &[String]) -> Result<Self, SignatureError> {
        let extra = patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("(?i){p}")).map_err(|source| SignatureError {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { extra })
    }
}

impl SignatureMatcher for CrawlerSignatures {
    fn matches(&self, user_agent: &str) -> bool {
        CRAWLER_PATTERNS
            .iter()
            .chain(self.extra.iter())
            .any(|p| p.is_match(user_agent))
    }
}
