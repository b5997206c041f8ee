//! Confidence scoring.
//!
//! Converts a request fingerprint into an additive confidence score. Each
//! rule contributes a fixed weight when its predicate holds; rules are
//! independent and not mutually exclusive, so several may fire on the same
//! request. The verdict compares the summed score against the configured
//! threshold.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::classify::ClassifiedAddress;
use crate::config::ScoringConfig;
use crate::fingerprint::RequestFingerprint;
use crate::signature::SignatureMatcher;

/// SQL keywords on word boundaries, case-sensitive.
static SQL_INJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(ALTER|CREATE|DELETE|DROP|EXEC(UTE)?|INSERT( +INTO)?|MERGE|SELECT|UPDATE|UNION( +ALL)?)\b",
    )
    .expect("sql injection pattern")
});

/// HTML tag opening, tolerating percent-encoded `<` and `/`.
static XSS_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((%3C)|<)((%2F)|/)*[a-z0-9%]+((%3E)|>)").expect("xss tag pattern")
});

/// `<img ...>`-style tag with percent-encoding tolerated per character.
static XSS_IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((%3C)|<)((%69)|i|(%49))((%6D)|m|(%4D))((%67)|g|(%47))[^\n]+((%3E)|>)")
        .expect("xss img tag pattern")
});

/// Everything a rule predicate may inspect.
struct RuleContext<'a> {
    fingerprint: &'a RequestFingerprint,
    geolocation: Option<&'a str>,
    allowed_countries: &'a [String],
    signature_match: bool,
}

/// One scoring rule: a named predicate with a fixed weight.
struct ConfidenceRule {
    name: &'static str,
    weight: u32,
    applies: fn(&RuleContext<'_>) -> bool,
}

/// Content rules test body and query string against the same pattern; a
/// match in either fires the rule once.
fn content_matches(pattern: &Regex, ctx: &RuleContext<'_>) -> bool {
    pattern.is_match(&ctx.fingerprint.body) || pattern.is_match(&ctx.fingerprint.query_string)
}

/// The rule table. Adding or removing a rule here is the whole change;
/// evaluation is uniform.
const RULES: &[ConfidenceRule] = &[
    ConfidenceRule {
        name: "empty_user_agent",
        weight: 3,
        applies: |ctx| ctx.fingerprint.user_agent.is_empty(),
    },
    ConfidenceRule {
        name: "crawler_signature",
        weight: 7,
        applies: |ctx| ctx.signature_match,
    },
    ConfidenceRule {
        name: "suspicious_method",
        weight: 5,
        applies: |ctx| {
            matches!(ctx.fingerprint.http_method.as_str(), "CONNECT" | "PUT" | "DELETE")
        },
    },
    ConfidenceRule {
        name: "disallowed_geolocation",
        weight: 5,
        applies: |ctx| match ctx.geolocation {
            Some(country) => !ctx.allowed_countries.iter().any(|c| c == country),
            None => false,
        },
    },
    ConfidenceRule {
        name: "sql_injection",
        weight: 8,
        applies: |ctx| content_matches(&SQL_INJECTION, ctx),
    },
    ConfidenceRule {
        name: "xss_tag",
        weight: 8,
        applies: |ctx| content_matches(&XSS_TAG, ctx),
    },
    ConfidenceRule {
        name: "xss_img_tag",
        weight: 8,
        applies: |ctx| content_matches(&XSS_IMG_TAG, ctx),
    },
];

/// Scoring outcome. The score is reported even below the threshold; the
/// caller needs it for diagnostics either way.
#[derive(Debug, Clone, Serialize)]
pub struct BotVerdict {
    /// Summed rule weights
    pub score: u32,

    /// Whether the score reached the confidence threshold
    pub is_bot: bool,

    /// Names of the rules that fired
    pub reasons: Vec<&'static str>,
}

/// The confidence scoring engine.
pub struct ConfidenceScorer {
    threshold: u32,
    allowed_countries: Vec<String>,
    signatures: Arc<dyn SignatureMatcher>,
}

impl ConfidenceScorer {
    /// Create a scorer from configuration and a signature matcher.
    pub fn new(config: &ScoringConfig, signatures: Arc<dyn SignatureMatcher>) -> Self {
        Self {
            threshold: config.confidence_threshold,
            allowed_countries: config.allowed_countries.clone(),
            signatures,
        }
    }

    /// Score one fingerprint. `geolocation` is the resolved country of the
    /// source address, absent for IPv6 and for deployments without lookup.
    /// No rule currently keys off the classified network form.
    pub fn score(
        &self,
        fingerprint: &RequestFingerprint,
        _address: &ClassifiedAddress,
        geolocation: Option<&str>,
    ) -> BotVerdict {
        let ctx = RuleContext {
            fingerprint,
            geolocation,
            allowed_countries: &self.allowed_countries,
            signature_match: self.signatures.matches(&fingerprint.user_agent),
        };

        let mut score = 0;
        let mut reasons = Vec::new();
        for rule in RULES {
            if (rule.applies)(&ctx) {
                score += rule.weight;
                reasons.push(rule.name);
            }
        }

        BotVerdict {
            score,
            is_bot: score >= self.threshold,
            reasons,
        }
    }
}
