//! Integration tests for the bad-bots classifier.
//!
//! Exercise the full pipeline (event extraction, classification, scoring
//! and block-list merging) against the in-process store, mirroring the
//! system-level behavior of the honeypot endpoint.

use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;

use bad_bots::blocklist::BlockListMerger;
use bad_bots::classify::IpVersion;
use bad_bots::config::{BadBotsConfig, BlockListConfig, ScoringConfig};
use bad_bots::geolocation::{GeolocationError, GeolocationResolver};
use bad_bots::pipeline::PipelineError;
use bad_bots::score::ConfidenceScorer;
use bad_bots::signature::CrawlerSignatures;
use bad_bots::store::{BlockListStore, InMemoryBlockListStore};
use bad_bots::{BadBotPipeline, HoneypotEvent, RequestFingerprint};

// =============================================================================
// Helpers
// =============================================================================

struct FixedCountry(&'static str);

#[async_trait]
impl GeolocationResolver for FixedCountry {
    async fn resolve(&self, _address: Ipv4Addr) -> Result<String, GeolocationError> {
        Ok(self.0.to_string())
    }
}

fn make_pipeline(store: Arc<InMemoryBlockListStore>, country: &'static str) -> BadBotPipeline {
    let config = BadBotsConfig::default();
    let scorer = ConfidenceScorer::new(
        &config.scoring,
        Arc::new(CrawlerSignatures::builtin()),
    );
    let merger = BlockListMerger::new(store, config.block_list);
    BadBotPipeline::new(scorer, Arc::new(FixedCountry(country)), merger)
}

async fn list_for(store: &InMemoryBlockListStore, version: IpVersion) -> Vec<String> {
    let name = match version {
        IpVersion::V4 => "ip_set_bad_bots_ipv4",
        IpVersion::V6 => "ip_set_bad_bots_ipv6",
    };
    store
        .retrieve(version, "REGIONAL", name)
        .await
        .unwrap()
        .addresses
}

// =============================================================================
// IPv4 system path
// =============================================================================

const IPV4_EVENT: &str = r#"{
    "httpMethod": "GET",
    "body": "<script></script>EXEC",
    "path": "/users",
    "queryStringParameters": {},
    "pathParameters": { "proxy": "users" },
    "requestContext": {
        "accountId": "333333333",
        "identity": {
            "sourceIp": "1.1.1.1",
            "userAgent": "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/52.0.2743.116 Safari/537.36"
        },
        "resourcePath": "/{proxy+}",
        "httpMethod": "GET"
    },
    "headers": {
        "User-Agent": "Mozilla/5.0 (compatible; Sosospider/2.0; +http://help.soso.com/webspider.htm)"
    }
}"#;

#[tokio::test]
async fn test_system_ipv4_bad_bot_is_blocked() {
    let store = Arc::new(InMemoryBlockListStore::new());
    let pipeline = make_pipeline(store.clone(), "Netherlands");

    let event: HoneypotEvent = serde_json::from_str(IPV4_EVENT).unwrap();
    let fingerprint = RequestFingerprint::from_event(&event);
    let outcome = pipeline.process(&fingerprint).await.unwrap();

    // Crawler signature 7 + SQLi 8 + XSS tag 8.
    assert_eq!(outcome.score, 23);
    assert!(outcome.is_bot);
    assert_eq!(outcome.version, IpVersion::V4);
    assert_eq!(outcome.network, "1.1.1.1/32");

    let addresses = list_for(&store, IpVersion::V4).await;
    assert_eq!(addresses, vec!["1.1.1.1/32"]);
    assert!(list_for(&store, IpVersion::V6).await.is_empty());
}

#[tokio::test]
async fn test_system_ipv4_repeat_offender_blocked_once() {
    let store = Arc::new(InMemoryBlockListStore::new());
    let pipeline = make_pipeline(store.clone(), "Netherlands");

    let event: HoneypotEvent = serde_json::from_str(IPV4_EVENT).unwrap();
    let fingerprint = RequestFingerprint::from_event(&event);

    pipeline.process(&fingerprint).await.unwrap();
    pipeline.process(&fingerprint).await.unwrap();

    let addresses = list_for(&store, IpVersion::V4).await;
    assert_eq!(addresses, vec!["1.1.1.1/32"]);
}

// =============================================================================
// IPv6 system path
// =============================================================================

#[tokio::test]
async fn test_system_ipv6_bad_bot_is_blocked_expanded() {
    let store = Arc::new(InMemoryBlockListStore::new());
    let pipeline = make_pipeline(store.clone(), "Netherlands");

    let fingerprint = RequestFingerprint::new("2a02:a445:6d36:1:1e3:a188:313c:1d33")
        .with_user_agent("Mozilla/5.0 (Macintosh) AppleWebKit/537.36 Chrome/52.0 Safari/537.36")
        .with_method("CONNECT")
        .with_body("' UNION ALL SELECT password FROM users --");
    let outcome = pipeline.process(&fingerprint).await.unwrap();

    // Suspicious method 5 + SQLi 8; no geolocation rule for IPv6.
    assert_eq!(outcome.score, 13);
    assert!(outcome.is_bot);

    let addresses = list_for(&store, IpVersion::V6).await;
    assert_eq!(
        addresses,
        vec!["2a02:a445:6d36:0001:01e3:a188:313c:1d33/128"]
    );
    assert!(list_for(&store, IpVersion::V4).await.is_empty());
}

#[tokio::test]
async fn test_system_ipv6_benign_visitor_is_not_blocked() {
    let store = Arc::new(InMemoryBlockListStore::new());
    let pipeline = make_pipeline(store.clone(), "Netherlands");

    let fingerprint = RequestFingerprint::new("2a02:a445:6d36:1:1e3:a188:313c:1d31")
        .with_user_agent(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_1_6) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/51.0.2743.116 Safari/537.36",
        )
        .with_method("GET")
        .with_body(r#"{"name": "Sam"}"#);
    let outcome = pipeline.process(&fingerprint).await.unwrap();

    assert_eq!(outcome.score, 0);
    assert!(!outcome.is_bot);
    assert!(list_for(&store, IpVersion::V6).await.is_empty());
}

// =============================================================================
// Geolocation policy
// =============================================================================

#[tokio::test]
async fn test_disallowed_country_contributes_to_the_verdict() {
    let store = Arc::new(InMemoryBlockListStore::new());
    let pipeline = make_pipeline(store.clone(), "United States");

    // Empty user agent 3 + disallowed country 5 crosses the threshold.
    let fingerprint = RequestFingerprint::new("123.123.123.123").with_method("GET");
    let outcome = pipeline.process(&fingerprint).await.unwrap();

    assert_eq!(outcome.score, 8);
    assert!(outcome.is_bot);
    assert_eq!(list_for(&store, IpVersion::V4).await, vec!["123.123.123.123/32"]);
}

#[tokio::test]
async fn test_allowed_country_keeps_the_same_request_unblocked() {
    let store = Arc::new(InMemoryBlockListStore::new());
    let pipeline = make_pipeline(store.clone(), "Germany");

    let fingerprint = RequestFingerprint::new("123.123.123.123").with_method("GET");
    let outcome = pipeline.process(&fingerprint).await.unwrap();

    assert_eq!(outcome.score, 3);
    assert!(!outcome.is_bot);
    assert!(list_for(&store, IpVersion::V4).await.is_empty());
}

// =============================================================================
// Shared-list concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_invocations_do_not_lose_updates() {
    let store = Arc::new(InMemoryBlockListStore::new());

    // Five writers: even the unluckiest one conflicts at most four times,
    // inside the five-attempt budget.
    let sources = ["1.1.1.1", "2.2.2.2", "3.3.3.3", "4.4.4.4", "5.5.5.5"];

    let mut handles = Vec::new();
    for source in sources {
        let pipeline = make_pipeline(store.clone(), "United States");
        let fingerprint = RequestFingerprint::new(source)
            .with_user_agent("curl/7.88.0")
            .with_method("GET");
        handles.push(tokio::spawn(async move {
            pipeline.process(&fingerprint).await
        }));
    }

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome.is_bot);
    }

    let mut addresses = list_for(&store, IpVersion::V4).await;
    addresses.sort();
    let mut expected: Vec<String> = sources.iter().map(|s| format!("{s}/32")).collect();
    expected.sort();
    assert_eq!(addresses, expected);
}

// =============================================================================
// Failure propagation
// =============================================================================

#[tokio::test]
async fn test_malformed_source_address_fails_the_invocation() {
    let store = Arc::new(InMemoryBlockListStore::new());
    let pipeline = make_pipeline(store, "Netherlands");

    let err = pipeline
        .process(&RequestFingerprint::new("1.2.3"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Address(_)));
}

#[tokio::test]
async fn test_custom_threshold_changes_the_verdict() {
    let store = Arc::new(InMemoryBlockListStore::new());
    let scoring = ScoringConfig {
        confidence_threshold: 10,
        ..ScoringConfig::default()
    };
    let scorer = ConfidenceScorer::new(&scoring, Arc::new(CrawlerSignatures::builtin()));
    let merger = BlockListMerger::new(store.clone(), BlockListConfig::default());
    let pipeline = BadBotPipeline::new(scorer, Arc::new(FixedCountry("Netherlands")), merger);

    // A lone signature match (7) stays below a raised threshold.
    let fingerprint = RequestFingerprint::new("1.1.1.1")
        .with_user_agent("curl/7.88.0")
        .with_method("GET");
    let outcome = pipeline.process(&fingerprint).await.unwrap();

    assert_eq!(outcome.score, 7);
    assert!(!outcome.is_bot);
    assert!(list_for(&store, IpVersion::V4).await.is_empty());
}
