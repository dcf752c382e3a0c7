//! Liveness probe against the external proxy-check API

use crate::error::ProbeError;
use crate::proxy::models::{CandidateRecord, Liveness, ProbeOutcome};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for a single probe in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default value substituted for `{host}` in the API template
const DEFAULT_PROBE_HOST: &str = "speed.cloudflare.com";

/// Configuration for the liveness probe
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// URL template with `{ip}`, `{port}` and optional `{host}` placeholders
    pub api_url: String,
    /// Host the API is asked to reach through the candidate
    pub probe_host: String,
    /// Timeout for each probe
    pub timeout: Duration,
}

impl ProbeConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            probe_host: DEFAULT_PROBE_HOST.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_probe_host(mut self, host: impl Into<String>) -> Self {
        self.probe_host = host.into();
        self
    }

    /// Build the request URL for a candidate
    pub fn request_url(&self, candidate: &CandidateRecord) -> String {
        self.api_url
            .replace("{ip}", &candidate.ip)
            .replace("{port}", &candidate.port)
            .replace("{host}", &self.probe_host)
    }
}

/// One liveness check for one candidate
///
/// Implementations must never fail past their own boundary: every call
/// resolves to exactly one outcome.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, candidate: &CandidateRecord) -> ProbeOutcome;
}

impl Liveness {
    /// Interpret the `proxyip` flag of a check response
    ///
    /// Booleans are taken as-is, strings are alive iff they equal `"true"`
    /// after trimming (case-insensitive); anything else, including a missing
    /// flag, is dead.
    pub fn from_flag(flag: Option<&Value>) -> Self {
        let alive = match flag {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        };

        if alive {
            Liveness::Alive
        } else {
            Liveness::Dead
        }
    }

    /// Interpret a raw response body, which must be a JSON object
    pub fn from_body(body: &str) -> Result<Self, ProbeError> {
        let response: Map<String, Value> = serde_json::from_str(body)?;
        Ok(Self::from_flag(response.get("proxyip")))
    }
}

/// HTTP client for the proxy-check API
#[derive(Clone)]
pub struct ProxyChecker {
    config: ProbeConfig,
    client: Client,
}

impl ProxyChecker {
    /// Create a new checker with its own HTTP client
    pub fn with_config(config: ProbeConfig) -> Result<Self, ProbeError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Check a single candidate
    pub async fn check_candidate(&self, candidate: &CandidateRecord) -> ProbeOutcome {
        let address = candidate.to_address();

        match self.request_liveness(candidate).await {
            Ok(Liveness::Alive) => {
                info!("{} is ALIVE", address);
                ProbeOutcome::Alive(candidate.clone())
            }
            Ok(Liveness::Dead) => {
                debug!("{} is DEAD", address);
                ProbeOutcome::Dead(candidate.clone())
            }
            Err(e) => {
                let message = e.diagnostic(&address);
                warn!("{}", message);
                ProbeOutcome::Error(candidate.clone(), message)
            }
        }
    }

    async fn request_liveness(&self, candidate: &CandidateRecord) -> Result<Liveness, ProbeError> {
        let url = self.config.request_url(candidate);
        debug!(url = %url, "probe request");

        let request = async {
            let response = self.client.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(ProbeError::Status(response.status()));
            }
            Ok::<_, ProbeError>(response.text().await?)
        };

        let body = match tokio::time::timeout(self.config.timeout, request).await {
            Ok(Ok(body)) => body,
            Ok(Err(ProbeError::Transport(e))) if e.is_timeout() => {
                return Err(ProbeError::Timeout(self.config.timeout))
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(ProbeError::Timeout(self.config.timeout)),
        };

        Liveness::from_body(&body)
    }
}

#[async_trait]
impl LivenessProbe for ProxyChecker {
    async fn probe(&self, candidate: &CandidateRecord) -> ProbeOutcome {
        self.check_candidate(candidate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate() -> CandidateRecord {
        CandidateRecord::new("1.2.3.4", "8080", "KR", "Test")
    }

    fn checker_for(server: &MockServer) -> ProxyChecker {
        let template = format!(
            "{}/check?ip={{ip}}&host={{host}}&port={{port}}&tls=true",
            server.uri()
        );
        ProxyChecker::with_config(ProbeConfig::new(template).with_timeout(Duration::from_secs(5)))
            .unwrap()
    }

    async fn mount_body(server: &MockServer, body: Value) {
        Mock::given(method("GET"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_probe_config_default() {
        let config = ProbeConfig::new("http://api/check");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.probe_host, DEFAULT_PROBE_HOST);
    }

    #[test]
    fn test_request_url() {
        let config = ProbeConfig::new("http://api/check?ip={ip}&host={host}&port={port}&tls=true")
            .with_probe_host("example.com");
        assert_eq!(
            config.request_url(&candidate()),
            "http://api/check?ip=1.2.3.4&host=example.com&port=8080&tls=true"
        );
    }

    #[test]
    fn test_flag_alive_values() {
        assert_eq!(Liveness::from_flag(Some(&json!(true))), Liveness::Alive);
        assert_eq!(Liveness::from_flag(Some(&json!("TRUE"))), Liveness::Alive);
        assert_eq!(Liveness::from_flag(Some(&json!("  true "))), Liveness::Alive);
    }

    #[test]
    fn test_flag_dead_values() {
        assert_eq!(Liveness::from_flag(Some(&json!(false))), Liveness::Dead);
        assert_eq!(Liveness::from_flag(Some(&json!("no"))), Liveness::Dead);
        assert_eq!(Liveness::from_flag(Some(&json!(1))), Liveness::Dead);
        assert_eq!(Liveness::from_flag(Some(&Value::Null)), Liveness::Dead);
        assert_eq!(Liveness::from_flag(Some(&json!(["true"]))), Liveness::Dead);
        assert_eq!(Liveness::from_flag(Some(&json!({"v": true}))), Liveness::Dead);
        assert_eq!(Liveness::from_flag(None), Liveness::Dead);
    }

    #[test]
    fn test_from_body() {
        assert_eq!(Liveness::from_body(r#"{"proxyip": true}"#).unwrap(), Liveness::Alive);
        assert_eq!(Liveness::from_body(r#"{"proxyip": null}"#).unwrap(), Liveness::Dead);
        assert_eq!(Liveness::from_body(r#"{"other": 1}"#).unwrap(), Liveness::Dead);
        assert!(Liveness::from_body("<html>oops</html>").is_err());
        assert!(Liveness::from_body("[true]").is_err());
        assert!(Liveness::from_body("true").is_err());
    }

    #[tokio::test]
    async fn test_check_alive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/check"))
            .and(query_param("ip", "1.2.3.4"))
            .and(query_param("port", "8080"))
            .and(query_param("host", DEFAULT_PROBE_HOST))
            .and(query_param("tls", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"proxyip": true})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = checker_for(&server).check_candidate(&candidate()).await;
        assert_eq!(outcome, ProbeOutcome::Alive(candidate()));
    }

    #[tokio::test]
    async fn test_check_string_flag() {
        let server = MockServer::start().await;
        mount_body(&server, json!({"proxyip": "TRUE"})).await;

        let outcome = checker_for(&server).probe(&candidate()).await;
        assert!(outcome.is_alive());
    }

    #[tokio::test]
    async fn test_check_dead() {
        let server = MockServer::start().await;
        mount_body(&server, json!({"proxyip": "no"})).await;

        let outcome = checker_for(&server).check_candidate(&candidate()).await;
        assert_eq!(outcome, ProbeOutcome::Dead(candidate()));
    }

    #[tokio::test]
    async fn test_check_missing_flag_is_dead() {
        let server = MockServer::start().await;
        mount_body(&server, json!({"status": "ok"})).await;

        let outcome = checker_for(&server).check_candidate(&candidate()).await;
        assert_eq!(outcome, ProbeOutcome::Dead(candidate()));
    }

    #[tokio::test]
    async fn test_check_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = checker_for(&server).check_candidate(&candidate()).await;
        match outcome {
            ProbeOutcome::Error(record, message) => {
                assert_eq!(record, candidate());
                assert!(message.contains("1.2.3.4:8080"));
                assert!(message.contains("500"));
            }
            other => panic!("expected error outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let outcome = checker_for(&server).check_candidate(&candidate()).await;
        match outcome {
            ProbeOutcome::Error(_, message) => {
                assert!(message.starts_with("Error parsing JSON for 1.2.3.4:8080"));
            }
            other => panic!("expected error outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"proxyip": true}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let template = format!("{}/check?ip={{ip}}&port={{port}}", server.uri());
        let checker = ProxyChecker::with_config(
            ProbeConfig::new(template).with_timeout(Duration::from_millis(200)),
        )
        .unwrap();

        let outcome = checker.check_candidate(&candidate()).await;
        match outcome {
            ProbeOutcome::Error(_, message) => assert!(message.contains("timed out")),
            other => panic!("expected error outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_unreachable_api() {
        let checker = ProxyChecker::with_config(
            ProbeConfig::new("http://127.0.0.1:9/check?ip={ip}&port={port}")
                .with_timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let outcome = checker.check_candidate(&candidate()).await;
        match outcome {
            ProbeOutcome::Error(_, message) => {
                assert!(!message.is_empty());
                assert!(message.starts_with("Error checking 1.2.3.4:8080"));
            }
            other => panic!("expected error outcome, got {:?}", other),
        }
    }
}
