// Bridge HTTP poll client
//
// Wraps `reqwest::Client` with the gateway's fixed local CGI path and the
// template query-parameter convention. Encoding and decoding stay in the
// `template` module; this file is transport mechanics only.

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::template::{
    self, PollResponse, SensorTemplate, TemplateKind,
};
use crate::transport::TransportConfig;

/// Fixed request path every bridge exposes for template polls.
const TEMPLATE_PATH: &str = "/cgi-bin/template.cgi";

/// Raw HTTP client for a single weather-station bridge.
///
/// Polls are HTTP GETs against the bridge's LAN address with the
/// percent-encoded template as a query parameter. Responses are raw
/// bytes decoded as UTF-8 text; the `Content-Type` header is ignored
/// because deployed firmware reports it inconsistently.
#[derive(Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl BridgeClient {
    /// Create a client for the bridge at `ip_address` (host or host:port).
    pub fn new(ip_address: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{ip_address}"))?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client` and base URL.
    /// Used by tests to point at a mock server.
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout_secs: u64) -> Self {
        Self {
            http,
            base_url,
            timeout_secs,
        }
    }

    /// The bridge base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Poll weather sensor observations.
    ///
    /// Builds the observation template from `sensors`, sends it, and
    /// decodes the delimited response. A sensor with no selected unit is
    /// skipped on encode; decode errors fail the whole poll so a torn
    /// response never reaches the registry.
    pub async fn poll_observations(
        &self,
        sensors: &[SensorTemplate],
        all_parameters: bool,
    ) -> Result<PollResponse, Error> {
        let tmpl = template::encode_observation_template(sensors, all_parameters);
        let body = self.send_template(&tmpl).await?;
        template::decode_response(TemplateKind::Observation, &body)
    }

    /// Poll system parameters (firmware version, uptime, battery rails).
    pub async fn poll_system(&self, sensors: &[SensorTemplate]) -> Result<PollResponse, Error> {
        let tmpl = template::encode_system_template(sensors);
        let body = self.send_template(&tmpl).await?;
        template::decode_response(TemplateKind::System, &body)
    }

    /// Send a raw template and return the response body as text.
    async fn send_template(&self, tmpl: &str) -> Result<String, Error> {
        let mut url = self.base_url.join(TEMPLATE_PATH)?;
        url.set_query(Some(&format!(
            "template={}",
            template::percent_encode_template(tmpl)
        )));

        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Service {
                status: status.as_u16(),
                message: format!("bridge returned {status}"),
            });
        }

        resp.text().await.map_err(Error::Transport)
    }

    fn classify(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(e)
        }
    }
}
