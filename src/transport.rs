//! HTTP transport to the Trassir server.
//!
//! Everything the vendor speaks is POST plus JSON: a login endpoint taking
//! credentials as query parameters, and PACS endpoints under `/s/pacs/`
//! authenticated with a `sid` query parameter. The [`PacsTransport`] trait
//! is the seam that lets tests stand in a scripted double for the server.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Every request against the vendor is cut off after this long.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What went wrong talking to the vendor.
///
/// Consumers of the door service never see this type: the service folds
/// every variant into the same "no data" outcome and logs the detail.
#[derive(Debug)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure.
    Transport(String),
    /// The vendor answered outside 2xx.
    Status(u16),
    /// The vendor answered 2xx with a body that is not the expected JSON.
    Malformed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Transport(detail) => write!(f, "transport failure: {}", detail),
            TransportError::Status(code) => write!(f, "vendor returned HTTP {}", code),
            TransportError::Malformed(detail) => write!(f, "unreadable vendor reply: {}", detail),
        }
    }
}

impl std::error::Error for TransportError {}

/// Reply to the login endpoint: `{ "success": true, "sid": "..." }`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub sid: Option<String>,
}

/// One entry of the vendor's `devices-and-points-list` reply. The vendor
/// attaches plenty of other fields; only these two matter here.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessPoint {
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

/// Pull the access points out of a `devices-and-points-list` reply.
///
/// `None` means the reply carried no `points` array at all, the signature
/// of a failed or degraded call rather than a genuinely empty list.
/// Entries that do not parse (missing or non-numeric id) are skipped.
pub fn parse_points(reply: &Value) -> Option<Vec<AccessPoint>> {
    let points = reply.get("points")?.as_array()?;
    Some(
        points
            .iter()
            .filter_map(|point| serde_json::from_value(point.clone()).ok())
            .collect(),
    )
}

/// Read the `opened` verdict of an `access-point-open-once` reply.
/// Anything but an explicit boolean `true` counts as not opened.
pub fn parse_opened(reply: &Value) -> bool {
    reply.get("opened").and_then(Value::as_bool).unwrap_or(false)
}

/// The vendor HTTP surface, factored out so the service can be exercised
/// against a scripted double.
pub trait PacsTransport {
    /// `POST https://{address}/login` with the credentials in the query string.
    fn login(
        &self,
        address: &str,
        username: &str,
        password: &str,
    ) -> Result<LoginReply, TransportError>;

    /// `POST https://{address}/s/pacs/{endpoint}?sid=..` with a JSON body.
    fn call(
        &self,
        address: &str,
        endpoint: &str,
        sid: &str,
        params: &Value,
    ) -> Result<Value, TransportError>;
}

/// The real transport: a ureq agent with the 10 second timeout baked in.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Build the agent. With `accept_invalid_certs` the TLS layer takes any
    /// certificate; Trassir installations ship self-signed ones.
    pub fn new(accept_invalid_certs: bool) -> anyhow::Result<Self> {
        let mut builder = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT);
        if accept_invalid_certs {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()?;
            builder = builder.tls_connector(Arc::new(tls));
        }
        Ok(Self {
            agent: builder.build(),
        })
    }
}

impl PacsTransport for HttpTransport {
    fn login(
        &self,
        address: &str,
        username: &str,
        password: &str,
    ) -> Result<LoginReply, TransportError> {
        let url = format!("https://{}/login", address);
        let resp = self
            .agent
            .post(&url)
            .query("username", username)
            .query("password", password)
            .set("Content-Type", "application/json")
            .call();

        match resp {
            Ok(r) => r
                .into_json::<LoginReply>()
                .map_err(|e| TransportError::Malformed(e.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(TransportError::Status(code)),
            Err(e) => Err(TransportError::Transport(e.to_string())),
        }
    }

    fn call(
        &self,
        address: &str,
        endpoint: &str,
        sid: &str,
        params: &Value,
    ) -> Result<Value, TransportError> {
        let url = format!("https://{}/s/pacs/{}", address, endpoint);
        let resp = self
            .agent
            .post(&url)
            .query("sid", sid)
            .set("Content-Type", "application/json")
            .send_json(params.clone());

        match resp {
            Ok(r) => r
                .into_json::<Value>()
                .map_err(|e| TransportError::Malformed(e.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(TransportError::Status(code)),
            Err(e) => Err(TransportError::Transport(e.to_string())),
        }
    }
}
