//! Elevation Point Query Service client.
//!
//! One lookup is one HTTP GET against the EPQS JSON endpoint:
//!
//! ```text
//! GET https://epqs.nationalmap.gov/v1/json?x={lon}&y={lat}&wkid=4326&units=Feet&includeDate=false
//! ```
//!
//! The service answers with a JSON object whose `value` field holds the
//! elevation in feet, or the sentinel [`NO_DATA_VALUE`] when it has no data
//! for the location. Only timeouts are retried; every other failure ends the
//! lookup immediately.

use std::time::Duration;

use serde::Deserialize;

use crate::coord::Coordinate;
use crate::error::{EpqsError, Result};
use crate::pause::{Pause, ThreadSleep};

/// Public USGS EPQS JSON endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://epqs.nationalmap.gov/v1/json";

/// Value returned by the service when it has no elevation for a location.
pub const NO_DATA_VALUE: f64 = -1_000_000.0;

/// Spatial reference of the query coordinates (WGS84).
pub const WKID_WGS84: u32 = 4326;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default number of attempts per point (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default wait between timed-out attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Query parameters for a single point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointQuery {
    /// Longitude.
    pub x: f64,
    /// Latitude.
    pub y: f64,
    pub wkid: u32,
    pub units: &'static str,
}

impl PointQuery {
    pub fn for_coordinate(coordinate: Coordinate) -> Self {
        Self {
            x: coordinate.lon(),
            y: coordinate.lat(),
            wkid: WKID_WGS84,
            units: "Feet",
        }
    }

    /// Query string pairs in the order the service documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("x", self.x.to_string()),
            ("y", self.y.to_string()),
            ("wkid", self.wkid.to_string()),
            ("units", self.units.to_string()),
            ("includeDate", "false".to_string()),
        ]
    }
}

/// The part of the EPQS response body we care about.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    value: Option<ResponseValue>,
}

/// EPQS has served `value` both as a JSON number and as a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseValue {
    Number(f64),
    Text(String),
}

impl QueryResponse {
    /// Decode a response body.
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| EpqsError::Decode(e.to_string()))
    }

    /// Elevation in feet, or `None` when the body carries no value or the sentinel.
    pub fn elevation(&self) -> Result<Option<f64>> {
        let value = match &self.value {
            None => return Ok(None),
            Some(ResponseValue::Number(v)) => *v,
            Some(ResponseValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| EpqsError::Decode(format!("non-numeric value '{}'", s)))?,
        };

        if value == NO_DATA_VALUE || !value.is_finite() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }
}

/// Sends one point query and returns the raw body of a successful response.
///
/// Implementations must report timeouts as [`EpqsError::Timeout`]; that is
/// the only error the client retries.
pub trait Transport {
    fn get(&self, query: &PointQuery) -> Result<String>;
}

/// Outcome of one [`ElevationClient::fetch`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The service returned an elevation in feet.
    Elevation(f64),
    /// The service answered but has no data for the location.
    NoData,
    /// Every attempt timed out.
    TimedOut { attempts: u32 },
    /// A non-timeout failure. Not retried.
    Failed { reason: String },
}

impl FetchOutcome {
    /// The elevation, if one was obtained.
    pub fn elevation(&self) -> Option<f64> {
        match self {
            FetchOutcome::Elevation(e) => Some(*e),
            _ => None,
        }
    }

    /// Warning to show the user, if the lookup failed in a way worth reporting.
    pub fn warning(&self) -> Option<&str> {
        match self {
            FetchOutcome::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Client for the elevation point query endpoint.
pub struct ElevationClient<T> {
    transport: T,
    max_attempts: u32,
    retry_delay: Duration,
    pause: Box<dyn Pause>,
}

impl<T: Transport> ElevationClient<T> {
    /// Create a client with the default retry policy (3 attempts, 1 s apart).
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            pause: Box::new(ThreadSleep),
        }
    }

    /// Set the number of attempts per point. Values below 1 are treated as 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the wait between timed-out attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Replace how the client waits between attempts.
    pub fn with_pause(mut self, pause: impl Pause + 'static) -> Self {
        self.pause = Box::new(pause);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Look up the elevation of one coordinate.
    ///
    /// Timeouts are retried up to the attempt limit with a pause in between.
    /// A successful response is never retried, even when it carries no data.
    pub fn fetch(&self, coordinate: Coordinate) -> FetchOutcome {
        let query = PointQuery::for_coordinate(coordinate);
        let (lat, lon) = (coordinate.lat(), coordinate.lon());
        let mut attempt = 1;

        loop {
            tracing::debug!(lat, lon, attempt, "Querying elevation");

            let result = self
                .transport
                .get(&query)
                .and_then(|body| QueryResponse::parse(&body)?.elevation());

            match result {
                Ok(Some(elevation)) => {
                    tracing::debug!(lat, lon, elevation, "Elevation found");
                    return FetchOutcome::Elevation(elevation);
                }
                Ok(None) => {
                    tracing::debug!(lat, lon, "No elevation data");
                    return FetchOutcome::NoData;
                }
                Err(EpqsError::Timeout) if attempt < self.max_attempts => {
                    tracing::debug!(lat, lon, attempt, "Request timed out, retrying");
                    self.pause.pause(self.retry_delay);
                    attempt += 1;
                }
                Err(EpqsError::Timeout) => {
                    tracing::warn!(lat, lon, attempts = attempt, "Request timed out");
                    return FetchOutcome::TimedOut { attempts: attempt };
                }
                Err(e) => {
                    let reason = format!("Error for point ({}, {}): {}", lat, lon, e);
                    tracing::warn!(lat, lon, error = %e, "Elevation query failed");
                    return FetchOutcome::Failed { reason };
                }
            }
        }
    }
}

#[cfg(feature = "http")]
pub use http::{ElevationClientBuilder, HttpElevationClient, HttpTransport};

#[cfg(feature = "http")]
mod http {
    use super::*;
    use reqwest::blocking::Client;

    /// [`ElevationClient`] talking to a real HTTP endpoint.
    pub type HttpElevationClient = ElevationClient<HttpTransport>;

    /// Blocking reqwest transport.
    pub struct HttpTransport {
        client: Client,
        endpoint: String,
    }

    impl HttpTransport {
        /// Create a transport for `endpoint` with a per-request timeout.
        pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
            Self::with_client_builder(endpoint, Client::builder().timeout(timeout))
        }

        fn with_client_builder(
            endpoint: impl Into<String>,
            builder: reqwest::blocking::ClientBuilder,
        ) -> Result<Self> {
            let client = builder
                .build()
                .map_err(|e| EpqsError::Request(format!("Failed to create HTTP client: {}", e)))?;

            Ok(Self {
                client,
                endpoint: endpoint.into(),
            })
        }

        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }
    }

    fn map_reqwest_error(e: reqwest::Error) -> EpqsError {
        if e.is_timeout() {
            EpqsError::Timeout
        } else {
            EpqsError::Request(e.to_string())
        }
    }

    impl Transport for HttpTransport {
        fn get(&self, query: &PointQuery) -> Result<String> {
            let response = self
                .client
                .get(&self.endpoint)
                .query(&query.query_pairs())
                .send()
                .map_err(map_reqwest_error)?;

            let status = response.status();
            if !status.is_success() {
                return Err(EpqsError::HttpStatus {
                    status: status.as_u16(),
                });
            }

            response.text().map_err(map_reqwest_error)
        }
    }

    /// Builder for an [`HttpElevationClient`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// use epqs::ElevationClientBuilder;
    /// use std::time::Duration;
    ///
    /// let client = ElevationClientBuilder::new()
    ///     .timeout(Duration::from_secs(30))
    ///     .max_attempts(5)
    ///     .build()?;
    /// ```
    #[derive(Debug, Clone)]
    pub struct ElevationClientBuilder {
        endpoint: String,
        timeout: Duration,
        max_attempts: u32,
        retry_delay: Duration,
        use_proxy: bool,
    }

    impl Default for ElevationClientBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ElevationClientBuilder {
        /// Create a builder pointing at the public USGS endpoint.
        pub fn new() -> Self {
            Self {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                retry_delay: DEFAULT_RETRY_DELAY,
                use_proxy: true,
            }
        }

        /// Create a builder configured from environment variables.
        ///
        /// | Variable | Description | Default |
        /// |----------|-------------|---------|
        /// | `EPQS_URL` | Endpoint URL | `https://epqs.nationalmap.gov/v1/json` |
        /// | `EPQS_TIMEOUT_SECS` | Per-request timeout | 15 |
        /// | `EPQS_MAX_ATTEMPTS` | Attempts per point | 3 |
        /// | `EPQS_RETRY_DELAY_MS` | Wait between timed-out attempts | 1000 |
        ///
        /// Unparseable values fall back to the default.
        pub fn from_env() -> Self {
            fn parsed<V: std::str::FromStr>(name: &str) -> Option<V> {
                std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
            }

            let mut builder = Self::new();
            if let Ok(url) = std::env::var("EPQS_URL") {
                builder.endpoint = url;
            }
            if let Some(secs) = parsed::<u64>("EPQS_TIMEOUT_SECS") {
                builder.timeout = Duration::from_secs(secs);
            }
            if let Some(attempts) = parsed::<u32>("EPQS_MAX_ATTEMPTS") {
                builder.max_attempts = attempts;
            }
            if let Some(ms) = parsed::<u64>("EPQS_RETRY_DELAY_MS") {
                builder.retry_delay = Duration::from_millis(ms);
            }
            builder
        }

        pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
            self.endpoint = endpoint.into();
            self
        }

        pub fn timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        pub fn max_attempts(mut self, max_attempts: u32) -> Self {
            self.max_attempts = max_attempts;
            self
        }

        pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
            self.retry_delay = retry_delay;
            self
        }

        /// Ignore proxy settings from the environment (`HTTP_PROXY` and friends).
        pub fn no_proxy(mut self) -> Self {
            self.use_proxy = false;
            self
        }

        /// Build the client.
        ///
        /// # Errors
        ///
        /// Returns an error if the HTTP client cannot be created (e.g. TLS
        /// initialization failure).
        pub fn build(self) -> Result<HttpElevationClient> {
            let mut client = Client::builder().timeout(self.timeout);
            if !self.use_proxy {
                client = client.no_proxy();
            }
            let transport = HttpTransport::with_client_builder(self.endpoint, client)?;
            Ok(ElevationClient::new(transport)
                .with_max_attempts(self.max_attempts)
                .with_retry_delay(self.retry_delay))
        }
    }

}


#[cfg(test)]
mod tests {
    use super::testing::{body, ScriptedTransport};
    use super::*;
    use crate::pause::testing::RecordingPause;
    use std::rc::Rc;

    fn denver() -> Coordinate {
        Coordinate::new(39.7392, -104.9903).unwrap()
    }

    fn client(script: Vec<Result<String>>) -> (ElevationClient<ScriptedTransport>, Rc<RecordingPause>) {
        let pause = Rc::new(RecordingPause::default());
        let client = ElevationClient::new(ScriptedTransport::new(script)).with_pause(pause.clone());
        (client, pause)
    }

    #[test]
    fn test_query_maps_lon_to_x_and_lat_to_y() {
        let query = PointQuery::for_coordinate(denver());
        assert_eq!(query.x, -104.9903);
        assert_eq!(query.y, 39.7392);

        let pairs = query.query_pairs();
        assert_eq!(pairs[0], ("x", "-104.9903".to_string()));
        assert_eq!(pairs[1], ("y", "39.7392".to_string()));
        assert_eq!(pairs[2], ("wkid", "4326".to_string()));
        assert_eq!(pairs[3], ("units", "Feet".to_string()));
    }

    #[test]
    fn test_parse_numeric_value() {
        let resp = QueryResponse::parse(r#"{"value": 5280.5}"#).unwrap();
        assert_eq!(resp.elevation().unwrap(), Some(5280.5));
    }

    #[test]
    fn test_parse_string_value() {
        let resp = QueryResponse::parse(r#"{"value": "5280.25"}"#).unwrap();
        assert_eq!(resp.elevation().unwrap(), Some(5280.25));
    }

    #[test]
    fn test_parse_sentinel_is_no_data() {
        let resp = QueryResponse::parse(r#"{"value": -1000000}"#).unwrap();
        assert_eq!(resp.elevation().unwrap(), None);

        let resp = QueryResponse::parse(r#"{"value": "-1000000"}"#).unwrap();
        assert_eq!(resp.elevation().unwrap(), None);
    }

    #[test]
    fn test_parse_missing_value_is_no_data() {
        let resp = QueryResponse::parse(r#"{"location": {}}"#).unwrap();
        assert_eq!(resp.elevation().unwrap(), None);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            QueryResponse::parse("<html>busy</html>"),
            Err(EpqsError::Decode(_))
        ));

        let resp = QueryResponse::parse(r#"{"value": "n/a"}"#).unwrap();
        assert!(matches!(resp.elevation(), Err(EpqsError::Decode(_))));
    }

    #[test]
    fn test_fetch_success_first_attempt() {
        let (client, pause) = client(vec![body(5280.0)]);

        assert_eq!(client.fetch(denver()), FetchOutcome::Elevation(5280.0));
        assert_eq!(client.transport().calls(), 1);
        assert!(pause.recorded().is_empty());
    }

    #[test]
    fn test_fetch_sentinel_not_retried() {
        let (client, pause) = client(vec![body(NO_DATA_VALUE), body(100.0)]);

        let outcome = client.fetch(denver());
        assert_eq!(outcome, FetchOutcome::NoData);
        assert_eq!(outcome.elevation(), None);
        assert_eq!(outcome.warning(), None);
        assert_eq!(client.transport().calls(), 1);
        assert!(pause.recorded().is_empty());
    }

    #[test]
    fn test_fetch_retries_timeouts_then_succeeds() {
        let (client, pause) = client(vec![Err(EpqsError::Timeout), Err(EpqsError::Timeout), body(12.5)]);

        assert_eq!(client.fetch(denver()), FetchOutcome::Elevation(12.5));
        assert_eq!(client.transport().calls(), 3);
        assert_eq!(pause.recorded(), vec![Duration::from_secs(1); 2]);
    }

    #[test]
    fn test_fetch_gives_up_after_three_timeouts() {
        let (client, pause) = client(vec![]);

        let outcome = client.fetch(denver());
        assert_eq!(outcome, FetchOutcome::TimedOut { attempts: 3 });
        assert_eq!(outcome.elevation(), None);
        assert_eq!(client.transport().calls(), 3);
        // No wait after the final attempt.
        assert_eq!(pause.recorded().len(), 2);
    }

    #[test]
    fn test_fetch_non_timeout_error_not_retried() {
        let (client, pause) = client(vec![
            Err(EpqsError::Request("connection refused".to_string())),
            body(1.0),
        ]);

        let outcome = client.fetch(denver());
        assert_eq!(outcome.elevation(), None);
        let warning = outcome.warning().unwrap();
        assert!(warning.contains("(39.7392, -104.9903)"));
        assert!(warning.contains("connection refused"));
        assert_eq!(client.transport().calls(), 1);
        assert!(pause.recorded().is_empty());
    }

    #[test]
    fn test_fetch_http_status_not_retried() {
        let (client, _) = client(vec![Err(EpqsError::HttpStatus { status: 500 }), body(1.0)]);

        assert!(matches!(client.fetch(denver()), FetchOutcome::Failed { .. }));
        assert_eq!(client.transport().calls(), 1);
    }

    #[test]
    fn test_fetch_malformed_body_is_failure() {
        let (client, _) = client(vec![Ok("not json".to_string())]);

        let outcome = client.fetch(denver());
        assert!(outcome.warning().unwrap().contains("Invalid response body"));
        assert_eq!(client.transport().calls(), 1);
    }

    #[test]
    fn test_fetch_respects_custom_attempts_and_delay() {
        let pause = Rc::new(RecordingPause::default());
        let client = ElevationClient::new(ScriptedTransport::new(vec![]))
            .with_max_attempts(5)
            .with_retry_delay(Duration::from_millis(250))
            .with_pause(pause.clone());

        assert_eq!(client.fetch(denver()), FetchOutcome::TimedOut { attempts: 5 });
        assert_eq!(pause.recorded(), vec![Duration::from_millis(250); 4]);
    }

    #[test]
    fn test_fetch_sends_coordinate() {
        let (client, _) = client(vec![body(1.0)]);
        client.fetch(Coordinate::new(-33.5, 151.25).unwrap());

        let queries = client.transport().queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].x, 151.25);
        assert_eq!(queries[0].y, -33.5);
        assert_eq!(queries[0].wkid, WKID_WGS84);
    }
}
