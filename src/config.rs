use serde::Deserialize;
use std::time::Duration;

use crate::{
    services::recommendations::CallSettings,
    transport::{
        client::DEFAULT_MAX_RESPONSE_BYTES, CallOptions, Endpoint, Framing, TransportClient,
    },
};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Recommendation service host
    #[serde(default = "default_recommender_host")]
    pub recommender_host: String,

    /// Recommendation service port
    #[serde(default = "default_recommender_port")]
    pub recommender_port: u16,

    /// Bound on the best-effort view notification
    #[serde(default = "default_view_timeout_ms")]
    pub view_timeout_ms: u64,

    /// Bound on the recommendation query a user is waiting on
    #[serde(default = "default_recommend_timeout_ms")]
    pub recommend_timeout_ms: u64,

    /// Bound on the startup connectivity check
    #[serde(default = "default_self_test_timeout_ms")]
    pub self_test_timeout_ms: u64,

    #[serde(default = "default_framing")]
    pub view_framing: Framing,

    #[serde(default = "default_framing")]
    pub recommend_framing: Framing,

    #[serde(default = "default_framing")]
    pub self_test_framing: Framing,

    /// Cap on buffered response bytes per call
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

fn default_recommender_host() -> String {
    "127.0.0.1".to_string()
}

fn default_recommender_port() -> u16 {
    5566
}

fn default_view_timeout_ms() -> u64 {
    5_000
}

fn default_recommend_timeout_ms() -> u64 {
    10_000
}

fn default_self_test_timeout_ms() -> u64 {
    5_000
}

// The service answers with newline-terminated lines and keeps the socket
// open until the client hangs up, so waiting for close would always time out.
fn default_framing() -> Framing {
    Framing::NewlineTerminated
}

fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recommender_host: default_recommender_host(),
            recommender_port: default_recommender_port(),
            view_timeout_ms: default_view_timeout_ms(),
            recommend_timeout_ms: default_recommend_timeout_ms(),
            self_test_timeout_ms: default_self_test_timeout_ms(),
            view_framing: default_framing(),
            recommend_framing: default_framing(),
            self_test_framing: default_framing(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.recommender_host.clone(), self.recommender_port)
    }

    pub fn transport_client(&self) -> TransportClient {
        TransportClient::new(self.endpoint()).with_max_response_bytes(self.max_response_bytes)
    }

    pub fn call_settings(&self) -> CallSettings {
        CallSettings {
            view: CallOptions::new(Duration::from_millis(self.view_timeout_ms), self.view_framing),
            recommend: CallOptions::new(
                Duration::from_millis(self.recommend_timeout_ms),
                self.recommend_framing,
            ),
            self_test: CallOptions::new(
                Duration::from_millis(self.self_test_timeout_ms),
                self.self_test_framing,
            ),
        }
    }
}
