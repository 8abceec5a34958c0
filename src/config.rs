//! Process environment loading.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_GATEWAY_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_BRIDGE_ADDR: &str = "127.0.0.1:8790";
const DEFAULT_SYNC_DIR: &str = "./shared";

/// Values read from the process environment.
#[derive(Clone, Debug)]
pub struct Environment {
    /// API key for model access. Absence is logged, not enforced; the
    /// request will fail downstream at the model call.
    pub openai_api_key: Option<String>,
    /// Bind address for the chat gateway.
    pub gateway_addr: SocketAddr,
    /// Bind address for the local bridge service.
    pub bridge_addr: SocketAddr,
    /// Directory listed by the bridge's /sync endpoint.
    pub sync_dir: PathBuf,
}

impl Environment {
    #[must_use]
    pub fn from_env() -> Self {
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        if openai_api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; model calls will fail");
        }

        Self {
            openai_api_key,
            gateway_addr: addr_from_env("GATEWAY_ADDR", DEFAULT_GATEWAY_ADDR),
            bridge_addr: addr_from_env("BRIDGE_ADDR", DEFAULT_BRIDGE_ADDR),
            sync_dir: std::env::var("BRIDGE_SYNC_DIR")
                .map_or_else(|_| PathBuf::from(DEFAULT_SYNC_DIR), PathBuf::from),
        }
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn addr_from_env(var: &str, default: &str) -> SocketAddr {
    let value = std::env::var(var).unwrap_or_else(|_| default.to_string());
    value.parse().unwrap_or_else(|_| {
        warn!(%var, %value, "invalid socket address, using default");
        default.parse().expect("default address is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_from_env_falls_back_on_garbage() {
        // Variable unset in the test environment
        let addr = addr_from_env("CHAT_AGENT_TEST_UNSET_ADDR", DEFAULT_GATEWAY_ADDR);
        assert_eq!(addr, DEFAULT_GATEWAY_ADDR.parse().unwrap());
    }
}
