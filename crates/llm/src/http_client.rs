//! HTTP Client Factory
//!
//! Builds reqwest clients with the configured proxy and request timeout.

use std::time::Duration;

use survey_synth_core::ProxyConfig;

use crate::types::LlmError;

/// Build a `reqwest::Client` for provider calls.
///
/// - `Some(proxy)` -> route every request through the proxy
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
///
/// The timeout bounds the whole request so a hung provider surfaces as an
/// error instead of stalling its caller.
pub fn build_http_client(
    proxy: Option<&ProxyConfig>,
    timeout: Duration,
) -> Result<reqwest::Client, LlmError> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    match proxy {
        Some(cfg) => {
            let mut p = reqwest::Proxy::all(cfg.url()).map_err(|e| LlmError::InvalidRequest {
                message: format!("invalid proxy {}: {}", cfg.url(), e),
            })?;
            if let (Some(u), Some(pw)) = (&cfg.username, &cfg.password) {
                p = p.basic_auth(u, pw);
            }
            builder = builder.proxy(p);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    builder.build().map_err(|e| LlmError::Other {
        message: format!("failed to build HTTP client: {}", e),
    })
}

/// Map a transport failure to an `LlmError`, distinguishing timeouts.
pub fn map_transport_error(err: reqwest::Error, timeout_secs: u64) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout {
            seconds: timeout_secs,
        }
    } else {
        LlmError::NetworkError {
            message: err.to_string(),
        }
    }
}
