use crate::{
    error::AccountError,
    traits::{RelayPayload, RelayTransport, TransportError},
};
use ethers::types::H256;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, trace, warn};

lazy_static! {
    static ref FAILED_OP: Regex =
        Regex::new(r#"FailedOp\(([^,]*),([^,]*),\s*("[^"]*"|'[^']*'|.*)\)"#)
            .expect("Regex rules valid");
}

/// Hands signed payloads to a relayer or bundler, no retries
pub struct RelayDispatcher {
    transport: Arc<dyn RelayTransport>,
}

impl RelayDispatcher {
    pub fn new(transport: Arc<dyn RelayTransport>) -> Self {
        Self { transport }
    }

    /// Submits the payload
    ///
    /// # Arguments
    /// * `payload` - Signed wallet transaction or user operation
    ///
    /// # Returns
    /// * `H256` - The hash returned by the transport
    pub async fn dispatch(&self, payload: &RelayPayload) -> Result<H256, AccountError> {
        trace!("Dispatching {payload:?}");
        match self.transport.submit(payload).await {
            Ok(hash) => {
                info!("Payload accepted by relay, hash: {hash:?}");
                Ok(hash)
            }
            Err(err) => {
                warn!("Relay submission failed: {err}");
                Err(unwrap_relay_error(err))
            }
        }
    }
}

/// Error message carried by the body, `error.message` of a JSON body or the raw body otherwise
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.pointer("/error/message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Maps a transport failure to `RelayRejected` when its body names a `FailedOp`
pub fn unwrap_relay_error(err: TransportError) -> AccountError {
    let message = err.body.as_deref().map(error_message);
    let failed_op = message
        .as_deref()
        .and_then(|message| FAILED_OP.captures(message))
        .and_then(|captures| Some((captures.get(2)?.as_str(), captures.get(3)?.as_str())));

    if let Some((paymaster, reason)) = failed_op {
        let reason = reason.trim();
        let reason = reason
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .or_else(|| reason.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')))
            .unwrap_or(reason);
        return AccountError::RelayRejected {
            reason: reason.to_string(),
            paymaster_info: format!("(paymaster address: {})", paymaster.trim()),
        };
    }

    AccountError::Transport {
        status: err.status,
        inner: message.filter(|m| !m.is_empty()).unwrap_or(err.message),
    }
}
