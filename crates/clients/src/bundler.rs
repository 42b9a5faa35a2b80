use crate::http::{send, Request, Response};
use async_trait::async_trait;
use ethers::types::{Address, H256};
use halyard_account::{RelayPayload, RelayTransport, TransportError};
use halyard_primitives::{UserOperation, UserOperationGasEstimation};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// JSON-RPC client of an ERC-4337 bundler
#[derive(Debug)]
pub struct BundlerClient {
    client: Client,
    url: String,
    id: AtomicU64,
}

impl BundlerClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: Client::new(), url: url.into(), id: AtomicU64::new(1) }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Calls `method` and returns its result
    ///
    /// A JSON-RPC error is returned with the raw response body, so the `FailedOp` reason stays
    /// readable by the dispatcher.
    async fn call<P: Serialize + Send, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, TransportError> {
        let request = Request::new(self.id.fetch_add(1, Ordering::Relaxed), method, params);
        trace!("Calling {method} on bundler {}", self.url);

        let body = send(self.client.post(&self.url).json(&request)).await?;
        let response: Response<R> = match serde_json::from_str(&body) {
            Ok(response) => response,
            Err(err) => {
                return Err(
                    TransportError::new(format!("invalid bundler response: {err}")).body(body)
                )
            }
        };

        match (response.result, response.error) {
            (_, Some(error)) => Err(TransportError::new(error.message).body(body)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(TransportError::new(format!("{method} returned no result"))),
        }
    }

    /// `eth_sendUserOperation`, returning the user operation hash
    pub async fn send_user_operation(
        &self,
        user_operation: &UserOperation,
        entry_point: &Address,
    ) -> Result<H256, TransportError> {
        let hash: H256 = self.call("eth_sendUserOperation", (user_operation, entry_point)).await?;
        debug!("Bundler accepted user operation of {:?}: {hash:?}", user_operation.sender);
        Ok(hash)
    }

    /// `eth_estimateUserOperationGas`
    pub async fn estimate_user_operation_gas(
        &self,
        user_operation: &UserOperation,
        entry_point: &Address,
    ) -> Result<UserOperationGasEstimation, TransportError> {
        self.call("eth_estimateUserOperationGas", (user_operation, entry_point)).await
    }

    /// `eth_supportedEntryPoints`
    pub async fn supported_entry_points(&self) -> Result<Vec<Address>, TransportError> {
        self.call("eth_supportedEntryPoints", Vec::<()>::new()).await
    }
}

#[async_trait]
impl RelayTransport for BundlerClient {
    async fn submit(&self, payload: &RelayPayload) -> Result<H256, TransportError> {
        match payload {
            RelayPayload::UserOperation { user_operation, entry_point } => {
                self.send_user_operation(user_operation, entry_point).await
            }
            RelayPayload::Transaction(_) => {
                Err(TransportError::new("the bundler only accepts user operations"))
            }
        }
    }
}
