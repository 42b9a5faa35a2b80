use crate::http::send;
use async_trait::async_trait;
use ethers::types::H256;
use halyard_account::{RelayPayload, RelayTransport, TransportError};
use halyard_primitives::RelayResponse;
use reqwest::Client;
use tracing::trace;

/// REST relayer executing signed wallet transactions
#[derive(Debug, Clone)]
pub struct RestRelayer {
    client: Client,
    url: String,
}

impl RestRelayer {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: Client::new(), url: url.into() }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl RelayTransport for RestRelayer {
    async fn submit(&self, payload: &RelayPayload) -> Result<H256, TransportError> {
        let RelayPayload::Transaction(relay) = payload else {
            return Err(TransportError::new("the relayer only accepts wallet transactions"));
        };
        trace!("Posting wallet transaction to {}", self.url);

        let body = send(self.client.post(&self.url).json(relay)).await?;
        match serde_json::from_str::<RelayResponse>(&body) {
            Ok(response) => Ok(response.hash),
            Err(err) => {
                Err(TransportError::new(format!("invalid relayer response: {err}")).body(body))
            }
        }
    }
}
