use crate::http::{join_url, send, ApiResponse, Quantity};
use async_trait::async_trait;
use ethers::types::{Address, Bytes, U256};
use halyard_account::GasEstimationService;
use halyard_primitives::{HandlePaymentRefund, SmartAccountVersion, TokenData, WalletTransaction};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateExternalGas {
    chain_id: u64,
    encoded_data: Bytes,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateRequiredTxGas<'a> {
    chain_id: u64,
    wallet_address: Address,
    transaction: &'a WalletTransaction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateHandlePaymentGas<'a> {
    chain_id: u64,
    version: SmartAccountVersion,
    wallet_address: Address,
    fee_refund: &'a HandlePaymentRefund,
}

#[derive(Debug, Deserialize)]
struct GasResponse {
    gas: Quantity,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeOptionsResponse {
    #[serde(default)]
    response: Vec<TokenData>,
}

/// Client of the SDK backend serving gas estimates and fee options
#[derive(Debug, Clone)]
pub struct NodeClient {
    client: Client,
    base_url: String,
}

impl NodeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into() }
    }

    /// Uses the given HTTP client (timeouts, proxies) instead of a default one
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<T: DeserializeOwned + Send>(
        &self,
        request: RequestBuilder,
    ) -> eyre::Result<T> {
        let body = send(request).await?;
        let response: ApiResponse<T> = serde_json::from_str(&body)?;
        match (response.code, response.data) {
            (Some(code), _) if code != 200 => {
                eyre::bail!("backend error {code}: {}", response.message.unwrap_or_default())
            }
            (_, Some(data)) => Ok(data),
            (_, None) => eyre::bail!(
                "backend response without data: {}",
                response.message.unwrap_or_default()
            ),
        }
    }

    async fn post_gas<B: Serialize + Sync>(&self, path: &str, body: &B) -> eyre::Result<U256> {
        let url = join_url(&self.base_url, path);
        trace!("Requesting gas estimate from {url}");
        let response: GasResponse = self.request(self.client.post(url).json(body)).await?;
        Ok(response.gas.into())
    }
}

#[async_trait]
impl GasEstimationService for NodeClient {
    async fn estimate_external_gas(
        &self,
        chain_id: u64,
        encoded_data: Bytes,
    ) -> eyre::Result<U256> {
        self.post_gas("estimator/external", &EstimateExternalGas { chain_id, encoded_data }).await
    }

    async fn estimate_required_tx_gas(
        &self,
        chain_id: u64,
        wallet: Address,
        tx: &WalletTransaction,
        override_mode: bool,
    ) -> eyre::Result<U256> {
        let path = if override_mode { "estimator/required-override" } else { "estimator/required" };
        let gas = self
            .post_gas(
                path,
                &EstimateRequiredTxGas { chain_id, wallet_address: wallet, transaction: tx },
            )
            .await?;
        debug!("Required tx gas of {wallet:?} on chain {chain_id}: {gas}");
        Ok(gas)
    }

    async fn estimate_handle_payment_gas(
        &self,
        chain_id: u64,
        wallet: Address,
        version: SmartAccountVersion,
        refund: &HandlePaymentRefund,
        override_mode: bool,
    ) -> eyre::Result<U256> {
        let path = if override_mode {
            "estimator/handle-payment-override"
        } else {
            "estimator/handle-payment"
        };
        let body = EstimateHandlePaymentGas {
            chain_id,
            version,
            wallet_address: wallet,
            fee_refund: refund,
        };
        self.post_gas(path, &body).await
    }

    async fn get_fee_options(&self, chain_id: u64) -> eyre::Result<Vec<TokenData>> {
        let request = self
            .client
            .get(join_url(&self.base_url, "fee-options"))
            .query(&[("chainId", chain_id)]);
        let options: FeeOptionsResponse = self.request(request).await?;
        debug!("{} fee options on chain {chain_id}", options.response.len());
        Ok(options.response)
    }
}
