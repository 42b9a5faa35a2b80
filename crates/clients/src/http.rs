//! Request plumbing shared by the clients

use ethers::types::U256;
use halyard_account::TransportError;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
pub struct Request<T> {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: T,
}

impl<T> Request<T> {
    pub fn new(id: u64, method: &str, params: T) -> Self {
        Self { jsonrpc: "2.0".into(), id, method: method.into(), params }
    }
}

/// JSON-RPC 2.0 response, carrying either a result or an error
#[derive(Debug, Deserialize)]
pub struct Response<T> {
    pub jsonrpc: String,
    pub id: u64,
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Envelope of the estimation backend, `{ code, message, data }`
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: Option<u64>,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Gas quantity sent either as a JSON number or as a hex string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(u64),
    Hex(U256),
}

impl From<Quantity> for U256 {
    fn from(quantity: Quantity) -> Self {
        match quantity {
            Quantity::Number(n) => U256::from(n),
            Quantity::Hex(n) => n,
        }
    }
}

/// Sends the request and returns the body of a successful response
///
/// Non-success statuses fail with the status code and the response body so callers can inspect
/// the remote error.
pub async fn send(request: RequestBuilder) -> Result<String, TransportError> {
    let response = request.send().await.map_err(|err| TransportError::new(err.to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| TransportError::new(err.to_string()).status(status.as_u16()))?;
    trace!("Response ({status}): {body}");

    if !status.is_success() {
        return Err(TransportError::new(format!("request failed with status {status}"))
            .status(status.as_u16())
            .body(body));
    }
    Ok(body)
}

/// Joins the base url and the path with exactly one slash
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_from_number_or_hex() {
        let number: Quantity = serde_json::from_str("21000").unwrap();
        let hex: Quantity = serde_json::from_str("\"0x5208\"").unwrap();
        assert_eq!(U256::from(number), U256::from(21_000));
        assert_eq!(U256::from(hex), U256::from(21_000));
    }

    #[test]
    fn request_serialization() {
        let request = Request::new(7, "eth_chainId", Vec::<u64>::new());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "jsonrpc": "2.0", "id": 7, "method": "eth_chainId", "params": [] })
        );
    }

    #[test]
    fn response_with_error() {
        let response: Response<String> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid params"}}"#,
        )
        .unwrap();
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().message, "invalid params");
    }

    #[test]
    fn urls() {
        assert_eq!(
            join_url("http://node/v1/", "/estimator/external"),
            "http://node/v1/estimator/external"
        );
        assert_eq!(join_url("http://node/v1", "fee-options"), "http://node/v1/fee-options");
    }
}
