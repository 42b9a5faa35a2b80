//! Fee options, fee quotes and refund parameters

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Fee token option offered by the fee options service
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenData {
    pub symbol: String,
    pub address: Address,
    pub decimal: u8,
    pub logo_url: Option<String>,
    /// Gas used by the token transfer paying the refund
    pub fee_token_transfer_gas: U256,
    /// Token price of one unit of gas (scaled by `offset`)
    pub token_gas_price: Option<U256>,
    /// Divisor of `token_gas_price`
    pub offset: Option<U256>,
    pub refund_receiver: Option<Address>,
}

impl TokenData {
    /// `token_gas_price`, defaulting to zero
    pub fn token_gas_price(&self) -> U256 {
        self.token_gas_price.unwrap_or_default()
    }

    /// `offset`, defaulting to one (a zero offset counts as absent)
    pub fn offset(&self) -> U256 {
        match self.offset {
            Some(offset) if !offset.is_zero() => offset,
            _ => U256::one(),
        }
    }

    /// Quote paying for `estimated_gas_used` plus the token transfer in this token
    pub fn quote(&self, estimated_gas_used: U256) -> FeeQuote {
        let payment = self
            .token_gas_price()
            .saturating_mul(estimated_gas_used.saturating_add(self.fee_token_transfer_gas)) /
            self.offset();

        FeeQuote {
            symbol: self.symbol.clone(),
            address: self.address,
            decimal: self.decimal,
            logo_url: self.logo_url.clone(),
            token_gas_price: self.token_gas_price(),
            offset: self.offset(),
            payment,
            refund_receiver: self.refund_receiver,
        }
    }
}

/// Token-denominated payment the wallet makes to reimburse the relayer
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub symbol: String,
    pub address: Address,
    pub decimal: u8,
    #[serde(default)]
    pub logo_url: Option<String>,
    pub token_gas_price: U256,
    pub offset: U256,
    /// `token_gas_price * (estimated gas + transfer gas) / offset`, truncated
    pub payment: U256,
    #[serde(default)]
    pub refund_receiver: Option<Address>,
}

/// Refund part of a wallet transaction (argument `refundInfo` of `execTransaction`)
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRefund {
    pub base_gas: U256,
    pub gas_price: U256,
    pub token_gas_price_factor: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
}

impl From<&FeeQuote> for FeeRefund {
    fn from(quote: &FeeQuote) -> Self {
        Self {
            base_gas: U256::zero(),
            gas_price: quote.token_gas_price,
            token_gas_price_factor: if quote.offset.is_zero() { U256::one() } else { quote.offset },
            gas_token: quote.address,
            refund_receiver: quote.refund_receiver.unwrap_or_default(),
        }
    }
}

/// Input of the `handlePayment` gas estimate
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlePaymentRefund {
    pub gas_used: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub token_gas_price_factor: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
}

impl HandlePaymentRefund {
    pub fn new(gas_used: U256, refund: &FeeRefund) -> Self {
        Self {
            gas_used,
            base_gas: refund.base_gas,
            gas_price: refund.gas_price,
            token_gas_price_factor: refund.token_gas_price_factor,
            gas_token: refund.gas_token,
            refund_receiver: refund.refund_receiver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> TokenData {
        TokenData {
            symbol: "USDC".into(),
            address: Address::repeat_byte(0xaa),
            decimal: 6,
            fee_token_transfer_gas: 22_975.into(),
            token_gas_price: Some(U256::from(1_500)),
            offset: Some(U256::from(1_000_000)),
            refund_receiver: Some(Address::repeat_byte(0xbb)),
            ..Default::default()
        }
    }

    #[test]
    fn payment_truncates() {
        let quote = usdc().quote(100_000.into());
        // 1500 * 122975 / 1e6 = 184.4625
        assert_eq!(quote.payment, 184.into());
        assert_eq!(quote.offset, 1_000_000.into());
    }

    #[test]
    fn missing_price_and_offset_default() {
        let option =
            TokenData { token_gas_price: None, offset: Some(U256::zero()), ..usdc() };
        assert_eq!(option.offset(), U256::one());
        assert_eq!(option.quote(100_000.into()).payment, U256::zero());

        let option = TokenData { offset: None, ..usdc() };
        assert_eq!(option.quote(0.into()).payment, U256::from(1_500u64 * 22_975));
    }

    #[test]
    fn refund_from_quote() {
        let quote = usdc().quote(1.into());
        let refund = FeeRefund::from(&quote);
        assert_eq!(refund.gas_token, Address::repeat_byte(0xaa));
        assert_eq!(refund.refund_receiver, Address::repeat_byte(0xbb));
        assert_eq!(refund.token_gas_price_factor, 1_000_000.into());
    }

    #[test]
    fn deserializes_fee_option() {
        let option: TokenData = serde_json::from_str(
            r#"{"symbol":"ETH","address":"0x0000000000000000000000000000000000000000","decimal":18,"feeTokenTransferGas":"0x59bf","tokenGasPrice":"0x3b9aca00"}"#,
        )
        .unwrap();
        assert_eq!(option.offset(), U256::one());
        assert_eq!(option.token_gas_price(), 1_000_000_000.into());
        assert_eq!(option.refund_receiver, None);
    }
}
