//! In-memory chain used by the quote and swap tests

use super::{
    BridgeGateway, ChainBackends, ChainReader, ReceiptSource, ReceiptStatus, RouterGateway, SwapCall,
    TokenGateway,
};
use crate::shared::error::ChainError;
use crate::shared::types::{Address, TransactionHash, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Approve { token: Address, spender: Address, amount: U256 },
    Swap(SwapCall),
    BridgeOut { token: Address, recipient: Address, amount: U256, chain_id: u64 },
}

/// Each send is mined immediately; every `block_number` read advances the head by one
pub struct FakeChain {
    pub router: Address,
    pub bridge: Address,
    /// Multiplier applied hop by hop in `get_amounts_out`; `None` makes quoting fail
    pub rate: Option<U256>,
    pub allowance: U256,
    pub fail_on: Option<&'static str>,
    pub revert_on: Option<&'static str>,
    pub never_mined: bool,
    pub calls: Mutex<Vec<Call>>,
    pub receipts: Mutex<HashMap<TransactionHash, ReceiptStatus>>,
    pub head: AtomicU64,
    pub nonce: AtomicU64,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self {
            router: Address::repeat_byte(0xaa),
            bridge: Address::repeat_byte(0xbb),
            rate: Some(U256::from(2u64)),
            allowance: U256::zero(),
            fail_on: None,
            revert_on: None,
            never_mined: false,
            calls: Mutex::new(Vec::new()),
            receipts: Mutex::new(HashMap::new()),
            head: AtomicU64::new(100),
            nonce: AtomicU64::new(1),
        }
    }
}

impl FakeChain {
    pub fn backends(self) -> (Arc<FakeChain>, ChainBackends) {
        let chain = Arc::new(self);
        (chain.clone(), ChainBackends::from_gateway(chain))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn send(&self, kind: &'static str, call: Call) -> Result<TransactionHash, ChainError> {
        if self.fail_on == Some(kind) {
            return Err(ChainError::Call(format!("{kind}: user denied transaction signature")));
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        let hash = TransactionHash::from_low_u64_be(self.nonce.fetch_add(1, Ordering::SeqCst));
        if !self.never_mined {
            if let Ok(mut receipts) = self.receipts.lock() {
                receipts.insert(
                    hash,
                    ReceiptStatus {
                        block_number: self.head.load(Ordering::SeqCst),
                        success: self.revert_on != Some(kind),
                    },
                );
            }
        }
        Ok(hash)
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn native_balance(&self, _owner: Address) -> Result<U256, ChainError> {
        Ok(U256::exp10(18))
    }

    async fn token_balance(&self, _token: Address, _owner: Address) -> Result<U256, ChainError> {
        Ok(U256::exp10(18))
    }

    async fn token_decimals(&self, _token: Address) -> Result<u8, ChainError> {
        Ok(18)
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        Ok(U256::from(35_500_000_000u64))
    }
}

#[async_trait]
impl ReceiptSource for FakeChain {
    async fn receipt(&self, tx_hash: TransactionHash) -> Result<Option<ReceiptStatus>, ChainError> {
        Ok(self
            .receipts
            .lock()
            .ok()
            .and_then(|receipts| receipts.get(&tx_hash).copied()))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.head.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl TokenGateway for FakeChain {
    async fn allowance(&self, _token: Address, _owner: Address, _spender: Address) -> Result<U256, ChainError> {
        Ok(self.allowance)
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TransactionHash, ChainError> {
        self.send("approve", Call::Approve { token, spender, amount })
    }
}

#[async_trait]
impl RouterGateway for FakeChain {
    fn router_address(&self) -> Address {
        self.router
    }

    async fn get_amounts_out(&self, amount_in: U256, path: Vec<Address>) -> Result<Vec<U256>, ChainError> {
        let rate = self
            .rate
            .ok_or_else(|| ChainError::Call("execution reverted: INSUFFICIENT_LIQUIDITY".to_string()))?;
        let mut amounts = vec![amount_in];
        for _ in 1..path.len() {
            let last = amounts[amounts.len() - 1];
            amounts.push(last * rate);
        }
        Ok(amounts)
    }

    async fn swap(&self, call: SwapCall) -> Result<TransactionHash, ChainError> {
        self.send("swap", Call::Swap(call))
    }
}

#[async_trait]
impl BridgeGateway for FakeChain {
    fn bridge_address(&self) -> Address {
        self.bridge
    }

    async fn bridge_out(
        &self,
        token: Address,
        recipient: Address,
        amount: U256,
        destination_chain_id: u64,
    ) -> Result<TransactionHash, ChainError> {
        self.send(
            "bridge",
            Call::BridgeOut {
                token,
                recipient,
                amount,
                chain_id: destination_chain_id,
            },
        )
    }
}
