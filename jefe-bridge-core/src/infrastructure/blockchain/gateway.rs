use super::abi::{BRIDGE_ABI, ERC20_ABI, ROUTER_ABI};
use super::{
    BridgeGateway, ChainReader, ContractAddresses, ReceiptSource, ReceiptStatus, RouterGateway,
    SwapCall, SwapMethod, TokenGateway,
};
use crate::shared::error::ChainError;
use crate::shared::types::{Address, TransactionHash, U256};
use async_trait::async_trait;
use ethers::contract::Contract;
use ethers::providers::{Http, Middleware, Provider};
use std::sync::Arc;

/// Read-only access to one chain
pub struct EvmReader<M> {
    client: Arc<M>,
}

impl EvmReader<Provider<Http>> {
    pub fn connect(rpc_url: &str) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::Rpc(format!("Failed to create HTTP provider for {rpc_url}: {e}")))?;
        Ok(Self::new(Arc::new(provider)))
    }
}

impl<M: Middleware + 'static> EvmReader<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }

    fn erc20(&self, token: Address) -> Contract<M> {
        Contract::new(token, ERC20_ABI.clone(), self.client.clone())
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainReader for EvmReader<M> {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.client
            .get_balance(owner, None)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        self.erc20(token)
            .method::<_, U256>("balanceOf", owner)
            .map_err(|e| ChainError::Abi(e.to_string()))?
            .call()
            .await
            .map_err(|e| ChainError::Call(e.to_string()))
    }

    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError> {
        self.erc20(token)
            .method::<_, u8>("decimals", ())
            .map_err(|e| ChainError::Abi(e.to_string()))?
            .call()
            .await
            .map_err(|e| ChainError::Call(e.to_string()))
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.client
            .get_gas_price()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }
}

#[async_trait]
impl<M: Middleware + 'static> ReceiptSource for EvmReader<M> {
    async fn receipt(&self, tx_hash: TransactionHash) -> Result<Option<ReceiptStatus>, ChainError> {
        let receipt = self
            .client
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        Ok(receipt.and_then(|receipt| {
            let block_number = receipt.block_number?.as_u64();
            let success = receipt.status.map(|status| status.as_u64() == 1).unwrap_or(true);
            Some(ReceiptStatus {
                block_number,
                success,
            })
        }))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.client
            .get_block_number()
            .await
            .map(|number| number.as_u64())
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }
}

/// Router, bridge and token access through a signing client
pub struct EvmGateway<M> {
    reader: EvmReader<M>,
    router: Contract<M>,
    bridge: Contract<M>,
}

impl<M: Middleware + 'static> EvmGateway<M> {
    pub fn new(client: Arc<M>, contracts: ContractAddresses) -> Self {
        let router = Contract::new(contracts.router, ROUTER_ABI.clone(), client.clone());
        let bridge = Contract::new(contracts.bridge, BRIDGE_ABI.clone(), client.clone());
        Self {
            reader: EvmReader::new(client),
            router,
            bridge,
        }
    }
}

impl EvmGateway<Provider<Http>> {
    /// Unsigned gateway, enough for quotes and reads
    pub fn read_only(rpc_url: &str, contracts: ContractAddresses) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::Rpc(format!("Failed to create HTTP provider for {rpc_url}: {e}")))?;
        Ok(Self::new(Arc::new(provider), contracts))
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainReader for EvmGateway<M> {
    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.reader.native_balance(owner).await
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        self.reader.token_balance(token, owner).await
    }

    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError> {
        self.reader.token_decimals(token).await
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.reader.gas_price().await
    }
}

#[async_trait]
impl<M: Middleware + 'static> ReceiptSource for EvmGateway<M> {
    async fn receipt(&self, tx_hash: TransactionHash) -> Result<Option<ReceiptStatus>, ChainError> {
        self.reader.receipt(tx_hash).await
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.reader.block_number().await
    }
}

#[async_trait]
impl<M: Middleware + 'static> TokenGateway for EvmGateway<M> {
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256, ChainError> {
        self.reader
            .erc20(token)
            .method::<_, U256>("allowance", (owner, spender))
            .map_err(|e| ChainError::Abi(e.to_string()))?
            .call()
            .await
            .map_err(|e| ChainError::Call(e.to_string()))
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TransactionHash, ChainError> {
        let call = self
            .reader
            .erc20(token)
            .method::<_, bool>("approve", (spender, amount))
            .map_err(|e| ChainError::Abi(e.to_string()))?;
        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Call(e.to_string()))?;
        Ok(pending.tx_hash())
    }
}

#[async_trait]
impl<M: Middleware + 'static> RouterGateway for EvmGateway<M> {
    fn router_address(&self) -> Address {
        self.router.address()
    }

    async fn get_amounts_out(&self, amount_in: U256, path: Vec<Address>) -> Result<Vec<U256>, ChainError> {
        self.router
            .method::<_, Vec<U256>>("getAmountsOut", (amount_in, path))
            .map_err(|e| ChainError::Abi(e.to_string()))?
            .call()
            .await
            .map_err(|e| ChainError::Call(e.to_string()))
    }

    async fn swap(&self, call: SwapCall) -> Result<TransactionHash, ChainError> {
        let name = call.method.function_name();
        let contract_call = match call.method {
            SwapMethod::ExactEthForTokens => self
                .router
                .method::<_, Vec<U256>>(name, (call.amount_out_min, call.path, call.to, call.deadline))
                .map_err(|e| ChainError::Abi(e.to_string()))?
                .value(call.amount_in),
            SwapMethod::ExactTokensForTokens | SwapMethod::ExactTokensForEth => self
                .router
                .method::<_, Vec<U256>>(
                    name,
                    (call.amount_in, call.amount_out_min, call.path, call.to, call.deadline),
                )
                .map_err(|e| ChainError::Abi(e.to_string()))?,
        };

        let pending = contract_call
            .send()
            .await
            .map_err(|e| ChainError::Call(e.to_string()))?;
        Ok(pending.tx_hash())
    }
}

#[async_trait]
impl<M: Middleware + 'static> BridgeGateway for EvmGateway<M> {
    fn bridge_address(&self) -> Address {
        self.bridge.address()
    }

    async fn bridge_out(
        &self,
        token: Address,
        recipient: Address,
        amount: U256,
        destination_chain_id: u64,
    ) -> Result<TransactionHash, ChainError> {
        let call = self
            .bridge
            .method::<_, ()>(
                "anySwapOut",
                (token, recipient, amount, U256::from(destination_chain_id)),
            )
            .map_err(|e| ChainError::Abi(e.to_string()))?;
        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Call(e.to_string()))?;
        Ok(pending.tx_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_gateway_builds_without_network() {
        let contracts = ContractAddresses {
            router: crate::shared::constants::SPOOKY_ROUTER.parse().unwrap(),
            bridge: crate::shared::constants::MULTICHAIN_BRIDGE.parse().unwrap(),
        };
        let gateway = EvmGateway::read_only("http://127.0.0.1:8545", contracts).unwrap();
        assert_eq!(gateway.router_address(), contracts.router);
        assert_eq!(gateway.bridge_address(), contracts.bridge);
    }

    #[test]
    fn test_invalid_rpc_url_is_rejected() {
        assert!(matches!(EvmReader::connect("not a url"), Err(ChainError::Rpc(_))));
    }
}
