//! Wallet provider seam
//!
//! A wallet application is reached through EIP-1193 method names sent over
//! JSON-RPC. The application holds the keys, so transactions sent through
//! the resulting [`SigningHandle`] are signed on its side.

use crate::domain::entities::NetworkInfo;
use crate::infrastructure::blockchain::SigningHandle;
use crate::shared::error::{ConnectionError, ProviderRpcError};
use crate::shared::types::{Address, WalletKind};
use crate::shared::utils::chain_id_hex;
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use std::sync::Arc;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> WalletKind;

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderRpcError>;

    async fn chain_id(&self) -> Result<u64, ProviderRpcError>;

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderRpcError>;

    async fn add_chain(&self, network: NetworkInfo) -> Result<(), ProviderRpcError>;

    fn signing_handle(&self, account: Address) -> SigningHandle;
}

/// Wallet application exposed as a JSON-RPC endpoint
pub struct HttpWalletProvider {
    kind: WalletKind,
    provider: Provider<Http>,
}

impl HttpWalletProvider {
    pub fn connect(rpc_url: &str, kind: WalletKind) -> Result<Self, ConnectionError> {
        let provider = Provider::<Http>::try_from(rpc_url).map_err(|e| {
            ConnectionError::ProviderMissing(format!("{rpc_url}: {e}"))
        })?;
        Ok(Self { kind, provider })
    }
}

fn rpc_error(err: ProviderError) -> ProviderRpcError {
    match err.as_error_response() {
        Some(response) => ProviderRpcError::new(response.code, response.message.clone()),
        None => ProviderRpcError::transport(err.to_string()),
    }
}

#[async_trait]
impl WalletProvider for HttpWalletProvider {
    fn kind(&self) -> WalletKind {
        self.kind
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderRpcError> {
        self.provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await
            .map_err(rpc_error)
    }

    async fn chain_id(&self) -> Result<u64, ProviderRpcError> {
        self.provider
            .get_chainid()
            .await
            .map(|id| id.low_u64())
            .map_err(rpc_error)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderRpcError> {
        let params = [serde_json::json!({ "chainId": chain_id_hex(chain_id) })];
        self.provider
            .request::<_, serde_json::Value>("wallet_switchEthereumChain", params)
            .await
            .map(|_| ())
            .map_err(rpc_error)
    }

    async fn add_chain(&self, network: NetworkInfo) -> Result<(), ProviderRpcError> {
        let params = [network.add_chain_params()];
        self.provider
            .request::<_, serde_json::Value>("wallet_addEthereumChain", params)
            .await
            .map(|_| ())
            .map_err(rpc_error)
    }

    fn signing_handle(&self, account: Address) -> SigningHandle {
        SigningHandle::Provider(Arc::new(self.provider.clone().with_sender(account)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::{HttpClientError, JsonRpcError};

    fn json_rpc_failure(code: i64, message: &str) -> ProviderError {
        ProviderError::from(HttpClientError::JsonRpcError(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        }))
    }

    #[test]
    fn test_wallet_error_responses_keep_their_codes() {
        let rejected = rpc_error(json_rpc_failure(4001, "User rejected the request."));
        assert!(rejected.is_user_rejection());
        assert_eq!(rejected.message, "User rejected the request.");

        let unknown_chain = rpc_error(json_rpc_failure(4902, "Unrecognized chain ID \"0xfa\"."));
        assert!(unknown_chain.is_unrecognized_chain());
        assert!(!unknown_chain.is_user_rejection());
    }

    #[test]
    fn test_non_rpc_failures_map_to_transport() {
        let err = rpc_error(ProviderError::CustomError("connection refused".to_string()));
        assert_eq!(err.code, ProviderRpcError::TRANSPORT);
        assert!(err.message.contains("connection refused"));
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        let result = HttpWalletProvider::connect("not a url", WalletKind::MetaMask);
        assert!(matches!(result, Err(ConnectionError::ProviderMissing(_))));
    }

    #[test]
    fn test_signing_handle_targets_wallet_endpoint() {
        let provider = HttpWalletProvider::connect("http://127.0.0.1:1248", WalletKind::Coinbase).unwrap();
        assert_eq!(provider.kind(), WalletKind::Coinbase);
        let handle = provider.signing_handle(Address::repeat_byte(0x11));
        assert!(matches!(handle, SigningHandle::Provider(_)));
    }
}
