//! Wallet connector
//!
//! Connects an injected or deep-linked wallet provider, or a raw private
//! key, and keeps the single connected [`WalletState`] of the session.

pub mod balances;
pub mod mobile;
pub mod provider;

pub use balances::BalanceLoader;
pub use mobile::{
    attach_with_retry, detect_mobile_wallet, is_mobile_user_agent, AttachOutcome, CancelHandle,
    CancelSignal, DeepLinkOpener, InjectedFlags, MobileWallet, ProviderProbe, RetryPolicy,
};
pub use provider::{HttpWalletProvider, WalletProvider};

use crate::domain::entities::{NetworkInfo, WalletState, WalletSummary};
use crate::infrastructure::blockchain::SigningHandle;
use crate::shared::error::{ConnectionError, NetworkSwitchError, ProviderRpcError};
use crate::shared::types::{Balances, WalletKind};
use crate::shared::utils::validate_private_key;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Signer};
use log::{info, warn};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use zeroize::Zeroizing;

/// How the user wants to connect
pub enum ConnectRequest {
    /// Provider already available (browser extension, desktop wallet endpoint)
    Injected(Arc<dyn WalletProvider>),
    /// Open the wallet application through a deep link and wait for it to attach
    MobileDeepLink {
        wallet: MobileWallet,
        dapp_url: String,
        opener: Arc<dyn DeepLinkOpener>,
        probe: Arc<dyn ProviderProbe>,
        cancel: CancelSignal,
    },
    /// Raw 0x-prefixed hex key, signed locally
    PrivateKey(Zeroizing<String>),
}

impl ConnectRequest {
    pub fn private_key(key: impl Into<String>) -> Self {
        Self::PrivateKey(Zeroizing::new(key.into()))
    }
}

pub struct WalletConnector {
    source_network: NetworkInfo,
    balances: BalanceLoader,
    retry: RetryPolicy,
}

impl WalletConnector {
    pub fn new(source_network: NetworkInfo, balances: BalanceLoader, retry: RetryPolicy) -> Self {
        Self {
            source_network,
            balances,
            retry,
        }
    }

    pub fn source_network(&self) -> &NetworkInfo {
        &self.source_network
    }

    pub fn balance_loader(&self) -> &BalanceLoader {
        &self.balances
    }

    pub async fn connect(&self, request: ConnectRequest) -> Result<WalletState, ConnectionError> {
        match request {
            ConnectRequest::PrivateKey(key) => self.connect_private_key(&key).await,
            ConnectRequest::Injected(provider) => self.connect_provider(provider).await,
            ConnectRequest::MobileDeepLink {
                wallet,
                dapp_url,
                opener,
                probe,
                mut cancel,
            } => {
                let link = wallet.deep_link(&dapp_url)?;
                info!("Opening {} deep link {}", wallet, link);
                opener.open(&link)?;

                match attach_with_retry(probe.as_ref(), &self.retry, &mut cancel).await {
                    AttachOutcome::Found(provider) => self.connect_provider(provider).await,
                    AttachOutcome::TimedOut { attempts } => Err(ConnectionError::Timeout { attempts }),
                    AttachOutcome::Cancelled => Err(ConnectionError::Cancelled),
                }
            }
        }
    }

    async fn connect_private_key(&self, private_key: &str) -> Result<WalletState, ConnectionError> {
        validate_private_key(private_key)?;

        let wallet = LocalWallet::from_str(private_key)
            .map_err(|e| ConnectionError::MalformedKey(e.to_string()))?
            .with_chain_id(self.source_network.chain_id);
        let provider = Provider::<Http>::try_from(self.source_network.rpc_url.as_str())
            .map_err(|e| ConnectionError::Provider(format!("{}: {}", self.source_network.rpc_url, e)))?;

        let address = wallet.address();
        let client = SignerMiddleware::new(provider, wallet);
        let balances = self.balances.load(address).await;

        info!("Connected private-key wallet {:?} on chain {}", address, self.source_network.chain_id);
        Ok(WalletState {
            address,
            balances,
            chain_id: self.source_network.chain_id,
            signer: SigningHandle::Local(Arc::new(client)),
            kind: WalletKind::PrivateKey,
        })
    }

    async fn connect_provider(&self, provider: Arc<dyn WalletProvider>) -> Result<WalletState, ConnectionError> {
        let accounts = provider.request_accounts().await?;
        let address = accounts.first().copied().ok_or(ConnectionError::NoAccounts)?;

        let chain_id = self.ensure_network(provider.as_ref()).await?;
        let balances = self.balances.load(address).await;

        info!("Connected {} wallet {:?} on chain {}", provider.kind(), address, chain_id);
        Ok(WalletState {
            address,
            balances,
            chain_id,
            signer: provider.signing_handle(address),
            kind: provider.kind(),
        })
    }

    /// Make sure the wallet is on the source chain, adding it when the wallet does not know it
    pub async fn ensure_network(&self, provider: &dyn WalletProvider) -> Result<u64, ConnectionError> {
        let target = self.source_network.chain_id;
        let current = provider.chain_id().await?;
        if current == target {
            return Ok(current);
        }

        info!("Switching wallet from chain {} to {}", current, target);
        match provider.switch_chain(target).await {
            Ok(()) => Ok(target),
            Err(e) if e.is_unrecognized_chain() => {
                info!("Chain {} unknown to wallet, adding it", target);
                provider
                    .add_chain(self.source_network.clone())
                    .await
                    .map_err(|e| switch_error(target, e))?;
                provider
                    .switch_chain(target)
                    .await
                    .map_err(|e| switch_error(target, e))?;
                Ok(target)
            }
            Err(e) => Err(switch_error(target, e)),
        }
    }
}

fn switch_error(chain_id: u64, err: ProviderRpcError) -> ConnectionError {
    warn!("Network switch to {} failed: {}", chain_id, err);
    ConnectionError::NetworkSwitch(NetworkSwitchError {
        chain_id,
        reason: err.message,
    })
}

/// The session's connected wallet, published on a watch channel
pub struct WalletSession {
    connector: WalletConnector,
    state: watch::Sender<Option<WalletState>>,
}

impl WalletSession {
    pub fn new(connector: WalletConnector) -> Self {
        let (state, _) = watch::channel(None);
        Self { connector, state }
    }

    pub fn connector(&self) -> &WalletConnector {
        &self.connector
    }

    /// Connect, replacing any wallet connected before
    pub async fn connect(&self, request: ConnectRequest) -> Result<WalletSummary, ConnectionError> {
        let wallet = self.connector.connect(request).await?;
        let summary = wallet.summary();
        self.state.send_replace(Some(wallet));
        Ok(summary)
    }

    pub fn disconnect(&self) {
        if self.state.send_replace(None).is_some() {
            info!("Wallet disconnected");
        }
    }

    pub fn current(&self) -> Option<WalletState> {
        self.state.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub fn balances(&self) -> Result<Balances, ConnectionError> {
        self.state
            .borrow()
            .as_ref()
            .map(|wallet| wallet.balances.clone())
            .ok_or(ConnectionError::NotConnected)
    }

    pub fn signing_handle(&self) -> Result<SigningHandle, ConnectionError> {
        self.state
            .borrow()
            .as_ref()
            .map(|wallet| wallet.signer.clone())
            .ok_or(ConnectionError::NotConnected)
    }

    /// Reload balances; ignored if the wallet changed while loading
    pub async fn refresh_balances(&self) -> Result<Balances, ConnectionError> {
        let address = self
            .state
            .borrow()
            .as_ref()
            .map(|wallet| wallet.address)
            .ok_or(ConnectionError::NotConnected)?;

        let balances = self.connector.balance_loader().load(address).await;
        self.state.send_if_modified(|state| match state {
            Some(wallet) if wallet.address == address => {
                wallet.balances = balances.clone();
                true
            }
            _ => false,
        });
        Ok(balances)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<WalletState>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::balances::tests::{loader, FixedReader};
    use super::mobile::{MockDeepLinkOpener, MockProviderProbe};
    use super::provider::MockWalletProvider;
    use super::*;
    use crate::shared::error::ChainError;
    use crate::shared::types::{Address, Asset, U256};
    use mockall::predicate::eq;
    use std::time::Duration;

    const ACCOUNT: [u8; 20] = [0x3b; 20];

    fn connector() -> WalletConnector {
        let mut network = NetworkInfo::fantom();
        network.rpc_url = "http://127.0.0.1:8545".to_string();
        WalletConnector::new(
            network,
            loader(
                FixedReader {
                    native: Ok(U256::exp10(18)),
                    token: Ok(U256::exp10(18) * 2),
                },
                FixedReader {
                    native: Err(ChainError::Rpc("offline".to_string())),
                    token: Ok(U256::from(1_000_000u64)),
                },
            ),
            RetryPolicy {
                initial_delay: Duration::from_millis(10),
                interval: Duration::from_millis(10),
                max_attempts: 3,
            },
        )
    }

    fn signing_handle() -> SigningHandle {
        SigningHandle::Provider(Arc::new(Provider::<Http>::try_from("http://127.0.0.1:1248").unwrap()))
    }

    fn provider_on_chain(chain_id: u64) -> MockWalletProvider {
        let mut provider = MockWalletProvider::new();
        provider.expect_kind().return_const(WalletKind::MetaMask);
        provider
            .expect_request_accounts()
            .returning(|| Ok(vec![Address::from(ACCOUNT)]));
        provider.expect_chain_id().returning(move || Ok(chain_id));
        provider.expect_signing_handle().returning(|_| signing_handle());
        provider
    }

    #[tokio::test]
    async fn test_malformed_key_fails_before_network() {
        // Unreachable RPC: any network use would fail differently
        let mut network = NetworkInfo::fantom();
        network.rpc_url = "http://127.0.0.1:1".to_string();
        let connector = WalletConnector::new(network, connector().balances, RetryPolicy::default());

        let short = ConnectRequest::private_key(format!("0x{}", "ab".repeat(31)));
        assert!(matches!(
            connector.connect(short).await,
            Err(ConnectionError::MalformedKey(_))
        ));

        let no_prefix = ConnectRequest::private_key("ab".repeat(33));
        assert!(matches!(
            connector.connect(no_prefix).await,
            Err(ConnectionError::MalformedKey(_))
        ));
    }

    #[tokio::test]
    async fn test_private_key_connects_to_source_chain() {
        let key = format!("0x{}", "01".repeat(32));
        let wallet = connector().connect(ConnectRequest::private_key(key)).await.unwrap();

        assert_eq!(wallet.kind, WalletKind::PrivateKey);
        assert_eq!(wallet.chain_id, 250);
        assert!(matches!(wallet.signer, SigningHandle::Local(_)));
        assert_eq!(wallet.balance(Asset::Jefe), "2");
        assert_eq!(wallet.balance(Asset::Eth), "0");
        assert_eq!(wallet.balance(Asset::Usdc), "1");
    }

    #[tokio::test]
    async fn test_injected_provider_on_right_chain() {
        let mut provider = provider_on_chain(250);
        provider.expect_switch_chain().never();

        let wallet = connector()
            .connect(ConnectRequest::Injected(Arc::new(provider)))
            .await
            .unwrap();
        assert_eq!(wallet.address, Address::from(ACCOUNT));
        assert_eq!(wallet.kind, WalletKind::MetaMask);
        assert_eq!(wallet.balance(Asset::Ftm), "1");
    }

    #[tokio::test]
    async fn test_user_rejection() {
        let mut provider = MockWalletProvider::new();
        provider.expect_kind().return_const(WalletKind::MetaMask);
        provider
            .expect_request_accounts()
            .returning(|| Err(ProviderRpcError::new(4001, "User rejected the request.")));

        let result = connector().connect(ConnectRequest::Injected(Arc::new(provider))).await;
        assert_eq!(result.unwrap_err(), ConnectionError::UserRejected);
    }

    #[tokio::test]
    async fn test_no_accounts() {
        let mut provider = MockWalletProvider::new();
        provider.expect_request_accounts().returning(|| Ok(vec![]));

        let result = connector().connect(ConnectRequest::Injected(Arc::new(provider))).await;
        assert_eq!(result.unwrap_err(), ConnectionError::NoAccounts);
    }

    #[tokio::test]
    async fn test_unknown_chain_is_added_then_switched() {
        let mut provider = provider_on_chain(1);
        let mut seq = mockall::Sequence::new();
        provider
            .expect_switch_chain()
            .with(eq(250))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ProviderRpcError::new(4902, "Unrecognized chain ID")));
        provider
            .expect_add_chain()
            .withf(|network| network.chain_id == 250)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        provider
            .expect_switch_chain()
            .with(eq(250))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let wallet = connector()
            .connect(ConnectRequest::Injected(Arc::new(provider)))
            .await
            .unwrap();
        assert_eq!(wallet.chain_id, 250);
    }

    #[tokio::test]
    async fn test_switch_failure_is_network_switch_error() {
        let mut provider = provider_on_chain(1);
        provider
            .expect_switch_chain()
            .returning(|_| Err(ProviderRpcError::new(4001, "User rejected")));
        provider.expect_add_chain().never();

        let result = connector().connect(ConnectRequest::Injected(Arc::new(provider))).await;
        assert!(matches!(
            result,
            Err(ConnectionError::NetworkSwitch(NetworkSwitchError { chain_id: 250, .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mobile_deep_link_times_out() {
        let mut opener = MockDeepLinkOpener::new();
        opener
            .expect_open()
            .withf(|link| link.starts_with("https://metamask.app.link/dapp/"))
            .times(1)
            .returning(|_| Ok(()));
        let mut probe = MockProviderProbe::new();
        probe.expect_probe().times(3).returning(|| None);

        let request = ConnectRequest::MobileDeepLink {
            wallet: MobileWallet::MetaMask,
            dapp_url: "https://bridge.example.com/".to_string(),
            opener: Arc::new(opener),
            probe: Arc::new(probe),
            cancel: CancelSignal::never(),
        };
        let result = connector().connect(request).await;
        assert_eq!(result.unwrap_err(), ConnectionError::Timeout { attempts: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_mobile_deep_link_attaches() {
        let mut opener = MockDeepLinkOpener::new();
        opener.expect_open().returning(|_| Ok(()));
        let mut probe = MockProviderProbe::new();
        probe.expect_probe().returning(|| {
            let provider: Arc<dyn WalletProvider> = Arc::new(provider_on_chain(250));
            Some(provider)
        });

        let request = ConnectRequest::MobileDeepLink {
            wallet: MobileWallet::Coinbase,
            dapp_url: "https://bridge.example.com/".to_string(),
            opener: Arc::new(opener),
            probe: Arc::new(probe),
            cancel: CancelSignal::never(),
        };
        let wallet = connector().connect(request).await.unwrap();
        assert_eq!(wallet.address, Address::from(ACCOUNT));
    }

    #[tokio::test]
    async fn test_disconnect_clears_state_for_every_method() {
        let session = WalletSession::new(connector());
        let updates = session.subscribe();

        let key = format!("0x{}", "01".repeat(32));
        session.connect(ConnectRequest::private_key(key)).await.unwrap();
        assert!(updates.has_changed().unwrap());
        assert!(session.balances().is_ok());
        session.disconnect();
        assert_eq!(session.balances().unwrap_err(), ConnectionError::NotConnected);
        assert!(session.signing_handle().is_err());

        session
            .connect(ConnectRequest::Injected(Arc::new(provider_on_chain(250))))
            .await
            .unwrap();
        assert!(session.is_connected());
        session.disconnect();
        assert_eq!(session.balances().unwrap_err(), ConnectionError::NotConnected);
        assert!(session.current().is_none());
        assert_eq!(
            session.refresh_balances().await.unwrap_err(),
            ConnectionError::NotConnected
        );
    }

    #[tokio::test]
    async fn test_refresh_replaces_balances() {
        let session = WalletSession::new(connector());
        session
            .connect(ConnectRequest::Injected(Arc::new(provider_on_chain(250))))
            .await
            .unwrap();

        let balances = session.refresh_balances().await.unwrap();
        assert_eq!(balances[&Asset::Jefe], "2");
        assert_eq!(session.current().unwrap().balances, balances);
    }
}
