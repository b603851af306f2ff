//! Mobile wallet attach
//!
//! On a phone the wallet application is opened through a deep link and
//! attaches its provider some time later. [`attach_with_retry`] polls for it
//! with a bounded number of attempts and can be cancelled by the caller.

use super::provider::WalletProvider;
use crate::shared::constants::{
    COINBASE_DEEP_LINK_BASE, METAMASK_DEEP_LINK_BASE, MOBILE_INITIAL_DELAY_MS, MOBILE_MAX_ATTEMPTS,
    MOBILE_POLL_INTERVAL_MS,
};
use crate::shared::error::ConnectionError;
use crate::shared::types::WalletKind;
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

lazy_static! {
    static ref MOBILE_USER_AGENT: Regex =
        Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini").unwrap();
    static ref COINBASE_USER_AGENT: Regex = Regex::new(r"(?i)CoinbaseWallet").unwrap();
    static ref METAMASK_USER_AGENT: Regex = Regex::new(r"(?i)MetaMask").unwrap();
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MobileWallet {
    MetaMask,
    Coinbase,
    Unknown,
}

impl MobileWallet {
    pub fn wallet_kind(&self) -> Option<WalletKind> {
        match self {
            MobileWallet::MetaMask => Some(WalletKind::MetaMask),
            MobileWallet::Coinbase => Some(WalletKind::Coinbase),
            MobileWallet::Unknown => None,
        }
    }

    /// Link that opens the dapp inside the wallet application's browser
    pub fn deep_link(&self, dapp_url: &str) -> Result<String, ConnectionError> {
        let url = Url::parse(dapp_url)
            .map_err(|e| ConnectionError::ProviderMissing(format!("invalid dapp url {dapp_url}: {e}")))?;

        match self {
            MobileWallet::MetaMask => {
                let host = url.host_str().ok_or_else(|| {
                    ConnectionError::ProviderMissing(format!("dapp url {dapp_url} has no host"))
                })?;
                let host = match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                Ok(format!("{}{}{}", METAMASK_DEEP_LINK_BASE, host, url.path()))
            }
            MobileWallet::Coinbase => {
                let link = Url::parse_with_params(COINBASE_DEEP_LINK_BASE, &[("cb_url", url.as_str())])
                    .map_err(|e| ConnectionError::ProviderMissing(e.to_string()))?;
                Ok(link.to_string())
            }
            MobileWallet::Unknown => Err(ConnectionError::ProviderMissing(
                "no deep link for an unknown wallet".to_string(),
            )),
        }
    }
}

impl fmt::Display for MobileWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MobileWallet::MetaMask => "metamask",
            MobileWallet::Coinbase => "coinbase",
            MobileWallet::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Flags an injected provider advertises about itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectedFlags {
    pub is_metamask: bool,
    pub is_coinbase_wallet: bool,
}

pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    MOBILE_USER_AGENT.is_match(user_agent)
}

/// Guess the wallet application on a mobile device; `None` off mobile
pub fn detect_mobile_wallet(user_agent: &str, flags: InjectedFlags) -> Option<MobileWallet> {
    if !is_mobile_user_agent(user_agent) {
        return None;
    }

    if flags.is_coinbase_wallet {
        return Some(MobileWallet::Coinbase);
    }
    if flags.is_metamask {
        return Some(MobileWallet::MetaMask);
    }

    if COINBASE_USER_AGENT.is_match(user_agent) {
        return Some(MobileWallet::Coinbase);
    }
    if METAMASK_USER_AGENT.is_match(user_agent) {
        return Some(MobileWallet::MetaMask);
    }

    Some(MobileWallet::Unknown)
}

/// Hands a deep link to whatever can open it
#[cfg_attr(test, mockall::automock)]
pub trait DeepLinkOpener: Send + Sync {
    fn open(&self, link: &str) -> Result<(), ConnectionError>;
}

/// Checks whether the wallet application has attached its provider yet
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderProbe: Send + Sync {
    async fn probe(&self) -> Option<Arc<dyn WalletProvider>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(MOBILE_INITIAL_DELAY_MS),
            interval: Duration::from_millis(MOBILE_POLL_INTERVAL_MS),
            max_attempts: MOBILE_MAX_ATTEMPTS,
        }
    }
}

/// Caller side of an attach cancellation
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Attach side of an attach cancellation
#[derive(Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn pair() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
    }

    /// A signal that never fires
    pub fn never() -> Self {
        Self::pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }
}

pub enum AttachOutcome {
    Found(Arc<dyn WalletProvider>),
    TimedOut { attempts: u32 },
    Cancelled,
}

impl fmt::Debug for AttachOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachOutcome::Found(provider) => write!(f, "Found({})", provider.kind()),
            AttachOutcome::TimedOut { attempts } => write!(f, "TimedOut {{ attempts: {attempts} }}"),
            AttachOutcome::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// Poll `probe` until it yields a provider, attempts run out, or `cancel` fires
pub async fn attach_with_retry(
    probe: &dyn ProviderProbe,
    policy: &RetryPolicy,
    cancel: &mut CancelSignal,
) -> AttachOutcome {
    let attempts = async {
        sleep(policy.initial_delay).await;
        for attempt in 1..=policy.max_attempts {
            if let Some(provider) = probe.probe().await {
                info!("Wallet provider attached after {} attempt(s)", attempt);
                return AttachOutcome::Found(provider);
            }
            debug!("Wallet provider not attached yet (attempt {}/{})", attempt, policy.max_attempts);
            if attempt < policy.max_attempts {
                sleep(policy.interval).await;
            }
        }
        warn!("Wallet provider did not attach after {} attempts", policy.max_attempts);
        AttachOutcome::TimedOut {
            attempts: policy.max_attempts,
        }
    };

    tokio::select! {
        outcome = attempts => outcome,
        _ = cancel.cancelled() => {
            info!("Wallet attach cancelled");
            AttachOutcome::Cancelled
        }
    }
}
