use crate::domain::entities::TokenInfo;
use crate::infrastructure::blockchain::ChainReader;
use crate::shared::constants::NATIVE_DECIMALS;
use crate::shared::error::ChainError;
use crate::shared::types::{Address, Asset, Balances, U256};
use crate::shared::utils::format_token_amount;
use log::warn;
use std::sync::Arc;

/// Reads the wallet's balance sheet from both chains
#[derive(Clone)]
pub struct BalanceLoader {
    source: Arc<dyn ChainReader>,
    destination: Arc<dyn ChainReader>,
    jefe: TokenInfo,
    usdc_destination: TokenInfo,
}

impl BalanceLoader {
    pub fn new(
        source: Arc<dyn ChainReader>,
        destination: Arc<dyn ChainReader>,
        jefe: TokenInfo,
        usdc_destination: TokenInfo,
    ) -> Self {
        Self {
            source,
            destination,
            jefe,
            usdc_destination,
        }
    }

    /// All four reads run concurrently; a failed read shows as "0"
    pub async fn load(&self, owner: Address) -> Balances {
        let (jefe, ftm, eth, usdc) = tokio::join!(
            self.source.token_balance(self.jefe.address, owner),
            self.source.native_balance(owner),
            self.destination.native_balance(owner),
            self.destination.token_balance(self.usdc_destination.address, owner),
        );

        let mut balances = Balances::new();
        balances.insert(Asset::Jefe, Self::formatted(Asset::Jefe, jefe, self.jefe.decimals));
        balances.insert(Asset::Ftm, Self::formatted(Asset::Ftm, ftm, NATIVE_DECIMALS));
        balances.insert(Asset::Eth, Self::formatted(Asset::Eth, eth, NATIVE_DECIMALS));
        balances.insert(
            Asset::Usdc,
            Self::formatted(Asset::Usdc, usdc, self.usdc_destination.decimals),
        );
        balances
    }

    fn formatted(asset: Asset, result: Result<U256, ChainError>, decimals: u8) -> String {
        match result {
            Ok(amount) => format_token_amount(amount, decimals),
            Err(e) => {
                warn!("Failed to load {} balance: {}", asset, e);
                "0".to_string()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Chain reader answering from fixed values
    pub(crate) struct FixedReader {
        pub native: Result<U256, ChainError>,
        pub token: Result<U256, ChainError>,
    }

    #[async_trait]
    impl ChainReader for FixedReader {
        async fn native_balance(&self, _owner: Address) -> Result<U256, ChainError> {
            self.native.clone()
        }

        async fn token_balance(&self, _token: Address, _owner: Address) -> Result<U256, ChainError> {
            self.token.clone()
        }

        async fn token_decimals(&self, _token: Address) -> Result<u8, ChainError> {
            Ok(18)
        }

        async fn gas_price(&self) -> Result<U256, ChainError> {
            Ok(U256::from(1_000_000_000u64))
        }
    }

    pub(crate) fn loader(source: FixedReader, destination: FixedReader) -> BalanceLoader {
        BalanceLoader::new(
            Arc::new(source),
            Arc::new(destination),
            TokenInfo::new("JEFE", Address::repeat_byte(1), 18, 250),
            TokenInfo::new("USDC", Address::repeat_byte(2), 6, 1),
        )
    }

    #[tokio::test]
    async fn test_balances_use_token_decimals() {
        let loader = loader(
            FixedReader {
                native: Ok(U256::exp10(18) * 3),
                token: Ok(U256::exp10(17) * 15),
            },
            FixedReader {
                native: Ok(U256::exp10(16) * 5),
                token: Ok(U256::from(2_500_000u64)),
            },
        );

        let balances = loader.load(Address::repeat_byte(9)).await;
        assert_eq!(balances[&Asset::Jefe], "1.5");
        assert_eq!(balances[&Asset::Ftm], "3");
        assert_eq!(balances[&Asset::Eth], "0.05");
        assert_eq!(balances[&Asset::Usdc], "2.5");
    }

    #[tokio::test]
    async fn test_failed_reads_degrade_to_zero() {
        let loader = loader(
            FixedReader {
                native: Ok(U256::exp10(18)),
                token: Err(ChainError::Call("execution reverted".to_string())),
            },
            FixedReader {
                native: Err(ChainError::Rpc("connection refused".to_string())),
                token: Err(ChainError::Rpc("connection refused".to_string())),
            },
        );

        let balances = loader.load(Address::repeat_byte(9)).await;
        assert_eq!(balances[&Asset::Jefe], "0");
        assert_eq!(balances[&Asset::Ftm], "1");
        assert_eq!(balances[&Asset::Eth], "0");
        assert_eq!(balances[&Asset::Usdc], "0");
    }
}
