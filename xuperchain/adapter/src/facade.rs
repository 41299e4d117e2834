//! Adapter facade (C7): binds C2-C6 behind one entry point and publishes
//! the chain-level constants and decoders the host framework asks for.
//!
//! Grounded on `examples/original_source/xuperchain/xuperchain.go`'s
//! `WalletManager` (`FullName`/`CurveType`/`Symbol`/`Decimal`/
//! `BalanceModelType` getters, decoder accessors) and `manager.go`'s
//! `NewWalletManager` constructor wiring.

use std::sync::Arc;

use xuperchain_primitives::address;
use xuperchain_primitives::config::CurveType;
use xuperchain_primitives::{AdapterError, ChainConfig};
use xuperchain_rpc::RpcClient;

use crate::builder::TransactionBuilder;
use crate::contract::ContractBuilder;
use crate::host::{AccountResolver, AddressProvider, BlockObserver, KeyProvider, ScanHeadStore, ScanTarget, UnscanRecordStore};
use crate::scanner::BlockScanner;

/// Balance model this adapter reports to the host; the chain has no
/// account-nonce model, only address-owned UTXOs.
pub const BALANCE_MODEL_ADDRESS: &str = "address";

/// Host-supplied construction options, matching the recognized
/// configuration keys in spec section 6/7: `serverAPI` and `chainName`.
pub struct AdapterOptions {
    pub server_api: String,
    pub chain_name: String,
    pub symbol: String,
    pub curve_type: CurveType,
    pub max_tx_inputs: usize,
}

impl AdapterOptions {
    pub fn new(server_api: impl Into<String>, chain_name: impl Into<String>) -> Self {
        Self {
            server_api: server_api.into(),
            chain_name: chain_name.into(),
            symbol: ChainConfig::DEFAULT_SYMBOL.to_string(),
            curve_type: CurveType::NistP256,
            max_tx_inputs: ChainConfig::DEFAULT_MAX_TX_INPUTS,
        }
    }
}

/// The single entry point the host framework holds: one RPC client shared
/// by the transaction builder, contract builder, and block scanner.
pub struct XuperchainAdapter {
    config: ChainConfig,
    rpc: Arc<RpcClient>,
    builder: TransactionBuilder,
    contract: ContractBuilder,
    scanner: BlockScanner,
}

impl XuperchainAdapter {
    /// Wires C1-C6 behind this facade. The host supplies its own
    /// implementations of the address/key/account/scan-target/store/
    /// observer traits declared in [`crate::host`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        options: AdapterOptions,
        addresses: Arc<dyn AddressProvider>,
        keys: Arc<dyn KeyProvider>,
        accounts: Arc<dyn AccountResolver>,
        target: Arc<dyn ScanTarget>,
        head_store: Arc<dyn ScanHeadStore>,
        unscan_store: Arc<dyn UnscanRecordStore>,
        observers: Vec<Arc<dyn BlockObserver>>,
    ) -> Result<Self, AdapterError> {
        let config = ChainConfig {
            symbol: options.symbol,
            server_api: options.server_api.clone(),
            chain_name: options.chain_name.clone(),
            curve_type: options.curve_type,
            max_tx_inputs: options.max_tx_inputs,
        };

        let rpc = Arc::new(RpcClient::new(&options.server_api, options.chain_name)?);

        let builder = TransactionBuilder::new(rpc.clone(), config.clone(), addresses.clone(), keys.clone());
        let contract = ContractBuilder::new(
            rpc.clone(),
            config.clone(),
            addresses,
            keys,
            accounts,
            target.clone(),
        );
        let scanner = BlockScanner::new(rpc.clone(), config.clone(), head_store, unscan_store, target, observers);

        Ok(Self {
            config,
            rpc,
            builder,
            contract,
            scanner,
        })
    }

    /// Mirrors `WalletManager::FullName`.
    pub fn full_name(&self) -> &'static str {
        "xuperchain"
    }

    /// Mirrors `WalletManager::Symbol`.
    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    /// Mirrors `WalletManager::Decimal`; the native coin always has 8
    /// display decimals.
    pub fn decimal(&self) -> u32 {
        ChainConfig::DEFAULT_DECIMALS
    }

    /// Mirrors `WalletManager::CurveType`.
    pub fn curve_type(&self) -> CurveType {
        self.config.curve_type
    }

    /// Mirrors `WalletManager::BalanceModelType`: this chain's balances
    /// are owned per-address, not per-account nonce.
    pub fn balance_model_type(&self) -> &'static str {
        BALANCE_MODEL_ADDRESS
    }

    pub fn address_encode(&self, input: &[u8]) -> Result<String, AdapterError> {
        address::encode(input, self.config.curve_type)
    }

    pub fn address_decode(&self, addr: &str) -> Result<[u8; 20], AdapterError> {
        address::decode(addr, self.config.curve_type)
    }

    pub fn address_verify(&self, addr: &str) -> bool {
        address::verify(addr, self.config.curve_type)
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn transaction_builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    pub fn contract_builder(&self) -> &ContractBuilder {
        &self.contract
    }

    pub fn block_scanner(&self) -> &BlockScanner {
        &self.scanner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_the_configured_constants() {
        let config = ChainConfig::default();
        assert_eq!(config.symbol, "XUPER");
        assert_eq!(ChainConfig::DEFAULT_DECIMALS, 8);
        assert_eq!(config.curve_type, CurveType::NistP256);
    }
}
