//! Interfaces the host wallet framework implements for this crate.
//!
//! Address/key storage, HD derivation, and persistence of scan state are
//! the host's job, not this crate's. Every method is `async` through
//! `async_trait`, the same trait-object collaborator shape used
//! elsewhere in this workspace for async host-provided dependencies.

use async_trait::async_trait;

use xuperchain_primitives::model::{Block, BlockHeader, ExtractData, ScanTargetParam, ScanTargetResult, SmartContractReceipt, UnscanRecord};
use xuperchain_primitives::AdapterError;

/// Enumerates addresses under an account and exposes the compressed
/// public key backing each one.
#[async_trait]
pub trait AddressProvider: Send + Sync {
    async fn addresses_of_account(
        &self,
        account_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<String>, AdapterError>;

    async fn first_address(&self, account_id: &str) -> Result<String, AdapterError>;

    /// 33-byte compressed public key behind `address`.
    async fn public_key_of(&self, address: &str) -> Result<Vec<u8>, AdapterError>;
}

/// Produces a raw `(r||s)` signature over an already-hashed digest. The
/// host derives the HD key at the address's path internally; this crate
/// never sees or persists a private key.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn sign_digest(
        &self,
        account_id: &str,
        address: &str,
        digest: &[u8],
    ) -> Result<[u8; 64], AdapterError>;
}

/// Resolves account-scoped identifiers (e.g. ACL signer names) to
/// addresses the host knows about.
#[async_trait]
pub trait AccountResolver: Send + Sync {
    async fn resolve_address(
        &self,
        account_name: &str,
        key_identifier: &str,
    ) -> Result<String, AdapterError>;
}

/// Persists the scanner's head and gives it back locally-stored blocks
/// during fork rewind.
#[async_trait]
pub trait ScanHeadStore: Send + Sync {
    async fn get_head(&self) -> Result<Option<BlockHeader>, AdapterError>;
    async fn set_head(&self, header: BlockHeader) -> Result<(), AdapterError>;
    async fn get_local_block(&self, height: u64) -> Result<Option<Block>, AdapterError>;
    async fn store_block(&self, block: &Block) -> Result<(), AdapterError>;
}

/// Durable record of heights (or specific txs) the scanner must revisit.
#[async_trait]
pub trait UnscanRecordStore: Send + Sync {
    async fn add(&self, record: UnscanRecord) -> Result<(), AdapterError>;
    async fn list(&self) -> Result<Vec<UnscanRecord>, AdapterError>;
    async fn remove(&self, height: u64, txid: Option<&str>) -> Result<(), AdapterError>;
}

/// The host's pure predicate: does this address/contract-address matter
/// to the wallet, and under what opaque grouping key? Free of side
/// effects, so it is called freely from concurrent extractor tasks.
pub trait ScanTarget: Send + Sync {
    fn resolve(&self, param: ScanTargetParam) -> ScanTargetResult;
}

/// Registered once at startup; notified as blocks are extracted.
#[async_trait]
pub trait BlockObserver: Send + Sync {
    async fn on_block_notify(&self, header: &BlockHeader, fork: bool) -> Result<(), AdapterError>;

    async fn on_block_extract_data(
        &self,
        source_key: &str,
        data: &ExtractData,
    ) -> Result<(), AdapterError>;

    async fn on_block_extract_contract_data(
        &self,
        source_key: &str,
        receipt: &SmartContractReceipt,
    ) -> Result<(), AdapterError>;
}
