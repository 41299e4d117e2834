use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A confirmed block as returned by the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub block_id: String,
    pub prev_block_id: String,
    pub merkle_root: String,
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
}

/// A single UTXO reference consumed by a transaction input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInputRef {
    pub ref_txid: String,
    pub ref_offset: u32,
    pub from_addr: String,
    pub amount: Vec<u8>,
}

/// A single transaction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutputEntry {
    pub to_addr: String,
    pub amount: Vec<u8>,
}

/// A contract invocation embedded in a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRequest {
    pub module_name: String,
    pub contract_name: String,
    pub method_name: String,
    pub args: HashMap<String, Vec<u8>>,
}

/// A read/write-set entry produced by contract pre-execution, also used
/// to carry emitted events (bucket/key/value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxStateEntry {
    pub bucket: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// The event bucket key every contract event is written under.
pub const EVENT_KEY: &str = "com.github.blocktree.xcd.event";
pub const MODULE_XKERNEL: &str = "xkernel";
pub const METHOD_DEPLOY: &str = "Deploy";
pub const FEE_SENTINEL_ADDRESS: &str = "$";

/// A single signer's unsigned-digest/signed-bytes pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySignature {
    pub ecc_type: crate::config::CurveType,
    pub address: String,
    /// hex-encoded digest to sign.
    pub message: String,
    /// hex-encoded `r||s` signature, populated after signing.
    pub signature: Option<String>,
}

/// A verified signature ready for inclusion in `initiator_signs` /
/// `auth_require_signs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureInfo {
    /// JSON of `{Curvname, X, Y}`.
    pub public_key: String,
    /// DER-encoded `(r, s)`.
    pub sign: Vec<u8>,
}

/// Canonical transaction body, serialized without signatures/txid to
/// produce the digest that every signer signs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub coinbase: bool,
    pub desc: String,
    pub nonce: String,
    pub timestamp: i64,
    pub initiator: String,
    pub tx_inputs: Vec<TxInputRef>,
    pub tx_outputs: Vec<TxOutputEntry>,
    pub contract_requests: Vec<ContractRequest>,
    pub tx_inputs_ext: Vec<TxStateEntry>,
    pub tx_outputs_ext: Vec<TxStateEntry>,
    pub auth_require: Vec<String>,
    #[serde(default)]
    pub initiator_signs: Vec<SignatureInfo>,
    #[serde(default)]
    pub auth_require_signs: Vec<SignatureInfo>,
    #[serde(default)]
    pub txid: String,
}

/// Unspent output tracked per address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utxo {
    pub ref_txid: String,
    pub ref_offset: u32,
    pub to_addr: String,
    pub amount: Vec<u8>,
}

/// ABI-described smart contract bound to an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartContract {
    pub symbol: String,
    /// `"module:name"`, or a bare module name for xkernel-class contracts.
    pub address: String,
    pub contract_id: String,
    pub abi_json: String,
    pub decimals: u32,
}

impl SmartContract {
    /// Splits `address` into `(module_name, contract_name)`. A single
    /// segment means an xkernel-class contract with no contract name.
    pub fn module_and_contract(&self) -> (String, String) {
        match self.address.split_once(':') {
            Some((module, contract)) => (module.to_string(), contract.to_string()),
            None => (MODULE_XKERNEL.to_string(), self.address.clone()),
        }
    }
}

/// Host predicate input: an address or contract address being checked
/// for relevance during extraction.
#[derive(Debug, Clone)]
pub struct ScanTargetParam {
    pub address: String,
    pub is_contract: bool,
}

/// Host predicate output: whether the address matters to the wallet and,
/// if so, its opaque grouping key.
#[derive(Debug, Clone)]
pub struct ScanTargetResult {
    pub source_key: String,
    pub exist: bool,
    pub target_info: Option<SmartContract>,
}

/// Normalized input observed during extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractTxInput {
    pub source_tx_id: String,
    pub source_index: u32,
    pub tx_id: String,
    pub address: String,
    pub amount: Vec<u8>,
    pub coin: String,
    pub index: u32,
    pub sid: String,
    pub block_height: u64,
    pub block_hash: String,
}

/// Normalized output observed during extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractTxOutput {
    pub tx_id: String,
    pub address: String,
    pub amount: Vec<u8>,
    pub coin: String,
    pub index: u32,
    pub sid: String,
    pub block_height: u64,
    pub block_hash: String,
}

/// Wallet-facing transaction summary synthesized from matched inputs and
/// outputs of one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryTransaction {
    pub from: String,
    pub to: String,
    pub fees: String,
    pub coin: String,
    pub block_hash: String,
    pub block_height: u64,
    pub tx_id: String,
    pub decimal: u32,
    pub confirm_time: i64,
    pub status: String,
    pub wx_id: String,
}

/// The full per-`source_key` payload handed to observers: matched
/// inputs, matched outputs, and the synthesized fee summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractData {
    pub tx_inputs: Vec<ExtractTxInput>,
    pub tx_outputs: Vec<ExtractTxOutput>,
    pub summary: SummaryTransaction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartContractEvent {
    pub contract: String,
    pub event: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartContractReceipt {
    pub coin: String,
    pub tx_id: String,
    pub from: String,
    pub to: String,
    pub fees: String,
    pub value: String,
    pub events: Vec<SmartContractEvent>,
    pub block_hash: String,
    pub block_height: u64,
    pub confirm_time: i64,
    pub status: String,
}

/// Per-transaction extraction result, keyed by the host's opaque
/// `source_key`.
#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    pub txid: String,
    pub block_height: u64,
    pub success: bool,
    pub tx_inputs: HashMap<String, Vec<ExtractTxInput>>,
    pub tx_outputs: HashMap<String, Vec<ExtractTxOutput>>,
    pub summary: HashMap<String, SummaryTransaction>,
    pub contract_data: HashMap<String, SmartContractReceipt>,
}

/// Last-scanned head, persisted by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u64,
    pub hash: String,
}

/// Durable marker of a height (or specific tx) the scanner must revisit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnscanRecord {
    pub height: u64,
    pub txid: Option<String>,
    pub reason: String,
    pub symbol: String,
}

/// Encoding of the raw transaction bytes carried in [`RawTransaction::raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawType {
    Hex,
    Json,
    Base64,
}

/// Host-facing envelope for a transaction moving through
/// `Created -> Built -> Signed -> Verified -> Submitted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    pub account: String,
    pub coin: CoinInfo,
    pub to: HashMap<String, String>,
    pub fees: String,
    pub raw: String,
    pub raw_type: RawType,
    /// account id -> pending signatures for that signer.
    pub signatures: HashMap<String, Vec<KeySignature>>,
    pub tx_from: Vec<String>,
    pub tx_to: Vec<String>,
    pub tx_id: String,
    pub tx_amount: String,
    pub is_built: bool,
    pub is_completed: bool,
    pub is_submit: bool,
    pub await_result: bool,
    pub await_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinInfo {
    pub symbol: String,
    pub is_contract: bool,
    pub contract: Option<SmartContract>,
    pub abi_json: Option<String>,
}

impl RawTransaction {
    pub const DEFAULT_AWAIT_TIMEOUT_SECS: u64 = 90;
}
