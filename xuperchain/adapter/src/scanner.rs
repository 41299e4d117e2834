//! Fork-aware block scanning: height advance, bounded-concurrency
//! extraction, observer notification, and rescan-on-failure.
//!
//! The height-advance/notify shape is grounded on
//! `bitcoin/watcher/src/watcher.rs`'s `watch_cycle`; the bounded
//! producer/aggregator worker pool has no equivalent in that
//! single-task-per-poll teacher, so its `tokio::sync::{mpsc, Semaphore}`
//! shape follows the wider pack's async fan-out workers instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use num_bigint::BigUint;
use serde::Deserialize;
use tokio::sync::{mpsc, Semaphore};

use xuperchain_primitives::amount::{format_amount, from_amount_bytes};
use xuperchain_primitives::model::{
    Block, BlockHeader, ExtractData, ExtractResult, ExtractTxInput, ExtractTxOutput,
    ScanTargetParam, SmartContractEvent, SmartContractReceipt, SummaryTransaction, Transaction,
    UnscanRecord, EVENT_KEY,
};
use xuperchain_primitives::{AdapterError, ChainConfig};
use xuperchain_rpc::RpcClient;

use crate::host::{BlockObserver, ScanHeadStore, ScanTarget, UnscanRecordStore};

const MAX_EXTRACTING_SIZE: usize = 10;
const RESCAN_LAST_BLOCK_COUNT: u64 = 3;
const NATIVE_DECIMALS: u32 = 8;

pub struct BlockScanner {
    rpc: Arc<RpcClient>,
    config: ChainConfig,
    head_store: Arc<dyn ScanHeadStore>,
    unscan_store: Arc<dyn UnscanRecordStore>,
    target: Arc<dyn ScanTarget>,
    observers: Vec<Arc<dyn BlockObserver>>,
    running: AtomicBool,
}

impl BlockScanner {
    pub fn new(
        rpc: Arc<RpcClient>,
        config: ChainConfig,
        head_store: Arc<dyn ScanHeadStore>,
        unscan_store: Arc<dyn UnscanRecordStore>,
        target: Arc<dyn ScanTarget>,
        observers: Vec<Arc<dyn BlockObserver>>,
    ) -> Self {
        Self {
            rpc,
            config,
            head_store,
            unscan_store,
            target,
            observers,
            running: AtomicBool::new(true),
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Convenience loop matching `BitcoinWatcher::start`'s shape; the host
    /// may call [`Self::run_once`] on its own interval instead.
    pub async fn run_forever(&self, interval: std::time::Duration) {
        self.running.store(true, Ordering::SeqCst);
        while self.running.load(Ordering::SeqCst) {
            if let Err(e) = self.run_once().await {
                log::error!("scan cycle failed: {e}");
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// §4.6.1 — advances the local head to the node's current height,
    /// then replays recent blocks and retries previously failed ones.
    pub async fn run_once(&self) -> Result<(), AdapterError> {
        loop {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            let head = self
                .head_store
                .get_head()
                .await?
                .unwrap_or(BlockHeader { height: 0, hash: String::new() });
            let status = self.rpc.get_chain_status().await?;
            if head.height >= status.height {
                break;
            }

            let h = head.height + 1;
            let block = match self.rpc.get_block_by_height(h).await {
                Ok(block) => block,
                Err(e) => {
                    log::warn!("failed to fetch block {h}: {e}");
                    self.unscan_store
                        .add(UnscanRecord {
                            height: h,
                            txid: None,
                            reason: e.to_string(),
                            symbol: self.config.symbol.clone(),
                        })
                        .await?;
                    continue;
                }
            };

            if h > 1 && block.prev_block_id != head.hash {
                self.recover_fork(h, &head).await?;
                continue;
            }

            let clean = self.extract_block(&block).await?;
            if !clean {
                log::warn!("block {h} had failed extraction notifications");
            }

            let new_head = BlockHeader {
                height: h,
                hash: block.block_id.clone(),
            };
            self.head_store.store_block(&block).await?;
            self.head_store.set_head(new_head.clone()).await?;
            self.notify_all(&new_head, false).await;
            log::info!("scan head advanced to {h}");
        }

        self.replay_recent().await?;
        self.rescan_failed().await?;
        Ok(())
    }

    /// §4.6.2 — rewinds by exactly two heights and notifies the old
    /// local block with `fork=true` so observers can roll back.
    async fn recover_fork(&self, h: u64, local_head: &BlockHeader) -> Result<(), AdapterError> {
        log::warn!("fork detected at height {h}: local head was {local_head:?}");
        self.unscan_store.remove(h.saturating_sub(1), None).await?;

        let rewind_to = h.saturating_sub(2).max(1);
        let rewound_block = match self.head_store.get_local_block(rewind_to).await? {
            Some(block) => block,
            None => self.rpc.get_block_by_height(rewind_to).await?,
        };
        self.head_store
            .set_head(BlockHeader {
                height: rewind_to,
                hash: rewound_block.block_id,
            })
            .await?;

        self.notify_all(
            &BlockHeader {
                height: h - 1,
                hash: local_head.hash.clone(),
            },
            true,
        )
        .await;
        Ok(())
    }

    /// §4.6.3 — bounded-concurrency extraction pipeline: a semaphore-gated
    /// producer per transaction, an aggregator forwarding results in
    /// arrival order, and inline observer notification.
    async fn extract_block(&self, block: &Block) -> Result<bool, AdapterError> {
        let total = block.transactions.len();
        if total == 0 {
            return Ok(true);
        }

        let semaphore = Arc::new(Semaphore::new(MAX_EXTRACTING_SIZE));
        let (producer_tx, mut producer_rx) = mpsc::channel::<ExtractResult>(total);

        for tx in block.transactions.clone() {
            let semaphore = semaphore.clone();
            let producer_tx = producer_tx.clone();
            let target = self.target.clone();
            let block_height = block.height;
            let block_hash = block.block_id.clone();
            let symbol = self.config.symbol.clone();
            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let result = extract_transaction(&tx, block_height, &block_hash, &symbol, target.as_ref());
                let _ = producer_tx.send(result).await;
            });
        }
        drop(producer_tx);

        let (worker_tx, mut worker_rx) = mpsc::channel::<ExtractResult>(total);
        let aggregator = tokio::spawn(async move {
            let mut forwarded = 0;
            while let Some(result) = producer_rx.recv().await {
                if worker_tx.send(result).await.is_err() {
                    break;
                }
                forwarded += 1;
                if forwarded >= total {
                    break;
                }
            }
        });

        let mut failures = 0usize;
        while let Some(result) = worker_rx.recv().await {
            if !self.notify_extraction(&result).await {
                failures += 1;
                self.unscan_store
                    .add(UnscanRecord {
                        height: result.block_height,
                        txid: Some(result.txid.clone()),
                        reason: "observer notification failed".to_string(),
                        symbol: self.config.symbol.clone(),
                    })
                    .await?;
            }
        }
        let _ = aggregator.await;
        Ok(failures == 0)
    }

    async fn notify_extraction(&self, result: &ExtractResult) -> bool {
        let mut ok = true;
        for (source_key, summary) in &result.summary {
            let data = ExtractData {
                tx_inputs: result.tx_inputs.get(source_key).cloned().unwrap_or_default(),
                tx_outputs: result.tx_outputs.get(source_key).cloned().unwrap_or_default(),
                summary: summary.clone(),
            };
            for observer in &self.observers {
                if let Err(e) = observer.on_block_extract_data(source_key, &data).await {
                    log::error!("observer failed on tx {}: {e}", result.txid);
                    ok = false;
                }
            }
        }
        for (source_key, receipt) in &result.contract_data {
            for observer in &self.observers {
                if let Err(e) = observer.on_block_extract_contract_data(source_key, receipt).await
                {
                    log::error!("observer failed on contract tx {}: {e}", result.txid);
                    ok = false;
                }
            }
        }
        ok
    }

    async fn notify_all(&self, header: &BlockHeader, fork: bool) {
        for observer in &self.observers {
            if let Err(e) = observer.on_block_notify(header, fork).await {
                log::error!("observer failed on block notify {header:?}: {e}");
            }
        }
    }

    /// Best-effort replay of the last few confirmed heights, run once
    /// per scan cycle after the main advance loop.
    async fn replay_recent(&self) -> Result<(), AdapterError> {
        let Some(head) = self.head_store.get_head().await? else {
            return Ok(());
        };
        let start = head.height.saturating_sub(RESCAN_LAST_BLOCK_COUNT).max(1);
        for h in start..=head.height {
            match self.rpc.get_block_by_height(h).await {
                Ok(block) => {
                    let _ = self.extract_block(&block).await;
                }
                Err(e) => log::warn!("replay of height {h} failed: {e}"),
            }
        }
        Ok(())
    }

    /// §4.6.5 — groups durable failure records by height and retries each.
    async fn rescan_failed(&self) -> Result<(), AdapterError> {
        let records = self.unscan_store.list().await?;
        let mut by_height: HashMap<u64, Vec<UnscanRecord>> = HashMap::new();
        for record in records {
            if record.height != 0 {
                by_height.entry(record.height).or_default().push(record);
            }
        }

        for (height, records) in by_height {
            match self.rpc.get_block_by_height(height).await {
                Ok(block) => match self.extract_block(&block).await {
                    Ok(true) => {
                        for record in records {
                            self.unscan_store
                                .remove(record.height, record.txid.as_deref())
                                .await?;
                        }
                    }
                    Ok(false) => log::warn!("rescan of height {height} still has failures"),
                    Err(e) => log::warn!("rescan of height {height} failed: {e}"),
                },
                Err(e) => log::warn!("rescan fetch of height {height} failed: {e}"),
            }
        }
        Ok(())
    }

    /// §4.6.6 — single-tx path used by the contract builder's await loop.
    pub async fn extract_transaction_and_receipt(
        &self,
        txid: &str,
    ) -> Result<Option<ExtractResult>, AdapterError> {
        let tx = match self.rpc.query_tx(txid).await {
            Ok(tx) => tx,
            Err(AdapterError::TxNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let status = self.rpc.get_chain_status().await?;
        let result = extract_transaction(&tx, status.height, "", &self.config.symbol, self.target.as_ref());
        Ok(Some(result))
    }

    /// §4.6.6 — rewrites the head to `height - 1` using the node's
    /// recorded hash at that height.
    pub async fn set_rescan_block_height(&self, height: u64) -> Result<(), AdapterError> {
        let target_height = height.saturating_sub(1).max(1);
        let block = self.rpc.get_block_by_height(target_height).await?;
        self.head_store
            .set_head(BlockHeader {
                height: target_height,
                hash: block.block_id,
            })
            .await
    }

    /// §4.6.6 — queries balances and scales them to decimal strings.
    pub async fn get_balance_by_address(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, String>, AdapterError> {
        let mut out = HashMap::with_capacity(addresses.len());
        for addr in addresses {
            let raw = self.rpc.get_balance(addr).await?;
            let value = BigUint::parse_bytes(raw.as_bytes(), 10).unwrap_or_default();
            out.insert(addr.clone(), format_amount(&value, NATIVE_DECIMALS));
        }
        Ok(out)
    }
}

#[derive(Debug, Deserialize, serde::Serialize)]
struct RawEvent {
    event: String,
    value: String,
}

fn sid_hash(txid: &str, symbol: &str, index: u32) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(txid.as_bytes());
    hasher.update(symbol.as_bytes());
    hasher.update(index.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// §4.6.4 — normalizes one transaction's wallet-relevant inputs,
/// outputs, and contract events. Pure and side-effect free so it can run
/// freely across the bounded worker pool.
fn extract_transaction(
    tx: &Transaction,
    block_height: u64,
    block_hash: &str,
    symbol: &str,
    target: &dyn ScanTarget,
) -> ExtractResult {
    let mut result = ExtractResult {
        txid: tx.txid.clone(),
        block_height,
        success: true,
        ..Default::default()
    };
    let mut totals: HashMap<String, (BigUint, BigUint)> = HashMap::new();

    for (index, input) in tx.tx_inputs.iter().enumerate() {
        let resolved = target.resolve(ScanTargetParam {
            address: input.from_addr.clone(),
            is_contract: false,
        });
        if !resolved.exist {
            continue;
        }
        let amount = from_amount_bytes(&input.amount);
        result
            .tx_inputs
            .entry(resolved.source_key.clone())
            .or_default()
            .push(ExtractTxInput {
                source_tx_id: input.ref_txid.clone(),
                source_index: input.ref_offset,
                tx_id: tx.txid.clone(),
                address: input.from_addr.clone(),
                amount: input.amount.clone(),
                coin: symbol.to_string(),
                index: index as u32,
                sid: sid_hash(&tx.txid, symbol, index as u32),
                block_height,
                block_hash: block_hash.to_string(),
            });
        totals.entry(resolved.source_key).or_default().0 += amount;
    }

    for (index, output) in tx.tx_outputs.iter().enumerate() {
        let resolved = target.resolve(ScanTargetParam {
            address: output.to_addr.clone(),
            is_contract: false,
        });
        if !resolved.exist {
            continue;
        }
        let amount = from_amount_bytes(&output.amount);
        result
            .tx_outputs
            .entry(resolved.source_key.clone())
            .or_default()
            .push(ExtractTxOutput {
                tx_id: tx.txid.clone(),
                address: output.to_addr.clone(),
                amount: output.amount.clone(),
                coin: symbol.to_string(),
                index: index as u32,
                sid: sid_hash(&tx.txid, symbol, index as u32),
                block_height,
                block_hash: block_hash.to_string(),
            });
        totals.entry(resolved.source_key).or_default().1 += amount;
    }

    for (source_key, (spent, received)) in &totals {
        let fees = if spent > received {
            spent - received
        } else {
            BigUint::default()
        };
        result.summary.insert(
            source_key.clone(),
            SummaryTransaction {
                from: tx.initiator.clone(),
                to: tx.tx_outputs.first().map(|o| o.to_addr.clone()).unwrap_or_default(),
                fees: format_amount(&fees, NATIVE_DECIMALS),
                coin: symbol.to_string(),
                block_hash: block_hash.to_string(),
                block_height,
                tx_id: tx.txid.clone(),
                decimal: NATIVE_DECIMALS,
                confirm_time: tx.timestamp,
                status: "success".to_string(),
                wx_id: sid_hash(source_key, &tx.txid, 0),
            },
        );
    }

    for request in &tx.contract_requests {
        let contract_address = format!("{}:{}", request.module_name, request.contract_name);
        let resolved = target.resolve(ScanTargetParam {
            address: contract_address.clone(),
            is_contract: true,
        });
        if !resolved.exist {
            continue;
        }
        let has_abi = resolved
            .target_info
            .as_ref()
            .map(|c| !c.abi_json.is_empty())
            .unwrap_or(false);
        if !has_abi {
            continue;
        }

        let mut events = Vec::new();
        for entry in tx.tx_outputs_ext.iter().chain(tx.tx_inputs_ext.iter()) {
            if entry.key != EVENT_KEY.as_bytes() || entry.bucket != contract_address {
                continue;
            }
            if let Ok(items) = serde_json::from_slice::<Vec<RawEvent>>(&entry.value) {
                events.extend(items.into_iter().map(|item| SmartContractEvent {
                    contract: contract_address.clone(),
                    event: item.event,
                    value: item.value,
                }));
            }
        }

        result.contract_data.insert(
            resolved.source_key,
            SmartContractReceipt {
                coin: symbol.to_string(),
                tx_id: tx.txid.clone(),
                from: tx.initiator.clone(),
                to: request.contract_name.clone(),
                fees: "0".to_string(),
                value: "0".to_string(),
                events,
                block_hash: block_hash.to_string(),
                block_height,
                confirm_time: tx.timestamp,
                status: "1".to_string(),
            },
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use xuperchain_primitives::amount::to_amount_bytes;
    use xuperchain_primitives::model::{
        ContractRequest, ScanTargetResult, SmartContract, TxInputRef, TxOutputEntry, TxStateEntry,
    };

    /// Matches `addrA`/a single contract address, everything else is
    /// foreign to the wallet.
    struct Wallet {
        contract_abi: String,
    }

    impl ScanTarget for Wallet {
        fn resolve(&self, param: ScanTargetParam) -> ScanTargetResult {
            if param.is_contract {
                if param.address == "xkernel:mycontract" {
                    ScanTargetResult {
                        source_key: "acct1".to_string(),
                        exist: true,
                        target_info: Some(SmartContract {
                            symbol: "XUPER".to_string(),
                            address: param.address,
                            contract_id: "c1".to_string(),
                            abi_json: self.contract_abi.clone(),
                            decimals: 8,
                        }),
                    }
                } else {
                    ScanTargetResult {
                        source_key: String::new(),
                        exist: false,
                        target_info: None,
                    }
                }
            } else if param.address == "addrA" {
                ScanTargetResult {
                    source_key: "acct1".to_string(),
                    exist: true,
                    target_info: None,
                }
            } else {
                ScanTargetResult {
                    source_key: String::new(),
                    exist: false,
                    target_info: None,
                }
            }
        }
    }

    fn base_tx() -> Transaction {
        Transaction {
            version: 1,
            coinbase: false,
            desc: String::new(),
            nonce: "nonce".to_string(),
            timestamp: 1_700_000_000,
            initiator: "addrA".to_string(),
            tx_inputs: Vec::new(),
            tx_outputs: Vec::new(),
            contract_requests: Vec::new(),
            tx_inputs_ext: Vec::new(),
            tx_outputs_ext: Vec::new(),
            auth_require: vec!["addrA".to_string()],
            initiator_signs: Vec::new(),
            auth_require_signs: Vec::new(),
            txid: "tx1".to_string(),
        }
    }

    #[test]
    fn ignores_inputs_and_outputs_for_addresses_the_wallet_does_not_own() {
        let mut tx = base_tx();
        tx.tx_inputs.push(TxInputRef {
            ref_txid: "prev".to_string(),
            ref_offset: 0,
            from_addr: "someone-else".to_string(),
            amount: to_amount_bytes(&BigUint::from(100_000_000u64)),
        });
        tx.tx_outputs.push(TxOutputEntry {
            to_addr: "another-stranger".to_string(),
            amount: to_amount_bytes(&BigUint::from(100_000_000u64)),
        });

        let wallet = Wallet { contract_abi: String::new() };
        let result = extract_transaction(&tx, 42, "blockhash", "XUPER", &wallet);

        assert!(result.success);
        assert!(result.tx_inputs.is_empty());
        assert!(result.tx_outputs.is_empty());
        assert!(result.summary.is_empty());
    }

    #[test]
    fn records_matched_input_and_output_and_computes_fee_as_spent_minus_received() {
        let mut tx = base_tx();
        tx.tx_inputs.push(TxInputRef {
            ref_txid: "prev".to_string(),
            ref_offset: 0,
            from_addr: "addrA".to_string(),
            amount: to_amount_bytes(&BigUint::from(1_200_000_000u64)),
        });
        tx.tx_outputs.push(TxOutputEntry {
            to_addr: "addrA".to_string(),
            amount: to_amount_bytes(&BigUint::from(700_000_000u64)),
        });

        let wallet = Wallet { contract_abi: String::new() };
        let result = extract_transaction(&tx, 42, "blockhash", "XUPER", &wallet);

        assert!(result.success);
        let inputs = result.tx_inputs.get("acct1").unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].block_height, 42);
        assert_eq!(inputs[0].block_hash, "blockhash");

        let outputs = result.tx_outputs.get("acct1").unwrap();
        assert_eq!(outputs.len(), 1);

        let summary = result.summary.get("acct1").unwrap();
        assert_eq!(summary.fees, "5.00000000");
        assert_eq!(summary.to, "addrA");
        assert_eq!(summary.status, "success");
    }

    #[test]
    fn skips_contracts_with_no_abi() {
        let mut tx = base_tx();
        tx.contract_requests.push(ContractRequest {
            module_name: "xkernel".to_string(),
            contract_name: "mycontract".to_string(),
            method_name: "invoke".to_string(),
            args: HashMap::new(),
        });

        let wallet = Wallet { contract_abi: String::new() };
        let result = extract_transaction(&tx, 1, "blockhash", "XUPER", &wallet);
        assert!(result.contract_data.is_empty());
    }

    #[test]
    fn extracts_contract_events_matching_the_event_key_and_bucket() {
        let mut tx = base_tx();
        tx.contract_requests.push(ContractRequest {
            module_name: "xkernel".to_string(),
            contract_name: "mycontract".to_string(),
            method_name: "invoke".to_string(),
            args: HashMap::new(),
        });
        let events = serde_json::to_vec(&[RawEvent {
            event: "Transfer".to_string(),
            value: "42".to_string(),
        }])
        .unwrap();
        tx.tx_outputs_ext.push(TxStateEntry {
            bucket: "xkernel:mycontract".to_string(),
            key: EVENT_KEY.as_bytes().to_vec(),
            value: events,
        });
        tx.tx_outputs_ext.push(TxStateEntry {
            bucket: "xkernel:mycontract".to_string(),
            key: b"unrelated".to_vec(),
            value: b"ignored".to_vec(),
        });

        let wallet = Wallet {
            contract_abi: "[{\"name\":\"invoke\"}]".to_string(),
        };
        let result = extract_transaction(&tx, 1, "blockhash", "XUPER", &wallet);

        let receipt = result.contract_data.get("acct1").unwrap();
        assert_eq!(receipt.events.len(), 1);
        assert_eq!(receipt.events[0].event, "Transfer");
        assert_eq!(receipt.events[0].value, "42");
        assert_eq!(receipt.events[0].contract, "xkernel:mycontract");
    }

    #[test]
    fn sid_hash_is_deterministic_and_position_sensitive() {
        let a = sid_hash("tx1", "XUPER", 0);
        let b = sid_hash("tx1", "XUPER", 0);
        let c = sid_hash("tx1", "XUPER", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingUnscanStore {
        records: Mutex<Vec<UnscanRecord>>,
    }

    #[async_trait]
    impl UnscanRecordStore for RecordingUnscanStore {
        async fn add(&self, record: UnscanRecord) -> Result<(), AdapterError> {
            self.records.lock().await.push(record);
            Ok(())
        }
        async fn list(&self) -> Result<Vec<UnscanRecord>, AdapterError> {
            Ok(self.records.lock().await.clone())
        }
        async fn remove(&self, _height: u64, _txid: Option<&str>) -> Result<(), AdapterError> {
            Ok(())
        }
    }

    struct UnusedHeadStore;

    #[async_trait]
    impl ScanHeadStore for UnusedHeadStore {
        async fn get_head(&self) -> Result<Option<BlockHeader>, AdapterError> {
            Ok(None)
        }
        async fn set_head(&self, _header: BlockHeader) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn get_local_block(&self, _height: u64) -> Result<Option<Block>, AdapterError> {
            Ok(None)
        }
        async fn store_block(&self, _block: &Block) -> Result<(), AdapterError> {
            Ok(())
        }
    }

    /// Fails notification for any summary/receipt keyed by `fail_source_key`,
    /// otherwise records everything it sees.
    #[derive(Default)]
    struct RecordingObserver {
        fail_source_key: Option<String>,
        seen_summaries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlockObserver for RecordingObserver {
        async fn on_block_notify(&self, _header: &BlockHeader, _fork: bool) -> Result<(), AdapterError> {
            Ok(())
        }

        async fn on_block_extract_data(
            &self,
            source_key: &str,
            data: &ExtractData,
        ) -> Result<(), AdapterError> {
            if self.fail_source_key.as_deref() == Some(source_key) {
                return Err(AdapterError::ExtractFailure("observer rejected".to_string()));
            }
            assert!(!data.tx_inputs.is_empty(), "expected a matched input for {source_key}");
            self.seen_summaries.lock().await.push(data.summary.tx_id.clone());
            Ok(())
        }

        async fn on_block_extract_contract_data(
            &self,
            _source_key: &str,
            _receipt: &SmartContractReceipt,
        ) -> Result<(), AdapterError> {
            Ok(())
        }
    }

    fn test_scanner(observers: Vec<Arc<dyn BlockObserver>>) -> (BlockScanner, Arc<RecordingUnscanStore>) {
        let rpc = Arc::new(RpcClient::new("http://127.0.0.1:1", "testchain").unwrap());
        let unscan = Arc::new(RecordingUnscanStore::default());
        let scanner = BlockScanner::new(
            rpc,
            ChainConfig::default(),
            Arc::new(UnusedHeadStore),
            unscan.clone(),
            Arc::new(Wallet { contract_abi: String::new() }),
            observers,
        );
        (scanner, unscan)
    }

    fn matching_tx(txid: &str) -> Transaction {
        let mut tx = base_tx();
        tx.txid = txid.to_string();
        tx.tx_inputs.push(TxInputRef {
            ref_txid: "prev".to_string(),
            ref_offset: 0,
            from_addr: "addrA".to_string(),
            amount: to_amount_bytes(&BigUint::from(100_000_000u64)),
        });
        tx
    }

    /// §4.6.3 — every matched transaction in a block is forwarded to
    /// every observer, and a fully successful block reports `Ok(true)`
    /// with no unscan records written.
    #[tokio::test]
    async fn extract_block_notifies_every_matched_transaction_and_succeeds() {
        let observer = Arc::new(RecordingObserver::default());
        let (scanner, unscan) = test_scanner(vec![observer.clone()]);

        let block = Block {
            height: 10,
            block_id: "block10".to_string(),
            prev_block_id: "block9".to_string(),
            merkle_root: String::new(),
            timestamp: 0,
            transactions: vec![matching_tx("tx1"), matching_tx("tx2")],
        };

        let clean = scanner.extract_block(&block).await.unwrap();
        assert!(clean);

        let mut seen = observer.seen_summaries.lock().await.clone();
        seen.sort();
        assert_eq!(seen, vec!["tx1".to_string(), "tx2".to_string()]);
        assert!(unscan.records.lock().await.is_empty());
    }

    /// A failing observer notification is recorded as an unscan record
    /// and the block is reported as unclean, but every other
    /// transaction's notification still goes through.
    #[tokio::test]
    async fn extract_block_records_an_unscan_entry_when_an_observer_fails() {
        let observer = Arc::new(RecordingObserver {
            fail_source_key: Some("acct1".to_string()),
            ..Default::default()
        });
        let (scanner, unscan) = test_scanner(vec![observer]);

        let block = Block {
            height: 10,
            block_id: "block10".to_string(),
            prev_block_id: "block9".to_string(),
            merkle_root: String::new(),
            timestamp: 0,
            transactions: vec![matching_tx("tx1")],
        };

        let clean = scanner.extract_block(&block).await.unwrap();
        assert!(!clean);

        let records = unscan.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].txid.as_deref(), Some("tx1"));
        assert_eq!(records[0].height, 10);
    }
}
