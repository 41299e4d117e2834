//! Native-coin transaction lifecycle: create, summarize, sign, verify,
//! submit. Grounded on `bitcoin/executor/src/wallet.rs`'s UTXO-gathering
//! and sign/broadcast shape, generalized from a single hot wallet to
//! multi-address, multi-signer accounts as the node's UTXO model and
//! ACL-style auth requires.

use std::collections::HashMap;
use std::sync::Arc;

use num_bigint::BigUint;
use rand::RngCore;

use xuperchain_primitives::amount::{format_amount, from_amount_bytes, parse_decimal, to_amount_bytes};
use xuperchain_primitives::model::{
    CoinInfo, KeySignature, RawTransaction, RawType, Transaction, TxInputRef, TxOutputEntry, Utxo,
};
use xuperchain_primitives::{AdapterError, ChainConfig};
use xuperchain_rpc::RpcClient;

use crate::crypto;
use crate::host::{AddressProvider, KeyProvider};

const NATIVE_DECIMALS: u32 = 8;
const TX_VERSION: u32 = 1;

/// Receipt returned by [`TransactionBuilder::submit`].
#[derive(Debug, Clone)]
pub struct NativeReceipt {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub coin: String,
    pub tx_id: String,
    pub decimals: u32,
    pub account_id: String,
    pub fees: String,
    pub submit_time: i64,
    pub wx_id: String,
}

pub struct TransactionBuilder {
    rpc: Arc<RpcClient>,
    config: ChainConfig,
    addresses: Arc<dyn AddressProvider>,
    keys: Arc<dyn KeyProvider>,
}

impl TransactionBuilder {
    pub fn new(
        rpc: Arc<RpcClient>,
        config: ChainConfig,
        addresses: Arc<dyn AddressProvider>,
        keys: Arc<dyn KeyProvider>,
    ) -> Self {
        Self {
            rpc,
            config,
            addresses,
            keys,
        }
    }

    /// §4.4.1 — builds a transaction paying `to` from UTXOs across every
    /// address under `account_id`, routing change back to the first
    /// address whose UTXOs were selected.
    pub async fn create(
        &self,
        account_id: &str,
        to: &HashMap<String, String>,
    ) -> Result<RawTransaction, AdapterError> {
        let mut total_send = BigUint::default();
        for amount in to.values() {
            total_send += parse_decimal(amount, NATIVE_DECIMALS)?;
        }

        let addresses = self.addresses.addresses_of_account(account_id, 0, 2000).await?;
        let mut selected: Vec<Utxo> = Vec::new();
        let mut auth_addrs: Vec<String> = Vec::new();
        let mut balance = BigUint::default();

        for addr in &addresses {
            if balance >= total_send {
                break;
            }
            let sel = self.rpc.select_utxo_by_size(addr, true).await?;
            if sel.utxo_list.is_empty() {
                continue;
            }
            auth_addrs.push(addr.clone());
            for utxo in sel.utxo_list {
                balance += from_amount_bytes(&utxo.amount);
                selected.push(utxo);
            }
        }

        if balance < total_send || selected.is_empty() {
            return Err(AdapterError::InsufficientBalance {
                need: format_amount(&total_send, NATIVE_DECIMALS),
                have: format_amount(&balance, NATIVE_DECIMALS),
            });
        }

        let change = &balance - &total_send;
        let change_address = selected[0].to_addr.clone();

        let mut outputs: Vec<TxOutputEntry> = to
            .iter()
            .map(|(addr, amount)| -> Result<TxOutputEntry, AdapterError> {
                Ok(TxOutputEntry {
                    to_addr: addr.clone(),
                    amount: to_amount_bytes(&parse_decimal(amount, NATIVE_DECIMALS)?),
                })
            })
            .collect::<Result<_, _>>()?;

        if change > BigUint::default() {
            outputs.push(TxOutputEntry {
                to_addr: change_address,
                amount: to_amount_bytes(&change),
            });
        }

        self.assemble(account_id, auth_addrs, selected, outputs, &balance)
    }

    /// §4.4.2 — sweeps a window of account addresses into `summary_address`,
    /// capped at `max_tx_inputs` UTXOs per assembled transaction.
    pub async fn summarize(
        &self,
        account_id: &str,
        start: usize,
        limit: usize,
        min_transfer: &str,
        summary_address: &str,
    ) -> Result<Vec<Result<RawTransaction, AdapterError>>, AdapterError> {
        let min = parse_decimal(min_transfer, NATIVE_DECIMALS)?;
        let addresses = self
            .addresses
            .addresses_of_account(account_id, start, limit)
            .await?;

        let mut results = Vec::new();
        let mut utxos: Vec<Utxo> = Vec::new();
        let mut auth_addrs: Vec<String> = Vec::new();
        let mut accumulated = BigUint::default();

        for addr in &addresses {
            let raw_balance = self.rpc.get_balance(addr).await?;
            let balance = BigUint::parse_bytes(raw_balance.as_bytes(), 10).unwrap_or_default();
            if balance < min {
                continue;
            }

            let sel = self.rpc.select_utxo_by_size(addr, true).await?;
            if sel.utxo_list.is_empty() {
                continue;
            }
            auth_addrs.push(addr.clone());
            for utxo in sel.utxo_list {
                accumulated += from_amount_bytes(&utxo.amount);
                utxos.push(utxo);
            }

            if utxos.len() >= self.config.max_tx_inputs {
                results.push(self.finish_summary(
                    account_id,
                    &mut auth_addrs,
                    &mut utxos,
                    &mut accumulated,
                    summary_address,
                ));
            }
        }

        if !utxos.is_empty() {
            results.push(self.finish_summary(
                account_id,
                &mut auth_addrs,
                &mut utxos,
                &mut accumulated,
                summary_address,
            ));
        }

        Ok(results)
    }

    fn finish_summary(
        &self,
        account_id: &str,
        auth_addrs: &mut Vec<String>,
        utxos: &mut Vec<Utxo>,
        accumulated: &mut BigUint,
        summary_address: &str,
    ) -> Result<RawTransaction, AdapterError> {
        let outputs = vec![TxOutputEntry {
            to_addr: summary_address.to_string(),
            amount: to_amount_bytes(accumulated),
        }];
        let result = self.assemble(
            account_id,
            std::mem::take(auth_addrs),
            std::mem::take(utxos),
            outputs,
            accumulated,
        );
        *accumulated = BigUint::default();
        result
    }

    /// §4.4.3 — common assembly shared by `create` and `summarize`.
    fn assemble(
        &self,
        account_id: &str,
        auth_addrs: Vec<String>,
        utxos: Vec<Utxo>,
        outputs: Vec<TxOutputEntry>,
        tx_amount: &BigUint,
    ) -> Result<RawTransaction, AdapterError> {
        if auth_addrs.is_empty() {
            return Err(AdapterError::InsufficientBalance {
                need: format_amount(tx_amount, NATIVE_DECIMALS),
                have: "0".to_string(),
            });
        }

        let tx_inputs = utxos
            .iter()
            .map(|u| TxInputRef {
                ref_txid: u.ref_txid.clone(),
                ref_offset: u.ref_offset,
                from_addr: u.to_addr.clone(),
                amount: u.amount.clone(),
            })
            .collect();

        let tx = Transaction {
            version: TX_VERSION,
            coinbase: false,
            desc: String::new(),
            nonce: fresh_nonce(),
            timestamp: now_unix_nanos(),
            initiator: auth_addrs[0].clone(),
            tx_inputs,
            tx_outputs: outputs.clone(),
            contract_requests: Vec::new(),
            tx_inputs_ext: Vec::new(),
            tx_outputs_ext: Vec::new(),
            auth_require: auth_addrs.clone(),
            initiator_signs: Vec::new(),
            auth_require_signs: Vec::new(),
            txid: String::new(),
        };

        let digest = crypto::digest_hash(&tx)?;
        let message = hex::encode(&digest);

        let mut signatures = HashMap::new();
        let pending: Vec<KeySignature> = auth_addrs
            .iter()
            .map(|addr| KeySignature {
                ecc_type: self.config.curve_type,
                address: addr.clone(),
                message: message.clone(),
                signature: None,
            })
            .collect();
        signatures.insert(account_id.to_string(), pending);

        let tx_from = auth_addrs;
        let tx_to = outputs.iter().map(|o| o.to_addr.clone()).collect();

        let raw = serde_json::to_string(&tx)
            .map_err(|e| AdapterError::SignFailure(format!("encoding transaction: {e}")))?;

        Ok(RawTransaction {
            account: account_id.to_string(),
            coin: CoinInfo {
                symbol: self.config.symbol.clone(),
                is_contract: false,
                contract: None,
                abi_json: None,
            },
            to: outputs
                .iter()
                .map(|o| {
                    (
                        o.to_addr.clone(),
                        format_amount(&from_amount_bytes(&o.amount), NATIVE_DECIMALS),
                    )
                })
                .collect(),
            fees: "0".to_string(),
            raw,
            raw_type: RawType::Json,
            signatures,
            tx_from,
            tx_to,
            tx_id: String::new(),
            tx_amount: format_amount(tx_amount, NATIVE_DECIMALS),
            is_built: true,
            is_completed: false,
            is_submit: false,
            await_result: false,
            await_timeout_secs: RawTransaction::DEFAULT_AWAIT_TIMEOUT_SECS,
        })
    }

    /// §4.4.4 — delegates each pending signature to the host's key store.
    pub async fn sign(&self, raw: &mut RawTransaction) -> Result<(), AdapterError> {
        let Some(pending) = raw.signatures.get_mut(&raw.account) else {
            return Ok(());
        };
        for sig in pending.iter_mut() {
            if sig.signature.is_some() {
                continue;
            }
            let digest = hex::decode(&sig.message)
                .map_err(|e| AdapterError::SignFailure(format!("invalid digest: {e}")))?;
            let rs = self.keys.sign_digest(&raw.account, &sig.address, &digest).await?;
            sig.signature = Some(hex::encode(rs));
        }
        Ok(())
    }

    /// §4.4.5 — verifies every pending signature and rebuilds `raw.raw`
    /// with the resulting `SignatureInfo`s attached.
    pub async fn verify(&self, raw: &mut RawTransaction) -> Result<(), AdapterError> {
        let mut tx: Transaction = serde_json::from_str(&raw.raw)
            .map_err(|e| AdapterError::VerifyFailure(format!("malformed transaction: {e}")))?;
        let digest = crypto::digest_hash(&tx)?;

        for sigs in raw.signatures.values() {
            for sig in sigs {
                let signature_hex = sig
                    .signature
                    .as_ref()
                    .ok_or_else(|| AdapterError::VerifyFailure("missing signature".to_string()))?;
                let rs = hex::decode(signature_hex)
                    .map_err(|e| AdapterError::VerifyFailure(format!("invalid signature hex: {e}")))?;

                let pubkey = self.addresses.public_key_of(&sig.address).await?;
                crypto::verify_prehashed(&pubkey, &digest, &rs)?;

                let info = xuperchain_primitives::model::SignatureInfo {
                    public_key: crypto::public_key_json(&pubkey)?,
                    sign: crypto::signature_to_der(&rs)?,
                };

                if sig.address == tx.initiator {
                    tx.initiator_signs.push(info);
                }
            }
        }

        raw.raw = serde_json::to_string(&tx)
            .map_err(|e| AdapterError::VerifyFailure(format!("encoding transaction: {e}")))?;
        raw.is_completed = true;
        Ok(())
    }

    /// §4.4.6 — submits a completed transaction and returns its receipt.
    pub async fn submit(&self, raw: &mut RawTransaction) -> Result<NativeReceipt, AdapterError> {
        if !raw.is_completed {
            return Err(AdapterError::SubmitFailure(
                "transaction is not verified".to_string(),
            ));
        }
        let tx: Transaction = serde_json::from_str(&raw.raw)
            .map_err(|e| AdapterError::SubmitFailure(format!("malformed transaction: {e}")))?;

        let txid = self.rpc.post_tx(&tx).await?;
        raw.tx_id = txid.clone();
        raw.is_submit = true;

        let submit_time = now_unix_nanos();
        let to = raw.tx_to.first().cloned().unwrap_or_default();
        let wx_id = receipt_digest(&tx.initiator, &to, &txid, submit_time);

        Ok(NativeReceipt {
            from: tx.initiator,
            to,
            amount: raw.tx_amount.clone(),
            coin: raw.coin.symbol.clone(),
            tx_id: txid,
            decimals: NATIVE_DECIMALS,
            account_id: raw.account.clone(),
            fees: raw.fees.clone(),
            submit_time,
            wx_id,
        })
    }
}

fn fresh_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn now_unix_nanos() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

fn receipt_digest(from: &str, to: &str, tx_id: &str, submit_time: i64) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(from.as_bytes());
    hasher.update(to.as_bytes());
    hasher.update(tx_id.as_bytes());
    hasher.update(submit_time.to_be_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[test]
    fn fresh_nonce_is_32_hex_chars() {
        assert_eq!(fresh_nonce().len(), 32);
    }

    #[test]
    fn receipt_digest_is_deterministic() {
        let a = receipt_digest("from", "to", "tx", 123);
        let b = receipt_digest("from", "to", "tx", 123);
        assert_eq!(a, b);
    }

    struct NoopAddresses;

    #[async_trait]
    impl AddressProvider for NoopAddresses {
        async fn addresses_of_account(
            &self,
            _account_id: &str,
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<String>, AdapterError> {
            Ok(Vec::new())
        }

        async fn first_address(&self, _account_id: &str) -> Result<String, AdapterError> {
            Ok(String::new())
        }

        async fn public_key_of(&self, _address: &str) -> Result<Vec<u8>, AdapterError> {
            Ok(Vec::new())
        }
    }

    struct NoopKeys;

    #[async_trait]
    impl KeyProvider for NoopKeys {
        async fn sign_digest(
            &self,
            _account_id: &str,
            _address: &str,
            _digest: &[u8],
        ) -> Result<[u8; 64], AdapterError> {
            Ok([0u8; 64])
        }
    }

    fn test_builder() -> TransactionBuilder {
        let rpc = Arc::new(RpcClient::new("http://127.0.0.1:1", "testchain").unwrap());
        TransactionBuilder::new(rpc, ChainConfig::default(), Arc::new(NoopAddresses), Arc::new(NoopKeys))
    }

    fn utxo(addr: &str, amount: u64) -> Utxo {
        Utxo {
            ref_txid: "prevtx".to_string(),
            ref_offset: 0,
            to_addr: addr.to_string(),
            amount: to_amount_bytes(&BigUint::from(amount)),
        }
    }

    /// One address with 12.00000000 funding a 5.00000000 payment routes
    /// 7.00000000 change back to the funding address.
    #[test]
    fn assemble_routes_change_to_first_selected_utxo_address() {
        let builder = test_builder();
        let utxos = vec![utxo("addrX", 1_200_000_000)];
        let outputs = vec![
            TxOutputEntry {
                to_addr: "recipient".to_string(),
                amount: to_amount_bytes(&BigUint::from(500_000_000u64)),
            },
            TxOutputEntry {
                to_addr: "addrX".to_string(),
                amount: to_amount_bytes(&BigUint::from(700_000_000u64)),
            },
        ];
        let raw = builder
            .assemble(
                "acct1",
                vec!["addrX".to_string()],
                utxos,
                outputs,
                &BigUint::from(1_200_000_000u64),
            )
            .unwrap();

        assert!(raw.is_built);
        assert!(!raw.is_completed);
        assert_eq!(raw.tx_from, vec!["addrX".to_string()]);
        assert_eq!(raw.to.get("recipient").unwrap(), "5.00000000");
        assert_eq!(raw.to.get("addrX").unwrap(), "7.00000000");
        let mut tx_to = raw.tx_to.clone();
        tx_to.sort();
        assert_eq!(tx_to, vec!["addrX".to_string(), "recipient".to_string()]);

        let tx: Transaction = serde_json::from_str(&raw.raw).unwrap();
        assert_eq!(tx.initiator, "addrX");
        let output_sum: BigUint = tx
            .tx_outputs
            .iter()
            .map(|o| from_amount_bytes(&o.amount))
            .sum();
        assert_eq!(output_sum, BigUint::from(1_200_000_000u64));
        let pending = &raw.signatures["acct1"];
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].address, "addrX");
        assert!(pending[0].signature.is_none());
    }

    #[test]
    fn assemble_rejects_empty_auth_addrs() {
        let builder = test_builder();
        let err = builder
            .assemble("acct1", Vec::new(), Vec::new(), Vec::new(), &BigUint::default())
            .unwrap_err();
        assert!(matches!(err, AdapterError::InsufficientBalance { .. }));
    }
}
