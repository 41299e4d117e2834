//! Smart-contract transaction lifecycle: ABI-typed pre-execution,
//! ACL-driven auxiliary signers, assembly, verification, and optional
//! synchronous await of the resulting receipt via the scanner.
//!
//! Grounded structurally on [`crate::builder::TransactionBuilder`]
//! (shared digest/sign/verify shape) with the pre-execution and ACL
//! handling following the node's contract-invocation RPCs in
//! `examples/original_source/xuperchain/contract_decoder.go`.

use std::collections::HashMap;
use std::sync::Arc;

use num_bigint::BigUint;

use xuperchain_primitives::abi::{encode_invoke_request, split_contract_address, Abi};
use xuperchain_primitives::amount::{from_amount_bytes, to_amount_bytes};
use xuperchain_primitives::model::{
    CoinInfo, KeySignature, RawTransaction, RawType, SmartContractReceipt, Transaction,
    TxInputRef, TxOutputEntry, FEE_SENTINEL_ADDRESS, METHOD_DEPLOY, MODULE_XKERNEL,
};
use xuperchain_primitives::{AdapterError, ChainConfig};
use xuperchain_rpc::{InvokeCall, RpcClient};

use crate::crypto;
use crate::host::{AccountResolver, AddressProvider, KeyProvider, ScanTarget};
use crate::scanner::BlockScanner;

const NATIVE_DECIMALS: u32 = 8;
const AWAIT_POLL_INTERVAL_SECS: u64 = 2;

pub struct ContractBuilder {
    rpc: Arc<RpcClient>,
    config: ChainConfig,
    addresses: Arc<dyn AddressProvider>,
    keys: Arc<dyn KeyProvider>,
    accounts: Arc<dyn AccountResolver>,
    target: Arc<dyn ScanTarget>,
}

impl ContractBuilder {
    pub fn new(
        rpc: Arc<RpcClient>,
        config: ChainConfig,
        addresses: Arc<dyn AddressProvider>,
        keys: Arc<dyn KeyProvider>,
        accounts: Arc<dyn AccountResolver>,
        target: Arc<dyn ScanTarget>,
    ) -> Self {
        Self {
            rpc,
            config,
            addresses,
            keys,
            accounts,
            target,
        }
    }

    fn parse_abi(coin: &CoinInfo) -> Result<Abi, AdapterError> {
        if !coin.is_contract {
            return Err(AdapterError::ContractCallInvalid(
                "coin is not a contract".to_string(),
            ));
        }
        let abi_json = coin
            .abi_json
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AdapterError::ContractCallInvalid("missing abi".to_string()))?;
        Abi::parse(abi_json)
    }

    /// §4.5.1 + §4.5.2 — pre-executes the invocation against the node
    /// and assembles the resulting transaction.
    pub async fn create(
        &self,
        account_id: &str,
        coin: &CoinInfo,
        contract_address: &str,
        positional: &[String],
    ) -> Result<RawTransaction, AdapterError> {
        let abi = Self::parse_abi(coin)?;
        let request = encode_invoke_request(&abi, contract_address, positional)?;
        let (module_name, contract_name) = split_contract_address(contract_address);

        let mut auth_require: Vec<String> = Vec::new();
        let mut signer_addrs: Vec<String> = Vec::new();

        if module_name == MODULE_XKERNEL && request.method_name == METHOD_DEPLOY {
            let account_name_bytes = request.args.get("account_name").ok_or_else(|| {
                AdapterError::AbiInvalid("Deploy is missing account_name".to_string())
            })?;
            let account_name = String::from_utf8(account_name_bytes.clone())
                .map_err(|e| AdapterError::AbiInvalid(format!("invalid account_name: {e}")))?;

            let (acl, exists) = self.rpc.query_acl(&account_name).await?;
            if exists {
                for address in acl.aks_weight.keys() {
                    auth_require.push(format!("{account_name}/{address}"));
                    let resolved = self.accounts.resolve_address(&account_name, address).await?;
                    signer_addrs.push(resolved);
                }
            }
        }

        let initiator = self.addresses.first_address(account_id).await?;
        auth_require.push(initiator.clone());
        signer_addrs.push(initiator.clone());

        let invoke = InvokeCall {
            module_name,
            contract_name,
            method_name: request.method_name,
            args: request.args,
        };

        let (pre_result, utxo_selection) = self
            .rpc
            .pre_exec_with_select_utxo(&initiator, "0", std::slice::from_ref(&invoke), &initiator, &auth_require)
            .await?;

        let fees = BigUint::from(pre_result.gas_used);
        let selected_total: BigUint = utxo_selection
            .utxo_list
            .iter()
            .map(|u| from_amount_bytes(&u.amount))
            .sum();

        let mut outputs = vec![TxOutputEntry {
            to_addr: FEE_SENTINEL_ADDRESS.to_string(),
            amount: to_amount_bytes(&fees),
        }];
        if selected_total > fees {
            outputs.push(TxOutputEntry {
                to_addr: initiator.clone(),
                amount: to_amount_bytes(&(&selected_total - &fees)),
            });
        }

        let tx_inputs: Vec<TxInputRef> = utxo_selection
            .utxo_list
            .iter()
            .map(|u| TxInputRef {
                ref_txid: u.ref_txid.clone(),
                ref_offset: u.ref_offset,
                from_addr: u.to_addr.clone(),
                amount: u.amount.clone(),
            })
            .collect();

        signer_addrs.dedup();

        let tx = Transaction {
            version: 1,
            coinbase: false,
            desc: String::new(),
            nonce: fresh_nonce(),
            timestamp: now_unix_nanos(),
            initiator: initiator.clone(),
            tx_inputs,
            tx_outputs: outputs.clone(),
            contract_requests: pre_result.contract_requests.clone(),
            tx_inputs_ext: pre_result.tx_inputs_ext.clone(),
            tx_outputs_ext: pre_result.tx_outputs_ext.clone(),
            auth_require: auth_require.clone(),
            initiator_signs: Vec::new(),
            auth_require_signs: Vec::new(),
            txid: String::new(),
        };

        let digest = crypto::digest_hash(&tx)?;
        let message = hex::encode(&digest);

        let pending: Vec<KeySignature> = signer_addrs
            .iter()
            .map(|addr| KeySignature {
                ecc_type: self.config.curve_type,
                address: addr.clone(),
                message: message.clone(),
                signature: None,
            })
            .collect();
        let mut signatures = HashMap::new();
        signatures.insert(account_id.to_string(), pending);

        let tx_to = outputs.iter().map(|o| o.to_addr.clone()).collect();
        let raw = serde_json::to_string(&tx)
            .map_err(|e| AdapterError::SignFailure(format!("encoding transaction: {e}")))?;

        Ok(RawTransaction {
            account: account_id.to_string(),
            coin: coin.clone(),
            to: HashMap::new(),
            fees: xuperchain_primitives::amount::format_amount(&fees, NATIVE_DECIMALS),
            raw,
            raw_type: RawType::Json,
            signatures,
            tx_from: vec![initiator],
            tx_to,
            tx_id: String::new(),
            tx_amount: "0".to_string(),
            is_built: true,
            is_completed: false,
            is_submit: false,
            await_result: false,
            await_timeout_secs: RawTransaction::DEFAULT_AWAIT_TIMEOUT_SECS,
        })
    }

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

    /// §4.5.3 — identical to the native builder's verify, except every
    /// validated signature also joins `auth_require_signs`.
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
                    tx.initiator_signs.push(info.clone());
                }
                tx.auth_require_signs.push(info);
            }
        }

        raw.raw = serde_json::to_string(&tx)
            .map_err(|e| AdapterError::VerifyFailure(format!("encoding transaction: {e}")))?;
        raw.is_completed = true;
        Ok(())
    }

    /// §4.5.4 — submits and, if requested, polls the scanner for the
    /// resulting receipt until it appears or the deadline passes.
    pub async fn submit(
        &self,
        raw: &mut RawTransaction,
        contract_address: &str,
        scanner: &BlockScanner,
    ) -> Result<SmartContractReceipt, AdapterError> {
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

        let base_receipt = SmartContractReceipt {
            coin: self.config.symbol.clone(),
            tx_id: txid.clone(),
            from: tx.initiator.clone(),
            to: contract_address.to_string(),
            fees: raw.fees.clone(),
            value: "0".to_string(),
            events: Vec::new(),
            block_hash: String::new(),
            block_height: 0,
            confirm_time: now_unix_nanos(),
            status: "pending".to_string(),
        };

        if !raw.await_result {
            return Ok(base_receipt);
        }

        let resolved = self.target.resolve(xuperchain_primitives::model::ScanTargetParam {
            address: contract_address.to_string(),
            is_contract: true,
        });
        let deadline = now_unix_nanos() + (raw.await_timeout_secs as i64) * 1_000_000_000;

        while now_unix_nanos() < deadline {
            match scanner.extract_transaction_and_receipt(&txid).await {
                Ok(Some(result)) => {
                    if let Some(receipt) = result.contract_data.get(&resolved.source_key) {
                        return Ok(receipt.clone());
                    }
                }
                Ok(None) => {}
                Err(e) => log::debug!("await-receipt poll for {txid} swallowed error: {e}"),
            }
            tokio::time::sleep(std::time::Duration::from_secs(AWAIT_POLL_INTERVAL_SECS)).await;
        }

        Ok(base_receipt)
    }

    /// §4.5.5 — read-only invocation with no UTXO selection or signing.
    pub async fn call(
        &self,
        coin: &CoinInfo,
        contract_address: &str,
        initiator: &str,
        positional: &[String],
    ) -> Result<(String, String), AdapterError> {
        let abi = Self::parse_abi(coin)?;
        let request = encode_invoke_request(&abi, contract_address, positional)?;
        let (module_name, contract_name) = split_contract_address(contract_address);

        let invoke = InvokeCall {
            module_name,
            contract_name,
            method_name: request.method_name,
            args: request.args,
        };

        let result = self
            .rpc
            .pre_exec(std::slice::from_ref(&invoke), initiator, &[initiator.to_string()])
            .await?;

        let bytes: Vec<u8> = result.responses.iter().flat_map(|r| r.body.clone()).collect();
        Ok((hex::encode(&bytes), String::from_utf8_lossy(&bytes).to_string()))
    }
}

fn fresh_nonce() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn now_unix_nanos() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(is_contract: bool, abi_json: Option<&str>) -> CoinInfo {
        CoinInfo {
            symbol: "XUPER".to_string(),
            is_contract,
            contract: None,
            abi_json: abi_json.map(|s| s.to_string()),
        }
    }

    #[test]
    fn parse_abi_rejects_a_non_contract_coin() {
        let err = ContractBuilder::parse_abi(&coin(false, Some("[]"))).unwrap_err();
        assert!(matches!(err, AdapterError::ContractCallInvalid(_)));
    }

    #[test]
    fn parse_abi_rejects_a_missing_or_empty_abi() {
        assert!(matches!(
            ContractBuilder::parse_abi(&coin(true, None)).unwrap_err(),
            AdapterError::ContractCallInvalid(_)
        ));
        assert!(matches!(
            ContractBuilder::parse_abi(&coin(true, Some(""))).unwrap_err(),
            AdapterError::ContractCallInvalid(_)
        ));
    }

    #[test]
    fn parse_abi_accepts_a_well_formed_abi() {
        let abi_json =
            r#"[{"type":"function","name":"transfer","inputs":[{"name":"to","type":"string"}]}]"#;
        let abi = ContractBuilder::parse_abi(&coin(true, Some(abi_json))).unwrap();
        assert!(abi.methods.contains_key("transfer"));
    }
}
