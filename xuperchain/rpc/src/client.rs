//! Typed, timeout-bounded RPC surface over [`crate::grpc::XchainClient`].
//!
//! Mirrors the shape of `bitcoin/primitives/src/indexer.rs`'s
//! `SimpleIndexer`: one method per node call, a single shared connection
//! created lazily on first use, errors collapsed to the adapter's typed
//! `AdapterError` at this boundary so nothing upstream touches
//! `tonic::Status` directly.

use std::time::Duration;

use tonic::transport::Channel;

use xuperchain_primitives::model::{Block, BlockHeader, Transaction};
use xuperchain_primitives::AdapterError;

use crate::grpc::XchainClient;
use crate::results::{Acl, PreExecResult, UtxoSelection};
use crate::wire::*;

/// Applied to every unary call unless overridden at construction.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// One pre-execution request: a single contract invocation plus its
/// positional argument map, already ABI-encoded by the caller.
pub struct InvokeCall {
    pub module_name: String,
    pub contract_name: String,
    pub method_name: String,
    pub args: std::collections::HashMap<String, Vec<u8>>,
}

pub struct RpcClient {
    bcname: String,
    timeout: Duration,
    inner: XchainClient<Channel>,
}

impl RpcClient {
    /// Builds the underlying channel lazily: `connect_lazy` never blocks
    /// and never touches the network until the first call is made.
    pub fn new(endpoint: &str, bcname: impl Into<String>) -> Result<Self, AdapterError> {
        Self::with_timeout(endpoint, bcname, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        endpoint: &str,
        bcname: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AdapterError> {
        let channel = Channel::from_shared(endpoint.to_string())
            .map_err(|e| AdapterError::RpcTransport(e.to_string()))?
            .connect_lazy();
        Ok(Self {
            bcname: bcname.into(),
            timeout,
            inner: XchainClient::new(channel),
        })
    }

    fn check_header(header: Option<Header>) -> Result<(), AdapterError> {
        match header {
            Some(h) if h.error != 0 => Err(AdapterError::RpcProtocol(format!(
                "node error {}: {}",
                h.error, h.error_msg
            ))),
            _ => Ok(()),
        }
    }

    async fn call<Fut, R>(&self, fut: Fut) -> Result<R, AdapterError>
    where
        Fut: std::future::Future<Output = Result<R, tonic::Status>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(AdapterError::from),
            Err(_) => Err(AdapterError::RpcTransport(format!(
                "call timed out after {:?}",
                self.timeout
            ))),
        }
    }

    fn decode_json<T: serde::de::DeserializeOwned>(
        label: &'static str,
        raw: &str,
    ) -> Result<T, AdapterError> {
        serde_json::from_str(raw)
            .map_err(|e| AdapterError::RpcProtocol(format!("malformed {label}: {e}")))
    }

    pub async fn get_balance(&self, address: &str) -> Result<String, AdapterError> {
        let mut inner = self.inner.clone();
        let req = GetBalanceRequest {
            bcname: self.bcname.clone(),
            address: address.to_string(),
        };
        let resp = self.call(inner.get_balance(req)).await?;
        Self::check_header(resp.header)?;
        Ok(resp.balance)
    }

    pub async fn get_block(&self, block_id: &str) -> Result<Block, AdapterError> {
        let mut inner = self.inner.clone();
        let req = GetBlockRequest {
            bcname: self.bcname.clone(),
            blockid: block_id.to_string(),
        };
        let resp = self.call(inner.get_block(req)).await?;
        Self::check_header(resp.header)?;
        Self::decode_json("block", &resp.block_json)
    }

    pub async fn get_block_by_height(&self, height: u64) -> Result<Block, AdapterError> {
        let mut inner = self.inner.clone();
        let req = GetBlockByHeightRequest {
            bcname: self.bcname.clone(),
            height: height as i64,
        };
        let resp = self.call(inner.get_block_by_height(req)).await?;
        Self::check_header(resp.header)?;
        Self::decode_json("block", &resp.block_json)
    }

    pub async fn get_chain_status(&self) -> Result<BlockHeader, AdapterError> {
        let mut inner = self.inner.clone();
        let req = ChainStatusRequest {
            bcname: self.bcname.clone(),
        };
        let resp = self.call(inner.get_block_chain_status(req)).await?;
        Self::check_header(resp.header)?;
        Ok(BlockHeader {
            height: resp.height as u64,
            hash: resp.block_id,
        })
    }

    pub async fn query_tx(&self, txid: &str) -> Result<Transaction, AdapterError> {
        let mut inner = self.inner.clone();
        let req = QueryTxRequest {
            bcname: self.bcname.clone(),
            txid: txid.to_string(),
        };
        let resp = self.call(inner.query_tx(req)).await?;
        Self::check_header(resp.header)?;
        if resp.tx_json.is_empty() {
            return Err(AdapterError::TxNotFound(txid.to_string()));
        }
        Self::decode_json("transaction", &resp.tx_json)
    }

    pub async fn query_acl(&self, account_name: &str) -> Result<(Acl, bool), AdapterError> {
        let mut inner = self.inner.clone();
        let req = QueryAclRequest {
            bcname: self.bcname.clone(),
            account_name: account_name.to_string(),
        };
        let resp = self.call(inner.query_acl(req)).await?;
        Self::check_header(resp.header)?;
        if !resp.confirmed || resp.acl_json.is_empty() {
            return Ok((Acl::default(), resp.confirmed));
        }
        let acl = Self::decode_json("acl", &resp.acl_json)?;
        Ok((acl, resp.confirmed))
    }

    fn encode_invokes(invokes: &[InvokeCall]) -> Vec<InvokeRequestPb> {
        invokes
            .iter()
            .map(|c| InvokeRequestPb {
                module_name: c.module_name.clone(),
                contract_name: c.contract_name.clone(),
                method_name: c.method_name.clone(),
                args: c.args.clone(),
            })
            .collect()
    }

    fn check_responses(result: &PreExecResult) -> Result<(), AdapterError> {
        for r in &result.responses {
            if r.status >= 400 {
                return Err(AdapterError::ContractCall(format!(
                    "status {}: {}",
                    r.status, r.message
                )));
            }
        }
        Ok(())
    }

    pub async fn pre_exec(
        &self,
        invokes: &[InvokeCall],
        initiator: &str,
        auth_require: &[String],
    ) -> Result<PreExecResult, AdapterError> {
        let mut inner = self.inner.clone();
        let req = PreExecRequest {
            bcname: self.bcname.clone(),
            requests: Self::encode_invokes(invokes),
            initiator: initiator.to_string(),
            auth_require: auth_require.to_vec(),
        };
        let resp = self.call(inner.pre_exec(req)).await?;
        Self::check_header(resp.header)?;
        let result: PreExecResult = Self::decode_json("pre-exec response", &resp.response_json)?;
        Self::check_responses(&result)?;
        Ok(result)
    }

    pub async fn pre_exec_with_select_utxo(
        &self,
        address: &str,
        total_amount: &str,
        invokes: &[InvokeCall],
        initiator: &str,
        auth_require: &[String],
    ) -> Result<(PreExecResult, UtxoSelection), AdapterError> {
        let mut inner = self.inner.clone();
        let req = PreExecWithSelectUtxoRequest {
            bcname: self.bcname.clone(),
            address: address.to_string(),
            total_amount: total_amount.to_string(),
            request: Some(PreExecRequest {
                bcname: self.bcname.clone(),
                requests: Self::encode_invokes(invokes),
                initiator: initiator.to_string(),
                auth_require: auth_require.to_vec(),
            }),
        };
        let resp = self.call(inner.pre_exec_with_select_utxo(req)).await?;
        Self::check_header(resp.header)?;
        let result: PreExecResult = Self::decode_json("pre-exec response", &resp.response_json)?;
        Self::check_responses(&result)?;
        let utxos: UtxoSelection = if resp.utxo_json.is_empty() {
            UtxoSelection::default()
        } else {
            Self::decode_json("utxo selection", &resp.utxo_json)?
        };
        Ok((result, utxos))
    }

    pub async fn select_utxo(
        &self,
        address: &str,
        total_need: &str,
        need_lock: bool,
    ) -> Result<UtxoSelection, AdapterError> {
        let mut inner = self.inner.clone();
        let req = SelectUtxoRequest {
            bcname: self.bcname.clone(),
            address: address.to_string(),
            total_need: total_need.to_string(),
            need_lock,
        };
        let resp = self.call(inner.select_utxo(req)).await?;
        Self::check_header(resp.header)?;
        Self::decode_json("utxo selection", &resp.utxo_json)
    }

    pub async fn select_utxo_by_size(
        &self,
        address: &str,
        need_lock: bool,
    ) -> Result<UtxoSelection, AdapterError> {
        let mut inner = self.inner.clone();
        let req = SelectUtxoBySizeRequest {
            bcname: self.bcname.clone(),
            address: address.to_string(),
            need_lock,
        };
        let resp = self.call(inner.select_utxo_by_size(req)).await?;
        Self::check_header(resp.header)?;
        Self::decode_json("utxo selection", &resp.utxo_json)
    }

    /// Computes the transaction's digest-based id locally before sending it,
    /// so the caller never trusts a node-reported txid it can't reproduce.
    pub async fn post_tx(&self, tx: &Transaction) -> Result<String, AdapterError> {
        let tx_json = serde_json::to_string(tx)
            .map_err(|e| AdapterError::SubmitFailure(format!("encoding transaction: {e}")))?;
        let txid = local_txid(tx)?;

        let mut inner = self.inner.clone();
        let req = PostTxRequest {
            bcname: self.bcname.clone(),
            tx_json,
        };
        let resp = self.call(inner.post_tx(req)).await?;
        Self::check_header(resp.header)?;
        Ok(txid)
    }
}

/// `txid = sha256(canonical transaction encoding)`, matching the digest
/// every signer signs over (minus signatures/txid themselves).
fn local_txid(tx: &Transaction) -> Result<String, AdapterError> {
    use sha2::{Digest, Sha256};

    let mut canon = tx.clone();
    canon.initiator_signs.clear();
    canon.auth_require_signs.clear();
    canon.txid.clear();
    let bytes = serde_json::to_vec(&canon)
        .map_err(|e| AdapterError::SubmitFailure(format!("encoding transaction: {e}")))?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
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
            txid: String::new(),
        }
    }

    #[test]
    fn local_txid_is_deterministic_and_ignores_signatures() {
        let plain = sample_tx();
        let mut signed = plain.clone();
        signed.initiator_signs.push(xuperchain_primitives::model::SignatureInfo {
            public_key: "{}".to_string(),
            sign: vec![1, 2, 3],
        });
        signed.txid = "stale".to_string();

        assert_eq!(local_txid(&plain).unwrap(), local_txid(&signed).unwrap());
    }

    #[test]
    fn local_txid_changes_with_the_transaction_body() {
        let mut other = sample_tx();
        other.nonce = "different".to_string();
        assert_ne!(local_txid(&sample_tx()).unwrap(), local_txid(&other).unwrap());
    }

    #[test]
    fn check_header_accepts_a_zero_error_code() {
        assert!(RpcClient::check_header(Some(Header {
            error: 0,
            error_msg: String::new(),
        }))
        .is_ok());
        assert!(RpcClient::check_header(None).is_ok());
    }

    #[test]
    fn check_header_rejects_a_nonzero_error_code() {
        let err = RpcClient::check_header(Some(Header {
            error: 1,
            error_msg: "boom".to_string(),
        }))
        .unwrap_err();
        assert!(matches!(err, AdapterError::RpcProtocol(msg) if msg.contains("boom")));
    }

    #[test]
    fn check_responses_rejects_a_contract_error_status() {
        let result = PreExecResult {
            gas_used: 10,
            responses: vec![crate::results::ContractResponseItem {
                status: 500,
                message: "contract trapped".to_string(),
                body: Vec::new(),
            }],
            contract_requests: Vec::new(),
            tx_inputs_ext: Vec::new(),
            tx_outputs_ext: Vec::new(),
        };
        let err = RpcClient::check_responses(&result).unwrap_err();
        assert!(matches!(err, AdapterError::ContractCall(msg) if msg.contains("contract trapped")));
    }
}
