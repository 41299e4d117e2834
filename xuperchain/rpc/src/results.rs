//! Plain decoded shapes for the JSON payloads carried inside
//! [`crate::wire`] messages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use xuperchain_primitives::model::{ContractRequest, TxStateEntry, Utxo};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Acl {
    #[serde(default)]
    pub aks_weight: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractResponseItem {
    pub status: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PreExecResult {
    pub gas_used: u64,
    #[serde(default)]
    pub responses: Vec<ContractResponseItem>,
    #[serde(default)]
    pub contract_requests: Vec<ContractRequest>,
    #[serde(default)]
    pub tx_inputs_ext: Vec<TxStateEntry>,
    #[serde(default)]
    pub tx_outputs_ext: Vec<TxStateEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct UtxoSelection {
    #[serde(default)]
    pub utxo_list: Vec<Utxo>,
    pub total_selected: String,
}
