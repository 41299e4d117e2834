//! Hand-authored wire message types for the node's gRPC service.
//!
//! No `.proto` file ships in this tree, so these are written directly in
//! the shape `tonic-build`/`prost-build` would generate from one. Message
//! bodies that would otherwise need a large parallel schema (blocks,
//! transactions, ACLs, pre-exec results) are carried as JSON-encoded
//! `bytes`/`string` fields and decoded by [`crate::client::RpcClient`]
//! into the richer types in `xuperchain_primitives::model` — the service
//! boundary stays typed and protobuf-shaped without duplicating the
//! entire ledger schema as protobuf messages by hand.

use std::collections::HashMap;

/// Every response carries this envelope; a non-zero `error` is a
/// node-reported failure and becomes `AdapterError::RpcProtocol`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Header {
    #[prost(int32, tag = "1")]
    pub error: i32,
    #[prost(string, tag = "2")]
    pub error_msg: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBalanceRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
    #[prost(string, tag = "2")]
    pub address: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BalanceResponse {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(string, tag = "2")]
    pub balance: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
    #[prost(string, tag = "2")]
    pub blockid: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBlockByHeightRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
    #[prost(int64, tag = "2")]
    pub height: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockResponse {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(string, tag = "2")]
    pub block_json: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChainStatusRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChainStatusResponse {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(int64, tag = "2")]
    pub height: i64,
    #[prost(string, tag = "3")]
    pub block_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryTxRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
    #[prost(string, tag = "2")]
    pub txid: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryTxResponse {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(string, tag = "2")]
    pub tx_json: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryAclRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
    #[prost(string, tag = "2")]
    pub account_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryAclResponse {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(bool, tag = "2")]
    pub confirmed: bool,
    #[prost(string, tag = "3")]
    pub acl_json: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InvokeRequestPb {
    #[prost(string, tag = "1")]
    pub module_name: String,
    #[prost(string, tag = "2")]
    pub contract_name: String,
    #[prost(string, tag = "3")]
    pub method_name: String,
    #[prost(map = "string, bytes", tag = "4")]
    pub args: HashMap<String, Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PreExecRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
    #[prost(message, repeated, tag = "2")]
    pub requests: Vec<InvokeRequestPb>,
    #[prost(string, tag = "3")]
    pub initiator: String,
    #[prost(string, repeated, tag = "4")]
    pub auth_require: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PreExecResponse {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(string, tag = "2")]
    pub response_json: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PreExecWithSelectUtxoRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
    #[prost(string, tag = "2")]
    pub address: String,
    #[prost(string, tag = "3")]
    pub total_amount: String,
    #[prost(message, optional, tag = "4")]
    pub request: Option<PreExecRequest>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PreExecWithSelectUtxoResponse {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(string, tag = "2")]
    pub response_json: String,
    #[prost(string, tag = "3")]
    pub utxo_json: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SelectUtxoRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
    #[prost(string, tag = "2")]
    pub address: String,
    #[prost(string, tag = "3")]
    pub total_need: String,
    #[prost(bool, tag = "4")]
    pub need_lock: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SelectUtxoBySizeRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
    #[prost(string, tag = "2")]
    pub address: String,
    #[prost(bool, tag = "3")]
    pub need_lock: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UtxoResponse {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(string, tag = "2")]
    pub utxo_json: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PostTxRequest {
    #[prost(string, tag = "1")]
    pub bcname: String,
    #[prost(string, tag = "2")]
    pub tx_json: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PostTxResponse {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(string, tag = "2")]
    pub txid: String,
}
