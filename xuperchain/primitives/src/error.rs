use thiserror::Error;

/// Typed error surface for every fallible public operation on this adapter.
///
/// Internal plumbing composes fallible steps with `Result<_, AdapterError>`
/// and converts to a specific variant at the public boundary, the way the
/// node's `header.error` enum collapses many failure modes into one
/// reported cause.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("rpc transport error: {0}")]
    RpcTransport(String),

    #[error("rpc protocol error: {0}")]
    RpcProtocol(String),

    #[error("transaction not found: {0}")]
    TxNotFound(String),

    #[error("invalid abi: {0}")]
    AbiInvalid(String),

    #[error("invalid contract call: {0}")]
    ContractCallInvalid(String),

    #[error("contract call failed: {0}")]
    ContractCall(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("account has no address: {0}")]
    AccountHasNoAddress(String),

    #[error("address not found: {0}")]
    AddressNotFound(String),

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: String, have: String },

    #[error("sign failure: {0}")]
    SignFailure(String),

    #[error("verify failure: {0}")]
    VerifyFailure(String),

    #[error("submit failure: {0}")]
    SubmitFailure(String),

    #[error("extract failure: {0}")]
    ExtractFailure(String),
}

impl From<tonic::Status> for AdapterError {
    fn from(status: tonic::Status) -> Self {
        AdapterError::RpcTransport(status.message().to_string())
    }
}

impl From<tonic::transport::Error> for AdapterError {
    fn from(err: tonic::transport::Error) -> Self {
        AdapterError::RpcTransport(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::AbiInvalid(err.to_string())
    }
}
