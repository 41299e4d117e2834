pub mod client;
pub mod grpc;
pub mod results;
pub mod wire;

pub use client::{InvokeCall, RpcClient, DEFAULT_TIMEOUT_SECS};
pub use results::{Acl, ContractResponseItem, PreExecResult, UtxoSelection};
