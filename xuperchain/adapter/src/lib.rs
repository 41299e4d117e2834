//! Adapter crate: transaction builder (C4), contract builder (C5), block
//! scanner (C6), and the facade (C7) that binds them behind one entry
//! point for the host wallet framework.

pub mod builder;
pub mod contract;
pub mod crypto;
pub mod facade;
pub mod host;
pub mod scanner;

pub use builder::{NativeReceipt, TransactionBuilder};
pub use contract::ContractBuilder;
pub use facade::{AdapterOptions, XuperchainAdapter};
pub use scanner::BlockScanner;
