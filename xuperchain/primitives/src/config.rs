use serde::{Deserialize, Serialize};

/// Curve family an address/signature belongs to. Selects the address
/// prefix byte in [`crate::address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveType {
    NistP256,
    Gm,
    NistSn,
}

impl CurveType {
    pub fn prefix_byte(self) -> u8 {
        match self {
            CurveType::NistP256 => 0x01,
            CurveType::Gm => 0x02,
            CurveType::NistSn => 0x03,
        }
    }

    pub fn from_prefix_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(CurveType::NistP256),
            0x02 => Some(CurveType::Gm),
            0x03 => Some(CurveType::NistSn),
            _ => None,
        }
    }
}

/// Chain-level configuration handed to the adapter by the host.
///
/// Mirrors the original `ChainConfig` (symbol/server address/curve/input
/// cap); config origin (file, env, flags) is the host's concern, so this
/// struct only carries the validated runtime shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub symbol: String,
    pub server_api: String,
    pub chain_name: String,
    pub curve_type: CurveType,
    pub max_tx_inputs: usize,
}

impl ChainConfig {
    pub const DEFAULT_SYMBOL: &'static str = "XUPER";
    pub const DEFAULT_DECIMALS: u32 = 8;
    pub const DEFAULT_MAX_TX_INPUTS: usize = 150;

    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            server_api: String::new(),
            chain_name: String::new(),
            curve_type: CurveType::NistP256,
            max_tx_inputs: Self::DEFAULT_MAX_TX_INPUTS,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SYMBOL)
    }
}
