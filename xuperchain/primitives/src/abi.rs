//! ABI-typed argument encoding: parse a contract's ABI JSON, look up a
//! method by name, and coerce a positional `[method, arg1, arg2, ...]`
//! argument list into the byte blobs the node expects.

use crate::error::AdapterError;
use crate::model::ContractRequest;
use num_bigint::BigUint;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct AbiParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbiEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
}

#[derive(Debug, Clone)]
pub struct Abi {
    pub methods: HashMap<String, AbiEntry>,
}

impl Abi {
    pub fn parse(abi_json: &str) -> Result<Self, AdapterError> {
        let entries: Vec<AbiEntry> = serde_json::from_str(abi_json)?;
        let methods = entries
            .into_iter()
            .filter(|e| e.entry_type == "function")
            .map(|e| (e.name.clone(), e))
            .collect();
        Ok(Self { methods })
    }
}

/// Splits a contract address into `(module_name, contract_name)`. A
/// single segment means an xkernel-class contract with no contract name.
pub fn split_contract_address(address: &str) -> (String, String) {
    match address.split_once(':') {
        Some((module, contract)) => (module.to_string(), contract.to_string()),
        None => (crate::model::MODULE_XKERNEL.to_string(), String::new()),
    }
}

/// Coerces one positional argument string into its ABI-declared byte
/// representation.
fn coerce_arg(ty: &str, value: &str) -> Result<Vec<u8>, AdapterError> {
    match ty {
        "bool" => match value {
            "true" | "1" => Ok(vec![0x01]),
            "false" | "0" => Ok(vec![0x00]),
            other => Err(AdapterError::AbiInvalid(format!(
                "invalid bool argument: {other}"
            ))),
        },
        t if t.starts_with("uint") || t.starts_with("int") => {
            let n = if let Some(hex) = value.strip_prefix("0x") {
                BigUint::parse_bytes(hex.as_bytes(), 16)
            } else {
                BigUint::parse_bytes(value.as_bytes(), 10)
            }
            .ok_or_else(|| AdapterError::AbiInvalid(format!("invalid integer argument: {value}")))?;
            Ok(n.to_bytes_be())
        }
        "address" | "string" => Ok(value.as_bytes().to_vec()),
        t if t == "fixed_bytes" || t == "bytes" || t == "hash" || t.starts_with("bytes") => {
            let stripped = value.strip_prefix("0x").unwrap_or(value);
            hex::decode(stripped)
                .map_err(|e| AdapterError::AbiInvalid(format!("invalid hex argument: {e}")))
        }
        other => Err(AdapterError::AbiInvalid(format!(
            "unsupported abi type: {other}"
        ))),
    }
}

/// Builds a [`ContractRequest`] from a positional `[method, arg1, ...]`
/// list, looking the method up in `abi` and coercing each argument by
/// its declared type.
pub fn encode_invoke_request(
    abi: &Abi,
    contract_address: &str,
    positional: &[String],
) -> Result<ContractRequest, AdapterError> {
    let (method_name, rest) = positional
        .split_first()
        .ok_or_else(|| AdapterError::AbiInvalid("missing method name".to_string()))?;

    let method = abi
        .methods
        .get(method_name)
        .ok_or_else(|| AdapterError::AbiInvalid(format!("unknown method: {method_name}")))?;

    if method.inputs.len() != rest.len() {
        return Err(AdapterError::AbiInvalid(format!(
            "arity mismatch for {method_name}: expected {}, got {}",
            method.inputs.len(),
            rest.len()
        )));
    }

    let mut args = HashMap::with_capacity(method.inputs.len());
    for (input, value) in method.inputs.iter().zip(rest.iter()) {
        args.insert(input.name.clone(), coerce_arg(&input.ty, value)?);
    }

    let (module_name, contract_name) = split_contract_address(contract_address);

    Ok(ContractRequest {
        module_name,
        contract_name,
        method_name: method_name.clone(),
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_abi() -> Abi {
        let json = r#"[
            {"type":"function","name":"get","inputs":[{"name":"key","type":"string"}]},
            {"type":"function","name":"transfer","inputs":[
                {"name":"to","type":"address"},
                {"name":"amount","type":"uint64"}
            ]}
        ]"#;
        Abi::parse(json).unwrap()
    }

    #[test]
    fn encodes_string_arg() {
        let abi = sample_abi();
        let req = encode_invoke_request(
            &abi,
            "wasm:counter2",
            &["get".to_string(), "example".to_string()],
        )
        .unwrap();
        assert_eq!(req.module_name, "wasm");
        assert_eq!(req.contract_name, "counter2");
        assert_eq!(req.args["key"], b"example".to_vec());
    }

    #[test]
    fn encodes_hex_and_decimal_uint_identically() {
        let abi = sample_abi();
        let hex_req = encode_invoke_request(
            &abi,
            "wasm:token",
            &[
                "transfer".to_string(),
                "addr1".to_string(),
                "0xff".to_string(),
            ],
        )
        .unwrap();
        let dec_req = encode_invoke_request(
            &abi,
            "wasm:token",
            &[
                "transfer".to_string(),
                "addr1".to_string(),
                "255".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(hex_req.args["amount"], dec_req.args["amount"]);
        assert_eq!(hex_req.args["amount"], vec![0xff]);
    }

    #[test]
    fn rejects_arity_mismatch() {
        let abi = sample_abi();
        let err = encode_invoke_request(&abi, "wasm:counter2", &["get".to_string()]).unwrap_err();
        assert!(matches!(err, AdapterError::AbiInvalid(_)));
    }

    #[test]
    fn single_segment_address_is_xkernel() {
        let (module, contract) = split_contract_address("xkernel");
        assert_eq!(module, "xkernel");
        assert_eq!(contract, "");
    }
}
