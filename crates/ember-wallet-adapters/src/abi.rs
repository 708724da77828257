use std::str::FromStr;

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt};
use alloy::json_abi::JsonAbi;
use alloy::primitives::{keccak256, Address, Bytes, U256};

use ember_wallet_core::PortError;

/// Encode calldata for `method_signature` against a JSON ABI.
///
/// Arguments are plain strings parsed per the declared input types; only the
/// scalar types the demo surface needs are supported.
pub fn encode_calldata(
    abi_json: &str,
    method_signature: &str,
    args: &[String],
) -> Result<Bytes, PortError> {
    let abi: JsonAbi = serde_json::from_str(abi_json)
        .map_err(|e| PortError::Validation(format!("invalid abi json: {e}")))?;
    let method_name = method_signature
        .split_once('(')
        .map(|(name, _)| name)
        .unwrap_or(method_signature);
    let function = abi
        .function(method_name)
        .and_then(|overloads| overloads.first())
        .ok_or_else(|| PortError::Validation(format!("method not found: {method_name}")))?;
    if function.inputs.len() != args.len() {
        return Err(PortError::Validation(format!(
            "argument count mismatch: expected {}, got {}",
            function.inputs.len(),
            args.len()
        )));
    }

    let mut values = Vec::with_capacity(args.len());
    for (input, arg) in function.inputs.iter().zip(args) {
        let ty: DynSolType = input
            .ty
            .parse()
            .map_err(|e| PortError::Validation(format!("unsupported type '{}': {e}", input.ty)))?;
        values.push(parse_scalar(arg, &ty)?);
    }

    let encoded = function
        .abi_encode_input(&values)
        .map_err(|e| PortError::Validation(format!("abi encoding failed: {e}")))?;
    let selector = keccak256(method_signature.as_bytes());
    if encoded.len() < 4 || encoded[0..4] != selector[0..4] {
        return Err(PortError::Validation(
            "encoded selector does not match method signature".to_owned(),
        ));
    }
    Ok(Bytes::from(encoded))
}

fn parse_scalar(raw: &str, ty: &DynSolType) -> Result<DynSolValue, PortError> {
    match ty {
        DynSolType::Uint(bits) => {
            let value = U256::from_str(raw)
                .or_else(|_| U256::from_str_radix(raw.trim_start_matches("0x"), 16))
                .map_err(|e| PortError::Validation(format!("invalid uint argument '{raw}': {e}")))?;
            Ok(DynSolValue::Uint(value, *bits))
        }
        DynSolType::Address => raw
            .parse::<Address>()
            .map(DynSolValue::Address)
            .map_err(|e| PortError::Validation(format!("invalid address argument '{raw}': {e}"))),
        DynSolType::Bool => match raw {
            "true" => Ok(DynSolValue::Bool(true)),
            "false" => Ok(DynSolValue::Bool(false)),
            _ => Err(PortError::Validation(format!("invalid bool argument '{raw}'"))),
        },
        DynSolType::String => Ok(DynSolValue::String(raw.to_owned())),
        other => Err(PortError::Validation(format!(
            "argument type {other:?} is not supported"
        ))),
    }
}
