// crates/cli/src/utils.rs

use serde_json::{Map, Value};

use daemon::JobFailure;

pub(crate) fn parse_param(s: &str) -> std::result::Result<(String, String), String> {
    let mut parts = s.splitn(2, '=');
    let name = parts
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| format!("invalid param: {s} (expected KEY=VALUE)"))?
        .to_string();
    let value = parts
        .next()
        .ok_or_else(|| format!("invalid param: {s} (expected KEY=VALUE)"))?
        .to_string();
    Ok((name, value))
}

/// Collects `KEY=VALUE` pairs into a JSON object; `None` when empty.
pub(crate) fn params_object(pairs: &[(String, String)]) -> Option<Value> {
    if pairs.is_empty() {
        return None;
    }
    let map: Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Some(Value::Object(map))
}

pub(crate) fn param_str<'a>(params: Option<&'a Value>, key: &str) -> Result<&'a str, JobFailure> {
    params
        .and_then(|p| p.get(key))
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing parameter: {key}").into())
}

/// Reads a numeric parameter given either as a number or a decimal string.
pub(crate) fn param_u64(params: Option<&Value>, key: &str) -> Result<u64, JobFailure> {
    match params.and_then(|p| p.get(key)) {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| format!("invalid parameter {key}: {n}").into()),
        Some(Value::String(s)) => s
            .parse()
            .map_err(|e| format!("invalid parameter {key}: {e}").into()),
        _ => Err(format!("missing parameter: {key}").into()),
    }
}
