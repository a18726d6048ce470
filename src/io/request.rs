//! Read valuation and prediction requests from JSON files.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::AppError;

/// Read a JSON request body. The top level must be an object.
pub fn read_request_json(path: &Path) -> Result<Value, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read request '{}': {e}", path.display())))?;
    parse_request_json(&text)
        .map_err(|msg| AppError::new(2, format!("Invalid request '{}': {msg}", path.display())))
}

fn parse_request_json(text: &str) -> Result<Value, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("top-level JSON value must be an object".to_string());
    }
    Ok(value)
}

/// Fill `macro.rate_10y_bp` unless the request already carries one.
///
/// Returns `true` when the request was changed.
pub fn fill_rate_10y(request: &mut Value, rate_bp: f64) -> bool {
    let Some(obj) = request.as_object_mut() else {
        return false;
    };
    let macro_block = obj
        .entry("macro")
        .or_insert_with(|| Value::Object(Default::default()));
    if macro_block.is_null() {
        *macro_block = Value::Object(Default::default());
    }
    let Some(m) = macro_block.as_object_mut() else {
        return false;
    };
    if m.get("rate_10y_bp").is_some_and(|v| !v.is_null()) {
        return false;
    }
    m.insert("rate_10y_bp".to_string(), Value::from(rate_bp));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn rejects_non_object_bodies() {
        assert!(parse_request_json("[1, 2]").is_err());
        assert!(parse_request_json("{not json").is_err());
        assert!(parse_request_json(r#"{"mode": "equity"}"#).is_ok());
    }

    #[test]
    fn reads_from_disk() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"mode": "credit", "loan_amount": 1000}}"#).unwrap();
        let v = read_request_json(f.path()).unwrap();
        assert_eq!(v["mode"], "credit");

        let err = read_request_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn live_rate_never_overrides_request() {
        let mut req = json!({"mode": "equity"});
        assert!(fill_rate_10y(&mut req, 425.0));
        assert_eq!(req["macro"]["rate_10y_bp"], 425.0);

        let mut req = json!({"macro": {"rate_10y_bp": 300.0, "discount_rate_delta_bps": 25}});
        assert!(!fill_rate_10y(&mut req, 425.0));
        assert_eq!(req["macro"]["rate_10y_bp"], 300.0);

        let mut req = json!({"macro": null});
        assert!(fill_rate_10y(&mut req, 410.0));
        assert_eq!(req["macro"]["rate_10y_bp"], 410.0);
    }
}
