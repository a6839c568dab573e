//! Wire encodings for the extended value types the gateway relays or emits.
//!
//! Node results are full of amounts such as `0.00012340` or `21000000.00000000`.
//! `serde_json` is built with `arbitrary_precision`, so a JSON number keeps
//! its literal text from the upstream body to the gateway's response. Decimals
//! the gateway produces itself go through [`encode_decimal`] and are emitted
//! the same way: as JSON numbers whose text is exactly the decimal's digits.
//!
//! Timestamps are emitted as RFC 3339 (ISO-8601) strings in UTC, with
//! sub-second digits only when the value has them.

use crate::error::CodecError;
use crate::rpc::RpcResponse;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Builds a JSON number from decimal text without going through `f64`.
pub fn encode_decimal(text: &str) -> Result<Value, CodecError> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value @ Value::Number(_)) => Ok(value),
        _ => Err(CodecError::InvalidDecimal(text.to_string())),
    }
}

/// Exact decimal text of a number, or of a string holding one.
pub fn decode_decimal(value: &Value) -> Result<String, CodecError> {
    match value {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => encode_decimal(s).map(|v| v.to_string()),
        other => Err(CodecError::InvalidDecimal(other.to_string())),
    }
}

/// Renders microseconds as milliseconds with three fixed decimal places.
pub fn micros_as_millis(us: u64) -> Value {
    let text = format!("{}.{:03}", us / 1000, us % 1000);
    // digits and a single dot always parse
    encode_decimal(&text).unwrap_or(Value::Null)
}

pub fn encode_timestamp(ts: &DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn decode_timestamp(value: &Value) -> Result<DateTime<Utc>, CodecError> {
    let text = value
        .as_str()
        .ok_or_else(|| CodecError::InvalidTimestamp(value.to_string()))?;
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| CodecError::InvalidTimestamp(value.to_string()))
}

/// Serializes a response body for the wire.
pub fn to_body(resp: &RpcResponse) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_decimal_text_survives_roundtrip() {
        for text in ["0.00012340", "21000000.00000000", "-0.5", "123456789012345678901234567890.1"] {
            let value = encode_decimal(text).unwrap();
            let wire = serde_json::to_string(&value).unwrap();
            assert_eq!(wire, text);

            let back: Value = serde_json::from_str(&wire).unwrap();
            assert_eq!(decode_decimal(&back).unwrap(), text);
        }
    }

    #[test]
    fn test_relayed_amounts_keep_text_and_key_order() {
        let body = r#"{"result":{"total_amount":21000000.00000000,"fee":0.00001000},"error":null,"id":1}"#;
        let resp: RpcResponse = serde_json::from_str(body).unwrap();
        let wire = String::from_utf8(to_body(&resp).unwrap()).unwrap();
        assert_eq!(wire, body);
    }

    #[test]
    fn test_decimal_from_string() {
        assert_eq!(decode_decimal(&json!("0.10")).unwrap(), "0.10");
        assert!(decode_decimal(&json!("ten")).is_err());
        assert!(decode_decimal(&json!(true)).is_err());
        assert!(encode_decimal("1.2.3").is_err());
    }

    #[test]
    fn test_micros_as_millis() {
        assert_eq!(micros_as_millis(1_234).to_string(), "1.234");
        assert_eq!(micros_as_millis(7).to_string(), "0.007");
        assert_eq!(micros_as_millis(0).to_string(), "0.000");
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2023, 7, 1, 12, 30, 5).unwrap();
        let value = encode_timestamp(&ts);
        assert_eq!(value, json!("2023-07-01T12:30:05Z"));
        assert_eq!(decode_timestamp(&value).unwrap(), ts);

        let precise = ts + chrono::Duration::milliseconds(250);
        let value = encode_timestamp(&precise);
        assert_eq!(value, json!("2023-07-01T12:30:05.250Z"));
        let back = decode_timestamp(&value).unwrap();
        assert_eq!(encode_timestamp(&back), value);
    }

    #[test]
    fn test_timestamp_offsets_normalize_to_utc() {
        let ts = decode_timestamp(&json!("2023-07-01T14:30:05+02:00")).unwrap();
        assert_eq!(encode_timestamp(&ts), json!("2023-07-01T12:30:05Z"));
        assert!(decode_timestamp(&json!(1688214605)).is_err());
    }
}
