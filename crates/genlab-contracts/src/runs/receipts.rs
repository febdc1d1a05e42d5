use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::job::JobStatus;
use crate::request::GenerationRequest;

pub const RECEIPT_SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptOutcome {
    pub status: JobStatus,
    pub media_url: Option<String>,
    pub error: Option<String>,
    pub attempts: u32,
    pub elapsed_s: f64,
}

/// What was sent where, for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderExchange {
    pub model: String,
    pub endpoint: String,
    pub payload: Value,
    pub task_id: Option<String>,
}

pub fn build_receipt(
    request: &GenerationRequest,
    exchange: &ProviderExchange,
    outcome: &ReceiptOutcome,
) -> Value {
    let mut root = Map::new();
    root.insert(
        "schema_version".to_string(),
        Value::Number(RECEIPT_SCHEMA_VERSION.into()),
    );
    root.insert("mode".to_string(), Value::String(request.mode().to_string()));
    root.insert(
        "request".to_string(),
        sanitize_payload(&serde_json::to_value(request).unwrap_or(Value::Null)),
    );

    let mut provider = Map::new();
    provider.insert("model".to_string(), Value::String(exchange.model.clone()));
    provider.insert(
        "endpoint".to_string(),
        Value::String(exchange.endpoint.clone()),
    );
    provider.insert("payload".to_string(), sanitize_payload(&exchange.payload));
    provider.insert(
        "task_id".to_string(),
        exchange
            .task_id
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    root.insert("provider".to_string(), Value::Object(provider));
    root.insert(
        "outcome".to_string(),
        serde_json::to_value(outcome).unwrap_or(Value::Null),
    );
    Value::Object(root)
}

/// `receipt-<millis>-<run id>.json`; the run id keeps same-millisecond runs apart.
pub fn receipt_path(dir: &Path, stamp_millis: i64, run_id: &str) -> PathBuf {
    dir.join(format!("receipt-{stamp_millis}-{run_id}.json"))
}

pub fn write_receipt(path: &Path, payload: &Value) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(payload)?)?;
    Ok(())
}

fn sanitize_payload(value: &Value) -> Value {
    match value {
        Value::String(text) if text.starts_with("data:") => Value::String("<omitted>".to_string()),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
        Value::Array(rows) => Value::Array(rows.iter().map(sanitize_payload).collect()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, row) in map {
                let lowered = key.to_ascii_lowercase();
                let is_blob = matches!(lowered.as_str(), "b64_json" | "image" | "data")
                    && row.is_string();
                if is_blob {
                    out.insert(key.clone(), Value::String("<omitted>".to_string()));
                    continue;
                }
                out.insert(key.clone(), sanitize_payload(row));
            }
            Value::Object(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{
        build_receipt, receipt_path, write_receipt, ProviderExchange, ReceiptOutcome,
        RECEIPT_SCHEMA_VERSION,
    };
    use crate::job::JobStatus;
    use crate::request::{DurationSeconds, EncodedImage, GenerationRequest};

    #[test]
    fn same_millisecond_receipts_get_distinct_paths() {
        let dir = std::path::Path::new("/tmp/receipts");
        let first = receipt_path(dir, 1_700_000_000_000, "a1");
        let second = receipt_path(dir, 1_700_000_000_000, "b2");
        assert_ne!(first, second);
    }

    #[test]
    fn receipt_builder_writes_expected_shape() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = receipt_path(temp.path(), 1_700_000_000_000, "run1");

        let request = GenerationRequest::video("ocean waves", DurationSeconds::default())
            .with_attachment(Some(EncodedImage {
                mime_type: "image/png".to_string(),
                size_bytes: 4,
                data: "iVBORw==".to_string(),
            }));
        let exchange = ProviderExchange {
            model: "seedance-1-5-pro-251215".to_string(),
            endpoint: "https://api.test/contents/generations/tasks".to_string(),
            payload: json!({
                "model": "seedance-1-5-pro-251215",
                "content": [
                    {"type": "text", "text": "ocean waves --duration 5"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,iVBORw=="}},
                ],
            }),
            task_id: Some("t1".to_string()),
        };
        let outcome = ReceiptOutcome {
            status: JobStatus::Succeeded,
            media_url: Some("https://x/v.mp4".to_string()),
            error: None,
            attempts: 4,
            elapsed_s: 12.5,
        };

        write_receipt(&path, &build_receipt(&request, &exchange, &outcome))?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert!(path.ends_with("receipt-1700000000000-run1.json"));
        assert_eq!(parsed["schema_version"], json!(RECEIPT_SCHEMA_VERSION));
        assert_eq!(parsed["mode"], json!("video"));
        assert_eq!(parsed["request"]["prompt"], json!("ocean waves"));
        assert_eq!(parsed["request"]["attachment"]["data"], json!("<omitted>"));
        assert_eq!(parsed["request"]["attachment"]["mime_type"], json!("image/png"));
        assert_eq!(
            parsed["provider"]["payload"]["content"][1]["image_url"]["url"],
            json!("<omitted>")
        );
        assert_eq!(parsed["provider"]["task_id"], json!("t1"));
        assert_eq!(parsed["outcome"]["status"], json!("succeeded"));
        assert_eq!(parsed["outcome"]["attempts"], json!(4));
        Ok(())
    }

    #[test]
    fn result_lists_under_data_survive_sanitizing() {
        let sanitized = super::sanitize_payload(&json!({"data": [{"url": "https://x/y.png"}]}));
        assert_eq!(sanitized["data"][0]["url"], json!("https://x/y.png"));
    }
}
