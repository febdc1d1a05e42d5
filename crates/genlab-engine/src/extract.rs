//! Ordered extraction strategies for heterogeneous response payloads.
//!
//! The same value can live in several places depending on the server build
//! (`status` vs `state`, top level vs under `data`, ...). Each location is a
//! [`Probe`]; an [`Extractor`] tries its probes in order and returns the first
//! hit. Supporting a new response shape means adding a probe, not touching the
//! control flow that consumes the value.

use serde_json::Value;

pub struct Probe<T> {
    pub name: &'static str,
    pub read: fn(&Value) -> Option<T>,
}

impl<T> Probe<T> {
    pub const fn new(name: &'static str, read: fn(&Value) -> Option<T>) -> Self {
        Self { name, read }
    }
}

pub struct Extractor<T> {
    probes: Vec<Probe<T>>,
}

impl<T> Extractor<T> {
    pub fn new(probes: Vec<Probe<T>>) -> Self {
        Self { probes }
    }

    pub fn with(mut self, probe: Probe<T>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn extract(&self, payload: &Value) -> Option<T> {
        self.extract_with_source(payload).map(|(_, value)| value)
    }

    /// Like [`Extractor::extract`], also naming the probe that matched.
    pub fn extract_with_source(&self, payload: &Value) -> Option<(&'static str, T)> {
        self.probes
            .iter()
            .find_map(|probe| (probe.read)(payload).map(|value| (probe.name, value)))
    }

    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|probe| probe.name).collect()
    }
}

/// The task record: the `data` object when the server wraps it, else the root.
pub fn task_info(payload: &Value) -> &Value {
    match payload.get("data") {
        Some(inner) if inner.is_object() => inner,
        _ => payload,
    }
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn nested<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

pub fn task_id() -> Extractor<String> {
    Extractor::new(vec![
        Probe::new("id", |payload| non_empty_text(payload.get("id"))),
        Probe::new("data.id", |payload| non_empty_text(nested(payload, &["data", "id"]))),
    ])
}

/// First image URL of a synchronous generation response.
pub fn image_result_url() -> Extractor<String> {
    Extractor::new(vec![Probe::new("data[].url", |payload| {
        payload
            .get("data")?
            .as_array()?
            .iter()
            .find_map(|row| non_empty_text(row.get("url")))
    })])
}

/// Raw status text, lowercased.
pub fn task_status() -> Extractor<String> {
    fn lowered(value: Option<&Value>) -> Option<String> {
        non_empty_text(value).map(|text| text.to_ascii_lowercase())
    }
    Extractor::new(vec![
        Probe::new("status", |payload| lowered(task_info(payload).get("status"))),
        Probe::new("state", |payload| lowered(task_info(payload).get("state"))),
    ])
}

pub fn task_progress() -> Extractor<u8> {
    Extractor::new(vec![
        Probe::new("progress", |payload| {
            task_info(payload).get("progress").and_then(progress_percent)
        }),
        Probe::new("root.progress", |payload| {
            payload.get("progress").and_then(progress_percent)
        }),
    ])
}

pub fn task_media_url() -> Extractor<String> {
    Extractor::new(vec![
        Probe::new("url", |payload| non_empty_text(task_info(payload).get("url"))),
        Probe::new("video_url", |payload| {
            non_empty_text(task_info(payload).get("video_url"))
        }),
        Probe::new("content.video_url", |payload| {
            non_empty_text(nested(task_info(payload), &["content", "video_url"]))
        }),
        Probe::new("result.url", |payload| {
            non_empty_text(nested(task_info(payload), &["result", "url"]))
        }),
    ])
}

pub fn task_failure_reason() -> Extractor<String> {
    Extractor::new(vec![
        Probe::new("error.message", |payload| {
            non_empty_text(nested(task_info(payload), &["error", "message"]))
        }),
        Probe::new("error", |payload| non_empty_text(task_info(payload).get("error"))),
        Probe::new("failure_reason", |payload| {
            non_empty_text(task_info(payload).get("failure_reason"))
        }),
        Probe::new("message", |payload| non_empty_text(task_info(payload).get("message"))),
    ])
}

/// Human-readable message from an error response body.
pub fn server_message() -> Extractor<String> {
    Extractor::new(vec![
        Probe::new("error.message", |payload| {
            non_empty_text(nested(payload, &["error", "message"]))
        }),
        Probe::new("error", |payload| non_empty_text(payload.get("error"))),
        Probe::new("message", |payload| non_empty_text(payload.get("message"))),
    ])
}

/// Reads a progress value as a 0–100 percentage.
///
/// Fractions in (0, 1] are scaled; whole numbers pass through; negatives and
/// non-numbers are treated as absent.
pub fn progress_percent(value: &Value) -> Option<u8> {
    let (number, fractional) = match value {
        Value::Number(raw) => (raw.as_f64()?, raw.is_f64()),
        Value::String(raw) => {
            let text = raw.trim().trim_end_matches('%').trim();
            (text.parse::<f64>().ok()?, text.contains('.'))
        }
        _ => return None,
    };
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    let percent = if fractional && number > 0.0 && number <= 1.0 {
        (number * 100.0).round()
    } else {
        number.round()
    };
    Some(percent.min(100.0) as u8)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn task_id_checks_top_level_then_data() {
        assert_eq!(task_id().extract(&json!({"id": "t1"})), Some("t1".to_string()));
        assert_eq!(
            task_id().extract_with_source(&json!({"data": {"id": "t2"}})),
            Some(("data.id", "t2".to_string()))
        );
        assert_eq!(task_id().extract(&json!({"id": "  "})), None);
        assert_eq!(task_id().extract(&json!({"result": "ok"})), None);
    }

    #[test]
    fn image_result_takes_first_url() {
        let payload = json!({"data": [{"url": "https://x/y.png"}, {"url": "https://x/z.png"}]});
        assert_eq!(image_result_url().extract(&payload), Some("https://x/y.png".to_string()));
        assert_eq!(image_result_url().extract(&json!({"data": []})), None);
        assert_eq!(image_result_url().extract(&json!({})), None);
    }

    #[test]
    fn status_prefers_wrapped_record() {
        assert_eq!(
            task_status().extract(&json!({"data": {"state": "Running"}, "status": "ignored"})),
            Some("running".to_string())
        );
        assert_eq!(
            task_status().extract(&json!({"status": "SUCCEEDED"})),
            Some("succeeded".to_string())
        );
        assert_eq!(task_status().extract(&json!({"progress": 3})), None);
    }

    #[test]
    fn progress_scales_fractions_only() {
        assert_eq!(progress_percent(&json!(0.42)), Some(42));
        assert_eq!(progress_percent(&json!(77)), Some(77));
        assert_eq!(progress_percent(&json!(1)), Some(1));
        assert_eq!(progress_percent(&json!(1.0)), Some(100));
        assert_eq!(progress_percent(&json!("0.5")), Some(50));
        assert_eq!(progress_percent(&json!("64%")), Some(64));
        assert_eq!(progress_percent(&json!(250)), Some(100));
        assert_eq!(progress_percent(&json!(-3)), None);
        assert_eq!(progress_percent(&json!(null)), None);
    }

    #[test]
    fn progress_falls_back_to_root_field() {
        assert_eq!(
            task_progress().extract(&json!({"data": {"status": "running"}, "progress": 0.3})),
            Some(30)
        );
    }

    #[test]
    fn media_url_probe_order() {
        let extractor = task_media_url();
        assert_eq!(
            extractor.probe_names(),
            vec!["url", "video_url", "content.video_url", "result.url"]
        );
        assert_eq!(
            extractor.extract(&json!({"content": {"video_url": "https://x/a.mp4"}})),
            Some("https://x/a.mp4".to_string())
        );
        assert_eq!(
            extractor.extract(&json!({"data": {"result": {"url": "https://x/b.mp4"}}})),
            Some("https://x/b.mp4".to_string())
        );
        assert_eq!(
            extractor.extract(&json!({"url": "https://x/c.mp4", "video_url": "https://x/d.mp4"})),
            Some("https://x/c.mp4".to_string())
        );
        assert_eq!(extractor.extract(&json!({"status": "succeeded"})), None);
    }

    #[test]
    fn failure_reason_probe_order() {
        let extractor = task_failure_reason();
        assert_eq!(
            extractor.extract(&json!({"error": {"message": "nsfw"}, "message": "generic"})),
            Some("nsfw".to_string())
        );
        assert_eq!(
            extractor.extract(&json!({"failure_reason": "quota", "message": "generic"})),
            Some("quota".to_string())
        );
        assert_eq!(
            extractor.extract(&json!({"message": "generic"})),
            Some("generic".to_string())
        );
        assert_eq!(extractor.extract(&json!({"status": "failed"})), None);
    }

    #[test]
    fn extractors_accept_new_shapes() {
        let extractor = task_media_url().with(Probe::new("output[0]", |payload| {
            payload.get("output")?.get(0)?.as_str().map(str::to_string)
        }));
        assert_eq!(
            extractor.extract(&json!({"output": ["https://x/e.mp4"]})),
            Some("https://x/e.mp4".to_string())
        );
    }
}
