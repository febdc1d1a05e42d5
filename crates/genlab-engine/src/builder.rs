use genlab_contracts::request::{AspectRatio, DurationSeconds, EncodedImage};
use serde_json::{json, Map, Value};

/// Prompt text sent for image generation, with the ratio folded in.
pub fn image_prompt(prompt: &str, ratio: AspectRatio) -> String {
    format!(
        "{}, aspect ratio: {}, resolution: {}px",
        prompt.trim(),
        ratio.as_str(),
        ratio.resolution_hint()
    )
}

/// Prompt text sent for video generation, with the duration flag appended.
pub fn video_prompt(prompt: &str, duration: DurationSeconds) -> String {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return format!("--duration {}", duration.get());
    }
    format!("{prompt} --duration {}", duration.get())
}

pub fn image_payload(
    model: &str,
    prompt: &str,
    ratio: AspectRatio,
    attachment: Option<&EncodedImage>,
) -> Value {
    let mut body = Map::new();
    body.insert("model".to_string(), Value::String(model.to_string()));
    body.insert(
        "prompt".to_string(),
        Value::String(image_prompt(prompt, ratio)),
    );
    body.insert(
        "sequential_image_generation".to_string(),
        Value::String("disabled".to_string()),
    );
    body.insert("response_format".to_string(), Value::String("url".to_string()));
    body.insert("size".to_string(), Value::String("2K".to_string()));
    body.insert("stream".to_string(), Value::Bool(false));
    body.insert("watermark".to_string(), Value::Bool(true));
    if let Some(image) = attachment {
        body.insert("image".to_string(), Value::String(image.data_uri()));
    }
    Value::Object(body)
}

pub fn video_payload(
    model: &str,
    prompt: &str,
    duration: DurationSeconds,
    attachment: Option<&EncodedImage>,
) -> Value {
    let mut content = vec![json!({
        "type": "text",
        "text": video_prompt(prompt, duration),
    })];
    if let Some(image) = attachment {
        content.push(json!({
            "type": "image_url",
            "image_url": { "url": image.data_uri() },
        }));
    }
    json!({
        "model": model,
        "content": content,
    })
}
