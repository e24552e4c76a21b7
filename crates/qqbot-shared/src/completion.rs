//! Tolerant extraction from OpenAI-compatible response bodies.
//!
//! The hosted models behind the plugins disagree on where the answer
//! lives: plain string content, a list of typed content blocks, a bare
//! string `message`, or OCR-style `text`/`ocr`/`result` fields on the
//! choice. These helpers try each shape in turn.

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Invalid response from model API: {0}")]
    NoChoices(String),

    #[error("No text found in choice: {0}")]
    NoText(String),

    #[error("No image found in response")]
    NoImage,
}

/// Text of the first choice of a chat completion body.
pub fn extract_completion_text(body: &Value) -> Result<String, ExtractError> {
    let Some(choice) = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    else {
        let detail = body.get("error").unwrap_or(body);
        return Err(ExtractError::NoChoices(detail.to_string()));
    };

    if let Some(Value::String(message)) = choice.get("message") {
        return Ok(message.clone());
    }

    let content = match (choice.get("message"), choice.get("content"), choice.get("delta")) {
        (Some(message), _, _) => message.get("content"),
        (None, Some(content), _) => Some(content),
        (None, None, Some(delta)) => delta.get("content"),
        (None, None, None) => None,
    };

    match content {
        Some(Value::String(text)) => return Ok(text.clone()),
        Some(Value::Array(blocks)) => {
            let joined: String = blocks.iter().filter_map(block_text).collect();
            if !joined.is_empty() {
                return Ok(joined);
            }
        }
        _ => {}
    }

    ["text", "ocr", "result"]
        .iter()
        .filter_map(|field| choice.get(*field).and_then(Value::as_str))
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ExtractError::NoText(choice.to_string()))
}

fn block_text(block: &Value) -> Option<&str> {
    let block = block.as_object()?;
    let text = block.get("text").and_then(Value::as_str).filter(|t| !t.is_empty());

    if block.get("type").and_then(Value::as_str) == Some("text") {
        return text.or_else(|| {
            block
                .get("content")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
        });
    }

    if block.contains_key("text") {
        return text;
    }

    block.get("content").and_then(Value::as_str)
}

/// URL of the first generated image (`images[0].url`).
pub fn extract_image_url(body: &Value) -> Result<String, ExtractError> {
    body.get("images")
        .and_then(Value::as_array)
        .and_then(|images| images.first())
        .and_then(|image| image.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ExtractError::NoImage)
}
