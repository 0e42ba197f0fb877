//! Vetrina test utilities.
//!
//! Helpers for integration testing: payload fixtures for collections,
//! page blocks and leads, plus assertion utilities for JSON responses.

use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// A collection payload builder.
#[derive(Debug, Clone)]
pub struct TestPayload {
    fields: serde_json::Map<String, JsonValue>,
}

impl TestPayload {
    fn new() -> Self {
        Self {
            fields: serde_json::Map::new(),
        }
    }

    /// Add a single field.
    pub fn with(mut self, name: &str, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Set an explicit slug.
    pub fn with_slug(self, slug: &str) -> Self {
        self.with("slug", slug)
    }

    /// Set the category.
    pub fn in_category(self, category: &str) -> Self {
        self.with("category", category)
    }

    /// Finish as a JSON object.
    pub fn build(self) -> JsonValue {
        JsonValue::Object(self.fields)
    }
}

/// A service payload (key derived from `name`).
pub fn test_service(name: &str) -> TestPayload {
    TestPayload::new()
        .with("name", name)
        .with("summary", format!("{name} for homes and businesses"))
}

/// An article payload (key derived from `title`).
pub fn test_article(title: &str) -> TestPayload {
    TestPayload::new()
        .with("title", title)
        .with("body", "<p>Article body</p>")
}

/// A gallery entry payload (keyed by `title`).
pub fn test_gallery_entry(title: &str) -> TestPayload {
    TestPayload::new()
        .with("title", title)
        .with("image", "/static/uploads/2026/01/abcd1234.jpg")
}

/// A page block.
pub fn test_block(block_type: &str, data: JsonValue) -> JsonValue {
    json!({ "type": block_type, "data": data })
}

/// A valid hero block.
pub fn hero_block(title: &str) -> JsonValue {
    test_block("hero", json!({ "title": title }))
}

/// A valid FAQ block with one question per pair.
pub fn faq_block(pairs: &[(&str, &str)]) -> JsonValue {
    let items: Vec<JsonValue> = pairs
        .iter()
        .map(|(q, a)| json!({ "question": q, "answer": a }))
        .collect();
    test_block("faq", json!({ "items": items }))
}

/// A valid contact-form submission.
pub fn test_lead(name: &str) -> JsonValue {
    json!({
        "name": name,
        "email": "visitor@example.com",
        "phone": "01234 567890",
        "message": "Please call me back about a quote.",
    })
}

/// A client address unique to this call, for isolating rate-limit buckets.
pub fn unique_client_ip() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2])
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON error body mentions `needle`.
    pub fn error_contains(value: &Value, needle: &str) {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or_default();
        assert!(
            message.contains(needle),
            "Expected error containing '{needle}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }
}
