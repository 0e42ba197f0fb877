//! Block type catalog and server-side block validation.
//!
//! Provides:
//! - `FieldKind` / `FieldDefinition`: the primitive shapes a block field can take
//! - `BlockTypeDefinition`: schema and label for a single block type
//! - `BlockTypeRegistry`: the closed catalog, with validation
//! - `sanitize_html`: HTML sanitization via ammonia for long-text fields

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Primitive shape of a block field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Multi-line text; may carry basic HTML, sanitized on save.
    Textarea,
    /// One image reference (URL).
    Image,
    /// A list of image references.
    Images,
    /// A number.
    Number,
    /// A list of sub-items, each described by `item_fields`.
    Items,
}

/// One field of a block type.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub item_fields: Vec<FieldDefinition>,
}

impl FieldDefinition {
    fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            item_fields: Vec::new(),
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

fn text(name: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(name, label, FieldKind::Text)
}

fn textarea(name: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(name, label, FieldKind::Textarea)
}

fn image(name: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(name, label, FieldKind::Image)
}

fn images(name: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(name, label, FieldKind::Images)
}

fn number(name: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(name, label, FieldKind::Number)
}

fn items(name: &str, label: &str, fields: Vec<FieldDefinition>) -> FieldDefinition {
    let mut def = FieldDefinition::new(name, label, FieldKind::Items);
    def.item_fields = fields;
    def
}

/// Definition of a single block type.
#[derive(Debug, Clone, Serialize)]
pub struct BlockTypeDefinition {
    /// Machine name (e.g. "hero", "faq").
    pub type_name: String,
    /// Human-readable label.
    pub label: String,
    pub fields: Vec<FieldDefinition>,
}

/// Registry of block type definitions, keyed by type name.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct BlockTypeRegistry {
    types: BTreeMap<String, BlockTypeDefinition>,
}

impl Default for BlockTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    /// Create a registry with the standard marketing-site blocks.
    pub fn with_standard_types() -> Self {
        let mut registry = Self::new();
        registry.register_standard_types();
        registry
    }

    /// Register a single block type definition.
    pub fn register(&mut self, type_name: &str, label: &str, fields: Vec<FieldDefinition>) {
        self.types.insert(
            type_name.to_string(),
            BlockTypeDefinition {
                type_name: type_name.to_string(),
                label: label.to_string(),
                fields,
            },
        );
    }

    /// Look up a block type by name.
    pub fn get(&self, type_name: &str) -> Option<&BlockTypeDefinition> {
        self.types.get(type_name)
    }

    /// Check whether a block type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Return the number of registered block types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn register_standard_types(&mut self) {
        self.register(
            "hero",
            "Hero",
            vec![
                text("title", "Title").required(),
                textarea("subtitle", "Subtitle"),
                image("image", "Background image"),
                text("cta_label", "Button label"),
                text("cta_link", "Button link"),
            ],
        );

        self.register(
            "rich_text",
            "Rich text",
            vec![text("heading", "Heading"), textarea("body", "Body").required()],
        );

        self.register(
            "image",
            "Image",
            vec![
                image("image", "Image").required(),
                text("caption", "Caption"),
                text("alt", "Alt text"),
            ],
        );

        self.register(
            "gallery",
            "Gallery",
            vec![text("title", "Title"), images("images", "Images").required()],
        );

        self.register(
            "services_grid",
            "Services grid",
            vec![
                text("title", "Title"),
                textarea("intro", "Introduction"),
                items(
                    "items",
                    "Services",
                    vec![
                        text("name", "Name").required(),
                        textarea("description", "Description"),
                        image("image", "Image"),
                        text("link", "Link"),
                    ],
                )
                .required(),
            ],
        );

        self.register(
            "features",
            "Features",
            vec![
                text("title", "Title"),
                items(
                    "items",
                    "Features",
                    vec![
                        text("title", "Title").required(),
                        textarea("description", "Description"),
                        text("icon", "Icon"),
                    ],
                )
                .required(),
            ],
        );

        self.register(
            "faq",
            "FAQ",
            vec![
                text("title", "Title"),
                items(
                    "items",
                    "Questions",
                    vec![
                        text("question", "Question").required(),
                        textarea("answer", "Answer").required(),
                    ],
                )
                .required(),
            ],
        );

        self.register(
            "testimonials",
            "Testimonials",
            vec![
                text("title", "Title"),
                items(
                    "items",
                    "Testimonials",
                    vec![
                        textarea("quote", "Quote").required(),
                        text("author", "Author").required(),
                        text("location", "Location"),
                        number("rating", "Rating"),
                    ],
                )
                .required(),
            ],
        );

        self.register(
            "stats",
            "Stats",
            vec![
                items(
                    "items",
                    "Figures",
                    vec![
                        text("label", "Label").required(),
                        number("value", "Value").required(),
                        text("suffix", "Suffix"),
                    ],
                )
                .required(),
            ],
        );

        self.register(
            "cta",
            "Call to action",
            vec![
                text("title", "Title").required(),
                textarea("text", "Text"),
                text("button_label", "Button label"),
                text("button_link", "Button link"),
            ],
        );

        self.register(
            "contact_form",
            "Contact form",
            vec![
                text("title", "Title"),
                textarea("intro", "Introduction"),
                text("success_message", "Success message"),
            ],
        );
    }

    /// Validate one block (`{ "type": ..., "data": { ... } }`).
    ///
    /// Returns a list of validation error messages. An empty list means the
    /// block is valid. Fields not declared by the type are ignored.
    pub fn validate_block(&self, block: &Value) -> Vec<String> {
        let mut errors = Vec::new();

        let Some(type_name) = block.get("type").and_then(Value::as_str) else {
            errors.push("block is missing a string 'type'".to_string());
            return errors;
        };

        let Some(definition) = self.get(type_name) else {
            errors.push(format!("unknown block type '{type_name}'"));
            return errors;
        };

        let empty = Map::new();
        let data = match block.get("data") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => {
                errors.push(format!("{type_name}: 'data' must be an object"));
                return errors;
            }
        };

        validate_fields(&definition.fields, data, type_name, &mut errors);
        errors
    }

    /// Sanitize all long-text content in an array of blocks in-place.
    ///
    /// Walks each block and applies `ammonia::clean()` to textarea fields,
    /// including those nested inside item lists.
    pub fn sanitize_blocks(&self, blocks: &mut [Value]) {
        for block in blocks.iter_mut() {
            let Some(definition) = block
                .get("type")
                .and_then(Value::as_str)
                .and_then(|t| self.get(t))
            else {
                continue;
            };

            if let Some(data) = block.get_mut("data").and_then(Value::as_object_mut) {
                sanitize_fields(&definition.fields, data);
            }
        }
    }
}

fn validate_fields(
    fields: &[FieldDefinition],
    data: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<String>,
) {
    for field in fields {
        let value = data.get(&field.name).filter(|v| !is_blank(v));
        let Some(value) = value else {
            if field.required {
                errors.push(format!("{path}: missing required field '{}'", field.name));
            }
            continue;
        };

        let field_path = format!("{path}.{}", field.name);
        match field.kind {
            FieldKind::Text | FieldKind::Textarea | FieldKind::Image => {
                if !value.is_string() {
                    errors.push(format!("{field_path}: expected a string"));
                }
            }
            FieldKind::Number => {
                if !value.is_number() {
                    errors.push(format!("{field_path}: expected a number"));
                }
            }
            FieldKind::Images => match value.as_array() {
                Some(list) if list.iter().all(Value::is_string) => {}
                _ => errors.push(format!("{field_path}: expected a list of image URLs")),
            },
            FieldKind::Items => {
                let Some(list) = value.as_array() else {
                    errors.push(format!("{field_path}: expected a list of items"));
                    continue;
                };
                for (i, item) in list.iter().enumerate() {
                    let item_path = format!("{field_path}[{i}]");
                    match item.as_object() {
                        Some(map) => validate_fields(&field.item_fields, map, &item_path, errors),
                        None => errors.push(format!("{item_path}: expected an object")),
                    }
                }
            }
        }
    }
}

fn sanitize_fields(fields: &[FieldDefinition], data: &mut Map<String, Value>) {
    for field in fields {
        let Some(value) = data.get_mut(&field.name) else {
            continue;
        };
        match field.kind {
            FieldKind::Textarea => {
                if let Some(clean) = value.as_str().map(sanitize_html) {
                    *value = Value::String(clean);
                }
            }
            FieldKind::Items => {
                if let Some(list) = value.as_array_mut() {
                    for item in list.iter_mut().filter_map(Value::as_object_mut) {
                        sanitize_fields(&field.item_fields, item);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Null, whitespace-only strings and empty lists count as absent.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

/// Sanitize HTML input using ammonia with default settings.
///
/// Strips dangerous elements like `<script>`, event handlers, and
/// other XSS vectors while preserving safe formatting tags.
pub fn sanitize_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_all_standard_types() {
        let registry = BlockTypeRegistry::with_standard_types();
        assert_eq!(registry.len(), 11);

        for name in [
            "hero",
            "rich_text",
            "image",
            "gallery",
            "services_grid",
            "features",
            "faq",
            "testimonials",
            "stats",
            "cta",
            "contact_form",
        ] {
            assert!(
                registry.contains(name),
                "expected block type '{name}' to be registered"
            );
        }
    }

    #[test]
    fn catalog_serializes_keyed_by_type() {
        let registry = BlockTypeRegistry::with_standard_types();
        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["faq"]["label"], "FAQ");
        let items = &json["faq"]["fields"][1];
        assert_eq!(items["kind"], "items");
        assert_eq!(items["item_fields"][0]["name"], "question");
        assert_eq!(json["gallery"]["fields"][1]["kind"], "images");
    }

    #[test]
    fn validate_valid_hero() {
        let registry = BlockTypeRegistry::with_standard_types();
        let block = json!({
            "type": "hero",
            "data": { "title": "Welcome", "image": "/static/uploads/hero.jpg" }
        });
        let errors = registry.validate_block(&block);
        assert!(errors.is_empty(), "Expected no errors, got: {errors:?}");
    }

    #[test]
    fn validate_valid_faq() {
        let registry = BlockTypeRegistry::with_standard_types();
        let block = json!({
            "type": "faq",
            "data": {
                "items": [
                    { "question": "Do you quote for free?", "answer": "Yes." },
                    { "question": "Are you insured?", "answer": "<p>Fully.</p>" }
                ]
            }
        });
        let errors = registry.validate_block(&block);
        assert!(errors.is_empty(), "Expected no errors, got: {errors:?}");
    }

    #[test]
    fn reject_unknown_block_type() {
        let registry = BlockTypeRegistry::with_standard_types();
        let errors = registry.validate_block(&json!({ "type": "carousel", "data": {} }));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("unknown block type 'carousel'"));
    }

    #[test]
    fn reject_missing_type() {
        let registry = BlockTypeRegistry::with_standard_types();
        let errors = registry.validate_block(&json!({ "data": {} }));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'type'"));
    }

    #[test]
    fn missing_required_field() {
        let registry = BlockTypeRegistry::with_standard_types();
        let errors = registry.validate_block(&json!({ "type": "cta", "data": { "text": "Call" } }));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("missing required field 'title'"));
    }

    #[test]
    fn missing_data_counts_as_empty() {
        let registry = BlockTypeRegistry::with_standard_types();
        assert!(
            registry
                .validate_block(&json!({ "type": "contact_form" }))
                .is_empty()
        );
        assert_eq!(registry.validate_block(&json!({ "type": "image" })).len(), 1);
    }

    #[test]
    fn wrong_shapes_are_reported() {
        let registry = BlockTypeRegistry::with_standard_types();
        let errors = registry.validate_block(&json!({
            "type": "gallery",
            "data": { "title": 5, "images": ["a.jpg", 3] }
        }));
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("gallery.title")));
        assert!(errors.iter().any(|e| e.contains("gallery.images")));
    }

    #[test]
    fn nested_item_errors_carry_index() {
        let registry = BlockTypeRegistry::with_standard_types();
        let errors = registry.validate_block(&json!({
            "type": "stats",
            "data": { "items": [
                { "label": "Years", "value": 12 },
                { "label": "Jobs", "value": "many" },
                "oops"
            ] }
        }));
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("stats.items[1].value"));
        assert!(errors[1].contains("stats.items[2]"));
    }

    #[test]
    fn non_object_data_is_rejected() {
        let registry = BlockTypeRegistry::with_standard_types();
        let errors = registry.validate_block(&json!({ "type": "hero", "data": "title" }));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'data' must be an object"));
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let registry = BlockTypeRegistry::with_standard_types();
        let errors = registry.validate_block(&json!({
            "type": "cta",
            "data": { "title": "Book now", "theme": "dark" }
        }));
        assert!(errors.is_empty());
    }

    #[test]
    fn sanitize_html_strips_script() {
        let output = sanitize_html("<p>Hello</p><script>alert('xss')</script>");
        assert!(!output.contains("<script>"));
        assert!(output.contains("<p>Hello</p>"));
    }

    #[test]
    fn sanitize_html_preserves_safe_tags() {
        let input = "<p>Hello <strong>world</strong></p>";
        assert_eq!(sanitize_html(input), input);
    }

    #[test]
    fn sanitize_blocks_cleans_textarea_and_nested_items() {
        let registry = BlockTypeRegistry::with_standard_types();
        let mut blocks = vec![
            json!({
                "type": "rich_text",
                "data": { "heading": "About", "body": "<p>Hi</p><script>bad()</script>" }
            }),
            json!({
                "type": "testimonials",
                "data": { "items": [
                    { "quote": "Great<img src=x onerror=alert(1)>", "author": "Sam" }
                ] }
            }),
        ];
        registry.sanitize_blocks(&mut blocks);

        let body = blocks[0]["data"]["body"].as_str().unwrap();
        assert!(!body.contains("<script>"));
        assert!(body.contains("<p>Hi</p>"));
        let quote = blocks[1]["data"]["items"][0]["quote"].as_str().unwrap();
        assert!(!quote.contains("onerror"));
        assert_eq!(blocks[1]["data"]["items"][0]["author"], "Sam");
    }

    #[test]
    fn sanitize_blocks_leaves_plain_text_fields() {
        let registry = BlockTypeRegistry::with_standard_types();
        let mut blocks = vec![json!({
            "type": "image",
            "data": { "image": "https://example.com/a.jpg", "caption": "<b>Kitchen</b>" }
        })];
        let before = blocks.clone();
        registry.sanitize_blocks(&mut blocks);
        assert_eq!(blocks, before);
    }

    #[test]
    fn default_registry_is_empty() {
        let registry = BlockTypeRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn custom_block_type_registration() {
        let mut registry = BlockTypeRegistry::new();
        registry.register("map", "Map", vec![text("address", "Address").required()]);
        assert!(registry.contains("map"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.validate_block(&json!({ "type": "map", "data": {} })).len(),
            1
        );
    }
}
