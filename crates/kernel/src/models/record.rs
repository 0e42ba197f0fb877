//! Collection kinds and their records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The three listable record families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Service,
    Article,
    Gallery,
}

/// Longest value accepted for the `title` column.
pub const MAX_TITLE_LEN: usize = 400;

/// Longest value accepted for the `category` column.
pub const MAX_CATEGORY_LEN: usize = 200;

/// How a kind picks and fills its unique key and denormalized columns.
#[derive(Debug)]
pub struct KindSpec {
    /// Payload field holding the unique key.
    pub key_field: &'static str,
    /// Longest accepted key, in characters.
    pub max_key_len: usize,
    /// Payload field the key is slugified from when `key_field` is absent.
    /// `None` means the key field is mandatory.
    pub derive_from: Option<&'static str>,
    /// Payload field copied into the `title` column.
    pub title_field: &'static str,
    /// Payload field copied into the `category` column.
    pub category_field: &'static str,
}

const SERVICE: KindSpec = KindSpec {
    key_field: "slug",
    max_key_len: 200,
    derive_from: Some("name"),
    title_field: "name",
    category_field: "category",
};

const ARTICLE: KindSpec = KindSpec {
    key_field: "slug",
    max_key_len: 200,
    derive_from: Some("title"),
    title_field: "title",
    category_field: "category",
};

const GALLERY: KindSpec = KindSpec {
    key_field: "title",
    max_key_len: 400,
    derive_from: None,
    title_field: "title",
    category_field: "category",
};

impl CollectionKind {
    /// Every kind, in route order.
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Service,
        CollectionKind::Article,
        CollectionKind::Gallery,
    ];

    /// Key and denormalization rules for this kind.
    pub fn spec(self) -> &'static KindSpec {
        match self {
            CollectionKind::Service => &SERVICE,
            CollectionKind::Article => &ARTICLE,
            CollectionKind::Gallery => &GALLERY,
        }
    }

    /// Table name. Static, so safe to interpolate into SQL.
    pub fn table(self) -> &'static str {
        match self {
            CollectionKind::Service => "services",
            CollectionKind::Article => "articles",
            CollectionKind::Gallery => "gallery",
        }
    }

    /// Resolve a URL segment (`services`, `articles`/`blogs`, `gallery`).
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "services" => Some(CollectionKind::Service),
            "articles" | "blogs" => Some(CollectionKind::Article),
            "gallery" => Some(CollectionKind::Gallery),
            _ => None,
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// A stored collection record.
///
/// `title` and `category` mirror fields of `data`; they are rewritten from
/// the payload on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub key: String,
    pub title: String,
    pub category: String,
    pub data: Value,
}
