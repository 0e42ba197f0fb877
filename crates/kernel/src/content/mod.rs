//! Content management module.
//!
//! This module provides:
//! - ContentStore: singleton JSON documents by key
//! - CollectionManager: keyed record sets (services, articles, gallery)
//! - BlockTypeRegistry: block catalog and validation for the page builder
//! - PageComposer: pages as ordered block lists

pub mod block_types;
mod collection;
mod page;
pub mod slug;
mod store;

pub use block_types::{BlockTypeDefinition, BlockTypeRegistry, FieldDefinition, FieldKind};
pub use collection::{CollectionManager, ReplaceSummary, UpsertResult};
pub use page::PageComposer;
pub use store::{ContentStore, MAX_KEY_LEN, PAGE_PREFIX};
