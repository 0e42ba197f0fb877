//! Domain models.

pub mod lead;
pub mod record;

pub use lead::{Lead, NewLead};
pub use record::{CollectionKind, KindSpec, MAX_CATEGORY_LEN, MAX_TITLE_LEN, Record};
