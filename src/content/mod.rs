//! Content Store: Markdown documents with front-matter.
//!
//! The store is read-only to the rest of the program. Documents are parsed
//! once per run and handed to the generator in path order.

mod document;
mod error;
mod front_matter;
mod store;

pub use document::Document;
pub use error::ContentError;
pub use store::ContentStore;
