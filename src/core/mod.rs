//! Catalog core: binary format, compiler and reader
//!
//! - [`error`] - Error types for catalog operations
//! - [`id128`] - 128-bit message identifiers
//! - [`header`] - Database header and flag sets
//! - [`item`] - Item records and the key ordering
//! - [`parser`] - Source file parser
//! - [`merge`] - Merge store for duplicate keys
//! - [`strbuf`] - String blob interner
//! - [`builder`] - Catalog compiler with atomic publication
//! - [`locale`] - Locale fallback chain
//! - [`reader`] - Memory-mapped reader
//! - [`listing`] - Listing and rendering
//! - [`sources`] - Source directory discovery
//! - [`config`] - TOML configuration

pub mod builder;
pub mod config;
pub mod error;
pub mod header;
pub mod id128;
pub mod item;
pub mod listing;
pub mod locale;
pub mod merge;
pub mod parser;
pub mod reader;
pub mod sources;
pub mod strbuf;

pub use builder::{BuildReport, CatalogBuilder};
pub use reader::{Catalog, CatalogView};
