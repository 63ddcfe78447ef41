//! An in-process, shared-memory-shaped record database core: a tagged
//! encoded-value model with a total ordering, a T-tree index engine, a
//! chaining hash index engine (with a JSON array-unwrap variant), a query
//! engine that picks between them, and a thin schema/document layer on
//! top. See `spec.md` and `SPEC_FULL.md` at the repository root for the
//! full design.
//!
//! The allocator, the string interning hash table, the write-ahead
//! journal, locks, import/export and language bindings are treated as
//! external collaborators (spec.md §1) and are stood in for by this
//! crate's own `arena`/`RecordStore` rather than re-implemented.

pub mod arena;
pub mod compare;
pub mod db;
pub mod error;
pub mod hash_index;
pub mod ids;
pub mod index_registry;
pub mod json_query;
pub mod mempool;
pub mod options;
pub mod query;
pub mod record;
pub mod schema;
pub mod template;
pub mod ttree;
pub mod value;

pub use crate::db::Database;
pub use crate::error::{Result, WgError};
pub use crate::ids::{IndexId, NodeId, RecordId, TemplateId};
pub use crate::options::Options;
pub use crate::record::{Meta, Record};
pub use crate::value::Value;
