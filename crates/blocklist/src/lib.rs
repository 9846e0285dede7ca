//! Maintainer-authored blocklist definitions: schema, loading, compilation.
//!
//! Definition files are YAML documents listing, per world, the scene objects
//! to deactivate. All files in the blocklist directory are loaded
//! independently and unioned into one deduplicated [`CompiledBlocklist`];
//! a malformed file never aborts the batch.

pub mod compiler;
pub mod error;
pub mod schema;


pub use compiler::{BlocklistCompiler, CompiledBlocklist};
pub use error::{BlocklistError, LoadResult, LoadStatus, Result};
pub use schema::{BlockEntry, BlocklistFile, GameObjectInstance, GameObjectPosition};
