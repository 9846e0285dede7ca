//! Asset-store boundary and the blocklist matcher/patcher.
//!
//! The serialized scene format is opaque to the pipeline: everything goes
//! through the [`AssetStore`] / [`AssetBundle`] traits. [`JsonAssetStore`]
//! is the reference container codec used by the worker binary and the test
//! suite; a proprietary-format backend implements the same traits.

pub mod bundle;
pub mod error;
pub mod indexer;
pub mod patcher;
pub mod store;


pub use bundle::JsonAssetStore;
pub use error::AssetError;
pub use indexer::BundleIndexer;
pub use patcher::{BundlePatcher, PatchOutcome};
pub use store::{AssetBundle, AssetStore, SceneObject};
