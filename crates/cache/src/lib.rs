//! Resource cache ("vault") for IIIF JSON documents
//!
//! ## Key Components
//!
//! - **`vault`**: the single-flight, memoizing cache
//! - **`keys`**: resource kinds and URI canonicalisation
//! - **`fetcher`**: the network seam and its HTTP implementation
//! - **`prefetch`**: the breadth-first manifest walk

pub mod errors;
pub mod fetcher;
pub mod keys;
pub mod prefetch;
pub mod vault;

pub use errors::VaultError;
pub use fetcher::{HttpFetcher, ResourceFetcher};
pub use keys::{canonicalize, CacheKey, ResourceKind};
pub use prefetch::{embedded_resources, EmbeddedResource};
pub use vault::{Vault, VaultStats};
