// src/link/mod.rs
// =============================================================================
// URL identity and on-disk placement.
//
// Submodules:
// - canonical: turns any reference into a CanonicalUrl (dedup identity)
// - local_path: maps a CanonicalUrl to the file holding its mirrored copy
// =============================================================================

mod canonical;
mod local_path;

pub use canonical::{canonicalize, canonicalize_seed, from_url, resolve, CanonicalUrl};
pub use local_path::{to_local_path, LinkStyle, LocalPath};
