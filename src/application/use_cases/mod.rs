pub mod duplicates;
pub mod export;
pub mod lists;
pub mod scanning;
pub mod validation;

use std::sync::Arc;

/// URL prefixes stripped before identifiers are compared.
pub type KnownPrefixes = Arc<Vec<String>>;
