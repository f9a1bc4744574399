//! # Lodestar Internal Library
//!
//! Re-exports the core Lodestar crates for convenience.

/// Pluggable registry lookup strategies.
pub use lodestar_search;

/// Type registry, verification and resolution.
pub use lodestar_injector;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use lodestar_injector::prelude::*;
    pub use lodestar_search::{Cache, Reorder};
}
