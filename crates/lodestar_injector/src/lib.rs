//! Startup-time dependency resolution for Lodestar.
//!
//! `lodestar_injector` builds fully wired object graphs from a set of type
//! registrations:
//!
//! - [`key`] - Type identity for registration and lookup
//! - [`function`] - Compile-time descriptors for constructors and callables
//! - [`record`] - Per-type registration records and lifecycles
//! - [`names`] - Short-name lookup for [`Injector::get_by_name`]
//! - [`pool`] - Reusable scope stacks for per-request instances
//! - [`error`] - Error types
//!
//! # Lifecycle
//!
//! Usage follows three phases:
//!
//! 1. **Register** a constructor per type with a [`Lifecycle`]:
//!    [`Transient`](Lifecycle::Transient) builds on every resolution,
//!    [`Scoped`](Lifecycle::Scoped) once per top-level request,
//!    [`Singleton`](Lifecycle::Singleton) once per injector.
//! 2. **Verify** the registry. Every constructor's dependencies must be
//!    registered and free of cycles.
//! 3. **Resolve** with [`Injector::get`] or inject the arguments of an
//!    arbitrary function with [`Injector::call`] and friends.
//!
//! Resolving before a successful verification fails with
//! [`InjectorError::BadState`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lodestar_injector::Injector;
//!
//! trait Driver: Send + Sync {
//!     fn name(&self) -> &str;
//! }
//!
//! trait Car: Send + Sync {
//!     fn driver(&self) -> &dyn Driver;
//! }
//!
//! struct Chauffeur;
//!
//! impl Driver for Chauffeur {
//!     fn name(&self) -> &str {
//!         "chauffeur"
//!     }
//! }
//!
//! struct Sedan {
//!     driver: Arc<dyn Driver>,
//! }
//!
//! impl Car for Sedan {
//!     fn driver(&self) -> &dyn Driver {
//!         self.driver.as_ref()
//!     }
//! }
//!
//! let injector = Injector::new();
//! injector
//!     .register_transient::<dyn Driver, _>(|| Arc::new(Chauffeur) as Arc<dyn Driver>)
//!     .unwrap();
//! injector
//!     .register_transient::<dyn Car, _>(|driver: Arc<dyn Driver>| {
//!         Arc::new(Sedan { driver }) as Arc<dyn Car>
//!     })
//!     .unwrap();
//! injector.verify().unwrap();
//!
//! let car = injector.get::<dyn Car>().unwrap();
//! assert_eq!(car.driver().name(), "chauffeur");
//! ```

/// Compile-time function descriptors.
pub mod function;

/// Error types.
pub mod error;

/// Type identity.
pub mod key;

/// Short-name index.
pub mod names;

/// Scope-stack pooling.
pub mod pool;

/// Registration records.
pub mod record;

mod config;
mod injector;
mod resolve;
mod verify;

pub use config::{CacheStrategy, InjectorConfig, ParseStrategyError};
pub use error::{BadState, DependencyChain, ErrorKind, InjectorError};
pub use function::{Instance, IntoFunction, Variadic};
pub use injector::Injector;
pub use key::{TypeKey, TypeKind};
pub use record::Lifecycle;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::function::{
        Dependency, Instance, IntoFunction, ReturnType, ReturnValue, Returns, Variadic, downcast,
    };
    pub use crate::injector::Injector;
    pub use crate::key::*;
    pub use crate::names::*;
    pub use crate::record::*;
}
