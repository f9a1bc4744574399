//! A startup-time dependency injector for Rust.
//!
//! Register a constructor per type, verify the whole graph once, then build
//! fully wired values on demand:
//!
//! ```
//! use std::sync::Arc;
//! use lodestar::prelude::*;
//!
//! struct Config {
//!     url: &'static str,
//! }
//!
//! struct Client {
//!     config: Arc<Config>,
//! }
//!
//! let injector = Injector::new();
//! injector
//!     .register_singleton::<Config, _>(|| Arc::new(Config { url: "db://local" }))
//!     .unwrap();
//! injector
//!     .register_scoped::<Client, _>(|config: Arc<Config>| Arc::new(Client { config }))
//!     .unwrap();
//! injector.verify().unwrap();
//!
//! let client = injector.get::<Client>().unwrap();
//! assert_eq!(client.config.url, "db://local");
//! ```

pub use lodestar_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use lodestar_internal::prelude::*;
}
