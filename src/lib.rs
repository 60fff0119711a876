//! # urlpattern
//!
//! Declarative URL template compilation and matching for hosts, paths,
//! and query strings, with named variable extraction and reverse URL
//! building.
//!
//! Templates are literal text with `{name}` or `{name:pattern}` variable
//! placeholders. Compilation turns a template into an anchored regular
//! expression plus a reverse template; a [`Pattern`] combines host, path,
//! path-prefix, and query matchers and tests them against a URL in one
//! call, returning every extracted variable on success.
//!
//! ## Modules
//!
//! - [`error`] - Error types and the [`PatternResult`] alias
//! - [`template`] - Template compilation and per-component matching
//! - [`pattern`] - The chainable [`Pattern`] builder and matcher
//!
//! ## Examples
//!
//! ```
//! use url::Url;
//! use urlpattern::Pattern;
//!
//! let pattern = Pattern::new()
//!     .host("{subdomain}.example.com")
//!     .path_prefix("/api")
//!     .path("/events/{id:[0-9]+}");
//!
//! let url = Url::parse("http://foo.example.com/api/events/12345").unwrap();
//! let vars = pattern.match_url(&url).unwrap();
//! assert_eq!(vars.get("subdomain").unwrap(), "foo");
//! assert_eq!(vars.get("id").unwrap(), "12345");
//!
//! let other = Url::parse("http://foo.example.com/client/events/12345").unwrap();
//! assert!(pattern.match_url(&other).is_none());
//! ```

pub mod error;
mod group;
pub mod pattern;
pub mod template;

// Re-export the most commonly used types at the crate root.
pub use error::{PatternError, PatternResult};
pub use pattern::Pattern;
pub use template::{CompiledTemplate, TemplateKind};
