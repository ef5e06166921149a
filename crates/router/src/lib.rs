//! Path-pattern compiler and matching engine with nested routing.
//!
//! Routing patterns mix literal text with placeholders: `{name}` captures a
//! single segment, `{+name}` captures greedily across segments,
//! `{name:regex}` constrains a capture with a custom regex, `[...]` marks an
//! optional section, `*` globs over any characters and `\` escapes the next
//! one. Patterns compile once, at registration, into anchored regular
//! expressions; matching itself never fails.
//!
//! Simple patterns never reach the regex engine. An empty pattern or a plain
//! literal becomes an exact matcher comparing decoded paths, and a literal
//! ending in `/*` becomes a segment-aligned prefix matcher. The prefix form
//! of every matcher splits a path into a matched head and an unmatched tail,
//! which is what lets routers nest.
//!
//! ```
//! use joist_router::Router;
//!
//! let api = Router::builder()
//!     .route("/users/{id}", "user")?
//!     .route("/files/{+path}", "file")?
//!     .build();
//! let router = Router::builder()
//!     .mount("/api", api)?
//!     .fallback("not-found")
//!     .build();
//!
//! let routed = router.at("/api/users/42").ok_or("no route")?;
//! assert_eq!(routed.value(), &"user");
//! assert_eq!(routed.path().params().get("id"), Some("42"));
//!
//! assert_eq!(router.at("/other").ok_or("no route")?.value(), &"not-found");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cursor;
mod error;
mod matcher;
mod params;
mod path;
mod pattern;
mod routed;
mod router;

pub use error::PatternError;
pub use matcher::{ExactMatcher, PathMatcher, PatternMatcher, PrefixMatcher};
pub use params::RouteParams;
pub use path::UriPath;
pub use pattern::CompiledPattern;
pub use routed::{MatchResult, PrefixMatchResult, RoutedPath};
pub use router::{Routed, Router, RouterBuilder};
