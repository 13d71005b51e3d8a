//! `novelgate` keeps a novel reader from hammering the sites it scrapes.
//!
//! It provides two building blocks and the glue between them:
//!
//! * [`ratelimit::HostGate`] paces requests per host,
//! * [`cache::ExpiringCache`] keeps recently fetched artifacts in memory
//!   for a limited time,
//! * [`fetch::Fetcher`] asks the cache first and only goes through the gate
//!   on a miss.
//!
//! ```
//! use novelgate_lib::cache::{ArtifactCaches, CacheConfig};
//! use novelgate_lib::ratelimit::{HostGate, HostKey};
//! use novelgate_lib::{ChapterId, Result, fetch::cached_fetch};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let caches = ArtifactCaches::new(&CacheConfig::default())?;
//!     let gate = HostGate::default();
//!     let host = HostKey::from("novels.example.com");
//!
//!     let chapter = cached_fetch(&caches.chapters, &gate, ChapterId(1), &host, || async {
//!         Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"It was a dark and stormy night"))
//!     })
//!     .await;
//!
//!     assert!(chapter.is_ok());
//!     assert!(caches.chapters.contains(&ChapterId(1)));
//!     Ok(())
//! }
//! ```
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    rustdoc::invalid_html_tags,
    missing_copy_implementations,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    variant_size_differences,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]
#![deny(missing_docs)]

mod types;

pub mod cache;
pub mod fetch;
pub mod ratelimit;

pub use types::*;
