//! Content pipeline for a markdown blog: scans post directories, compiles
//! their frontmatter, estimates reading time, sorts posts newest first and
//! renders `sitemap.xml` and `rss.xml` from the result.
//!
//! [`pipeline::run`] is the entry point. [`routes::router`] serves the same
//! collection as JSON and RSS.

pub mod assembler;
pub mod config;
pub mod content_loader;
pub mod dates;
pub mod error;
pub mod feed;
pub mod hot_reload;
pub mod markdown;
pub mod models;
pub mod pipeline;
pub mod reading_time;
pub mod routes;
pub mod sitemap;
pub mod state;
pub mod xml;
