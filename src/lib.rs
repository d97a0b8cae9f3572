//! bindery — GHS safety binder publisher.
//!
//! Per-customer JSON configs drive a deterministic pipeline that renders a
//! static binder site and publishes it to GitHub Pages. A local axum
//! dashboard and a clap CLI sit on top of the same library.

pub mod config;
pub mod deploy;
pub mod errors;
pub mod github;
pub mod logging;
pub mod models;
pub mod reconcile;
pub mod registry;
pub mod render;
pub mod server;
pub mod store;
pub mod ui;
