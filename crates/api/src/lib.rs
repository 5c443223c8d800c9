//! HTTP surface of the admin panel: server wiring, session pipeline and pages.

pub mod app;
pub mod context;
pub mod middleware;
