//! Terminal client for the inbox assistant backend.
//!
//! The [`dashboard::Dashboard`] container holds all client state and is
//! driven by user operations and network completions; [`runtime::Executor`]
//! performs the network side effects on worker threads.

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod i18n;
pub mod logging;
pub mod markdown;
pub mod runtime;
pub mod store;
pub mod terminal;
