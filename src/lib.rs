//! nb-runner
//!
//! Executes a notebook with papermill from a CI job, optionally polling the
//! progress log while it runs, then renders the result as HTML and reports
//! the hosted execution URL.
//!
//! Layout:
//! - [`settings`] / [`cli`] / [`config`] / [`context`]: inputs, parsed once
//! - [`layout`]: derived filesystem paths and the secrets file
//! - [`request`]: the immutable execution request and parameter merging
//! - [`engine`]: run-and-watch orchestration
//! - [`tools`]: installer / executor / converter collaborators
//! - [`runner`]: the end-to-end flow

pub mod artifact;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod execution_id;
pub mod layout;
pub mod logging;
pub mod request;
pub mod runner;
pub mod settings;
pub mod sinks;
pub mod tools;
pub mod util;
