//! Package front-end build output into dashboard manifests and publish them.
//!
//! The pipeline is build → [`artifact`] → [`manifest`] upsert, then either an
//! atomic rewrite of the manifest file or a [`deploy`] to a remote service.
pub mod artifact;
pub mod build;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod manifest;
pub mod workflow;

pub use error::DashError;
