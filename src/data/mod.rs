//! Data layer for loading repositories from GitHub.
//!
//! Handles the repository listing, per-repository release lookups and
//! preview warm-up requests.

mod github;
mod models;

pub use github::{ClientConfig, GithubClient, LoadError};
pub use models::{Repository, UNAVAILABLE};
#[cfg(test)]
pub(crate) use models::{sample_repository, Release};
