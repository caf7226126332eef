//! Common utilities and shared types for quad.
//!
//! This crate provides foundational components used across all quad crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Pseudonym derivation**: Keyed one-way account pseudonyms via
//!   [`derive_pseudonym`]
//! - **Anonymous aliases**: Deterministic display names via [`alias_for`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Metrics**: Performance monitoring via [`Metrics`]
//!
//! # Example
//!
//! ```no_run
//! use quad_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod alias;
pub mod config;
pub mod error;
pub mod id;
pub mod metrics;
pub mod pseudonym;

pub use alias::{ALIAS_POOL, alias_for};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use metrics::{Metrics, MetricsSnapshot, Timer, get_metrics};
pub use pseudonym::{
    PSEUDONYM_LEN, derive_pseudonym, derive_pseudonym_with_nonce, is_valid_pseudonym,
};
