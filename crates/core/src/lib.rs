//! Core business logic for Quad.
//!
//! Services in this crate compose the repositories from `quad-db` into the
//! behavior the API exposes: account registration, pseudonym management,
//! posting, voting, reporting, moderation, and identity resolution.

pub mod services;

pub use services::*;
