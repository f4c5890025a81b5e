//! # CryptoFlow Core
//!
//! Core domain models and types shared by every CryptoFlow component:
//! - warehouse dimension and fact row types
//! - analytics result types
//! - pipeline run and quality check audit types
//! - the wire format for the real-time price channel
//! - logging infrastructure

pub mod domain;
pub mod logging;

pub use domain::*;
pub use logging::*;
