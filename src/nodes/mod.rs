//! Built-in behaviours.
//!
//! # Software
//! - [`Constant`] - source emitting a fixed value
//! - [`BinaryOp`] - two-input arithmetic and bitwise operators
//! - [`Reporter`] - terminal sink recording what it receives
//!
//! # Hardware
//! - [`RegisterStage`] - one-slot valid/ready register, optionally mapping values

pub mod hardware;
pub mod software;

pub use hardware::RegisterStage;
pub use software::{BinaryOp, Constant, Report, ReportLog, Reporter};
