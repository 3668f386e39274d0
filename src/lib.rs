#![deny(clippy::all, clippy::perf, clippy::suspicious)] // Catch correctness + perf + suspicious patterns early.
#![deny(clippy::unwrap_used, clippy::expect_used)]

//! Core library of the Oolong ahead-of-time compiler's native C backend.

pub mod codegen;
pub mod error;
pub mod model;
pub mod support;
pub mod version;

pub use codegen::{BodyContext, CTarget, CTargetOptions, EmitSummary, MethodBodySource};
pub use error::{Error, Result};
