//! Code generation backends for the Oolong compiler.

pub mod c;

pub use c::{BodyContext, CTarget, CTargetOptions, MethodBodySource};

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

/// What one emission pass produced, for logs and build tooling.
#[derive(Debug, Clone, Serialize)]
pub struct EmitSummary {
    /// Classes handed to the backend.
    pub classes: usize,
    /// Runtime types with emitted metadata, arrays and primitives included.
    pub types: usize,
    /// Interned pool strings.
    pub strings: usize,
    /// Exception call-site table rows.
    pub call_sites: usize,
    /// Bytes of C source written to the sink.
    pub bytes_written: u64,
    /// Content hash of the emitted source.
    pub fingerprint: String,
}

impl EmitSummary {
    /// Writes the summary next to the build output, pretty-printed so runs
    /// diff cleanly.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let rendered = serde_json::to_string_pretty(self)
            .map_err(|err| Error::internal(format!("failed to encode emit summary: {err}")))?;
        fs::write(path, rendered)?;
        Ok(())
    }
}
