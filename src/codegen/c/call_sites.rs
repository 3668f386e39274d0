//! Exception call-site table generation.
//!
//! The runtime walks this table by index when it reconstructs a stack
//! trace. Labels and file names live in the string pool; the pool filler
//! runs before any emission, so a missing index here is a pipeline bug,
//! not bad input.

use crate::error::{Error, Result};
use crate::model::CallSiteDescriptor;

use super::names;
use super::string_pool::StringPool;
use super::writer::CodeWriter;

pub(crate) fn emit_call_site_table(
    w: &mut CodeWriter<'_>,
    pool: &StringPool,
    sites: &[CallSiteDescriptor],
) -> Result<()> {
    w.write("static const ")
        .write(names::RT_CALL_SITE)
        .write(" ")
        .write(names::CALL_SITES)
        .write("[")
        .write(&sites.len().max(1).to_string())
        .println("] = {");
    w.indent();
    if sites.is_empty() {
        w.println("{ NULL, NULL, -1 },");
    }
    for site in sites {
        let label = site.label();
        let method = pool.index_of(&label).ok_or_else(|| {
            Error::internal(format!("call-site label {label} missing from the string pool"))
        })?;
        w.write("{ &")
            .write(names::STRING_POOL)
            .write("[")
            .write(&method.to_string())
            .write("], ");
        match site.location.as_ref() {
            Some(location) => {
                let file = pool.index_of(&location.file).ok_or_else(|| {
                    Error::internal(format!(
                        "call-site file {} missing from the string pool",
                        location.file
                    ))
                })?;
                w.write("&")
                    .write(names::STRING_POOL)
                    .write("[")
                    .write(&file.to_string())
                    .write("], ")
                    .write(&location.line.to_string())
                    .println(" },");
            }
            None => {
                w.println("NULL, -1 },");
            }
        }
    }
    w.outdent();
    w.println("};");
    w.write("static const int32_t ")
        .write(names::CALL_SITE_COUNT)
        .write(" = ")
        .write(&sites.len().to_string())
        .println(";");
    w.newline();
    Ok(())
}
