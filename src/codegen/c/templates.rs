//! Runtime template loading and validation.
//!
//! The prologue defines the object model and macros generated code leans
//! on; the epilogue implements the runtime entry points over the generated
//! tables. Both ship embedded in the binary. A template directory override
//! exists for runtime experiments, and overridden text goes through the
//! same validation so a stale file fails the build step instead of
//! producing a unit that cannot compile.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

const EMBEDDED_PROLOGUE: &str = include_str!("runtime/runtime.c");
const EMBEDDED_EPILOGUE: &str = include_str!("runtime/runtime-epilogue.c");

const PROLOGUE_FILE: &str = "runtime.c";
const EPILOGUE_FILE: &str = "runtime-epilogue.c";

/// Definitions the rest of the unit references; a template missing one of
/// these cannot have come from a matching runtime revision.
const PROLOGUE_MARKERS: &[&str] = &[
    "OolongClass",
    "OolongString",
    "OolongCallSite",
    "OOLONG_PACK_CLASS(",
    "OOLONG_GC_MARKED",
    "oolong_rt_init_heap",
];
const EPILOGUE_MARKERS: &[&str] = &[
    "oolong_rt_init_heap",
    "oolong_rt_alloc",
    "oolong_rt_throw_cast_error",
];

#[derive(Debug)]
pub struct RuntimeTemplates {
    prologue: String,
    epilogue: String,
}

impl RuntimeTemplates {
    pub fn load(template_dir: Option<&Path>) -> Result<Self> {
        let prologue = load_template(template_dir, PROLOGUE_FILE, EMBEDDED_PROLOGUE)?;
        let epilogue = load_template(template_dir, EPILOGUE_FILE, EMBEDDED_EPILOGUE)?;
        validate(&prologue, PROLOGUE_FILE, PROLOGUE_MARKERS)?;
        validate(&epilogue, EPILOGUE_FILE, EPILOGUE_MARKERS)?;
        Ok(Self { prologue, epilogue })
    }

    #[must_use]
    pub fn prologue(&self) -> &str {
        &self.prologue
    }

    #[must_use]
    pub fn epilogue(&self) -> &str {
        &self.epilogue
    }
}

fn load_template(dir: Option<&Path>, file: &str, embedded: &str) -> Result<String> {
    let Some(dir) = dir else {
        return Ok(embedded.to_owned());
    };
    let path = dir.join(file);
    fs::read_to_string(&path).map_err(|err| {
        Error::codegen(format!(
            "failed to read runtime template {}: {err}",
            path.display()
        ))
    })
}

fn validate(text: &str, file: &str, markers: &[&str]) -> Result<()> {
    for marker in markers {
        if !text.contains(marker) {
            return Err(Error::codegen(format!(
                "runtime template {file} does not define {marker}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn embedded_templates_pass_validation() {
        let templates = RuntimeTemplates::load(None).unwrap();
        assert!(templates.prologue().contains("OOLONG_PACK_CLASS"));
        assert!(templates.epilogue().contains("oolong_rt_init_heap"));
    }

    #[test]
    fn override_directory_must_contain_both_templates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("runtime.c"), EMBEDDED_PROLOGUE).unwrap();

        let err = RuntimeTemplates::load(Some(dir.path())).unwrap_err();
        assert!(err.to_string().contains("runtime-epilogue.c"));
    }

    #[test]
    fn truncated_override_fails_marker_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("runtime.c"), "/* empty */\n").unwrap();
        fs::write(dir.path().join("runtime-epilogue.c"), EMBEDDED_EPILOGUE).unwrap();

        let err = RuntimeTemplates::load(Some(dir.path())).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("runtime.c"), "{message}");
        assert!(message.contains("OolongClass"), "{message}");
    }

    #[test]
    fn valid_override_is_accepted_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let patched = format!("{EMBEDDED_PROLOGUE}\n/* patched */\n");
        fs::write(dir.path().join("runtime.c"), &patched).unwrap();
        fs::write(dir.path().join("runtime-epilogue.c"), EMBEDDED_EPILOGUE).unwrap();

        let templates = RuntimeTemplates::load(Some(dir.path())).unwrap();
        assert!(templates.prologue().ends_with("/* patched */\n"));
    }
}
