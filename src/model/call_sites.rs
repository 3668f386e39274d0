use super::signatures::MethodSignature;

/// Source position a call site reports when unwinding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// One entry of the exception call-site table.
///
/// The emitted table row interns the callee label and file name in the
/// string pool; a site without a location gets a sentinel line of -1 and a
/// null file reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSiteDescriptor {
    pub method: MethodSignature,
    pub location: Option<SourceLocation>,
}

impl CallSiteDescriptor {
    #[must_use]
    pub fn new(method: MethodSignature, location: Option<SourceLocation>) -> Self {
        Self { method, location }
    }

    /// Label interned for this site, `owner.name` without the descriptor.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.method.owner, self.method.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::signatures::MethodDescriptor;

    #[test]
    fn label_omits_the_descriptor() {
        let site = CallSiteDescriptor::new(
            MethodSignature::new("app.Main", "run", MethodDescriptor::new(vec![], None)),
            Some(SourceLocation::new("main.ol", 14)),
        );
        assert_eq!(site.label(), "app.Main.run");
    }
}
