//! Constant string interning and pool-table emission.
//!
//! Literals are interned while scanning bodies and call sites; the frozen
//! pool then emits one data table whose rows the generated code references
//! by index. Headers on the rows stay zero in the image and are stamped at
//! startup, after the heap exists.

use std::collections::HashMap;

use crate::model::{CallSiteDescriptor, ClassTable, Instruction};

use super::names;
use super::writer::CodeWriter;

/// Mutable interning phase.
#[derive(Debug, Default)]
pub struct StringPoolBuilder {
    entries: Vec<String>,
    index: HashMap<String, usize>,
}

impl StringPoolBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a literal and returns its pool index. Interning the same
    /// literal again returns the same index without growing the pool.
    pub fn intern(&mut self, value: &str) -> usize {
        if let Some(&existing) = self.index.get(value) {
            return existing;
        }
        let slot = self.entries.len();
        self.entries.push(value.to_owned());
        self.index.insert(value.to_owned(), slot);
        slot
    }

    /// Ends the interning phase. The frozen pool has no mutation surface.
    #[must_use]
    pub fn freeze(self) -> StringPool {
        StringPool {
            entries: self.entries,
            index: self.index,
        }
    }
}

/// Frozen pool; indices handed out by the builder stay valid verbatim.
#[derive(Debug)]
pub struct StringPool {
    entries: Vec<String>,
    index: HashMap<String, usize>,
}

impl StringPool {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Interns every literal the given bodies load: string constants verbatim
/// and class constants as their runtime type names.
pub fn fill_from_bodies(pool: &mut StringPoolBuilder, program: &ClassTable) {
    for class in program {
        for method in &class.methods {
            let Some(body) = method.body.as_ref() else {
                continue;
            };
            for instruction in body.instructions() {
                match instruction {
                    Instruction::StringConstant { value } => {
                        pool.intern(value);
                    }
                    Instruction::ClassConstant { ty } => {
                        pool.intern(&ty.runtime_name());
                    }
                    Instruction::Invoke { .. } | Instruction::CloneArray => {}
                }
            }
        }
    }
}

/// Interns the method label and source file of every call-site row.
pub fn fill_from_call_sites(pool: &mut StringPoolBuilder, sites: &[CallSiteDescriptor]) {
    for site in sites {
        pool.intern(&site.label());
        if let Some(location) = site.location.as_ref() {
            pool.intern(&location.file);
        }
    }
}

/// Emits the pool data table. An empty pool emits nothing; no generated
/// code can hold an index into it.
pub(crate) fn emit_pool_table(w: &mut CodeWriter<'_>, pool: &StringPool) {
    if pool.is_empty() {
        return;
    }
    w.write(names::RT_STRING)
        .write(" ")
        .write(names::STRING_POOL)
        .write("[")
        .write(&pool.len().to_string())
        .println("] = {");
    w.indent();
    for entry in pool.iter() {
        w.write("{ { 0 }, ")
            .write(&entry.len().to_string())
            .write(", \"")
            .write(&escape_c_string(entry))
            .println("\" },");
    }
    w.outdent();
    w.println("};");
    w.newline();
}

/// Escapes a literal for a C string. Non-ASCII and control bytes become
/// three-digit octal escapes, which cannot swallow following characters the
/// way hex escapes do.
pub(crate) fn escape_c_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::codegen::c::writer::CodeBuffer;
    use crate::model::{
        InvokeKind, ManagedClass, MethodBody, MethodDecl, MethodDescriptor, MethodSignature,
        SourceLocation, ValueType,
    };

    #[test]
    fn interning_is_idempotent() {
        let mut builder = StringPoolBuilder::new();
        let first = builder.intern("hello");
        let second = builder.intern("world");
        let again = builder.intern("hello");

        assert_eq!(first, again);
        assert_ne!(first, second);

        let pool = builder.freeze();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.index_of("hello"), Some(first));
        assert_eq!(pool.index_of("missing"), None);
    }

    #[test]
    fn pool_iterates_in_first_intern_order() {
        let mut builder = StringPoolBuilder::new();
        builder.intern("b");
        builder.intern("a");
        builder.intern("b");
        builder.intern("c");

        let pool = builder.freeze();
        let entries: Vec<&str> = pool.iter().collect();
        assert_eq!(entries, ["b", "a", "c"]);
    }

    #[test]
    fn bodies_and_call_sites_feed_the_pool() {
        let mut program = ClassTable::new();
        program.push(ManagedClass::new("app.Main", None).with_method(MethodDecl::of_static(
            "main",
            MethodDescriptor::new(vec![], None),
            Some(MethodBody::of_instructions(vec![
                Instruction::StringConstant {
                    value: "greeting".into(),
                },
                Instruction::ClassConstant {
                    ty: ValueType::array_of(ValueType::object("app.Main")),
                },
                Instruction::Invoke {
                    kind: InvokeKind::Static,
                    target: MethodSignature::new(
                        "app.Main",
                        "helper",
                        MethodDescriptor::new(vec![], None),
                    ),
                },
            ])),
        )));
        let sites = vec![CallSiteDescriptor::new(
            MethodSignature::new("app.Main", "main", MethodDescriptor::new(vec![], None)),
            Some(SourceLocation::new("main.ol", 3)),
        )];

        let mut builder = StringPoolBuilder::new();
        fill_from_bodies(&mut builder, &program);
        fill_from_call_sites(&mut builder, &sites);

        let pool = builder.freeze();
        let entries: Vec<&str> = pool.iter().collect();
        assert_eq!(
            entries,
            ["greeting", "app.Main[]", "app.Main.main", "main.ol"]
        );
    }

    #[test]
    fn pool_table_escapes_literals() {
        let mut builder = StringPoolBuilder::new();
        builder.intern("say \"hi\"\n");
        builder.intern("caf\u{e9}");
        let pool = builder.freeze();

        let mut buf = CodeBuffer::new();
        let root = buf.root();
        emit_pool_table(&mut buf.writer(root), &pool);

        let mut out = Vec::new();
        buf.flush(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        expect![[r#"
            OolongString oolong_string_pool[2] = {
                { { 0 }, 9, "say \"hi\"\n" },
                { { 0 }, 5, "caf\303\251" },
            };

        "#]]
        .assert_eq(&text);
    }

    #[test]
    fn empty_pool_emits_no_table() {
        let pool = StringPoolBuilder::new().freeze();
        let mut buf = CodeBuffer::new();
        let root = buf.root();
        emit_pool_table(&mut buf.writer(root), &pool);

        let mut out = Vec::new();
        buf.flush(&mut out).unwrap();
        assert!(out.is_empty());
    }
}
