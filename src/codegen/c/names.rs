//! Deterministic mangling of program names into C identifiers.
//!
//! Every symbol the emitted unit defines is claimed here up front, in one
//! deterministic pass, so the generators never invent identifiers on the
//! fly and two runs over the same program produce byte-identical output.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::model::{ClassTable, MethodSignature, ValueType};

/// Interned literal data table.
pub(crate) const STRING_POOL: &str = "oolong_string_pool";
/// Per-class reference-field offset tables, indexed by resolved class order.
pub(crate) const CLASS_LAYOUTS: &str = "oolong_class_layouts";
pub(crate) const CLASS_COUNT: &str = "oolong_class_count";
/// Addresses of static reference fields, scanned by the collector.
pub(crate) const GC_ROOTS: &str = "oolong_gc_roots";
pub(crate) const GC_ROOTS_COUNT: &str = "oolong_gc_roots_count";
/// Exception call-site location table.
pub(crate) const CALL_SITES: &str = "oolong_call_sites";
pub(crate) const CALL_SITE_COUNT: &str = "oolong_call_site_count";
/// Cast-failure helper defined late in the unit, prototyped early.
pub(crate) const THROW_CCE: &str = "oolong_throw_cce";

/// Runtime type names defined by the prologue template.
pub(crate) const RT_OBJECT: &str = "OolongObject";
pub(crate) const RT_CLASS: &str = "OolongClass";
pub(crate) const RT_ARRAY: &str = "OolongArray";
pub(crate) const RT_STRING: &str = "OolongString";
pub(crate) const RT_CALL_SITE: &str = "OolongCallSite";

/// Runtime entry points defined by the templates.
pub(crate) const RT_INIT_HEAP: &str = "oolong_rt_init_heap";
pub(crate) const RT_THROW_CAST_ERROR: &str = "oolong_rt_throw_cast_error";

/// Header-packing macros defined by the prologue template.
pub(crate) const PACK_CLASS_MACRO: &str = "OOLONG_PACK_CLASS";
pub(crate) const GC_MARKED_MACRO: &str = "OOLONG_GC_MARKED";

/// Identifiers generated names must never shadow: C keywords plus everything
/// the runtime templates define at top level.
static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set: HashSet<&'static str> = [
        "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
        "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
        "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
        "union", "unsigned", "void", "volatile", "while", "_Bool", "_Complex", "_Noreturn", "main",
    ]
    .into();
    set.extend([
        STRING_POOL,
        CLASS_LAYOUTS,
        CLASS_COUNT,
        GC_ROOTS,
        GC_ROOTS_COUNT,
        CALL_SITES,
        CALL_SITE_COUNT,
        THROW_CCE,
        RT_OBJECT,
        RT_CLASS,
        RT_ARRAY,
        RT_STRING,
        RT_CALL_SITE,
        RT_INIT_HEAP,
        RT_THROW_CAST_ERROR,
        "oolong_rt_alloc",
        "oolong_rt_alloc_array",
        "oolong_rt_layout_of",
        "oolong_rt_trace_roots",
        "oolong_rt_find_call_site",
    ]);
    set
});

/// Folds a program name into C identifier characters. Callers prepend a
/// family prefix, so the result never starts an identifier on its own.
pub(crate) fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    out
}

/// Claims a struct member name inside one struct's namespace. Keywords and
/// already-taken members pick up `_2`, `_3`, … counters.
pub(crate) fn claim_member(taken: &mut HashSet<String>, name: &str) -> String {
    let base = sanitize(name);
    if !RESERVED.contains(base.as_str()) && taken.insert(base.clone()) {
        return base;
    }
    let mut counter = 2u32;
    loop {
        let candidate = format!("{base}_{counter}");
        if !RESERVED.contains(candidate.as_str()) && taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn mangle_type(ty: &ValueType) -> String {
    match ty {
        ValueType::Primitive(kind) => kind.name().to_owned(),
        ValueType::Object(name) => sanitize(name),
        ValueType::Array(item) => format!("arr_{}", mangle_type(item)),
    }
}

/// One flat namespace for everything the unit defines. Collisions resolve
/// with `_2`, `_3`, … counters in claim order.
#[derive(Default)]
struct IdentifierSpace {
    taken: HashSet<String>,
}

impl IdentifierSpace {
    fn is_taken(&self, candidate: &str) -> bool {
        RESERVED.contains(candidate) || self.taken.contains(candidate)
    }

    fn claim(&mut self, base: String) -> String {
        if !self.is_taken(&base) {
            self.taken.insert(base.clone());
            return base;
        }
        let mut counter = 2u32;
        loop {
            let candidate = format!("{base}_{counter}");
            if !self.is_taken(&candidate) {
                self.taken.insert(candidate.clone());
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Frozen symbol assignment for one emission run.
///
/// Built once by [`NameProvider::build`]; lookups of names that were never
/// claimed indicate a generator asking for a symbol outside the collected
/// program and surface as internal errors.
pub struct NameProvider {
    class_structs: HashMap<String, String>,
    vtable_structs: HashMap<String, String>,
    layouts: HashMap<String, String>,
    metadata: HashMap<ValueType, String>,
    supertype_helpers: HashMap<ValueType, String>,
    methods: HashMap<MethodSignature, String>,
    statics: HashMap<(String, String), String>,
}

impl NameProvider {
    /// Claims every symbol the generators will define: class structs, layout
    /// tables and static storage in class-table order, then metadata
    /// instances, virtual-table structs and supertype helpers in collected
    /// type order, then method functions in declaration order.
    #[must_use]
    pub fn build(
        program: &ClassTable,
        collected: &[ValueType],
        needs_vtable: impl Fn(&ValueType) -> bool,
    ) -> Self {
        let mut space = IdentifierSpace::default();
        let mut class_structs = HashMap::new();
        let mut vtable_structs = HashMap::new();
        let mut layouts = HashMap::new();
        let mut metadata = HashMap::new();
        let mut supertype_helpers = HashMap::new();
        let mut methods = HashMap::new();
        let mut statics = HashMap::new();

        for class in program {
            let base = space.claim(format!("oc_{}", sanitize(&class.name)));
            class_structs.insert(class.name.clone(), base);
        }
        for class in program {
            let layout = space.claim(format!("oc_{}_layout", sanitize(&class.name)));
            layouts.insert(class.name.clone(), layout);
        }
        for ty in collected {
            let instance = space.claim(format!("ocls_{}", mangle_type(ty)));
            metadata.insert(ty.clone(), instance);
            let helper = space.claim(format!("osup_{}", mangle_type(ty)));
            supertype_helpers.insert(ty.clone(), helper);
            if let ValueType::Object(name) = ty {
                if needs_vtable(ty) {
                    let vt = space.claim(format!("oc_{}_vt", sanitize(name)));
                    vtable_structs.insert(name.clone(), vt);
                }
            }
        }
        for class in program {
            for method in &class.methods {
                if !method.has_body() {
                    continue;
                }
                let symbol = space.claim(format!(
                    "oc_{}_{}",
                    sanitize(&class.name),
                    sanitize(&method.name)
                ));
                methods.insert(class.signature_of(method), symbol);
            }
            for field in &class.fields {
                if !field.is_static {
                    continue;
                }
                let symbol = space.claim(format!(
                    "os_{}_{}",
                    sanitize(&class.name),
                    sanitize(&field.name)
                ));
                statics.insert((class.name.clone(), field.name.clone()), symbol);
            }
        }

        Self {
            class_structs,
            vtable_structs,
            layouts,
            metadata,
            supertype_helpers,
            methods,
            statics,
        }
    }

    /// C struct/typedef name of a known class.
    pub fn for_class(&self, class: &str) -> Result<&str> {
        self.class_structs
            .get(class)
            .map(String::as_str)
            .ok_or_else(|| Error::internal(format!("no struct name claimed for class {class}")))
    }

    /// Virtual-table struct name of a class that holds one.
    pub fn for_vtable_struct(&self, class: &str) -> Result<&str> {
        self.vtable_structs.get(class).map(String::as_str).ok_or_else(|| {
            Error::internal(format!("no virtual-table struct claimed for class {class}"))
        })
    }

    /// Reference-field offset table name of a known class.
    pub fn for_layout(&self, class: &str) -> Result<&str> {
        self.layouts
            .get(class)
            .map(String::as_str)
            .ok_or_else(|| Error::internal(format!("no layout table claimed for class {class}")))
    }

    /// Metadata instance name of a collected runtime type.
    pub fn for_metadata(&self, ty: &ValueType) -> Result<&str> {
        self.metadata
            .get(ty)
            .map(String::as_str)
            .ok_or_else(|| Error::internal(format!("no metadata instance claimed for type {ty}")))
    }

    /// Supertype-check helper name of a collected runtime type.
    pub fn for_supertype_helper(&self, ty: &ValueType) -> Result<&str> {
        self.supertype_helpers.get(ty).map(String::as_str).ok_or_else(|| {
            Error::internal(format!("no supertype helper claimed for type {ty}"))
        })
    }

    /// Function name of a method that has a body.
    pub fn for_method(&self, signature: &MethodSignature) -> Result<&str> {
        self.methods
            .get(signature)
            .map(String::as_str)
            .ok_or_else(|| Error::internal(format!("no function name claimed for {signature}")))
    }

    /// Storage name of a static field.
    pub fn for_static_field(&self, class: &str, field: &str) -> Result<&str> {
        self.statics
            .get(&(class.to_owned(), field.to_owned()))
            .map(String::as_str)
            .ok_or_else(|| {
                Error::internal(format!("no storage name claimed for static {class}.{field}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        FieldDecl, ManagedClass, MethodBody, MethodDecl, MethodDescriptor, PrimitiveKind,
    };

    fn int() -> ValueType {
        ValueType::Primitive(PrimitiveKind::Int)
    }

    fn table(classes: Vec<ManagedClass>) -> ClassTable {
        let mut table = ClassTable::new();
        for class in classes {
            table.push(class);
        }
        table
    }

    #[test]
    fn colliding_sanitized_names_get_counters() {
        let program = table(vec![
            ManagedClass::new("app.A", None),
            ManagedClass::new("app_A", None),
        ]);
        let names = NameProvider::build(&program, &[], |_| false);

        assert_eq!(names.for_class("app.A").unwrap(), "oc_app_A");
        assert_eq!(names.for_class("app_A").unwrap(), "oc_app_A_2");
    }

    #[test]
    fn overloads_share_a_base_and_diverge_deterministically() {
        let program = table(vec![
            ManagedClass::new("app.A", None)
                .with_method(MethodDecl::instance(
                    "run",
                    MethodDescriptor::new(vec![], None),
                    Some(MethodBody::default()),
                ))
                .with_method(MethodDecl::instance(
                    "run",
                    MethodDescriptor::new(vec![int()], None),
                    Some(MethodBody::default()),
                )),
        ]);
        let names = NameProvider::build(&program, &[], |_| false);
        let class = program.get("app.A").unwrap();

        let nullary = class.signature_of(&class.methods[0]);
        let unary = class.signature_of(&class.methods[1]);
        assert_eq!(names.for_method(&nullary).unwrap(), "oc_app_A_run");
        assert_eq!(names.for_method(&unary).unwrap(), "oc_app_A_run_2");
    }

    #[test]
    fn type_mangling_tracks_array_nesting() {
        let program = table(vec![ManagedClass::new("app.A", None)]);
        let collected = vec![
            ValueType::object("app.A"),
            ValueType::array_of(ValueType::object("app.A")),
            ValueType::array_of(int()),
        ];
        let names = NameProvider::build(&program, &collected, |_| false);

        assert_eq!(names.for_metadata(&collected[0]).unwrap(), "ocls_app_A");
        assert_eq!(names.for_metadata(&collected[1]).unwrap(), "ocls_arr_app_A");
        assert_eq!(names.for_metadata(&collected[2]).unwrap(), "ocls_arr_int");
        assert_eq!(
            names.for_supertype_helper(&collected[2]).unwrap(),
            "osup_arr_int"
        );
    }

    #[test]
    fn abstract_methods_and_unknown_lookups_have_no_symbol() {
        let program = table(vec![ManagedClass::new("app.A", None).with_method(
            MethodDecl::instance("run", MethodDescriptor::new(vec![], None), None),
        )]);
        let names = NameProvider::build(&program, &[], |_| false);
        let class = program.get("app.A").unwrap();

        let abstract_run = class.signature_of(&class.methods[0]);
        assert!(names.for_method(&abstract_run).is_err());
        assert!(names.for_class("app.Missing").is_err());
    }

    #[test]
    fn static_fields_claim_storage_names() {
        let program = table(vec![ManagedClass::new("app.A", None)
            .with_field(FieldDecl::of_static("shared", int()))
            .with_field(FieldDecl::instance("local", int()))]);
        let names = NameProvider::build(&program, &[], |_| false);

        assert_eq!(
            names.for_static_field("app.A", "shared").unwrap(),
            "os_app_A_shared"
        );
        assert!(names.for_static_field("app.A", "local").is_err());
    }
}
