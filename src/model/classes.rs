use std::collections::HashMap;

use super::instructions::MethodBody;
use super::signatures::{MethodDescriptor, MethodSignature};
use super::types::ValueType;

/// Field declaration inside a class.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: ValueType,
    pub is_static: bool,
}

impl FieldDecl {
    #[must_use]
    pub fn instance(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
        }
    }

    #[must_use]
    pub fn of_static(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: true,
        }
    }
}

/// Method declaration inside a class.
///
/// An instance method without a body is abstract; its slot still exists in
/// the owner's virtual table and resolves to the nearest concrete override.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub descriptor: MethodDescriptor,
    pub is_static: bool,
    pub body: Option<MethodBody>,
}

impl MethodDecl {
    #[must_use]
    pub fn instance(
        name: impl Into<String>,
        descriptor: MethodDescriptor,
        body: Option<MethodBody>,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor,
            is_static: false,
            body,
        }
    }

    #[must_use]
    pub fn of_static(
        name: impl Into<String>,
        descriptor: MethodDescriptor,
        body: Option<MethodBody>,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor,
            is_static: true,
            body,
        }
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// One class as the front end delivered it.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedClass {
    pub name: String,
    pub superclass: Option<String>,
    /// Initialize eagerly during startup rather than on first touch.
    pub eager_init: bool,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

impl ManagedClass {
    #[must_use]
    pub fn new(name: impl Into<String>, superclass: Option<&str>) -> Self {
        Self {
            name: name.into(),
            superclass: superclass.map(str::to_owned),
            eager_init: false,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_eager_init(mut self) -> Self {
        self.eager_init = true;
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn method(&self, name: &str, descriptor: &MethodDescriptor) -> Option<&MethodDecl> {
        self.methods
            .iter()
            .find(|m| m.name == name && &m.descriptor == descriptor)
    }

    /// Signature of a declared method, owned by this class.
    #[must_use]
    pub fn signature_of(&self, method: &MethodDecl) -> MethodSignature {
        MethodSignature::new(self.name.clone(), method.name.clone(), method.descriptor.clone())
    }
}

/// All classes of the program keyed by name, preserving declaration order.
///
/// Declaration order is observable downstream: it seeds class ordering and
/// therefore the layout of every emitted metadata table, so the table never
/// reorders what it was given.
#[derive(Debug, Default, Clone)]
pub struct ClassTable {
    classes: Vec<ManagedClass>,
    index: HashMap<String, usize>,
}

impl ClassTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class. A later declaration under an existing name wins,
    /// matching front-end redefinition semantics.
    pub fn push(&mut self, class: ManagedClass) {
        match self.index.get(class.name.as_str()) {
            Some(&slot) => self.classes[slot] = class,
            None => {
                self.index.insert(class.name.clone(), self.classes.len());
                self.classes.push(class);
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ManagedClass> {
        self.index.get(name).map(|&slot| &self.classes[slot])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManagedClass> {
        self.classes.iter()
    }

    /// Class names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|class| class.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl<'a> IntoIterator for &'a ClassTable {
    type Item = &'a ManagedClass;
    type IntoIter = std::slice::Iter<'a, ManagedClass>;

    fn into_iter(self) -> Self::IntoIter {
        self.classes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::PrimitiveKind;

    fn int() -> ValueType {
        ValueType::Primitive(PrimitiveKind::Int)
    }

    #[test]
    fn table_preserves_declaration_order() {
        let mut table = ClassTable::new();
        table.push(ManagedClass::new("app.B", Some("core.Object")));
        table.push(ManagedClass::new("app.A", Some("core.Object")));
        table.push(ManagedClass::new("core.Object", None));

        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, ["app.B", "app.A", "core.Object"]);
    }

    #[test]
    fn redefinition_replaces_in_place() {
        let mut table = ClassTable::new();
        table.push(ManagedClass::new("app.A", None));
        table.push(ManagedClass::new("app.B", None));
        table.push(
            ManagedClass::new("app.A", Some("core.Object"))
                .with_field(FieldDecl::instance("count", int())),
        );

        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, ["app.A", "app.B"]);

        let class = table.get("app.A").unwrap();
        assert_eq!(class.superclass.as_deref(), Some("core.Object"));
        assert_eq!(class.fields.len(), 1);
    }

    #[test]
    fn method_lookup_matches_name_and_descriptor() {
        let class = ManagedClass::new("app.A", None)
            .with_method(MethodDecl::instance(
                "run",
                MethodDescriptor::new(vec![], None),
                None,
            ))
            .with_method(MethodDecl::instance(
                "run",
                MethodDescriptor::new(vec![int()], None),
                Some(MethodBody::default()),
            ));

        let nullary = class.method("run", &MethodDescriptor::new(vec![], None)).unwrap();
        assert!(!nullary.has_body());

        let unary = class.method("run", &MethodDescriptor::new(vec![int()], None)).unwrap();
        assert!(unary.has_body());
    }
}
