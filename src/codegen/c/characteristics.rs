//! Per-class traits the generators query repeatedly.
//!
//! Plain-data classes descend from the designated plain-data root. They are
//! laid out as bare C structs: no object header, no metadata instance, no
//! virtual table, and their initializers cannot defer to first touch.

use std::collections::HashSet;

use crate::model::{ClassTable, ValueType, well_known};

pub struct Characteristics {
    known: HashSet<String>,
    plain_data: HashSet<String>,
}

impl Characteristics {
    #[must_use]
    pub fn compute(program: &ClassTable) -> Self {
        let known: HashSet<String> = program.names().map(str::to_owned).collect();
        let mut plain_data = HashSet::new();
        for class in program {
            if is_plain_chain(program, &class.name) {
                plain_data.insert(class.name.clone());
            }
        }
        Self { known, plain_data }
    }

    #[must_use]
    pub fn is_known(&self, class: &str) -> bool {
        self.known.contains(class)
    }

    #[must_use]
    pub fn is_plain_data(&self, class: &str) -> bool {
        self.plain_data.contains(class)
    }

    /// Whether a runtime type dispatches through a virtual table. All array
    /// types do; a class does unless it is plain data or unknown; primitives
    /// never do.
    #[must_use]
    pub fn needs_virtual_table(&self, ty: &ValueType) -> bool {
        match ty {
            ValueType::Object(name) => self.is_known(name) && !self.is_plain_data(name),
            ValueType::Array(_) => true,
            ValueType::Primitive(_) => false,
        }
    }
}

fn is_plain_chain(program: &ClassTable, name: &str) -> bool {
    if name == well_known::STRUCT {
        return true;
    }
    let mut visited = HashSet::new();
    let mut current = program.get(name).and_then(|c| c.superclass.as_deref());
    while let Some(parent) = current {
        if parent == well_known::STRUCT {
            return true;
        }
        if !visited.insert(parent.to_owned()) {
            break;
        }
        current = program.get(parent).and_then(|c| c.superclass.as_deref());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ManagedClass, PrimitiveKind};

    fn program() -> ClassTable {
        let mut table = ClassTable::new();
        table.push(ManagedClass::new("core.Object", None));
        table.push(ManagedClass::new("app.Header", Some("core.Struct")));
        table.push(ManagedClass::new("app.PacketHeader", Some("app.Header")));
        table.push(ManagedClass::new("app.Widget", Some("core.Object")));
        table
    }

    #[test]
    fn plain_data_follows_the_superclass_chain() {
        let traits = Characteristics::compute(&program());
        assert!(traits.is_plain_data("app.Header"));
        assert!(traits.is_plain_data("app.PacketHeader"));
        assert!(!traits.is_plain_data("app.Widget"));
        assert!(!traits.is_plain_data("core.Object"));
    }

    #[test]
    fn virtual_tables_go_to_known_non_plain_classes_and_arrays() {
        let traits = Characteristics::compute(&program());
        assert!(traits.needs_virtual_table(&ValueType::object("app.Widget")));
        assert!(!traits.needs_virtual_table(&ValueType::object("app.Header")));
        assert!(!traits.needs_virtual_table(&ValueType::object("app.Missing")));
        assert!(traits.needs_virtual_table(&ValueType::array_of(ValueType::Primitive(
            PrimitiveKind::Int
        ))));
        assert!(!traits.needs_virtual_table(&ValueType::Primitive(PrimitiveKind::Long)));
    }
}
