//! Virtual table layout and per-class slot resolution.
//!
//! A slot belongs to the topmost class that declares a virtually-dispatched
//! method; every descendant repeats the inherited slots first and appends
//! its own, so a slot's offset is identical across the whole subtree and a
//! call site can index any descendant's table with the one offset it knows.
//! Each class then resolves every slot to its nearest concrete
//! implementation, walking ancestors from itself upward.

use std::collections::{HashMap, HashSet};

use crate::model::{ClassTable, MethodKey, MethodSignature, well_known};

use super::characteristics::Characteristics;
use super::class_order::ClassOrder;
use super::names;
use super::registry::VirtualRegistry;

/// One slot of a class's table.
#[derive(Debug, Clone)]
pub struct VTableSlot {
    pub slot_index: u32,
    pub key: MethodKey,
    /// C member name inside the table struct; stable across the subtree.
    pub field: String,
    /// Nearest concrete implementation, `None` while the slot is abstract.
    pub implementation: Option<MethodSignature>,
}

#[derive(Debug, Clone)]
pub struct ClassVTable {
    pub class: String,
    pub slots: Vec<VTableSlot>,
}

impl ClassVTable {
    #[must_use]
    pub fn slot_for(&self, key: &MethodKey) -> Option<&VTableSlot> {
        self.slots.iter().find(|slot| &slot.key == key)
    }
}

#[derive(Debug)]
pub struct VirtualTableProvider {
    tables: HashMap<String, ClassVTable>,
}

impl VirtualTableProvider {
    /// Lays out tables for every metadata-bearing class, parents before
    /// children so inherited slots can be copied forward.
    #[must_use]
    pub fn build(
        program: &ClassTable,
        order: &ClassOrder,
        traits: &Characteristics,
        registry: &VirtualRegistry,
    ) -> Self {
        let mut tables: HashMap<String, ClassVTable> = HashMap::new();
        for name in order.names() {
            if traits.is_plain_data(name) {
                continue;
            }
            let Some(class) = program.get(name) else {
                continue;
            };

            let mut slots: Vec<VTableSlot> = dispatch_parent(program, traits, name)
                .and_then(|parent| tables.get(parent))
                .map(|table| table.slots.clone())
                .unwrap_or_default();
            let mut fields: HashSet<String> = slots.iter().map(|s| s.field.clone()).collect();
            // The table struct's leading metadata member.
            fields.insert("base".to_owned());
            let mut keys: HashSet<MethodKey> = slots.iter().map(|s| s.key.clone()).collect();

            for method in &class.methods {
                if method.is_static {
                    continue;
                }
                let key = MethodKey {
                    name: method.name.clone(),
                    descriptor: method.descriptor.clone(),
                };
                if !registry.contains_key(&key) || keys.contains(&key) {
                    continue;
                }
                let field = names::claim_member(&mut fields, &key.name);
                slots.push(VTableSlot {
                    slot_index: slots.len() as u32,
                    key: key.clone(),
                    field,
                    implementation: None,
                });
                keys.insert(key);
            }

            for slot in &mut slots {
                slot.implementation = resolve_implementation(program, traits, name, &slot.key);
            }

            tables.insert(
                name.clone(),
                ClassVTable {
                    class: name.clone(),
                    slots,
                },
            );
        }
        Self { tables }
    }

    #[must_use]
    pub fn table_of(&self, class: &str) -> Option<&ClassVTable> {
        self.tables.get(class)
    }
}

/// The class whose table this one extends, if any.
fn dispatch_parent<'a>(
    program: &'a ClassTable,
    traits: &Characteristics,
    name: &str,
) -> Option<&'a str> {
    if name == well_known::OBJECT {
        return None;
    }
    let declared = program.get(name).and_then(|c| c.superclass.as_deref());
    let parent = match declared {
        Some(parent) if traits.is_known(parent) && !traits.is_plain_data(parent) => parent,
        _ => well_known::OBJECT,
    };
    if parent == name || !traits.is_known(parent) || traits.is_plain_data(parent) {
        return None;
    }
    program.get(parent).map(|c| c.name.as_str())
}

/// Walks `start` and its ancestors for the nearest instance method with a
/// body matching `key`. Abstract redeclarations are skipped.
fn resolve_implementation(
    program: &ClassTable,
    traits: &Characteristics,
    start: &str,
    key: &MethodKey,
) -> Option<MethodSignature> {
    let mut visited = HashSet::new();
    let mut current = Some(start);
    while let Some(name) = current {
        if !visited.insert(name.to_owned()) {
            break;
        }
        let class = program.get(name)?;
        let found = class.methods.iter().find(|m| {
            !m.is_static && m.has_body() && m.name == key.name && m.descriptor == key.descriptor
        });
        if let Some(method) = found {
            return Some(class.signature_of(method));
        }
        current = dispatch_parent(program, traits, name);
    }
    None
}
