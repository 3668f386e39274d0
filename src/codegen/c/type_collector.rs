//! Collection of every runtime type that needs a metadata instance.
//!
//! Class types come from the class table itself; array and primitive types
//! only exist in the output if something mentions them, either as a class
//! constant in a body or as the element of a collected array. Collection
//! order is emission order for the metadata section, so it is fixed here:
//! classes in resolved class order, then body-discovered types in
//! declaration order, elements before their arrays.

use std::collections::HashMap;

use crate::model::{ClassTable, Instruction, ValueType};

use super::characteristics::Characteristics;
use super::class_order::ClassOrder;

#[derive(Debug, Default)]
pub struct CollectedTypes {
    types: Vec<ValueType>,
    index: HashMap<ValueType, usize>,
}

impl CollectedTypes {
    #[must_use]
    pub fn types(&self) -> &[ValueType] {
        &self.types
    }

    #[must_use]
    pub fn contains(&self, ty: &ValueType) -> bool {
        self.index.contains_key(ty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn add(&mut self, traits: &Characteristics, ty: &ValueType) {
        if let ValueType::Array(item) = ty {
            self.add(traits, item);
        }
        if let ValueType::Object(name) = ty {
            // Plain-data and unknown classes have no metadata to emit.
            if !traits.is_known(name) || traits.is_plain_data(name) {
                return;
            }
        }
        if self.index.contains_key(ty) {
            return;
        }
        self.index.insert(ty.clone(), self.types.len());
        self.types.push(ty.clone());
    }
}

#[must_use]
pub fn collect_types(
    program: &ClassTable,
    order: &ClassOrder,
    traits: &Characteristics,
) -> CollectedTypes {
    let mut collected = CollectedTypes::default();
    for name in order.names() {
        collected.add(traits, &ValueType::object(name.as_str()));
    }
    for class in program {
        for method in &class.methods {
            let Some(body) = method.body.as_ref() else {
                continue;
            };
            for instruction in body.instructions() {
                if let Instruction::ClassConstant { ty } = instruction {
                    collected.add(traits, ty);
                }
            }
        }
    }
    collected
}
