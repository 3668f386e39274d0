//! Shared lookup state threaded through the section generators.
//!
//! Everything here is resolved before the first byte is written: the section
//! generators only read. Type mapping, struct layout planning and metadata
//! shape decisions live here because several sections need the same answers
//! and must agree on them.

use std::collections::HashSet;

use crate::error::Result;
use crate::model::{ClassTable, FieldDecl, ManagedClass, PrimitiveKind, ValueType, well_known};

use super::characteristics::Characteristics;
use super::class_order::ClassOrder;
use super::names::{self, NameProvider};
use super::string_pool::StringPool;
use super::tags::TagRegistry;
use super::type_collector::CollectedTypes;
use super::vtables::VirtualTableProvider;

pub struct GenerationContext<'a> {
    pub program: &'a ClassTable,
    pub traits: &'a Characteristics,
    pub order: &'a ClassOrder,
    pub tags: &'a TagRegistry,
    pub collected: &'a CollectedTypes,
    pub vtables: &'a VirtualTableProvider,
    pub names: &'a NameProvider,
    pub pool: &'a StringPool,
}

/// How a collected type's metadata instance is typed in the unit.
///
/// Classes with virtual dispatch get an instance of their own table struct,
/// whose first member is the plain metadata record. Arrays dispatch through
/// the root class's table. Everything else is a bare metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataShape<'a> {
    VTable(&'a str),
    Bare,
}

/// What the first member of a class struct is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructEmbed<'a> {
    /// Managed class at the top of its chain: the raw object header.
    RuntimeObject,
    /// The superclass struct, embedded by value at offset zero.
    Class(&'a str),
    /// Plain-data class with nothing above it.
    None,
}

/// Layout of one emitted class struct: the embedded prefix plus the class's
/// own instance fields with their claimed C member names.
pub struct StructPlan<'a> {
    pub embed: StructEmbed<'a>,
    pub members: Vec<(String, &'a FieldDecl)>,
}

impl<'a> GenerationContext<'a> {
    /// C type of a value of `ty`. Known classes surface as pointers to their
    /// own struct, unknown ones decay to the raw object header pointer.
    pub fn c_type_of(&self, ty: &ValueType) -> Result<String> {
        Ok(match ty {
            ValueType::Primitive(kind) => primitive_c_type(*kind).to_owned(),
            ValueType::Object(name) if self.traits.is_known(name) => {
                format!("{}*", self.names.for_class(name)?)
            }
            ValueType::Object(_) => format!("{}*", names::RT_OBJECT),
            ValueType::Array(_) => format!("{}*", names::RT_ARRAY),
        })
    }

    /// C return type of a method, `void` when it returns nothing.
    pub fn c_return_type_of(&self, ret: Option<&ValueType>) -> Result<String> {
        match ret {
            Some(ty) => self.c_type_of(ty),
            None => Ok("void".to_owned()),
        }
    }

    /// Type shape of the metadata instance emitted for `ty`.
    pub fn metadata_shape(&self, ty: &ValueType) -> Result<MetadataShape<'a>> {
        match ty {
            ValueType::Object(name) if self.traits.needs_virtual_table(ty) => {
                Ok(MetadataShape::VTable(self.names.for_vtable_struct(name)?))
            }
            ValueType::Array(_) => {
                let object = ValueType::object(well_known::OBJECT);
                if self.collected.contains(&object) && self.traits.needs_virtual_table(&object) {
                    Ok(MetadataShape::VTable(
                        self.names.for_vtable_struct(well_known::OBJECT)?,
                    ))
                } else {
                    Ok(MetadataShape::Bare)
                }
            }
            _ => Ok(MetadataShape::Bare),
        }
    }

    /// C lvalue of the header word inside `ty`'s metadata instance, for the
    /// stamping loop the entry function runs before anything allocates.
    pub fn metadata_header_lvalue(&self, ty: &ValueType) -> Result<String> {
        let instance = self.names.for_metadata(ty)?;
        Ok(match self.metadata_shape(ty)? {
            MetadataShape::VTable(_) => format!("{instance}.base.object.header"),
            MetadataShape::Bare => format!("{instance}.object.header"),
        })
    }

    /// Plans the struct body for one class: what to embed first and which C
    /// member name each instance field gets. Member names are claimed per
    /// struct, so colliding or keyword field names pick up counters without
    /// affecting any other class.
    pub fn struct_plan(&self, class: &'a ManagedClass) -> Result<StructPlan<'a>> {
        let embed = self.embedded_parent(class)?;
        let mut taken = HashSet::new();
        if !matches!(embed, StructEmbed::None) {
            taken.insert("parent".to_owned());
        }
        let members = class
            .fields
            .iter()
            .filter(|field| !field.is_static)
            .map(|field| (names::claim_member(&mut taken, &field.name), field))
            .collect();
        Ok(StructPlan { embed, members })
    }

    fn embedded_parent(&self, class: &'a ManagedClass) -> Result<StructEmbed<'a>> {
        let plain = self.traits.is_plain_data(&class.name);
        let parent = class
            .superclass
            .as_deref()
            .filter(|parent| *parent != class.name && self.traits.is_known(parent))
            .filter(|parent| {
                if plain {
                    *parent != well_known::STRUCT
                } else {
                    !self.traits.is_plain_data(parent)
                }
            })
            // Embedding is by value, so the parent struct must already be
            // complete where the child is defined. Cyclic chains fail this
            // and fall back below instead of embedding forever.
            .filter(|parent| self.defined_before(parent, &class.name));
        match parent {
            Some(parent) => Ok(StructEmbed::Class(self.names.for_class(parent)?)),
            None if plain => Ok(StructEmbed::None),
            None => Ok(StructEmbed::RuntimeObject),
        }
    }

    fn defined_before(&self, parent: &str, class: &str) -> bool {
        match (self.order.position_of(parent), self.order.position_of(class)) {
            (Some(parent), Some(class)) => parent < class,
            _ => false,
        }
    }

    /// Whether a field of type `ty` holds a collector-visible reference.
    pub fn is_traced_reference(&self, ty: &ValueType) -> bool {
        match ty {
            ValueType::Object(name) => !self.traits.is_plain_data(name),
            ValueType::Array(_) => true,
            ValueType::Primitive(_) => false,
        }
    }
}

/// Fixed-width C spelling of a primitive value type.
pub(crate) fn primitive_c_type(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Boolean => "uint8_t",
        PrimitiveKind::Byte => "int8_t",
        PrimitiveKind::Short => "int16_t",
        PrimitiveKind::Char => "uint16_t",
        PrimitiveKind::Int => "int32_t",
        PrimitiveKind::Long => "int64_t",
        PrimitiveKind::Float => "float",
        PrimitiveKind::Double => "double",
    }
}

/// Size expression for one element of an array of `item`.
pub(crate) fn element_size_expr(item: &ValueType) -> String {
    match item {
        ValueType::Primitive(kind) => format!("sizeof({})", primitive_c_type(*kind)),
        _ => "sizeof(void*)".to_owned(),
    }
}
