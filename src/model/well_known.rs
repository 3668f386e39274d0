//! Names the backend treats specially.

use super::signatures::{MethodDescriptor, MethodSignature};
use super::types::ValueType;

/// Root of the reference class hierarchy.
pub const OBJECT: &str = "core.Object";

/// Root of the plain-data hierarchy. Subclasses are laid out as bare C
/// structs without headers, virtual tables or runtime metadata.
pub const STRUCT: &str = "core.Struct";

/// Runtime metadata class; every emitted class-metadata instance is one.
pub const CLASS: &str = "core.Class";

/// Interned string class backing the string pool.
pub const STRING: &str = "core.String";

/// Reserved name of a class initializer method.
pub const CLINIT: &str = "<clinit>";

/// Mark bit pre-baked into the headers of objects that exist before the
/// collector runs, so a collection cycle never frees or moves them.
pub const GC_MARK_BIT: i32 = i32::MIN;

/// Signature every array clone dispatches through.
#[must_use]
pub fn array_clone_signature() -> MethodSignature {
    MethodSignature::new(
        OBJECT,
        "clone",
        MethodDescriptor::new(vec![], Some(ValueType::object(OBJECT))),
    )
}
