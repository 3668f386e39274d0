//! Program model the emission backend consumes.
//!
//! The front end lowers source into these shapes; the backend only reads
//! them. Everything is declaration-ordered and name-keyed, with no backend
//! bookkeeping mixed in.

pub mod call_sites;
pub mod classes;
pub mod instructions;
pub mod signatures;
pub mod types;
pub mod well_known;

pub use call_sites::{CallSiteDescriptor, SourceLocation};
pub use classes::{ClassTable, FieldDecl, ManagedClass, MethodDecl};
pub use instructions::{BasicBlock, Instruction, InvokeKind, MethodBody};
pub use signatures::{MethodDescriptor, MethodKey, MethodSignature};
pub use types::{PrimitiveKind, ValueType};
