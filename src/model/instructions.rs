use super::signatures::MethodSignature;
use super::types::ValueType;

/// How a call site binds its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    /// Resolved at runtime through the receiver's virtual table.
    Virtual,
    /// Bound to the named implementation (constructors, super calls).
    Special,
    /// No receiver; bound to the owner's static method.
    Static,
}

/// Instruction surface the backend inspects.
///
/// Bodies carry the full front-end instruction stream; only the kinds below
/// influence registry construction, string interning and type collection,
/// so the model stops at them.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Invoke {
        kind: InvokeKind,
        target: MethodSignature,
    },
    /// Polymorphic array clone; always dispatches through the universal
    /// clone signature regardless of the array's static type.
    CloneArray,
    /// Load of an interned constant string.
    StringConstant { value: String },
    /// Load of a runtime type metadata reference.
    ClassConstant { ty: ValueType },
}

/// Straight-line instruction run ended by control flow the backend does not
/// model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicBlock {
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    #[must_use]
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

/// Control-flow body of one method, as ordered basic blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodBody {
    pub blocks: Vec<BasicBlock>,
}

impl MethodBody {
    #[must_use]
    pub fn new(blocks: Vec<BasicBlock>) -> Self {
        Self { blocks }
    }

    /// Single-block body, the common shape in tests and straight-line glue.
    #[must_use]
    pub fn of_instructions(instructions: Vec<Instruction>) -> Self {
        Self {
            blocks: vec![BasicBlock::new(instructions)],
        }
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks
            .iter()
            .flat_map(|block| block.instructions.iter())
    }
}
