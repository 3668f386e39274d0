//! Collection of every method the program dispatches virtually.
//!
//! One linear scan over all reachable bodies. Virtual invokes contribute
//! their target signature; array clones contribute the universal clone
//! signature, since a clone dispatches through the receiver's table like
//! any other virtual call. There is no fixpoint: a signature is in or out
//! after the single pass, and an empty registry is a valid result that
//! still yields zero-slot tables downstream.

use std::collections::HashSet;

use tracing::debug;

use crate::model::{ClassTable, Instruction, InvokeKind, MethodKey, MethodSignature, well_known};

/// Accumulates dispatch targets during the scan.
#[derive(Debug, Default)]
pub struct VirtualRegistryBuilder {
    signatures: Vec<MethodSignature>,
    seen: HashSet<MethodSignature>,
    keys: Vec<MethodKey>,
    seen_keys: HashSet<MethodKey>,
}

impl VirtualRegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one dispatch target. Repeats are collapsed; first occurrence
    /// fixes the ordering.
    pub fn add(&mut self, signature: MethodSignature) {
        let key = signature.key();
        if self.seen_keys.insert(key.clone()) {
            self.keys.push(key);
        }
        if self.seen.insert(signature.clone()) {
            self.signatures.push(signature);
        }
    }

    /// Runs the single pass over every body in the program and freezes the
    /// result.
    #[must_use]
    pub fn scan_program(program: &ClassTable) -> VirtualRegistry {
        let mut builder = Self::new();
        for class in program {
            for method in &class.methods {
                let Some(body) = method.body.as_ref() else {
                    continue;
                };
                for instruction in body.instructions() {
                    match instruction {
                        Instruction::Invoke {
                            kind: InvokeKind::Virtual,
                            target,
                        } => builder.add(target.clone()),
                        Instruction::CloneArray => {
                            builder.add(well_known::array_clone_signature());
                        }
                        Instruction::Invoke { .. }
                        | Instruction::StringConstant { .. }
                        | Instruction::ClassConstant { .. } => {}
                    }
                }
            }
        }
        builder.freeze()
    }

    #[must_use]
    pub fn freeze(self) -> VirtualRegistry {
        debug!(
            target: "cgen",
            virtual_targets = self.signatures.len(),
            dispatch_keys = self.keys.len(),
        );
        VirtualRegistry {
            signatures: self.signatures,
            keys: self.keys,
            key_set: self.seen_keys,
        }
    }
}

/// Frozen dispatch surface. No mutation API exists past this point; table
/// layout downstream relies on the orderings staying fixed.
#[derive(Debug)]
pub struct VirtualRegistry {
    signatures: Vec<MethodSignature>,
    keys: Vec<MethodKey>,
    key_set: HashSet<MethodKey>,
}

impl VirtualRegistry {
    /// Distinct dispatch keys (name + descriptor, owner ignored) in first
    /// occurrence order. Slot assignment iterates this.
    #[must_use]
    pub fn keys(&self) -> &[MethodKey] {
        &self.keys
    }

    /// Full target signatures as scanned, deduplicated.
    #[must_use]
    pub fn signatures(&self) -> &[MethodSignature] {
        &self.signatures
    }

    #[must_use]
    pub fn contains_key(&self, key: &MethodKey) -> bool {
        self.key_set.contains(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
