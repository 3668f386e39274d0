//! Topological ordering of classes by superclass dependency.
//!
//! Struct embedding requires every superclass to be defined before any
//! subclass that extends it, so emission walks classes in this order. Among
//! unrelated classes the input declaration order is preserved.

use std::collections::HashMap;

use tracing::warn;

use crate::model::{ClassTable, well_known};

/// Resolved emission order plus a position lookup. Positions index the
/// layout-descriptor table, so they must stay stable once resolved.
#[derive(Debug)]
pub struct ClassOrder {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ClassOrder {
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn position_of(&self, class: &str) -> Option<usize> {
        self.positions.get(class).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
    Visiting,
    Finished,
}

/// Iterative depth-first finish-order sort over the superclass relation.
///
/// A class without a superclass depends on the universal root; a superclass
/// equal to the plain-data root ends the chain (plain-data types embed no
/// managed ancestor). A superclass name that resolves to no known class is
/// tolerated and treated as the universal root, matching the source
/// language's permissive linking model.
#[must_use]
pub fn resolve_class_order(program: &ClassTable) -> ClassOrder {
    let mut states: HashMap<&str, VisitState> = HashMap::new();
    let mut result: Vec<String> = Vec::with_capacity(program.len());

    // Seed reversed so pops follow declaration order.
    let mut stack: Vec<&str> = program.names().collect();
    stack.reverse();

    while let Some(name) = stack.pop() {
        match states.get(name) {
            None => {
                states.insert(name, VisitState::Visiting);
                stack.push(name);
                if let Some(parent) = dependency_of(program, name) {
                    if !states.contains_key(parent) {
                        stack.push(parent);
                    }
                }
            }
            Some(VisitState::Visiting) => {
                states.insert(name, VisitState::Finished);
                result.push(name.to_owned());
            }
            Some(VisitState::Finished) => {}
        }
    }

    let positions = result
        .iter()
        .enumerate()
        .map(|(position, name)| (name.clone(), position))
        .collect();
    ClassOrder {
        names: result,
        positions,
    }
}

/// The class this one must be emitted after, if any.
fn dependency_of<'a>(program: &'a ClassTable, name: &str) -> Option<&'a str> {
    let class = program.get(name)?;
    let parent = match class.superclass.as_deref() {
        Some(parent) => parent,
        None => well_known::OBJECT,
    };
    if parent == well_known::STRUCT {
        return None;
    }
    if let Some(known) = program.get(parent) {
        return Some(known.name.as_str());
    }
    if parent != well_known::OBJECT {
        warn!(
            target: "cgen",
            class = name,
            superclass = parent,
            "superclass not in class table; ordering against the root instead",
        );
    }
    program.get(well_known::OBJECT).map(|c| c.name.as_str())
}
