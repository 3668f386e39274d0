//! Preorder tag assignment over the subclass tree.
//!
//! Each metadata-bearing class gets a tag from a preorder walk and the
//! largest tag of its subtree as an upper bound, so `x instanceof C` in the
//! generated code is the constant-time range check
//! `tag(C) <= tag(x) && tag(x) <= upper(C)`. Tags start at 1; array and
//! primitive metadata carry tag 0 and answer through their own helpers.

use std::collections::HashMap;

use crate::model::{ClassTable, well_known};
use crate::support::graph::{Graph, GraphBuilder};

use super::characteristics::Characteristics;

/// Tag range of one class. The subtree of a class occupies exactly
/// `tag ..= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassTag {
    pub tag: i32,
    pub upper: i32,
}

#[derive(Debug)]
pub struct TagRegistry {
    tags: HashMap<String, ClassTag>,
}

impl TagRegistry {
    /// Assigns tags to every metadata-bearing class. Plain-data classes
    /// take no part; they have no metadata instance to carry a tag.
    #[must_use]
    pub fn assign(program: &ClassTable, traits: &Characteristics) -> Self {
        let nodes: Vec<&str> = program
            .names()
            .filter(|name| !traits.is_plain_data(name))
            .collect();
        let mut index: HashMap<&str, u32> = HashMap::new();
        for (position, name) in nodes.iter().enumerate() {
            index.insert(name, position as u32);
        }

        let mut builder = GraphBuilder::with_size(nodes.len());
        for (position, name) in nodes.iter().enumerate() {
            if let Some(parent) = tree_parent(program, &index, name) {
                builder.add_edge(parent, position as u32);
            }
        }
        let tree = builder.build();

        let mut tags = HashMap::new();
        let mut visited = vec![false; nodes.len()];
        let mut next_tag = 1i32;
        for root in 0..nodes.len() as u32 {
            if tree.incoming_edges_count(root) == 0 {
                assign_subtree(&tree, &nodes, root, &mut visited, &mut next_tag, &mut tags);
            }
        }
        // Cyclic inheritance leaves nodes with no in-degree-zero ancestor;
        // sweep them so lookups stay total.
        for node in 0..nodes.len() as u32 {
            if !visited[node as usize] {
                assign_subtree(&tree, &nodes, node, &mut visited, &mut next_tag, &mut tags);
            }
        }

        Self { tags }
    }

    #[must_use]
    pub fn tag_of(&self, class: &str) -> Option<ClassTag> {
        self.tags.get(class).copied()
    }
}

/// Parent node inside the tag tree. Absent, unknown, or plain-data parents
/// collapse to the universal root, mirroring the order resolver.
fn tree_parent(program: &ClassTable, index: &HashMap<&str, u32>, name: &str) -> Option<u32> {
    if name == well_known::OBJECT {
        return None;
    }
    let declared = program.get(name).and_then(|c| c.superclass.as_deref());
    let parent = match declared {
        Some(parent) if index.contains_key(parent) => parent,
        _ => well_known::OBJECT,
    };
    if parent == name {
        return None;
    }
    index.get(parent).copied()
}

enum Walk {
    Enter(u32),
    Exit(u32),
}

fn assign_subtree(
    tree: &impl Graph,
    nodes: &[&str],
    root: u32,
    visited: &mut [bool],
    next_tag: &mut i32,
    tags: &mut HashMap<String, ClassTag>,
) {
    let mut stack = vec![Walk::Enter(root)];
    while let Some(step) = stack.pop() {
        match step {
            Walk::Enter(node) => {
                if visited[node as usize] {
                    continue;
                }
                visited[node as usize] = true;
                let tag = *next_tag;
                *next_tag += 1;
                tags.insert(nodes[node as usize].to_owned(), ClassTag { tag, upper: tag });
                stack.push(Walk::Exit(node));
                for &child in tree.outgoing_edges(node).iter().rev() {
                    if !visited[child as usize] {
                        stack.push(Walk::Enter(child));
                    }
                }
            }
            Walk::Exit(node) => {
                let name = nodes[node as usize];
                if let Some(entry) = tags.get_mut(name) {
                    entry.upper = *next_tag - 1;
                }
            }
        }
    }
}
