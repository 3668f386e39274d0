//! Read-only directed graph queries shared by ordering and metadata passes.
//!
//! Graphs are always built once, fully, through [`GraphBuilder`] and queried
//! afterwards; no mutation is possible on a built graph.

/// Query surface over an immutable directed graph with nodes `0..size()`.
pub trait Graph {
    /// Number of nodes in the graph.
    fn size(&self) -> usize;

    /// All edges pointing at `node`, as source node ids.
    fn incoming_edges(&self, node: u32) -> &[u32];

    /// All edges leaving `node`, as target node ids.
    fn outgoing_edges(&self, node: u32) -> &[u32];

    fn incoming_edges_count(&self, node: u32) -> usize {
        self.incoming_edges(node).len()
    }

    fn outgoing_edges_count(&self, node: u32) -> usize {
        self.outgoing_edges(node).len()
    }

    /// Copy incoming edges of `node` into `target` without allocating and
    /// return the number of entries written.
    fn copy_incoming_edges(&self, node: u32, target: &mut [u32]) -> usize {
        let edges = self.incoming_edges(node);
        let count = edges.len().min(target.len());
        target[..count].copy_from_slice(&edges[..count]);
        count
    }

    /// Copy outgoing edges of `node` into `target` without allocating and
    /// return the number of entries written.
    fn copy_outgoing_edges(&self, node: u32, target: &mut [u32]) -> usize {
        let edges = self.outgoing_edges(node);
        let count = edges.len().min(target.len());
        target[..count].copy_from_slice(&edges[..count]);
        count
    }
}

/// Accumulates edges and produces a compact [`DirectedGraph`].
///
/// Duplicate edges are collapsed at build time; the first occurrence decides
/// the position in the adjacency list, so construction order stays visible
/// in query results.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    edges: Vec<(u32, u32)>,
    size: usize,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder sized up front; `add_edge` still grows the node range as
    /// needed.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self {
            edges: Vec::new(),
            size,
        }
    }

    pub fn add_edge(&mut self, from: u32, to: u32) {
        let upper = (from.max(to) as usize) + 1;
        if upper > self.size {
            self.size = upper;
        }
        self.edges.push((from, to));
    }

    #[must_use]
    pub fn build(&self) -> DirectedGraph {
        let size = self.size;
        let mut outgoing: Vec<Vec<u32>> = vec![Vec::new(); size];
        let mut incoming: Vec<Vec<u32>> = vec![Vec::new(); size];
        for &(from, to) in &self.edges {
            let targets = &mut outgoing[from as usize];
            if targets.contains(&to) {
                continue;
            }
            targets.push(to);
            incoming[to as usize].push(from);
        }
        DirectedGraph::from_adjacency(&outgoing, &incoming)
    }
}

/// Compact directed graph storing both edge directions in CSR form: one flat
/// edge array per direction plus per-node offsets.
#[derive(Debug, Clone)]
pub struct DirectedGraph {
    outgoing: Vec<u32>,
    outgoing_offsets: Vec<usize>,
    incoming: Vec<u32>,
    incoming_offsets: Vec<usize>,
}

impl DirectedGraph {
    fn from_adjacency(outgoing: &[Vec<u32>], incoming: &[Vec<u32>]) -> Self {
        let (outgoing, outgoing_offsets) = flatten(outgoing);
        let (incoming, incoming_offsets) = flatten(incoming);
        Self {
            outgoing,
            outgoing_offsets,
            incoming,
            incoming_offsets,
        }
    }
}

fn flatten(lists: &[Vec<u32>]) -> (Vec<u32>, Vec<usize>) {
    let total = lists.iter().map(Vec::len).sum();
    let mut flat = Vec::with_capacity(total);
    let mut offsets = Vec::with_capacity(lists.len() + 1);
    offsets.push(0);
    for list in lists {
        flat.extend_from_slice(list);
        offsets.push(flat.len());
    }
    (flat, offsets)
}

impl Graph for DirectedGraph {
    fn size(&self) -> usize {
        self.outgoing_offsets.len().saturating_sub(1)
    }

    fn incoming_edges(&self, node: u32) -> &[u32] {
        let node = node as usize;
        &self.incoming[self.incoming_offsets[node]..self.incoming_offsets[node + 1]]
    }

    fn outgoing_edges(&self, node: u32) -> &[u32] {
        let node = node as usize;
        &self.outgoing[self.outgoing_offsets[node]..self.outgoing_offsets[node + 1]]
    }
}
