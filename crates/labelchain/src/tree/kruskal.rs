//! Kruskal's minimum spanning tree over a complete weighted graph.

use std::cmp::Ordering;

/// Undirected weighted edge with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}

/// Disjoint sets with path halving and union by rank.
#[derive(Debug, Clone)]
struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; `false` if they were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.rank[ra] < self.rank[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        if self.rank[ra] == self.rank[rb] {
            self.rank[ra] += 1;
        }
        true
    }
}

/// Minimum spanning tree of the complete graph on `n` vertices.
///
/// `weight(a, b)` is queried once for every pair `a < b`. Edges are taken in
/// ascending weight; equal weights are taken in `(a, b)` lexicographic order,
/// which makes the result deterministic. Returns `n - 1` edges (none for
/// `n <= 1`).
pub fn minimum_spanning_tree(n: usize, weight: impl Fn(usize, usize) -> f64) -> Vec<Edge> {
    let mut edges: Vec<Edge> = (0..n)
        .flat_map(|a| ((a + 1)..n).map(move |b| (a, b)))
        .map(|(a, b)| Edge {
            a,
            b,
            weight: weight(a, b),
        })
        .collect();
    edges.sort_by(|x, y| x.weight.partial_cmp(&y.weight).unwrap_or(Ordering::Equal));

    let mut sets = DisjointSets::new(n);
    let mut tree = Vec::with_capacity(n.saturating_sub(1));
    for edge in edges {
        if tree.len() + 1 >= n {
            break;
        }
        if sets.union(edge.a, edge.b) {
            tree.push(edge);
        }
    }
    tree
}
