//! Graph traversals over [`IdGraph`]
//!
//! Breadth-first reachability and strongly connected components. Both use
//! explicit visited state so cyclic graphs terminate.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashSet;

use super::id_graph::{GraphError, GraphResult, IdGraph, NodeId};

impl<N> IdGraph<N>
where
    N: Clone + Eq + Hash + fmt::Debug,
{
    /// BFS from `roots`, returning ids in visit order
    pub fn bfs(&self, roots: &[NodeId]) -> GraphResult<Vec<NodeId>> {
        self.bfs_filtered(roots, |_| true)
    }

    /// BFS where `expand(id) == false` stops traversal at `id`
    ///
    /// A node that is not expanded is still reported as visited. Unknown
    /// root ids fail before any traversal happens.
    pub fn bfs_filtered<F>(&self, roots: &[NodeId], mut expand: F) -> GraphResult<Vec<NodeId>>
    where
        F: FnMut(NodeId) -> bool,
    {
        if let Some(bad) = roots.iter().find(|id| !self.contains_id(**id)) {
            return Err(GraphError::UnknownId(bad.index()));
        }

        let mut visited = vec![false; self.node_count()];
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        for &root in roots {
            if !visited[root.index()] {
                visited[root.index()] = true;
                queue.push_back(root);
            }
        }

        while let Some(current) = queue.pop_front() {
            order.push(current);
            if !expand(current) {
                continue;
            }
            for &next in self.succ(current) {
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    queue.push_back(next);
                }
            }
        }

        Ok(order)
    }

    /// Set of ids reachable from `roots` (roots included)
    pub fn reachable_from(&self, roots: &[NodeId]) -> GraphResult<FxHashSet<NodeId>> {
        Ok(self.bfs(roots)?.into_iter().collect())
    }

    /// Strongly connected components (Tarjan via petgraph)
    ///
    /// Components come back in reverse topological order; ids inside a
    /// component are sorted so the output is deterministic.
    pub fn sccs(&self) -> Vec<Vec<NodeId>> {
        let mut pg: DiGraph<NodeId, ()> = DiGraph::with_capacity(self.node_count(), self.edge_count());
        let indices: Vec<NodeIndex> = self.node_ids().map(|id| pg.add_node(id)).collect();
        for (from, to) in self.edges() {
            pg.add_edge(indices[from.index()], indices[to.index()], ());
        }

        tarjan_scc(&pg)
            .into_iter()
            .map(|component| {
                let mut ids: Vec<NodeId> = component.into_iter().map(|ix| pg[ix]).collect();
                ids.sort();
                ids
            })
            .collect()
    }

    /// Components that form a cycle (size > 1, or a self loop)
    pub fn cycles(&self) -> Vec<Vec<NodeId>> {
        self.sccs()
            .into_iter()
            .filter(|c| c.len() > 1 || self.contains_edge(c[0], c[0]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_with_loop() -> (IdGraph<&'static str>, Vec<NodeId>) {
        let mut g = IdGraph::new();
        let ids: Vec<_> = ["a", "b", "c", "d", "island"]
            .into_iter()
            .map(|n| g.add_node(n))
            .collect();
        g.add_edge(ids[0], ids[1]).unwrap();
        g.add_edge(ids[1], ids[2]).unwrap();
        g.add_edge(ids[2], ids[1]).unwrap();
        g.add_edge(ids[2], ids[3]).unwrap();
        (g, ids)
    }

    #[test]
    fn test_bfs_terminates_on_cycles() {
        let (g, ids) = chain_with_loop();
        let order = g.bfs(&[ids[0]]).unwrap();
        assert_eq!(order, vec![ids[0], ids[1], ids[2], ids[3]]);
    }

    #[test]
    fn test_bfs_filtered_stops_at_barrier() {
        let (g, ids) = chain_with_loop();
        let order = g.bfs_filtered(&[ids[0]], |id| id != ids[1]).unwrap();
        assert_eq!(order, vec![ids[0], ids[1]]);
    }

    #[test]
    fn test_bfs_unknown_root_fails() {
        let (g, _) = chain_with_loop();
        assert_eq!(g.bfs(&[NodeId(42)]), Err(GraphError::UnknownId(42)));
    }

    #[test]
    fn test_sccs_find_loop() {
        let (g, ids) = chain_with_loop();
        let cycles = g.cycles();
        assert_eq!(cycles, vec![vec![ids[1], ids[2]]]);
        assert_eq!(g.sccs().len(), 4);
    }
}
