use std::collections::VecDeque;

/// An undirected sector adjacency graph in compressed sparse row format.
#[derive(Debug, Default, Clone)]
pub(crate) struct Graph {
    size: usize,
    offsets: Vec<u32>,
    edges: Vec<u32>,
}

impl Graph {
    /// Construct a graph from adjacency lists. Each list is sorted and deduplicated.
    pub(crate) fn new(num_nodes: usize, edges: &[Vec<u32>]) -> Self {
        assert!(edges.len() == num_nodes, "edges.len() must equal num_nodes");

        let edges = edges.iter()
            .map(|list| {
                let mut list = list.clone();
                list.sort_unstable();
                list.dedup();
                list
            })
            .collect::<Vec<_>>();

        Self {
            size: num_nodes,
            offsets: std::iter::once(0u32).chain(
                edges.iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {*acc += len; Some(*acc)})
            ).collect::<Vec<u32>>(),
            edges: edges.iter().flatten().copied().collect(),
        }
    }

    /// Get the number of nodes in the graph.
    #[inline] pub(crate) fn node_count(&self) -> usize { self.size }

    /// Get the number of directed edge entries (twice the number of undirected edges).
    #[inline] pub(crate) fn edge_count(&self) -> usize { self.edges.len() }

    /// Get the range of edges for a given node.
    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub(crate) fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Get an iterator over the neighbors of a given node, ascending.
    #[inline]
    pub(crate) fn edges(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.range(node).map(move |v| self.edges[v] as usize)
    }

    /// Returns `true` if `a` and `b` are adjacent (binary search).
    #[inline]
    pub(crate) fn contains_edge(&self, a: usize, b: usize) -> bool {
        self.edges[self.range(a)].binary_search(&(b as u32)).is_ok()
    }

    /// Partition `nodes` into maximal connected components of the subgraph they induce.
    ///
    /// Components are listed in order of their smallest node, and each component
    /// is sorted ascending.
    pub(crate) fn components_of(&self, nodes: impl IntoIterator<Item = usize>) -> Vec<Vec<usize>> {
        let mut in_subgraph = vec![false; self.size];
        let mut subgraph = Vec::new();
        for u in nodes {
            assert!(u < self.size, "node {} out of range", u);
            if !in_subgraph[u] { in_subgraph[u] = true; subgraph.push(u); }
        }
        subgraph.sort_unstable();

        let mut components = Vec::new();
        let mut visited = vec![false; self.size];
        for &u in &subgraph {
            if visited[u] { continue }
            visited[u] = true;

            let mut component = Vec::new();
            let mut queue = VecDeque::from([u]);
            while let Some(v) = queue.pop_front() {
                component.push(v);
                for w in self.edges(v) {
                    if in_subgraph[w] && !visited[w] {
                        visited[w] = true;
                        queue.push_back(w);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_graph() -> Graph {
        Graph::new(
            5,
            &[
                vec![2, 1],       // 0
                vec![0, 2],       // 1
                vec![0, 1, 3],    // 2
                vec![2],          // 3
                vec![],           // 4
            ],
        )
    }

    #[test]
    fn csr_graph_construction() {
        let graph = make_test_graph();

        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 8);

        // Offsets are cumulative neighbor counts, len = nodes + 1
        assert_eq!(graph.offsets, vec![0, 2, 4, 7, 8, 8]);

        // Neighbor lists are sorted
        assert_eq!(graph.edges, vec![1, 2, 0, 2, 0, 1, 3, 2]);

        for window in graph.offsets.windows(2) { assert!(window[0] <= window[1]) }
    }

    #[test]
    fn duplicate_edges_are_collapsed() {
        let graph = Graph::new(2, &[vec![1, 1], vec![0]]);
        assert_eq!(graph.degree(0), 1);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn degree_and_membership() {
        let graph = make_test_graph();

        assert_eq!(graph.degree(2), 3);
        assert_eq!(graph.degree(4), 0);
        assert!(graph.contains_edge(2, 3));
        assert!(!graph.contains_edge(0, 3));
        assert_eq!(graph.edges(2).collect::<Vec<_>>(), vec![0, 1, 3]);
    }

    #[test]
    fn components_of_subsets() {
        let graph = make_test_graph();

        assert_eq!(graph.components_of([0, 1, 2, 3]), vec![vec![0, 1, 2, 3]]);
        assert_eq!(graph.components_of([3, 0, 4]), vec![vec![0], vec![3], vec![4]]);
        assert_eq!(graph.components_of([3, 1, 0]), vec![vec![0, 1], vec![3]]);
        assert!(graph.components_of(std::iter::empty::<usize>()).is_empty());
    }

    #[test]
    fn connectivity_requires_a_path_inside_the_subset() {
        let graph = make_test_graph();

        assert_eq!(graph.components_of([0, 2, 3]).len(), 1);
        // 0 and 3 are only linked through 2.
        assert_eq!(graph.components_of([0, 3]), vec![vec![0], vec![3]]);
    }

    #[test]
    fn empty_graph_is_valid() {
        let graph = Graph::new(0, &[]);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.offsets, vec![0]);
    }

    #[test]
    #[should_panic(expected = "edges.len() must equal num_nodes")]
    fn new_panics_when_edges_len_mismatch() {
        Graph::new(0, &[vec![]]);
    }

    #[test]
    #[should_panic]
    fn degree_panics_for_out_of_bounds_node() {
        let graph = make_test_graph();
        graph.degree(graph.node_count());
    }
}
