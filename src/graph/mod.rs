mod adjacency;
mod graph;

pub(crate) use adjacency::build_adjacency;
pub(crate) use graph::Graph;
