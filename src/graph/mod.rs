pub mod edge;
pub mod executors;
mod graph;
pub mod node;
pub mod validate;

pub use graph::Graph;
