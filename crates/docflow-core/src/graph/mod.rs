//! Task graph - action を構成する task の依存順実行

pub mod dependency;
pub mod task_graph;

pub use dependency::DependencyGraph;
pub use task_graph::{GraphRun, TaskGraph};
