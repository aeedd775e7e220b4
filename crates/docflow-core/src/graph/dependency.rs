//! Dependency graph for the tasks of one action.
//!
//! Design:
//! - Forward edges: task -> tasks it depends on (in declared order)
//! - Reverse edges: task -> tasks that depend on it (in registration order)
//! - Invariant: edges and reverse_edges must be kept in sync

use std::collections::HashMap;

/// Dependency graph keyed by task name.
///
/// Tasks keep their registration order so that scheduling and reports are
/// deterministic for tasks that become ready together.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Registered tasks, in registration order.
    nodes: Vec<String>,

    /// Forward edges: task -> tasks it depends on (waits for)
    edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task -> tasks that depend on it (waiting tasks)
    reverse_edges: HashMap<String, Vec<String>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Returns `false` if the name is already registered.
    pub fn add_task(&mut self, task: &str) -> bool {
        if self.contains(task) {
            return false;
        }
        self.nodes.push(task.to_string());
        self.edges.entry(task.to_string()).or_default();
        true
    }

    pub fn contains(&self, task: &str) -> bool {
        self.edges.contains_key(task)
    }

    pub fn tasks(&self) -> &[String] {
        &self.nodes
    }

    /// Add a dependency: `task` depends on `depends_on`.
    ///
    /// Example: add_dependency("b", "a") means "B waits for A".
    /// A repeated edge is recorded once.
    pub fn add_dependency(&mut self, task: &str, depends_on: &str) {
        let deps = self.edges.entry(task.to_string()).or_default();
        if deps.iter().any(|d| d == depends_on) {
            return;
        }
        deps.push(depends_on.to_string());
        self.reverse_edges
            .entry(depends_on.to_string())
            .or_default()
            .push(task.to_string());
    }

    /// Tasks waiting for `completed_task`.
    ///
    /// Note: this returns ALL waiting tasks, even if they have other
    /// dependencies. The caller must check if all dependencies are resolved.
    pub fn get_waiting_tasks(&self, completed_task: &str) -> &[String] {
        self.reverse_edges
            .get(completed_task)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_dependencies(&self, task: &str) -> bool {
        self.edges.get(task).is_some_and(|deps| !deps.is_empty())
    }

    /// Distinct dependencies of a task, in declared order.
    pub fn get_dependencies(&self, task: &str) -> &[String] {
        self.edges
            .get(task)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// First edge pointing at a name that was never registered.
    pub fn find_unknown_dependency(&self) -> Option<(&str, &str)> {
        self.nodes.iter().find_map(|task| {
            self.get_dependencies(task)
                .iter()
                .find(|dep| !self.contains(dep))
                .map(|dep| (task.as_str(), dep.as_str()))
        })
    }

    /// Detect a cycle with a three-color DFS.
    ///
    /// Returns the cycle as a path that starts and ends with the same task
    /// (e.g. `["a", "b", "a"]`), or `None` if the graph is acyclic.
    /// Edges to unknown tasks are ignored.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut colors: HashMap<&str, Color> =
            self.nodes.iter().map(|n| (n.as_str(), Color::White)).collect();
        let mut path: Vec<&str> = Vec::new();

        for start in &self.nodes {
            if colors.get(start.as_str()) == Some(&Color::White) {
                if let Some(cycle) = self.dfs_cycle(start, &mut colors, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn dfs_cycle<'a>(
        &'a self,
        node: &'a str,
        colors: &mut HashMap<&'a str, Color>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for dep in self.get_dependencies(node) {
            match colors.get(dep.as_str()).copied() {
                Some(Color::Gray) => {
                    let from = path.iter().position(|n| *n == dep.as_str())?;
                    let mut cycle: Vec<String> = path[from..].iter().map(|n| n.to_string()).collect();
                    cycle.push(dep.clone());
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_cycle(dep, colors, path) {
                        return Some(cycle);
                    }
                }
                Some(Color::Black) | None => {}
            }
        }

        colors.insert(node, Color::Black);
        path.pop();
        None
    }
}
