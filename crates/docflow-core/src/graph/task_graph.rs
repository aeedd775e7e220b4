//! TaskGraph - 名前付き task の依存順実行
//!
//! # 実行モデル
//! - 依存がすべて成功した task だけが起動される（無関係な task 同士の順序は不定）
//! - task の結果は名前で保持し、依存する task に宣言順で clone して渡す
//! - 最初の失敗（Err または panic）で新規起動を止める
//!   - 未起動の task は `Cancelled`（一度も呼ばれない）
//!   - 実行中の task は完了まで待ち、結果は捨てる（`Discarded`）
//! - 完了済みの副作用は巻き戻さない
//!
//! graph は使い捨てで、`execute(self)` が消費します。

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tracing::Instrument;

use super::dependency::DependencyGraph;
use crate::domain::{ActionError, GraphError, TaskState};

type TaskFn<T> = Box<dyn FnOnce(Vec<T>) -> BoxFuture<'static, Result<T, ActionError>> + Send>;

struct Task<T> {
    deps: Vec<String>,
    run: TaskFn<T>,
}

/// Successful execution of a whole graph.
#[derive(Debug)]
pub struct GraphRun<T> {
    /// Result of every task, by name.
    pub results: HashMap<String, T>,
    /// Task names in completion order.
    pub completed: Vec<String>,
    pub states: BTreeMap<String, TaskState>,
}

/// A single-use graph of named async tasks.
pub struct TaskGraph<T> {
    graph: DependencyGraph,
    tasks: HashMap<String, Task<T>>,
    /// 0 = unbounded
    concurrency_limit: usize,
}

impl<T> Default for TaskGraph<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskGraph<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            graph: DependencyGraph::new(),
            tasks: HashMap::new(),
            concurrency_limit: 0,
        }
    }

    /// Maximum number of tasks in flight at once (0 = unbounded).
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Add a task.
    ///
    /// `run` receives the results of `deps`, in the order given here.
    /// Dependencies may be registered later; they are checked by
    /// [`validate`](Self::validate).
    pub fn register<F, Fut>(&mut self, name: &str, deps: &[&str], run: F) -> Result<(), GraphError>
    where
        F: FnOnce(Vec<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
    {
        if !self.graph.add_task(name) {
            return Err(GraphError::DuplicateTask(name.to_string()));
        }
        for dep in deps {
            self.graph.add_dependency(name, dep);
        }
        let run: TaskFn<T> = Box::new(move |inputs| run(inputs).boxed());
        self.tasks.insert(
            name.to_string(),
            Task {
                deps: deps.iter().map(|d| d.to_string()).collect(),
                run,
            },
        );
        Ok(())
    }

    /// Check for unknown dependencies and cycles.
    pub fn validate(&self) -> Result<(), GraphError> {
        if let Some((task, dependency)) = self.graph.find_unknown_dependency() {
            return Err(GraphError::UnknownDependency {
                task: task.to_string(),
                dependency: dependency.to_string(),
            });
        }
        if let Some(cycle) = self.graph.detect_cycle() {
            return Err(GraphError::Cycle(cycle));
        }
        Ok(())
    }

    /// Run every task to completion, or until the first failure.
    ///
    /// Graph errors (`UnknownDependency`, `Cycle`) are returned before any
    /// task is invoked.
    pub async fn execute(mut self) -> Result<GraphRun<T>, GraphError> {
        self.validate()?;

        let order: Vec<String> = self.graph.tasks().to_vec();
        let mut states: BTreeMap<String, TaskState> =
            order.iter().map(|n| (n.clone(), TaskState::Pending)).collect();
        let mut remaining: HashMap<String, usize> = order
            .iter()
            .map(|n| (n.clone(), self.graph.get_dependencies(n).len()))
            .collect();
        let mut ready: VecDeque<String> = order
            .iter()
            .filter(|n| !self.graph.has_dependencies(n))
            .cloned()
            .collect();

        let mut results: HashMap<String, T> = HashMap::new();
        let mut completed: Vec<String> = Vec::new();
        let mut failure: Option<(String, ActionError)> = None;
        let mut in_flight = FuturesUnordered::new();

        loop {
            while failure.is_none()
                && (self.concurrency_limit == 0 || in_flight.len() < self.concurrency_limit)
            {
                let Some(name) = ready.pop_front() else {
                    break;
                };
                let Some(task) = self.tasks.remove(&name) else {
                    continue;
                };
                let inputs: Vec<T> = task
                    .deps
                    .iter()
                    .filter_map(|dep| results.get(dep).cloned())
                    .collect();

                states.insert(name.clone(), TaskState::Running);
                tracing::debug!(task = %name, in_flight = in_flight.len() + 1, "task dispatched");

                let span = tracing::info_span!("task", task = %name);
                let run = task.run;
                in_flight.push(
                    async move {
                        let outcome = AssertUnwindSafe(async move { run(inputs).await })
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|payload| Err(ActionError::Panicked(panic_message(&*payload))));
                        (name, outcome)
                    }
                    .instrument(span),
                );
            }

            let Some((name, outcome)) = in_flight.next().await else {
                break;
            };

            match outcome {
                Ok(value) if failure.is_none() => {
                    tracing::info!(task = %name, "task succeeded");
                    states.insert(name.clone(), TaskState::Succeeded);
                    for waiting in self.graph.get_waiting_tasks(&name) {
                        if let Some(count) = remaining.get_mut(waiting) {
                            *count = count.saturating_sub(1);
                            if *count == 0 {
                                ready.push_back(waiting.clone());
                            }
                        }
                    }
                    results.insert(name.clone(), value);
                    completed.push(name);
                }
                Ok(_) => {
                    tracing::debug!(task = %name, "task finished after the graph failed, result discarded");
                    states.insert(name, TaskState::Discarded);
                }
                Err(error) if failure.is_none() => {
                    tracing::error!(task = %name, kind = ?error.kind(), %error, "task failed, halting graph");
                    states.insert(name.clone(), TaskState::Failed);
                    failure = Some((name, error));
                }
                Err(error) => {
                    tracing::warn!(task = %name, %error, "task failed after the graph failed, error discarded");
                    states.insert(name, TaskState::Discarded);
                }
            }
        }

        match failure {
            None => Ok(GraphRun {
                results,
                completed,
                states,
            }),
            Some((task, source)) => {
                let cancelled: Vec<String> = order
                    .iter()
                    .filter(|n| states.get(n.as_str()) == Some(&TaskState::Pending))
                    .cloned()
                    .collect();
                for name in &cancelled {
                    states.insert(name.clone(), TaskState::Cancelled);
                }
                if !cancelled.is_empty() {
                    tracing::info!(?cancelled, "tasks cancelled");
                }
                Err(GraphError::TaskFailed {
                    task,
                    source,
                    completed,
                    cancelled,
                    states,
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
