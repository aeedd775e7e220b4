//! ActionDriver - policy の task 一覧から graph を組み立てて実行する
//!
//! # 処理の流れ
//! 1. policy.validate(params)
//! 2. RunId を採番し、`action` span の中で実行
//! 3. policy.plan(params) の各行を TaskGraph に登録
//! 4. graph を実行し、ActionReport にまとめる
//!
//! driver はどの action kind に対しても同じコードです。

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::Instrument;

use super::policy::{ActionPolicy, Step, StepContext, StepOutput};
use crate::domain::{ActionError, ActionParams, ActionReport, FailureReport, GraphError, SessionOutcome};
use crate::graph::TaskGraph;
use crate::ports::{Clock, IdGenerator, Notifier};
use crate::session::MutationSession;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("unknown action kind '{0}'")]
    UnknownAction(String),

    #[error(transparent)]
    InvalidParams(ActionError),

    /// The policy produced a malformed graph (a program error).
    #[error("invalid task graph: {0}")]
    InvalidGraph(GraphError),
}

/// Saves made during one run, in completion order.
///
/// Kept outside the graph results so that writes made before a failure are
/// still reported.
type Journal = Arc<Mutex<Vec<SessionOutcome>>>;

#[derive(Clone)]
pub struct ActionDriver {
    session: MutationSession,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    concurrency_limit: usize,
}

impl ActionDriver {
    pub fn new(
        session: MutationSession,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            session,
            notifier,
            clock,
            ids,
            concurrency_limit: 0,
        }
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Build (but do not run) the graph for one action.
    fn build(
        &self,
        policy: &dyn ActionPolicy,
        params: Arc<ActionParams>,
        journal: Journal,
    ) -> Result<TaskGraph<StepOutput>, GraphError> {
        let mut graph = TaskGraph::new().with_concurrency_limit(self.concurrency_limit);
        for spec in policy.plan(&params) {
            let ctx = StepContext {
                params: params.clone(),
                session: self.session.clone(),
                notifier: self.notifier.clone(),
                clock: self.clock.clone(),
            };
            let journal = journal.clone();
            let step = spec.step;
            graph.register(spec.name, &spec.deps, move |inputs| run_step(step, ctx, inputs, journal))?;
        }
        Ok(graph)
    }

    pub async fn run(&self, policy: &dyn ActionPolicy, params: ActionParams) -> Result<ActionReport, DriverError> {
        policy.validate(&params).map_err(DriverError::InvalidParams)?;

        let run_id = self.ids.generate_run_id();
        let span = tracing::info_span!("action", %run_id, kind = policy.kind());
        let journal = Journal::default();

        async {
            tracing::info!(document = %params.target, action = policy.label(), "action started");
            let graph = self
                .build(policy, Arc::new(params), journal.clone())
                .map_err(DriverError::InvalidGraph)?;
            let result = graph.execute().await;
            let saves = std::mem::take(&mut *journal.lock().unwrap_or_else(PoisonError::into_inner));

            match result {
                Ok(run) => {
                    tracing::info!(completed = run.completed.len(), saves = saves.len(), "action finished");
                    Ok(ActionReport {
                        run_id,
                        kind: policy.kind().to_string(),
                        tasks: run.states,
                        completed: run.completed,
                        cancelled: Vec::new(),
                        saves,
                        failure: None,
                    })
                }
                Err(error) => {
                    let failure = FailureReport::from_graph_error(&error);
                    match error {
                        GraphError::TaskFailed {
                            completed,
                            cancelled,
                            states,
                            ..
                        } => Ok(ActionReport {
                            run_id,
                            kind: policy.kind().to_string(),
                            tasks: states,
                            completed,
                            cancelled,
                            saves,
                            failure,
                        }),
                        other => Err(DriverError::InvalidGraph(other)),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}

async fn run_step(
    step: Step,
    ctx: StepContext,
    inputs: Vec<StepOutput>,
    journal: Journal,
) -> Result<StepOutput, ActionError> {
    match step {
        Step::Mutate(build) => {
            let Some(request) = build(ctx.params.as_ref(), inputs.as_slice())? else {
                return Ok(StepOutput::Skipped("nothing to write".to_string()));
            };
            let outcome = ctx.session.run(request).await?;
            journal
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(outcome.clone());
            Ok(StepOutput::Saved(Box::new(outcome)))
        }
        Step::Custom(run) => run(ctx, inputs).await,
    }
}
