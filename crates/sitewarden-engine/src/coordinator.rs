//! Drives one target through its stage plan

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{error, info};
use url::Url;

use sitewarden_core::{CapabilityId, PageData, ResultRecord, Task};

use crate::capability::CapabilityContext;
use crate::executor::{CapabilityExecutor, ExecutionVerdict};
use crate::plan::ExecutionPlan;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::registry::CapabilityRegistry;

/// Coordinates one task: fan-out per stage, fan-in barrier, progress
/// events, fatal abort.
///
/// The task is owned exclusively by the coordinator while it runs; the
/// progress stream has this single producer, so events arrive in
/// program order.
pub struct TaskCoordinator {
    registry: Arc<CapabilityRegistry>,
    executor: Arc<CapabilityExecutor>,
    sink: Arc<dyn ProgressSink>,
}

impl TaskCoordinator {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        executor: Arc<CapabilityExecutor>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            registry,
            executor,
            sink,
        }
    }

    /// Drive one target through the plan's stages.
    ///
    /// A fatal (foundational) capability failure yields a task with
    /// status `Failed` and a terminal `Error` event; every other
    /// failure is recorded and execution continues. The returned task
    /// always carries whatever results were produced.
    pub async fn run(
        &self,
        target: Url,
        requested: BTreeSet<CapabilityId>,
        plan: &ExecutionPlan,
    ) -> Task {
        let mut task = Task::new(target, requested);
        let total = plan.total().max(1);
        let mut done = 0usize;
        let mut percent = 0u8;
        let mut page: Option<Arc<PageData>> = None;

        self.sink.publish(ProgressEvent::target_start(&task.target));
        task.begin();
        info!(
            task = %task.id,
            target = %task.target,
            stages = plan.stages().len(),
            capabilities = total,
            "task started"
        );

        for (index, stage) in plan.stages().iter().enumerate() {
            self.sink.publish(ProgressEvent::progress(
                format!("stage {}: {} capabilities", index, stage.len()),
                percent,
            ));

            // A capability whose hard dependency already failed is
            // recorded as unmet without being invoked.
            let mut launch = Vec::with_capacity(stage.len());
            for &id in stage {
                match self.unmet_dependency(&task, id) {
                    Some(dep) => {
                        let record = ResultRecord::dependency_unmet(dep);
                        let message = record
                            .as_failure()
                            .map(|f| f.message.clone())
                            .unwrap_or_default();
                        task.record(id, record);
                        done += 1;
                        percent = percent.max(ratio(done, total));
                        self.sink
                            .publish(ProgressEvent::capability_error(id, percent, message));
                    }
                    None => launch.push(id),
                }
            }

            // Fan-out: every launchable capability in the stage runs
            // concurrently.
            let mut handles = Vec::with_capacity(launch.len());
            for id in launch {
                self.sink
                    .publish(ProgressEvent::capability_start(id, percent));
                let ctx = self.context_for(&task, id, page.clone());
                let executor = Arc::clone(&self.executor);
                handles.push((id, tokio::spawn(async move { executor.run(id, ctx).await })));
            }

            // Fan-in barrier: the next stage reads this stage's outputs,
            // so every launched execution must reach a terminal state
            // before we continue.
            let mut fatal: Option<(CapabilityId, String)> = None;
            for (id, handle) in handles {
                let verdict = match handle.await {
                    Ok(verdict) => verdict,
                    Err(join_err) => ExecutionVerdict {
                        id,
                        record: ResultRecord::failure(format!("capability panicked: {join_err}")),
                        page: None,
                        fatal: self.registry.is_foundational(id).unwrap_or(false),
                    },
                };

                done += 1;
                percent = percent.max(ratio(done, total));

                match &verdict.record {
                    ResultRecord::Success(output) => {
                        self.sink.publish(ProgressEvent::capability_complete(
                            id,
                            percent,
                            output.clone(),
                        ));
                    }
                    ResultRecord::Failure(failure) => {
                        self.sink.publish(ProgressEvent::capability_error(
                            id,
                            percent,
                            failure.message.clone(),
                        ));
                        if verdict.fatal {
                            fatal = Some((id, failure.message.clone()));
                        }
                    }
                }

                if let Some(produced) = verdict.page {
                    page = Some(produced);
                }
                task.record(id, verdict.record);
            }

            if let Some((id, message)) = fatal {
                task.fail();
                error!(
                    task = %task.id,
                    capability = %id,
                    "foundational capability failed, aborting task"
                );
                self.sink.publish(ProgressEvent::error(
                    format!("foundational capability '{id}' failed: {message}"),
                    percent,
                ));
                return task;
            }
        }

        task.complete();
        info!(task = %task.id, "task completed");
        self.sink
            .publish(ProgressEvent::complete(format!("audit complete for {}", task.target)));
        task
    }

    /// First declared dependency with a recorded failure, if any
    fn unmet_dependency(&self, task: &Task, id: CapabilityId) -> Option<CapabilityId> {
        let deps = self.registry.dependencies_of(id).ok()?;
        deps.iter()
            .find(|dep| {
                task.results
                    .get(dep)
                    .is_some_and(|record| !record.is_success())
            })
            .copied()
    }

    /// Build the context a capability declared: the crawled page plus
    /// the successful outputs of its hard dependencies.
    fn context_for(
        &self,
        task: &Task,
        id: CapabilityId,
        page: Option<Arc<PageData>>,
    ) -> CapabilityContext {
        let mut prior = BTreeMap::new();
        if let Ok(deps) = self.registry.dependencies_of(id) {
            for dep in deps {
                if let Some(ResultRecord::Success(value)) = task.results.get(dep) {
                    prior.insert(*dep, value.clone());
                }
            }
        }

        let mut ctx = CapabilityContext::new(task.target.clone()).with_prior(prior);
        if let Some(page) = page {
            ctx = ctx.with_page(page);
        }
        ctx
    }
}

fn ratio(done: usize, total: usize) -> u8 {
    ((done * 100) / total).min(100) as u8
}
