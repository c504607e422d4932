//! Runs every builder registered for a stage over a payload.
//!
//! Builders execute strictly in registration order; each one receives the
//! output of its predecessor. The first failure (an `Err` or a panic) stops
//! the stage and becomes the stage's failure outcome. Nothing past this
//! module's boundary ever panics: every path settles into a [`PipeTask`].

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::FutureExt;
use tracing::{Instrument, debug, debug_span, warn};

use darkmatter_shared::Lifecycle;

use crate::builder::{BuilderRegistration, ResolvedMdOptions};
use crate::index;
use crate::task::{self, PipeInput, PipeOutcome, PipeTask, panic_message};

/// Message reported when builder `name` fails during `stage`.
pub fn builder_failure_message(stage: Lifecycle, name: &str, error: &str) -> String {
    format!(
        "During the \"{stage}\" stage, the builder API \"{name}\" was unable to transform the payload. It received the following error message: {error}"
    )
}

// ---------------------------------------------------------------------------
// StageRunner
// ---------------------------------------------------------------------------

/// The builders for one stage, resolved once and ready to run.
pub struct StageRunner<P> {
    stage: Lifecycle,
    builders: Arc<[BuilderRegistration<P>]>,
}

impl<P> Clone for StageRunner<P> {
    fn clone(&self) -> Self {
        Self {
            stage: self.stage,
            builders: Arc::clone(&self.builders),
        }
    }
}

impl<P: Send + 'static> StageRunner<P> {
    pub fn new(stage: Lifecycle, options: &ResolvedMdOptions<P>) -> Self {
        Self {
            stage,
            builders: index::lookup(stage, options).into(),
        }
    }

    pub fn stage(&self) -> Lifecycle {
        self.stage
    }

    /// Number of builders that will run for this stage.
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Thread `payload` through every builder of the stage.
    pub fn run(&self, payload: P) -> PipeTask<P> {
        if self.builders.is_empty() {
            debug!(stage = %self.stage, "no builders registered, passing payload through");
            return task::success(payload);
        }

        let stage = self.stage;
        let builders = Arc::clone(&self.builders);
        let span = debug_span!("stage", %stage, builders = builders.len());

        let fold = async move {
            let mut payload = payload;
            for builder in builders.iter() {
                payload = invoke(stage, builder, payload).await?;
            }
            debug!("stage complete");
            PipeOutcome::Ok(payload)
        };

        settle(stage, fold.instrument(span))
    }

    /// Wait for a prior stage, then run this stage on its payload.
    ///
    /// A prior failure is returned unchanged and no builder is invoked.
    pub fn run_task(&self, prior: PipeTask<P>) -> PipeTask<P> {
        let runner = self.clone();
        async move {
            match prior.await {
                Ok(payload) => runner.run(payload).await,
                Err(message) => {
                    debug!(stage = %runner.stage, "prior stage failed, skipping builders");
                    Err(message)
                }
            }
        }
        .boxed()
    }

    /// Accept either form of input.
    pub fn call(&self, input: PipeInput<P>) -> PipeTask<P> {
        match input {
            PipeInput::Payload(payload) => self.run(payload),
            PipeInput::Task(prior) => self.run_task(prior),
        }
    }
}

/// Run one builder, turning an `Err` or a panic into the composed failure message.
async fn invoke<P: Send + 'static>(
    stage: Lifecycle,
    builder: &BuilderRegistration<P>,
    payload: P,
) -> PipeOutcome<P> {
    let name = builder.display_name();
    debug!(builder = name, "invoking builder");

    let outcome = match catch_unwind(AssertUnwindSafe(|| (builder.handler)(payload, &builder.options))) {
        Ok(pending) => match AssertUnwindSafe(pending).catch_unwind().await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(panic) => Err(panic_message(panic)),
        },
        Err(panic) => Err(panic_message(panic)),
    };

    outcome.map_err(|error| {
        warn!(%stage, builder = name, %error, "builder failed");
        builder_failure_message(stage, name, &error)
    })
}

/// The async→result boundary: a panic anywhere in `fold` becomes a failure outcome.
fn settle<P, F>(stage: Lifecycle, fold: F) -> PipeTask<P>
where
    P: Send + 'static,
    F: Future<Output = PipeOutcome<P>> + Send + 'static,
{
    AssertUnwindSafe(fold)
        .catch_unwind()
        .map(move |settled| match settled {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic);
                warn!(%stage, error = %message, "stage panicked outside a builder");
                Err(format!(
                    "During the \"{stage}\" stage, the builder pipeline failed unexpectedly: {message}"
                ))
            }
        })
        .boxed()
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Single-stage runner: resolves the builders for `stage` now and returns a
/// function from payload to [`PipeTask`].
pub fn get_builder_task<P: Send + 'static>(
    stage: Lifecycle,
    options: &ResolvedMdOptions<P>,
) -> impl Fn(P) -> PipeTask<P> + Send + Sync + use<P> {
    let runner = StageRunner::new(stage, options);
    move |payload| runner.run(payload)
}

/// Stage-chaining runner factory; see [`gather_builder_events`].
pub struct BuilderEvents<P> {
    options: ResolvedMdOptions<P>,
}

impl<P: Send + 'static> BuilderEvents<P> {
    /// The runner for `stage`, accepting a payload or a prior stage's task.
    pub fn stage(&self, stage: Lifecycle) -> StageRunner<P> {
        StageRunner::new(stage, &self.options)
    }

    /// Chain every stage in lifecycle order, starting from `input`.
    pub fn run_all(&self, input: PipeInput<P>) -> PipeTask<P> {
        let mut stages = Lifecycle::ALL.into_iter();
        let first = match stages.next() {
            Some(stage) => self.stage(stage).call(input),
            None => return task::failure("no lifecycle stages defined"),
        };
        stages.fold(first, |prior, stage| self.stage(stage).run_task(prior))
    }
}

/// Capture `options` and hand out chaining runners per stage.
pub fn gather_builder_events<P>(options: &ResolvedMdOptions<P>) -> BuilderEvents<P> {
    BuilderEvents {
        options: options.clone(),
    }
}
