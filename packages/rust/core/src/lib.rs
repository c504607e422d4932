//! Builder dispatch for the Darkmatter pipeline.
//!
//! Builders are registered through factories in [`ResolvedMdOptions`]. The
//! [`index`] groups them by lifecycle stage, and the [`runner`] threads a
//! payload through every builder of a stage, producing a [`PipeTask`].

pub mod builder;
pub mod index;
pub mod runner;
pub mod task;

pub use builder::{
    ANONYMOUS_BUILDER, BuilderError, BuilderFactory, BuilderFuture, BuilderHandler,
    BuilderRegistration, ResolvedMdOptions,
};
pub use index::{BuilderConfig, group_builders, lookup};
pub use runner::{
    BuilderEvents, StageRunner, builder_failure_message, gather_builder_events, get_builder_task,
};
pub use task::{PipeInput, PipeOutcome, PipeTask};
