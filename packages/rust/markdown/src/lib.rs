//! Markdown documents as a builder pipeline.
//!
//! Provides the [`Pipeline`] payload, a set of stock builders (frontmatter
//! extraction, cleanup passes, darkmatter metrics, TOC), and entry points
//! that run a document through every lifecycle stage.

pub mod builtins;
mod cleanup;
pub mod darkmatter;
pub mod frontmatter;
pub mod pipeline;

use std::path::Path;
use std::time::Instant;

use futures::FutureExt;
use tracing::{info, instrument, warn};

use darkmatter_core::{PipeInput, PipeTask, ResolvedMdOptions, gather_builder_events};
use darkmatter_shared::{DarkmatterError, Result};

pub use builtins::{STOCK_BUILDERS, resolve_options, stock_builder};
pub use pipeline::{Darkmatter, Frontmatter, Pipeline, Source, TocEntry};

/// Run `content` through every lifecycle stage in order.
///
/// The returned task settles with the final pipeline, or with the message of
/// the first builder that failed.
#[instrument(level = "debug", skip(content, options), fields(bytes = content.len()))]
pub fn parse(route: &str, content: &str, options: &ResolvedMdOptions<Pipeline>) -> PipeTask<Pipeline> {
    let pipeline = Pipeline::new(route, content);
    gather_builder_events(options).run_all(PipeInput::payload(pipeline))
}

/// Load a markdown file and run it through the pipeline.
///
/// A failure outcome becomes [`DarkmatterError::Builder`] carrying the
/// builder's message unchanged.
#[instrument(skip(path, options), fields(path = %path.display()))]
pub async fn parse_file(
    path: &Path,
    route: Option<&str>,
    options: &ResolvedMdOptions<Pipeline>,
) -> Result<Pipeline> {
    let start = Instant::now();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DarkmatterError::io(path, e))?;

    let id = path.to_string_lossy();
    let task = parse(&id, &content, options).map(|outcome| match route {
        Some(route) => outcome.map(|p| p.with_route(route)),
        None => outcome,
    });

    match task.await {
        Ok(pipeline) => {
            info!(
                route = %pipeline.route,
                elapsed_ms = start.elapsed().as_millis(),
                "pipeline complete"
            );
            Ok(pipeline)
        }
        Err(message) => {
            warn!(%message, "pipeline failed");
            Err(DarkmatterError::Builder(message))
        }
    }
}
