//! Builder registrations and the resolved options that carry their factories.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use darkmatter_shared::{BuilderOptions, Lifecycle};

/// Name used in failure messages when a registration carries no name.
pub const ANONYMOUS_BUILDER: &str = "anonymous builder";

/// Any error a builder handler may fail with.
pub type BuilderError = Box<dyn std::error::Error + Send + Sync>;

/// The future returned by a builder handler.
pub type BuilderFuture<P> = BoxFuture<'static, Result<P, BuilderError>>;

/// A builder's transformation: takes the payload by value plus its static options.
pub type BuilderHandler<P> = Arc<dyn Fn(P, &BuilderOptions) -> BuilderFuture<P> + Send + Sync>;

/// Zero-argument factory producing a registration when invoked.
pub type BuilderFactory<P> = Arc<dyn Fn() -> BuilderRegistration<P> + Send + Sync>;

// ---------------------------------------------------------------------------
// BuilderRegistration
// ---------------------------------------------------------------------------

/// A transformation unit bound to one lifecycle stage.
pub struct BuilderRegistration<P> {
    pub lifecycle: Lifecycle,
    pub name: Option<String>,
    pub handler: BuilderHandler<P>,
    pub options: BuilderOptions,
}

impl<P: Send + 'static> BuilderRegistration<P> {
    /// Register a named async handler for `lifecycle`.
    ///
    /// The handler receives the options by reference and must copy out
    /// anything its future needs.
    pub fn new<F, Fut>(lifecycle: Lifecycle, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(P, &BuilderOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, BuilderError>> + Send + 'static,
    {
        Self {
            lifecycle,
            name: Some(name.into()),
            handler: Arc::new(move |payload: P, options: &BuilderOptions| -> BuilderFuture<P> {
                Box::pin(handler(payload, options))
            }),
            options: BuilderOptions::new(),
        }
    }

    /// Register a synchronous transformation; it still runs inside the async fold.
    pub fn from_fn<F>(lifecycle: Lifecycle, name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(P, &BuilderOptions) -> Result<P, BuilderError> + Send + Sync + 'static,
    {
        Self::new(lifecycle, name, move |payload, options| {
            futures::future::ready(transform(payload, options))
        })
    }
}

impl<P> BuilderRegistration<P> {
    /// Replace the static options handed to the handler.
    pub fn with_options(mut self, options: BuilderOptions) -> Self {
        self.options = options;
        self
    }

    /// Set a single option value.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Drop the registration's name; failures then report [`ANONYMOUS_BUILDER`].
    pub fn anonymous(mut self) -> Self {
        self.name = None;
        self
    }

    /// The name reported in logs and failure messages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS_BUILDER)
    }
}

impl<P> Clone for BuilderRegistration<P> {
    fn clone(&self) -> Self {
        Self {
            lifecycle: self.lifecycle,
            name: self.name.clone(),
            handler: Arc::clone(&self.handler),
            options: self.options.clone(),
        }
    }
}

impl<P> std::fmt::Debug for BuilderRegistration<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderRegistration")
            .field("lifecycle", &self.lifecycle)
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ResolvedMdOptions
// ---------------------------------------------------------------------------

/// Options handed to the pipeline once plugins have been resolved.
pub struct ResolvedMdOptions<P> {
    /// Builder factories, in registration order.
    pub builders: Vec<BuilderFactory<P>>,
}

impl<P> ResolvedMdOptions<P> {
    pub fn new() -> Self {
        Self {
            builders: Vec::new(),
        }
    }

    /// Append a factory; it is invoked on every lookup.
    pub fn register<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> BuilderRegistration<P> + Send + Sync + 'static,
    {
        self.builders.push(Arc::new(factory));
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with_builder<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> BuilderRegistration<P> + Send + Sync + 'static,
    {
        self.register(factory);
        self
    }
}

impl<P> Default for ResolvedMdOptions<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for ResolvedMdOptions<P> {
    fn clone(&self) -> Self {
        Self {
            builders: self.builders.iter().map(Arc::clone).collect(),
        }
    }
}

impl<P> std::fmt::Debug for ResolvedMdOptions<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedMdOptions")
            .field("builders", &self.builders.len())
            .finish()
    }
}
