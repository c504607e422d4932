//! Groups registered builders by the lifecycle stage they apply to.

use std::collections::BTreeMap;

use tracing::{instrument, trace};

use darkmatter_shared::Lifecycle;

use crate::builder::{BuilderRegistration, ResolvedMdOptions};

/// Registrations keyed by stage; each vector is in registration order.
pub type BuilderConfig<P> = BTreeMap<Lifecycle, Vec<BuilderRegistration<P>>>;

/// Invoke every factory once and group the registrations by lifecycle.
///
/// A fresh mapping is built on every call so lookups never observe state
/// from an earlier derivation.
pub fn group_builders<P>(options: &ResolvedMdOptions<P>) -> BuilderConfig<P> {
    let mut config: BuilderConfig<P> = BTreeMap::new();

    for factory in &options.builders {
        let registration = factory();
        trace!(
            lifecycle = %registration.lifecycle,
            builder = registration.display_name(),
            "registered builder"
        );
        config
            .entry(registration.lifecycle)
            .or_default()
            .push(registration);
    }

    config
}

/// The ordered builders registered for `stage`; empty when there are none.
#[instrument(level = "debug", skip(options), fields(factories = options.builders.len()))]
pub fn lookup<P>(stage: Lifecycle, options: &ResolvedMdOptions<P>) -> Vec<BuilderRegistration<P>> {
    group_builders(options).remove(&stage).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn named(stage: Lifecycle, name: &'static str) -> impl Fn() -> BuilderRegistration<String> {
        move || BuilderRegistration::from_fn(stage, name, |p, _| Ok(p))
    }

    fn names(builders: &[BuilderRegistration<String>]) -> Vec<&str> {
        builders.iter().map(|b| b.display_name()).collect()
    }

    #[test]
    fn groups_by_stage_in_registration_order() {
        let options = ResolvedMdOptions::new()
            .with_builder(named(Lifecycle::Render, "first"))
            .with_builder(named(Lifecycle::Parse, "parse-only"))
            .with_builder(named(Lifecycle::Render, "second"));

        let config = group_builders(&options);
        assert_eq!(config.len(), 2);
        assert_eq!(names(&config[&Lifecycle::Render]), vec!["first", "second"]);
        assert_eq!(names(&config[&Lifecycle::Parse]), vec!["parse-only"]);
    }

    #[test]
    fn missing_stage_yields_empty_sequence() {
        let options = ResolvedMdOptions::new().with_builder(named(Lifecycle::Parse, "fm"));
        assert!(lookup(Lifecycle::Finalize, &options).is_empty());
        assert!(lookup::<String>(Lifecycle::Parse, &ResolvedMdOptions::new()).is_empty());
    }

    #[test]
    fn lookups_are_deterministic() {
        let options = ResolvedMdOptions::new()
            .with_builder(named(Lifecycle::Transform, "a"))
            .with_builder(named(Lifecycle::Transform, "b"))
            .with_builder(named(Lifecycle::Transform, "c"));

        let first = lookup(Lifecycle::Transform, &options);
        let second = lookup(Lifecycle::Transform, &options);
        assert_eq!(names(&first), names(&second));
        assert_eq!(names(&first), vec!["a", "b", "c"]);
    }

    #[test]
    fn every_lookup_invokes_every_factory_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut options = ResolvedMdOptions::<String>::new();
        for stage in [Lifecycle::Parse, Lifecycle::Render] {
            let calls = Arc::clone(&calls);
            options.register(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                BuilderRegistration::from_fn(stage, "counted", |p, _| Ok(p))
            });
        }

        lookup(Lifecycle::Parse, &options);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        lookup(Lifecycle::Parse, &options);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
