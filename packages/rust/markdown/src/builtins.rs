//! Stock builders and the translation from `[[builders]]` config entries to
//! registered factories.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use darkmatter_core::{BuilderError, BuilderRegistration, ResolvedMdOptions};
use darkmatter_shared::{
    AppConfig, BuilderEntry, BuilderOptions, DarkmatterError, DefaultsConfig, Lifecycle, Result,
};

use crate::pipeline::{Frontmatter, Pipeline};
use crate::{cleanup, darkmatter, frontmatter};

/// Every stock builder with the stage it registers for by default.
pub const STOCK_BUILDERS: &[(&str, Lifecycle)] = &[
    ("frontmatter", Lifecycle::Parse),
    ("normalize_headings", Lifecycle::Transform),
    ("clean_blank_lines", Lifecycle::Transform),
    ("strip_trailing_whitespace", Lifecycle::Transform),
    ("ensure_trailing_newline", Lifecycle::Transform),
    ("darkmatter", Lifecycle::Darkmatter),
    ("toc", Lifecycle::Darkmatter),
];

/// Default stage for a stock builder, or `None` if the name is unknown.
pub fn default_lifecycle(name: &str) -> Option<Lifecycle> {
    STOCK_BUILDERS
        .iter()
        .find(|(stock, _)| *stock == name)
        .map(|(_, lifecycle)| *lifecycle)
}

/// Build the registration for stock builder `name` bound to `lifecycle`.
pub fn stock_builder(name: &str, lifecycle: Lifecycle) -> Option<BuilderRegistration<Pipeline>> {
    let registration: BuilderRegistration<Pipeline> = match name {
        "frontmatter" => BuilderRegistration::from_fn(lifecycle, name, split_frontmatter),
        "normalize_headings" => BuilderRegistration::from_fn(lifecycle, name, |p: Pipeline, _| {
            Ok(p.map_markdown(cleanup::normalize_headings)?)
        }),
        "clean_blank_lines" => BuilderRegistration::from_fn(lifecycle, name, |p: Pipeline, _| {
            Ok(p.map_markdown(cleanup::clean_blank_lines)?)
        }),
        "strip_trailing_whitespace" => BuilderRegistration::from_fn(lifecycle, name, |p: Pipeline, _| {
            Ok(p.map_markdown(cleanup::strip_trailing_whitespace)?)
        }),
        "ensure_trailing_newline" => BuilderRegistration::from_fn(lifecycle, name, |p: Pipeline, _| {
            Ok(p.map_markdown(cleanup::ensure_trailing_newline)?)
        }),
        "darkmatter" => BuilderRegistration::from_fn(lifecycle, name, gather_darkmatter),
        "toc" => BuilderRegistration::from_fn(lifecycle, name, gather_toc),
        _ => return None,
    };
    Some(registration)
}

/// Turn the configured builder entries into factories, in declaration order.
#[instrument(skip_all, fields(entries = config.builders.len()))]
pub fn resolve_options(config: &AppConfig) -> Result<ResolvedMdOptions<Pipeline>> {
    let mut options = ResolvedMdOptions::new();

    for entry in &config.builders {
        let default_stage = default_lifecycle(&entry.name).ok_or_else(|| {
            DarkmatterError::config(format!(
                "unknown builder '{}'; expected one of: {}",
                entry.name,
                STOCK_BUILDERS
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
        let lifecycle = entry.lifecycle.unwrap_or(default_stage);
        let name: Arc<str> = entry.name.as_str().into();
        let builder_options = entry_options(entry, &config.defaults);

        debug!(builder = %name, %lifecycle, "registering stock builder");
        options.register(move || {
            stock_builder(&name, lifecycle)
                .unwrap_or_else(|| missing_builder(&name, lifecycle))
                .with_options(builder_options.clone())
        });
    }

    Ok(options)
}

/// Entry options with config-wide defaults filled in where a builder uses them.
fn entry_options(entry: &BuilderEntry, defaults: &DefaultsConfig) -> BuilderOptions {
    let mut options = entry.options.clone();
    match entry.name.as_str() {
        "darkmatter" => {
            options
                .entry("words_per_minute")
                .or_insert_with(|| defaults.words_per_minute.into());
        }
        "toc" => {
            options
                .entry("max_depth")
                .or_insert_with(|| defaults.toc_max_depth.into());
        }
        _ => {}
    }
    options
}

/// Placeholder for a name that passed validation but has no stock builder.
fn missing_builder(name: &str, lifecycle: Lifecycle) -> BuilderRegistration<Pipeline> {
    let name = name.to_string();
    let message = format!("no stock builder named '{name}'");
    BuilderRegistration::from_fn(lifecycle, name, move |_, _| Err(message.clone().into()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn split_frontmatter(
    mut pipeline: Pipeline,
    options: &BuilderOptions,
) -> std::result::Result<Pipeline, BuilderError> {
    let (mut fm, body) = frontmatter::extract(&pipeline.raw)?;

    if let Some(defaults) = object_option(options, "defaults")? {
        frontmatter::apply_defaults(&mut fm, defaults);
    }
    if let Some(overrides) = object_option(options, "overrides")? {
        frontmatter::apply_overrides(&mut fm, overrides);
    }

    pipeline.frontmatter = fm;
    pipeline.markdown = Some(body);
    Ok(pipeline)
}

fn gather_darkmatter(
    mut pipeline: Pipeline,
    options: &BuilderOptions,
) -> std::result::Result<Pipeline, BuilderError> {
    let wpm = u64_option(options, "words_per_minute")?.unwrap_or(200);
    let wpm = u32::try_from(wpm).unwrap_or(u32::MAX);
    pipeline.darkmatter = Some(darkmatter::analyze(pipeline.markdown()?, wpm));
    Ok(pipeline)
}

fn gather_toc(
    mut pipeline: Pipeline,
    options: &BuilderOptions,
) -> std::result::Result<Pipeline, BuilderError> {
    let depth = u64_option(options, "max_depth")?.unwrap_or(3).min(6) as u8;
    pipeline.toc = darkmatter::build_toc(pipeline.markdown()?, depth);
    Ok(pipeline)
}

fn object_option<'a>(options: &'a BuilderOptions, key: &str) -> Result<Option<&'a Frontmatter>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(DarkmatterError::validation(format!(
            "option '{key}' must be a table, got {other}"
        ))),
    }
}

fn u64_option(options: &BuilderOptions, key: &str) -> Result<Option<u64>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            DarkmatterError::validation(format!(
                "option '{key}' must be a non-negative integer, got {value}"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use darkmatter_core::{get_builder_task, group_builders};

    use super::*;

    fn parsed(raw: &str) -> Pipeline {
        let mut pipeline = Pipeline::new("doc", raw);
        pipeline.markdown = Some(raw.to_string());
        pipeline
    }

    #[test]
    fn every_stock_builder_resolves() {
        for (name, lifecycle) in STOCK_BUILDERS {
            let reg = stock_builder(name, *lifecycle).expect("stock builder");
            assert_eq!(reg.display_name(), *name);
            assert_eq!(reg.lifecycle, *lifecycle);
        }
        assert!(stock_builder("nope", Lifecycle::Parse).is_none());
    }

    #[test]
    fn default_config_registers_in_declaration_order() {
        let options = resolve_options(&AppConfig::default()).expect("resolve");
        let grouped = group_builders(&options);
        let transform: Vec<_> = grouped[&Lifecycle::Transform]
            .iter()
            .map(|b| b.display_name().to_string())
            .collect();
        assert_eq!(
            transform,
            vec!["normalize_headings", "clean_blank_lines", "ensure_trailing_newline"]
        );
        assert_eq!(grouped[&Lifecycle::Parse].len(), 1);
    }

    #[test]
    fn unknown_builder_is_a_config_error() {
        let mut config = AppConfig::default();
        config.builders.push(BuilderEntry::named("spellcheck"));
        let err = resolve_options(&config).unwrap_err();
        assert!(err.to_string().contains("unknown builder 'spellcheck'"));
    }

    #[test]
    fn lifecycle_override_moves_builder() {
        let mut config = AppConfig::default();
        config.builders = vec![BuilderEntry {
            name: "toc".into(),
            lifecycle: Some(Lifecycle::Finalize),
            options: BuilderOptions::new(),
        }];
        let grouped = group_builders(&resolve_options(&config).expect("resolve"));
        assert!(!grouped.contains_key(&Lifecycle::Darkmatter));
        assert_eq!(grouped[&Lifecycle::Finalize][0].options["max_depth"], 3);
    }

    #[tokio::test]
    async fn frontmatter_builder_applies_defaults_and_overrides() {
        let options = ResolvedMdOptions::new().with_builder(|| {
            stock_builder("frontmatter", Lifecycle::Parse)
                .unwrap()
                .with_option("defaults", json!({"layout": "doc", "title": "Untitled"}))
                .with_option("overrides", json!({"draft": false}))
        });

        let raw = "---\ntitle: Intro\ndraft: true\n---\nBody\n";
        let out = get_builder_task(Lifecycle::Parse, &options)(Pipeline::new("intro", raw))
            .await
            .expect("parse stage");
        assert_eq!(out.frontmatter["title"], "Intro");
        assert_eq!(out.frontmatter["layout"], "doc");
        assert_eq!(out.frontmatter["draft"], false);
        assert_eq!(out.markdown.as_deref(), Some("Body\n"));
    }

    #[tokio::test]
    async fn darkmatter_builder_requires_markdown() {
        let options = ResolvedMdOptions::new()
            .with_builder(|| stock_builder("darkmatter", Lifecycle::Darkmatter).unwrap());

        let err = get_builder_task(Lifecycle::Darkmatter, &options)(Pipeline::new("x", "text"))
            .await
            .unwrap_err();
        assert!(err.starts_with("During the \"darkmatter\" stage, the builder API \"darkmatter\""));
        assert!(err.contains("no markdown body for 'x'"));
    }

    #[tokio::test]
    async fn invalid_option_type_fails_the_builder() {
        let options = ResolvedMdOptions::new().with_builder(|| {
            stock_builder("toc", Lifecycle::Darkmatter)
                .unwrap()
                .with_option("max_depth", "deep")
        });

        let err = get_builder_task(Lifecycle::Darkmatter, &options)(parsed("# A\n"))
            .await
            .unwrap_err();
        assert!(err.contains("option 'max_depth' must be a non-negative integer"));
    }

    #[tokio::test]
    async fn darkmatter_uses_configured_reading_speed() {
        let mut config = AppConfig::default();
        config.defaults.words_per_minute = 2;
        config.builders = vec![BuilderEntry::named("darkmatter")];
        let options = resolve_options(&config).expect("resolve");

        let out = get_builder_task(Lifecycle::Darkmatter, &options)(parsed("one two three four five"))
            .await
            .expect("darkmatter stage");
        let dm = out.darkmatter.expect("darkmatter filled");
        assert_eq!(dm.word_count, 5);
        assert_eq!(dm.time_to_read, 3);
    }
}
