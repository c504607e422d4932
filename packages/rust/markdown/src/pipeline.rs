//! The document payload threaded through every builder stage.

use serde::{Deserialize, Serialize};

use darkmatter_shared::{DarkmatterError, Result};

/// Key/value metadata declared at the top of a markdown document.
pub type Frontmatter = serde_json::Map<String, serde_json::Value>;

/// Where the raw content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    File,
    Database,
}

/// Metadata derived from the markdown body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Darkmatter {
    /// Words in the body, excluding fenced code.
    pub word_count: usize,
    /// Estimated reading time in whole minutes.
    pub time_to_read: u32,
    /// SHA-256 of the markdown body (hex).
    pub content_hash: String,
    /// SHA-256 over the heading outline; changes only when the structure does.
    pub structure_hash: String,
    /// Deepest heading level used, or 0 when there are no headings.
    pub max_nesting: u8,
}

/// A heading discovered in the markdown body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
    /// Anchor slug, unique within the document.
    pub slug: String,
}

/// One document moving through the pipeline.
///
/// Fields fill in as stages run: `markdown` and `frontmatter` after `parse`,
/// `darkmatter` and `toc` after `darkmatter`, `html` once a render builder is
/// registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: String,
    pub route: String,
    pub source: Source,
    /// Content exactly as loaded.
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default)]
    pub frontmatter: Frontmatter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub darkmatter: Option<Darkmatter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toc: Vec<TocEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl Pipeline {
    /// Start a pipeline for `id`; ids prefixed with `db::` come from a database.
    pub fn new(id: &str, raw: impl Into<String>) -> Self {
        let source = match id.starts_with("db::") {
            true => Source::Database,
            false => Source::File,
        };
        Self {
            id: id.to_string(),
            route: id.to_string(),
            source,
            raw: raw.into(),
            markdown: None,
            frontmatter: Frontmatter::new(),
            darkmatter: None,
            toc: Vec::new(),
            html: None,
        }
    }

    /// Override the route (defaults to the id).
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    /// The parsed markdown body, or an error if the parse stage has not produced one.
    pub fn markdown(&self) -> Result<&str> {
        self.markdown.as_deref().ok_or_else(|| {
            DarkmatterError::validation(format!(
                "no markdown body for '{}'; register the `frontmatter` builder in the parse stage",
                self.id
            ))
        })
    }

    /// Replace the markdown body through `f`.
    pub fn map_markdown(mut self, f: impl FnOnce(&str) -> String) -> Result<Self> {
        let updated = f(self.markdown()?);
        self.markdown = Some(updated);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_follows_id_prefix() {
        assert_eq!(Pipeline::new("docs/intro.md", "").source, Source::File);
        assert_eq!(Pipeline::new("db::42", "").source, Source::Database);
    }

    #[test]
    fn markdown_is_required_before_mapping() {
        let pipeline = Pipeline::new("intro", "# Hi");
        let err = pipeline.map_markdown(|md| md.to_uppercase()).unwrap_err();
        assert!(err.to_string().contains("frontmatter"));
    }

    #[test]
    fn map_markdown_replaces_body() {
        let mut pipeline = Pipeline::new("intro", "# Hi");
        pipeline.markdown = Some("# Hi".into());
        let pipeline = pipeline.map_markdown(|md| md.to_uppercase()).expect("mapped");
        assert_eq!(pipeline.markdown.as_deref(), Some("# HI"));
    }

    #[test]
    fn serialization_skips_unfilled_fields() {
        let json = serde_json::to_value(Pipeline::new("intro", "body")).expect("serialize");
        assert_eq!(json["source"], "file");
        assert!(json.get("markdown").is_none());
        assert!(json.get("toc").is_none());
    }
}
