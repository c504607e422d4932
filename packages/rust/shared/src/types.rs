//! Core domain types shared by the builder pipeline.

use serde::{Deserialize, Serialize};

use crate::error::DarkmatterError;

/// Static, read-only options attached to a builder registration.
pub type BuilderOptions = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// A point in the document pipeline at which builders may transform the payload.
///
/// Variants are declared in pipeline order, so `Ord` follows execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Raw content is loaded; nothing has been parsed.
    Initialize,
    /// Raw content is split into frontmatter and markdown.
    Parse,
    /// The markdown body may be rewritten.
    Transform,
    /// Metadata about the content (word count, TOC, hashes) is gathered.
    Darkmatter,
    /// Markdown is turned into the output format.
    Render,
    /// Last chance to adjust the rendered output.
    Finalize,
}

impl Lifecycle {
    /// Every stage, in execution order.
    pub const ALL: [Lifecycle; 6] = [
        Self::Initialize,
        Self::Parse,
        Self::Transform,
        Self::Darkmatter,
        Self::Render,
        Self::Finalize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Parse => "parse",
            Self::Transform => "transform",
            Self::Darkmatter => "darkmatter",
            Self::Render => "render",
            Self::Finalize => "finalize",
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Lifecycle {
    type Err = DarkmatterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DarkmatterError::validation(format!("unknown lifecycle stage '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_parse_and_display() {
        for stage in Lifecycle::ALL {
            let parsed: Lifecycle = stage.to_string().parse().expect("parse stage");
            assert_eq!(parsed, stage);
        }
        assert_eq!("Render".parse::<Lifecycle>().unwrap(), Lifecycle::Render);
    }

    #[test]
    fn unknown_lifecycle_is_rejected() {
        let err = "publish".parse::<Lifecycle>().unwrap_err();
        assert!(err.to_string().contains("unknown lifecycle stage 'publish'"));
    }

    #[test]
    fn lifecycle_orders_by_pipeline_position() {
        assert!(Lifecycle::Initialize < Lifecycle::Parse);
        assert!(Lifecycle::Transform < Lifecycle::Darkmatter);
        assert!(Lifecycle::Render < Lifecycle::Finalize);
    }

    #[test]
    fn lifecycle_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Lifecycle::Darkmatter).expect("serialize");
        assert_eq!(json, "\"darkmatter\"");
    }
}
