use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ALL_PREFIXES;
use crate::error::{CoreError, Result};
use crate::formatter::markers;
use crate::parser::SolutionParser;
use crate::schema::{Category, Severity, TroubleshootingScript};

const BUILTIN_SCRIPTS: &str = include_str!("../assets/scripts.toml");

/// Immutable set of canned scripts, one per category plus a generic fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub network: TroubleshootingScript,
    pub performance: TroubleshootingScript,
    pub mobile: TroubleshootingScript,
    pub display: TroubleshootingScript,
    pub audio: TroubleshootingScript,
    pub applications: TroubleshootingScript,
    pub fallback: TroubleshootingScript,
}

impl Catalog {
    /// Parse the catalog shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_SCRIPTS)
    }

    /// Load a user catalog from a TOML file with the same layout as the built-in one.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CoreError::Catalog(format!("failed to read {}: {e}", path.display())))?;
        let catalog = Self::from_toml(&contents)?;
        debug!(path = %path.display(), "loaded script catalog");
        Ok(catalog)
    }

    /// Load the catalog at `path` if given, else the built-in one.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Self::builtin(),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let catalog: Catalog = toml::from_str(contents)
            .map_err(|e| CoreError::Catalog(format!("failed to parse catalog: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Script for a matched category, or the fallback when nothing matched.
    pub fn script(&self, category: Option<Category>) -> &TroubleshootingScript {
        match category {
            Some(Category::Network) => &self.network,
            Some(Category::Performance) => &self.performance,
            Some(Category::Mobile) => &self.mobile,
            Some(Category::Display) => &self.display,
            Some(Category::Audio) => &self.audio,
            Some(Category::Applications) => &self.applications,
            None => &self.fallback,
        }
    }

    /// All scripts with their category; the fallback comes last with `None`.
    pub fn iter(&self) -> impl Iterator<Item = (Option<Category>, &TroubleshootingScript)> {
        Category::ALL
            .into_iter()
            .map(Some)
            .chain(std::iter::once(None))
            .map(move |c| (c, self.script(c)))
    }

    /// Reject scripts the line-oriented solution format cannot carry.
    pub fn validate(&self) -> Result<()> {
        let parser = SolutionParser::new()?;
        for (category, script) in self.iter() {
            let name = category.map(|c| c.as_str()).unwrap_or("fallback");

            if script.steps.is_empty() {
                return Err(CoreError::Catalog(format!("{name}: script has no steps")));
            }

            // Severity only travels in the escalation marker.
            if script.severity == Severity::Serious && script.escalation.is_none() {
                return Err(CoreError::Catalog(format!(
                    "{name}: serious script needs an escalation"
                )));
            }

            let mut fields: Vec<(&str, &str)> = vec![
                ("diagnosis", script.diagnosis.as_str()),
                ("encouragement", script.encouragement.as_str()),
            ];
            if let Some(ref escalation) = script.escalation {
                fields.push(("escalation", escalation.as_str()));
            }
            for step in &script.steps {
                fields.push(("step emoji", step.emoji.as_str()));
                fields.push(("step instruction", step.instruction.as_str()));
                for optional in [&step.navigation, &step.visual_cue, &step.official_link]
                    .into_iter()
                    .flatten()
                {
                    fields.push(("step metadata", optional.as_str()));
                }
            }
            for link in &script.resources {
                fields.push(("resource platform", link.platform.as_str()));
                fields.push(("resource title", link.title.as_str()));
                fields.push(("resource url", link.url.as_str()));
            }

            for (field, value) in fields {
                if value.contains('\n') || value.contains('\r') {
                    return Err(CoreError::Catalog(format!(
                        "{name}: {field} must be a single line"
                    )));
                }
            }

            for (field, value) in [
                ("diagnosis", script.diagnosis.as_str()),
                ("encouragement", script.encouragement.as_str()),
            ] {
                if let Some(reason) = free_line_conflict(&parser, value) {
                    return Err(CoreError::Catalog(format!("{name}: {field} {reason}")));
                }
            }
            if ALL_PREFIXES.iter().any(|p| script.diagnosis.starts_with(p)) {
                return Err(CoreError::Catalog(format!(
                    "{name}: diagnosis must not start with a follow-up sentence"
                )));
            }

            for step in &script.steps {
                if step.emoji.trim().is_empty() || step.emoji.chars().any(char::is_whitespace) {
                    return Err(CoreError::Catalog(format!(
                        "{name}: step emoji must be a single non-blank token"
                    )));
                }
            }

            for link in &script.resources {
                if link.platform.contains(':') || link.title.contains(']') || link.url.contains(')')
                {
                    return Err(CoreError::Catalog(format!(
                        "{name}: resource link '{}' contains a reserved character",
                        link.title
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Why a diagnosis or encouragement would be misread as another part of the
/// solution text, if it would be.
fn free_line_conflict(parser: &SolutionParser, value: &str) -> Option<&'static str> {
    if value.starts_with(char::is_whitespace) {
        Some("must not start with whitespace")
    } else if value.starts_with(markers::WARNING) || value.starts_with(markers::TIP) {
        Some("must not start with an escalation marker")
    } else if value == markers::RESOURCES_HEADER {
        Some("must not be the resources header")
    } else if parser.is_step_line(value) {
        Some("must not look like a numbered step")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_catalog_should_parse_and_validate() {
        let catalog = Catalog::builtin().unwrap();
        for (_, script) in catalog.iter() {
            assert_eq!(script.steps.len(), 4);
            assert!(script.escalation.is_some());
        }
        assert!(catalog.fallback.resources.is_empty());
        assert_eq!(catalog.network.resources.len(), 3);
    }

    #[test]
    fn builtin_severities_match_script_tone() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.mobile.severity, Severity::Serious);
        assert_eq!(catalog.display.severity, Severity::Serious);
        assert_eq!(catalog.network.severity, Severity::Friendly);
        assert_eq!(catalog.performance.severity, Severity::Friendly);
        assert_eq!(catalog.audio.severity, Severity::Friendly);
        assert_eq!(catalog.applications.severity, Severity::Friendly);
    }

    #[test]
    fn script_none_should_return_fallback() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.script(None), &catalog.fallback);
        assert_eq!(catalog.script(Some(Category::Audio)), &catalog.audio);
    }

    #[test]
    fn validate_should_reject_multiline_fields() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.audio.encouragement = "first line\nsecond line".to_string();
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("audio: encouragement"));
    }

    #[test]
    fn validate_should_reject_serious_script_without_escalation() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.mobile.escalation = None;
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("mobile: serious script needs an escalation"));

        catalog.mobile.severity = Severity::Friendly;
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn validate_should_reject_indented_free_text() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.audio.encouragement = "   Hang in there!".to_string();
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("audio: encouragement must not start with whitespace"));
    }

    #[test]
    fn validate_should_reject_step_shaped_free_text() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.audio.diagnosis = "🔊 Step 1: let's get your sound back.".to_string();
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("audio: diagnosis must not look like a numbered step"));
    }

    #[test]
    fn validate_should_reject_section_markers_in_free_text() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.network.encouragement = markers::RESOURCES_HEADER.to_string();
        assert!(catalog.validate().is_err());

        let mut catalog = Catalog::builtin().unwrap();
        catalog.network.diagnosis = format!("{}call your ISP", markers::TIP);
        assert!(catalog.validate().is_err());

        let mut catalog = Catalog::builtin().unwrap();
        catalog.network.diagnosis = format!("{}Router trouble.", ALL_PREFIXES[0]);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn validated_edge_scripts_round_trip() {
        use crate::formatter::format_solution;

        let mut catalog = Catalog::builtin().unwrap();
        catalog.audio.encouragement = "Hang in there! Step 1 is the hardest.".to_string();
        catalog.audio.diagnosis = String::new();
        catalog.display.escalation = None;
        catalog.display.severity = Severity::Friendly;
        catalog.validate().unwrap();

        let parser = SolutionParser::new().unwrap();
        for script in [&catalog.audio, &catalog.display] {
            let parsed = parser.parse(&format_solution(script, ""));
            assert_eq!(&parsed.script, script);
        }
    }

    #[test]
    fn validate_should_reject_empty_steps() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.fallback.steps.clear();
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn load_from_should_read_user_catalog() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.network.diagnosis = "Custom network diagnosis.".to_string();
        let toml_str = toml::to_string_pretty(&catalog).unwrap();

        let mut f = NamedTempFile::new().unwrap();
        f.write_all(toml_str.as_bytes()).unwrap();

        let loaded = Catalog::load_from(f.path()).unwrap();
        assert_eq!(loaded.network.diagnosis, "Custom network diagnosis.");
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn load_from_should_reject_missing_script() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"[network]\ndiagnosis = \"x\"\nencouragement = \"y\"\nsteps = []\n")
            .unwrap();
        assert!(matches!(
            Catalog::load_from(f.path()),
            Err(CoreError::Catalog(_))
        ));
    }
}
