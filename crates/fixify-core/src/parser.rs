use regex_lite::Regex;
use tracing::debug;

use crate::context::ALL_PREFIXES;
use crate::error::{CoreError, Result};
use crate::formatter::markers;
use crate::schema::{ParsedSolution, ResourceLink, Severity, Step, TroubleshootingScript};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Intro,
    Body,
    Steps,
    Encouragement,
    Resources,
    Escalation,
}

/// Decodes solution text produced by [`crate::formatter::format_solution`].
///
/// Lines that fit no section are skipped and logged at debug level.
pub struct SolutionParser {
    step_re: Regex,
    resource_re: Regex,
}

impl SolutionParser {
    pub fn new() -> Result<Self> {
        let step_re = compile(
            "step",
            &format!(r"^(\S+) {} (\d+): (.*)$", markers::STEP_LABEL),
        )?;
        let resource_re = compile(
            "resource",
            &format!(
                r"^{}([^:]+): \[([^\]]*)\]\(([^)]*)\)$",
                markers::RESOURCE_BULLET
            ),
        )?;
        Ok(Self {
            step_re,
            resource_re,
        })
    }

    /// Whether a line has the shape of a numbered step.
    pub fn is_step_line(&self, line: &str) -> bool {
        self.step_re.is_match(line)
    }

    pub fn parse(&self, text: &str) -> ParsedSolution {
        let mut section = Section::Intro;
        let mut intro: Vec<&str> = Vec::new();
        let mut steps: Vec<Step> = Vec::new();
        let mut encouragement = String::new();
        let mut resources = Vec::new();
        let mut escalation = None;
        let mut severity = Severity::Friendly;

        for line in text.lines() {
            if line.trim().is_empty() {
                if section == Section::Intro && !intro.is_empty() {
                    section = Section::Body;
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix(markers::WARNING) {
                escalation = Some(rest.to_string());
                severity = Severity::Serious;
                section = Section::Escalation;
                continue;
            }
            if let Some(rest) = line.strip_prefix(markers::TIP) {
                escalation = Some(rest.to_string());
                severity = Severity::Friendly;
                section = Section::Escalation;
                continue;
            }

            if line == markers::RESOURCES_HEADER {
                section = Section::Resources;
                continue;
            }

            match section {
                Section::Intro if !intro.is_empty() || !self.step_re.is_match(line) => {
                    intro.push(line)
                }
                Section::Intro | Section::Body | Section::Steps => {
                    if let Some(step) = self.parse_step(line, steps.len()) {
                        steps.push(step);
                        section = Section::Steps;
                    } else if section == Section::Steps && self.attach_metadata(line, &mut steps)
                    {
                        continue;
                    } else {
                        encouragement = line.to_string();
                        section = Section::Encouragement;
                    }
                }
                Section::Resources => match self.parse_resource(line) {
                    Some(link) => resources.push(link),
                    None => debug!(line, "dropping unrecognized resource line"),
                },
                Section::Encouragement | Section::Escalation => {
                    debug!(line, ?section, "dropping unrecognized line");
                }
            }
        }

        let intro = intro.join("\n");
        let (context, diagnosis) = split_context(&intro);

        ParsedSolution {
            context,
            script: TroubleshootingScript {
                diagnosis,
                steps,
                encouragement,
                escalation,
                severity,
                resources,
            },
        }
    }

    fn parse_step(&self, line: &str, parsed_so_far: usize) -> Option<Step> {
        let caps = self.step_re.captures(line)?;
        let number: usize = caps[2].parse().ok()?;
        if number != parsed_so_far + 1 {
            debug!(number, expected = parsed_so_far + 1, "step number out of sequence");
        }
        Some(Step {
            emoji: caps[1].to_string(),
            instruction: caps[3].to_string(),
            navigation: None,
            visual_cue: None,
            official_link: None,
        })
    }

    fn attach_metadata(&self, line: &str, steps: &mut [Step]) -> bool {
        let Some(step) = steps.last_mut() else {
            return false;
        };
        let Some(body) = line.strip_prefix(markers::METADATA_INDENT) else {
            return false;
        };

        if let Some(value) = body.strip_prefix(markers::NAVIGATION) {
            step.navigation = Some(value.to_string());
        } else if let Some(value) = body.strip_prefix(markers::VISUAL_CUE) {
            step.visual_cue = Some(value.to_string());
        } else if let Some(value) = body.strip_prefix(markers::OFFICIAL_LINK) {
            step.official_link = Some(value.to_string());
        } else {
            debug!(line, "dropping unrecognized step metadata");
        }
        true
    }

    fn parse_resource(&self, line: &str) -> Option<ResourceLink> {
        let caps = self.resource_re.captures(line)?;
        Some(ResourceLink {
            platform: caps[1].to_string(),
            title: caps[2].to_string(),
            url: caps[3].to_string(),
        })
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| CoreError::Internal(format!("{name} pattern: {e}")))
}

fn split_context(intro: &str) -> (Option<String>, String) {
    for prefix in ALL_PREFIXES {
        if let Some(rest) = intro.strip_prefix(prefix) {
            return (Some(prefix.to_string()), rest.to_string());
        }
    }
    (None, intro.to_string())
}

/// Parse with a freshly built parser.
pub fn parse_solution(text: &str) -> Result<ParsedSolution> {
    Ok(SolutionParser::new()?.parse(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::context::{CONTINUATION_PREFIX, FOLLOW_UP_PREFIX};
    use crate::formatter::format_solution;

    fn parser() -> SolutionParser {
        SolutionParser::new().unwrap()
    }

    #[test]
    fn every_builtin_script_round_trips() {
        let catalog = Catalog::builtin().unwrap();
        let parser = parser();
        for (category, script) in catalog.iter() {
            let parsed = parser.parse(&format_solution(script, ""));
            assert_eq!(parsed.context, None, "{category:?}");
            assert_eq!(&parsed.script, script, "{category:?}");
        }
    }

    #[test]
    fn round_trip_keeps_optional_field_presence() {
        let catalog = Catalog::builtin().unwrap();
        let mut script = catalog.performance.clone();
        script.steps[0].navigation = None;
        script.steps[0].visual_cue = None;
        script.steps[2].official_link = Some("https://example.com/cleanup".to_string());
        script.resources.clear();
        script.escalation = None;

        let parsed = parser().parse(&format_solution(&script, ""));
        assert_eq!(parsed.script, script);
    }

    #[test]
    fn context_prefix_is_split_from_diagnosis() {
        let catalog = Catalog::builtin().unwrap();
        let text = format_solution(&catalog.audio, FOLLOW_UP_PREFIX);
        let parsed = parser().parse(&text);
        assert_eq!(parsed.context.as_deref(), Some(FOLLOW_UP_PREFIX));
        assert_eq!(parsed.script, catalog.audio);

        let text = format_solution(&catalog.display, CONTINUATION_PREFIX);
        let parsed = parser().parse(&text);
        assert_eq!(parsed.context.as_deref(), Some(CONTINUATION_PREFIX));
        assert_eq!(parsed.script.diagnosis, catalog.display.diagnosis);
    }

    #[test]
    fn serious_escalation_keeps_leading_warning_emoji() {
        let catalog = Catalog::builtin().unwrap();
        let parsed = parser().parse(&format_solution(&catalog.mobile, ""));
        assert_eq!(parsed.script.severity, Severity::Serious);
        assert!(parsed
            .script
            .escalation
            .as_deref()
            .is_some_and(|e| e.starts_with("⚠️ If your phone")));
    }

    #[test]
    fn unrecognized_lines_are_dropped() {
        let text = "Diagnosis.\n\n🔄 Step 1: Restart.\n   ❓ Mystery: ignored\n\nKeep going!\nstray line\n\n📚 Official Resources:\n• not a link\n• Apple: [Help](https://apple.com)\n";
        let parsed = parser().parse(text);
        assert_eq!(parsed.script.steps.len(), 1);
        assert_eq!(parsed.script.steps[0].navigation, None);
        assert_eq!(parsed.script.encouragement, "Keep going!");
        assert_eq!(parsed.script.resources.len(), 1);
        assert_eq!(parsed.script.resources[0].platform, "Apple");
        assert_eq!(parsed.script.escalation, None);
    }

    #[test]
    fn empty_diagnosis_does_not_swallow_first_step() {
        let catalog = Catalog::builtin().unwrap();
        let mut script = catalog.network.clone();
        script.diagnosis = String::new();
        let parsed = parser().parse(&format_solution(&script, ""));
        assert_eq!(parsed.script, script);
    }

    #[test]
    fn bad_marker_pattern_is_an_internal_error() {
        assert!(matches!(
            compile("step", "(unclosed"),
            Err(CoreError::Internal(msg)) if msg.starts_with("step pattern")
        ));
        assert!(compile("step", r"^\S+$").is_ok());
    }

    #[test]
    fn empty_text_parses_to_empty_script() {
        let parsed = parse_solution("").unwrap();
        assert!(parsed.script.steps.is_empty());
        assert!(parsed.script.diagnosis.is_empty());
        assert!(parsed.script.encouragement.is_empty());
    }
}
