//! Encodes a script into the line-oriented, emoji-marked solution text.
//!
//! [`crate::parser::SolutionParser`] decodes the same format; both sides read
//! their markers from [`markers`].

use crate::schema::{Severity, TroubleshootingScript};

pub mod markers {
    pub const STEP_LABEL: &str = "Step";
    pub const METADATA_INDENT: &str = "   ";
    pub const NAVIGATION: &str = "📍 Navigation: ";
    pub const VISUAL_CUE: &str = "👀 What to look for: ";
    pub const OFFICIAL_LINK: &str = "🔗 Official Guide: ";
    pub const RESOURCES_HEADER: &str = "📚 Official Resources:";
    pub const RESOURCE_BULLET: &str = "• ";
    pub const WARNING: &str = "⚠️ Important: ";
    pub const TIP: &str = "💡 Additional Help: ";
}

/// Escalation marker for a script's tone.
pub fn escalation_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Serious => markers::WARNING,
        Severity::Friendly => markers::TIP,
    }
}

pub fn format_solution(script: &TroubleshootingScript, prefix: &str) -> String {
    let mut out = String::new();
    out.push_str(prefix);
    out.push_str(&script.diagnosis);
    out.push_str("\n\n");

    for (index, step) in script.steps.iter().enumerate() {
        out.push_str(&format!(
            "{} {} {}: {}\n",
            step.emoji,
            markers::STEP_LABEL,
            index + 1,
            step.instruction
        ));

        let metadata = [
            (markers::NAVIGATION, &step.navigation),
            (markers::VISUAL_CUE, &step.visual_cue),
            (markers::OFFICIAL_LINK, &step.official_link),
        ];
        for (marker, value) in metadata {
            if let Some(value) = value {
                out.push_str(&format!("{}{marker}{value}\n", markers::METADATA_INDENT));
            }
        }

        out.push('\n');
    }

    out.push_str(&script.encouragement);

    if !script.resources.is_empty() {
        out.push_str(&format!("\n\n{}\n", markers::RESOURCES_HEADER));
        for link in &script.resources {
            out.push_str(&format!(
                "{}{}: [{}]({})\n",
                markers::RESOURCE_BULLET,
                link.platform,
                link.title,
                link.url
            ));
        }
    }

    if let Some(ref escalation) = script.escalation {
        out.push_str("\n\n");
        out.push_str(escalation_marker(script.severity));
        out.push_str(escalation);
    }

    out
}
