use fixify_core::formatter::escalation_marker;
use fixify_core::schema::ParsedSolution;

const RULE: &str = "────────────────────────────────────────";

/// Lay out a parsed solution as numbered step cards for the terminal.
pub fn render_solution(parsed: &ParsedSolution, show_resources: bool) -> String {
    let script = &parsed.script;
    let mut out = String::new();

    if let Some(context) = &parsed.context {
        out.push_str(context.trim_end());
        out.push('\n');
    }
    if !script.diagnosis.is_empty() {
        out.push_str(&script.diagnosis);
        out.push('\n');
    }

    for (i, step) in script.steps.iter().enumerate() {
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!("{} {}. {}\n", step.emoji, i + 1, step.instruction));
        if let Some(nav) = &step.navigation {
            out.push_str(&format!("     Where:  {nav}\n"));
        }
        if let Some(cue) = &step.visual_cue {
            out.push_str(&format!("     Look:   {cue}\n"));
        }
        if let Some(link) = &step.official_link {
            out.push_str(&format!("     Guide:  {link}\n"));
        }
    }
    if !script.steps.is_empty() {
        out.push_str(RULE);
        out.push('\n');
    }

    if !script.encouragement.is_empty() {
        out.push('\n');
        out.push_str(&script.encouragement);
        out.push('\n');
    }

    if show_resources && !script.resources.is_empty() {
        out.push_str("\nOfficial resources:\n");
        for link in &script.resources {
            out.push_str(&format!("  {} - {}\n    {}\n", link.platform, link.title, link.url));
        }
    }

    if let Some(escalation) = &script.escalation {
        out.push('\n');
        out.push_str(escalation_marker(script.severity).trim_end());
        out.push(' ');
        out.push_str(escalation);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixify_core::catalog::Catalog;
    use fixify_core::context::FOLLOW_UP_PREFIX;
    use fixify_core::formatter::format_solution;
    use fixify_core::parser::parse_solution;

    #[test]
    fn renders_numbered_cards_with_metadata() {
        let catalog = Catalog::builtin().unwrap();
        let parsed = parse_solution(&format_solution(&catalog.network, "")).unwrap();
        let out = render_solution(&parsed, true);

        assert!(out.starts_with(&catalog.network.diagnosis));
        for (i, step) in catalog.network.steps.iter().enumerate() {
            assert!(out.contains(&format!("{} {}. {}", step.emoji, i + 1, step.instruction)));
        }
        assert!(out.contains("     Where:  "));
        assert!(out.contains("Official resources:"));
        assert!(out.contains(&catalog.network.resources[0].url));
        assert!(out.contains("💡 Additional Help:"));
    }

    #[test]
    fn hides_resources_when_disabled() {
        let catalog = Catalog::builtin().unwrap();
        let parsed = parse_solution(&format_solution(&catalog.audio, "")).unwrap();
        let out = render_solution(&parsed, false);
        assert!(!out.contains("Official resources:"));
        assert!(out.contains(&catalog.audio.encouragement));
    }

    #[test]
    fn serious_scripts_render_warning_and_context() {
        let catalog = Catalog::builtin().unwrap();
        let text = format_solution(&catalog.mobile, FOLLOW_UP_PREFIX);
        let out = render_solution(&parse_solution(&text).unwrap(), true);
        assert!(out.starts_with(FOLLOW_UP_PREFIX.trim_end()));
        assert!(out.contains("⚠️ Important: ⚠️ If your phone"));
    }
}
