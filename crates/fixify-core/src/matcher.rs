use tracing::debug;

use crate::schema::Category;

/// Keyword sets in matching priority order. The first category with any
/// keyword contained in the normalized problem wins.
pub const KEYWORDS: [(Category, &[&str]); 6] = [
    (Category::Network, &["wifi", "internet", "connection"]),
    (Category::Performance, &["slow", "sluggish", "lag"]),
    (Category::Mobile, &["phone", "mobile", "freeze", "crash"]),
    (Category::Display, &["screen", "display", "monitor", "flicker"]),
    (Category::Audio, &["sound", "audio", "speaker", "volume"]),
    (
        Category::Applications,
        &["program", "software", "app", "application"],
    ),
];

pub fn normalize(problem: &str) -> String {
    problem.to_lowercase()
}

/// Match a raw problem description to a category by substring containment.
///
/// Returns `None` when no keyword is present; callers fall back to the generic script.
pub fn match_category(problem: &str) -> Option<Category> {
    let normalized = normalize(problem);
    for (category, keywords) in KEYWORDS {
        if let Some(keyword) = keywords.iter().find(|k| normalized.contains(*k)) {
            debug!(category = %category, keyword, "matched problem category");
            return Some(category);
        }
    }
    debug!("no category keyword matched");
    None
}

pub fn keywords_for(category: Category) -> &'static [&'static str] {
    KEYWORDS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, k)| *k)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_keyword_alone_selects_its_category() {
        for (category, keywords) in KEYWORDS {
            for keyword in keywords {
                assert_eq!(
                    match_category(keyword),
                    Some(category),
                    "keyword {keyword:?}"
                );
            }
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(match_category("My WiFi keeps dropping"), Some(Category::Network));
        assert_eq!(match_category("SOUND is gone"), Some(Category::Audio));
    }

    #[test]
    fn earlier_category_wins_on_overlap() {
        assert_eq!(
            match_category("wifi is slow on my laptop"),
            Some(Category::Network)
        );
        assert_eq!(
            match_category("my phone screen is slow"),
            Some(Category::Performance)
        );
        assert_eq!(
            match_category("the monitor volume buttons"),
            Some(Category::Display)
        );
    }

    #[test]
    fn crash_outranks_applications() {
        // "crash" belongs to the mobile set, which is checked before applications.
        assert_eq!(
            match_category("A program won't open or keeps crashing"),
            Some(Category::Mobile)
        );
    }

    #[test]
    fn empty_or_unrelated_input_matches_nothing() {
        assert_eq!(match_category(""), None);
        assert_eq!(match_category("my printer is out of ink"), None);
    }

    #[test]
    fn keywords_for_returns_the_category_set() {
        assert_eq!(keywords_for(Category::Audio), &["sound", "audio", "speaker", "volume"]);
    }
}
