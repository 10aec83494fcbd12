use crate::matcher::normalize;
use crate::schema::ConversationEntry;

pub const FOLLOW_UP_PREFIX: &str = "I see the previous solution didn't fully resolve your issue. Let me provide some additional steps with more detailed visual guidance. ";

pub const CONTINUATION_PREFIX: &str = "Great! Since we've been working on this together, here's what to try next with clear visual cues. ";

pub const RELATED_PREFIX: &str = "I notice this might be related to the issue we discussed earlier. Here's a more targeted approach. ";

/// Every sentence the annotator can emit, used by the parser to split it off the diagnosis.
pub const ALL_PREFIXES: [&str; 3] = [FOLLOW_UP_PREFIX, CONTINUATION_PREFIX, RELATED_PREFIX];

const FOLLOW_UP_MARKERS: [&str; 3] = ["still", "didn't work", "not working"];
const CONTINUATION_MARKERS: [&str; 2] = ["now", "next"];

/// (earlier problem keyword, current problem keyword)
const RELATED_PAIRS: [(&str, &str); 3] = [("wifi", "internet"), ("slow", "freeze"), ("phone", "app")];

/// Sentence to put in front of the diagnosis, based on the conversation so far.
///
/// Rules are checked in order: no history, follow-up wording, continuation
/// wording, then a known pairing between the last problem and this one.
pub fn contextual_prefix(problem: &str, history: &[ConversationEntry]) -> &'static str {
    let Some(last) = history.last() else {
        return "";
    };

    let current = normalize(problem);
    let previous = normalize(&last.problem);

    if FOLLOW_UP_MARKERS.iter().any(|m| current.contains(m)) {
        return FOLLOW_UP_PREFIX;
    }

    if CONTINUATION_MARKERS.iter().any(|m| current.contains(m)) {
        return CONTINUATION_PREFIX;
    }

    if RELATED_PAIRS
        .iter()
        .any(|(before, after)| previous.contains(before) && current.contains(after))
    {
        return RELATED_PREFIX;
    }

    ""
}
