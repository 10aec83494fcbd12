use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

// -- Script catalog types --

/// Problem class used to pick a canned script.
///
/// Variants are listed in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Network,
    Performance,
    Mobile,
    Display,
    Audio,
    Applications,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Network,
        Category::Performance,
        Category::Mobile,
        Category::Display,
        Category::Audio,
        Category::Applications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Network => "network",
            Category::Performance => "performance",
            Category::Mobile => "mobile",
            Category::Display => "display",
            Category::Audio => "audio",
            Category::Applications => "applications",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tone of a script; picks the escalation marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Friendly,
    Serious,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub emoji: String,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_cue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub platform: String,
    pub title: String,
    pub url: String,
}

/// Full canned response for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TroubleshootingScript {
    pub diagnosis: String,
    pub steps: Vec<Step>,
    pub encouragement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceLink>,
}

// -- Conversation types --

/// One submitted problem and the answer it produced. Never mutated once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub problem: String,
    pub solution: String,
    pub timestamp: DateTime<Local>,
}

/// A solution blob decoded back into the script schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSolution {
    /// Contextual sentence that preceded the diagnosis, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub script: TroubleshootingScript,
}

// -- Location types --

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}
