use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::context::contextual_prefix;
use crate::error::{CoreError, Result};
use crate::formatter::format_solution;
use crate::location;
use crate::matcher::match_category;
use crate::schema::{Category, ConversationEntry, Coordinates};

/// A canned example problem offered before the user types anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickProblem {
    pub title: &'static str,
    pub problem: &'static str,
}

pub static QUICK_PROBLEMS: [QuickProblem; 6] = [
    QuickProblem {
        title: "WiFi Connection Issues",
        problem: "I can't connect to WiFi",
    },
    QuickProblem {
        title: "Slow Computer",
        problem: "My laptop is running very slowly",
    },
    QuickProblem {
        title: "Phone Problems",
        problem: "My phone keeps freezing and crashing",
    },
    QuickProblem {
        title: "Display Issues",
        problem: "My screen is flickering or has strange colors",
    },
    QuickProblem {
        title: "Audio Problems",
        problem: "I have no sound coming from my speakers",
    },
    QuickProblem {
        title: "Software Issues",
        problem: "A program won't open or keeps crashing",
    },
];

/// Match, annotate and format a problem into solution text.
///
/// Total over all inputs: anything that matches no category gets the fallback script.
pub fn generate_solution(
    catalog: &Catalog,
    problem: &str,
    history: &[ConversationEntry],
) -> (Option<Category>, String) {
    let category = match_category(problem);
    let script = catalog.script(category);
    let prefix = contextual_prefix(problem, history);
    (category, format_solution(script, prefix))
}

/// What a submission produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub problem: String,
    pub solution: String,
    pub category: Option<Category>,
    /// Solution talks about hardware, professionals or repair centers.
    pub offers_repair_centers: bool,
    /// Solution points at nearby service centers and no location is known yet.
    pub wants_location: bool,
}

/// One user's conversation: the append-only history plus session-scoped state.
pub struct Session {
    id: Uuid,
    catalog: Arc<Catalog>,
    history: Vec<ConversationEntry>,
    current: Option<Reply>,
    location: Option<Coordinates>,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, "session started");
        Self {
            id,
            catalog,
            history: Vec::new(),
            current: None,
            location: None,
        }
    }

    pub fn history(&self) -> &[ConversationEntry] {
        &self.history
    }

    pub fn current(&self) -> Option<&Reply> {
        self.current.as_ref()
    }

    pub fn set_location(&mut self, location: Option<Coordinates>) {
        self.location = location;
    }

    pub fn submit(&mut self, problem: &str) -> Result<&Reply> {
        let problem = problem.trim();
        if problem.is_empty() {
            return Err(CoreError::InvalidInput(
                "describe the problem before asking for help".to_string(),
            ));
        }

        let (category, solution) = generate_solution(&self.catalog, problem, &self.history);
        info!(
            session = %self.id,
            category = category.map(|c| c.as_str()).unwrap_or("fallback"),
            turn = self.history.len() + 1,
            "generated solution"
        );

        self.history.push(ConversationEntry {
            problem: problem.to_string(),
            solution: solution.clone(),
            timestamp: Local::now(),
        });

        let reply = Reply {
            problem: problem.to_string(),
            offers_repair_centers: location::offers_repair_centers(&solution),
            wants_location: location::mentions_service_center(&solution)
                && self.location.is_none(),
            category,
            solution,
        };
        Ok(&*self.current.insert(reply))
    }

    pub fn submit_quick(&mut self, index: usize) -> Result<&Reply> {
        let quick = QUICK_PROBLEMS.get(index).ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "quick help index {index} out of range (0-{})",
                QUICK_PROBLEMS.len() - 1
            ))
        })?;
        self.submit(quick.problem)
    }

    /// Clear the current answer to ask about something else. History is kept.
    pub fn new_problem(&mut self) {
        self.current = None;
    }

    /// Repair-center search URL for the current problem.
    pub fn repair_search_url(&self, zoom: u8) -> Option<String> {
        self.current
            .as_ref()
            .map(|r| location::repair_search_url(&r.problem, self.location, zoom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FOLLOW_UP_PREFIX, RELATED_PREFIX};

    fn session() -> Session {
        Session::new(Arc::new(Catalog::builtin().unwrap()))
    }

    #[test]
    fn generate_solution_falls_back_for_unknown_problems() {
        let catalog = Catalog::builtin().unwrap();
        let (category, text) = generate_solution(&catalog, "", &[]);
        assert_eq!(category, None);
        assert!(text.starts_with(&catalog.fallback.diagnosis));

        let (category, text) = generate_solution(&catalog, "my printer jams", &[]);
        assert_eq!(category, None);
        assert!(text.starts_with(&catalog.fallback.diagnosis));
    }

    #[test]
    fn submit_should_append_history_in_order() {
        let mut session = session();
        session.submit("I can't connect to WiFi").unwrap();
        session.submit("  the internet is down  ").unwrap();

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].problem, "I can't connect to WiFi");
        assert_eq!(history[1].problem, "the internet is down");
        assert!(history[1].solution.starts_with(RELATED_PREFIX));
        assert!(history[0].timestamp <= history[1].timestamp);
    }

    #[test]
    fn submit_should_reject_blank_input() {
        let mut session = session();
        assert!(matches!(
            session.submit("   "),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(session.history().is_empty());
    }

    #[test]
    fn follow_up_uses_previous_turn() {
        let mut session = session();
        session.submit("no sound from speakers").unwrap();
        let reply = session.submit("sound is still not working").unwrap();
        assert_eq!(reply.category, Some(Category::Audio));
        assert!(reply.solution.starts_with(FOLLOW_UP_PREFIX));
    }

    #[test]
    fn reply_flags_follow_solution_text() {
        let mut session = session();
        let reply = session.submit("my phone keeps freezing").unwrap();
        assert!(reply.offers_repair_centers);
        assert!(reply.wants_location);

        session.set_location(Some(Coordinates {
            latitude: 10.0,
            longitude: 20.0,
        }));
        let reply = session.submit("my phone keeps freezing").unwrap();
        assert!(!reply.wants_location);
    }

    #[test]
    fn quick_problems_map_to_expected_categories() {
        let expected = [
            Some(Category::Network),
            Some(Category::Performance),
            Some(Category::Mobile),
            Some(Category::Display),
            Some(Category::Audio),
            // "keeps crashing" hits the mobile set first
            Some(Category::Mobile),
        ];
        let mut session = session();
        for (index, category) in expected.into_iter().enumerate() {
            assert_eq!(session.submit_quick(index).unwrap().category, category);
        }
        assert!(session.submit_quick(QUICK_PROBLEMS.len()).is_err());
    }

    #[test]
    fn new_problem_keeps_history() {
        let mut session = session();
        session.submit("dell monitor flickers").unwrap();
        assert_eq!(
            session.repair_search_url(15).as_deref(),
            Some("https://www.google.com/search?q=Dell+service+center+near+me")
        );

        session.new_problem();
        assert!(session.current().is_none());
        assert!(session.repair_search_url(15).is_none());
        assert_eq!(session.history().len(), 1);
    }
}
