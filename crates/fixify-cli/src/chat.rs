use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use fixify_core::config::AppConfig;
use fixify_core::location::{resolve_location, ConfiguredLocation, DeniedLocation, LocationProvider};
use fixify_core::parser::SolutionParser;
use fixify_core::session::QUICK_PROBLEMS;
use fixify_core::speech::Narrator;
use fixify_core::{Catalog, Reply, Session};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, warn};

use crate::render::render_solution;

const HELP: &str = "\
Describe your problem in plain words, or use a command:
  /new          start over with a new problem (history is kept)
  /history      list what you've asked so far
  /quick [N]    show the quick-help list, or ask quick problem N
  /speak        read the current solution aloud
  /stop         stop reading
  /repair       find a repair center for the current problem
  /help         show this help
  /quit         leave";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    New,
    History,
    /// Zero-based index into the quick-help list.
    Quick(Option<usize>),
    Speak,
    Stop,
    Repair,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command /{0}, type /help for the list")]
    Unknown(String),

    #[error("/{command} expects {expected}, got '{value}'")]
    InvalidArgument {
        command: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Parse a chat line. Lines not starting with `/` are problems and yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ChatCommand>, CommandError> {
    let Some(rest) = line.trim().strip_prefix('/') else {
        return Ok(None);
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();

    let command = match name.as_str() {
        "new" => ChatCommand::New,
        "history" => ChatCommand::History,
        "quick" => ChatCommand::Quick(arg.map(parse_quick_number).transpose()?),
        "speak" => ChatCommand::Speak,
        "stop" => ChatCommand::Stop,
        "repair" => ChatCommand::Repair,
        "help" => ChatCommand::Help,
        "quit" | "exit" => ChatCommand::Quit,
        _ => return Err(CommandError::Unknown(name)),
    };
    Ok(Some(command))
}

/// Quick problems are numbered from 1 on screen.
fn parse_quick_number(value: &str) -> Result<usize, CommandError> {
    match value.parse::<usize>() {
        Ok(n) if (1..=QUICK_PROBLEMS.len()).contains(&n) => Ok(n - 1),
        _ => Err(CommandError::InvalidArgument {
            command: "quick",
            expected: "a number from 1 to 6",
            value: value.to_string(),
        }),
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

pub fn quick_menu() -> String {
    let mut out = String::from("Quick help:\n");
    for (i, quick) in QUICK_PROBLEMS.iter().enumerate() {
        out.push_str(&format!("  {}. {} - \"{}\"\n", i + 1, quick.title, quick.problem));
    }
    out
}

/// Interactive conversation on stdin/stdout.
pub struct Chat {
    config: AppConfig,
    session: Session,
    parser: SolutionParser,
    narrator: Option<Arc<Narrator>>,
    asked_location: bool,
    lines: Lines<BufReader<Stdin>>,
}

impl Chat {
    pub fn new(config: AppConfig, catalog: Arc<Catalog>) -> anyhow::Result<Self> {
        let mut session = Session::new(catalog);
        let shared = resolve_location(&ConfiguredLocation::from_config(&config.location));
        let asked_location = shared.is_some();
        session.set_location(shared);

        let narrator = match Narrator::from_config(&config.speech) {
            Ok(n) => Some(Arc::new(n)),
            Err(e) => {
                debug!(error = %e, "narration unavailable");
                None
            }
        };

        Ok(Self {
            parser: SolutionParser::new()?,
            lines: BufReader::new(tokio::io::stdin()).lines(),
            config,
            session,
            narrator,
            asked_location,
        })
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        println!("Hi! I'm Fixify. Tell me what's going wrong with your device.");
        println!("{}", quick_menu());
        println!("Type /help for commands.");

        while let Some(line) = self.prompt("> ").await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_command(line) {
                Ok(Some(ChatCommand::Quit)) => break,
                Ok(Some(command)) => self.handle(command).await?,
                Ok(None) => {
                    let result = self.session.submit(line).map(Reply::clone);
                    self.show(result).await?;
                }
                Err(e) => println!("{e}"),
            }
        }

        if let Some(narrator) = &self.narrator {
            narrator.stop().await?;
        }
        println!("Bye! Hope your device behaves now.");
        Ok(())
    }

    async fn handle(&mut self, command: ChatCommand) -> anyhow::Result<()> {
        match command {
            ChatCommand::New => {
                self.session.new_problem();
                println!("Sure, what else can I help with?");
            }
            ChatCommand::History => {
                if self.session.history().is_empty() {
                    println!("Nothing asked yet.");
                }
                for (i, entry) in self.session.history().iter().enumerate() {
                    println!("{}. [{}] {}", i + 1, entry.timestamp.format("%H:%M"), entry.problem);
                }
            }
            ChatCommand::Quick(None) => println!("{}", quick_menu()),
            ChatCommand::Quick(Some(index)) => {
                let result = self.session.submit_quick(index).map(Reply::clone);
                self.show(result).await?;
            }
            ChatCommand::Speak => self.speak().await,
            ChatCommand::Stop => {
                if let Some(narrator) = &self.narrator {
                    narrator.stop().await?;
                }
            }
            ChatCommand::Repair => match self.session.repair_search_url(self.config.location.zoom) {
                Some(url) => println!("Repair centers: {url}"),
                None => println!("Ask about a problem first, then I can look for repair centers."),
            },
            ChatCommand::Help => println!("{HELP}"),
            ChatCommand::Quit => {}
        }
        Ok(())
    }

    async fn show(&mut self, result: fixify_core::Result<Reply>) -> anyhow::Result<()> {
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        };

        think(self.config.ui.thinking_delay_ms).await;
        let parsed = self.parser.parse(&reply.solution);
        println!("\n{}", render_solution(&parsed, self.config.ui.show_resources));

        if reply.wants_location && !self.asked_location {
            self.asked_location = true;
            let answer = self
                .prompt("Share your location so I can find service centers nearby? [y/N] ")
                .await?
                .unwrap_or_default();
            let provider: Box<dyn LocationProvider> = if is_affirmative(&answer) {
                Box::new(ConfiguredLocation::new(self.config.location.coordinates()))
            } else {
                Box::new(DeniedLocation)
            };
            let location = resolve_location(provider.as_ref());
            if location.is_none() && is_affirmative(&answer) {
                println!("No coordinates set in [location]; I'll search without them.");
            }
            self.session.set_location(location);
        }

        if reply.offers_repair_centers {
            println!("Type /repair to find a repair center, or /speak to hear these steps.");
        }
        Ok(())
    }

    async fn speak(&self) {
        let Some(narrator) = &self.narrator else {
            println!("Speech is turned off in your config.");
            return;
        };
        let Some(reply) = self.session.current() else {
            println!("Nothing to read yet.");
            return;
        };
        let started = narrator
            .speak_reported(&reply.solution, |e| println!("\n{}", speech_alert(&e)))
            .await;
        if let Err(e) = started {
            warn!(error = %e, "narration failed");
            println!("{}", speech_alert(&e));
        }
    }

    async fn prompt(&mut self, text: &str) -> anyhow::Result<Option<String>> {
        print!("{text}");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }
}

fn speech_alert(error: &fixify_core::CoreError) -> String {
    format!("⚠️ Couldn't read the steps aloud: {error}")
}

/// Optional pause before showing an answer.
pub async fn think(delay_ms: u64) {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
