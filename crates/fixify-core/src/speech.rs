use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex_lite::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SpeechConfig;
use crate::error::{CoreError, Result};

/// Emoji used by the solution format and the built-in scripts. Stripped before
/// vocalizing, along with the emoji presentation selector.
const KNOWN_EMOJI: &[char] = &[
    '📱', '🔧', '⚠', '💾', '🔄', '🔊', '🎵', '🖥', '🎧', '🧹', '📍', '📶', '🚀', '⬆', '🔍',
    '💡', '👀', '🔗', '📚', '😊', '🔌', '🎨', '💻', '\u{FE0F}',
];

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Espeak defaults that the configured multipliers scale.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const BASE_PITCH: f32 = 50.0;
const MAX_AMPLITUDE: f32 = 200.0;

/// Turn solution text into something a speech engine can read.
///
/// Drops known emoji, rewrites `[Title](url)` links to `Title`, and squeezes
/// whitespace. Line breaks are kept as pauses; blank lines are removed.
pub fn sanitize(text: &str) -> String {
    let without_links = match Regex::new(r"\[([^\]]*)\]\([^)]*\)") {
        Ok(re) => re.replace_all(text, "$1").into_owned(),
        Err(_) => text.to_string(),
    };

    without_links
        .lines()
        .map(|line| {
            line.chars()
                .filter(|c| !KNOWN_EMOJI.contains(c))
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A voice reported by a speech engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub language: String,
}

/// Pick a voice by preference fragment, trying fragments in order. A fragment
/// matches a language code prefix before it matches part of a voice name.
pub fn pick_voice<'a>(voices: &'a [Voice], preferred: &[String]) -> Option<&'a Voice> {
    preferred.iter().find_map(|fragment| {
        let fragment = fragment.as_str();
        voices
            .iter()
            .find(|v| v.language.starts_with(fragment))
            .or_else(|| voices.iter().find(|v| v.name.contains(fragment)))
    })
}

/// Trait for text-to-speech engines.
#[async_trait]
pub trait SpeechBackend: Send + Sync + 'static {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Check if the engine is available on the current system.
    async fn probe(&self) -> bool;

    /// Begin speaking `text`. Returns once the utterance has started.
    async fn start(&self, text: &str) -> Result<()>;

    /// Cancel the current utterance, if any.
    async fn stop(&self) -> Result<()>;

    async fn is_active(&self) -> bool;

    /// Wait for the current utterance to finish.
    async fn wait(&self) -> Result<()>;
}

/// Speaks through an espeak-compatible command (`espeak-ng`, `espeak`).
pub struct EspeakBackend {
    command: String,
    config: SpeechConfig,
    child: Mutex<Option<Child>>,
}

impl EspeakBackend {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            command: config.command.clone(),
            config: config.clone(),
            child: Mutex::new(None),
        }
    }

    fn program(&self) -> Result<PathBuf> {
        which::which(&self.command).map_err(|_| {
            CoreError::Speech(format!(
                "speech synthesis not supported: '{}' not found in PATH",
                self.command
            ))
        })
    }

    async fn list_voices(&self, program: &Path) -> Vec<Voice> {
        let output = match Command::new(program).arg("--voices").output().await {
            Ok(o) if o.status.success() => o,
            _ => return Vec::new(),
        };
        parse_voice_list(&String::from_utf8_lossy(&output.stdout))
    }

    fn engine_args(&self, voice: Option<&Voice>) -> Vec<String> {
        let rate = (BASE_WORDS_PER_MINUTE * self.config.rate).round() as u32;
        let pitch = (BASE_PITCH * self.config.pitch).round().clamp(0.0, 99.0) as u32;
        let amplitude = (MAX_AMPLITUDE * self.config.volume).round().clamp(0.0, MAX_AMPLITUDE) as u32;

        let mut args = vec![
            "-s".to_string(),
            rate.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
        ];
        if let Some(v) = voice {
            args.push("-v".to_string());
            args.push(v.language.clone());
        }
        args.push("--stdin".to_string());
        args
    }
}

/// Parse `espeak-ng --voices` output.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US
/// ```
fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            Some(Voice {
                language: fields[1].to_string(),
                name: fields[3].to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl SpeechBackend for EspeakBackend {
    fn name(&self) -> &'static str {
        "espeak"
    }

    async fn probe(&self) -> bool {
        self.program().is_ok()
    }

    async fn start(&self, text: &str) -> Result<()> {
        let program = self.program()?;
        let voices = self.list_voices(&program).await;
        let voice = pick_voice(&voices, &self.config.preferred_voices);
        debug!(voice = ?voice, "selected speech voice");

        let mut child = Command::new(&program)
            .args(self.engine_args(voice))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoreError::Speech(format!("failed to spawn {}: {e}", self.command)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| CoreError::Speech(format!("failed to send text: {e}")))?;
        }

        *self.child.lock().await = Some(child);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Some(mut child) = self.child.lock().await.take() {
            // Already-exited children report an error here; nothing to cancel then.
            if let Err(e) = child.kill().await {
                debug!(error = %e, "speech process already finished");
            }
        }
        Ok(())
    }

    async fn is_active(&self) -> bool {
        let mut guard = self.child.lock().await;
        let running = match guard.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        };
        if !running {
            guard.take();
        }
        running
    }

    async fn wait(&self) -> Result<()> {
        loop {
            {
                let mut guard = self.child.lock().await;
                let Some(child) = guard.as_mut() else {
                    return Ok(());
                };
                if let Some(status) = child.try_wait()? {
                    guard.take();
                    if status.success() {
                        return Ok(());
                    }
                    return Err(CoreError::Speech(format!(
                        "{} exited with {status}",
                        self.command
                    )));
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Reads solutions aloud, keeping at most one utterance active.
pub struct Narrator {
    backend: Box<dyn SpeechBackend>,
}

impl Narrator {
    pub fn new(backend: Box<dyn SpeechBackend>) -> Self {
        Self { backend }
    }

    pub fn from_config(config: &SpeechConfig) -> Result<Self> {
        if !config.enabled {
            return Err(CoreError::Speech("speech is disabled in config".to_string()));
        }
        Ok(Self::new(Box::new(EspeakBackend::new(config))))
    }

    /// Cancel whatever is being read and start reading `text`.
    pub async fn speak(&self, text: &str) -> Result<()> {
        self.backend.stop().await?;

        let spoken = sanitize(text);
        if spoken.is_empty() {
            return Ok(());
        }

        if !self.backend.probe().await {
            return Err(CoreError::Speech(format!(
                "speech synthesis not supported: {} engine unavailable",
                self.backend.name()
            )));
        }

        info!(backend = self.backend.name(), chars = spoken.len(), "reading solution aloud");
        self.backend.start(&spoken).await
    }

    /// Like [`Narrator::speak`], then watches the utterance in a background task
    /// and hands an engine failure (such as a non-zero exit) to `on_failure`.
    pub async fn speak_reported<F>(
        self: &Arc<Self>,
        text: &str,
        on_failure: F,
    ) -> Result<JoinHandle<()>>
    where
        F: FnOnce(CoreError) + Send + 'static,
    {
        self.speak(text).await?;
        let narrator = Arc::clone(self);
        Ok(tokio::spawn(async move {
            if let Err(e) = narrator.wait().await {
                warn!(backend = narrator.backend.name(), error = %e, "speech engine failed");
                on_failure(e);
            }
        }))
    }

    pub async fn stop(&self) -> Result<()> {
        self.backend.stop().await
    }

    pub async fn is_speaking(&self) -> bool {
        self.backend.is_active().await
    }

    pub async fn wait(&self) -> Result<()> {
        self.backend.wait().await
    }
}
