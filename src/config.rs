//! Configuration loading and management.
//!
//! Loads bot configuration from `./sifter.toml` (or `$SIFTER_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::qualify::Thresholds;

// ── Top-level config ────────────────────────────────────────────

/// Top-level sifter configuration loaded from TOML.
///
/// Path: `./sifter.toml` or `$SIFTER_CONFIG_PATH`.
/// Env vars override file values; file values override defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SifterConfig {
    /// Bot identity and reply-mode settings (`[bot]`).
    pub bot: BotConfig,
    /// Outbound campaign settings (`[campaign]`).
    pub campaign: CampaignConfig,
    /// Qualification thresholds (`[thresholds]`).
    pub thresholds: Thresholds,
    /// Filesystem paths for persistent state (`[paths]`).
    pub paths: PathsConfig,
    /// WhatsApp bridge sidecar settings (`[bridge]`).
    pub bridge: BridgeConfig,
    /// Companion process settings (`[companion]`).
    pub companion: CompanionConfig,
    /// Admin HTTP surface settings (`[http]`).
    pub http: HttpConfig,
    /// LLM provider configuration (`[llm]`).
    pub llm: LlmConfig,
}

impl SifterConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$SIFTER_CONFIG_PATH` or `./sifter.toml`.
    /// If the file does not exist, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from TOML file only, no env overrides.
    fn load_from_file() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok());
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: SifterConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(SifterConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Resolve config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        match env("SIFTER_CONFIG_PATH") {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from("sifter.toml"),
        }
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("SIFTER_ADMIN_NUMBER") {
            self.bot.admin_number = v;
        }
        if let Some(v) = env("SIFTER_AI_MODE") {
            match v.parse() {
                Ok(b) => self.bot.ai_mode = b,
                Err(_) => tracing::warn!(
                    var = "SIFTER_AI_MODE",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("SIFTER_BRIDGE_URL") {
            self.bridge.base_url = v;
        }
        if let Some(v) = env("SIFTER_COMPANION_URL") {
            self.companion.base_url = v;
        }
        if let Some(v) = env("SIFTER_DB_PATH") {
            self.paths.db = v;
        }
        if let Some(v) = env("SIFTER_HTTP_BIND") {
            self.http.bind = v;
        }

        // Mistral (env var presence creates the provider).
        if let Some(key) = env("SIFTER_MISTRAL_API_KEY") {
            let model = env("SIFTER_MISTRAL_MODEL").unwrap_or_else(|| {
                self.llm
                    .mistral
                    .as_ref()
                    .map(|c| c.model.clone())
                    .unwrap_or_else(default_mistral_model)
            });
            self.llm.mistral = Some(MistralConfig {
                api_key: key,
                model,
            });
        }
    }

    /// Parse a TOML string into config (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid config TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: SifterConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

// ── Bot config ──────────────────────────────────────────────────

/// Bot identity and reply-mode settings (`[bot]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Phone number of the human admin who receives escalations.
    pub admin_number: String,
    /// When true, the LLM strategy replaces the scripted flow entirely.
    pub ai_mode: bool,
    /// System prompt for the LLM strategy.
    pub system_prompt: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            admin_number: String::new(),
            ai_mode: false,
            system_prompt: "You are a friendly recruiting assistant screening \
                            candidates for a job opening. Keep replies short."
                .to_string(),
        }
    }
}

// ── Campaign config ─────────────────────────────────────────────

/// Outbound campaign settings (`[campaign]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Opening messages sent to each seeded number, in order.
    pub initial_messages: Vec<String>,
    /// Maximum numbers processed in one seeding run.
    pub numbers_per_batch: usize,
    /// Pause between successive outbound sends, in milliseconds.
    pub message_delay_ms: u64,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            initial_messages: vec![
                "Hi, I got your number from a job portal.".to_string(),
                "I am messaging you regarding a job opening. Are you interested?".to_string(),
            ],
            numbers_per_batch: 50,
            message_delay_ms: 1000,
        }
    }
}

// ── Paths config ────────────────────────────────────────────────

/// Filesystem paths for persistent state (`[paths]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// SQLite database file (sessions, chat log, candidates).
    pub db: String,
    /// Directory for rotated JSON log files.
    pub logs_dir: String,
    /// Optional flow definition TOML; compiled-in default when absent.
    pub flow: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            db: "sifter.db".to_string(),
            logs_dir: "logs".to_string(),
            flow: None,
        }
    }
}

// ── Bridge config ───────────────────────────────────────────────

/// WhatsApp bridge sidecar settings (`[bridge]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the bridge HTTP API.
    pub base_url: String,
    /// Where to save the pairing QR code PNG when not yet linked.
    pub qr_path: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3001".to_string(),
            qr_path: "sifter-qr.png".to_string(),
        }
    }
}

// ── Companion config ────────────────────────────────────────────

/// Companion process settings (`[companion]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Base URL of the companion service (liveness probe target).
    pub base_url: String,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

// ── HTTP config ─────────────────────────────────────────────────

/// Admin HTTP surface settings (`[http]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Socket address the admin API listens on.
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

// ── LLM config ──────────────────────────────────────────────────

/// LLM provider configuration (`[llm]`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Mistral chat-completions provider; AI mode requires it.
    pub mistral: Option<MistralConfig>,
}

/// Mistral provider config (`[llm.mistral]`).
#[derive(Clone, Deserialize)]
pub struct MistralConfig {
    /// API key.
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_mistral_model")]
    pub model: String,
}

impl std::fmt::Debug for MistralConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralConfig")
            .field("api_key", &"__REDACTED__")
            .field("model", &self.model)
            .finish()
    }
}

fn default_mistral_model() -> String {
    "mistral-small-latest".to_string()
}

// ── Tests ───────────────────────────────────────────────────────
