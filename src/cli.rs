//! Command-line interface for Lorekeeper
//!
//! Provides argument parsing and subcommand handling for the binary.

use clap::{Parser, Subcommand};

/// Universe-aware chat service for fictional world building
#[derive(Parser)]
#[command(name = "lorekeeper")]
#[command(version)]
#[command(about = "Universe-aware chat service for fictional world building")]
#[command(
    long_about = "Lorekeeper serves two chat endpoints: one that answers questions using \
    everything stored about a universe, and one that writes encyclopedic answers from \
    caller-supplied context."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Lorekeeper Configuration
# =========================
#
# API keys are never stored here. Each section names the environment
# variable that holds its key; the server reads them once at startup.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"
port = 3000

# ─────────────────────────────────────────────────────────────────────────────
# UNIVERSE DATABASE (PostgREST)
# ─────────────────────────────────────────────────────────────────────────────

[store]
# Project URL; lookups go to <url>/rest/v1/<table>
url = "https://your-project.supabase.co"
# Environment variable holding the service key
api_key_env = "SUPABASE_SERVICE_ROLE_KEY"

# ─────────────────────────────────────────────────────────────────────────────
# UNIVERSE CHAT (POST /universe-chat)
# ─────────────────────────────────────────────────────────────────────────────

[universe_chat]
# OpenAI-compatible base URL; /chat/completions is appended
base_url = "https://ai.gateway.lovable.dev/v1"
model = "google/gemini-2.5-flash"
api_key_env = "LOVABLE_API_KEY"
# Returned when the gateway answers without a choice
fallback_reply = "I'm sorry, I couldn't generate a response."

# ─────────────────────────────────────────────────────────────────────────────
# LORE ASSISTANT (POST /lore-assistant)
# ─────────────────────────────────────────────────────────────────────────────

[lore_assistant]
base_url = "https://api.openai.com/v1"
model = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"
# Sampling temperature (0.0-2.0)
temperature = 0.7
# Output length cap
max_tokens = 1000

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
