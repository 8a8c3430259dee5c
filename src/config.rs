//! Application configuration.
//!
//! Layered the usual way: built-in defaults, then an optional YAML file
//! (`--config` / `CONFIG_FILE`, falling back to `./config.yaml`), then
//! `WIDGET_`-prefixed environment variables (`WIDGET_SERVER__PORT=8000`),
//! then explicit CLI flags.

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Chat endpoint URL the widget posts messages to
    #[arg(long, env = "CHAT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Assistant display name used in the greeting
    #[arg(long, env = "AGENT_NAME")]
    pub assistant_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Remote endpoint replies come from.
    pub endpoint: String,
    /// Name interpolated into the canned greeting.
    pub assistant_name: String,
    /// Preset messages offered as one-click prompts.
    pub quick_prompts: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("chat.endpoint", "http://127.0.0.1:5000/api/chat")?
            .set_default("chat.assistant_name", "Kikibot")?
            .set_default(
                "chat.quick_prompts",
                vec![
                    "I was charged twice on my invoice.",
                    "I can't sign in to my account.",
                    "Tell me about the Pro plan.",
                ],
            )?;

        // File source: explicit path wins, otherwise ./config.* if present.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // Prefixed environment variables, e.g. WIDGET_SERVER__PORT=8000.
        builder = builder.add_source(
            Environment::with_prefix("WIDGET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // CLI flags (and their env fallbacks handled by clap) override all.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(endpoint) = &cli.endpoint {
            builder = builder.set_override("chat.endpoint", endpoint.clone())?;
        }
        if let Some(name) = &cli.assistant_name {
            builder = builder.set_override("chat.assistant_name", name.clone())?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
