use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::{storage, usage};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Discord webhook receiving every notification.
    pub webhook_url: String,
    pub name: String,
    pub port: u16,
    pub bind_ip: String,
    /// Labels messages as coming from a production deployment.
    pub production: bool,
    /// Forward every runtime event; when off only the periodic digest is sent.
    pub full_notifications: bool,
    pub report_interval_secs: u64,
    /// Resubscriptions after the event stream closes. Zero disables them.
    pub stream_reconnect_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_command: Option<String>,
    pub usage_command: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            name: "Docker Event Monitor".into(),
            port: 54321,
            bind_ip: "0.0.0.0".into(),
            production: false,
            full_notifications: true,
            report_interval_secs: 60 * 60,
            stream_reconnect_attempts: 0,
            storage_command: None,
            usage_command: usage::DEFAULT_COMMAND.into(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("docknotify.toml"))
            .merge(Json::file("docknotify.json"))
            .merge(Env::prefixed("DOCKNOTIFY_"))
            // Variable names used by earlier deployments
            .merge(Env::raw().only(&["NAME", "PORT"]))
            .merge(
                Env::raw()
                    .only(&["DISCORD_WEBHOOK_URL"])
                    .map(|_| "webhook_url".into()),
            );
        let node_env = std::env::var("NODE_ENV").ok();
        Self::from_figment(with_node_env(figment, node_env.as_deref()))
    }

    fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: Config = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        if config.webhook_url.trim().is_empty() {
            anyhow::bail!("DISCORD_WEBHOOK_URL is not set");
        }
        if config.report_interval_secs == 0 {
            anyhow::bail!("report_interval_secs must be greater than zero");
        }
        Ok(config)
    }

    pub fn health_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.bind_ip, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind_ip: {}", e))
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn storage_command(&self) -> &str {
        self.storage_command
            .as_deref()
            .unwrap_or(storage::default_command())
    }
}

/// `NODE_ENV=production` switches on the production label.
fn with_node_env(figment: Figment, node_env: Option<&str>) -> Figment {
    match node_env {
        Some("production") => figment.merge(Serialized::default("production", true)),
        _ => figment,
    }
}
