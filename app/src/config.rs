//! Desk configuration.
//!
//! Read from a TOML file (`--config`, `SUPPORT_DESK_CONFIG`, or the platform
//! config directory). A missing file yields defaults. SMTP settings can be
//! overridden from the environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use support_desk_core::models::AdminContext;
use support_desk_core::notify::SmtpSettings;

pub const CONFIG_ENV: &str = "SUPPORT_DESK_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SmtpConfig>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_dir: None,
            log_level: default_log_level(),
            admin: AdminConfig::default(),
            smtp: None,
        }
    }
}

/// Identity used for replies sent from this machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_id")]
    pub id: i64,
    #[serde(default = "default_admin_name")]
    pub name: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
}

fn default_admin_id() -> i64 {
    1
}

fn default_admin_name() -> String {
    "Support Admin".to_string()
}

fn default_admin_email() -> String {
    "support@freereminders.net".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            id: default_admin_id(),
            name: default_admin_name(),
            email: default_admin_email(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_admin_email")]
    pub from: String,
}

fn default_smtp_port() -> u16 {
    25
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .finish()
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("net", "FreeReminders", "support-desk")
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

impl DeskConfig {
    /// Loads configuration, then applies `SMTP_*` environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(default_config_path);
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SMTP_HOST") {
            let smtp = self.smtp.get_or_insert_with(|| SmtpConfig {
                host: host.clone(),
                port: default_smtp_port(),
                username: None,
                password: None,
                from: self.admin.email.clone(),
            });
            smtp.host = host;
        }
        if let Some(smtp) = self.smtp.as_mut() {
            if let Some(user) = lookup("SMTP_USER") {
                smtp.username = Some(user);
            }
            if let Some(pass) = lookup("SMTP_PASS") {
                smtp.password = Some(pass);
            }
            if let Some(from) = lookup("SMTP_FROM") {
                smtp.from = from;
            }
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| data_dir().join("support.sqlite"))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("logs"))
    }

    pub fn admin_context(&self) -> AdminContext {
        AdminContext {
            admin_id: self.admin.id,
            name: self.admin.name.clone(),
            email: self.admin.email.clone(),
            is_admin: true,
        }
    }

    pub fn smtp_settings(&self) -> Option<SmtpSettings> {
        self.smtp.as_ref().map(|smtp| SmtpSettings {
            host: smtp.host.clone(),
            port: smtp.port,
            username: smtp.username.clone(),
            password: smtp.password.clone(),
            from: smtp.from.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        let config = DeskConfig::from_toml("").expect("parse");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.admin.name, "Support Admin");
        assert_eq!(config.admin.email, "support@freereminders.net");
        assert!(config.smtp.is_none());
    }

    #[test]
    fn full_file_parses() {
        let config = DeskConfig::from_toml(
            r#"
            database_path = "/srv/desk/support.sqlite"
            log_level = "debug"

            [admin]
            id = 9
            name = "Robin"
            email = "robin@freereminders.net"

            [smtp]
            host = "mail.internal"
            port = 2525
            username = "desk"
            password = "s3cret"
            "#,
        )
        .expect("parse");
        assert_eq!(config.database_path(), PathBuf::from("/srv/desk/support.sqlite"));
        let ctx = config.admin_context();
        assert_eq!(ctx.admin_id, 9);
        assert!(ctx.is_admin);
        let smtp = config.smtp_settings().expect("smtp");
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.from, "support@freereminders.net");
        assert!(!format!("{:?}", config).contains("s3cret"));
    }

    #[test]
    fn env_overrides_smtp() {
        let env: HashMap<&str, &str> = [
            ("SMTP_HOST", "relay.example.com"),
            ("SMTP_USER", "mailer"),
            ("SMTP_PASS", "pw"),
            ("SMTP_FROM", "help@freereminders.net"),
        ]
        .into_iter()
        .collect();
        let mut config = DeskConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        let smtp = config.smtp.expect("smtp");
        assert_eq!(smtp.host, "relay.example.com");
        assert_eq!(smtp.port, 25);
        assert_eq!(smtp.username.as_deref(), Some("mailer"));
        assert_eq!(smtp.from, "help@freereminders.net");
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().expect("temp");
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = \"warn\"\n").expect("write");
        let config = DeskConfig::load(Some(&path)).expect("load");
        assert_eq!(config.log_level, "warn");
    }
}
