use crate::application::checklist_service::DEFAULT_CHECKLIST_CONTEXTS;
use crate::application::input_session_service::DEFAULT_INPUT_SESSIONS;
use crate::domain::record::DEFAULT_HISTORY_CAPACITY;
use crate::domain::stress::RegressionModel;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub history: HistorySettings,
    pub sessions: SessionSettings,
    pub model: RegressionModel,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HistorySettings {
    pub capacity: usize,
    /// Directory for the JSON history files. In-memory history when unset.
    pub storage_dir: Option<PathBuf>,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            storage_dir: None,
        }
    }
}

/// Upper bounds on live per-client state.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionSettings {
    pub checklist_contexts: usize,
    pub input_sessions: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            checklist_contexts: DEFAULT_CHECKLIST_CONTEXTS,
            input_sessions: DEFAULT_INPUT_SESSIONS,
        }
    }
}

/// `config/insulation.*` if present, overridden by `INSULATION__SECTION__KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/insulation").required(false))
        .add_source(
            config::Environment::with_prefix("INSULATION")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    if config.history.capacity == 0 {
        anyhow::bail!("history.capacity must be at least 1");
    }
    if config.sessions.checklist_contexts == 0 || config.sessions.input_sessions == 0 {
        anyhow::bail!("sessions.checklist_contexts and sessions.input_sessions must be at least 1");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    #[test]
    fn test_defaults_when_empty() {
        let config: AppConfig = Config::builder().build().unwrap().try_deserialize().unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.history.capacity, 100);
        assert!(config.history.storage_dir.is_none());
        assert_eq!(config.sessions.checklist_contexts, 100);
        assert_eq!(config.sessions.input_sessions, 100);
        assert_eq!(config.model, RegressionModel::default());
    }

    #[test]
    fn test_partial_file_overrides() {
        let toml = r#"
            [history]
            capacity = 20
            storage_dir = "data"

            [sessions]
            checklist_contexts = 8

            [model]
            critical_temperature = 70.0
        "#;
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.history.capacity, 20);
        assert_eq!(config.history.storage_dir, Some(PathBuf::from("data")));
        assert_eq!(config.sessions.checklist_contexts, 8);
        assert_eq!(config.sessions.input_sessions, 100);
        assert_eq!(config.model.critical_temperature, 70.0);
        assert_eq!(config.model.a, 39.685);
        assert_eq!(config.server.addr, "0.0.0.0:8080");
    }
}
