//! Oracle scenario configuration.
//!
//! Defaults reproduce the reference scenario (20 players, scores from 100,
//! 1 s settle window, 100/50/10 yen billing). A YAML file may override any
//! field; `RANKCHECK_PLAYER_COUNT` and `RANKCHECK_SETTLE_MS` override the file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::naming::{is_valid_tenant_name, run_tenant_name};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid environment override {key}={value}")]
    Env { key: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-category yen charged for one player in one finished competition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BillingRates {
    /// Submitted a score and viewed the ranking.
    pub scored_and_viewed_yen: i64,
    /// Submitted a score, never viewed the ranking.
    pub scored_only_yen: i64,
    /// Viewed the ranking without a score.
    pub viewed_only_yen: i64,
}

impl Default for BillingRates {
    fn default() -> Self {
        Self {
            scored_and_viewed_yen: 100,
            scored_only_yen: 50,
            viewed_only_yen: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Players created per run. The second-to-last is disqualified and the
    /// last never receives a score.
    pub player_count: usize,
    pub tenant_name_prefix: String,
    pub tenant_display_name_prefix: String,
    /// A name the platform must reject for its format.
    pub invalid_tenant_name: String,
    pub player_display_name_prefix: String,
    pub competition_title: String,
    /// Score of the first roster player; each next player scores one more.
    pub score_base: i64,
    /// Roster offset whose profile is fetched; must be below the
    /// disqualified player's offset.
    pub profile_player_index: usize,
    /// Maximum rows per ranking page.
    pub ranking_page_limit: usize,
    pub settle_window_ms: u64,
    /// Upload a superseded result set first to prove uploads replace.
    pub verify_resubmission: bool,
    pub billing: BillingRates,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            player_count: 20,
            tenant_name_prefix: "valid-tenantid".to_string(),
            tenant_display_name_prefix: "valid-Tenantname".to_string(),
            invalid_tenant_name: "INVALID_TENANTID".to_string(),
            player_display_name_prefix: "validate_player".to_string(),
            competition_title: "validate_competition".to_string(),
            score_base: 100,
            profile_player_index: 10,
            ranking_page_limit: 100,
            settle_window_ms: 1000,
            verify_resubmission: true,
            billing: BillingRates::default(),
        }
    }
}

impl OracleConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RANKCHECK_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("RANKCHECK_PLAYER_COUNT") {
            self.player_count = value.parse().map_err(|_| ConfigError::Env {
                key: "RANKCHECK_PLAYER_COUNT",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("RANKCHECK_SETTLE_MS") {
            self.settle_window_ms = value.parse().map_err(|_| ConfigError::Env {
                key: "RANKCHECK_SETTLE_MS",
                value: value.clone(),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_count < 4 {
            return Err(ConfigError::Invalid(format!(
                "player_count must be at least 4, got {}",
                self.player_count
            )));
        }
        if self.profile_player_index >= self.disqualified_index() {
            return Err(ConfigError::Invalid(format!(
                "profile_player_index {} must be below the disqualified index {}",
                self.profile_player_index,
                self.disqualified_index()
            )));
        }
        if self.ranking_page_limit == 0 {
            return Err(ConfigError::Invalid("ranking_page_limit must be positive".into()));
        }
        // Run numbers are appended, so check a representative derived name.
        if !is_valid_tenant_name(&run_tenant_name(&self.tenant_name_prefix, 1)) {
            return Err(ConfigError::Invalid(format!(
                "tenant_name_prefix {:?} does not yield valid tenant names",
                self.tenant_name_prefix
            )));
        }
        if is_valid_tenant_name(&self.invalid_tenant_name) {
            return Err(ConfigError::Invalid(format!(
                "invalid_tenant_name {:?} is actually a valid name",
                self.invalid_tenant_name
            )));
        }
        if self.competition_title.is_empty() {
            return Err(ConfigError::Invalid("competition_title must not be empty".into()));
        }
        Ok(())
    }

    /// Roster offset of the player that gets disqualified.
    pub fn disqualified_index(&self) -> usize {
        self.player_count - 2
    }

    /// Roster offset of the player that never receives a score.
    pub fn no_score_index(&self) -> usize {
        self.player_count - 1
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    pub fn player_display_names(&self) -> Vec<String> {
        (0..self.player_count)
            .map(|i| format!("{}{}", self.player_display_name_prefix, i))
            .collect()
    }
}
