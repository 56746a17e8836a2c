use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::models::ScoringPoints;
use crate::services::{DirectoryPolicy, DirectoryTables};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    #[serde(default)]
    pub directory: DirectorySettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Rest,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectorySettings {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    #[serde(default = "default_true")]
    pub strict_zip: bool,
    #[serde(default = "default_true")]
    pub accepting_only: bool,
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default)]
    pub tables: TableSettings,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            strict_zip: true,
            accepting_only: true,
            candidate_multiplier: default_candidate_multiplier(),
            max_candidates: default_max_candidates(),
            tables: TableSettings::default(),
        }
    }
}

impl DirectorySettings {
    pub fn policy(&self) -> DirectoryPolicy {
        DirectoryPolicy {
            strict_zip: self.strict_zip,
            accepting_only: self.accepting_only,
            candidate_multiplier: self.candidate_multiplier,
            max_candidates: self.max_candidates,
        }
    }
}

fn default_backend() -> BackendKind { BackendKind::Rest }
fn default_true() -> bool { true }
fn default_candidate_multiplier() -> usize { 5 }
fn default_max_candidates() -> usize { 500 }

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    #[serde(default = "default_chiropractors_table")]
    pub chiropractors: String,
    #[serde(default = "default_profiles_table")]
    pub profiles: String,
    #[serde(default = "default_organizations_table")]
    pub organizations: String,
    #[serde(default = "default_modalities_table")]
    pub modalities: String,
    #[serde(default = "default_focus_areas_table")]
    pub focus_areas: String,
    #[serde(default = "default_payment_models_table")]
    pub payment_models: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            chiropractors: default_chiropractors_table(),
            profiles: default_profiles_table(),
            organizations: default_organizations_table(),
            modalities: default_modalities_table(),
            focus_areas: default_focus_areas_table(),
            payment_models: default_payment_models_table(),
        }
    }
}

impl From<&TableSettings> for DirectoryTables {
    fn from(tables: &TableSettings) -> Self {
        DirectoryTables {
            chiropractors: tables.chiropractors.clone(),
            profiles: tables.profiles.clone(),
            organizations: tables.organizations.clone(),
            modalities: tables.modalities.clone(),
            focus_areas: tables.focus_areas.clone(),
            payment_models: tables.payment_models.clone(),
        }
    }
}

fn default_chiropractors_table() -> String { "chiropractors".to_string() }
fn default_profiles_table() -> String { "profiles".to_string() }
fn default_organizations_table() -> String { "organizations".to_string() }
fn default_modalities_table() -> String { "modalities".to_string() }
fn default_focus_areas_table() -> String { "focus_areas".to_string() }
fn default_payment_models_table() -> String { "payment_models".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: None,
            ttl_secs: None,
            l1_cache_size: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_limit() -> u16 { 20 }
fn default_max_limit() -> u16 { 100 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub points: PointsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointsConfig {
    #[serde(default = "default_base_points")]
    pub base: f64,
    #[serde(default = "default_location_exact_points")]
    pub location_exact: f64,
    #[serde(default = "default_location_partial_points")]
    pub location_partial: f64,
    #[serde(default = "default_modality_points")]
    pub modalities: f64,
    #[serde(default = "default_focus_area_points")]
    pub focus_areas: f64,
    #[serde(default = "default_business_model_exact_points")]
    pub business_model_exact: f64,
    #[serde(default = "default_business_model_partial_points")]
    pub business_model_partial: f64,
    #[serde(default = "default_insurance_points")]
    pub insurance: f64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            base: default_base_points(),
            location_exact: default_location_exact_points(),
            location_partial: default_location_partial_points(),
            modalities: default_modality_points(),
            focus_areas: default_focus_area_points(),
            business_model_exact: default_business_model_exact_points(),
            business_model_partial: default_business_model_partial_points(),
            insurance: default_insurance_points(),
        }
    }
}

impl From<&PointsConfig> for ScoringPoints {
    fn from(points: &PointsConfig) -> Self {
        ScoringPoints {
            base: points.base,
            location_exact: points.location_exact,
            location_partial: points.location_partial,
            modalities: points.modalities,
            focus_areas: points.focus_areas,
            business_model_exact: points.business_model_exact,
            business_model_partial: points.business_model_partial,
            insurance: points.insurance,
        }
    }
}

impl PointsConfig {
    /// Point values must be finite and non-negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("base", self.base),
            ("location_exact", self.location_exact),
            ("location_partial", self.location_partial),
            ("modalities", self.modalities),
            ("focus_areas", self.focus_areas),
            ("business_model_exact", self.business_model_exact),
            ("business_model_partial", self.business_model_partial),
            ("insurance", self.insurance),
        ];

        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Message(format!(
                    "scoring.points.{} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

fn default_base_points() -> f64 { 10.0 }
fn default_location_exact_points() -> f64 { 20.0 }
fn default_location_partial_points() -> f64 { 10.0 }
fn default_modality_points() -> f64 { 30.0 }
fn default_focus_area_points() -> f64 { 20.0 }
fn default_business_model_exact_points() -> f64 { 20.0 }
fn default_business_model_partial_points() -> f64 { 10.0 }
fn default_insurance_points() -> f64 { 10.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with FMC__)
    /// 5. Conventional SUPABASE_URL / SUPABASE_KEY / DATABASE_URL / REDIS_URL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., FMC__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("FMC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = apply_conventional_env(settings)?.try_deserialize()?;
        settings.scoring.points.validate()?;

        Ok(settings)
    }
}

/// Overlay the variable names Supabase tooling and hosting platforms set
fn apply_conventional_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("supabase.url", env::var("SUPABASE_URL").or_else(|_| env::var("NEXT_PUBLIC_SUPABASE_URL"))),
        (
            "supabase.api_key",
            env::var("SUPABASE_KEY").or_else(|_| env::var("NEXT_PUBLIC_SUPABASE_ANON_KEY")),
        ),
        ("database.url", env::var("DATABASE_URL")),
        ("cache.redis_url", env::var("REDIS_URL")),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (key, value) in overrides {
        if let Ok(value) = value {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
