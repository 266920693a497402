//! Import profile: parsing, normalization, and loading.
//!
//! An optional TOML file tunes an import run:
//! - `source_url` overrides the default remote CSV
//! - `max_error_rate` is the share of rejected rows tolerated before the CLI fails
//! - `timeout_secs` bounds the remote download
//! - `[countries.XX] name = "..."` supplies display names for countries the
//!   resolver creates (otherwise a new country is named after its code)
//!
//! Key behaviors:
//! - Normalization trims and uppercases country codes, trims names, and
//!   rejects codes that are not two ASCII letters or that collide after
//!   normalization.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_profile_str`]
//! - Parse + normalize from a file path: [`load_profile_path`]

use std::time::Duration;

use anyhow::{Context, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Share of rejected rows tolerated when the profile does not say otherwise.
pub const DEFAULT_MAX_ERROR_RATE: f64 = 0.10;

/// Remote download timeout when the profile does not say otherwise.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for one import run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImportProfile {
    /// Remote CSV to fetch when no file is given.
    pub source_url: Option<String>,
    /// Allowed `errors / rows_seen` in [0, 1].
    pub max_error_rate: Option<f64>,
    /// Download timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Supplementary country names keyed by ISO alpha-2 code.
    ///
    /// Codes are normalized (trimmed, uppercase) by [`normalize_profile`].
    #[serde(default)]
    pub countries: IndexMap<String, CountryCfg>,
}

/// Per-country settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CountryCfg {
    /// Display name used when the country is first created.
    pub name: String,
}

impl ImportProfile {
    /// Error-rate threshold, falling back to [`DEFAULT_MAX_ERROR_RATE`].
    pub fn max_error_rate(&self) -> f64 {
        self.max_error_rate.unwrap_or(DEFAULT_MAX_ERROR_RATE)
    }

    /// Download timeout, falling back to [`DEFAULT_TIMEOUT_SECS`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// `(code, name)` pairs for the resolver's country name table.
    pub fn country_names(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.countries
            .iter()
            .map(|(code, cfg)| (code.clone(), cfg.name.clone()))
    }
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Country keys that changed when trimming/uppercasing.
    pub countries_renamed: usize,
    /// Country names that had surrounding whitespace.
    pub names_trimmed: usize,
}

/// True for exactly two ASCII uppercase letters.
pub fn is_country_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// Normalize a profile in place.
///
/// Errors:
/// - Country codes that are not two letters, or duplicate after normalization
/// - Empty country names after trimming
/// - `max_error_rate` outside [0, 1]
pub fn normalize_profile(profile: &mut ImportProfile) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    let mut rebuilt: IndexMap<String, CountryCfg> = IndexMap::new();
    for (raw_code, mut cfg) in std::mem::take(&mut profile.countries) {
        let code = raw_code.trim().to_uppercase();
        if !is_country_code(&code) {
            bail!("invalid country code '{raw_code}' (expected two letters)");
        }
        if code != raw_code {
            report.countries_renamed += 1;
        }
        if rebuilt.contains_key(&code) {
            bail!("duplicate country code after normalization: {code}");
        }

        let name = cfg.name.trim();
        if name.is_empty() {
            bail!("country {code} has an empty name");
        }
        if name.len() != cfg.name.len() {
            report.names_trimmed += 1;
            cfg.name = name.to_string();
        }
        rebuilt.insert(code, cfg);
    }
    profile.countries = rebuilt;

    if let Some(rate) = profile.max_error_rate {
        if !(0.0..=1.0).contains(&rate) {
            bail!("max_error_rate must be within [0, 1], got {rate}");
        }
    }

    profile.source_url = profile
        .source_url
        .take()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    Ok(report)
}

/// Parse and normalize a profile from a TOML string.
pub fn load_profile_str(toml_str: &str) -> anyhow::Result<ImportProfile> {
    let mut profile: ImportProfile =
        toml::from_str(toml_str).context("failed to parse import profile TOML")?;
    let report = normalize_profile(&mut profile).context("normalize_profile failed")?;
    tracing::debug!(?report, "import profile normalized");
    Ok(profile)
}

/// Read a profile TOML file from disk, parse, and normalize it.
pub fn load_profile_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<ImportProfile> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read import profile {}", path.as_ref().display()))?;
    load_profile_str(&text)
}
