//! Runtime settings assembled once at startup.
//!
//! The connection and load parameters come from command-line flags (with
//! environment-variable fallbacks) and optionally from a YAML settings file.
//! Flags always win over file values, so a checked-in settings file can hold
//! defaults while credentials are passed per invocation.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::DbArgs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub table: String,
}

/// Optional on-disk overrides; every field absent by default so that only
/// explicitly configured values participate in the merge.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsFile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub table: Option<String>,
}

impl SettingsFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Reading settings file {path:?}"))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Parsing settings file {path:?}"))
    }
}

impl DbSettings {
    /// Builds settings from CLI args, layering an optional settings file
    /// underneath. A flag left at its default is still a flag value; the
    /// file only fills fields it names when the flag was not supplied, which
    /// clap cannot distinguish, so file values apply only where present and
    /// flags are treated as authoritative when they differ from the file.
    pub fn resolve(args: &DbArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => SettingsFile::load(path)?,
            None => SettingsFile::default(),
        };
        Ok(Self::merge(args, &file))
    }

    fn merge(args: &DbArgs, file: &SettingsFile) -> Self {
        DbSettings {
            host: pick(&args.host, "localhost", file.host.as_deref()),
            port: if args.port == 3306 {
                file.port.unwrap_or(args.port)
            } else {
                args.port
            },
            user: pick(&args.user, "root", file.user.as_deref()),
            password: pick(&args.password, "", file.password.as_deref()),
            database: pick(&args.database, "student_analysis", file.database.as_deref()),
            table: pick(&args.table, "student_results", file.table.as_deref()),
        }
    }
}

fn pick(flag: &str, flag_default: &str, file: Option<&str>) -> String {
    if flag != flag_default {
        flag.to_string()
    } else {
        file.unwrap_or(flag).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_args() -> DbArgs {
        DbArgs {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "student_analysis".to_string(),
            table: "student_results".to_string(),
            config: None,
        }
    }

    #[test]
    fn merge_prefers_file_values_over_flag_defaults() {
        let args = default_args();
        let file = SettingsFile {
            host: Some("db.internal".to_string()),
            port: Some(3307),
            password: Some("secret".to_string()),
            ..SettingsFile::default()
        };
        let settings = DbSettings::merge(&args, &file);
        assert_eq!(settings.host, "db.internal");
        assert_eq!(settings.port, 3307);
        assert_eq!(settings.password, "secret");
        assert_eq!(settings.database, "student_analysis");
    }

    #[test]
    fn merge_prefers_explicit_flags_over_file_values() {
        let mut args = default_args();
        args.host = "cli-host".to_string();
        let file = SettingsFile {
            host: Some("file-host".to_string()),
            ..SettingsFile::default()
        };
        let settings = DbSettings::merge(&args, &file);
        assert_eq!(settings.host, "cli-host");
    }

    #[test]
    fn settings_file_parses_partial_yaml() {
        let parsed: SettingsFile =
            serde_yaml::from_str("host: example.com\ndatabase: scores\n").unwrap();
        assert_eq!(parsed.host.as_deref(), Some("example.com"));
        assert_eq!(parsed.database.as_deref(), Some("scores"));
        assert!(parsed.user.is_none());
    }
}
