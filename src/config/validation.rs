//! Validation of the authorization config file.
//!
//! [`ConfigValidator`] checks the file on disk (syntax first, then the
//! semantic rules of [`AuthzConfig::validate`]) and collects every problem
//! into a [`ValidationReport`] instead of stopping at the first.
//!
//! ```rust,no_run
//! use journal_authz::config::ConfigValidator;
//! use std::path::Path;
//!
//! let report = ConfigValidator::new(Path::new(".")).validate()?;
//! if !report.is_valid() {
//!     eprintln!("{}", report.verbose_report());
//!     std::process::exit(report.exit_code());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::AuthzConfig;
use std::path::{Path, PathBuf};

/// Errors and warnings found during validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Problems that make the configuration unusable.
    pub errors: Vec<String>,
    /// Suspicious but usable settings.
    pub warnings: Vec<String>,
    pub files_checked: Vec<PathBuf>,
}

impl ValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings do not affect validity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_valid() {
            0
        } else {
            1
        }
    }

    /// Append another report's findings.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.files_checked.extend(other.files_checked);
    }

    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_valid() {
            if self.warnings.is_empty() {
                "Configuration is valid.".to_string()
            } else {
                format!(
                    "Configuration is valid with {} warning(s).",
                    self.warnings.len()
                )
            }
        } else {
            format!(
                "Configuration is invalid with {} error(s).",
                self.errors.len()
            )
        }
    }

    #[must_use]
    pub fn verbose_report(&self) -> String {
        let mut lines = vec![
            "Authorization Config Validation".to_string(),
            "\u{2500}".repeat(50),
        ];

        if self.files_checked.is_empty() {
            lines.push("  (no config file found, using defaults)".to_string());
        } else {
            lines.push(format!("Files checked ({}):", self.files_checked.len()));
            for file in &self.files_checked {
                lines.push(format!("  - {}", file.display()));
            }
        }

        if !self.errors.is_empty() {
            lines.push(String::new());
            lines.push(format!("Errors ({}):", self.errors.len()));
            for error in &self.errors {
                lines.push(format!("  \u{2717} {}", error));
            }
        }

        if !self.warnings.is_empty() {
            lines.push(String::new());
            lines.push(format!("Warnings ({}):", self.warnings.len()));
            for warning in &self.warnings {
                lines.push(format!("  \u{26a0} {}", warning));
            }
        }

        lines.push(String::new());
        lines.push(format!("Status: {}", self.summary()));
        lines.join("\n")
    }
}

/// Validates the config file of a data directory.
#[derive(Debug, Clone)]
pub struct ConfigValidator {
    data_dir: PathBuf,
}

impl ConfigValidator {
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// Validate the config and return a report.
    ///
    /// # Errors
    ///
    /// Only unexpected I/O failures. Syntax and semantic problems go into the
    /// report.
    pub fn validate(&self) -> anyhow::Result<ValidationReport> {
        let mut report = ValidationReport::new();

        let json_path = AuthzConfig::config_path(&self.data_dir);
        let toml_path = AuthzConfig::toml_path(&self.data_dir);

        let config = if json_path.exists() {
            report.files_checked.push(json_path.clone());
            let content = std::fs::read_to_string(&json_path)?;
            match serde_json::from_str::<AuthzConfig>(&content) {
                Ok(config) => config,
                Err(e) => {
                    report.errors.push(format!(
                        "authz.json syntax error: {} (line {}, column {})",
                        e,
                        e.line(),
                        e.column()
                    ));
                    return Ok(report);
                }
            }
        } else if toml_path.exists() {
            report.files_checked.push(toml_path.clone());
            let content = std::fs::read_to_string(&toml_path)?;
            match toml::from_str::<AuthzConfig>(&content) {
                Ok(config) => config,
                Err(e) => {
                    report.errors.push(format!("authz.toml syntax error: {}", e));
                    return Ok(report);
                }
            }
        } else {
            AuthzConfig::default()
        };

        if json_path.exists() && toml_path.exists() {
            report
                .warnings
                .push("both authz.json and authz.toml exist; authz.toml is ignored".to_string());
        }

        report.merge(config.validate());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn journal_dir(temp: &TempDir) -> PathBuf {
        let dir = temp.path().join(".journal");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_empty_report_is_valid() {
        let report = ValidationReport::new();
        assert!(report.is_valid());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.summary(), "Configuration is valid.");
    }

    #[test]
    fn test_report_with_errors() {
        let report = ValidationReport {
            errors: vec!["bad".to_string()],
            warnings: vec!["meh".to_string()],
            files_checked: vec![],
        };
        assert!(!report.is_valid());
        assert_eq!(report.exit_code(), 1);
        assert!(report.summary().contains("1 error"));
        let verbose = report.verbose_report();
        assert!(verbose.contains("Errors (1):"));
        assert!(verbose.contains("Warnings (1):"));
    }

    #[test]
    fn test_validator_without_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let report = ConfigValidator::new(temp.path()).validate().unwrap();
        assert!(report.is_valid());
        assert!(report.files_checked.is_empty());
    }

    #[test]
    fn test_validator_reports_json_syntax_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(journal_dir(&temp).join("authz.json"), "{\n  \"storePath\": ").unwrap();

        let report = ConfigValidator::new(temp.path()).validate().unwrap();
        assert!(!report.is_valid());
        assert!(report.errors[0].contains("syntax error"));
    }

    #[test]
    fn test_validator_reports_semantic_errors() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            journal_dir(&temp).join("authz.json"),
            r#"{"ownershipScoped": ["permission.DELETE"]}"#,
        )
        .unwrap();

        let report = ConfigValidator::new(temp.path()).validate().unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.files_checked.len(), 1);
    }

    #[test]
    fn test_validator_warns_when_both_formats_exist() {
        let temp = TempDir::new().unwrap();
        let dir = journal_dir(&temp);
        std::fs::write(dir.join("authz.json"), "{}").unwrap();
        std::fs::write(dir.join("authz.toml"), "").unwrap();

        let report = ConfigValidator::new(temp.path()).validate().unwrap();
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.contains("authz.toml")));
    }
}
