//! Configuration for fixrev runs.
//!
//! A configuration selects the checks to run and overrides the tunable
//! parameters of the classification library and the rules. It can be
//! loaded from YAML or JSON:
//!
//! ```yaml
//! checks:
//!   - fixrev-abort
//! classifier:
//!   noreturn_functions: [abort, exit, panic]
//! abort:
//!   max_depth: 2
//!   max_statement_count: 1
//! max_statements: 10000
//! ```

use crate::apply::RuleSet;
use crate::classify::{ClassifierConfig, Classifiers};
use crate::error::{FixrevError, Result};
use crate::rule::{ABORT_CHECK, AbortConfig, CHECKS, EXEC_CHECK, ExecConfig, abort_rule, exec_rules};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixrevConfig {
    /// Checks to run, in order. Rules of earlier checks win.
    pub checks: Vec<String>,

    pub classifier: ClassifierConfig,

    pub abort: AbortConfig,

    pub exec: ExecConfig,

    /// Candidate statements examined per file before giving up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_statements: Option<usize>,

    /// Glob patterns of paths to skip.
    pub exclude_patterns: Vec<String>,
}

impl Default for FixrevConfig {
    fn default() -> Self {
        Self {
            checks: CHECKS.iter().map(|c| c.to_string()).collect(),
            classifier: ClassifierConfig::default(),
            abort: AbortConfig::default(),
            exec: ExecConfig::default(),
            max_statements: None,
            exclude_patterns: vec!["**/.git/**".to_string()],
        }
    }
}

impl FixrevConfig {
    /// Restricts the run to the given checks.
    pub fn with_checks<I, S>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checks = checks.into_iter().map(Into::into).collect();
        self
    }

    pub fn parse_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| FixrevError::InvalidConfig(format!("Failed to parse YAML config: {e}")))
    }

    pub fn parse_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| FixrevError::InvalidConfig(format!("Failed to parse JSON config: {e}")))
    }

    /// Load config from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse_yaml(&read_config(path.as_ref())?)
    }

    /// Load config from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse_json(&read_config(path.as_ref())?)
    }

    /// Load config from a file, choosing the format by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            _ => Err(FixrevError::InvalidConfig(format!(
                "Unrecognized config format: {}",
                path.display()
            ))),
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| FixrevError::InvalidConfig(format!("Failed to serialize config: {e}")))
    }

    /// Builds the rules for the configured checks.
    ///
    /// Fails on an unknown check name or on any parameter that makes a
    /// pattern or template invalid.
    pub fn build_rule_set(&self) -> Result<RuleSet> {
        let classifiers = Classifiers::new(&self.classifier)?;
        let mut rules = RuleSet::default();
        let mut seen: Vec<&str> = Vec::new();

        for check in &self.checks {
            if seen.contains(&check.as_str()) {
                continue;
            }
            match check.as_str() {
                ABORT_CHECK => rules.push(abort_rule(&classifiers, &self.abort)?),
                EXEC_CHECK => {
                    for rule in exec_rules(&classifiers, &self.exec)? {
                        rules.push(rule);
                    }
                }
                other => return Err(FixrevError::UnknownCheck(other.to_string())),
            }
            seen.push(check.as_str());
        }

        Ok(match self.max_statements {
            Some(budget) => rules.with_statement_budget(budget),
            None => rules,
        })
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        FixrevError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read config file {}: {e}", path.display()),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_names(config: &FixrevConfig) -> Vec<String> {
        config
            .build_rule_set()
            .unwrap()
            .rules()
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    }

    #[test]
    fn test_default_registers_both_checks() {
        let config = FixrevConfig::default();
        assert_eq!(
            rule_names(&config),
            ["abort", "exec-if", "exec-for", "exec-while"]
        );
    }

    #[test]
    fn test_check_selection_and_order() {
        let config = FixrevConfig::default().with_checks([EXEC_CHECK, ABORT_CHECK, EXEC_CHECK]);
        assert_eq!(
            rule_names(&config),
            ["exec-if", "exec-for", "exec-while", "abort"]
        );

        let config = FixrevConfig::default().with_checks(["fixrev-nope"]);
        assert!(matches!(
            config.build_rule_set(),
            Err(FixrevError::UnknownCheck(name)) if name == "fixrev-nope"
        ));
    }

    #[test]
    fn test_parse_yaml_overrides() {
        let config = FixrevConfig::parse_yaml(
            "checks: [fixrev-abort]\n\
             classifier:\n  noreturn_functions: [abort]\n\
             abort:\n  max_depth: 2\n\
             max_statements: 50\n",
        )
        .unwrap();
        assert_eq!(config.checks, ["fixrev-abort"]);
        assert_eq!(config.classifier.noreturn_functions, ["abort"]);
        assert_eq!(config.abort.max_depth, 2);
        assert_eq!(config.abort.max_statement_count, 3);
        assert_eq!(config.exec, ExecConfig::default());
        assert_eq!(config.max_statements, Some(50));
        assert_eq!(rule_names(&config), ["abort"]);
    }

    #[test]
    fn test_parse_json() {
        let config = FixrevConfig::parse_json(r#"{"exec": {"min_depth": 0}}"#).unwrap();
        assert_eq!(config.exec.min_depth, 0);
        assert_eq!(config.checks.len(), 2);

        assert!(matches!(
            FixrevConfig::parse_json("{"),
            Err(FixrevError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_parameters_fail_at_build() {
        let mut config = FixrevConfig::default();
        config.classifier.relational_operators.push("<=>".to_string());
        assert!(matches!(
            config.build_rule_set(),
            Err(FixrevError::UnknownOperator(_))
        ));

        let mut config = FixrevConfig::default();
        config.exec.min_depth = 5;
        config.exec.max_depth = 1;
        assert!(config.build_rule_set().is_err());
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("fixrev.yml");
        std::fs::write(&yaml, "checks: [fixrev-exec]\n").unwrap();
        assert_eq!(FixrevConfig::from_file(&yaml).unwrap().checks, ["fixrev-exec"]);

        let json = dir.path().join("fixrev.json");
        std::fs::write(&json, r#"{"max_statements": 3}"#).unwrap();
        assert_eq!(FixrevConfig::from_file(&json).unwrap().max_statements, Some(3));

        let toml = dir.path().join("fixrev.toml");
        std::fs::write(&toml, "").unwrap();
        assert!(FixrevConfig::from_file(&toml).is_err());
        assert!(FixrevConfig::from_file(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_yaml_round_trip_of_defaults() {
        let config = FixrevConfig::default();
        let text = config.to_yaml_string().unwrap();
        assert_eq!(FixrevConfig::parse_yaml(&text).unwrap(), config);
    }
}
