//! Scoring configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{AgreementError, AgreementResult};

/// Upper bound for `decimals`.
pub const MAX_DECIMALS: u32 = 10;

/// Settings shared by every score table of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgreementConfig {
    /// Decimal places scores are rounded to.
    pub decimals: u32,
    /// Excise whitespace from occurrence arrays before centroid extraction.
    pub strip_whitespace: bool,
    /// Default minimum peak count for aggregate centroids.
    pub threshold: u32,
    /// Default noise floor for boundary growth and adjustment of the
    /// approximate tolerance. Negative values only tighten the tolerance.
    pub boundary: i32,
}

impl Default for AgreementConfig {
    fn default() -> Self {
        Self {
            decimals: 2,
            strip_whitespace: true,
            threshold: 0,
            boundary: 0,
        }
    }
}

impl AgreementConfig {
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_strip_whitespace(mut self, strip: bool) -> Self {
        self.strip_whitespace = strip;
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_boundary(mut self, boundary: i32) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn validate(&self) -> AgreementResult<()> {
        if self.decimals > MAX_DECIMALS {
            return Err(AgreementError::Config(format!(
                "decimals must be at most {}, got {}",
                MAX_DECIMALS, self.decimals
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> AgreementResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| AgreementError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> AgreementResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| AgreementError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AgreementConfig::default();
        assert_eq!(config.decimals, 2);
        assert!(config.strip_whitespace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AgreementConfig::from_toml_str("boundary = 1\nstrip_whitespace = false\n").unwrap();
        assert_eq!(config, AgreementConfig::default().with_boundary(1).with_strip_whitespace(false));
    }

    #[test]
    fn test_rejects_too_many_decimals() {
        let err = AgreementConfig::from_toml_str("decimals = 12").unwrap_err();
        assert!(matches!(err, AgreementError::Config(msg) if msg.contains("at most 10")));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "decimals = 3\nthreshold = 2").unwrap();
        let config = AgreementConfig::load(file.path()).unwrap();
        assert_eq!(config.decimals, 3);
        assert_eq!(config.threshold, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AgreementConfig::load(Path::new("/nonexistent/agreement.toml")).unwrap_err();
        assert!(matches!(err, AgreementError::Load { .. }));
    }
}
