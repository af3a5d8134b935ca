use serde::{Deserialize, Serialize};

use common::{Error, InstrumentSpec, Result, UnsetOutcomePolicy};

/// Top-level scan config file (TOML).
///
/// Example `config/instruments.toml`:
/// ```toml
/// [detector]
/// fvg_threshold = 0.5
///
/// [report]
/// unset_outcome = "win"
///
/// [[instrument]]
/// symbol = "ES=F"
/// interval = "5m"
/// lookback = "30d"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanFileConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(rename = "instrument")]
    pub instruments: Vec<InstrumentSpec>,
}

/// Detection parameters shared by every instrument in the scan.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Minimum `high[i] - low[i-1]` gap, in instrument price units, for the
    /// fair-value-gap rule to fire. Strict inequality; must be positive.
    #[serde(default = "default_fvg_threshold")]
    pub fvg_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { fvg_threshold: default_fvg_threshold() }
    }
}

fn default_fvg_threshold() -> f64 {
    0.5
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fvg_threshold > 0.0 && self.fvg_threshold.is_finite() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "fvg_threshold must be a positive finite number, got {}",
                self.fvg_threshold
            )))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub unset_outcome: UnsetOutcomePolicy,
}

impl ScanFileConfig {
    /// Load from a TOML file. Exits process on error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read scan config at '{path}': {e}"));
        let cfg: Self = toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse scan config at '{path}': {e}"));
        cfg.detector
            .validate()
            .unwrap_or_else(|e| panic!("Invalid scan config at '{path}': {e}"));
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let cfg: ScanFileConfig = toml::from_str(
            r#"
            [detector]
            fvg_threshold = 0.75

            [report]
            unset_outcome = "exclude"

            [[instrument]]
            symbol = "ES=F"
            interval = "5m"
            lookback = "30d"

            [[instrument]]
            symbol = "NQ=F"
            interval = "5m"
            lookback = "30d"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.instruments.len(), 2);
        assert_eq!(cfg.detector.fvg_threshold, 0.75);
        assert_eq!(cfg.report.unset_outcome, common::UnsetOutcomePolicy::Exclude);
    }

    #[test]
    fn detector_and_report_sections_are_optional() {
        let cfg: ScanFileConfig = toml::from_str(
            r#"
            [[instrument]]
            symbol = "ES=F"
            interval = "5m"
            lookback = "30d"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.detector.fvg_threshold, 0.5);
        assert_eq!(cfg.report.unset_outcome, common::UnsetOutcomePolicy::Win);
    }

    #[test]
    fn rejects_non_positive_threshold() {
        let cfg = DetectorConfig { fvg_threshold: 0.0 };
        assert!(cfg.validate().is_err());
    }
}
