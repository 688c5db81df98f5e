//! Run configuration: thresholds for every component, loadable from YAML/JSON
//! or built programmatically.
//!
//! Grounded on the teacher's `derive_builder` usage (owned-pattern builders
//! throughout `model/`) and its `serde`-derived config types; the defaults
//! here mirror the component defaults already hardcoded into `split.rs`,
//! `lis.rs` and `cluster.rs` so a config file only needs to name the
//! thresholds it wants to override.

use std::collections::HashMap;
use std::path::Path;

use derive_builder::Builder;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

lazy_static! {
    static ref CONFIG_LINE: Regex = Regex::new(r"^([^#\s]+):+\s+(\S+)$").unwrap();
}

/// The benchmark resource-location file: one `key:  value` pair per line,
/// comments and blank lines ignored, grounded on `bench.py::read_config_data`.
/// Distinct from [[Config]]'s YAML/JSON threshold overrides — this format
/// only ever names file paths (`hetsitevariants`, `mononucruns`, exclude-mask
/// BEDs, `resourcedir` itself).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceConfig {
    values: HashMap<String, String>,
}

impl ResourceConfig {
    /// Parses `text` line by line against `^([^#\s]+):+\s+(\S+)$`; lines that
    /// don't match (comments, blanks, malformed entries) are skipped rather
    /// than rejected, matching the original's silent `if match:` guard.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            if let Some(caps) = CONFIG_LINE.captures(line) {
                values.insert(caps[1].to_string(), caps[2].to_string());
            }
        }
        ResourceConfig { values }
    }

    /// Rebases every relative-path value onto `resourcedir`, verifying it
    /// exists on disk first. Unlike the original, `resourcedir`'s own value
    /// is left untouched rather than prefixed with itself — rebasing a key
    /// against its own value can only ever produce a path that doesn't
    /// exist, which is certainly not what a config author intended.
    pub fn rebase_to_resource_dir(&mut self) -> Result<()> {
        let resourcedir = self
            .values
            .get("resourcedir")
            .cloned()
            .ok_or_else(|| Error::InvalidConfig("config file is missing a \"resourcedir\" entry".to_string()))?;
        if !Path::new(&resourcedir).exists() {
            return Err(Error::InvalidConfig(format!(
                "resourcedir \"{}\" does not exist",
                resourcedir
            )));
        }
        for (key, value) in self.values.iter_mut() {
            if key == "resourcedir" {
                continue;
            }
            if !value.starts_with('/') {
                *value = format!("{}/{}", resourcedir, value);
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(pattern = "owned", setter(into))]
#[serde(default)]
pub struct Config {
    #[builder(default = "10_000")]
    pub min_indel_size: u32,

    #[builder(default = "0.95")]
    pub max_overlap: f64,

    #[builder(default = "10_000")]
    pub max_cluster_distance: u64,

    #[builder(default = "0.95")]
    pub lca_fraction: f64,

    #[builder(default = "String::from(\"info\")")]
    pub log_level: String,

    #[builder(default)]
    pub exclude_bed: Option<String>,

    #[builder(default)]
    pub truth_vcf: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::default().build().expect(
            "every Config field either has a #[builder(default)] or is an Option",
        )
    }
}

impl Config {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.max_overlap) {
            return Err(Error::InvalidConfig(format!(
                "max_overlap must be in [0, 1], got {}",
                self.max_overlap
            )));
        }
        if !(0.0..=1.0).contains(&self.lca_fraction) {
            return Err(Error::InvalidConfig(format!(
                "lca_fraction must be in [0, 1], got {}",
                self.lca_fraction
            )));
        }
        if self.min_indel_size == 0 {
            return Err(Error::InvalidConfig(
                "min_indel_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn yaml_round_trips_overrides() {
        let yaml = "min_indel_size: 500\nmax_overlap: 0.8\n";
        let cfg = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.min_indel_size, 500);
        assert_eq!(cfg.max_overlap, 0.8);
        assert_eq!(cfg.max_cluster_distance, 10_000);
    }

    #[test]
    fn validate_rejects_overlap_outside_unit_range() {
        let mut cfg = Config::default();
        cfg.max_overlap = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn resource_config_parses_key_colon_whitespace_value_lines() {
        let text = "# a comment\n\nhetsitevariants:  het.vcf\nmononucruns:\t\tmononuc.bed\nresourcedir: /tmp\n";
        let cfg = ResourceConfig::parse(text);
        assert_eq!(cfg.get("hetsitevariants"), Some("het.vcf"));
        assert_eq!(cfg.get("mononucruns"), Some("mononuc.bed"));
        assert_eq!(cfg.get("resourcedir"), Some("/tmp"));
        assert_eq!(cfg.len(), 3);
    }

    #[test]
    fn resource_config_rebases_relative_paths_onto_resourcedir() {
        let tmp = std::env::temp_dir();
        let mut cfg = ResourceConfig::parse(&format!(
            "resourcedir: {}\nhetsitevariants: het.vcf\nabsolute: /already/absolute.bed\n",
            tmp.display()
        ));
        cfg.rebase_to_resource_dir().unwrap();
        assert_eq!(
            cfg.get("hetsitevariants"),
            Some(format!("{}/het.vcf", tmp.display())).as_deref()
        );
        assert_eq!(cfg.get("absolute"), Some("/already/absolute.bed"));
        // resourcedir itself is left exactly as written, not self-prefixed.
        assert_eq!(cfg.get("resourcedir"), Some(tmp.display().to_string()).as_deref());
    }

    #[test]
    fn rebase_fails_when_resourcedir_is_missing_or_absent() {
        let mut missing_key = ResourceConfig::parse("hetsitevariants: het.vcf\n");
        assert!(missing_key.rebase_to_resource_dir().is_err());

        let mut nonexistent_dir =
            ResourceConfig::parse("resourcedir: /path/does/not/exist/anywhere\n");
        assert!(nonexistent_dir.rebase_to_resource_dir().is_err());
    }
}
