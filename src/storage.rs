use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::experiment::{ExperimentDefinition, ExperimentVersion};

pub const DEFAULT_PREFIX: &str = "expStruct_version";

/// Supplies the experiment definition to counterbalance.
pub trait ExperimentSource {
    fn load_experiment(&self) -> Result<ExperimentDefinition>;
}

/// Persists a generated version. `index` is the 1-based version number.
pub trait VersionSink {
    fn save(&self, version: &ExperimentVersion, index: usize) -> Result<PathBuf>;
}

/// Reads a definition from a JSON file holding an array of blocks.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExperimentSource for JsonFileSource {
    fn load_experiment(&self) -> Result<ExperimentDefinition> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open experiment file {}", self.path.display()))?;
        let definition = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse experiment file {}", self.path.display()))?;
        Ok(definition)
    }
}

/// Writes each version as pretty-printed JSON to `{output_dir}/{prefix}{index}.json`.
#[derive(Debug, Clone)]
pub struct JsonDirectorySink {
    output_dir: PathBuf,
    prefix: String,
}

impl JsonDirectorySink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_prefix(output_dir, DEFAULT_PREFIX)
    }

    pub fn with_prefix(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self { output_dir: output_dir.into(), prefix: prefix.into() }
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("{}{}.json", self.prefix, index))
    }
}

impl VersionSink for JsonDirectorySink {
    fn save(&self, version: &ExperimentVersion, index: usize) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create output directory {}", self.output_dir.display()))?;
        let path = self.path_for(index);
        let mut writer = BufWriter::new(
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?,
        );
        serde_json::to_writer_pretty(&mut writer, version)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        writer.flush()?;
        debug!(path = %path.display(), "saved version");
        Ok(path)
    }
}

/// Saves every version in order, numbering them from 1, and returns the written paths.
pub fn save_versions<S: VersionSink + ?Sized>(sink: &S, versions: &[ExperimentVersion]) -> Result<Vec<PathBuf>> {
    versions
        .iter()
        .enumerate()
        .map(|(i, version)| sink.save(version, i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{Block, Trial};
    use serde_json::json;

    fn version(stim: &str) -> ExperimentVersion {
        let trial: Trial = serde_json::from_value(json!({ "stim": stim, "trialID": "0_1" })).unwrap();
        ExperimentVersion::new(vec![Block::new(false, vec![trial])])
    }

    #[test]
    fn test_save_versions_numbers_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirectorySink::new(dir.path().join("out"));
        let paths = save_versions(&sink, &[version("a"), version("b")]).unwrap();

        assert_eq!(paths, vec![sink.path_for(1), sink.path_for(2)]);
        assert!(paths[0].ends_with("expStruct_version1.json"));

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&paths[1]).unwrap()).unwrap();
        assert_eq!(written, json!([ { "isPractice": false, "trials": [ { "stim": "b", "trialID": "0_1" } ] } ]));
    }

    #[test]
    fn test_custom_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirectorySink::with_prefix(dir.path(), "order_");
        let path = sink.save(&version("a"), 7).unwrap();
        assert_eq!(path, dir.path().join("order_7.json"));
        assert!(path.exists());
    }

    #[test]
    fn test_load_experiment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.json");
        fs::write(&path, r#"[{"isPractice": false, "trials": [{"stim": "a"}, {"stim": "b"}]}]"#).unwrap();

        let definition = JsonFileSource::new(&path).load_experiment().unwrap();
        assert_eq!(definition.trial_count().unwrap(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonFileSource::new(dir.path().join("missing.json")).load_experiment();
        assert!(result.is_err());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonFileSource::new(&path).load_experiment().unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
