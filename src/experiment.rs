use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CounterbalanceError;

/// Field under which every generated trial carries its position identifier.
pub const TRIAL_ID_FIELD: &str = "trialID";

/// A single trial: an opaque mapping of field names to values.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trial {
    fields: Map<String, Value>,
}

impl Trial {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn trial_id(&self) -> Option<&str> {
        self.get(TRIAL_ID_FIELD).and_then(Value::as_str)
    }

    /// Copy of this trial with `trialID` set to `id`, replacing any existing one.
    pub fn with_id(&self, id: String) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(TRIAL_ID_FIELD.to_string(), Value::String(id));
        Self { fields }
    }
}

impl From<Map<String, Value>> for Trial {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

pub const PRACTICE_FIELD: &str = "isPractice";
pub const TRIALS_FIELD: &str = "trials";

/// An ordered run of trials. Any keys besides `isPractice` and `trials` are kept in
/// `metadata` and written back out untouched, in the order the block was read with.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Block {
    pub is_practice: bool,
    pub trials: Vec<Trial>,
    pub metadata: Map<String, Value>,
    /* key_order is the key layout of the source object, empty for blocks built in code */
    key_order: Vec<String>,
}

impl Block {
    pub fn new(is_practice: bool, trials: Vec<Trial>) -> Self {
        Self { is_practice, trials, metadata: Map::new(), key_order: Vec::new() }
    }

    /// Same block metadata and key layout with a different trial sequence.
    pub fn with_trials(&self, trials: Vec<Trial>) -> Self {
        Self {
            is_practice: self.is_practice,
            trials,
            metadata: self.metadata.clone(),
            key_order: self.key_order.clone(),
        }
    }
}

impl TryFrom<Map<String, Value>> for Block {
    type Error = serde_json::Error;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let key_order = fields.keys().cloned().collect();
        let is_practice = fields
            .shift_remove(PRACTICE_FIELD)
            .map(serde_json::from_value::<bool>)
            .transpose()?
            .unwrap_or(false);
        let trials = fields
            .shift_remove(TRIALS_FIELD)
            .map(serde_json::from_value::<Vec<Trial>>)
            .transpose()?
            .unwrap_or_default();
        Ok(Self { is_practice, trials, metadata: fields, key_order })
    }
}

impl From<Block> for Map<String, Value> {
    fn from(block: Block) -> Self {
        let Block { is_practice, trials, mut metadata, key_order } = block;
        let mut practice = Some(Value::Bool(is_practice));
        let mut trials = Some(Value::Array(trials.into_iter().map(|trial| Value::Object(trial.fields)).collect()));

        let mut fields = Map::new();
        for key in key_order {
            let value = match key.as_str() {
                PRACTICE_FIELD => practice.take(),
                TRIALS_FIELD => trials.take(),
                _ => metadata.shift_remove(&key),
            };
            if let Some(value) = value {
                fields.insert(key, value);
            }
        }
        // keys the source did not have
        if let Some(value) = practice {
            fields.insert(PRACTICE_FIELD.to_string(), value);
        }
        if let Some(value) = trials {
            fields.insert(TRIALS_FIELD.to_string(), value);
        }
        fields.extend(metadata);
        fields
    }
}

/// The source experiment: an ordered list of blocks, read once and never modified.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentDefinition {
    blocks: Vec<Block>,
}

impl ExperimentDefinition {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// N, the trial count of the first non-practice block.
    ///
    /// # Errors
    ///
    /// `CounterbalanceError::Configuration` if every block is a practice block or the first
    /// non-practice block is empty.
    pub fn trial_count(&self) -> Result<usize, CounterbalanceError> {
        let block = self
            .blocks
            .iter()
            .find(|block| !block.is_practice)
            .ok_or_else(|| {
                CounterbalanceError::Configuration("experiment has no non-practice block".to_string())
            })?;
        match block.trials.len() {
            0 => Err(CounterbalanceError::Configuration(
                "first non-practice block has no trials".to_string(),
            )),
            n => Ok(n),
        }
    }
}

/// One counterbalanced copy of the experiment, laid out exactly like the definition.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentVersion {
    blocks: Vec<Block>,
}

impl ExperimentVersion {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition_json() -> Value {
        json!([
            { "isPractice": true, "name": "warmup", "trials": [ { "stim": "p1" }, { "stim": "p2" } ] },
            { "isPractice": false, "name": "main", "duration": 30, "trials": [ { "stim": "a" }, { "stim": "b" }, { "stim": "c" } ] }
        ])
    }

    #[test]
    fn test_parse_definition() {
        let definition: ExperimentDefinition = serde_json::from_value(definition_json()).unwrap();
        assert_eq!(definition.blocks().len(), 2);
        assert!(definition.blocks()[0].is_practice);
        assert_eq!(definition.blocks()[1].trials[2].get("stim"), Some(&json!("c")));
        assert_eq!(definition.blocks()[1].metadata.get("duration"), Some(&json!(30)));
        assert_eq!(definition.trial_count().unwrap(), 3);
    }

    #[test]
    fn test_metadata_round_trips() {
        let definition: ExperimentDefinition = serde_json::from_value(definition_json()).unwrap();
        let value = serde_json::to_value(&definition).unwrap();
        assert_eq!(value, definition_json());
    }

    #[test]
    fn test_block_key_order_is_kept() {
        let source = r#"[{"name":"main","isPractice":false,"duration":30,"trials":[{"stim":"a","cue":1}]},{"trials":[],"label":"x"}]"#;
        let definition: ExperimentDefinition = serde_json::from_str(source).unwrap();
        assert_eq!(definition.blocks()[0].metadata.len(), 2);

        // the second block had no isPractice key, so it is added at the end
        let expected = r#"[{"name":"main","isPractice":false,"duration":30,"trials":[{"stim":"a","cue":1}]},{"trials":[],"label":"x","isPractice":false}]"#;
        assert_eq!(serde_json::to_string(&definition).unwrap(), expected);
    }

    #[test]
    fn test_built_block_layout() {
        let mut block = Block::new(true, vec![]);
        block.metadata.insert("label".to_string(), json!("warmup"));
        assert_eq!(
            serde_json::to_string(&block).unwrap(),
            r#"{"isPractice":true,"trials":[],"label":"warmup"}"#
        );
    }

    #[test]
    fn test_practice_flag_must_be_bool() {
        let result = serde_json::from_value::<ExperimentDefinition>(json!([ { "isPractice": "yes", "trials": [] } ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_practice_flag_defaults_to_false() {
        let definition: ExperimentDefinition =
            serde_json::from_value(json!([ { "trials": [ { "x": 1 } ] } ])).unwrap();
        assert!(!definition.blocks()[0].is_practice);
        assert_eq!(definition.trial_count().unwrap(), 1);
    }

    #[test]
    fn test_trial_count_skips_practice_blocks() {
        let definition = ExperimentDefinition::new(vec![
            Block::new(true, vec![Trial::default(); 5]),
            Block::new(false, vec![Trial::default(); 4]),
            Block::new(false, vec![Trial::default(); 4]),
        ]);
        assert_eq!(definition.trial_count().unwrap(), 4);
    }

    #[test]
    fn test_trial_count_without_experiment_block() {
        let definition = ExperimentDefinition::new(vec![Block::new(true, vec![Trial::default(); 2])]);
        assert!(matches!(definition.trial_count(), Err(CounterbalanceError::Configuration(_))));

        let empty = ExperimentDefinition::default();
        assert!(matches!(empty.trial_count(), Err(CounterbalanceError::Configuration(_))));
    }

    #[test]
    fn test_trial_count_of_empty_block() {
        let definition = ExperimentDefinition::new(vec![Block::new(false, vec![])]);
        assert!(matches!(definition.trial_count(), Err(CounterbalanceError::Configuration(_))));
    }

    #[test]
    fn test_with_id_copies() {
        let mut fields = Map::new();
        fields.insert("stim".to_string(), json!("a"));
        let trial = Trial::from(fields);
        let tagged = trial.with_id("1_2".to_string());
        assert_eq!(tagged.trial_id(), Some("1_2"));
        assert_eq!(tagged.get("stim"), Some(&json!("a")));
        assert_eq!(trial.trial_id(), None);
    }
}
