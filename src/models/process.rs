//! Process definition documents
//!
//! Only the parts the orchestrator reads are modelled; other fields of the
//! stored document (input schemas, descriptions of outputs, ...) are ignored
//! on deserialization.

use serde::{Deserialize, Serialize};

/// A named, versioned pipeline definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDefinition {
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub additional_parameters: AdditionalParameters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdditionalParameters {
    #[serde(default)]
    pub parameters: Vec<ProcessParameter>,
}

/// A `{name, value: [string, ...]}` pair, e.g. `stagesCount` or `stage001Names`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessParameter {
    pub name: String,
    #[serde(default)]
    pub value: Vec<String>,
}

impl ProcessDefinition {
    /// Build a definition whose layout is the given ordered stage-groups.
    ///
    /// Emits `stagesCount` followed by one `stage{i:03}Names` entry per group.
    pub fn with_stages(id: &str, version: &str, stages: &[&[&str]]) -> Self {
        let mut parameters = vec![ProcessParameter {
            name: "stagesCount".to_string(),
            value: vec![stages.len().to_string()],
        }];
        parameters.extend(stages.iter().enumerate().map(|(idx, names)| ProcessParameter {
            name: stage_names_key(idx + 1),
            value: names.iter().map(|n| n.to_string()).collect(),
        }));

        Self {
            id: id.to_string(),
            version: version.to_string(),
            title: None,
            description: None,
            additional_parameters: AdditionalParameters { parameters },
        }
    }

    /// Look up a parameter's values by name. The last entry wins on duplicates.
    pub fn parameter(&self, name: &str) -> Option<&[String]> {
        self.additional_parameters
            .parameters
            .iter()
            .rev()
            .find(|p| p.name == name)
            .map(|p| p.value.as_slice())
    }

    /// Storage key of the document: `<id>___<version>`.
    pub fn document_id(&self) -> String {
        process_document_id(&self.id, &self.version)
    }
}

/// Parameter name holding the sub-process names of 1-based stage-group `index`.
pub fn stage_names_key(index: usize) -> String {
    format!("stage{index:03}Names")
}

pub fn process_document_id(process_id: &str, version: &str) -> String {
    format!("{process_id}___{version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_key_is_zero_padded() {
        assert_eq!(stage_names_key(1), "stage001Names");
        assert_eq!(stage_names_key(12), "stage012Names");
    }

    #[test]
    fn test_with_stages_layout() {
        let def = ProcessDefinition::with_stages("hydro", "1.0", &[&["LIS"], &["RRR", "RAPID"]]);
        assert_eq!(def.parameter("stagesCount"), Some(&["2".to_string()][..]));
        assert_eq!(
            def.parameter("stage002Names").unwrap(),
            &["RRR".to_string(), "RAPID".to_string()]
        );
        assert_eq!(def.document_id(), "hydro___1.0");
    }

    #[test]
    fn test_deserialize_ignores_unmodelled_fields() {
        let raw = r#"{
            "id": "hydro",
            "version": "1.0",
            "title": "Hydrology",
            "jobControlOptions": ["sync-execute"],
            "inputs": {"basinId": {"type": "integer"}},
            "additionalParameters": {
                "parameters": [
                    {"name": "stagesCount", "value": ["1"]},
                    {"name": "stage001Names", "value": ["LIS"]}
                ]
            }
        }"#;
        let def: ProcessDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(def.title.as_deref(), Some("Hydrology"));
        assert_eq!(def.parameter("stage001Names").unwrap(), &["LIS".to_string()]);
    }

    #[test]
    fn test_parameter_last_entry_wins() {
        let mut def = ProcessDefinition::with_stages("p", "1", &[&["A"]]);
        def.additional_parameters.parameters.push(ProcessParameter {
            name: "stage001Names".to_string(),
            value: vec!["B".to_string()],
        });
        assert_eq!(def.parameter("stage001Names").unwrap(), &["B".to_string()]);
    }
}
