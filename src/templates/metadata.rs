//! Template metadata side-table.
//!
//! Metadata for every template lives in one `templates.json` document keyed
//! by normalized template name. Content files without an entry simply have
//! empty metadata.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::persist;

/// File name of the metadata document inside the template directory
pub const METADATA_FILE_NAME: &str = "templates.json";

/// Description and declared variables of one template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Variable names the template expects, in declaration order
    #[serde(default, rename = "vars", deserialize_with = "null_as_empty")]
    pub variables: Vec<String>,
}

impl TemplateMetadata {
    pub fn new(description: impl Into<String>, variables: Vec<String>) -> Self {
        Self {
            description: Some(description.into()),
            variables,
        }
    }

    /// Metadata with declared variables only.
    pub fn with_variables<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            description: None,
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.variables.is_empty()
    }
}

/// `null` reads as no variables.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// All template metadata keyed by normalized name.
pub type MetadataTable = BTreeMap<String, TemplateMetadata>;

/// Load the side-table, resetting unusable documents or records to empty.
pub fn load_table(path: &Path) -> MetadataTable {
    persist::read_object_or_default(path)
        .into_iter()
        .map(|(name, raw)| {
            let metadata = serde_json::from_value(raw).unwrap_or_else(|e| {
                warn!("Resetting malformed metadata for {:?}: {}", name, e);
                TemplateMetadata::default()
            });
            (name, metadata)
        })
        .collect()
}

/// Persist the side-table atomically.
pub fn save_table(path: &Path, table: &MetadataTable) -> Result<()> {
    persist::write_json(path, table)
}
