//! Sample values for declared template variables.
//!
//! Used to pre-fill variables before rendering: each declared variable gets
//! a plausible value chosen from its name.

use chrono::NaiveDate;
use serde_json::Value;

use crate::templates::{TemplateMetadata, Variables};

/// Project name used when the target directory has none
pub const DEFAULT_PROJECT_NAME: &str = "MyProject";

/// Author used when neither settings nor git provide one
pub const DEFAULT_AUTHOR: &str = "Your Name";

/// Inputs for sample value selection.
#[derive(Debug, Clone)]
pub struct SampleContext {
    pub project_name: String,
    pub author: String,
    pub today: NaiveDate,
}

impl SampleContext {
    pub fn new(project_name: impl Into<String>, author: impl Into<String>, today: NaiveDate) -> Self {
        let project_name = project_name.into();
        Self {
            project_name: if project_name.is_empty() {
                DEFAULT_PROJECT_NAME.to_string()
            } else {
                project_name
            },
            author: author.into(),
            today,
        }
    }
}

/// Sample value for one variable name.
pub fn sample_value(key: &str, metadata: &TemplateMetadata, context: &SampleContext) -> String {
    let lowered = key.to_lowercase();

    if lowered.contains("name") {
        context.project_name.clone()
    } else if lowered.contains("author") {
        context.author.clone()
    } else if lowered.contains("license") {
        "MIT".to_string()
    } else if lowered.contains("date") || lowered.contains("created") {
        context.today.format("%Y-%m-%d").to_string()
    } else if lowered.contains("description") {
        metadata
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "A demo project".to_string())
    } else {
        format!("<{}>", key)
    }
}

/// Sample values for every declared variable of a template.
pub fn sample_variables(metadata: &TemplateMetadata, context: &SampleContext) -> Variables {
    metadata
        .variables
        .iter()
        .map(|key| (key.clone(), Value::String(sample_value(key, metadata, context))))
        .collect()
}
