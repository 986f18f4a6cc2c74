//! Built-in starter templates seeded into an empty template directory.

use crate::templates::TemplateMetadata;

/// One built-in template.
#[derive(Debug, Clone, Copy)]
pub struct Starter {
    pub name: &'static str,
    pub description: &'static str,
    pub variables: &'static [&'static str],
    pub content: &'static str,
}

impl Starter {
    pub fn metadata(&self) -> TemplateMetadata {
        TemplateMetadata::new(
            self.description,
            self.variables.iter().map(|v| v.to_string()).collect(),
        )
    }
}

const STARTER: &str = r#"#!/usr/bin/env python3
"""Starter template: ${description}"""

def main():
    print('Hello from ${name}')

if __name__ == '__main__':
    main()
"#;

const DEMO_VARIABLES: &str = r#"#!/usr/bin/env python3
"""Demo template: shows variable substitution using ${var} placeholders"""

# Name: ${name}
# Description: ${description}
# Author: ${author}
# License: ${license}
# Created: ${created_date}

def main():
    print('Project: ${name}')
    print('Description: ${description}')
    print('Author: ${author}')
    print('License: ${license}')

if __name__ == '__main__':
    main()
"#;

const EMPTY: &str = "# Empty Python file\n";

/// Templates written when a store is opened on an empty directory.
pub const STARTERS: &[Starter] = &[
    Starter {
        name: "starter.py",
        description: "Simple starter script",
        variables: &["name"],
        content: STARTER,
    },
    Starter {
        name: "demo_variables.py",
        description: "Demonstrates template variables and usage of ${key} placeholders",
        variables: &["name", "description", "author", "license", "created_date"],
        content: DEMO_VARIABLES,
    },
    Starter {
        name: "empty.py",
        description: "Empty Python file",
        variables: &[],
        content: EMPTY,
    },
];
