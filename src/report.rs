//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Report grouping and emission.
//!
//! Atomic change records aggregate by `(headerfile, name)` into one row
//! per affected API, rendered as an HTML table and, on request, a JSON
//! array.

use serde::Serialize;
use std::collections::HashMap;

use crate::describe::{ChangeRecord, ChangeType};
use crate::diff::DiffRecord;
use crate::error::{Error, Result};

/// Display strings of the grouped change categories.
pub const COMPATIBILITY_CHANGED: &str = "Compatibility Changed";
pub const FUNCTIONALITY_ADDED: &str = "Functionality Added";

const BACKWARD_COMPATIBLE: &str = "backward_compatible";
const BACKWARD_INCOMPATIBLE: &str = "backward_incompatible";

/// One row of the final report, aggregating every atomic change for one
/// API within one header.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroupedRecord {
    pub headerfile: String,
    pub name: String,
    pub description: String,
    pub changetype: String,
    pub compatibility: String,
}

/// Group atomic records by `(headerfile, name)`, keeping first-seen
/// order. A single compatibility-affecting contributor makes the whole
/// group compatibility-affecting.
pub fn group_records(records: &[ChangeRecord]) -> Vec<GroupedRecord> {
    let mut groups: Vec<GroupedRecord> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for record in records {
        let key = (record.headerfile.clone(), record.name.clone());
        let incompatible =
            record.changetype == ChangeType::CompatibilityChanged;

        match index.get(&key) {
            Some(&at) => {
                let group = &mut groups[at];
                group.description.push('\n');
                group.description.push_str(&record.description);
                if incompatible {
                    group.changetype = COMPATIBILITY_CHANGED.to_string();
                    group.compatibility = BACKWARD_INCOMPATIBLE.to_string();
                }
            }
            None => {
                index.insert(key, groups.len());
                groups.push(GroupedRecord {
                    headerfile: record.headerfile.clone(),
                    name: record.name.clone(),
                    description: record.description.clone(),
                    changetype: if incompatible {
                        COMPATIBILITY_CHANGED
                    } else {
                        FUNCTIONALITY_ADDED
                    }
                    .to_string(),
                    compatibility: if incompatible {
                        BACKWARD_INCOMPATIBLE
                    } else {
                        BACKWARD_COMPATIBLE
                    }
                    .to_string(),
                });
            }
        }
    }

    groups
}

static HTML_PREAMBLE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>API Diff Report</title>
<style>
table { border-collapse: collapse; width: 100%; font-family: sans-serif; }
th, td { border: 1px solid #ccc; padding: 6px 10px; text-align: left; vertical-align: top; }
th { background-color: #f0f0f0; }
.incompatible { color: #c0392b; }
.compatible { color: #27ae60; }
</style>
</head>
<body>
<h2>API Diff Report</h2>
<table>
<tr><th>Header File</th><th>Name</th><th>Description</th><th>Change Type</th><th>Compatibility</th></tr>
"#;

/// Render the grouped records as an HTML table.
pub fn render_html(groups: &[GroupedRecord]) -> String {
    let mut out = String::from(HTML_PREAMBLE);

    if groups.is_empty() {
        out.push_str(
            "<tr><td colspan=\"5\">No API changes detected</td></tr>\n",
        );
    }
    for group in groups {
        let class = if group.compatibility == BACKWARD_INCOMPATIBLE {
            "incompatible"
        } else {
            "compatible"
        };
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td></tr>\n",
            escape(&group.headerfile),
            escape(&group.name),
            escape(&group.description).replace('\n', "<br>"),
            escape(&group.changetype),
            class,
            escape(&group.compatibility),
        ));
    }

    out.push_str("</table>\n</body>\n</html>\n");
    out
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the grouped records as a JSON array.
pub fn render_json(groups: &[GroupedRecord]) -> Result<String> {
    to_json_pretty(&groups)
}

/// Render the raw difference tree (`--dump-ast-diff`).
pub fn render_diff_json(diff: &[DiffRecord]) -> Result<String> {
    to_json_pretty(&diff)
}

/// Serialise a value with the 4-space indentation the reports use.
fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|err| Error::other(&err.to_string()))?;
    String::from_utf8(buf).map_err(|err| Error::other(&err.to_string()))
}
