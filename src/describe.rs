//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Human-readable change records.
//!
//! The describer walks the top level of a difference tree and turns each
//! record into atomic change rows. Only a top-level addition counts as
//! new functionality; every other shape of change affects backward
//! compatibility.

use serde::Serialize;

use crate::builder::unwrap_type;
use crate::diff::{DiffRecord, DiffTag};

/// Change categories of an atomic record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum ChangeType {
    #[serde(rename = "Functionality_changed")]
    FunctionalityChanged,
    #[serde(rename = "Compatibility_changed")]
    CompatibilityChanged,
}

/// Compatibility verdict of an atomic record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Compatibility {
    #[serde(rename = "backward_compatible")]
    BackwardCompatible,
    #[serde(rename = "backward_incompatible")]
    BackwardIncompatible,
}

/// The compatibility verdict is a function of the change category alone.
pub fn verdict(changetype: ChangeType) -> Compatibility {
    match changetype {
        ChangeType::FunctionalityChanged => Compatibility::BackwardCompatible,
        ChangeType::CompatibilityChanged => {
            Compatibility::BackwardIncompatible
        }
    }
}

/// One elementary, human-readable change row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub headerfile: String,
    pub name: String,
    pub description: String,
    pub changetype: ChangeType,
    pub compatibility: Compatibility,
}

/// Translate a difference tree into atomic change records.
pub fn describe(diff: &[DiffRecord], headerfile: &str) -> Vec<ChangeRecord> {
    let mut out = Vec::new();

    for record in diff {
        let (changetype, lines) = match record.tag {
            Some(DiffTag::Added) => (
                ChangeType::FunctionalityChanged,
                subtree_lines(record, DiffTag::Added),
            ),
            Some(DiffTag::Removed) => (
                ChangeType::CompatibilityChanged,
                subtree_lines(record, DiffTag::Removed),
            ),
            Some(DiffTag::Modified) => {
                let lines = if record.is_function() {
                    function_lines(record)
                } else {
                    let mut lines = Vec::new();
                    modified_lines(record, &mut lines);
                    lines
                };
                (ChangeType::CompatibilityChanged, lines)
            }
            None => continue,
        };

        for description in lines {
            out.push(ChangeRecord {
                headerfile: headerfile.to_string(),
                name: record.qualified_name.clone(),
                description,
                changetype,
                compatibility: verdict(changetype),
            });
        }
    }

    out
}

fn tag_verb(tag: DiffTag) -> &'static str {
    match tag {
        DiffTag::Added => "added",
        DiffTag::Removed => "removed",
        DiffTag::Modified => "modified",
    }
}

/// Rows for a whole added or removed subtree.
fn subtree_lines(record: &DiffRecord, tag: DiffTag) -> Vec<String> {
    let mut lines = Vec::new();
    if record.is_function() {
        // The synthesised return/parameter children stay silent; the
        // signature already identifies the function.
        lines.push(format!("{} {}", record.node_type, tag_verb(tag)));
        return lines;
    }
    collect_subtree_lines(record, tag, &mut lines);
    lines
}

fn collect_subtree_lines(
    record: &DiffRecord,
    tag: DiffTag,
    lines: &mut Vec<String>,
) {
    lines.push(entity_line(record, tag));
    if record.is_function() {
        return;
    }
    for child in &record.children {
        collect_subtree_lines(child, tag, lines);
    }
}

fn entity_line(record: &DiffRecord, tag: DiffTag) -> String {
    if record.data_type.is_empty() {
        format!(
            "{} {}: '{}'",
            record.node_type,
            tag_verb(tag),
            record.qualified_name
        )
    } else {
        format!(
            "{} {}: '{}' with type '{}'",
            record.node_type,
            tag_verb(tag),
            record.qualified_name,
            record.data_type
        )
    }
}

/// Rows for a modified function-like record.
fn function_lines(record: &DiffRecord) -> Vec<String> {
    let mut lines = Vec::new();

    // Attribute snapshots produced by the per-node diff.
    let old_snapshot = record
        .children
        .iter()
        .find(|c| c.tag == Some(DiffTag::Removed) && c.is_function());
    let new_snapshot = record
        .children
        .iter()
        .find(|c| c.tag == Some(DiffTag::Added) && c.is_function());
    if let (Some(old), Some(new)) = (old_snapshot, new_snapshot) {
        attribute_line(
            &mut lines,
            "storage qualifier",
            &old.storage_qualifier,
            &new.storage_qualifier,
        );
        attribute_line(
            &mut lines,
            "calling convention",
            &old.function_calling_convention,
            &new.function_calling_convention,
        );
        attribute_line(
            &mut lines,
            "inline",
            if old.is_inline { "inline" } else { "" },
            if new.is_inline { "inline" } else { "" },
        );
    }

    // Return-type and in-place parameter modifications.
    for child in &record.children {
        if child.tag != Some(DiffTag::Modified)
            || !matches!(child.node_type.as_str(), "ReturnType" | "Parameter")
        {
            continue;
        }
        let old = child
            .children
            .iter()
            .find(|c| c.tag == Some(DiffTag::Removed));
        let new = child
            .children
            .iter()
            .find(|c| c.tag == Some(DiffTag::Added));
        if let (Some(old), Some(new)) = (old, new) {
            if child.node_type == "ReturnType" {
                lines.push(format!(
                    "Return type changed from '{}' to '{}'",
                    old.data_type, new.data_type
                ));
            } else {
                lines.push(format!(
                    "Parameter '{}' type changed from '{}' to '{}'",
                    child.leaf_name(),
                    old.data_type,
                    new.data_type
                ));
            }
        }
    }

    // Added and removed parameters; a removal and an addition with the
    // same type pair up as a rename.
    let removed_params: Vec<&DiffRecord> = record
        .children
        .iter()
        .filter(|c| {
            c.tag == Some(DiffTag::Removed) && c.node_type == "Parameter"
        })
        .collect();
    let added_params: Vec<&DiffRecord> = record
        .children
        .iter()
        .filter(|c| {
            c.tag == Some(DiffTag::Added) && c.node_type == "Parameter"
        })
        .collect();

    let mut paired = vec![false; added_params.len()];
    for old in &removed_params {
        let rename = added_params
            .iter()
            .enumerate()
            .find(|(i, new)| !paired[*i] && new.data_type == old.data_type);
        match rename {
            Some((i, new)) => {
                paired[i] = true;
                lines.push(format!(
                    "Parameter renamed from '{}' to '{}' (type '{}')",
                    old.leaf_name(),
                    new.leaf_name(),
                    old.data_type
                ));
            }
            None => lines.push(format!(
                "Parameter '{}' removed (type '{}')",
                old.leaf_name(),
                old.data_type
            )),
        }
    }
    for (i, new) in added_params.iter().enumerate() {
        if !paired[i] {
            lines.push(format!(
                "Parameter '{}' added (type '{}')",
                new.leaf_name(),
                new.data_type
            ));
        }
    }

    if lines.is_empty() {
        lines.push(format!("{} modified", record.node_type));
    }
    lines
}

fn attribute_line(
    lines: &mut Vec<String>,
    attribute: &str,
    old: &str,
    new: &str,
) {
    if old == new {
        return;
    }
    let line = if old.is_empty() {
        format!("Function attribute {} added '{}'", attribute, new)
    } else if new.is_empty() {
        format!("Function attribute {} removed '{}'", attribute, old)
    } else {
        format!(
            "Function attribute {} changed from '{}' to '{}'",
            attribute, old, new
        )
    };
    lines.push(line);
}

/// Rows for a modified non-function record, by recursive traversal.
fn modified_lines(record: &DiffRecord, lines: &mut Vec<String>) {
    let removed: Vec<&DiffRecord> = record
        .children
        .iter()
        .filter(|c| c.tag == Some(DiffTag::Removed))
        .collect();
    let added: Vec<&DiffRecord> = record
        .children
        .iter()
        .filter(|c| c.tag == Some(DiffTag::Added))
        .collect();
    let modified: Vec<&DiffRecord> = record
        .children
        .iter()
        .filter(|c| c.tag == Some(DiffTag::Modified))
        .collect();

    let mut paired = vec![false; added.len()];
    for old in &removed {
        // An added counterpart with the same identity is the same entity
        // changing in place.
        let exact = added.iter().enumerate().find(|(i, new)| {
            !paired[*i]
                && new.qualified_name == old.qualified_name
                && new.node_type == old.node_type
        });
        if let Some((i, new)) = exact {
            paired[i] = true;
            if old.data_type != new.data_type {
                lines.push(format!(
                    "{} '{}' type changed from '{}' to '{}'",
                    old.node_type,
                    old.qualified_name,
                    old.data_type,
                    new.data_type
                ));
            } else if old.value != new.value {
                lines.push(format!(
                    "{} '{}' value changed from '{}' to '{}'",
                    old.node_type, old.qualified_name, old.value, new.value
                ));
            } else {
                lines.push(format!(
                    "{} modified: '{}'",
                    old.node_type, old.qualified_name
                ));
            }
            continue;
        }

        if old.node_type == "Parameter" {
            // The same base type behind different qualifiers still reads
            // as the same parameter.
            let stem = unwrap_type(&old.data_type).1;
            let loose = added.iter().enumerate().find(|(i, new)| {
                !paired[*i]
                    && new.node_type == "Parameter"
                    && unwrap_type(&new.data_type).1 == stem
            });
            if let Some((i, new)) = loose {
                paired[i] = true;
                lines.push(format!(
                    "Parameter modified: '{}' type changed from '{}' to '{}'",
                    old.leaf_name(),
                    old.data_type,
                    new.data_type
                ));
                continue;
            }
        }

        collect_subtree_lines(old, DiffTag::Removed, lines);
    }

    for (i, new) in added.iter().enumerate() {
        if !paired[i] {
            collect_subtree_lines(new, DiffTag::Added, lines);
        }
    }

    for inner in &modified {
        if inner.is_function() {
            lines.extend(function_lines(inner));
        } else {
            modified_lines(inner, lines);
        }
    }
}
