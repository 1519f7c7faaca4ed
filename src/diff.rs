//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Structural diff over normalized contexts.
//!
//! The engine compares two contexts and produces a tagged difference
//! tree of pure values; nothing in the output borrows from either
//! context. Roots and children are paired by a key extractor: the
//! signature for function-like nodes, the qualified name for everything
//! else. Renaming a function therefore reads as a removal plus an
//! addition.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::context::NormalizedContext;
use crate::node::{ApiNode, NodeId, NodeKind};

/// Pairing key of a node: kind plus signature for function-like nodes,
/// kind plus qualified name otherwise. The kind keeps same-named
/// declarations of different shapes apart (`typedef struct S S;`).
fn pair_key(node: &ApiNode) -> (&str, &str) {
    (node.kind.as_str(), node.match_key())
}

/// Tag attached to each difference record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffTag {
    Added,
    Removed,
    Modified,
}

/// One record of the tagged difference tree.
///
/// `added` and `removed` records carry the full affected subtree;
/// `modified` records carry the inner changes as children. Attribute
/// fields snapshot the node they describe and serialise only when
/// populated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub qualified_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub node_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub access_specifier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub storage_qualifier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub const_qualifier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub virtual_qualifier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub function_calling_convention: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_inline: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_pointer: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_reference: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_rvalue_ref: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_packed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<DiffTag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DiffRecord>,
}

impl DiffRecord {
    /// Whether the record describes a function-like node.
    pub fn is_function(&self) -> bool {
        matches!(
            self.node_type.as_str(),
            "Function" | "Method" | "FunctionPointer"
        )
    }

    /// Last component of the qualified name.
    pub fn leaf_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }
}

/// Kinds whose child ordering carries layout significance. Enum children
/// carry their own ordinal value, so enum reorderings stay
/// attribute-equivalent. Gates future layout checks; nothing is emitted
/// from it today.
pub fn check_layout_change(kind: NodeKind) -> bool {
    kind != NodeKind::Enum
}

/// Attribute snapshot of a node, without children.
fn snapshot(
    ctx: &NormalizedContext,
    id: NodeId,
    tag: Option<DiffTag>,
) -> DiffRecord {
    let node = ctx.node(id);
    DiffRecord {
        qualified_name: node.qualified_name.clone(),
        node_type: node.kind.as_str().to_string(),
        type_name: node.type_name.clone(),
        data_type: node.data_type.clone(),
        value: node.value.clone(),
        access_specifier: node.access.as_str().to_string(),
        storage_qualifier: node.storage.as_str().to_string(),
        const_qualifier: node.const_qualifier.as_str().to_string(),
        virtual_qualifier: node.virtual_qualifier.as_str().to_string(),
        function_calling_convention: node.calling_convention.clone(),
        is_inline: node.is_inline,
        is_pointer: node.is_pointer,
        is_reference: node.is_reference,
        is_rvalue_ref: node.is_rvalue_ref,
        is_packed: node.is_packed,
        tag,
        children: Vec::new(),
    }
}

/// Full-subtree record; only the top node carries the tag.
fn to_record(
    ctx: &NormalizedContext,
    id: NodeId,
    tag: Option<DiffTag>,
) -> DiffRecord {
    let mut record = snapshot(ctx, id, tag);
    record.children = ctx
        .node(id)
        .children
        .iter()
        .map(|&child| to_record(ctx, child, None))
        .collect();
    record
}

/// Attribute-level comparison of two nodes matched by key.
///
/// Function-like nodes compare only the attributes that do not already
/// participate in the matching key, and yield a raw snapshot pair; the
/// parameter list is handled by the recursive engine through child
/// diffing. Other kinds yield a single `modified` record wrapping the
/// old and new snapshots.
pub fn diff_attributes(
    base: &NormalizedContext,
    a: NodeId,
    head: &NormalizedContext,
    b: NodeId,
) -> Vec<DiffRecord> {
    let na = base.node(a);
    let nb = head.node(b);

    if na.kind.is_function() {
        let changed = na.type_name != nb.type_name
            || na.calling_convention != nb.calling_convention
            || na.storage != nb.storage
            || na.is_inline != nb.is_inline;
        if changed {
            return vec![
                snapshot(base, a, Some(DiffTag::Removed)),
                snapshot(head, b, Some(DiffTag::Added)),
            ];
        }
        return Vec::new();
    }

    if attributes_equal(na, nb) {
        return Vec::new();
    }
    vec![DiffRecord {
        qualified_name: na.qualified_name.clone(),
        node_type: na.kind.as_str().to_string(),
        tag: Some(DiffTag::Modified),
        children: vec![
            snapshot(base, a, Some(DiffTag::Removed)),
            snapshot(head, b, Some(DiffTag::Added)),
        ],
        ..Default::default()
    }]
}

fn attributes_equal(a: &ApiNode, b: &ApiNode) -> bool {
    a.type_name == b.type_name
        && a.data_type == b.data_type
        && a.value == b.value
        && a.access == b.access
        && a.storage == b.storage
        && a.const_qualifier == b.const_qualifier
        && a.virtual_qualifier == b.virtual_qualifier
        && a.calling_convention == b.calling_convention
        && a.is_inline == b.is_inline
        && a.is_pointer == b.is_pointer
        && a.is_reference == b.is_reference
        && a.is_rvalue_ref == b.is_rvalue_ref
        && a.is_packed == b.is_packed
}

/// Diff two normalized contexts into a tagged difference tree.
pub fn diff_contexts(
    base: &NormalizedContext,
    head: &NormalizedContext,
) -> Vec<DiffRecord> {
    let mut out = Vec::new();

    let base_keys: HashMap<(&str, &str), NodeId> = base
        .roots()
        .iter()
        .map(|&id| (pair_key(base.node(id)), id))
        .collect();
    let head_keys: HashMap<(&str, &str), NodeId> = head
        .roots()
        .iter()
        .map(|&id| (pair_key(head.node(id)), id))
        .collect();

    for &r1 in base.roots() {
        let node = base.node(r1);
        if base.is_excluded(&node.qualified_name) {
            continue;
        }
        match head_keys.get(&pair_key(node)) {
            Some(&r2) => out.extend(diff_nodes(base, r1, head, r2)),
            None => out.push(to_record(base, r1, Some(DiffTag::Removed))),
        }
    }
    for &r2 in head.roots() {
        let node = head.node(r2);
        if head.is_excluded(&node.qualified_name) {
            continue;
        }
        if !base_keys.contains_key(&pair_key(node)) {
            out.push(to_record(head, r2, Some(DiffTag::Added)));
        }
    }

    out
}

/// Recursive node pair diff.
///
/// With children on both sides, partitions them into removed, added and
/// common groups, recurses over the common pairs and appends the
/// attribute diff of the pair itself; a non-empty result is wrapped in a
/// single `modified` record. With no children on either side, the
/// attribute diff is the result.
fn diff_nodes(
    base: &NormalizedContext,
    a: NodeId,
    head: &NormalizedContext,
    b: NodeId,
) -> Vec<DiffRecord> {
    let na = base.node(a);
    let nb = head.node(b);

    if na.children.is_empty() || nb.children.is_empty() {
        return diff_attributes(base, a, head, b);
    }

    let a_keys: HashMap<(&str, &str), NodeId> = na
        .children
        .iter()
        .map(|&id| (pair_key(base.node(id)), id))
        .collect();
    let b_keys: HashMap<(&str, &str), NodeId> = nb
        .children
        .iter()
        .map(|&id| (pair_key(head.node(id)), id))
        .collect();

    let mut acc = Vec::new();
    for &ca in &na.children {
        let child = base.node(ca);
        if base.is_excluded(&child.qualified_name) {
            continue;
        }
        match b_keys.get(&pair_key(child)) {
            Some(&cb) => acc.extend(diff_nodes(base, ca, head, cb)),
            None => acc.push(to_record(base, ca, Some(DiffTag::Removed))),
        }
    }
    for &cb in &nb.children {
        let child = head.node(cb);
        if head.is_excluded(&child.qualified_name) {
            continue;
        }
        if !a_keys.contains_key(&pair_key(child)) {
            acc.push(to_record(head, cb, Some(DiffTag::Added)));
        }
    }
    acc.extend(diff_attributes(base, a, head, b));

    if acc.is_empty() {
        return acc;
    }
    vec![DiffRecord {
        qualified_name: na.qualified_name.clone(),
        node_type: na.kind.as_str().to_string(),
        tag: Some(DiffTag::Modified),
        children: acc,
        ..Default::default()
    }]
}
