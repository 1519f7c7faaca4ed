//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Normalized API nodes.
//!
//! An [`ApiNode`] is the position-independent record of one declared
//! entity, projected out of the front-end AST. Nodes live in the arena of
//! their owning context and reference their children by index.

use num_derive::FromPrimitive;

use clang_sys as ffi;

/// Arena index of a node within its owning context.
pub type NodeId = usize;

/// Kinds of declared entities tracked in the normalized tree.
///
/// The preprocessor-directive variants exist for forward compatibility;
/// the tree builder does not emit them today.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NodeKind {
    Namespace,
    Class,
    Struct,
    Union,
    Enum,
    Function,
    Method,
    Field,
    Typedef,
    TypeAlias,
    Parameter,
    TemplateParam,
    BaseClass,
    Variable,
    ReturnType,
    FunctionPointer,
    Enumerator,
    Macro,
    ConditionalCompilation,
    #[default]
    Unknown,
    If,
    Elif,
    Ifdef,
    Ifndef,
    Else,
    Elifdef,
    Elifndef,
    Endif,
    Define,
}

/// Member access of a declaration.
#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, FromPrimitive)]
pub enum Access {
    #[default]
    None = ffi::CX_CXXInvalidAccessSpecifier,
    Public = ffi::CX_CXXPublic,
    Protected = ffi::CX_CXXProtected,
    Private = ffi::CX_CXXPrivate,
}

/// Storage class of a declaration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Storage {
    #[default]
    None,
    Static,
    Extern,
    Register,
    Auto,
}

/// Constness of a declaration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConstQualifier {
    #[default]
    None,
    Const,
    ConstExpr,
}

/// Virtual dispatch qualifier of a method declaration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum VirtualQualifier {
    #[default]
    None,
    Virtual,
    PureVirtual,
    Override,
}

/// In-memory record for one declared entity.
#[derive(Clone, Debug, Default)]
pub struct ApiNode {
    pub kind: NodeKind,
    pub name: String,
    /// Dotted path from the translation-unit root to this node.
    pub qualified_name: String,
    /// Stable unique identifier assigned by the front-end.
    pub usr: String,
    /// Spelled type after modifier peeling.
    pub type_name: String,
    /// Canonical underlying type; for functions, the signature string
    /// used for overload discrimination.
    pub data_type: String,
    /// Literal initialiser, enumerator value or bit-field width.
    pub value: String,
    pub access: Access,
    pub storage: Storage,
    pub const_qualifier: ConstQualifier,
    pub virtual_qualifier: VirtualQualifier,
    pub calling_convention: String,
    pub is_inline: bool,
    pub is_pointer: bool,
    pub is_reference: bool,
    pub is_rvalue_ref: bool,
    pub is_packed: bool,
    /// Child nodes in source declaration order.
    pub children: Vec<NodeId>,
    /// Conditional-compilation attributes; carried for forward
    /// compatibility, never populated by the tree builder.
    pub condition_string: String,
    pub body_string: String,
    pub hash: String,
    pub is_active: bool,
}

// ===== impl NodeKind =====

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Namespace => "Namespace",
            NodeKind::Class => "Class",
            NodeKind::Struct => "Struct",
            NodeKind::Union => "Union",
            NodeKind::Enum => "Enum",
            NodeKind::Function => "Function",
            NodeKind::Method => "Method",
            NodeKind::Field => "Field",
            NodeKind::Typedef => "Typedef",
            NodeKind::TypeAlias => "TypeAlias",
            NodeKind::Parameter => "Parameter",
            NodeKind::TemplateParam => "TemplateParam",
            NodeKind::BaseClass => "BaseClass",
            NodeKind::Variable => "Variable",
            NodeKind::ReturnType => "ReturnType",
            NodeKind::FunctionPointer => "FunctionPointer",
            NodeKind::Enumerator => "Enumerator",
            NodeKind::Macro => "Macro",
            NodeKind::ConditionalCompilation => "ConditionalCompilation",
            NodeKind::Unknown => "Unknown",
            NodeKind::If => "If",
            NodeKind::Elif => "Elif",
            NodeKind::Ifdef => "Ifdef",
            NodeKind::Ifndef => "Ifndef",
            NodeKind::Else => "Else",
            NodeKind::Elifdef => "Elifdef",
            NodeKind::Elifndef => "Elifndef",
            NodeKind::Endif => "Endif",
            NodeKind::Define => "Define",
        }
    }

    /// Kinds whose diff identity is the signature rather than the
    /// qualified name.
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            NodeKind::Function | NodeKind::Method | NodeKind::FunctionPointer
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== impl Access =====

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::None => "",
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}

// ===== impl Storage =====

impl Storage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Storage::None => "",
            Storage::Static => "static",
            Storage::Extern => "extern",
            Storage::Register => "register",
            Storage::Auto => "auto",
        }
    }
}

// ===== impl ConstQualifier =====

impl ConstQualifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstQualifier::None => "",
            ConstQualifier::Const => "const",
            ConstQualifier::ConstExpr => "constexpr",
        }
    }
}

// ===== impl VirtualQualifier =====

impl VirtualQualifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            VirtualQualifier::None => "",
            VirtualQualifier::Virtual => "virtual",
            VirtualQualifier::PureVirtual => "pure virtual",
            VirtualQualifier::Override => "override",
        }
    }
}

// ===== impl ApiNode =====

impl ApiNode {
    pub fn new(
        kind: NodeKind,
        name: impl Into<String>,
        qualified_name: impl Into<String>,
    ) -> ApiNode {
        ApiNode {
            kind,
            name: name.into(),
            qualified_name: qualified_name.into(),
            ..Default::default()
        }
    }

    /// Key under which the node registers in the context map. Nodes the
    /// front-end gave no USR synthesise a key from their qualified name.
    pub fn unique_key(&self) -> String {
        if self.usr.is_empty() {
            format!("qname:{}", self.qualified_name)
        } else {
            self.usr.clone()
        }
    }

    /// Key used to pair this node with its counterpart during diff.
    /// Function-like nodes pair by signature so that overloads stay
    /// distinct.
    pub fn match_key(&self) -> &str {
        if self.kind.is_function() {
            &self.data_type
        } else {
            &self.qualified_name
        }
    }
}
