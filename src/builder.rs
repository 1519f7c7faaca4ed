//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Tree construction from parsed translation units.
//!
//! The builder walks the declarations of the main file, dispatching on
//! the cursor kind, and projects each accepted declaration into the
//! owning [`NormalizedContext`]. A scope stack produces the dotted
//! qualified names; a node stack tracks ownership.

use num_traits::FromPrimitive;

use crate::context::NormalizedContext;
use crate::frontend::{Cursor, TranslationUnit, Type};
use crate::node::{
    Access, ApiNode, ConstQualifier, NodeId, NodeKind, Storage,
    VirtualQualifier,
};
use clang_sys as ffi;

/// Scope stack producing dotted fully-qualified names.
#[derive(Clone, Debug, Default)]
pub struct ScopePath {
    parts: Vec<String>,
}

impl ScopePath {
    pub fn new() -> ScopePath {
        ScopePath::default()
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.parts.push(name.into());
    }

    pub fn pop(&mut self) {
        self.parts.pop();
    }

    /// Current dotted path; empty when no scope is open.
    pub fn get(&self) -> String {
        self.parts.join(".")
    }

    /// Qualify a name against the current scope.
    pub fn qualify(&self, name: &str) -> String {
        if self.parts.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.get(), name)
        }
    }
}

/// Peel the outermost type modifiers off a type spelling.
///
/// Attempts per iteration, in order: qualifiers (`const`, `volatile`,
/// `restrict`), pointer, r-value reference, l-value reference,
/// parentheses (recorded as nothing) and array extents (recorded as
/// nothing). Returns the peeled modifier tokens joined outermost-first,
/// plus the terminal type.
pub fn unwrap_type(spelling: &str) -> (String, String) {
    let mut base = spelling.trim().to_string();
    let mut peeled: Vec<&'static str> = Vec::new();

    loop {
        let mut progressed = false;
        for qualifier in ["const", "volatile", "restrict"] {
            if let Some(rest) = strip_qualifier(&base, qualifier) {
                base = rest;
                peeled.push(qualifier);
                progressed = true;
                break;
            }
        }
        if progressed {
            continue;
        }

        if let Some(rest) = base.strip_suffix('*') {
            base = rest.trim().to_string();
            peeled.push("*");
            continue;
        }
        // `&&` has to be tried before `&`.
        if let Some(rest) = base.strip_suffix("&&") {
            base = rest.trim().to_string();
            peeled.push("&&");
            continue;
        }
        if let Some(rest) = base.strip_suffix('&') {
            base = rest.trim().to_string();
            peeled.push("&");
            continue;
        }
        if let Some(inner) = strip_parens(&base) {
            base = inner;
            continue;
        }
        if base.ends_with(']') {
            if let Some(open) = base.rfind('[') {
                base = base[..open].trim().to_string();
                continue;
            }
        }
        break;
    }

    peeled.reverse();
    (peeled.join(" "), base)
}

fn strip_qualifier(spelling: &str, qualifier: &str) -> Option<String> {
    if let Some(rest) = spelling.strip_prefix(qualifier) {
        if rest.starts_with(' ') {
            return Some(rest.trim().to_string());
        }
    }
    if let Some(rest) = spelling.strip_suffix(qualifier) {
        // Trailing qualifiers bind to a pointer or reference, as in
        // `int *const`.
        if rest.ends_with(' ') || rest.ends_with('*') || rest.ends_with('&')
        {
            return Some(rest.trim().to_string());
        }
    }
    None
}

/// Strip one pair of parentheses wrapping the whole spelling.
fn strip_parens(spelling: &str) -> Option<String> {
    if !spelling.starts_with('(') || !spelling.ends_with(')') {
        return None;
    }
    let mut depth = 0i32;
    for (i, c) in spelling.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
                if depth == 0 && i + 1 != spelling.len() {
                    return None;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    Some(spelling[1..spelling.len() - 1].trim().to_string())
}

/// Scrub file-position markers out of anonymous type spellings so the
/// same declaration spells identically in the base and head revisions.
pub fn sanitize_type(spelling: &str) -> String {
    let mut out = spelling.to_string();
    for marker in ["(unnamed", "(anonymous"] {
        let mut from = 0;
        while let Some(start) = out[from..].find(marker) {
            let start = from + start;
            match out[start..].find(')') {
                Some(close) => {
                    if out[start..start + close].contains(" at ") {
                        out.replace_range(
                            start..start + close + 1,
                            "(anonymous)",
                        );
                    }
                    from = start + 1;
                }
                None => break,
            }
        }
    }
    out
}

/// Walks the declarations of a parsed translation unit and populates a
/// normalized context.
pub struct TreeBuilder<'a> {
    ctx: &'a mut NormalizedContext,
    scope: ScopePath,
    parents: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(ctx: &'a mut NormalizedContext) -> TreeBuilder<'a> {
        TreeBuilder {
            ctx,
            scope: ScopePath::new(),
            parents: Vec::new(),
        }
    }

    /// Project every declaration of the main file into the context.
    pub fn build(&mut self, tu: &TranslationUnit<'_>) {
        for child in tu.cursor().children() {
            self.dispatch(child);
        }
    }

    fn dispatch(&mut self, cursor: Cursor<'_>) {
        if !cursor.is_in_main_file() {
            return;
        }

        match cursor.kind() {
            ffi::CXCursor_Namespace => self.build_namespace(cursor),
            ffi::CXCursor_ClassDecl | ffi::CXCursor_ClassTemplate => {
                self.build_record(cursor, NodeKind::Class)
            }
            ffi::CXCursor_StructDecl => {
                self.build_record(cursor, NodeKind::Struct)
            }
            ffi::CXCursor_UnionDecl => {
                self.build_record(cursor, NodeKind::Union)
            }
            ffi::CXCursor_EnumDecl => self.build_enum(cursor),
            ffi::CXCursor_EnumConstantDecl => self.build_enumerator(cursor),
            ffi::CXCursor_FunctionDecl | ffi::CXCursor_FunctionTemplate => {
                self.build_function(cursor, NodeKind::Function)
            }
            ffi::CXCursor_CXXMethod
            | ffi::CXCursor_Constructor
            | ffi::CXCursor_Destructor => {
                self.build_function(cursor, NodeKind::Method)
            }
            ffi::CXCursor_FieldDecl => self.build_field(cursor),
            ffi::CXCursor_VarDecl => self.build_variable(cursor),
            ffi::CXCursor_TypedefDecl => {
                self.build_typedef(cursor, NodeKind::Typedef)
            }
            ffi::CXCursor_TypeAliasDecl => {
                self.build_typedef(cursor, NodeKind::TypeAlias)
            }
            ffi::CXCursor_CXXBaseSpecifier => self.build_base(cursor),
            ffi::CXCursor_TemplateTypeParameter
            | ffi::CXCursor_NonTypeTemplateParameter
            | ffi::CXCursor_TemplateTemplateParameter => {
                self.build_template_param(cursor)
            }
            ffi::CXCursor_MacroDefinition => self.build_macro(cursor),
            // Transparent containers: recurse without opening a scope.
            ffi::CXCursor_LinkageSpec | ffi::CXCursor_UnexposedDecl => {
                for child in cursor.children() {
                    self.dispatch(child);
                }
            }
            // Handled through their parent, or irrelevant to the
            // declared surface.
            ffi::CXCursor_ParmDecl
            | ffi::CXCursor_CXXAccessSpecifier
            | ffi::CXCursor_MacroExpansion
            | ffi::CXCursor_InclusionDirective => {}
            kind => {
                log::debug!(
                    "skipping unhandled declaration kind {} ('{}')",
                    kind,
                    cursor.spelling()
                );
            }
        }
    }

    /// Register a node under the current parent, or as a root.
    fn register(&mut self, node: ApiNode) -> NodeId {
        let id = self.ctx.add_node(node);
        match self.parents.last() {
            Some(&parent) => self.ctx.node_mut(parent).children.push(id),
            None => self.ctx.add_root(id),
        }
        id
    }

    /// Positional placeholder for unnamed entities, unique within the
    /// parent.
    fn placeholder(&self, prefix: &str) -> String {
        let index = match self.parents.last() {
            Some(&parent) => self.ctx.node(parent).children.len(),
            None => self.ctx.roots().len(),
        };
        format!("{}{}", prefix, index)
    }

    fn node_name(&self, cursor: &Cursor<'_>, prefix: &str) -> String {
        let spelling = cursor.spelling();
        if spelling.is_empty() || cursor.is_anonymous() {
            self.placeholder(prefix)
        } else {
            spelling
        }
    }

    fn new_node(
        &self,
        kind: NodeKind,
        name: &str,
        cursor: &Cursor<'_>,
    ) -> ApiNode {
        let mut node = ApiNode::new(kind, name, self.scope.qualify(name));
        node.usr = cursor.usr();
        node.access = Access::from_i32(cursor.access()).unwrap_or_default();
        node.storage = storage_class(cursor.storage());
        node
    }

    /// Fill the type attributes of a node from its declared type.
    fn fill_type(&self, node: &mut ApiNode, ty: Type<'_>) {
        let spelled = sanitize_type(&ty.spelling());
        node.type_name = unwrap_type(&spelled).1;
        node.data_type = sanitize_type(&ty.canonical().spelling());
        match ty.kind() {
            ffi::CXType_Pointer => node.is_pointer = true,
            ffi::CXType_LValueReference => node.is_reference = true,
            ffi::CXType_RValueReference => node.is_rvalue_ref = true,
            _ => {}
        }
        if ty.is_const_qualified() {
            node.const_qualifier = ConstQualifier::Const;
        }
    }

    fn build_namespace(&mut self, cursor: Cursor<'_>) {
        let name = self.node_name(&cursor, "anon");

        // Re-opened namespaces share a USR and merge into the node built
        // for the first occurrence.
        let existing = self
            .ctx
            .lookup(&cursor.usr())
            .filter(|&id| self.ctx.node(id).kind == NodeKind::Namespace);

        let id = match existing {
            Some(id) => id,
            None => {
                let node = self.new_node(NodeKind::Namespace, &name, &cursor);
                self.register(node)
            }
        };

        self.scope.push(&name);
        self.parents.push(id);
        for child in cursor.children() {
            self.dispatch(child);
        }
        self.parents.pop();
        self.scope.pop();
    }

    fn build_record(&mut self, cursor: Cursor<'_>, kind: NodeKind) {
        if !cursor.is_definition() {
            log::debug!(
                "skipping forward declaration of '{}'",
                cursor.spelling()
            );
            return;
        }

        let name = self.node_name(&cursor, "anon");
        let mut node = self.new_node(kind, &name, &cursor);
        node.is_packed = cursor.has_child_of_kind(ffi::CXCursor_PackedAttr);
        let id = self.register(node);

        self.scope.push(&name);
        self.parents.push(id);
        for child in cursor.children() {
            self.dispatch(child);
        }
        self.parents.pop();
        self.scope.pop();
    }

    fn build_enum(&mut self, cursor: Cursor<'_>) {
        if !cursor.is_definition() {
            log::debug!(
                "skipping forward declaration of '{}'",
                cursor.spelling()
            );
            return;
        }

        let name = self.node_name(&cursor, "anon");
        let mut node = self.new_node(NodeKind::Enum, &name, &cursor);
        let underlying = cursor.enum_underlying_type();
        if underlying.is_valid() {
            node.type_name = sanitize_type(&underlying.spelling());
        }
        let id = self.register(node);

        self.scope.push(&name);
        self.parents.push(id);
        for child in cursor.children() {
            self.dispatch(child);
        }
        self.parents.pop();
        self.scope.pop();
    }

    fn build_enumerator(&mut self, cursor: Cursor<'_>) {
        let name = cursor.spelling();
        let mut node = self.new_node(NodeKind::Enumerator, &name, &cursor);
        node.value = cursor.enum_value().to_string();
        self.register(node);
    }

    fn build_function(&mut self, cursor: Cursor<'_>, kind: NodeKind) {
        let name = cursor.spelling();
        let display = cursor.display_name();
        let mut node = self.new_node(kind, &name, &cursor);

        // Signature identity: name plus parameter types in declared
        // order. The return type is carried separately so a return-type
        // change reads as a modification, not a removal.
        node.data_type = if display.is_empty() {
            name.clone()
        } else {
            sanitize_type(&display)
        };
        let result = cursor.result_type();
        if result.is_valid() {
            node.type_name = sanitize_type(&result.spelling());
        }
        let fn_type = cursor.cursor_type();
        if fn_type.is_valid() {
            node.calling_convention =
                fn_type.calling_convention().as_str().to_string();
        }
        node.is_inline = cursor.is_inlined();
        if kind == NodeKind::Method {
            if cursor.is_pure_virtual() {
                node.virtual_qualifier = VirtualQualifier::PureVirtual;
            } else if cursor.has_child_of_kind(ffi::CXCursor_CXXOverrideAttr)
            {
                node.virtual_qualifier = VirtualQualifier::Override;
            } else if cursor.is_virtual() {
                node.virtual_qualifier = VirtualQualifier::Virtual;
            }
            if cursor.is_const_method() {
                node.const_qualifier = ConstQualifier::Const;
            }
        }
        let id = self.register(node);

        self.scope.push(&name);
        self.parents.push(id);

        // Synthesised children: the return type, then one node per
        // parameter in declared order.
        if result.is_valid() {
            let mut ret = ApiNode::new(
                NodeKind::ReturnType,
                "return",
                self.scope.qualify("return"),
            );
            ret.type_name = unwrap_type(&sanitize_type(&result.spelling())).1;
            ret.data_type =
                sanitize_type(&result.canonical().spelling());
            self.register(ret);
        }

        let mut params = cursor.arguments();
        if params.is_empty() {
            params = cursor
                .children()
                .into_iter()
                .filter(|child| child.kind() == ffi::CXCursor_ParmDecl)
                .collect();
        }
        for (index, param) in params.iter().enumerate() {
            self.build_parameter(param, index);
        }

        for child in cursor.children() {
            match child.kind() {
                ffi::CXCursor_TemplateTypeParameter
                | ffi::CXCursor_NonTypeTemplateParameter
                | ffi::CXCursor_TemplateTemplateParameter => {
                    self.dispatch(child)
                }
                _ => {}
            }
        }

        self.parents.pop();
        self.scope.pop();
    }

    fn build_parameter(&mut self, cursor: &Cursor<'_>, index: usize) {
        let spelling = cursor.spelling();
        let name = if spelling.is_empty() {
            format!("param{}", index)
        } else {
            spelling
        };
        let mut node = self.new_node(NodeKind::Parameter, &name, cursor);
        self.fill_type(&mut node, cursor.cursor_type());
        let id = self.register(node);
        self.attach_function_pointer(id, cursor.cursor_type());
    }

    fn build_field(&mut self, cursor: Cursor<'_>) {
        let spelling = cursor.spelling();
        let name = if spelling.is_empty() {
            self.placeholder("field")
        } else {
            spelling
        };
        let mut node = self.new_node(NodeKind::Field, &name, &cursor);
        self.fill_type(&mut node, cursor.cursor_type());
        if cursor.is_bit_field() {
            if let Some(width) = cursor.bit_width() {
                node.value = width.to_string();
            }
        }
        let id = self.register(node);
        self.attach_function_pointer(id, cursor.cursor_type());
    }

    fn build_variable(&mut self, cursor: Cursor<'_>) {
        let name = cursor.spelling();
        let mut node = self.new_node(NodeKind::Variable, &name, &cursor);
        self.fill_type(&mut node, cursor.cursor_type());
        if let Some(value) = cursor.evaluate() {
            node.value = value;
        }
        let id = self.register(node);
        self.attach_function_pointer(id, cursor.cursor_type());
    }

    fn build_typedef(&mut self, cursor: Cursor<'_>, kind: NodeKind) {
        let name = cursor.spelling();
        let mut node = self.new_node(kind, &name, &cursor);
        let underlying = cursor.underlying_typedef_type();
        if underlying.is_valid() {
            self.fill_type(&mut node, underlying);
        }
        let id = self.register(node);
        if underlying.is_valid() {
            self.attach_function_pointer(id, underlying);
        }
    }

    fn build_base(&mut self, cursor: Cursor<'_>) {
        let spelled = sanitize_type(&cursor.cursor_type().spelling());
        let mut node = self.new_node(NodeKind::BaseClass, &spelled, &cursor);
        node.data_type = spelled.clone();
        if cursor.is_virtual_base() {
            node.virtual_qualifier = VirtualQualifier::Virtual;
        }
        self.register(node);
    }

    fn build_template_param(&mut self, cursor: Cursor<'_>) {
        let spelling = cursor.spelling();
        let name = if spelling.is_empty() {
            self.placeholder("tparam")
        } else {
            spelling
        };
        let mut node = self.new_node(NodeKind::TemplateParam, &name, &cursor);
        if cursor.kind() == ffi::CXCursor_NonTypeTemplateParameter {
            self.fill_type(&mut node, cursor.cursor_type());
        }
        self.register(node);
    }

    fn build_macro(&mut self, cursor: Cursor<'_>) {
        if cursor.is_macro_builtin() {
            return;
        }

        let name = cursor.spelling();
        let mut node = self.new_node(NodeKind::Macro, &name, &cursor);
        // Replacement tokens; the first token is the macro name itself.
        let tokens = cursor.tokens();
        if tokens.len() > 1 {
            node.value = tokens[1..].join(" ");
        }
        self.register(node);
    }

    /// Attach a FunctionPointer child when the declared type resolves to
    /// a function prototype behind pointers or typedefs.
    fn attach_function_pointer(&mut self, parent: NodeId, ty: Type<'_>) {
        let mut proto = ty.canonical();
        while let Some(pointee) = proto.pointee() {
            proto = pointee;
        }
        if proto.kind() != ffi::CXType_FunctionProto
            && proto.kind() != ffi::CXType_FunctionNoProto
        {
            return;
        }

        let parent_qualified = self.ctx.node(parent).qualified_name.clone();
        let mut node = ApiNode::new(
            NodeKind::FunctionPointer,
            "function",
            format!("{}.function", parent_qualified),
        );
        node.data_type = sanitize_type(&proto.spelling());
        node.calling_convention =
            proto.calling_convention().as_str().to_string();
        let id = self.ctx.add_node(node);
        self.ctx.node_mut(parent).children.push(id);

        if let Some(result) = proto.result_type() {
            let mut ret = ApiNode::new(
                NodeKind::ReturnType,
                "return",
                format!("{}.function.return", parent_qualified),
            );
            ret.type_name = unwrap_type(&sanitize_type(&result.spelling())).1;
            ret.data_type = sanitize_type(&result.canonical().spelling());
            let rid = self.ctx.add_node(ret);
            self.ctx.node_mut(id).children.push(rid);
        }
        for (index, arg) in proto.arg_types().into_iter().enumerate() {
            let name = format!("param{}", index);
            let mut param = ApiNode::new(
                NodeKind::Parameter,
                &name,
                format!("{}.function.{}", parent_qualified, name),
            );
            param.type_name = unwrap_type(&sanitize_type(&arg.spelling())).1;
            param.data_type = sanitize_type(&arg.canonical().spelling());
            let pid = self.ctx.add_node(param);
            self.ctx.node_mut(id).children.push(pid);
        }
    }
}

fn storage_class(raw: ffi::CX_StorageClass) -> Storage {
    match raw {
        ffi::CX_SC_Static => Storage::Static,
        ffi::CX_SC_Extern | ffi::CX_SC_PrivateExtern => Storage::Extern,
        ffi::CX_SC_Register => Storage::Register,
        ffi::CX_SC_Auto => Storage::Auto,
        _ => Storage::None,
    }
}
