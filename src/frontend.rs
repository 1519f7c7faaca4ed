//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Safe wrappers over the libclang parsing front-end.
//!
//! The core consumes a narrow contract from libclang: iteration over the
//! declarations of a translation unit, per-declaration kind/USR/location
//! queries, type introspection and a main-file predicate. Everything the
//! tree builder needs goes through [`Cursor`] and [`Type`]; raw FFI stays
//! inside this module.

use bitflags::bitflags;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::ffi::CString;
use std::marker::PhantomData;
use std::os::raw::{c_int, c_uint, c_ulong};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::utils::*;
use clang_sys as ffi;

/// Handle to a front-end instance. Translation units borrow from it.
pub struct Index {
    raw: ffi::CXIndex,
}

bitflags! {
    /// Options to change translation-unit parsing behavior.
    pub struct ParseFlags: u32 {
        /// Keep the detailed preprocessing record, including macro
        /// definitions.
        const DETAILED_PREPROCESSING_RECORD =
            ffi::CXTranslationUnit_DetailedPreprocessingRecord as u32;

        /// The translation unit may be incomplete; suppress the semantic
        /// checks that only apply to complete programs.
        const INCOMPLETE = ffi::CXTranslationUnit_Incomplete as u32;

        /// Skip function bodies. Only the declared surface is analyzed.
        const SKIP_FUNCTION_BODIES =
            ffi::CXTranslationUnit_SkipFunctionBodies as u32;

        /// Do not stop processing after fatal errors.
        const KEEP_GOING = ffi::CXTranslationUnit_KeepGoing as u32;
    }
}

/// A parsed translation unit.
pub struct TranslationUnit<'a> {
    raw: ffi::CXTranslationUnit,
    _marker: PhantomData<&'a Index>,
}

/// A reference into the front-end's AST.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    raw: ffi::CXCursor,
    tu: &'a TranslationUnit<'a>,
}

/// A source-level type as exposed by the front-end.
#[derive(Clone, Copy)]
pub struct Type<'a> {
    raw: ffi::CXType,
    _marker: PhantomData<&'a TranslationUnit<'a>>,
}

/// A single front-end diagnostic.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
}

/// Front-end diagnostic severities.
#[repr(i32)]
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, FromPrimitive)]
pub enum DiagnosticSeverity {
    Ignored = ffi::CXDiagnostic_Ignored,
    Note = ffi::CXDiagnostic_Note,
    Warning = ffi::CXDiagnostic_Warning,
    Error = ffi::CXDiagnostic_Error,
    Fatal = ffi::CXDiagnostic_Fatal,
}

/// Calling conventions recognised by the front-end.
#[repr(i32)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive)]
pub enum CallingConv {
    Default = ffi::CXCallingConv_Default,
    C = ffi::CXCallingConv_C,
    X86StdCall = ffi::CXCallingConv_X86StdCall,
    X86FastCall = ffi::CXCallingConv_X86FastCall,
    X86ThisCall = ffi::CXCallingConv_X86ThisCall,
    X86Pascal = ffi::CXCallingConv_X86Pascal,
    Aapcs = ffi::CXCallingConv_AAPCS,
    AapcsVfp = ffi::CXCallingConv_AAPCS_VFP,
    X86RegCall = ffi::CXCallingConv_X86RegCall,
    IntelOclBicc = ffi::CXCallingConv_IntelOclBicc,
    Win64 = ffi::CXCallingConv_Win64,
    X86_64SysV = ffi::CXCallingConv_X86_64SysV,
    X86VectorCall = ffi::CXCallingConv_X86VectorCall,
    Swift = ffi::CXCallingConv_Swift,
    PreserveMost = ffi::CXCallingConv_PreserveMost,
    PreserveAll = ffi::CXCallingConv_PreserveAll,
    Invalid = ffi::CXCallingConv_Invalid,
    Unexposed = ffi::CXCallingConv_Unexposed,
}

// ===== impl Index =====

impl Index {
    /// Create a front-end instance.
    ///
    /// The shared library is resolved once, when the first index is
    /// created.
    pub fn new() -> Result<Index> {
        static LOADED: OnceLock<std::result::Result<(), String>> =
            OnceLock::new();

        if let Err(msg) = LOADED.get_or_init(ffi::load) {
            return Err(Error::other(msg));
        }

        let raw = unsafe { ffi::clang_createIndex(0, 0) };
        if raw.is_null() {
            return Err(Error::other("failed to create front-end index"));
        }

        Ok(Index { raw })
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        unsafe { ffi::clang_disposeIndex(self.raw) };
    }
}

// ===== impl TranslationUnit =====

impl<'a> TranslationUnit<'a> {
    /// Parse the given header from disk.
    pub fn parse<P: AsRef<Path>>(
        index: &'a Index,
        path: P,
        args: &[String],
        options: ParseFlags,
    ) -> Result<TranslationUnit<'a>> {
        let path = path.as_ref();
        let filename = path
            .to_str()
            .ok_or_else(|| Error::other("non-UTF-8 header path"))
            .map(|s| CString::new(s).unwrap())?;
        Self::parse_raw(index, filename, args, None, options, path)
    }

    /// Parse an in-memory buffer registered under the given file name.
    pub fn parse_str(
        index: &'a Index,
        name: &str,
        source: &str,
        args: &[String],
        options: ParseFlags,
    ) -> Result<TranslationUnit<'a>> {
        let filename = CString::new(name).unwrap();
        Self::parse_raw(
            index,
            filename,
            args,
            Some(source),
            options,
            Path::new(name),
        )
    }

    fn parse_raw(
        index: &'a Index,
        filename: CString,
        args: &[String],
        unsaved: Option<&str>,
        options: ParseFlags,
        display: &Path,
    ) -> Result<TranslationUnit<'a>> {
        let args_cstr = args
            .iter()
            .map(|arg| CString::new(arg.as_str()).unwrap())
            .collect::<Vec<_>>();
        let args_ptr =
            args_cstr.iter().map(|arg| arg.as_ptr()).collect::<Vec<_>>();

        let contents_cstr;
        let mut unsaved_files = Vec::new();
        if let Some(contents) = unsaved {
            contents_cstr = CString::new(contents).unwrap();
            unsaved_files.push(ffi::CXUnsavedFile {
                Filename: filename.as_ptr(),
                Contents: contents_cstr.as_ptr(),
                Length: contents.len() as c_ulong,
            });
        }

        let mut tu = std::ptr::null_mut();
        let ret = unsafe {
            ffi::clang_parseTranslationUnit2(
                index.raw,
                filename.as_ptr(),
                args_ptr.as_ptr(),
                args_ptr.len() as c_int,
                unsaved_files.as_mut_ptr(),
                unsaved_files.len() as c_uint,
                options.bits() as c_int,
                &mut tu,
            )
        };
        if ret != ffi::CXError_Success {
            return Err(Error::from_parse(ret, display));
        }

        Ok(TranslationUnit {
            raw: tu,
            _marker: PhantomData,
        })
    }

    /// Cursor for the root of the translation unit.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            raw: unsafe { ffi::clang_getTranslationUnitCursor(self.raw) },
            tu: self,
        }
    }

    /// Diagnostics emitted while parsing.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let count = unsafe { ffi::clang_getNumDiagnostics(self.raw) };
        let mut out = Vec::with_capacity(count as usize);
        for i in 0..count {
            let raw = unsafe { ffi::clang_getDiagnostic(self.raw, i) };
            let severity = unsafe { ffi::clang_getDiagnosticSeverity(raw) };
            let message = cxstring_to_string(unsafe {
                ffi::clang_getDiagnosticSpelling(raw)
            });
            unsafe { ffi::clang_disposeDiagnostic(raw) };
            out.push(Diagnostic {
                severity: DiagnosticSeverity::from_i32(severity)
                    .unwrap_or(DiagnosticSeverity::Warning),
                message,
            });
        }
        out
    }
}

impl Drop for TranslationUnit<'_> {
    fn drop(&mut self) {
        unsafe { ffi::clang_disposeTranslationUnit(self.raw) };
    }
}

// ===== impl Cursor =====

impl<'a> Cursor<'a> {
    /// Kind of the pointed-to declaration.
    pub fn kind(&self) -> ffi::CXCursorKind {
        unsafe { ffi::clang_getCursorKind(self.raw) }
    }

    /// Name of the declared entity.
    pub fn spelling(&self) -> String {
        cxstring_to_string(unsafe { ffi::clang_getCursorSpelling(self.raw) })
    }

    /// Name of the entity including its parameter types, when it has any.
    pub fn display_name(&self) -> String {
        cxstring_to_string(unsafe {
            ffi::clang_getCursorDisplayName(self.raw)
        })
    }

    /// Unified Symbol Reference of the declaration.
    pub fn usr(&self) -> String {
        cxstring_to_string(unsafe { ffi::clang_getCursorUSR(self.raw) })
    }

    /// Whether the declaration originates from the main file of its
    /// translation unit.
    pub fn is_in_main_file(&self) -> bool {
        let location = unsafe { ffi::clang_getCursorLocation(self.raw) };
        (unsafe { ffi::clang_Location_isFromMainFile(location) } != 0)
    }

    pub fn is_definition(&self) -> bool {
        (unsafe { ffi::clang_isCursorDefinition(self.raw) } != 0)
    }

    /// Type of the declared entity.
    pub fn cursor_type(&self) -> Type<'a> {
        Type::from_raw(unsafe { ffi::clang_getCursorType(self.raw) })
    }

    /// Underlying type of a typedef or type-alias declaration.
    pub fn underlying_typedef_type(&self) -> Type<'a> {
        Type::from_raw(unsafe {
            ffi::clang_getTypedefDeclUnderlyingType(self.raw)
        })
    }

    /// Result type of a function-like declaration.
    pub fn result_type(&self) -> Type<'a> {
        Type::from_raw(unsafe { ffi::clang_getCursorResultType(self.raw) })
    }

    /// Integer type backing an enum declaration.
    pub fn enum_underlying_type(&self) -> Type<'a> {
        Type::from_raw(unsafe {
            ffi::clang_getEnumDeclIntegerType(self.raw)
        })
    }

    /// Value of an enumerator declaration.
    pub fn enum_value(&self) -> i64 {
        unsafe { ffi::clang_getEnumConstantDeclValue(self.raw) }
    }

    /// C++ member access of the declaration.
    pub fn access(&self) -> ffi::CX_CXXAccessSpecifier {
        unsafe { ffi::clang_getCXXAccessSpecifier(self.raw) }
    }

    /// Storage class of the declaration.
    pub fn storage(&self) -> ffi::CX_StorageClass {
        unsafe { ffi::clang_Cursor_getStorageClass(self.raw) }
    }

    pub fn is_virtual(&self) -> bool {
        (unsafe { ffi::clang_CXXMethod_isVirtual(self.raw) } != 0)
    }

    pub fn is_pure_virtual(&self) -> bool {
        (unsafe { ffi::clang_CXXMethod_isPureVirtual(self.raw) } != 0)
    }

    pub fn is_const_method(&self) -> bool {
        (unsafe { ffi::clang_CXXMethod_isConst(self.raw) } != 0)
    }

    pub fn is_virtual_base(&self) -> bool {
        (unsafe { ffi::clang_isVirtualBase(self.raw) } != 0)
    }

    pub fn is_inlined(&self) -> bool {
        (unsafe { ffi::clang_Cursor_isFunctionInlined(self.raw) } != 0)
    }

    pub fn is_anonymous(&self) -> bool {
        (unsafe { ffi::clang_Cursor_isAnonymous(self.raw) } != 0)
    }

    pub fn is_bit_field(&self) -> bool {
        (unsafe { ffi::clang_Cursor_isBitField(self.raw) } != 0)
    }

    /// Width of a bit-field declaration.
    pub fn bit_width(&self) -> Option<i32> {
        let width = unsafe { ffi::clang_getFieldDeclBitWidth(self.raw) };
        if width < 0 {
            None
        } else {
            Some(width)
        }
    }

    pub fn is_macro_builtin(&self) -> bool {
        (unsafe { ffi::clang_Cursor_isMacroBuiltin(self.raw) } != 0)
    }

    /// Declared parameters of a function-like declaration, in order.
    /// Empty for declarations the front-end cannot enumerate directly
    /// (e.g. function templates).
    pub fn arguments(&self) -> Vec<Cursor<'a>> {
        let count = unsafe { ffi::clang_Cursor_getNumArguments(self.raw) };
        if count < 0 {
            return Vec::new();
        }
        (0..count as c_uint)
            .map(|i| Cursor {
                raw: unsafe { ffi::clang_Cursor_getArgument(self.raw, i) },
                tu: self.tu,
            })
            .collect()
    }

    /// Direct children of the cursor, in source order.
    pub fn children(&self) -> Vec<Cursor<'a>> {
        extern "C" fn collect(
            cursor: ffi::CXCursor,
            _parent: ffi::CXCursor,
            data: ffi::CXClientData,
        ) -> ffi::CXChildVisitResult {
            let raws = unsafe { &mut *(data as *mut Vec<ffi::CXCursor>) };
            raws.push(cursor);
            ffi::CXChildVisit_Continue
        }

        let mut raws: Vec<ffi::CXCursor> = Vec::new();
        unsafe {
            ffi::clang_visitChildren(
                self.raw,
                collect,
                &mut raws as *mut _ as ffi::CXClientData,
            )
        };
        raws.into_iter()
            .map(|raw| Cursor { raw, tu: self.tu })
            .collect()
    }

    pub fn has_child_of_kind(&self, kind: ffi::CXCursorKind) -> bool {
        self.children().iter().any(|child| child.kind() == kind)
    }

    /// Constant-evaluate the initialiser of the declaration, if the
    /// front-end can.
    pub fn evaluate(&self) -> Option<String> {
        let result = unsafe { ffi::clang_Cursor_Evaluate(self.raw) };
        if result.is_null() {
            return None;
        }

        let kind = unsafe { ffi::clang_EvalResult_getKind(result) };
        let out = match kind {
            ffi::CXEval_Int => Some(
                unsafe { ffi::clang_EvalResult_getAsLongLong(result) }
                    .to_string(),
            ),
            ffi::CXEval_Float => Some(
                unsafe { ffi::clang_EvalResult_getAsDouble(result) }
                    .to_string(),
            ),
            ffi::CXEval_StrLiteral
            | ffi::CXEval_ObjCStrLiteral
            | ffi::CXEval_CFStr => char_ptr_to_opt_string(unsafe {
                ffi::clang_EvalResult_getAsStr(result)
            }),
            _ => None,
        };
        unsafe { ffi::clang_EvalResult_dispose(result) };
        out
    }

    /// Spellings of the tokens covered by the cursor's extent.
    pub fn tokens(&self) -> Vec<String> {
        let range = unsafe { ffi::clang_getCursorExtent(self.raw) };
        let mut tokens = std::ptr::null_mut();
        let mut count = 0;
        unsafe {
            ffi::clang_tokenize(self.tu.raw, range, &mut tokens, &mut count)
        };

        let mut out = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let token = unsafe { *tokens.add(i) };
            out.push(cxstring_to_string(unsafe {
                ffi::clang_getTokenSpelling(self.tu.raw, token)
            }));
        }
        unsafe { ffi::clang_disposeTokens(self.tu.raw, tokens, count) };
        out
    }
}

// ===== impl Type =====

impl<'a> Type<'a> {
    fn from_raw(raw: ffi::CXType) -> Type<'a> {
        Type {
            raw,
            _marker: PhantomData,
        }
    }

    pub fn kind(&self) -> ffi::CXTypeKind {
        self.raw.kind
    }

    pub fn is_valid(&self) -> bool {
        self.raw.kind != ffi::CXType_Invalid
    }

    /// Spelling of the type as written in the source.
    pub fn spelling(&self) -> String {
        cxstring_to_string(unsafe { ffi::clang_getTypeSpelling(self.raw) })
    }

    /// Canonical (typedef-free) form of the type.
    pub fn canonical(&self) -> Type<'a> {
        Type::from_raw(unsafe { ffi::clang_getCanonicalType(self.raw) })
    }

    /// Pointee of a pointer or reference type.
    pub fn pointee(&self) -> Option<Type<'a>> {
        let pointee =
            Type::from_raw(unsafe { ffi::clang_getPointeeType(self.raw) });
        if pointee.is_valid() {
            Some(pointee)
        } else {
            None
        }
    }

    /// Result type of a function type.
    pub fn result_type(&self) -> Option<Type<'a>> {
        let result =
            Type::from_raw(unsafe { ffi::clang_getResultType(self.raw) });
        if result.is_valid() {
            Some(result)
        } else {
            None
        }
    }

    /// Parameter types of a function type, in declared order.
    pub fn arg_types(&self) -> Vec<Type<'a>> {
        let count = unsafe { ffi::clang_getNumArgTypes(self.raw) };
        if count < 0 {
            return Vec::new();
        }
        (0..count as c_uint)
            .map(|i| {
                Type::from_raw(unsafe { ffi::clang_getArgType(self.raw, i) })
            })
            .collect()
    }

    pub fn is_const_qualified(&self) -> bool {
        (unsafe { ffi::clang_isConstQualifiedType(self.raw) } != 0)
    }

    /// Calling convention of a function type.
    pub fn calling_convention(&self) -> CallingConv {
        let raw =
            unsafe { ffi::clang_getFunctionTypeCallingConv(self.raw) };
        CallingConv::from_i32(raw).unwrap_or(CallingConv::Unexposed)
    }
}

// ===== impl CallingConv =====

impl CallingConv {
    /// Report spelling of the convention; the default and unexposed
    /// conventions spell as the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallingConv::C => "cdecl",
            CallingConv::X86StdCall => "stdcall",
            CallingConv::X86FastCall => "fastcall",
            CallingConv::X86ThisCall => "thiscall",
            CallingConv::X86Pascal => "pascal",
            CallingConv::Aapcs => "aapcs",
            CallingConv::AapcsVfp => "aapcs-vfp",
            CallingConv::X86RegCall => "regcall",
            CallingConv::IntelOclBicc => "intel-ocl-bicc",
            CallingConv::Win64 => "win64",
            CallingConv::X86_64SysV => "sysv64",
            CallingConv::X86VectorCall => "vectorcall",
            CallingConv::Swift => "swift",
            CallingConv::PreserveMost => "preserve-most",
            CallingConv::PreserveAll => "preserve-all",
            CallingConv::Default
            | CallingConv::Invalid
            | CallingConv::Unexposed => "",
        }
    }
}
