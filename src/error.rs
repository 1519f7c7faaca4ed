//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::path::Path;

use clang_sys as ffi;

/// A convenience wrapper around `Result` for `armor::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by the parsing front-end or the report pipeline.
#[derive(Debug, Eq, PartialEq)]
pub struct Error {
    pub errcode: ffi::CXErrorCode,
    pub msg: Option<String>,
    pub path: Option<String>,
}

impl Error {
    /// Decorate a libclang error code with the path of the translation unit
    /// that failed to parse.
    pub fn from_parse<P: AsRef<Path>>(errcode: ffi::CXErrorCode, path: P) -> Error {
        let msg = match errcode {
            ffi::CXError_Failure => "generic front-end failure",
            ffi::CXError_Crashed => "front-end crashed while parsing",
            ffi::CXError_InvalidArguments => "invalid front-end arguments",
            ffi::CXError_ASTReadError => "AST deserialization error",
            _ => "unknown front-end error",
        };

        Self {
            errcode,
            msg: Some(msg.to_string()),
            path: Some(path.as_ref().display().to_string()),
        }
    }

    /// Decorate an I/O error with the path of the file being written.
    pub fn io<P: AsRef<Path>>(err: std::io::Error, path: P) -> Error {
        Self {
            msg: Some(err.to_string()),
            path: Some(path.as_ref().display().to_string()),
            ..Default::default()
        }
    }

    pub fn other(msg: &str) -> Error {
        Self {
            msg: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl Default for Error {
    fn default() -> Self {
        Self {
            errcode: ffi::CXError_Failure,
            msg: None,
            path: None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.msg, &self.path) {
            (Some(msg), Some(path)) => write!(f, "{}: {}", path, msg),
            (Some(msg), None) => write!(f, "{}", msg),
            _ => write!(f, "Unknown error: {}", self.errcode),
        }
    }
}

impl std::error::Error for Error {}
