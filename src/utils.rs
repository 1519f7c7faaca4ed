//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::ffi::CStr;
use std::os::raw::c_char;

use clang_sys as ffi;

/// Convert an owned CXString into an owned string, disposing the original.
pub(crate) fn cxstring_to_string(raw: ffi::CXString) -> String {
    let ptr = unsafe { ffi::clang_getCString(raw) };
    let out = if ptr.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    };
    unsafe { ffi::clang_disposeString(raw) };
    out
}

/// Convert C String to owned string.
pub(crate) fn char_ptr_to_string(c_str: *const c_char) -> String {
    unsafe { CStr::from_ptr(c_str).to_string_lossy().into_owned() }
}

/// Convert C String to optional owned string.
pub(crate) fn char_ptr_to_opt_string(c_str: *const c_char) -> Option<String> {
    if c_str.is_null() {
        None
    } else {
        Some(char_ptr_to_string(c_str))
    }
}
