//! C-compatible FFI API for cross-language bindings.
//!
//! The three entry points mirror the service's derived operations so that
//! host templating layers can render, save and download Arabic PDFs without
//! linking against Rust types.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names.
//!
//! ## Configuration
//! Every generating function takes an optional `config_json`: a
//! null-terminated JSON object with the same keys as [`ConfigOverrides`]
//! (`engine`, `page_format`, `orientation`, `margin_top`, ...). Pass `NULL`
//! for the defaults.
//!
//! ## Memory management
//! - Buffers returned by `arabic_pdf_*` functions are allocated on the Rust heap.
//! - Callers **must** free them with `arabic_pdf_free_buffer` / `arabic_pdf_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int` (0 = success, non-zero = error).
//! - Error details can be retrieved via `arabic_pdf_last_error`.
//!
//! ## Thread safety
//! - `arabic_pdf_last_error` uses a thread-local, so it is safe to call from
//!   multiple threads.
//!
//! ## Usage from Go (cgo)
//! ```go
//! // #cgo LDFLAGS: -larabic_pdf
//! // #include <stdint.h>
//! // extern int arabic_pdf_output(const uint8_t* html, uint32_t html_len,
//! //                              const char* config_json,
//! //                              uint8_t** out_buf, uint32_t* out_len);
//! // extern void arabic_pdf_free_buffer(uint8_t* buf, uint32_t len);
//! // extern const char* arabic_pdf_last_error();
//! import "C"
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::ptr;
use std::slice;

use crate::config::ConfigOverrides;
use crate::service::{ArabicPdfService, GenerateOptions};

/// Null pointer argument.
const ERR_NULL: c_int = 1;
/// Input was not valid UTF-8.
const ERR_UTF8: c_int = 2;
/// `config_json` could not be parsed.
const ERR_CONFIG: c_int = 3;
/// Rendering or writing failed.
const ERR_RENDER: c_int = 4;
/// The output does not fit a `u32` length.
const ERR_TOO_LARGE: c_int = 5;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Borrow `len` bytes at `ptr` as UTF-8.
///
/// # Safety
/// `ptr` must point to `len` valid bytes.
unsafe fn str_from_raw<'a>(ptr: *const u8, len: u32) -> Result<&'a str, c_int> {
    let bytes = slice::from_raw_parts(ptr, len as usize);
    std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8: {e}"));
        ERR_UTF8
    })
}

/// Borrow a null-terminated string.
///
/// # Safety
/// `s` must be non-null and point to a valid null-terminated string.
unsafe fn str_from_c<'a>(s: *const c_char) -> Result<&'a str, c_int> {
    CStr::from_ptr(s).to_str().map_err(|e| {
        set_last_error(&format!("Invalid UTF-8: {e}"));
        ERR_UTF8
    })
}

/// Build a service from an optional JSON configuration.
///
/// # Safety
/// `config_json`, if non-null, must point to a valid null-terminated string.
unsafe fn service_from_c(config_json: *const c_char) -> Result<ArabicPdfService, c_int> {
    if config_json.is_null() {
        return Ok(ArabicPdfService::default());
    }
    let json = str_from_c(config_json)?;
    ConfigOverrides::from_json(json)
        .and_then(ArabicPdfService::new)
        .map_err(|e| {
            set_last_error(&e.to_string());
            ERR_CONFIG
        })
}

fn buffer_len(len: usize) -> Result<u32, c_int> {
    u32::try_from(len).map_err(|_| {
        set_last_error(&format!("Output of {len} bytes exceeds the 4 GiB buffer limit"));
        ERR_TOO_LARGE
    })
}

/// Hand `bytes` to the caller as a heap buffer. Nothing is written when the
/// length does not fit `*out_len`.
///
/// # Safety
/// `out_buf` and `out_len` must be valid pointers.
unsafe fn write_buffer(bytes: Vec<u8>, out_buf: *mut *mut u8, out_len: *mut u32) -> Result<(), c_int> {
    let len = buffer_len(bytes.len())?;
    let raw = Box::into_raw(bytes.into_boxed_slice()) as *mut u8;
    *out_buf = raw;
    *out_len = len;
    Ok(())
}

fn status<T>(result: Result<T, c_int>) -> c_int {
    match result {
        Ok(_) => 0,
        Err(code) => code,
    }
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Render HTML and return the raw PDF bytes.
///
/// # Parameters
/// - `html_ptr`, `html_len`: UTF-8 HTML fragment (not necessarily null-terminated)
/// - `config_json`: optional JSON configuration, or `NULL`
/// - `out_buf`, `out_len`: on success, receive the heap-allocated PDF
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `arabic_pdf_last_error`.
///
/// # Safety
/// - `html_ptr` must point to `html_len` valid bytes.
/// - `out_buf` and `out_len` must be valid pointers.
/// - The caller must free `*out_buf` by calling `arabic_pdf_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn arabic_pdf_output(
    html_ptr: *const u8,
    html_len: u32,
    config_json: *const c_char,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    if html_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    status((|| -> Result<(), c_int> {
        let html = str_from_raw(html_ptr, html_len)?;
        let service = service_from_c(config_json)?;
        let bytes = service
            .output(html, &GenerateOptions::default())
            .map_err(|e| {
                set_last_error(&e.to_string());
                ERR_RENDER
            })?;
        write_buffer(bytes, out_buf, out_len)
    })())
}

/// Render HTML and write the PDF to `path`.
///
/// # Safety
/// - `html_ptr` must point to `html_len` valid bytes.
/// - `path` must be a valid null-terminated UTF-8 string.
/// - `config_json`, if non-null, must be a valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn arabic_pdf_save(
    html_ptr: *const u8,
    html_len: u32,
    path: *const c_char,
    config_json: *const c_char,
) -> c_int {
    if html_ptr.is_null() || path.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    status((|| -> Result<std::path::PathBuf, c_int> {
        let html = str_from_raw(html_ptr, html_len)?;
        let path = str_from_c(path)?;
        let service = service_from_c(config_json)?;
        service
            .save(html, Path::new(path), &GenerateOptions::default())
            .map_err(|e| {
                set_last_error(&e.to_string());
                ERR_RENDER
            })
    })())
}

/// Render HTML as a download: returns the PDF bytes and the matching
/// `Content-Disposition` header value.
///
/// # Safety
/// Same as `arabic_pdf_output`. Additionally, `filename` must be a valid
/// null-terminated string (or `NULL` for `arabic-document.pdf`), and
/// `*out_disposition` must be freed with `arabic_pdf_free_string`.
#[no_mangle]
pub unsafe extern "C" fn arabic_pdf_download(
    html_ptr: *const u8,
    html_len: u32,
    filename: *const c_char,
    config_json: *const c_char,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
    out_disposition: *mut *mut c_char,
) -> c_int {
    if html_ptr.is_null() || out_buf.is_null() || out_len.is_null() || out_disposition.is_null() {
        set_last_error("Null pointer argument");
        return ERR_NULL;
    }

    status((|| -> Result<(), c_int> {
        let html = str_from_raw(html_ptr, html_len)?;
        let filename = if filename.is_null() {
            crate::service::DEFAULT_DOWNLOAD_NAME
        } else {
            str_from_c(filename)?
        };
        let service = service_from_c(config_json)?;
        let response = service
            .download(html, filename, &GenerateOptions::default())
            .map_err(|e| {
                set_last_error(&e.to_string());
                ERR_RENDER
            })?;
        let disposition = CString::new(response.content_disposition()).map_err(|e| {
            set_last_error(&e.to_string());
            ERR_UTF8
        })?;
        write_buffer(response.into_body(), out_buf, out_len)?;
        *out_disposition = disposition.into_raw();
        Ok(())
    })())
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a buffer returned by `arabic_pdf_output` or `arabic_pdf_download`.
///
/// # Safety
/// `buf` must have been returned by this library, with the same `len`.
#[no_mangle]
pub unsafe extern "C" fn arabic_pdf_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a string returned by this library.
///
/// # Safety
/// `s` must have been returned by Rust's `CString::into_raw`.
#[no_mangle]
pub unsafe extern "C" fn arabic_pdf_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next `arabic_pdf_*` call on the
/// same thread. The caller should **not** free this pointer.
///
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn arabic_pdf_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn arabic_pdf_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
