//! The foreign-function seam between host code and the engine.
//!
//! [`EngineBoundary`] mirrors the engine's six exported operations on the
//! raw wire types. The rest of the crate never branches on the raw error
//! flag: [`consume_buffer`] converts every returned buffer into a tagged
//! result immediately after the call.

use crate::error::{VellumError, VellumResult};
use crate::stream::DocumentStream;
use std::ffi::CStr;
use std::slice;
use std::sync::Arc;
use vellum_sys as sys;

/// The engine's boundary surface.
///
/// Implementations forward to the native library (see the `engine`
/// feature) or stand in for it in tests. All calls are synchronous and
/// may block for the duration of a full template compilation.
///
/// # Safety
///
/// The `unsafe` methods receive raw pointers inside the wire structs.
/// Callers must keep every pointed-to region alive and unmodified for the
/// duration of the call, and must pass each buffer returned by the engine
/// to [`free_buffer`](Self::free_buffer) exactly once.
pub trait EngineBoundary: Send + Sync {
    /// Register a template under `id` and run its warm-up compilation.
    unsafe fn register_template(
        &self,
        id: &CStr,
        archive: sys::VellumBuffer,
        json_inputs: sys::VellumSlice<sys::VellumJsonInput>,
        blob_inputs: sys::VellumSlice<sys::VellumBlobInput>,
        options: sys::VellumCompileOptions,
    ) -> sys::VellumBuffer;

    /// Compile a previously registered template by id.
    ///
    /// Unknown ids are reported through the returned buffer's error flag,
    /// not as a host-side precondition.
    unsafe fn compile_template(
        &self,
        id: &CStr,
        json_inputs: sys::VellumSlice<sys::VellumJsonInput>,
        blob_inputs: sys::VellumSlice<sys::VellumBlobInput>,
        options: sys::VellumCompileOptions,
    ) -> sys::VellumBuffer;

    /// Compile a template archive without involving the session cache.
    unsafe fn compile_template_once(
        &self,
        archive: sys::VellumBuffer,
        json_inputs: sys::VellumSlice<sys::VellumJsonInput>,
        blob_inputs: sys::VellumSlice<sys::VellumBlobInput>,
        options: sys::VellumCompileOptions,
    ) -> sys::VellumBuffer;

    /// Release the engine-side session for `id`. No-op for unknown ids.
    fn unregister_template(&self, id: &CStr);

    /// Free a buffer previously returned by one of the compile calls.
    ///
    /// # Safety
    ///
    /// `buffer` must have been returned by this engine and not freed
    /// before; its memory must not be touched afterwards.
    unsafe fn free_buffer(&self, buffer: sys::VellumBuffer);

    /// Apply process-wide configuration.
    fn configure(&self, config: sys::VellumConfig);
}

/// Classify a buffer returned by a boundary call.
///
/// A success buffer is wrapped into a [`DocumentStream`] that takes over
/// the release responsibility. An error buffer is decoded into a
/// diagnostic message and freed immediately; it never outlives this
/// function.
pub(crate) fn consume_buffer(
    engine: &Arc<dyn EngineBoundary>,
    buffer: sys::VellumBuffer,
) -> VellumResult<DocumentStream> {
    if !buffer.error {
        return Ok(DocumentStream::new(Arc::clone(engine), buffer));
    }

    let message = if buffer.data.is_null() {
        fallback_message("the engine returned a null error buffer")
    } else {
        let bytes = unsafe { slice::from_raw_parts(buffer.data, buffer.len as usize) };
        let message = decode_error_message(bytes);
        unsafe { engine.free_buffer(buffer) };
        message
    };

    Err(VellumError::Compilation(message))
}

/// Decode the bytes of an error buffer into readable diagnostic text.
///
/// The engine serializes structured error records into escaped text
/// before crossing the boundary; one pass of backslash-escape resolution
/// recovers the original diagnostic. The result stays opaque text, it is
/// never re-parsed. A failure at any decode step synthesizes a fallback
/// message instead of raising a second-order fault.
pub(crate) fn decode_error_message(bytes: &[u8]) -> String {
    let raw = match std::str::from_utf8(bytes) {
        Ok(raw) => raw,
        Err(error) => return fallback_message(&error.to_string()),
    };

    match unescape(raw) {
        Ok(message) => message,
        Err(reason) => fallback_message(&reason),
    }
}

fn fallback_message(reason: &str) -> String {
    format!("Unknown error during template compilation. Failed to read error message: {reason}")
}

/// Resolve one pass of backslash escapes.
fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('0') => out.push('\0'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('u') => out.push(unicode_escape(&mut chars)?),
            Some(other) => return Err(format!("unsupported escape sequence '\\{other}'")),
            None => return Err("dangling escape at end of message".to_owned()),
        }
    }

    Ok(out)
}

fn unicode_escape(chars: &mut std::str::Chars<'_>) -> Result<char, String> {
    let mut code = 0u32;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| "truncated unicode escape".to_owned())?;
        code = code * 16 + digit;
    }
    char::from_u32(code).ok_or_else(|| format!("invalid unicode escape '\\u{code:04x}'"))
}
