//! Raw C ABI surface of the Vellum template-compilation engine.
//!
//! The engine is a native library exposing six exported functions. This
//! crate declares those symbols and the `#[repr(C)]` types they exchange.
//! Nothing here is safe to call directly; the `vellum` crate wraps this
//! surface with ownership and error handling.
//!
//! The extern declarations are gated behind the `engine` feature so the
//! workspace can be built and tested on machines that do not have
//! `libvellum_engine` available.

use std::os::raw::c_char;

/// A region of engine-allocated memory returned by every fallible call.
///
/// If [`error`](Self::error) is `true`, [`data`](Self::data) points to a
/// UTF-8 encoded, backslash-escaped error message. Every buffer that
/// reaches the host must be passed to [`vellum_free_buffer`] exactly once.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct VellumBuffer {
    /// Pointer to the beginning of the buffer data.
    pub data: *mut u8,
    /// Whether this buffer carries an error message instead of a payload.
    pub error: bool,
    /// Length of the buffer data in bytes.
    pub len: u32,
}

/// A borrowed, contiguous array crossing the boundary by pointer and length.
///
/// A zero-length slice still carries a non-null, aligned pointer; the
/// engine distinguishes "no inputs" from "missing inputs" by length alone.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct VellumSlice<T> {
    /// Pointer to the first element.
    pub data: *const T,
    /// Number of elements.
    pub len: u64,
}

/// One marshaled JSON input record.
///
/// Both fields are NUL-terminated UTF-8 strings owned by the host for the
/// duration of the call.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct VellumJsonInput {
    /// JSON text of the input value.
    pub data: *const c_char,
    /// Identifier of the input definition this value belongs to.
    pub key: *const c_char,
}

/// One marshaled blob input record.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct VellumBlobInput {
    /// The blob bytes. `error` is always `false`; the buffer form is only
    /// reused for its pointer/length pair.
    pub data: VellumBuffer,
    /// Identifier of the input definition this value belongs to.
    pub key: *const c_char,
    /// Blob metadata as a JSON object token. Never null; an empty object
    /// is `"{}"`.
    pub meta: *const c_char,
}

/// Output formats the engine can export a compiled document into.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VellumTarget {
    /// PDF document (PDF/A-3b).
    Pdf,
    /// PNG raster image.
    Png,
    /// SVG vector image.
    Svg,
}

/// Input-fallback policy for values that are not explicitly provided.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VellumMode {
    /// Use development values where declared, falling back to defaults.
    Development,
    /// Use default values only.
    Production,
}

/// Options for one compilation call.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct VellumCompileOptions {
    /// Export format of the compiled document.
    pub target: VellumTarget,
    /// Input-fallback policy.
    pub mode: VellumMode,
    /// Pixel density for PNG export. Ignored for other targets.
    pub px_per_pt: f32,
}

/// Coloring of diagnostic text embedded in error payloads.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VellumColor {
    /// No color codes in diagnostics.
    None,
    /// ANSI color codes in diagnostics.
    Ansi,
}

/// Process-wide engine configuration.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct VellumConfig {
    /// Coloring for diagnostics like warnings and errors.
    pub color: VellumColor,
}

#[cfg(feature = "engine")]
#[link(name = "vellum_engine")]
unsafe extern "C" {
    /// Register a template under `id` and run its warm-up compilation.
    ///
    /// The returned buffer holds the warm-up output or an error message.
    pub fn vellum_register_template(
        id: *const c_char,
        archive: VellumBuffer,
        json_inputs: VellumSlice<VellumJsonInput>,
        blob_inputs: VellumSlice<VellumBlobInput>,
        options: VellumCompileOptions,
    ) -> VellumBuffer;

    /// Compile a previously registered template. An unknown `id` is
    /// reported through the error flag of the returned buffer.
    pub fn vellum_compile_template(
        id: *const c_char,
        json_inputs: VellumSlice<VellumJsonInput>,
        blob_inputs: VellumSlice<VellumBlobInput>,
        options: VellumCompileOptions,
    ) -> VellumBuffer;

    /// Compile a template archive without touching the engine's session
    /// cache. Every call pays the full compilation cost.
    pub fn vellum_compile_template_once(
        archive: VellumBuffer,
        json_inputs: VellumSlice<VellumJsonInput>,
        blob_inputs: VellumSlice<VellumBlobInput>,
        options: VellumCompileOptions,
    ) -> VellumBuffer;

    /// Release the engine-side session for `id`. No-op for unknown ids.
    pub fn vellum_unregister_template(id: *const c_char);

    /// Free a buffer previously returned by the engine. Must be called
    /// exactly once per buffer that reached the host.
    pub fn vellum_free_buffer(buffer: VellumBuffer);

    /// Apply process-wide configuration.
    pub fn vellum_configure(config: VellumConfig);
}
