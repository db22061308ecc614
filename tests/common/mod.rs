//! Shared test harness: an in-process engine implementing the boundary.
//!
//! The mock treats the "archive" bytes as a JSON manifest declaring the
//! template's inputs with optional default and development values. It
//! applies the same fallback policy as the real engine, renders a
//! deterministic JSON "document", and allocates result buffers the way
//! the engine does (leaked boxed slices, reclaimed by `free_buffer`) so
//! tests can account for every release.

#![allow(dead_code)]

use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::slice;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use vellum::boundary::EngineBoundary;
use vellum_sys as sys;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InputDecl {
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub development: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ArchiveManifest {
    inputs: HashMap<String, InputDecl>,
}

/// Build a mock archive declaring the given inputs.
pub fn archive(inputs: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({ "inputs": inputs })).unwrap()
}

/// The rendered "document" the mock produces on success.
#[derive(Debug, Deserialize)]
pub struct RenderedDocument {
    pub format: String,
    pub px_per_pt: f32,
    pub mode: String,
    pub inputs: Map<String, Value>,
}

impl RenderedDocument {
    pub fn parse(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).expect("mock document is JSON")
    }
}

#[derive(Default)]
pub struct MockEngine {
    templates: Mutex<HashMap<String, HashMap<String, InputDecl>>>,
    // ptr address -> allocation length, for exactly-once free accounting
    allocations: Mutex<HashMap<usize, usize>>,
    frees: AtomicUsize,
    color: Mutex<Option<sys::VellumColor>>,
}

impl MockEngine {
    pub fn new() -> Self {
        MockEngine::default()
    }

    /// Buffers handed to the host and not yet freed.
    pub fn outstanding(&self) -> usize {
        self.allocations.lock().unwrap().len()
    }

    /// Number of free_buffer calls observed.
    pub fn freed(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    /// Whether a session exists on the engine side.
    pub fn has_session(&self, id: &str) -> bool {
        self.templates.lock().unwrap().contains_key(id)
    }

    pub fn configured_color(&self) -> Option<sys::VellumColor> {
        *self.color.lock().unwrap()
    }

    fn alloc(&self, bytes: Vec<u8>, error: bool) -> sys::VellumBuffer {
        let len = bytes.len();
        let data = Box::into_raw(bytes.into_boxed_slice()) as *mut u8;
        self.allocations.lock().unwrap().insert(data as usize, len);
        sys::VellumBuffer {
            data,
            error,
            len: len as u32,
        }
    }

    fn ok_buffer(&self, bytes: Vec<u8>) -> sys::VellumBuffer {
        self.alloc(bytes, false)
    }

    /// Error payloads cross the wire the way the engine emits them: a
    /// debug-formatted record whose message is backslash-escaped.
    fn error_buffer(&self, message: &str) -> sys::VellumBuffer {
        let wire = format!("TemplateCompilationFailure {{ error: {message:?}, warnings: None }}");
        self.alloc(wire.into_bytes(), true)
    }

    unsafe fn collect_explicit(
        &self,
        json_inputs: sys::VellumSlice<sys::VellumJsonInput>,
        blob_inputs: sys::VellumSlice<sys::VellumBlobInput>,
    ) -> Map<String, Value> {
        // The marshaler guarantees non-null array pointers even for zero
        // inputs; the mock relies on it like the real engine would.
        assert!(!json_inputs.data.is_null());
        assert!(!blob_inputs.data.is_null());

        let mut explicit = Map::new();

        let records = unsafe { slice::from_raw_parts(json_inputs.data, json_inputs.len as usize) };
        for record in records {
            let key = unsafe { read_str(record.key) };
            let data = unsafe { read_str(record.data) };
            let value: Value = serde_json::from_str(data).expect("json input is JSON text");
            explicit.insert(key.to_owned(), value);
        }

        let records = unsafe { slice::from_raw_parts(blob_inputs.data, blob_inputs.len as usize) };
        for record in records {
            let key = unsafe { read_str(record.key) };
            let meta = unsafe { read_str(record.meta) };
            let meta: Value = serde_json::from_str(meta).expect("blob meta is a JSON object");
            assert!(meta.is_object(), "blob meta must be an object token");
            assert!(!record.data.data.is_null() || record.data.len == 0);
            let bytes = if record.data.len == 0 {
                &[][..]
            } else {
                unsafe { slice::from_raw_parts(record.data.data, record.data.len as usize) }
            };
            explicit.insert(
                key.to_owned(),
                json!({ "blob": { "len": bytes.len(), "meta": meta } }),
            );
        }

        explicit
    }

    fn resolve(
        &self,
        declared: &HashMap<String, InputDecl>,
        explicit: Map<String, Value>,
        mode: sys::VellumMode,
    ) -> Result<Map<String, Value>, String> {
        let mut resolved = explicit;

        for (key, decl) in declared {
            if resolved.contains_key(key) {
                continue;
            }

            let fallback = match mode {
                sys::VellumMode::Development => {
                    decl.development.clone().or_else(|| decl.default.clone())
                }
                sys::VellumMode::Production => decl.default.clone(),
            };

            match fallback {
                Some(value) => {
                    resolved.insert(key.clone(), value);
                }
                None => return Err(format!("missing required input \"{key}\"")),
            }
        }

        Ok(resolved)
    }

    fn render(
        &self,
        resolved: Map<String, Value>,
        options: sys::VellumCompileOptions,
    ) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "format": format!("{:?}", options.target),
            "px_per_pt": options.px_per_pt,
            "mode": format!("{:?}", options.mode),
            "inputs": resolved,
        }))
        .unwrap()
    }

    fn parse_archive(
        &self,
        archive: sys::VellumBuffer,
    ) -> Result<HashMap<String, InputDecl>, String> {
        assert!(!archive.error);
        assert!(!archive.data.is_null() || archive.len == 0);
        let bytes = if archive.len == 0 {
            &[][..]
        } else {
            unsafe { slice::from_raw_parts(archive.data, archive.len as usize) }
        };
        let manifest: ArchiveManifest = serde_json::from_slice(bytes)
            .map_err(|error| format!("failed to read template archive: {error}"))?;
        Ok(manifest.inputs)
    }
}

unsafe fn read_str<'a>(ptr: *const c_char) -> &'a str {
    assert!(!ptr.is_null());
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .expect("wire strings are UTF-8")
}

impl EngineBoundary for MockEngine {
    unsafe fn register_template(
        &self,
        id: &CStr,
        archive: sys::VellumBuffer,
        json_inputs: sys::VellumSlice<sys::VellumJsonInput>,
        blob_inputs: sys::VellumSlice<sys::VellumBlobInput>,
        options: sys::VellumCompileOptions,
    ) -> sys::VellumBuffer {
        let id = id.to_str().expect("template id is UTF-8").to_owned();

        let declared = match self.parse_archive(archive) {
            Ok(declared) => declared,
            Err(message) => return self.error_buffer(&message),
        };

        let explicit = unsafe { self.collect_explicit(json_inputs, blob_inputs) };
        match self.resolve(&declared, explicit, options.mode) {
            Ok(resolved) => {
                self.templates.lock().unwrap().insert(id, declared);
                let document = self.render(resolved, options);
                self.ok_buffer(document)
            }
            Err(message) => self.error_buffer(&message),
        }
    }

    unsafe fn compile_template(
        &self,
        id: &CStr,
        json_inputs: sys::VellumSlice<sys::VellumJsonInput>,
        blob_inputs: sys::VellumSlice<sys::VellumBlobInput>,
        options: sys::VellumCompileOptions,
    ) -> sys::VellumBuffer {
        let id = id.to_str().expect("template id is UTF-8");

        let declared = match self.templates.lock().unwrap().get(id) {
            Some(declared) => declared.clone(),
            None => return self.error_buffer(&format!("the template '{id}' is not registered")),
        };

        let explicit = unsafe { self.collect_explicit(json_inputs, blob_inputs) };
        match self.resolve(&declared, explicit, options.mode) {
            Ok(resolved) => self.ok_buffer(self.render(resolved, options)),
            Err(message) => self.error_buffer(&message),
        }
    }

    unsafe fn compile_template_once(
        &self,
        archive: sys::VellumBuffer,
        json_inputs: sys::VellumSlice<sys::VellumJsonInput>,
        blob_inputs: sys::VellumSlice<sys::VellumBlobInput>,
        options: sys::VellumCompileOptions,
    ) -> sys::VellumBuffer {
        let declared = match self.parse_archive(archive) {
            Ok(declared) => declared,
            Err(message) => return self.error_buffer(&message),
        };

        let explicit = unsafe { self.collect_explicit(json_inputs, blob_inputs) };
        match self.resolve(&declared, explicit, options.mode) {
            Ok(resolved) => self.ok_buffer(self.render(resolved, options)),
            Err(message) => self.error_buffer(&message),
        }
    }

    fn unregister_template(&self, id: &CStr) {
        let id = id.to_str().expect("template id is UTF-8");
        self.templates.lock().unwrap().remove(id);
    }

    unsafe fn free_buffer(&self, buffer: sys::VellumBuffer) {
        let removed = self
            .allocations
            .lock()
            .unwrap()
            .remove(&(buffer.data as usize));
        let len = removed.expect("free of a buffer this engine does not own (double free?)");
        assert_eq!(len, buffer.len as usize);

        unsafe {
            drop(Box::from_raw(slice::from_raw_parts_mut(buffer.data, len)));
        }
        self.frees.fetch_add(1, Ordering::SeqCst);
    }

    fn configure(&self, config: sys::VellumConfig) {
        *self.color.lock().unwrap() = Some(config.color);
    }
}
