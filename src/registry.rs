//! Shared registry of engine-side template sessions.

use crate::boundary::{EngineBoundary, consume_buffer};
use crate::config::{CompileOptions, DiagnosticsColoring};
use crate::error::VellumResult;
use crate::inputs::{BlobInput, JsonInput};
use crate::marshal::{MarshaledInputs, byte_buffer};
use crate::stream::DocumentStream;
use dashmap::DashMap;
use std::ffi::CString;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Host-side handle for a registered template.
///
/// The id is the only thing the host holds; the compiled state lives
/// entirely on the native side.
#[derive(Clone, Debug)]
pub struct TemplateSession {
    id: String,
    registered_at: Instant,
}

impl TemplateSession {
    /// Identifier of the engine-side session.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the session was registered in this process.
    pub fn registered_at(&self) -> Instant {
        self.registered_at
    }
}

/// Thread-safe mapping of template ids to engine-side sessions.
///
/// Registration pays a one-time warm-up compilation so that subsequent
/// [`compile`](Self::compile) calls against the same id are fast. The
/// registry is an injectable component rather than process-global state;
/// create one per engine and share it freely across threads. Operations
/// on different ids never block one another.
pub struct TemplateRegistry {
    engine: Arc<dyn EngineBoundary>,
    sessions: DashMap<String, TemplateSession>,
}

impl TemplateRegistry {
    /// Create an empty registry driving the given engine.
    pub fn new(engine: Arc<dyn EngineBoundary>) -> Self {
        TemplateRegistry {
            engine,
            sessions: DashMap::new(),
        }
    }

    /// Register a template archive under `id` and warm up its session.
    ///
    /// The warm-up compilation validates that the template compiles with
    /// the given inputs and primes the engine's caches; its output is
    /// discarded. On failure nothing is stored and the engine holds no
    /// session for `id`.
    ///
    /// Registering an id that is already registered replaces the host
    /// entry but does not release the previous engine-side session;
    /// callers that care must [`unregister`](Self::unregister) first.
    pub fn register(
        &self,
        id: &str,
        archive: &[u8],
        json_inputs: &[JsonInput],
        blob_inputs: &[BlobInput],
        options: CompileOptions,
    ) -> VellumResult<()> {
        let started = Instant::now();
        let raw_options = options.to_raw()?;
        let raw_id = CString::new(id)?;
        let raw_archive = byte_buffer(archive, "archive")?;
        let marshaled = MarshaledInputs::new(json_inputs, blob_inputs)?;

        let buffer = unsafe {
            self.engine.register_template(
                &raw_id,
                raw_archive,
                marshaled.json_slice(),
                marshaled.blob_slice(),
                raw_options,
            )
        };
        drop(marshaled);

        match consume_buffer(&self.engine, buffer) {
            Ok(warm_up) => drop(warm_up),
            Err(error) => {
                warn!(id, %error, "template registration failed");
                return Err(error);
            }
        }

        self.sessions.insert(
            id.to_owned(),
            TemplateSession {
                id: id.to_owned(),
                registered_at: started,
            },
        );
        info!(
            id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "registered template"
        );
        Ok(())
    }

    /// Compile a registered template with the given inputs.
    ///
    /// The id is forwarded as-is; the registry does not pre-validate that
    /// it was registered. An unknown id comes back through the engine's
    /// error channel as a compilation failure.
    pub fn compile(
        &self,
        id: &str,
        json_inputs: &[JsonInput],
        blob_inputs: &[BlobInput],
        options: CompileOptions,
    ) -> VellumResult<DocumentStream> {
        let raw_options = options.to_raw()?;
        let raw_id = CString::new(id)?;
        let marshaled = MarshaledInputs::new(json_inputs, blob_inputs)?;

        debug!(id, "compiling template");
        let buffer = unsafe {
            self.engine.compile_template(
                &raw_id,
                marshaled.json_slice(),
                marshaled.blob_slice(),
                raw_options,
            )
        };
        drop(marshaled);

        consume_buffer(&self.engine, buffer)
    }

    /// Compile a template archive once, without registering a session.
    ///
    /// Every call pays the full compilation cost. Use
    /// [`register`](Self::register) followed by
    /// [`compile`](Self::compile) to compile the same template repeatedly.
    pub fn compile_once(
        &self,
        archive: &[u8],
        json_inputs: &[JsonInput],
        blob_inputs: &[BlobInput],
        options: CompileOptions,
    ) -> VellumResult<DocumentStream> {
        let raw_options = options.to_raw()?;
        let raw_archive = byte_buffer(archive, "archive")?;
        let marshaled = MarshaledInputs::new(json_inputs, blob_inputs)?;

        let buffer = unsafe {
            self.engine.compile_template_once(
                raw_archive,
                marshaled.json_slice(),
                marshaled.blob_slice(),
                raw_options,
            )
        };
        drop(marshaled);

        consume_buffer(&self.engine, buffer)
    }

    /// Release the engine-side session for `id` and forget the host entry.
    ///
    /// Safe to call for ids that were never registered and safe to call
    /// twice; both are no-ops.
    pub fn unregister(&self, id: &str) {
        // An id with an interior NUL can never have been registered; there
        // is nothing to release on the engine side.
        if let Ok(raw_id) = CString::new(id) {
            self.engine.unregister_template(&raw_id);
        }

        if self.sessions.remove(id).is_some() {
            debug!(id, "unregistered template");
        }
    }

    /// Apply process-wide diagnostics coloring.
    ///
    /// This only affects how the engine formats diagnostic text embedded
    /// in error payloads.
    pub fn configure(&self, coloring: DiagnosticsColoring) {
        self.engine.configure(vellum_sys::VellumConfig {
            color: coloring.into(),
        });
    }

    /// Whether a session is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// The session registered under `id`, if any.
    pub fn session(&self, id: &str) -> Option<TemplateSession> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("sessions", &self.sessions.len())
            .finish()
    }
}
