//! Host-side bridge to the Vellum native template-compilation engine.
//!
//! The engine compiles packed template archives into PDF, SVG, or PNG
//! documents. It is a stateful native library reached over a narrow C
//! ABI; this crate owns everything on the host side of that boundary:
//!
//! - marshaling JSON and blob inputs into the contiguous arrays the
//!   engine reads ([`inputs`]),
//! - classifying the single untyped buffer every call returns into a
//!   document stream or a decoded diagnostic ([`boundary`]),
//! - releasing engine-allocated memory exactly once on every path
//!   ([`stream`]),
//! - sharing compiled-template sessions across threads by id
//!   ([`registry`]).
//!
//! Boundary calls are synchronous and block for the duration of a
//! compilation; offload to a worker thread for non-blocking behavior.
//!
//! # Example
//!
//! ```no_run
//! use std::io::Read;
//! use vellum::prelude::*;
//!
//! fn compile(
//!     registry: &TemplateRegistry,
//!     archive: &[u8],
//! ) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
//!     // One-time registration; the warm-up output is discarded.
//!     registry.register(
//!         "invoice",
//!         archive,
//!         &[],
//!         &[],
//!         CompileOptions::pdf(CompilationMode::Development),
//!     )?;
//!
//!     // Fast repeated compilation against the cached session.
//!     let mut document = registry.compile(
//!         "invoice",
//!         &[JsonInput::new("recipient", serde_json::json!({ "name": "Ada" }))],
//!         &[],
//!         CompileOptions::pdf(CompilationMode::Production),
//!     )?;
//!
//!     let mut bytes = Vec::new();
//!     document.read_to_end(&mut bytes)?;
//!     Ok(bytes)
//! }
//! ```
//!
//! With the `engine` feature enabled, [`native::NativeEngine`] forwards
//! the boundary to the linked `libvellum_engine`; without it, callers
//! (and this crate's tests) inject their own [`boundary::EngineBoundary`]
//! implementation.

pub mod boundary;
pub mod config;
pub mod error;
pub mod inputs;
pub mod registry;
pub mod stream;

mod marshal;

#[cfg(feature = "engine")]
pub mod native;

pub mod prelude {
    //! The crate's main types in one import.
    pub use crate::boundary::EngineBoundary;
    pub use crate::config::{CompilationMode, CompileOptions, DiagnosticsColoring, ExportFormat};
    pub use crate::error::{VellumError, VellumResult};
    pub use crate::inputs::{BlobInput, BlobMeta, JsonInput};
    #[cfg(feature = "engine")]
    pub use crate::native::NativeEngine;
    pub use crate::registry::{TemplateRegistry, TemplateSession};
    pub use crate::stream::DocumentStream;
}
