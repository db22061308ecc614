//! Compilation options and process-wide configuration values.

use crate::error::{VellumError, VellumResult};
use vellum_sys as sys;

/// The input-fallback policy used when a declared template input is not
/// explicitly provided.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CompilationMode {
    /// Use the input's development value where one is declared. If there
    /// is no development value but a default one, fall back to that.
    Development,
    /// Use the input's default value where one is declared. Development
    /// values are never consulted.
    #[default]
    Production,
}

impl From<CompilationMode> for sys::VellumMode {
    fn from(mode: CompilationMode) -> Self {
        match mode {
            CompilationMode::Development => sys::VellumMode::Development,
            CompilationMode::Production => sys::VellumMode::Production,
        }
    }
}

/// Formats a compiled document can be exported into.
///
/// The pixel density only exists for PNG export; the other formats carry
/// no parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ExportFormat {
    /// PDF document (PDF/A-3b).
    Pdf,
    /// SVG vector image.
    Svg,
    /// PNG raster image. Higher densities take longer to render but
    /// produce sharper images.
    Png {
        /// Pixels per typographic point. Must be positive and finite.
        pixels_per_pt: f32,
    },
}

/// Options for one compilation call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CompileOptions {
    /// Export format of the compiled document.
    pub format: ExportFormat,
    /// Input-fallback policy.
    pub mode: CompilationMode,
}

impl CompileOptions {
    /// Options for compiling to PDF.
    pub fn pdf(mode: CompilationMode) -> Self {
        CompileOptions {
            format: ExportFormat::Pdf,
            mode,
        }
    }

    /// Options for compiling to SVG.
    pub fn svg(mode: CompilationMode) -> Self {
        CompileOptions {
            format: ExportFormat::Svg,
            mode,
        }
    }

    /// Options for compiling to PNG at the given pixel density.
    pub fn png(pixels_per_pt: f32, mode: CompilationMode) -> Self {
        CompileOptions {
            format: ExportFormat::Png { pixels_per_pt },
            mode,
        }
    }

    /// Lower the options to their wire representation.
    ///
    /// Formats without a pixel density transport `1.0`; the engine ignores
    /// the field for non-PNG targets.
    pub(crate) fn to_raw(self) -> VellumResult<sys::VellumCompileOptions> {
        let (target, px_per_pt) = match self.format {
            ExportFormat::Pdf => (sys::VellumTarget::Pdf, 1.0),
            ExportFormat::Svg => (sys::VellumTarget::Svg, 1.0),
            ExportFormat::Png { pixels_per_pt } => {
                if !pixels_per_pt.is_finite() || pixels_per_pt <= 0.0 {
                    return Err(VellumError::InvalidPixelDensity(pixels_per_pt));
                }
                (sys::VellumTarget::Png, pixels_per_pt)
            }
        };

        Ok(sys::VellumCompileOptions {
            target,
            mode: self.mode.into(),
            px_per_pt,
        })
    }
}

impl Default for CompileOptions {
    /// PDF export in production mode.
    fn default() -> Self {
        CompileOptions::pdf(CompilationMode::Production)
    }
}

/// How the engine colors diagnostic text embedded in error payloads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DiagnosticsColoring {
    /// No color codes in diagnostic output.
    #[default]
    None,
    /// ANSI color codes in diagnostic output.
    Ansi,
}

impl From<DiagnosticsColoring> for sys::VellumColor {
    fn from(coloring: DiagnosticsColoring) -> Self {
        match coloring {
            DiagnosticsColoring::None => sys::VellumColor::None,
            DiagnosticsColoring::Ansi => sys::VellumColor::Ansi,
        }
    }
}
