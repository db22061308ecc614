//! [`EngineBoundary`] implementation backed by the native engine library.
//!
//! Only available with the `engine` feature, which links against
//! `libvellum_engine`.

use crate::boundary::EngineBoundary;
use std::ffi::CStr;
use vellum_sys as sys;

/// The real engine, reached through the linked native library.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeEngine;

impl NativeEngine {
    /// Handle to the linked engine. The engine itself is process-wide
    /// native state; this type only carries the boundary calls.
    pub fn new() -> Self {
        NativeEngine
    }
}

impl EngineBoundary for NativeEngine {
    unsafe fn register_template(
        &self,
        id: &CStr,
        archive: sys::VellumBuffer,
        json_inputs: sys::VellumSlice<sys::VellumJsonInput>,
        blob_inputs: sys::VellumSlice<sys::VellumBlobInput>,
        options: sys::VellumCompileOptions,
    ) -> sys::VellumBuffer {
        unsafe {
            sys::vellum_register_template(id.as_ptr(), archive, json_inputs, blob_inputs, options)
        }
    }

    unsafe fn compile_template(
        &self,
        id: &CStr,
        json_inputs: sys::VellumSlice<sys::VellumJsonInput>,
        blob_inputs: sys::VellumSlice<sys::VellumBlobInput>,
        options: sys::VellumCompileOptions,
    ) -> sys::VellumBuffer {
        unsafe { sys::vellum_compile_template(id.as_ptr(), json_inputs, blob_inputs, options) }
    }

    unsafe fn compile_template_once(
        &self,
        archive: sys::VellumBuffer,
        json_inputs: sys::VellumSlice<sys::VellumJsonInput>,
        blob_inputs: sys::VellumSlice<sys::VellumBlobInput>,
        options: sys::VellumCompileOptions,
    ) -> sys::VellumBuffer {
        unsafe { sys::vellum_compile_template_once(archive, json_inputs, blob_inputs, options) }
    }

    fn unregister_template(&self, id: &CStr) {
        unsafe { sys::vellum_unregister_template(id.as_ptr()) }
    }

    unsafe fn free_buffer(&self, buffer: sys::VellumBuffer) {
        unsafe { sys::vellum_free_buffer(buffer) }
    }

    fn configure(&self, config: sys::VellumConfig) {
        unsafe { sys::vellum_configure(config) }
    }
}
