//! Lowering of host inputs into boundary-compatible arrays.
//!
//! [`MarshaledInputs`] is a scoped guard: it owns every transient
//! allocation a boundary call needs (NUL-terminated keys, JSON texts,
//! metadata texts, and the two contiguous record arrays) and borrows the
//! blob bytes in place. Dropping the guard is the single release
//! operation; it runs on every exit path and cannot run twice.

use crate::error::{VellumError, VellumResult};
use crate::inputs::{BlobInput, JsonInput};
use std::collections::HashSet;
use std::ffi::CString;
use std::marker::PhantomData;
use vellum_sys as sys;

/// Inputs lowered into the layout the engine consumes.
///
/// The records point into memory owned by this struct or borrowed from
/// the input collections; both stay valid and immovable until the guard
/// is dropped. The guard must outlive exactly one boundary call.
pub(crate) struct MarshaledInputs<'a> {
    json_records: Vec<sys::VellumJsonInput>,
    blob_records: Vec<sys::VellumBlobInput>,
    _strings: Vec<CString>,
    _borrowed: PhantomData<&'a [u8]>,
}

impl<'a> MarshaledInputs<'a> {
    /// Lower the given inputs.
    ///
    /// Fails host-locally on duplicate keys (within one call, across both
    /// input kinds), unserializable values, interior NUL bytes, and blobs
    /// exceeding the wire length field.
    pub(crate) fn new(
        json_inputs: &'a [JsonInput],
        blob_inputs: &'a [BlobInput],
    ) -> VellumResult<Self> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(json_inputs.len() + blob_inputs.len());
        let mut strings = Vec::with_capacity(2 * json_inputs.len() + 2 * blob_inputs.len());

        let mut json_records = Vec::with_capacity(json_inputs.len());
        for input in json_inputs {
            if !seen.insert(&input.key) {
                return Err(VellumError::DuplicateInputKey(input.key.clone()));
            }

            let key = CString::new(input.key.as_str())?;
            let data = serde_json::to_string(&input.value).map_err(|source| {
                VellumError::InputSerialization {
                    key: input.key.clone(),
                    source,
                }
            })?;
            let data = CString::new(data)?;

            json_records.push(sys::VellumJsonInput {
                data: data.as_ptr(),
                key: key.as_ptr(),
            });
            strings.push(key);
            strings.push(data);
        }

        let mut blob_records = Vec::with_capacity(blob_inputs.len());
        for blob in blob_inputs {
            if !seen.insert(&blob.key) {
                return Err(VellumError::DuplicateInputKey(blob.key.clone()));
            }

            let key = CString::new(blob.key.as_str())?;
            // An empty metadata bag crosses as "{}"; the engine expects a
            // JSON object token, never an absence marker.
            let meta = serde_json::to_string(&blob.meta.build()).map_err(|source| {
                VellumError::InputSerialization {
                    key: blob.key.clone(),
                    source,
                }
            })?;
            let meta = CString::new(meta)?;

            blob_records.push(sys::VellumBlobInput {
                data: byte_buffer(&blob.bytes, &blob.key)?,
                key: key.as_ptr(),
                meta: meta.as_ptr(),
            });
            strings.push(key);
            strings.push(meta);
        }

        Ok(MarshaledInputs {
            json_records,
            blob_records,
            _strings: strings,
            _borrowed: PhantomData,
        })
    }

    /// Wire view of the JSON records. Non-null even when empty.
    pub(crate) fn json_slice(&self) -> sys::VellumSlice<sys::VellumJsonInput> {
        sys::VellumSlice {
            data: self.json_records.as_ptr(),
            len: self.json_records.len() as u64,
        }
    }

    /// Wire view of the blob records. Non-null even when empty.
    pub(crate) fn blob_slice(&self) -> sys::VellumSlice<sys::VellumBlobInput> {
        sys::VellumSlice {
            data: self.blob_records.as_ptr(),
            len: self.blob_records.len() as u64,
        }
    }
}

/// View a byte region as a non-owning wire buffer.
pub(crate) fn byte_buffer(bytes: &[u8], key: &str) -> VellumResult<sys::VellumBuffer> {
    let len: u32 = bytes
        .len()
        .try_into()
        .map_err(|_| VellumError::OversizedInput(key.to_owned()))?;

    Ok(sys::VellumBuffer {
        data: bytes.as_ptr() as *mut u8,
        error: false,
        len,
    })
}
