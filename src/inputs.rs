//! Input values handed to the engine for one compilation.
//!
//! Keys are opaque identifiers matching the named inputs a template
//! declares. Values are either JSON data or raw bytes with a JSON
//! metadata object attached.

use crate::error::{VellumError, VellumResult};
use serde::Serialize;
use serde_json::{Map, Value};

/// A JSON input for a template compilation.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonInput {
    /// Key of the input definition this value belongs to.
    pub key: String,
    /// The input value.
    pub value: Value,
}

impl JsonInput {
    /// Create an input from a key and a JSON value.
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        JsonInput {
            key: key.into(),
            value,
        }
    }

    /// Create an input by serializing any `Serialize` type.
    pub fn from_serialize<T: Serialize>(key: impl Into<String>, value: &T) -> VellumResult<Self> {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|source| {
            VellumError::InputSerialization {
                key: key.clone(),
                source,
            }
        })?;
        Ok(JsonInput { key, value })
    }
}

/// A binary input for a template compilation.
#[derive(Clone, Debug, PartialEq)]
pub struct BlobInput {
    /// Key of the input definition this value belongs to.
    pub key: String,
    /// The blob bytes.
    pub bytes: Vec<u8>,
    /// Metadata describing the blob.
    pub meta: BlobMeta,
}

impl BlobInput {
    /// Create a blob input with empty metadata.
    pub fn new(key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        BlobInput {
            key: key.into(),
            bytes: bytes.into(),
            meta: BlobMeta::default(),
        }
    }

    /// Attach metadata to the blob.
    pub fn with_meta(mut self, meta: BlobMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Metadata for a blob input.
///
/// The metadata is an open bag: the engine forwards arbitrary keys to the
/// template. `image_format` is the one reserved key; for image blobs it
/// names the format the engine should decode the bytes as (for example
/// `"png"` or `"jpeg"`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlobMeta {
    /// Format of the blob if it is an image.
    pub image_format: Option<String>,
    /// Custom metadata fields.
    pub custom: Option<Map<String, Value>>,
}

impl BlobMeta {
    /// Empty metadata. Builds to `{}`.
    pub fn new() -> Self {
        BlobMeta::default()
    }

    /// Set the image format of the blob.
    pub fn image_format(mut self, format: impl Into<String>) -> Self {
        self.image_format = Some(format.into());
        self
    }

    /// Set the custom metadata fields.
    pub fn custom(mut self, custom: Map<String, Value>) -> Self {
        self.custom = Some(custom);
        self
    }

    /// Combine the metadata into a single JSON object.
    ///
    /// The image format is only added when the custom fields do not
    /// already carry an `image_format` key; an existing entry wins.
    pub fn build(&self) -> Map<String, Value> {
        let mut meta = self.custom.clone().unwrap_or_default();

        if let Some(format) = &self.image_format {
            meta.entry("image_format".to_owned())
                .or_insert_with(|| Value::String(format.clone()));
        }

        meta
    }
}
