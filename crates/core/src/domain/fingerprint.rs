// Fingerprint Domain Model
//
// A fingerprint identifies a file the client already uploaded once, so the
// packaging step can pull it from the shared cache instead of the new upload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{DomainError, Result};

const PATH_KEY: &str = "fn";
const SHA1_KEY: &str = "sha1";
const SIZE_KEY: &str = "size";
const MODE_KEY: &str = "mode";

/// Opaque key/value descriptor of a previously uploaded file.
///
/// Stored verbatim; the well-known keys (`fn`, `sha1`, `size`, `mode`) are
/// exposed through accessors, anything else is carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(Map<String, Value>);

impl Fingerprint {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build from any JSON value; only objects are accepted
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(DomainError::InvalidFingerprint(format!(
                "expected an object, got {}",
                json_type(&other)
            ))),
        }
    }

    /// Relative path of the file inside the application
    pub fn path(&self) -> Option<&str> {
        self.0.get(PATH_KEY).and_then(Value::as_str)
    }

    /// Content hash
    pub fn sha1(&self) -> Option<&str> {
        self.0.get(SHA1_KEY).and_then(Value::as_str)
    }

    pub fn size(&self) -> Option<u64> {
        self.0.get(SIZE_KEY).and_then(Value::as_u64)
    }

    pub fn mode(&self) -> Option<&str> {
        self.0.get(MODE_KEY).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered set of fingerprints handed to the packaging step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintsCollection(Vec<Fingerprint>);

impl FingerprintsCollection {
    pub fn new(fingerprints: Vec<Fingerprint>) -> Self {
        Self(fingerprints)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fingerprint> {
        self.0.iter()
    }

    /// Content hashes in insertion order (entries without one are skipped)
    pub fn sha1s(&self) -> Vec<&str> {
        self.0.iter().filter_map(Fingerprint::sha1).collect()
    }

    pub fn as_slice(&self) -> &[Fingerprint] {
        &self.0
    }
}

impl From<Vec<Fingerprint>> for FingerprintsCollection {
    fn from(fingerprints: Vec<Fingerprint>) -> Self {
        Self(fingerprints)
    }
}

impl<'a> IntoIterator for &'a FingerprintsCollection {
    type Item = &'a Fingerprint;
    type IntoIter = std::slice::Iter<'a, Fingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
