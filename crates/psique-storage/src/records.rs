//! JSON records on top of [`Bucket`].

use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::bucket::Bucket;
use crate::error::StorageError;

const JSON: &str = "application/json";

/// A record together with the ETag it was read at.
pub struct Versioned<T> {
    pub value: T,
    pub etag: String,
}

pub async fn load<T: DeserializeOwned>(bucket: &Bucket, key: &str) -> Result<T, StorageError> {
    Ok(load_versioned(bucket, key).await?.value)
}

pub async fn load_versioned<T: DeserializeOwned>(
    bucket: &Bucket,
    key: &str,
) -> Result<Versioned<T>, StorageError> {
    let fetched = bucket.get(key).await?;
    let value = decode(key, &fetched.body)?;
    Ok(Versioned {
        value,
        etag: fetched.etag.unwrap_or_default(),
    })
}

/// Like [`load`], but a missing object is `Ok(None)`.
pub async fn load_optional<T: DeserializeOwned>(
    bucket: &Bucket,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match load(bucket, key).await {
        Ok(value) => Ok(Some(value)),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Every `.json` record under `prefix`. Unreadable records are logged and
/// skipped so one corrupt object does not hide the rest of a list.
pub async fn load_all<T: DeserializeOwned>(
    bucket: &Bucket,
    prefix: &str,
) -> Result<Vec<T>, StorageError> {
    let keys = bucket.list_keys(prefix).await?;
    let mut values = Vec::with_capacity(keys.len());
    for key in keys.iter().filter(|k| k.ends_with(".json")) {
        match load(bucket, key).await {
            Ok(value) => values.push(value),
            Err(StorageError::NotFound { .. }) => {}
            Err(StorageError::Serialization { key, source }) => {
                warn!(key, error = %source, "skipping unreadable record");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(values)
}

pub async fn save<T: Serialize>(bucket: &Bucket, key: &str, value: &T) -> Result<String, StorageError> {
    bucket.put(key, encode(key, value)?, Some(JSON)).await
}

/// Save only if nobody wrote the record since it was read at `etag`.
pub async fn save_if_match<T: Serialize>(
    bucket: &Bucket,
    key: &str,
    value: &T,
    etag: &str,
) -> Result<String, StorageError> {
    bucket.put_if_match(key, encode(key, value)?, Some(JSON), etag).await
}

pub fn decode<T: DeserializeOwned>(key: &str, body: &[u8]) -> Result<T, StorageError> {
    serde_json::from_slice(body).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })
}

pub fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec_pretty(value).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    #[test]
    fn decode_errors_carry_the_key() {
        let err = decode::<Note>("tenants/a/x.json", b"{not json").unwrap_err();
        match err {
            StorageError::Serialization { key, .. } => assert_eq!(key, "tenants/a/x.json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn encode_is_readable_by_decode() {
        let note = Note {
            text: "sessão".into(),
        };
        let bytes = encode("k", &note).unwrap();
        assert_eq!(decode::<Note>("k", &bytes).unwrap(), note);
    }
}
