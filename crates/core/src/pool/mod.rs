use std::collections::HashMap;

use crate::{PoolError, Result, Value, ValueKind};

/// Root segment reserved for the exporter's metadata block.
pub const METADATA_ROOT: &str = "metadata";

/// Append-only aggregation store for named analysis results.
///
/// Keys are flat dotted paths (`lowlevel.mfcc`); the hierarchy they describe
/// is only materialised at export time by [`KeyTree`](crate::KeyTree). A key
/// holds either a series of values appended with [`Pool::add`] or a single
/// value stored with [`Pool::set`], and every value under a key shares the
/// same [`ValueKind`].
#[derive(Debug, Default, Clone)]
pub struct Pool {
    series: HashMap<String, Vec<Value>>,
    singles: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Series,
    Single,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the series stored under `key`.
    pub fn add(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if self.check_insert(key, value.kind(), Storage::Series)? {
            tracing::debug!(key, kind = %value.kind(), "creating series key");
        }

        self.series.entry(key.to_string()).or_default().push(value);
        Ok(())
    }

    /// Stores a single value under `key`, replacing any previous one.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if self.check_insert(key, value.kind(), Storage::Single)? {
            tracing::debug!(key, kind = %value.kind(), "creating single key");
        }

        self.singles.insert(key.to_string(), value);
        Ok(())
    }

    /// Returns the series stored under the exact `key`, in insertion order.
    pub fn get(&self, key: &str) -> Result<&[Value]> {
        self.series
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| PoolError::KeyNotFound(key.to_string()))
    }

    /// Returns the single value stored under the exact `key`.
    pub fn get_single(&self, key: &str) -> Result<&Value> {
        self.singles
            .get(key)
            .ok_or_else(|| PoolError::KeyNotFound(key.to_string()))
    }

    /// All stored keys, series and single, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.series
            .keys()
            .chain(self.singles.keys())
            .map(String::as_str)
    }

    pub fn series(&self) -> impl Iterator<Item = (&str, &[Value])> + '_ {
        self.series
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn singles(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.singles.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.series.contains_key(key) || self.singles.contains_key(key)
    }

    /// The kind established for `key`, if the key exists.
    pub fn kind(&self, key: &str) -> Option<ValueKind> {
        self.series
            .get(key)
            .and_then(|values| values.first())
            .or_else(|| self.singles.get(key))
            .map(Value::kind)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.series.len() + self.singles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.singles.is_empty()
    }

    /// Drops `key` and everything stored under it. Returns whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.series.remove(key).is_some() || self.singles.remove(key).is_some()
    }

    /// Appends every series of `other` onto this pool and copies its single
    /// values over. Nothing is modified unless every key of `other` can be
    /// merged.
    pub fn merge(&mut self, other: &Pool) -> Result<()> {
        for (key, values) in other.series() {
            if let Some(first) = values.first() {
                self.check_insert(key, first.kind(), Storage::Series)?;
            }
        }
        for (key, value) in other.singles() {
            self.check_insert(key, value.kind(), Storage::Single)?;
        }

        for (key, values) in other.series() {
            self.series
                .entry(key.to_string())
                .or_default()
                .extend(values.iter().cloned());
        }
        for (key, value) in other.singles() {
            self.singles.insert(key.to_string(), value.clone());
        }

        tracing::debug!(keys = other.len(), "merged pool");
        Ok(())
    }

    /// Verifies that a value of `kind` may be stored under `key`. Returns
    /// `true` when the key does not exist yet.
    fn check_insert(&self, key: &str, kind: ValueKind, storage: Storage) -> Result<bool> {
        let existing = match (self.series.get(key), self.singles.get(key)) {
            (Some(values), _) => values.first().map(|value| (value.kind(), Storage::Series)),
            (None, Some(value)) => Some((value.kind(), Storage::Single)),
            (None, None) => None,
        };

        match existing {
            Some((_, stored)) if stored != storage => Err(PoolError::KeyConflict {
                key: key.to_string(),
                existing: key.to_string(),
            }),
            Some((expected, _)) if expected != kind => Err(PoolError::TypeMismatch {
                key: key.to_string(),
                expected,
                found: kind,
            }),
            Some(_) => Ok(false),
            None => {
                validate_key(key)?;
                if let Some(other) = self
                    .keys()
                    .find(|other| is_branch_of(other, key) || is_branch_of(key, other))
                {
                    return Err(PoolError::KeyConflict {
                        key: key.to_string(),
                        existing: other.to_string(),
                    });
                }
                Ok(true)
            }
        }
    }
}

/// Checks the dotted-path syntax of a key.
pub fn validate_key(key: &str) -> Result<()> {
    let invalid = |reason| PoolError::InvalidKey {
        key: key.to_string(),
        reason,
    };

    if key.is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.split('.').any(str::is_empty) {
        return Err(invalid("key contains an empty segment"));
    }
    if key.split('.').next() == Some(METADATA_ROOT) {
        return Err(invalid("the `metadata` root is reserved"));
    }

    Ok(())
}

/// True when `prefix` names an ancestor node of `key` in the hierarchy.
fn is_branch_of(prefix: &str, key: &str) -> bool {
    key.len() > prefix.len()
        && key.starts_with(prefix)
        && key.as_bytes()[prefix.len()] == b'.'
}
