//! Fills [`Decode`] values from environment variables or anything shaped
//! like them.
//!
//! This crate only finds the text for a key and hands it to the target; what
//! the text means is up to the target's [`Decode`] impl.

use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::BuildHasher;

pub use kind::{Decode, ParseError};

/// A way to look up raw text by key.
pub trait Source {
    /// `Ok(None)` when `key` is not set.
    fn var(&self, key: &str) -> Result<Option<String>, LoadError>;
}

/// The process environment.
#[derive(Clone, Debug, Default)]
pub struct Env {
    prefix: Option<String>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every key as `<prefix>_<key>`, so with prefix `APP` the key
    /// `START` comes from `APP_START`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn full_key<'key>(&self, key: &'key str) -> Cow<'key, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}_{key}")),
            None => Cow::Borrowed(key),
        }
    }
}

impl Source for Env {
    fn var(&self, key: &str) -> Result<Option<String>, LoadError> {
        use std::env::VarError;

        match std::env::var(self.full_key(key).as_ref()) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(LoadError::NotUnicode {
                key: key.to_owned(),
            }),
        }
    }
}

impl<S: BuildHasher> Source for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Result<Option<String>, LoadError> {
        Ok(self.get(key).cloned())
    }
}

/// Keys are reported as they were passed in, without any [`Env`] prefix.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{key} is not set")]
    Missing { key: String },
    #[error("{key} is not valid unicode")]
    NotUnicode { key: String },
    #[error("{key} has an invalid value")]
    Invalid {
        key: String,
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    pub fn key(&self) -> &str {
        match self {
            Self::Missing { key } | Self::NotUnicode { key } | Self::Invalid { key, .. } => key,
        }
    }
}

/// Decodes the text under `key` into `target`.
///
/// Returns `Ok(false)` and leaves `target` alone when `key` is not set. On
/// error `target` is also left as it was.
pub fn load<T>(
    source: &(impl Source + ?Sized),
    key: &str,
    target: &mut T,
) -> Result<bool, LoadError>
where
    T: Decode + ?Sized,
{
    let Some(text) = source.var(key)? else {
        tracing::debug!(key, "not set, keeping current value");
        return Ok(false);
    };

    match target.decode(&text) {
        Ok(()) => {
            tracing::trace!(key, "loaded");
            Ok(true)
        }
        Err(source) => {
            tracing::warn!(key, error = %source, "invalid value");
            Err(LoadError::Invalid {
                key: key.to_owned(),
                source,
            })
        }
    }
}

/// Like [`load`], but a missing key is an error.
pub fn require<T>(
    source: &(impl Source + ?Sized),
    key: &str,
    target: &mut T,
) -> Result<(), LoadError>
where
    T: Decode + ?Sized,
{
    if load(source, key, target)? {
        Ok(())
    } else {
        Err(LoadError::Missing {
            key: key.to_owned(),
        })
    }
}
