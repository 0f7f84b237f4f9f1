//! Animation Registry
//!
//! Maps animation names to their [`FrameSet`]. The registry is assembled once
//! during startup and then shared behind an `Arc`; it exposes no mutation API
//! so concurrent connections can read it without locking.

use std::collections::HashMap;

use thiserror::Error;

use crate::frames::{FrameSet, FrameSetError, DEFAULT_INTERVAL, SEAL_FRAMES};

/// Name served when a request does not name an animation
pub const DEFAULT_ANIMATION: &str = "seal";

/// Errors raised while assembling a registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two animations were registered under the same name
    #[error("animation '{0}' registered twice")]
    DuplicateName(String),

    /// An animation name was empty or contained a path separator
    #[error("invalid animation name '{0}'")]
    InvalidName(String),

    /// Built-in artwork failed validation
    #[error("invalid frame set: {0}")]
    FrameSet(#[from] FrameSetError),
}

/// Read-only table of named animations
#[derive(Clone, Debug, Default)]
pub struct AnimationRegistry {
    animations: HashMap<String, FrameSet>,
}

impl AnimationRegistry {
    /// Assemble a registry from `(name, frames)` pairs
    ///
    /// # Errors
    ///
    /// Fails on duplicate names or names that could never be addressed by a
    /// single path segment.
    pub fn new<I, N>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (N, FrameSet)>,
        N: Into<String>,
    {
        let mut animations = HashMap::new();

        for (name, frames) in entries {
            let name = name.into();
            if name.is_empty() || name.contains('/') {
                return Err(RegistryError::InvalidName(name));
            }
            if animations.contains_key(&name) {
                return Err(RegistryError::DuplicateName(name));
            }
            animations.insert(name, frames);
        }

        Ok(Self { animations })
    }

    /// Registry holding the animations shipped with the server
    ///
    /// # Errors
    ///
    /// Only if the built-in artwork is invalid.
    pub fn builtin() -> Result<Self, RegistryError> {
        let seal = FrameSet::from_static(SEAL_FRAMES, DEFAULT_INTERVAL)?;
        Self::new([(DEFAULT_ANIMATION, seal)])
    }

    /// Look up an animation by name
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&FrameSet> {
        self.animations.get(name)
    }

    /// Registered names, sorted for stable output
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.animations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered animations
    #[must_use]
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    /// Whether the registry holds no animations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Iterate `(name, frames)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrameSet)> + '_ {
        self.names()
            .into_iter()
            .filter_map(|name| self.animations.get(name).map(|frames| (name, frames)))
    }
}
