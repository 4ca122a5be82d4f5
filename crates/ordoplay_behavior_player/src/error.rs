// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player error type.

use ordoplay_behavior_graph::BehaviorError;
use std::path::PathBuf;

/// Error raised while loading or playing a scene
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// A file could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// A RON file is malformed
    #[error("{}: {source}", path.display())]
    Ron {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: ron::error::SpannedError,
    },

    /// Behavior metadata could not be loaded or saved
    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    /// Bad command line
    #[error("{0}")]
    Usage(String),
}

impl PlayerError {
    /// Wrap an IO error with the file it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for the player
pub type Result<T> = std::result::Result<T, PlayerError>;
