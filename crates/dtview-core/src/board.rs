//! Board metadata database - maps board identifiers to board records
//!
//! Records provide the human-readable board name, architecture, and the
//! supported feature and toolchain lists shown in the board overview.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Failed to read board index: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse board index: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize board index: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Metadata for a single board
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardInfo {
    /// Board identifier (e.g., "nrf52840dk_nrf52840")
    pub id: String,
    /// Human-readable board name
    #[serde(default)]
    pub name: Option<String>,
    /// CPU architecture (e.g., "arm")
    #[serde(default)]
    pub arch: Option<String>,
    /// Supported hardware features
    #[serde(default)]
    pub supported: Vec<String>,
    /// Supported toolchains
    #[serde(default)]
    pub toolchain: Vec<String>,
}

impl BoardInfo {
    /// True when the record carries nothing worth showing
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.arch.is_none()
            && self.supported.is_empty()
            && self.toolchain.is_empty()
    }
}

/// Source of board records
pub trait BoardLookup: Send + Sync {
    fn lookup(&self, board: &str) -> Option<BoardInfo>;
}

/// The board index file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardIndex {
    /// Version of the board index format
    #[serde(default = "default_version")]
    pub version: String,
    /// List of board records
    #[serde(default)]
    pub board: Vec<BoardInfo>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for BoardIndex {
    fn default() -> Self {
        Self {
            version: default_version(),
            board: Vec::new(),
        }
    }
}

impl BoardIndex {
    /// Load board index from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, BoardError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load board index from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, BoardError> {
        let index: BoardIndex = toml::from_str(content)?;
        Ok(index)
    }

    /// Find a board record by id (case-insensitive)
    pub fn find(&self, board: &str) -> Option<&BoardInfo> {
        self.board.iter().find(|b| b.id.eq_ignore_ascii_case(board))
    }

    /// Add a board record
    pub fn add(&mut self, board: BoardInfo) {
        self.board.push(board);
    }

    /// Save the index to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), BoardError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Board database with in-memory lookup cache
#[derive(Debug)]
pub struct BoardDatabase {
    index: BoardIndex,
    /// Cache of board id -> record lookups
    cache: Mutex<HashMap<String, Option<BoardInfo>>>,
}

impl BoardDatabase {
    /// Create a new board database from an index
    pub fn new(index: BoardIndex) -> Self {
        Self {
            index,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load from a file
    pub fn from_file(path: &Path) -> Result<Self, BoardError> {
        let index = BoardIndex::from_file(path)?;
        Ok(Self::new(index))
    }

    /// Create an empty database
    pub fn empty() -> Self {
        Self::new(BoardIndex::default())
    }

    /// Get the underlying index
    pub fn index(&self) -> &BoardIndex {
        &self.index
    }

    /// Clear the lookup cache
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Reload the index from a file
    pub fn reload(&mut self, path: &Path) -> Result<(), BoardError> {
        self.index = BoardIndex::from_file(path)?;
        self.clear_cache();
        Ok(())
    }
}

impl BoardLookup for BoardDatabase {
    fn lookup(&self, board: &str) -> Option<BoardInfo> {
        let key = board.to_lowercase();

        if let Ok(cache) = self.cache.lock() {
            if let Some(cached) = cache.get(&key) {
                return cached.clone();
            }
        }

        let result = self.index.find(board).cloned();
        debug!(board = %board, found = result.is_some(), "Board lookup");
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, result.clone());
        }
        result
    }
}
