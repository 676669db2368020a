use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{GridReducer, ReductionPolicy};
use crate::output::{Layout, SymbolicEncoder};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Conversion settings, loadable from a JSON file.
///
/// Missing fields take their defaults, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Grid cells per quarter note (4 = sixteenth notes)
    pub cells_per_quarter: u32,
    /// Cells per output line
    pub bar_cells: usize,
    /// Sequences must be longer than this many cells to be printed
    pub min_cells: usize,
    pub layout: Layout,
    pub policy: ReductionPolicy,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            cells_per_quarter: 4,
            bar_cells: 16,
            min_cells: 0,
            layout: Layout::Strudel,
            policy: ReductionPolicy::default(),
        }
    }
}

impl ConvertConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn reducer(&self, division: u16) -> GridReducer {
        GridReducer::for_division(division, self.cells_per_quarter, self.policy)
    }

    pub fn encoder(&self) -> SymbolicEncoder {
        SymbolicEncoder::new(self.bar_cells, self.min_cells, self.layout)
    }
}
