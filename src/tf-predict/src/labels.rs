use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ClassifyError, Result};

/// Class names indexed the same way as the model's output vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    /// Read a label file with one class name per line; the line number is
    /// the class index. Trailing blank lines are ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let labels_err = |reason: String| ClassifyError::Labels {
            path: path.display().to_string(),
            reason,
        };

        let file = File::open(path).map_err(|e| labels_err(e.to_string()))?;

        let mut names = BufReader::new(file)
            .lines()
            .map(|line| line.map(|l| l.trim().to_owned()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| labels_err(e.to_string()))?;

        while names.last().map_or(false, |n| n.is_empty()) {
            names.pop();
        }

        Labels::new(names).ok_or_else(|| labels_err("no class names found".to_owned()))
    }

    /// Build a table from names in index order. Returns `None` when empty.
    pub fn new(names: Vec<String>) -> Option<Self> {
        if names.is_empty() {
            None
        } else {
            Some(Labels { names })
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
