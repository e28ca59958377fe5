//! Count source backed by a small JSON file that another process keeps current

use super::QuerySource;
use crate::category::Category;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// `{"text": 1, "missed_call": 0, "voicemail": 0}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnreadCounts {
    pub text: u32,
    pub missed_call: u32,
    pub voicemail: u32,
}

impl UnreadCounts {
    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Text => self.text,
            Category::MissedCall => self.missed_call,
            Category::Voicemail => self.voicemail,
        }
    }
}

/// Re-reads the file on every query. A missing or malformed file is a query
/// failure, which expires the category instead of alerting.
#[derive(Debug, Clone)]
pub struct CountsFileSource {
    path: PathBuf,
}

impl CountsFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> Result<UnreadCounts> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", self.path.display()))
    }
}

impl QuerySource for CountsFileSource {
    fn count(&mut self, category: Category) -> Result<u32> {
        Ok(self.read()?.get(category))
    }
}
