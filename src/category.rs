//! Alert categories - the three kinds of missed communication we watch

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Text,
    MissedCall,
    Voicemail,
}

impl Category {
    /// All categories in a fixed order
    pub const ALL: [Category; 3] = [Category::Text, Category::MissedCall, Category::Voicemail];

    /// Slot used by [`PerCategory`]
    pub fn index(self) -> usize {
        match self {
            Category::Text => 0,
            Category::MissedCall => 1,
            Category::Voicemail => 2,
        }
    }

    /// Human readable name used in logs and console output
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Text => "Text Alerts",
            Category::MissedCall => "Missed Call Alerts",
            Category::Voicemail => "Voice Mail Alerts",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Text => write!(f, "text"),
            Category::MissedCall => write!(f, "missed_call"),
            Category::Voicemail => write!(f, "voicemail"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "sms" | "mms" => Ok(Category::Text),
            "missed_call" | "missed-call" | "call" | "calls" => Ok(Category::MissedCall),
            "voicemail" | "voice_mail" | "vm" => Ok(Category::Voicemail),
            _ => Err(anyhow!("Unknown category: {}", s)),
        }
    }
}

/// Fixed-size table holding one value per category.
///
/// Per-category state (pending flags, sessions, configs) lives here instead of
/// in three copies of the same field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerCategory<T> {
    slots: [T; 3],
}

impl<T> PerCategory<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            slots: [
                f(Category::Text),
                f(Category::MissedCall),
                f(Category::Voicemail),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Category, &mut T)> {
        Category::ALL.into_iter().zip(self.slots.iter_mut())
    }
}

impl<T> Index<Category> for PerCategory<T> {
    type Output = T;

    fn index(&self, category: Category) -> &T {
        &self.slots[category.index()]
    }
}

impl<T> IndexMut<Category> for PerCategory<T> {
    fn index_mut(&mut self, category: Category) -> &mut T {
        &mut self.slots[category.index()]
    }
}
