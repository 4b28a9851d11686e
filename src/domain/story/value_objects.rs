//! Story Context - Value Objects

use serde::{Deserialize, Serialize};

/// 经文引用（章号 + 节号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseRef {
    pub surah: u16,
    pub verse: u16,
}

impl VerseRef {
    pub fn new(surah: u16, verse: u16) -> Self {
        Self { surah, verse }
    }
}

impl std::fmt::Display for VerseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.surah, self.verse)
    }
}
