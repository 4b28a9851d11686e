//! Story Context - Entities
//!
//! 内容库 JSON 的直接映射，字段名与内容文件保持一致（camelCase）

use serde::{Deserialize, Serialize};

use super::VerseRef;

/// 先知故事
///
/// 不变量:
/// - sections 顺序即朗读顺序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub prophet_name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_lessons: Vec<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Story {
    /// 按 ID 查找章节位置
    pub fn section_index(&self, section_id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == section_id)
    }
}

/// 故事章节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub verses: Vec<Verse>,
    #[serde(default)]
    pub hadiths: Vec<Hadith>,
}

impl Section {
    /// 正文词数（按空白分词）
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// 章节引用的经文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    pub surah: u16,
    pub verse: u16,
    #[serde(default)]
    pub translation: String,
}

impl Verse {
    pub fn reference(&self) -> VerseRef {
        VerseRef::new(self.surah, self.verse)
    }
}

/// 章节引用的圣训
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hadith {
    pub source: String,
    #[serde(default)]
    pub book: String,
    pub text: String,
    #[serde(default)]
    pub grade: Option<String>,
}
