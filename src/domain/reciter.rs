//! Reciter Catalog - 朗诵者目录
//!
//! 远程朗诵音频按 `{base}/{bitrate}/{identifier}/{global}.mp3` 寻址

use serde::{Deserialize, Serialize};

use super::quran::global_verse_number;
use super::story::VerseRef;

/// 朗诵者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reciter {
    /// CDN 标识，例如 `ar.alafasy`
    pub identifier: String,
    /// 显示名称
    pub name: String,
    /// 音频比特率（kbps），同时是 URL 路径的一部分
    pub bitrate: u32,
}

impl Reciter {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>, bitrate: u32) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            bitrate,
        }
    }

    /// 构建某节经文的朗诵 URL
    ///
    /// 经文引用越界时返回 `None`
    pub fn recitation_url(&self, base_url: &str, verse: VerseRef) -> Option<String> {
        let global = global_verse_number(verse)?;
        Some(format!(
            "{}/{}/{}/{}.mp3",
            base_url.trim_end_matches('/'),
            self.bitrate,
            self.identifier,
            global
        ))
    }
}

/// 朗诵者目录
///
/// 不变量:
/// - 至少包含一个朗诵者
/// - 默认朗诵者必定在目录中
#[derive(Debug, Clone)]
pub struct ReciterCatalog {
    reciters: Vec<Reciter>,
    default_index: usize,
}

impl ReciterCatalog {
    /// 创建目录，`default_id` 必须存在于列表中
    pub fn new(reciters: Vec<Reciter>, default_id: &str) -> Option<Self> {
        let default_index = reciters.iter().position(|r| r.identifier == default_id)?;
        Some(Self {
            reciters,
            default_index,
        })
    }

    pub fn get(&self, identifier: &str) -> Option<&Reciter> {
        self.reciters.iter().find(|r| r.identifier == identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    pub fn default_reciter(&self) -> &Reciter {
        &self.reciters[self.default_index]
    }

    pub fn reciters(&self) -> &[Reciter] {
        &self.reciters
    }

    /// 以另一个默认朗诵者重建目录
    pub fn with_default(mut self, identifier: &str) -> Option<Self> {
        self.default_index = self.reciters.iter().position(|r| r.identifier == identifier)?;
        Some(self)
    }
}

impl Default for ReciterCatalog {
    fn default() -> Self {
        Self {
            reciters: vec![
                Reciter::new("ar.alafasy", "Mishary Rashid Alafasy", 128),
                Reciter::new("ar.husary", "Mahmoud Khalil Al-Husary", 128),
                Reciter::new("ar.minshawi", "Mohamed Siddiq Al-Minshawi", 128),
                Reciter::new("ar.abdulbasitmurattal", "Abdul Basit (Murattal)", 192),
            ],
            default_index: 0,
        }
    }
}
