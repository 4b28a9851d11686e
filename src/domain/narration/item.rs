//! Narration Context - 队列条目
//!
//! 条目入队后不可变；每种来源一个变体，回退逻辑可以穷举匹配

use serde::{Deserialize, Serialize};

use crate::domain::story::VerseRef;

/// 条目来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NarrationItemKind {
    /// 预渲染音频文件
    PrebakedAsset,
    /// 远程朗诵目录中的经文朗诵
    StreamedRecitation,
    /// 按需合成语音
    SynthesizedSpeech,
}

impl NarrationItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrationItemKind::PrebakedAsset => "prebaked-asset",
            NarrationItemKind::StreamedRecitation => "streamed-recitation",
            NarrationItemKind::SynthesizedSpeech => "synthesized-speech",
        }
    }
}

impl std::fmt::Display for NarrationItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 合成语音条目的用途，同时决定使用的音色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechRole {
    StoryIntro,
    VerseIntro,
    Translation,
    Hadith,
    KeyLessons,
    /// 预渲染音频缺失时的替代朗读
    Fallback,
}

/// 条目所属章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTag {
    pub section_id: String,
    pub section_title: String,
}

/// 预渲染音频条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebakedItem {
    pub url: String,
    /// 音频缺失时用于合成的原文
    pub fallback_text: Option<String>,
}

/// 经文朗诵条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecitationItem {
    pub url: String,
    pub verse: VerseRef,
    pub reciter: String,
}

/// 合成语音条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechItem {
    pub text: String,
    pub role: SpeechRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verse: Option<VerseRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

impl SpeechItem {
    pub fn new(text: impl Into<String>, role: SpeechRole) -> Self {
        Self {
            text: text.into(),
            role,
            verse: None,
            source: None,
            grade: None,
        }
    }

    pub fn with_verse(mut self, verse: VerseRef) -> Self {
        self.verse = Some(verse);
        self
    }
}

/// 条目内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NarrationPayload {
    PrebakedAsset(PrebakedItem),
    StreamedRecitation(RecitationItem),
    SynthesizedSpeech(SpeechItem),
}

/// 叙述队列条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationQueueItem {
    #[serde(flatten)]
    pub payload: NarrationPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionTag>,
}

impl NarrationQueueItem {
    pub fn prebaked(url: impl Into<String>, fallback_text: Option<String>) -> Self {
        Self {
            payload: NarrationPayload::PrebakedAsset(PrebakedItem {
                url: url.into(),
                fallback_text,
            }),
            section: None,
        }
    }

    pub fn recitation(url: impl Into<String>, verse: VerseRef, reciter: impl Into<String>) -> Self {
        Self {
            payload: NarrationPayload::StreamedRecitation(RecitationItem {
                url: url.into(),
                verse,
                reciter: reciter.into(),
            }),
            section: None,
        }
    }

    pub fn speech(item: SpeechItem) -> Self {
        Self {
            payload: NarrationPayload::SynthesizedSpeech(item),
            section: None,
        }
    }

    pub fn in_section(mut self, section_id: &str, section_title: &str) -> Self {
        self.section = Some(SectionTag {
            section_id: section_id.to_string(),
            section_title: section_title.to_string(),
        });
        self
    }

    pub fn kind(&self) -> NarrationItemKind {
        match &self.payload {
            NarrationPayload::PrebakedAsset(_) => NarrationItemKind::PrebakedAsset,
            NarrationPayload::StreamedRecitation(_) => NarrationItemKind::StreamedRecitation,
            NarrationPayload::SynthesizedSpeech(_) => NarrationItemKind::SynthesizedSpeech,
        }
    }

    /// URL（预渲染/朗诵）或待合成的文本（合成语音）
    pub fn locator(&self) -> &str {
        match &self.payload {
            NarrationPayload::PrebakedAsset(item) => &item.url,
            NarrationPayload::StreamedRecitation(item) => &item.url,
            NarrationPayload::SynthesizedSpeech(item) => &item.text,
        }
    }

    pub fn verse_ref(&self) -> Option<VerseRef> {
        match &self.payload {
            NarrationPayload::PrebakedAsset(_) => None,
            NarrationPayload::StreamedRecitation(item) => Some(item.verse),
            NarrationPayload::SynthesizedSpeech(item) => item.verse,
        }
    }

    pub fn section_id(&self) -> Option<&str> {
        self.section.as_ref().map(|s| s.section_id.as_str())
    }

    pub fn is_translation(&self) -> bool {
        matches!(
            &self.payload,
            NarrationPayload::SynthesizedSpeech(SpeechItem {
                role: SpeechRole::Translation,
                ..
            })
        )
    }

    pub fn is_hadith(&self) -> bool {
        matches!(
            &self.payload,
            NarrationPayload::SynthesizedSpeech(SpeechItem {
                role: SpeechRole::Hadith,
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_accessors() {
        let item = NarrationQueueItem::recitation("http://cdn/1.mp3", VerseRef::new(1, 1), "ar.alafasy")
            .in_section("s1", "Opening");
        assert_eq!(item.kind(), NarrationItemKind::StreamedRecitation);
        assert_eq!(item.locator(), "http://cdn/1.mp3");
        assert_eq!(item.verse_ref(), Some(VerseRef::new(1, 1)));
        assert_eq!(item.section_id(), Some("s1"));
        assert!(!item.is_translation());
    }

    #[test]
    fn test_serialize_kind_tag() {
        let item = NarrationQueueItem::speech(SpeechItem::new("Hello", SpeechRole::Translation))
            .in_section("s1", "Opening");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "synthesized-speech");
        assert_eq!(json["text"], "Hello");
        assert_eq!(json["section"]["sectionId"], "s1");
        assert!(item.is_translation());
    }
}
