//! Narration Context - 队列构建
//!
//! 纯函数：给定故事内容和播放设置，生成有序的叙述条目
//!
//! 章节内顺序固定为：正文 → 经文（引导语、朗诵、译文）→ 圣训

use crate::domain::reciter::Reciter;
use crate::domain::story::{Hadith, Section, Story, Verse};

use super::{NarrationQueueItem, SpeechItem, SpeechRole};

/// 预渲染音频路径模板中的占位符
const STORY_ID_PLACEHOLDER: &str = "{story_id}";
const SECTION_ID_PLACEHOLDER: &str = "{section_id}";

/// 队列构建设置
///
/// 在 narrate 调用时按当前朗诵者生成，已入队条目的 URL 不会随设置变化
#[derive(Debug, Clone)]
pub struct QueueBuilder {
    reciter: Reciter,
    recitation_base_url: String,
    assets_base_url: String,
    prebaked_template: String,
}

impl QueueBuilder {
    pub fn new(
        reciter: Reciter,
        recitation_base_url: impl Into<String>,
        assets_base_url: impl Into<String>,
        prebaked_template: impl Into<String>,
    ) -> Self {
        Self {
            reciter,
            recitation_base_url: recitation_base_url.into(),
            assets_base_url: assets_base_url.into(),
            prebaked_template: prebaked_template.into(),
        }
    }

    pub fn reciter(&self) -> &Reciter {
        &self.reciter
    }

    /// 预渲染章节音频 URL
    pub fn prebaked_url(&self, story_id: &str, section_id: &str) -> String {
        let path = self
            .prebaked_template
            .replace(STORY_ID_PLACEHOLDER, story_id)
            .replace(SECTION_ID_PLACEHOLDER, section_id);
        format!("{}{}", self.assets_base_url.trim_end_matches('/'), path)
    }

    /// 单个章节的队列
    ///
    /// 条目数为 `1 + 3v + h`（v 为经文数，h 为圣训数）；
    /// 经文引用越界时省略该节的朗诵条目
    pub fn build_section_queue(
        &self,
        section: &Section,
        story_id: &str,
        prophet_name: &str,
    ) -> Vec<NarrationQueueItem> {
        let mut items = Vec::with_capacity(1 + section.verses.len() * 3 + section.hadiths.len());

        let fallback_text = Some(section.content.clone()).filter(|t| !t.trim().is_empty());
        items.push(
            NarrationQueueItem::prebaked(self.prebaked_url(story_id, &section.id), fallback_text)
                .in_section(&section.id, &section.title),
        );

        for verse in &section.verses {
            self.push_verse(&mut items, section, verse);
        }

        for hadith in &section.hadiths {
            items.push(
                NarrationQueueItem::speech(hadith_speech(hadith))
                    .in_section(&section.id, &section.title),
            );
        }

        tracing::debug!(
            story_id = %story_id,
            prophet = %prophet_name,
            section_id = %section.id,
            items = items.len(),
            "Section queue built"
        );

        items
    }

    /// 完整故事队列：开场介绍 → 所有章节 → 要点总结（如有）
    pub fn build_full_story_queue(&self, story: &Story) -> Vec<NarrationQueueItem> {
        self.build_from_section_queue(story, 0)
    }

    /// 从指定章节开始的队列
    ///
    /// 与完整故事队列相同，只是跳过 `start_index` 之前的章节：
    /// - 开场介绍属于第一章之前的位置，因此仅在 `start_index == 0` 时出现，
    ///   此时结果与 [`build_full_story_queue`](Self::build_full_story_queue) 一致
    /// - 要点总结始终追加在末尾（如有），越界起点也不例外
    pub fn build_from_section_queue(
        &self,
        story: &Story,
        start_index: usize,
    ) -> Vec<NarrationQueueItem> {
        let mut items = Vec::new();

        if start_index == 0 {
            items.push(NarrationQueueItem::speech(SpeechItem::new(
                story_intro_text(story),
                SpeechRole::StoryIntro,
            )));
        }

        for section in story.sections.iter().skip(start_index) {
            items.extend(self.build_section_queue(section, &story.id, &story.prophet_name));
        }

        if let Some(text) = key_lessons_text(story) {
            items.push(NarrationQueueItem::speech(SpeechItem::new(
                text,
                SpeechRole::KeyLessons,
            )));
        }

        items
    }

    fn push_verse(&self, items: &mut Vec<NarrationQueueItem>, section: &Section, verse: &Verse) {
        let reference = verse.reference();

        items.push(
            NarrationQueueItem::speech(
                SpeechItem::new(
                    format!("Surah {}, verse {}.", verse.surah, verse.verse),
                    SpeechRole::VerseIntro,
                )
                .with_verse(reference),
            )
            .in_section(&section.id, &section.title),
        );

        match self
            .reciter
            .recitation_url(&self.recitation_base_url, reference)
        {
            Some(url) => items.push(
                NarrationQueueItem::recitation(url, reference, &self.reciter.identifier)
                    .in_section(&section.id, &section.title),
            ),
            None => tracing::warn!(
                section_id = %section.id,
                verse = %reference,
                "Verse reference out of range, recitation omitted"
            ),
        }

        items.push(
            NarrationQueueItem::speech(
                SpeechItem::new(verse.translation.clone(), SpeechRole::Translation)
                    .with_verse(reference),
            )
            .in_section(&section.id, &section.title),
        );
    }
}

fn story_intro_text(story: &Story) -> String {
    let mut text = format!("The story of Prophet {}.", story.prophet_name);
    if !story.summary.trim().is_empty() {
        text.push(' ');
        text.push_str(story.summary.trim());
    }
    text
}

fn key_lessons_text(story: &Story) -> Option<String> {
    if story.key_lessons.is_empty() {
        return None;
    }

    let lessons = story
        .key_lessons
        .iter()
        .enumerate()
        .map(|(i, lesson)| format!("{}. {}", i + 1, lesson.trim()))
        .collect::<Vec<_>>()
        .join(" ");

    Some(format!(
        "Key lessons from the story of Prophet {}: {}",
        story.prophet_name, lessons
    ))
}

/// 圣训朗读文本
pub fn hadith_text(hadith: &Hadith) -> String {
    let mut text = format!(
        "As narrated in {}, {}: \"{}\"",
        hadith.source, hadith.book, hadith.text
    );
    if let Some(grade) = hadith.grade.as_deref().filter(|g| !g.trim().is_empty()) {
        text.push_str(&format!(" This hadith is graded {}.", grade));
    }
    text
}

fn hadith_speech(hadith: &Hadith) -> SpeechItem {
    SpeechItem {
        text: hadith_text(hadith),
        role: SpeechRole::Hadith,
        verse: None,
        source: Some(hadith.source.clone()),
        grade: hadith.grade.clone(),
    }
}
