//! Narration Context - 时长估算
//!
//! 播放前估算整个故事的叙述时长（分钟）

use crate::domain::story::Story;

const INTRO_SECS: f64 = 10.0;
const WORDS_PER_MINUTE: f64 = 150.0;
/// 引导语 + 朗诵 + 译文
const VERSE_SECS: f64 = 20.0;
const HADITH_SECS: f64 = 15.0;
const SECTION_TRANSITION_SECS: f64 = 2.0;
const KEY_LESSONS_SECS: f64 = 15.0;

/// 估算故事叙述时长，返回向上取整的分钟数
pub fn estimate_story_duration(story: &Story) -> u32 {
    let mut total = INTRO_SECS;

    for section in &story.sections {
        total += section.word_count() as f64 / WORDS_PER_MINUTE * 60.0;
        total += section.verses.len() as f64 * VERSE_SECS;
        total += section.hadiths.len() as f64 * HADITH_SECS;
        total += SECTION_TRANSITION_SECS;
    }

    if !story.key_lessons.is_empty() {
        total += KEY_LESSONS_SECS;
    }

    (total / 60.0).ceil() as u32
}

/// 时长显示文本
pub fn format_duration(minutes: u32) -> String {
    match minutes {
        0 => "< 1 min".to_string(),
        1 => "1 min".to_string(),
        n => format!("{} mins", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{Hadith, Section, Verse};

    fn section_with(words: usize, verses: usize, hadiths: usize) -> Section {
        Section {
            id: "s".to_string(),
            title: String::new(),
            content: vec!["word"; words].join(" "),
            verses: (0..verses)
                .map(|i| Verse {
                    surah: 1,
                    verse: i as u16 + 1,
                    translation: String::new(),
                })
                .collect(),
            hadiths: (0..hadiths)
                .map(|_| Hadith {
                    source: "Bukhari".to_string(),
                    book: String::new(),
                    text: "text".to_string(),
                    grade: None,
                })
                .collect(),
        }
    }

    fn story_with(sections: Vec<Section>, lessons: usize) -> Story {
        Story {
            id: "id".to_string(),
            prophet_name: "Musa".to_string(),
            summary: String::new(),
            key_lessons: vec!["lesson".to_string(); lessons],
            sections,
        }
    }

    #[test]
    fn test_estimate_reference_story() {
        // ceil((10 + 60 + 20 + 15 + 2) / 60) = 2
        let story = story_with(vec![section_with(150, 1, 1)], 0);
        assert_eq!(estimate_story_duration(&story), 2);
    }

    #[test]
    fn test_estimate_includes_key_lessons() {
        // 10 + 2 + 15 = 27s
        let story = story_with(vec![section_with(0, 0, 0)], 1);
        assert_eq!(estimate_story_duration(&story), 1);

        // 10 + 60 + 20 + 15 + 2 + 15 = 122s
        let story = story_with(vec![section_with(150, 1, 1)], 2);
        assert_eq!(estimate_story_duration(&story), 3);
    }

    #[test]
    fn test_estimate_empty_story() {
        let story = story_with(vec![], 0);
        assert_eq!(estimate_story_duration(&story), 1);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "< 1 min");
        assert_eq!(format_duration(1), "1 min");
        assert_eq!(format_duration(12), "12 mins");
    }
}
