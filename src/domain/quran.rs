//! Quran Reference Data - 经文全局编号
//!
//! 远程朗诵目录按全局节号（1..=6236）寻址

use super::story::VerseRef;

/// 每章节数（第 1 章到第 114 章）
const VERSE_COUNTS: [u16; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, //
    123, 111, 43, 52, 99, 128, 111, 110, 98, 135, //
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, //
    34, 30, 73, 54, 45, 83, 182, 88, 75, 85, //
    54, 53, 89, 59, 37, 35, 38, 29, 18, 45, //
    60, 49, 62, 55, 78, 96, 29, 22, 24, 13, //
    14, 11, 11, 18, 12, 12, 30, 52, 52, 44, //
    28, 28, 20, 56, 40, 31, 50, 40, 46, 42, //
    29, 19, 36, 25, 22, 17, 19, 26, 30, 20, //
    15, 21, 11, 8, 8, 19, 5, 8, 8, 11, //
    11, 8, 3, 9, 5, 4, 7, 3, 6, 3, //
    5, 4, 5, 6,
];

/// 章数
pub const SURAH_COUNT: u16 = 114;

/// 全部经文节数
pub const TOTAL_VERSES: u32 = 6236;

/// 指定章的节数
pub fn verse_count(surah: u16) -> Option<u16> {
    if surah == 0 || surah > SURAH_COUNT {
        return None;
    }
    Some(VERSE_COUNTS[surah as usize - 1])
}

/// 计算全局节号
///
/// 返回 `None` 表示章号或节号越界
pub fn global_verse_number(reference: VerseRef) -> Option<u32> {
    let count = verse_count(reference.surah)?;
    if reference.verse == 0 || reference.verse > count {
        return None;
    }

    let before: u32 = VERSE_COUNTS[..reference.surah as usize - 1]
        .iter()
        .map(|&c| c as u32)
        .sum();
    Some(before + reference.verse as u32)
}
