//! Story Context - 故事内容限界上下文
//!
//! 职责:
//! - 内容库中的故事、章节、经文、圣训记录（只读输入）
//! - 经文引用值对象

mod entities;
mod value_objects;

pub use entities::{Hadith, Section, Story, Verse};
pub use value_objects::VerseRef;
