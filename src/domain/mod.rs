//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Story Context: 故事内容（只读输入）
//! - Narration Context: 叙述队列、状态与估算
//!
//! 以及共享参考数据：经文全局编号、朗诵者目录

pub mod narration;
pub mod quran;
pub mod reciter;
pub mod story;

pub use quran::global_verse_number;
pub use reciter::{Reciter, ReciterCatalog};
