//! Narration Context - 播放状态快照
//!
//! 每次状态迁移都生成新的快照，订阅者永远看不到写了一半的状态

use serde::Serialize;
use uuid::Uuid;

use super::NarrationQueueItem;

/// 由快照推导出的状态机阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationPhase {
    Idle,
    Loading,
    Playing,
    Paused,
    Completed,
}

/// 叙述状态
///
/// 不变量:
/// - is_playing 与 is_paused 不会同时为 true
/// - 播放/暂停/加载期间 current_index 位于 [0, total_items)
/// - 队列结束后 current_item 为 None、current_index == total_items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationState {
    pub is_playing: bool,
    pub is_paused: bool,
    pub is_loading: bool,
    pub current_item: Option<NarrationQueueItem>,
    pub current_index: usize,
    pub total_items: usize,
    /// 0-100
    pub progress: f64,
    /// 秒
    pub current_time: f64,
    /// 秒
    pub duration: f64,
    pub current_section_id: Option<String>,
    pub current_story_id: Option<String>,
    pub current_prophet_name: Option<String>,
    /// 最近一次非致命错误，下一个条目成功开始时清除
    pub error: Option<String>,
    /// 当前 narrate 调用对应的会话 ID（用于日志关联）
    pub session_id: Option<Uuid>,
}

impl NarrationState {
    pub fn phase(&self) -> NarrationPhase {
        if self.is_paused {
            NarrationPhase::Paused
        } else if self.is_loading && self.current_item.is_some() {
            NarrationPhase::Loading
        } else if self.is_playing {
            NarrationPhase::Playing
        } else if self.is_completed() {
            NarrationPhase::Completed
        } else {
            NarrationPhase::Idle
        }
    }

    /// 队列已播完
    pub fn is_completed(&self) -> bool {
        !self.is_playing
            && !self.is_paused
            && self.current_item.is_none()
            && self.total_items > 0
            && self.current_index >= self.total_items
    }

    /// 是否有活动队列（播放、暂停或加载中）
    pub fn is_active(&self) -> bool {
        self.current_item.is_some() && (self.is_playing || self.is_paused || self.is_loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state = NarrationState::default();
        assert_eq!(state.phase(), NarrationPhase::Idle);
        assert!(!state.is_active());
        assert!(!state.is_completed());
    }

    #[test]
    fn test_completed_phase() {
        let state = NarrationState {
            current_index: 3,
            total_items: 3,
            progress: 100.0,
            ..Default::default()
        };
        assert_eq!(state.phase(), NarrationPhase::Completed);
    }

    #[test]
    fn test_serialize_camel_case() {
        let state = NarrationState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["isPlaying"], false);
        assert_eq!(json["totalItems"], 0);
        assert!(json["currentItem"].is_null());
    }
}
