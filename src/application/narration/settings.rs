//! Settings Controller - 朗诵者与播放速度

use crate::domain::reciter::{Reciter, ReciterCatalog};

pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

/// 把速度限制在 [0.5, 2.0]，非法值返回 `None`
pub fn clamp_speed(multiplier: f32) -> Option<f32> {
    if !multiplier.is_finite() {
        return None;
    }
    Some(multiplier.clamp(MIN_SPEED, MAX_SPEED))
}

/// 播放设置
///
/// 朗诵者只影响之后构建的队列；速度同时作用于当前资源和之后的条目
#[derive(Debug, Clone)]
pub struct SettingsController {
    catalog: ReciterCatalog,
    reciter_id: String,
    speed: f32,
}

impl SettingsController {
    pub fn new(catalog: ReciterCatalog, speed: f32) -> Self {
        let reciter_id = catalog.default_reciter().identifier.clone();
        Self {
            catalog,
            reciter_id,
            speed: clamp_speed(speed).unwrap_or(1.0),
        }
    }

    /// 设置朗诵者，未知 ID 返回 false 且保持原设置
    pub fn set_reciter(&mut self, identifier: &str) -> bool {
        if !self.catalog.contains(identifier) {
            tracing::warn!(reciter = %identifier, "Unknown reciter ignored");
            return false;
        }
        self.reciter_id = identifier.to_string();
        tracing::info!(reciter = %identifier, "Reciter changed");
        true
    }

    /// 设置速度，返回实际生效的值
    pub fn set_speed(&mut self, multiplier: f32) -> f32 {
        match clamp_speed(multiplier) {
            Some(speed) => self.speed = speed,
            None => tracing::warn!(speed = multiplier, "Invalid playback speed ignored"),
        }
        self.speed
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn reciter(&self) -> &Reciter {
        self.catalog
            .get(&self.reciter_id)
            .unwrap_or_else(|| self.catalog.default_reciter())
    }

    pub fn catalog(&self) -> &ReciterCatalog {
        &self.catalog
    }
}
