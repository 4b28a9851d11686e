//! Progress Reporter - 跨后端的进度归一化

/// 归一化后的进度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    /// 秒
    pub current_time: f64,
    /// 秒
    pub duration: f64,
    /// 0-100
    pub progress: f64,
}

impl ProgressReport {
    /// `progress = current_time / duration * 100`，两种后端使用同一公式
    pub fn normalize(current_time: f64, duration: f64) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
        let current_time = if current_time.is_finite() {
            current_time.max(0.0)
        } else {
            0.0
        };

        if duration == 0.0 {
            return Self {
                current_time,
                duration,
                progress: 0.0,
            };
        }

        let current_time = current_time.min(duration);
        Self {
            current_time,
            duration,
            progress: (current_time / duration * 100.0).clamp(0.0, 100.0),
        }
    }

    /// 条目播放完毕
    pub fn finished(duration: f64) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            current_time: duration,
            duration,
            progress: 100.0,
        }
    }
}
