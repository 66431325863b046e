//! 行驶标定配置快照

use serde::{Deserialize, Serialize};

use crate::schema::{self, Object};

/// 行驶标定配置
///
/// 十一个字段彼此独立可选；每次加载都产出一份完整快照，缺失或类型
/// 不符的字段保持类型零值，不与之前加载的配置合并。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DriveConfig {
    /// 轮距（毫米）
    pub wheel_track_mm: f32,
    /// 轮半径（毫米）
    pub wheel_radius_mm: f32,
    /// 最小行驶速度（毫米/秒）
    pub min_speed_mm_per_s: f32,
    /// 最大行驶速度（毫米/秒）
    pub max_speed_mm_per_s: f32,
    /// 编码器每圈脉冲数
    pub ticks_per_revolution: f32,
    /// 停止时是否刹车
    pub brake_on_stop: bool,
    /// 是否启用闭环速度控制
    pub enable_speed_control: bool,
    /// 速度环比例系数
    pub speed_kp: f32,
    /// 速度环积分系数
    pub speed_ki: f32,
    /// 左电机增益
    pub motor_gain_left: f32,
    /// 右电机增益
    pub motor_gain_right: f32,
}

impl DriveConfig {
    /// 从 `drive` 对象提取一份完整快照
    ///
    /// 每个字段独立做类型检查：数值字段要求 JSON 数值，布尔字段要求
    /// JSON 布尔；其余情况保持零值。
    pub(crate) fn from_object(obj: &Object) -> DriveConfig {
        let mut cfg = DriveConfig::default();

        schema::f32_into(obj, "wheel_track_mm", &mut cfg.wheel_track_mm);
        schema::f32_into(obj, "wheel_radius_mm", &mut cfg.wheel_radius_mm);
        schema::f32_into(obj, "min_speed_mm_per_s", &mut cfg.min_speed_mm_per_s);
        schema::f32_into(obj, "max_speed_mm_per_s", &mut cfg.max_speed_mm_per_s);
        schema::f32_into(obj, "ticks_per_revolution", &mut cfg.ticks_per_revolution);
        schema::f32_into(obj, "speed_kp", &mut cfg.speed_kp);
        schema::f32_into(obj, "speed_ki", &mut cfg.speed_ki);
        schema::f32_into(obj, "motor_gain_left", &mut cfg.motor_gain_left);
        schema::f32_into(obj, "motor_gain_right", &mut cfg.motor_gain_right);

        cfg.brake_on_stop = schema::bool_or(obj, "brake_on_stop", false);
        cfg.enable_speed_control = schema::bool_or(obj, "enable_speed_control", false);

        cfg
    }
}
