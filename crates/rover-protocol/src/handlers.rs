//! 执行能力表（Handler Capability Table）
//!
//! 引擎把校验通过的命令分发给一组可选的执行回调。能力表在构造期
//! 注册完毕，之后只读；每个能力独立存在与否，未注册的能力对于合法
//! 命令只是无副作用，不是错误。
//!
//! 回调要求 `Send + Sync`，因此一个引擎实例可以被多个传输线程共享；
//! 跨消息的调用顺序由调用方负责。

use crate::config::DriveConfig;
use crate::message::Direction;

/// 直线行驶能力：`(direction, speed_mm_per_s, duration_ms, distance_mm)`
pub type DriveFn = dyn Fn(Direction, i32, u32, u32) + Send + Sync;
/// 转弯能力：`(radius_mm, angle_deg, speed_mm_per_s, duration_ms)`
pub type TurnFn = dyn Fn(i32, i32, i32, u32) + Send + Sync;
/// 无参能力（stop / clear_queue）
pub type SimpleFn = dyn Fn() + Send + Sync;
/// LED HSV 能力：`(hue, sat, val)`
pub type LedHsvFn = dyn Fn(u16, u8, u8) + Send + Sync;
/// 行驶配置能力：接收一份完整快照
pub type DriveConfigFn = dyn Fn(DriveConfig) + Send + Sync;
/// 立即差速能力：`(left_frac, right_frac, timeout_ms, now_ms)`
pub type ImmediateFn = dyn Fn(f32, f32, u32, u32) + Send + Sync;

/// 执行能力表
///
/// # 使用示例
///
/// ```rust
/// use rover_protocol::Handlers;
///
/// let handlers = Handlers::new()
///     .on_stop(|| println!("stop"))
///     .on_led_hsv(|h, s, v| println!("led h={} s={} v={}", h, s, v));
/// ```
#[derive(Default)]
pub struct Handlers {
    pub(crate) drive: Option<Box<DriveFn>>,
    pub(crate) turn: Option<Box<TurnFn>>,
    pub(crate) stop: Option<Box<SimpleFn>>,
    pub(crate) clear_queue: Option<Box<SimpleFn>>,
    pub(crate) set_led_hsv: Option<Box<LedHsvFn>>,
    pub(crate) set_drive_config: Option<Box<DriveConfigFn>>,
    pub(crate) immediate: Option<Box<ImmediateFn>>,
}

impl Handlers {
    /// 创建空能力表（所有能力缺席）
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册直线行驶能力
    #[must_use]
    pub fn on_drive(mut self, f: impl Fn(Direction, i32, u32, u32) + Send + Sync + 'static) -> Self {
        self.drive = Some(Box::new(f));
        self
    }

    /// 注册转弯能力
    #[must_use]
    pub fn on_turn(mut self, f: impl Fn(i32, i32, i32, u32) + Send + Sync + 'static) -> Self {
        self.turn = Some(Box::new(f));
        self
    }

    /// 注册停止能力
    #[must_use]
    pub fn on_stop(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.stop = Some(Box::new(f));
        self
    }

    /// 注册清空队列能力
    #[must_use]
    pub fn on_clear_queue(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.clear_queue = Some(Box::new(f));
        self
    }

    /// 注册 LED HSV 能力
    #[must_use]
    pub fn on_led_hsv(mut self, f: impl Fn(u16, u8, u8) + Send + Sync + 'static) -> Self {
        self.set_led_hsv = Some(Box::new(f));
        self
    }

    /// 注册行驶配置能力
    #[must_use]
    pub fn on_drive_config(mut self, f: impl Fn(DriveConfig) + Send + Sync + 'static) -> Self {
        self.set_drive_config = Some(Box::new(f));
        self
    }

    /// 注册立即差速能力
    #[must_use]
    pub fn on_immediate(mut self, f: impl Fn(f32, f32, u32, u32) + Send + Sync + 'static) -> Self {
        self.immediate = Some(Box::new(f));
        self
    }
}
