//! 协议引擎：解码 → 路由 → 分发
//!
//! 引擎是一个显式的值，持有只读能力表与执行上限；没有任何进程级
//! 可变状态，多个互不相干的引擎实例可以并存（隔离测试即用此法）。
//!
//! 一次 [`Engine::handle_json`] 调用在调用方线程上同步完成全过程：
//! 嵌套序列的递归在同一调用栈上内联执行，中途没有挂起点，也没有
//! 取消机制。

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::error::ProtocolError;
use crate::handlers::Handlers;
use crate::message::{Command, Message, SequenceBody, Step};

/// 序列执行上限
///
/// 协议本身不限制嵌套深度和 repeat 展开规模，畸形或恶意输入可能让
/// 一次分发长时间阻塞调用方。引擎用显式上限兜底：超限的剩余部分被
/// 丢弃并记录诊断日志，已执行的部分不受影响。
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// 嵌套序列的最大深度
    pub max_depth: usize,
    /// 单个文档允许执行的步骤总数（steps × repeat，含嵌套）
    pub max_expansion: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_expansion: 4096,
        }
    }
}

/// 命令协议引擎
///
/// # 使用示例
///
/// ```rust
/// use rover_protocol::{Engine, Handlers};
///
/// let handlers = Handlers::new().on_drive(|direction, speed, duration, distance| {
///     println!(
///         "drive {} speed={} duration={} distance={}",
///         direction.as_str(),
///         speed,
///         duration,
///         distance
///     );
/// });
///
/// let engine = Engine::new(handlers);
/// let doc = br#"{"type":"command","command":{"kind":"drive","direction":"forward","speed":150}}"#;
/// engine.handle_json(doc).unwrap();
/// ```
pub struct Engine {
    handlers: Handlers,
    limits: Limits,
    /// 单调时钟原点；immediate 的 now_ms 以此为基准
    epoch: Instant,
}

impl Engine {
    /// 用默认上限创建引擎
    #[must_use]
    pub fn new(handlers: Handlers) -> Self {
        Self::with_limits(handlers, Limits::default())
    }

    /// 用自定义上限创建引擎
    #[must_use]
    pub fn with_limits(handlers: Handlers, limits: Limits) -> Self {
        Self {
            handlers,
            limits,
            epoch: Instant::now(),
        }
    }

    /// 分发入口：处理一个完整的 JSON 字节缓冲
    ///
    /// 缓冲长度由切片界定，不假设 NUL 结尾。返回的 `Err` 是诊断性的
    /// 成败信号：解析、路由和单命令校验的失败以错误形式反馈；序列
    /// 内部的步骤失败只记日志、不向上传播，也绝不中断兄弟步骤。
    pub fn handle_json(&self, payload: &[u8]) -> Result<(), ProtocolError> {
        let message = Message::decode(payload)?;

        let mut budget = self.limits.max_expansion;
        self.dispatch(&message, 0, &mut budget);
        Ok(())
    }

    /// 对一棵已解析的消息树执行一次分发
    fn dispatch(&self, message: &Message, depth: usize, budget: &mut u32) {
        match message {
            Message::Command(command) => self.invoke(command),
            Message::Sequence(sequence) => self.run_sequence(sequence, depth, budget),
            Message::Config(Some(config)) => {
                debug!("Applying drive config snapshot");
                if let Some(handler) = &self.handlers.set_drive_config {
                    handler(*config);
                }
            }
            // 没有 drive 对象的 config 消息静默忽略
            Message::Config(None) => {}
        }
    }

    /// 序列执行器：外层循环 repeat，内层循环步骤
    ///
    /// 完整消息步骤递归回到路由器；嵌套序列在父序列推进到下一步之前
    /// 完整执行（含其全部 repeat 轮次）。
    fn run_sequence(&self, sequence: &SequenceBody, depth: usize, budget: &mut u32) {
        if depth >= self.limits.max_depth {
            warn!(
                "Sequence nested deeper than {} levels, dropping subtree",
                self.limits.max_depth
            );
            return;
        }

        for round in 0..sequence.repeat {
            trace!("Sequence round {}/{}", round + 1, sequence.repeat);
            for step in &sequence.steps {
                if *budget == 0 {
                    warn!(
                        "Step expansion budget ({}) exhausted, dropping the rest of the sequence",
                        self.limits.max_expansion
                    );
                    return;
                }
                *budget -= 1;

                match step {
                    Step::Command(command) => self.invoke(command),
                    Step::Message(message) => self.dispatch(message, depth + 1, budget),
                }
            }
        }
    }

    /// 单命令求值
    ///
    /// 命令在解析阶段已完成校验和默认值填充，这里只做能力查找与调用；
    /// 未注册的能力无副作用。
    fn invoke(&self, command: &Command) {
        match command {
            Command::Drive {
                direction,
                speed_mm_per_s,
                duration_ms,
                distance_mm,
            } => {
                debug!(
                    "drive: direction={} speed={} duration={} distance={}",
                    direction.as_str(),
                    speed_mm_per_s,
                    duration_ms,
                    distance_mm
                );
                if let Some(handler) = &self.handlers.drive {
                    handler(*direction, *speed_mm_per_s, *duration_ms, *distance_mm);
                }
            }

            Command::Turn {
                radius_mm,
                angle_deg,
                speed_mm_per_s,
                duration_ms,
            } => {
                debug!(
                    "turn: radius={} angle={} speed={} duration={}",
                    radius_mm, angle_deg, speed_mm_per_s, duration_ms
                );
                if let Some(handler) = &self.handlers.turn {
                    handler(*radius_mm, *angle_deg, *speed_mm_per_s, *duration_ms);
                }
            }

            Command::LedHsv { hue, sat, val } => {
                debug!("led_hsv: h={} s={} v={}", hue, sat, val);
                if let Some(handler) = &self.handlers.set_led_hsv {
                    handler(*hue, *sat, *val);
                }
            }

            Command::Immediate {
                left_frac,
                right_frac,
                timeout_ms,
            } => {
                // now_ms 一律取引擎时钟，文档里的值不参与
                let now_ms = self.now_ms();
                debug!(
                    "immediate: left={:.3} right={:.3} timeout={} now={}",
                    left_frac, right_frac, timeout_ms, now_ms
                );
                if let Some(handler) = &self.handlers.immediate {
                    handler(*left_frac, *right_frac, *timeout_ms, now_ms);
                }
            }

            Command::Stop => {
                debug!("stop");
                if let Some(handler) = &self.handlers.stop {
                    handler();
                }
            }

            Command::ClearQueue => {
                debug!("clear_queue");
                if let Some(handler) = &self.handlers.clear_queue {
                    handler();
                }
            }

            // 预留给引擎之外的运动队列，接受但不转发
            Command::Wait { duration_ms } => {
                debug!("wait: duration={} (not forwarded)", duration_ms);
            }
            Command::Pause => debug!("pause (not forwarded)"),
            Command::Resume => debug!("resume (not forwarded)"),
        }
    }

    /// 引擎单调时钟：构造以来经过的毫秒数
    fn now_ms(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }
}
