//! 消息与命令的封闭和类型
//!
//! 一个字节缓冲解码为一棵 `Message` 树，在一次分发中被消费，之后即
//! 丢弃。校验与默认值填充全部发生在解析阶段：和类型里只会出现合法
//! 命令，后续求值无需再做判断。
//!
//! 序列解析对单个步骤保持宽容：非对象条目和未通过校验的步骤被丢弃
//! 并记录 `warn!` 诊断，兄弟步骤照常保留。

use serde_json::Value;
use tracing::warn;

use crate::config::DriveConfig;
use crate::error::ProtocolError;
use crate::schema::{self, Object};

/// 顶层消息，由 `type` 字段判别
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// `"command"`：单条命令
    Command(Command),
    /// `"sequence"`：有序多步序列
    Sequence(SequenceBody),
    /// `"config"`：行驶标定配置；没有 `drive` 对象时为 `None`（静默忽略）
    Config(Option<DriveConfig>),
}

/// 序列消息体
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceBody {
    /// 保持原始顺序的步骤列表
    pub steps: Vec<Step>,
    /// 整个步骤列表的重复次数（≥ 1）
    pub repeat: u32,
}

/// 序列中的一步
///
/// 自带 `type` 字段的步骤是完整消息，经路由器递归分发；
/// 其余步骤是裸命令对象，直接求值。
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// 完整消息步骤（嵌套序列、内嵌配置等）
    Message(Box<Message>),
    /// 裸命令步骤
    Command(Command),
}

/// 行驶方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// 线上字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

impl TryFrom<&str> for Direction {
    type Error = ProtocolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            _ => Err(ProtocolError::InvalidFields {
                kind: "drive",
                reason: "direction must be \"forward\" or \"backward\"",
            }),
        }
    }
}

/// 单条命令，由 `kind` 字段判别
///
/// 字段在解析时已完成校验和默认值填充；`immediate` 的 `now_ms` 不在
/// 此处，它由引擎在求值时从自身时钟打点，从不取自文档。
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 直线行驶
    Drive {
        direction: Direction,
        speed_mm_per_s: i32,
        duration_ms: u32,
        distance_mm: u32,
    },
    /// 转弯
    Turn {
        radius_mm: i32,
        angle_deg: i32,
        speed_mm_per_s: i32,
        duration_ms: u32,
    },
    /// 设置 LED HSV 颜色
    LedHsv { hue: u16, sat: u8, val: u8 },
    /// 立即差速控制
    Immediate {
        left_frac: f32,
        right_frac: f32,
        timeout_ms: u32,
    },
    /// 停止当前运动
    Stop,
    /// 清空运动队列
    ClearQueue,
    /// 等待；当前不转发任何能力
    Wait { duration_ms: u32 },
    /// 暂停（占位，无效果）
    Pause,
    /// 恢复（占位，无效果）
    Resume,
}

impl Message {
    /// 解码一个完整的字节缓冲
    ///
    /// 缓冲长度由切片本身界定，不要求 NUL 结尾，也绝不越界读取。
    /// 语法错误或根节点不是对象时返回 [`ProtocolError::Parse`]，
    /// 不产生任何部分结果。
    pub fn decode(payload: &[u8]) -> Result<Message, ProtocolError> {
        let root: Value =
            serde_json::from_slice(payload).map_err(|e| ProtocolError::Parse(e.to_string()))?;
        let obj = root
            .as_object()
            .ok_or_else(|| ProtocolError::Parse("root is not a JSON object".to_string()))?;
        Message::from_object(obj)
    }

    /// 路由：按顶层 `type` 判别并解析对应消息体
    pub(crate) fn from_object(obj: &Object) -> Result<Message, ProtocolError> {
        let discriminant =
            schema::str_required(obj, "type").ok_or(ProtocolError::MissingDiscriminant)?;

        match discriminant {
            "command" => {
                let command = obj
                    .get("command")
                    .and_then(Value::as_object)
                    .ok_or(ProtocolError::MissingPayload)?;
                Ok(Message::Command(Command::from_object(command)?))
            }
            "sequence" => Ok(Message::Sequence(SequenceBody::from_object(obj)?)),
            "config" => Ok(Message::Config(
                obj.get("drive")
                    .and_then(Value::as_object)
                    .map(DriveConfig::from_object),
            )),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

impl SequenceBody {
    /// 解析序列消息体
    ///
    /// `steps` 数组必须存在，否则整条消息被丢弃；`repeat` 缺失或非
    /// 数值时取 1，小于 1 的值提升为 1。
    pub(crate) fn from_object(obj: &Object) -> Result<SequenceBody, ProtocolError> {
        let raw_steps = obj
            .get("steps")
            .and_then(Value::as_array)
            .ok_or(ProtocolError::MissingSteps)?;

        let repeat =
            schema::f64_required(obj, "repeat").map_or(1, |r| if r < 1.0 { 1 } else { r as u32 });

        let mut steps = Vec::with_capacity(raw_steps.len());
        for (index, entry) in raw_steps.iter().enumerate() {
            let Some(step_obj) = entry.as_object() else {
                warn!("Sequence step {} is not an object, skipping", index);
                continue;
            };

            // 自带 type 字段的步骤按完整消息递归解析
            let parsed = if step_obj.contains_key("type") {
                Message::from_object(step_obj).map(|m| Step::Message(Box::new(m)))
            } else {
                Command::from_object(step_obj).map(Step::Command)
            };

            match parsed {
                Ok(step) => steps.push(step),
                Err(err) => warn!("Dropping invalid sequence step {}: {}", index, err),
            }
        }

        Ok(SequenceBody { steps, repeat })
    }
}

impl Command {
    /// 解析一个命令对象（`command` 载荷或裸序列步骤）
    pub(crate) fn from_object(obj: &Object) -> Result<Command, ProtocolError> {
        let kind = schema::str_required(obj, "kind").ok_or(ProtocolError::MissingKind)?;

        match kind {
            "drive" => Self::parse_drive(obj),
            "turn" => Self::parse_turn(obj),
            "led_hsv" => Self::parse_led_hsv(obj),
            "immediate" => Self::parse_immediate(obj),
            "stop" => Ok(Command::Stop),
            "clear_queue" => Ok(Command::ClearQueue),
            "wait" => Ok(Command::Wait {
                duration_ms: schema::u32_or(obj, "duration", 0),
            }),
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            other => Err(ProtocolError::UnknownKind(other.to_string())),
        }
    }

    fn parse_drive(obj: &Object) -> Result<Command, ProtocolError> {
        let direction =
            schema::str_required(obj, "direction").ok_or(ProtocolError::InvalidFields {
                kind: "drive",
                reason: "direction must be a string",
            })?;
        let direction = Direction::try_from(direction)?;

        let speed = schema::f64_required(obj, "speed").ok_or(ProtocolError::InvalidFields {
            kind: "drive",
            reason: "speed must be numeric",
        })?;

        Ok(Command::Drive {
            direction,
            speed_mm_per_s: speed as i32,
            duration_ms: schema::u32_or(obj, "duration", 0),
            distance_mm: schema::u32_or(obj, "distance", 0),
        })
    }

    fn parse_turn(obj: &Object) -> Result<Command, ProtocolError> {
        let radius = schema::f64_required(obj, "radius").ok_or(ProtocolError::InvalidFields {
            kind: "turn",
            reason: "radius must be numeric",
        })?;
        let angle = schema::f64_required(obj, "angle").ok_or(ProtocolError::InvalidFields {
            kind: "turn",
            reason: "angle must be numeric",
        })?;

        let speed_mm_per_s = schema::i32_or(obj, "speed", 0);
        let duration_ms = schema::u32_or(obj, "duration", 0);

        // 速度和时长至少要有一个能界定转弯的终点
        if speed_mm_per_s <= 0 && duration_ms == 0 {
            return Err(ProtocolError::InvalidFields {
                kind: "turn",
                reason: "requires speed > 0 or duration > 0",
            });
        }

        Ok(Command::Turn {
            radius_mm: radius as i32,
            angle_deg: angle as i32,
            speed_mm_per_s,
            duration_ms,
        })
    }

    fn parse_led_hsv(obj: &Object) -> Result<Command, ProtocolError> {
        let hue = schema::f64_required(obj, "h").ok_or(ProtocolError::InvalidFields {
            kind: "led_hsv",
            reason: "h must be numeric",
        })?;

        Ok(Command::LedHsv {
            hue: hue as u16,
            sat: schema::u8_or(obj, "s", 255),
            val: schema::u8_or(obj, "v", 32),
        })
    }

    fn parse_immediate(obj: &Object) -> Result<Command, ProtocolError> {
        let left = schema::f64_required(obj, "left").ok_or(ProtocolError::InvalidFields {
            kind: "immediate",
            reason: "left must be numeric",
        })?;
        let right = schema::f64_required(obj, "right").ok_or(ProtocolError::InvalidFields {
            kind: "immediate",
            reason: "right must be numeric",
        })?;

        // 文档里的 now_ms 即使存在也被忽略，时间戳由引擎打点
        Ok(Command::Immediate {
            left_frac: left as f32,
            right_frac: right as f32,
            timeout_ms: schema::u32_or(obj, "timeout_ms", 200),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> Result<Message, ProtocolError> {
        Message::decode(text.as_bytes())
    }

    #[test]
    fn test_decode_drive_with_defaults() {
        let message = decode(
            r#"{"type":"command","command":{"kind":"drive","direction":"forward","speed":150,"distance":1000}}"#,
        )
        .unwrap();

        assert_eq!(
            message,
            Message::Command(Command::Drive {
                direction: Direction::Forward,
                speed_mm_per_s: 150,
                duration_ms: 0,
                distance_mm: 1000,
            })
        );
    }

    #[test]
    fn test_decode_drive_rejects_bad_direction() {
        let err = decode(
            r#"{"type":"command","command":{"kind":"drive","direction":"sideways","speed":150}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidFields { kind: "drive", .. }));

        // direction 是数值同样拒绝
        let err =
            decode(r#"{"type":"command","command":{"kind":"drive","direction":7,"speed":150}}"#)
                .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidFields { kind: "drive", .. }));
    }

    #[test]
    fn test_decode_turn_requires_speed_or_duration() {
        let err = decode(
            r#"{"type":"command","command":{"kind":"turn","radius":100,"angle":90,"speed":0,"duration":0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidFields { kind: "turn", .. }));

        // duration 一项给出即可接受
        let message = decode(
            r#"{"type":"command","command":{"kind":"turn","radius":100,"angle":90,"speed":0,"duration":500}}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            Message::Command(Command::Turn {
                radius_mm: 100,
                angle_deg: 90,
                speed_mm_per_s: 0,
                duration_ms: 500,
            })
        );
    }

    #[test]
    fn test_decode_led_hsv_defaults() {
        let message = decode(r#"{"type":"command","command":{"kind":"led_hsv","h":300}}"#).unwrap();
        assert_eq!(
            message,
            Message::Command(Command::LedHsv {
                hue: 300,
                sat: 255,
                val: 32,
            })
        );
    }

    #[test]
    fn test_decode_immediate_ignores_document_now_ms() {
        let message = decode(
            r#"{"type":"command","command":{"kind":"immediate","left":-0.5,"right":0.5,"now_ms":999999}}"#,
        )
        .unwrap();
        // now_ms 不进入解析结果，timeout 用默认值
        assert_eq!(
            message,
            Message::Command(Command::Immediate {
                left_frac: -0.5,
                right_frac: 0.5,
                timeout_ms: 200,
            })
        );
    }

    #[test]
    fn test_decode_wait_and_stubs() {
        let message =
            decode(r#"{"type":"command","command":{"kind":"wait","duration":250}}"#).unwrap();
        assert_eq!(message, Message::Command(Command::Wait { duration_ms: 250 }));

        for kind in ["pause", "resume"] {
            let doc = format!(r#"{{"type":"command","command":{{"kind":"{}"}}}}"#, kind);
            assert!(decode(&doc).is_ok());
        }
    }

    #[test]
    fn test_decode_rejects_malformed_documents() {
        // 截断的输入
        assert!(matches!(
            decode(r#"{"type":"com"#).unwrap_err(),
            ProtocolError::Parse(_)
        ));
        // 根节点不是对象
        assert!(matches!(
            decode(r#"[1,2,3]"#).unwrap_err(),
            ProtocolError::Parse(_)
        ));
        // 缺判别字段
        assert!(matches!(
            decode(r#"{"command":{"kind":"stop"}}"#).unwrap_err(),
            ProtocolError::MissingDiscriminant
        ));
        // 未知消息类型
        assert!(matches!(
            decode(r#"{"type":"telemetry"}"#).unwrap_err(),
            ProtocolError::UnknownType(_)
        ));
        // command 消息缺载荷
        assert!(matches!(
            decode(r#"{"type":"command"}"#).unwrap_err(),
            ProtocolError::MissingPayload
        ));
        // 命令缺 kind
        assert!(matches!(
            decode(r#"{"type":"command","command":{"speed":10}}"#).unwrap_err(),
            ProtocolError::MissingKind
        ));
        // 未知 kind
        assert!(matches!(
            decode(r#"{"type":"command","command":{"kind":"warp"}}"#).unwrap_err(),
            ProtocolError::UnknownKind(_)
        ));
    }

    #[test]
    fn test_sequence_repeat_normalization() {
        for (doc, expected) in [
            (r#"{"type":"sequence","steps":[]}"#, 1),
            (r#"{"type":"sequence","repeat":0,"steps":[]}"#, 1),
            (r#"{"type":"sequence","repeat":-5,"steps":[]}"#, 1),
            (r#"{"type":"sequence","repeat":"twice","steps":[]}"#, 1),
            (r#"{"type":"sequence","repeat":2.9,"steps":[]}"#, 2),
            (r#"{"type":"sequence","repeat":3,"steps":[]}"#, 3),
        ] {
            let Message::Sequence(body) = decode(doc).unwrap() else {
                panic!("expected sequence");
            };
            assert_eq!(body.repeat, expected, "doc: {}", doc);
        }
    }

    #[test]
    fn test_sequence_missing_steps() {
        assert!(matches!(
            decode(r#"{"type":"sequence","repeat":2}"#).unwrap_err(),
            ProtocolError::MissingSteps
        ));
    }

    #[test]
    fn test_sequence_step_discrimination() {
        let message = decode(
            r#"{"type":"sequence","steps":[
                {"kind":"stop"},
                {"type":"command","command":{"kind":"clear_queue"}},
                {"type":"config","drive":{"wheel_track_mm":120.0}}
            ]}"#,
        )
        .unwrap();

        let Message::Sequence(body) = message else {
            panic!("expected sequence");
        };
        assert_eq!(body.steps.len(), 3);
        assert_eq!(body.steps[0], Step::Command(Command::Stop));
        assert!(matches!(
            body.steps[1],
            Step::Message(ref m) if **m == Message::Command(Command::ClearQueue)
        ));
        assert!(matches!(body.steps[2], Step::Message(_)));
    }

    #[test]
    fn test_sequence_tolerates_bad_steps() {
        let message = decode(
            r#"{"type":"sequence","steps":[
                5,
                {"kind":"warp"},
                {"kind":"turn","radius":10,"angle":45,"speed":0,"duration":0},
                {"kind":"stop"}
            ]}"#,
        )
        .unwrap();

        // 非对象、未知 kind、校验失败的步骤全部丢弃，合法步骤保留
        let Message::Sequence(body) = message else {
            panic!("expected sequence");
        };
        assert_eq!(body.steps, vec![Step::Command(Command::Stop)]);
    }

    #[test]
    fn test_config_without_drive_object() {
        assert_eq!(decode(r#"{"type":"config"}"#).unwrap(), Message::Config(None));
        assert_eq!(
            decode(r#"{"type":"config","drive":42}"#).unwrap(),
            Message::Config(None)
        );
    }
}
