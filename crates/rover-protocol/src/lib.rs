//! # Rover Protocol
//!
//! 轮式机器人的 JSON 命令协议引擎（与传输方式无关）
//!
//! ## 模块
//!
//! - `message`: 消息/命令/序列的封闭和类型与解析
//! - `config`: 行驶标定配置快照
//! - `handlers`: 执行能力表
//! - `engine`: 解码 → 路由 → 分发引擎与执行上限
//! - `encode`: 立即命令编码器
//! - `assembly`: 传输层分片重组辅助
//!
//! ## 消息形态
//!
//! 每条消息是一个 JSON 对象，由顶层 `type` 字段判别：
//!
//! ```json
//! {"type":"command","command":{"kind":"drive","direction":"forward","speed":150}}
//! {"type":"sequence","repeat":2,"steps":[{"kind":"stop"},{"kind":"clear_queue"}]}
//! {"type":"config","drive":{"wheel_track_mm":120.0}}
//! ```
//!
//! 序列步骤自带 `type` 字段时按完整消息递归分发（支持嵌套序列和
//! 内嵌配置），否则按裸命令对象处理。
//!
//! ## 使用示例
//!
//! ```rust
//! use rover_protocol::{Engine, Handlers};
//!
//! let handlers = Handlers::new().on_stop(|| println!("stop!"));
//! let engine = Engine::new(handlers);
//! engine
//!     .handle_json(br#"{"type":"command","command":{"kind":"stop"}}"#)
//!     .unwrap();
//! ```

pub mod assembly;
pub mod config;
pub mod encode;
pub mod engine;
pub mod handlers;
pub mod message;

mod error;
mod schema;

// 重新导出常用类型
pub use assembly::{ChunkAssembler, MAX_PAYLOAD_LEN};
pub use config::DriveConfig;
pub use encode::encode_immediate;
pub use engine::{Engine, Limits};
pub use error::ProtocolError;
pub use handlers::Handlers;
pub use message::{Command, Direction, Message, SequenceBody, Step};
