//! 协议层错误类型定义

use thiserror::Error;

/// 协议解析与分发错误类型
///
/// 所有错误都是局部的、非致命的：出错的消息、序列步骤或命令被丢弃
/// 并记录诊断日志，兄弟步骤和剩余的 repeat 轮次不受影响。
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 字节缓冲不是合法 JSON，或根节点不是对象
    #[error("Parse error: {0}")]
    Parse(String),

    /// 缺少顶层 `type` 判别字段，或该字段不是字符串
    #[error("Message missing type discriminant")]
    MissingDiscriminant,

    /// 顶层 `type` 不是 "command"/"sequence"/"config"
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    /// "command" 消息缺少嵌套的 `command` 对象
    #[error("Command message missing command object")]
    MissingPayload,

    /// "sequence" 消息缺少 `steps` 数组
    #[error("Sequence missing steps array")]
    MissingSteps,

    /// 命令对象缺少 `kind` 字段，或该字段不是字符串
    #[error("Command missing kind")]
    MissingKind,

    /// 未识别的命令 `kind`
    #[error("Unknown command kind: {0}")]
    UnknownKind(String),

    /// 指定 kind 的必填字段缺失或类型错误
    #[error("Invalid {kind} command: {reason}")]
    InvalidFields {
        kind: &'static str,
        reason: &'static str,
    },
}
