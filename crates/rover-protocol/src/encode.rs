//! 立即命令编码器
//!
//! [`encode_immediate`] 是解码器 immediate 分支的逆运算，用于回环
//! 测试和向指令主题回发命令。

/// 编码一条立即差速命令为标准线上文本
///
/// 字段顺序固定（kind、left、right、timeout_ms、now_ms），浮点保留
/// 3 位小数。解码该输出会还原出误差不超过 0.001 的 left/right 与
/// 完全一致的 timeout_ms；now_ms 在解码侧被忽略并由引擎重新打点。
///
/// # 使用示例
///
/// ```rust
/// use rover_protocol::encode_immediate;
///
/// let wire = encode_immediate(-0.1, 0.3, 200, 123456);
/// assert_eq!(
///     wire,
///     r#"{"type":"command","command":{"kind":"immediate","left":-0.100,"right":0.300,"timeout_ms":200,"now_ms":123456}}"#
/// );
/// ```
#[must_use]
pub fn encode_immediate(left_frac: f32, right_frac: f32, timeout_ms: u32, now_ms: u32) -> String {
    format!(
        "{{\"type\":\"command\",\"command\":{{\"kind\":\"immediate\",\
         \"left\":{:.3},\"right\":{:.3},\"timeout_ms\":{},\"now_ms\":{}}}}}",
        left_frac, right_frac, timeout_ms, now_ms
    )
}
