//! 分片载荷重组
//!
//! 某些传输（典型如发布/订阅客户端）会把一个 JSON 文档拆成多个分片
//! 投递，每个分片携带 (offset, total_len)。传输层用 [`ChunkAssembler`]
//! 在把缓冲交给引擎之前完成重组；引擎本身只接受完整缓冲。

use tracing::warn;

/// 单个文档允许的最大重组长度（字节）
pub const MAX_PAYLOAD_LEN: usize = 8192;

/// 分片重组器
///
/// 规则：
/// - offset 为 0 的分片开启（或重新开启）一次重组
/// - 总长必须在 `1..=MAX_PAYLOAD_LEN` 内
/// - 分片 offset 必须与已累积的字节数吻合；超出预期总长立即丢弃
/// - 任何丢弃只影响当前文档，重组器本身保持可用
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    buffer: Vec<u8>,
    expected_len: usize,
}

impl ChunkAssembler {
    /// 创建空重组器
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 送入一个分片；当最后一个分片就位时返回完整缓冲
    ///
    /// 返回 `None` 表示文档尚未凑齐，或该分片因违反重组规则被丢弃。
    pub fn push(&mut self, offset: usize, total_len: usize, chunk: &[u8]) -> Option<Vec<u8>> {
        if chunk.is_empty() || total_len == 0 {
            return None;
        }

        if offset == 0 {
            if self.expected_len != 0 {
                warn!(
                    "Restarting reassembly, discarding {} buffered bytes",
                    self.buffer.len()
                );
            }
            self.reset();

            if total_len > MAX_PAYLOAD_LEN {
                warn!("Payload too large ({} bytes), dropping", total_len);
                return None;
            }
            self.buffer = Vec::with_capacity(total_len);
            self.expected_len = total_len;
        }

        // 没有进行中的重组：中段分片直接忽略
        if self.expected_len == 0 {
            return None;
        }

        if offset != self.buffer.len() {
            warn!(
                "Chunk offset mismatch (offset={}, buffered={}), dropping payload",
                offset,
                self.buffer.len()
            );
            self.reset();
            return None;
        }

        if self.buffer.len() + chunk.len() > self.expected_len {
            warn!(
                "Chunk overflow (buffered={}, chunk={}, expected={}), dropping payload",
                self.buffer.len(),
                chunk.len(),
                self.expected_len
            );
            self.reset();
            return None;
        }

        self.buffer.extend_from_slice(chunk);

        if self.buffer.len() == self.expected_len {
            self.expected_len = 0;
            return Some(std::mem::take(&mut self.buffer));
        }
        None
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.expected_len = 0;
    }
}
