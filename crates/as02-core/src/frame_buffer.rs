//! 可复用帧缓冲区.
//!
//! 封装循环中唯一反复使用的可变资源: 一次分配, 每帧覆盖.

use std::fmt::Write as _;

use crate::{As02Error, As02Result};

/// 帧缓冲区
///
/// 不变量: `size <= capacity`.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    /// 底层存储, 长度即容量
    data: Vec<u8>,
    /// 有效数据长度
    size: usize,
    /// 明文前缀长度 (加密时不加密的部分)
    plaintext_offset: usize,
    /// 帧序号
    frame_number: u64,
}

impl FrameBuffer {
    /// 以指定容量创建
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            size: 0,
            plaintext_offset: 0,
            frame_number: 0,
        }
    }

    /// 容量
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// 有效数据长度
    pub fn size(&self) -> usize {
        self.size
    }

    /// 设置有效数据长度
    pub fn set_size(&mut self, size: usize) -> As02Result<()> {
        if size > self.capacity() {
            return Err(As02Error::SmallBuffer {
                needed: size,
                capacity: self.capacity(),
            });
        }
        self.size = size;
        Ok(())
    }

    /// 明文前缀长度
    pub fn plaintext_offset(&self) -> usize {
        self.plaintext_offset
    }

    /// 设置明文前缀长度, 超过有效长度时截断
    pub fn set_plaintext_offset(&mut self, offset: usize) {
        self.plaintext_offset = offset.min(self.size);
    }

    /// 帧序号
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// 设置帧序号
    pub fn set_frame_number(&mut self, n: u64) {
        self.frame_number = n;
    }

    /// 有效数据
    pub fn data(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// 整个缓冲区 (供解析器写入)
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// 将 `src` 复制进缓冲区并设置有效长度
    pub fn fill_from(&mut self, src: &[u8]) -> As02Result<()> {
        self.set_size(src.len())?;
        self.data[..src.len()].copy_from_slice(src);
        Ok(())
    }

    /// 生成诊断输出: 一行摘要加最多 `max_bytes` 字节的十六进制
    pub fn dump(&self, max_bytes: usize) -> String {
        let mut out = format!(
            "Frame: {:06}, {:7} bytes, plaintext offset {}",
            self.frame_number, self.size, self.plaintext_offset
        );
        let shown = &self.data()[..self.size.min(max_bytes)];
        for (i, chunk) in shown.chunks(16).enumerate() {
            let _ = write!(out, "\n  {:06x}: {}", i * 16, hex::encode(chunk));
        }
        out
    }
}
