//! 区间游标
//!
//! 跟踪原文中已写出的最后偏移。整个遍历期间唯一的共享可变状态，
//! 不变量：单调不减，遍历结束时必须等于文档长度（由 flush 保证）。
//! 所有未被翻译单元覆盖的字节都经由游标逐字节流入输出。

use crate::error::{RenderError, RenderResult};

/// 指向原文的写出游标
///
/// 游标本身只管理偏移；实际的字节复制由持有原文的渲染器完成。
#[derive(Debug)]
pub struct SpanCursor {
    last_written: usize,
    len: usize,
}

impl SpanCursor {
    /// 为长度为 `len` 的文档创建游标
    pub fn new(len: usize) -> Self {
        SpanCursor {
            last_written: 0,
            len,
        }
    }

    /// 当前偏移
    pub fn position(&self) -> usize {
        self.last_written
    }

    /// 取出接下来的 `length` 个字节的区间并前进
    ///
    /// 零长度的读取违反协议，直接报错。
    pub fn take(&mut self, length: usize) -> RenderResult<std::ops::Range<usize>> {
        if length == 0 {
            return Err(RenderError::InvalidLength {
                offset: self.last_written,
            });
        }
        let start = self.last_written;
        self.last_written += length;
        Ok(start..self.last_written)
    }

    /// 前进到 `offset`，返回需要逐字节写出的区间
    ///
    /// 目标等于当前偏移时无事发生；向后移动违反协议。
    pub fn move_to(&mut self, offset: usize) -> RenderResult<Option<std::ops::Range<usize>>> {
        if offset == self.last_written {
            return Ok(None);
        }
        if offset < self.last_written {
            return Err(RenderError::InvalidOffset {
                target: offset,
                current: self.last_written,
            });
        }
        let range = self.take(offset - self.last_written)?;
        Ok(Some(range))
    }

    /// 前进到 `offset` 但不产生输出
    ///
    /// 用于调用方已经自行重新合成了该区间输出的场合（如重写的 YAML）。
    pub fn skip_to(&mut self, offset: usize) -> RenderResult<()> {
        if offset < self.last_written {
            return Err(RenderError::InvalidOffset {
                target: offset,
                current: self.last_written,
            });
        }
        self.last_written = offset;
        Ok(())
    }

    /// 文档末尾的刷新区间，等价于 `move_to(len)`
    pub fn flush(&mut self) -> RenderResult<Option<std::ops::Range<usize>>> {
        self.move_to(self.len)
    }
}
