//! 素材解析器 (Essence Parser) trait 定义.
//!
//! 从输入素材中逐帧读取数据. 所有素材解析器都实现此 trait.

use as02_core::{As02Result, FrameBuffer, Rational};

use crate::descriptor::EssenceDescriptor;

/// 素材解析器 trait
///
/// 使用流程:
/// 1. 打开输入 (各实现自己的 `open`)
/// 2. 调用 `descriptor()` 获取素材描述符, 可用 `set_edit_rate()` 覆盖编辑速率
/// 3. 调用 `reset()` 回到起点, 可选 `skip_frames()` 跳过起始帧
/// 4. 循环调用 `read_frame()` 读取帧
pub trait EssenceParser {
    /// 解析器名称
    fn name(&self) -> &str;

    /// 获取素材描述符
    fn descriptor(&self) -> &EssenceDescriptor;

    /// 覆盖编辑速率
    ///
    /// 音频解析器会据此重新计算每帧字节数.
    fn set_edit_rate(&mut self, rate: Rational) -> As02Result<()>;

    /// 帧缓冲区所需容量, None 表示由调用者决定
    fn frame_capacity(&self) -> Option<usize>;

    /// 回到第一帧
    fn reset(&mut self) -> As02Result<()>;

    /// 跳过 `count` 帧但不读取其内容, 返回实际跳过的帧数
    fn skip_frames(&mut self, count: u64) -> As02Result<u64>;

    /// 读取下一帧到缓冲区
    ///
    /// # 返回
    /// - `Ok(())`: 成功读取一帧
    /// - `Err(As02Error::Eof)`: 已无更多帧
    fn read_frame(&mut self, frame: &mut FrameBuffer) -> As02Result<()>;
}
