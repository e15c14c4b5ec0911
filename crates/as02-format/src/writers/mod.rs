//! AS-02 容器写入器实现.
//!
//! - [`As02Jp2kWriter`]: JPEG 2000 帧封装, 分段 VBE 索引
//! - [`As02PcmWriter`]: WAVE PCM 帧封装, 尾部 CBE 索引

pub mod as02_jp2k;
pub mod as02_pcm;
pub mod common;

pub use as02_jp2k::As02Jp2kWriter;
pub use as02_pcm::As02PcmWriter;
