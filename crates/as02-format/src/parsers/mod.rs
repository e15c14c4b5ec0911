//! 素材解析器实现.
//!
//! - [`j2k`]: JPEG 2000 码流序列
//! - [`wav`]: WAV 读取与探测
//! - [`pcm_list`]: 多路 WAV 合并为一路多声道 PCM

pub mod j2k;
pub mod pcm_list;
pub mod wav;

use crate::registry::EssenceRegistry;

/// 注册全部内置探测器
pub fn register_all_probes(registry: &mut EssenceRegistry) {
    registry.register_probe(Box::new(j2k::J2kProbe));
    registry.register_probe(Box::new(wav::WavProbe));
}
