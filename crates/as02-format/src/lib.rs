//! # as02-format
//!
//! AS-02 素材解析与 MXF 容器写入库.
//!
//! 本 crate 负责两件事: 从 JPEG 2000 码流序列或 WAV 文件中逐帧读取素材,
//! 以及把素材帧封装为 AS-02 (SMPTE ST 2067-5 风格) 的 OP1a MXF 文件.

pub mod descriptor;
pub mod io;
pub mod mxf;
pub mod parser;
pub mod parsers;
pub mod probe;
pub mod registry;
pub mod writer;
pub mod writers;

// 重导出常用类型
pub use descriptor::{AudioDescriptor, EssenceDescriptor, J2kParams, PictureDescriptor};
pub use io::IoContext;
pub use mxf::metadata::HeaderMetadata;
pub use parser::EssenceParser;
pub use parsers::j2k::J2kSequenceParser;
pub use parsers::pcm_list::PcmParserList;
pub use probe::ProbeResult;
pub use registry::EssenceRegistry;
pub use writer::{ContainerWriter, IndexStrategy, WriterInfo};
pub use writers::{As02Jp2kWriter, As02PcmWriter};
