//! 素材识别注册表.
//!
//! 管理所有已注册的素材探测器, 对输入路径做自动识别.

use std::path::{Path, PathBuf};

use log::debug;

use as02_core::{As02Error, As02Result, EssenceType};

use crate::io::IoContext;
use crate::probe::{EssenceProbe, ProbeResult};

/// 探测时读取的最大字节数
const PROBE_SIZE: usize = 8192;

/// 素材识别注册表
pub struct EssenceRegistry {
    /// 探测器列表
    probes: Vec<Box<dyn EssenceProbe + Send>>,
}

impl EssenceRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self { probes: Vec::new() }
    }

    /// 创建并注册全部内置探测器
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::parsers::register_all_probes(&mut registry);
        registry
    }

    /// 注册一个探测器
    pub fn register_probe(&mut self, probe: Box<dyn EssenceProbe + Send>) {
        self.probes.push(probe);
    }

    /// 探测数据的素材类型
    ///
    /// 遍历所有已注册的探测器, 返回置信度最高的结果.
    pub fn probe(&self, data: &[u8]) -> Option<ProbeResult> {
        let mut best: Option<ProbeResult> = None;
        for probe in &self.probes {
            if let Some(result) = probe.probe(data) {
                debug!("探测器 {} 命中: {:?}", probe.name(), result);
                let is_better = best.as_ref().is_none_or(|b| result.score > b.score);
                if is_better {
                    best = Some(result);
                }
            }
        }
        best
    }

    /// 识别输入路径的素材类型
    ///
    /// 目录取排序后的第一个普通文件进行探测.
    pub fn classify(&self, path: &Path) -> As02Result<EssenceType> {
        let target = if path.is_dir() {
            list_directory(path)?.into_iter().next().ok_or_else(|| {
                As02Error::UnrecognizedEssence(format!("目录为空: {}", path.display()))
            })?
        } else {
            path.to_path_buf()
        };

        let mut io = IoContext::open_read(&target)?;
        let mut head = vec![0u8; PROBE_SIZE];
        let n = io.read_up_to(&mut head)?;
        head.truncate(n);

        let result = self
            .probe(&head)
            .ok_or_else(|| As02Error::UnrecognizedEssence(target.display().to_string()))?;
        debug!("识别结果: {} -> {}", target.display(), result.essence_type);
        Ok(result.essence_type)
    }
}

impl Default for EssenceRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// 列出目录中的普通文件 (按文件名排序)
pub fn list_directory(dir: &Path) -> As02Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// 展开输入列表: 目录替换为其中的普通文件
pub fn expand_inputs(paths: &[PathBuf]) -> As02Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(list_directory(path)?);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_未知内容无法识别() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bin");
        std::fs::write(&path, b"definitely not essence").unwrap();
        let err = EssenceRegistry::with_builtin().classify(&path).unwrap_err();
        assert!(matches!(err, As02Error::UnrecognizedEssence(_)));
    }

    #[test]
    fn test_空目录无法识别() {
        let dir = tempfile::tempdir().unwrap();
        let err = EssenceRegistry::with_builtin()
            .classify(dir.path())
            .unwrap_err();
        assert!(matches!(err, As02Error::UnrecognizedEssence(_)));
    }

    #[test]
    fn test_目录展开有序() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.j2c", "a.j2c", "c.j2c"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let files = expand_inputs(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.j2c", "b.j2c", "c.j2c"]);
    }
}
