//! 头部元数据.
//!
//! 以类型化结构保存 Preface、身份、包、轨道、描述符与加密框架等集合,
//! 序列化时统一生成 Primer Pack 与本地集合. 收尾时以相同布局重新序列化,
//! 只有时长等定长字段变化.

use as02_core::{As02Error, As02Result, EssenceType, Rational, UUID_LEN, Ul};

use super::items::{self, Item};
use super::klv::{KlvReader, KlvRef, encode_ber4, write_local_item};
use super::labels;
use super::primer::Primer;
use super::{new_instance_uid, new_umid, timestamp_now};
use crate::descriptor::{AudioDescriptor, EssenceDescriptor, PictureDescriptor};
use crate::writer::WriterInfo;

/// 素材轨道 ID
pub const ESSENCE_TRACK_ID: u32 = 2;
/// 加密描述性元数据轨道 ID
pub const CRYPTO_TRACK_ID: u32 = 3;
/// MXF 文件格式版本 (1.3)
const MXF_VERSION: u16 = 0x0103;

/// 本地集合
///
/// 属性按加入顺序序列化, 实例 UID 总在最前.
#[derive(Debug, Clone)]
struct LocalSet {
    key: Ul,
    items: Vec<(Item, Vec<u8>)>,
}

impl LocalSet {
    fn new(key: Ul, instance_uid: &[u8; UUID_LEN]) -> Self {
        Self {
            key,
            items: vec![(items::INSTANCE_UID, instance_uid.to_vec())],
        }
    }

    fn bytes(&mut self, item: Item, value: &[u8]) -> &mut Self {
        self.items.push((item, value.to_vec()));
        self
    }

    fn u8(&mut self, item: Item, v: u8) -> &mut Self {
        self.bytes(item, &[v])
    }

    fn u16(&mut self, item: Item, v: u16) -> &mut Self {
        self.bytes(item, &v.to_be_bytes())
    }

    fn u32(&mut self, item: Item, v: u32) -> &mut Self {
        self.bytes(item, &v.to_be_bytes())
    }

    fn u64(&mut self, item: Item, v: u64) -> &mut Self {
        self.bytes(item, &v.to_be_bytes())
    }

    fn rational(&mut self, item: Item, r: Rational) -> &mut Self {
        self.bytes(item, &r.to_be_bytes())
    }

    fn ul(&mut self, item: Item, ul: &Ul) -> &mut Self {
        self.bytes(item, ul.as_bytes())
    }

    fn string(&mut self, item: Item, s: &str) -> &mut Self {
        let utf16: Vec<u8> = s.encode_utf16().flat_map(|c| c.to_be_bytes()).collect();
        self.bytes(item, &utf16)
    }

    /// 16 字节元素的批次 (强引用、UL 列表)
    fn batch16<'a>(
        &mut self,
        item: Item,
        entries: impl IntoIterator<Item = &'a [u8; 16]>,
    ) -> &mut Self {
        let entries: Vec<&[u8; 16]> = entries.into_iter().collect();
        let mut value = Vec::with_capacity(8 + entries.len() * 16);
        value.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        value.extend_from_slice(&16u32.to_be_bytes());
        for e in entries {
            value.extend_from_slice(e);
        }
        self.bytes(item, &value)
    }

    fn encode(&self, primer: &mut Primer, out: &mut Vec<u8>) -> As02Result<()> {
        let mut body = Vec::new();
        for (item, value) in &self.items {
            let tag = primer.register(item);
            write_local_item(&mut body, tag, value)?;
        }
        out.extend_from_slice(self.key.as_bytes());
        out.extend_from_slice(&encode_ber4(body.len())?);
        out.extend_from_slice(&body);
        Ok(())
    }
}

/// 身份信息集合内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    /// 公司名称
    pub company_name: String,
    /// 产品名称
    pub product_name: String,
    /// 版本字符串
    pub version_string: String,
    /// 产品 UID
    pub product_uid: [u8; UUID_LEN],
}

/// Wave 音频描述符
#[derive(Debug, Clone, PartialEq)]
pub struct WaveAudioDescriptor {
    /// 音频参数
    pub audio: AudioDescriptor,
    /// 声道分配标签
    pub channel_assignment: Option<Ul>,
}

/// 文件包描述符
#[derive(Debug, Clone, PartialEq)]
pub enum FileDescriptor {
    /// RGBA 描述符 + JPEG 2000 子描述符
    Picture(PictureDescriptor),
    /// Wave 音频描述符
    Audio(WaveAudioDescriptor),
}

/// 加密框架元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoMetadata {
    /// 加密上下文 ID
    pub context_id: [u8; UUID_LEN],
    /// 密钥 ID
    pub key_id: [u8; UUID_LEN],
    /// 是否使用 HMAC
    pub uses_hmac: bool,
}

/// 各集合的实例 UID, 在创建时生成, 重写时保持不变
#[derive(Debug, Clone)]
struct SetUids {
    preface: [u8; 16],
    identification: [u8; 16],
    generation: [u8; 16],
    content_storage: [u8; 16],
    essence_container_data: [u8; 16],
    material_package: [u8; 16],
    material_track: [u8; 16],
    material_sequence: [u8; 16],
    material_clip: [u8; 16],
    file_package: [u8; 16],
    file_track: [u8; 16],
    file_sequence: [u8; 16],
    file_clip: [u8; 16],
    descriptor: [u8; 16],
    sub_descriptor: [u8; 16],
    dm_track: [u8; 16],
    dm_sequence: [u8; 16],
    dm_segment: [u8; 16],
    crypto_framework: [u8; 16],
    crypto_context: [u8; 16],
}

impl SetUids {
    fn generate() -> Self {
        Self {
            preface: new_instance_uid(),
            identification: new_instance_uid(),
            generation: new_instance_uid(),
            content_storage: new_instance_uid(),
            essence_container_data: new_instance_uid(),
            material_package: new_instance_uid(),
            material_track: new_instance_uid(),
            material_sequence: new_instance_uid(),
            material_clip: new_instance_uid(),
            file_package: new_instance_uid(),
            file_track: new_instance_uid(),
            file_sequence: new_instance_uid(),
            file_clip: new_instance_uid(),
            descriptor: new_instance_uid(),
            sub_descriptor: new_instance_uid(),
            dm_track: new_instance_uid(),
            dm_sequence: new_instance_uid(),
            dm_segment: new_instance_uid(),
            crypto_framework: new_instance_uid(),
            crypto_context: new_instance_uid(),
        }
    }
}

/// 头部元数据
#[derive(Debug, Clone)]
pub struct HeaderMetadata {
    uids: SetUids,
    created: [u8; 8],
    /// 身份信息
    pub identification: Identification,
    /// 素材包 UMID
    pub material_package_uid: [u8; 32],
    /// 文件包 UMID
    pub file_package_uid: [u8; 32],
    /// 编辑速率
    pub edit_rate: Rational,
    /// 时长 (编辑单元数)
    pub duration: u64,
    /// 明文素材容器标签
    pub essence_container: Ul,
    /// 素材元素键
    pub element_key: Ul,
    /// 文件包描述符
    pub descriptor: FileDescriptor,
    /// 加密框架 (未加密时为 None)
    pub crypto: Option<CryptoMetadata>,
    /// 索引流 ID
    pub index_sid: u32,
    /// 素材流 ID
    pub body_sid: u32,
}

impl HeaderMetadata {
    /// 由写入方信息与素材描述符构建
    pub fn new(
        info: &WriterInfo,
        descriptor: &EssenceDescriptor,
        index_sid: u32,
        body_sid: u32,
    ) -> Self {
        let (essence_container, element_key, file_descriptor) = match descriptor {
            EssenceDescriptor::Picture(p) => (
                labels::ESSENCE_CONTAINER_JPEG2000,
                labels::ELEMENT_JPEG2000,
                FileDescriptor::Picture(p.clone()),
            ),
            EssenceDescriptor::Audio(a) => (
                labels::ESSENCE_CONTAINER_WAVE,
                labels::ELEMENT_WAVE,
                FileDescriptor::Audio(WaveAudioDescriptor {
                    audio: a.clone(),
                    channel_assignment: None,
                }),
            ),
        };

        let crypto = info.encrypted_essence.then(|| CryptoMetadata {
            context_id: info.context_id,
            key_id: info.cryptographic_key_id,
            uses_hmac: info.uses_hmac,
        });

        let mut file_package_uid = new_umid();
        // 文件包素材编号取资产 UUID
        file_package_uid[16..].copy_from_slice(&info.asset_uuid);

        Self {
            uids: SetUids::generate(),
            created: timestamp_now(),
            identification: Identification {
                company_name: info.company_name.clone(),
                product_name: info.product_name.clone(),
                version_string: info.product_version.clone(),
                product_uid: info.product_uuid,
            },
            material_package_uid: new_umid(),
            file_package_uid,
            edit_rate: descriptor.edit_rate(),
            duration: 0,
            essence_container,
            element_key,
            descriptor: file_descriptor,
            crypto,
            index_sid,
            body_sid,
        }
    }

    /// 更新时长 (素材轨道与描述符同步)
    pub fn set_duration(&mut self, duration: u64) {
        self.duration = duration;
        match &mut self.descriptor {
            FileDescriptor::Picture(p) => p.container_duration = duration,
            FileDescriptor::Audio(w) => w.audio.container_duration = duration,
        }
    }

    /// 获取 Wave 音频描述符
    pub fn wave_audio_descriptor_mut(&mut self) -> Option<&mut WaveAudioDescriptor> {
        match &mut self.descriptor {
            FileDescriptor::Audio(w) => Some(w),
            FileDescriptor::Picture(_) => None,
        }
    }

    /// 素材类型
    pub fn essence_type(&self) -> EssenceType {
        match &self.descriptor {
            FileDescriptor::Picture(p) => p.essence_type,
            FileDescriptor::Audio(w) => w.audio.essence_type,
        }
    }

    /// 分区包与 Preface 中列出的素材容器
    pub fn essence_containers(&self) -> Vec<Ul> {
        let mut list = vec![self.essence_container];
        if self.crypto.is_some() {
            list.push(labels::ESSENCE_CONTAINER_ENCRYPTED);
        }
        list
    }

    /// 序列化为 Primer Pack + 全部本地集合
    pub fn to_bytes(&self) -> As02Result<Vec<u8>> {
        let sets = self.build_sets();
        let mut primer = Primer::new();
        let mut body = Vec::new();
        for set in &sets {
            set.encode(&mut primer, &mut body)?;
        }
        let mut out = primer.to_bytes()?;
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn build_sets(&self) -> Vec<LocalSet> {
        let u = &self.uids;
        let containers = self.essence_containers();
        let mut sets = Vec::new();

        // Preface
        let mut preface = LocalSet::new(labels::PREFACE, &u.preface);
        preface
            .bytes(items::LAST_MODIFIED_DATE, &self.created)
            .u16(items::VERSION, MXF_VERSION)
            .batch16(items::IDENTIFICATIONS, [&u.identification])
            .bytes(items::CONTENT_STORAGE_REF, &u.content_storage)
            .ul(items::OPERATIONAL_PATTERN, &labels::OP1A)
            .batch16(items::ESSENCE_CONTAINERS, containers.iter().map(|c| &c.0));
        let dm_schemes: Vec<&[u8; 16]> = if self.crypto.is_some() {
            vec![&labels::DM_SCHEME_CRYPTOGRAPHIC.0]
        } else {
            Vec::new()
        };
        preface.batch16(items::DM_SCHEMES, dm_schemes);
        sets.push(preface);

        // Identification
        let id = &self.identification;
        let mut ident = LocalSet::new(labels::IDENTIFICATION, &u.identification);
        ident
            .bytes(items::THIS_GENERATION_UID, &u.generation)
            .string(items::COMPANY_NAME, &id.company_name)
            .string(items::PRODUCT_NAME, &id.product_name)
            .string(items::VERSION_STRING, &id.version_string)
            .bytes(items::PRODUCT_UID, &id.product_uid)
            .bytes(items::MODIFICATION_DATE, &self.created);
        sets.push(ident);

        // Content Storage
        let mut storage = LocalSet::new(labels::CONTENT_STORAGE, &u.content_storage);
        storage
            .batch16(items::PACKAGES, [&u.material_package, &u.file_package])
            .batch16(items::ESSENCE_CONTAINER_DATA_REFS, [&u.essence_container_data]);
        sets.push(storage);

        let mut ecd = LocalSet::new(labels::ESSENCE_CONTAINER_DATA, &u.essence_container_data);
        ecd.bytes(items::LINKED_PACKAGE_UID, &self.file_package_uid)
            .u32(items::INDEX_SID, self.index_sid)
            .u32(items::BODY_SID, self.body_sid);
        sets.push(ecd);

        let data_def = if self.essence_type().is_picture() {
            labels::DATA_DEF_PICTURE
        } else {
            labels::DATA_DEF_SOUND
        };

        // Material Package
        let mut mp = LocalSet::new(labels::MATERIAL_PACKAGE, &u.material_package);
        mp.bytes(items::PACKAGE_UID, &self.material_package_uid)
            .bytes(items::PACKAGE_CREATION_DATE, &self.created)
            .bytes(items::PACKAGE_MODIFIED_DATE, &self.created)
            .batch16(items::TRACKS, [&u.material_track]);
        sets.push(mp);
        sets.extend(self.track_sets(
            [u.material_track, u.material_sequence, u.material_clip],
            0,
            &data_def,
            &self.file_package_uid,
            ESSENCE_TRACK_ID,
        ));

        // File Package
        let mut fp = LocalSet::new(labels::SOURCE_PACKAGE, &u.file_package);
        fp.bytes(items::PACKAGE_UID, &self.file_package_uid)
            .bytes(items::PACKAGE_CREATION_DATE, &self.created)
            .bytes(items::PACKAGE_MODIFIED_DATE, &self.created);
        if self.crypto.is_some() {
            fp.batch16(items::TRACKS, [&u.file_track, &u.dm_track]);
        } else {
            fp.batch16(items::TRACKS, [&u.file_track]);
        }
        fp.bytes(items::DESCRIPTOR_REF, &u.descriptor);
        sets.push(fp);
        let track_number = u32::from_be_bytes([
            self.element_key.0[12],
            self.element_key.0[13],
            self.element_key.0[14],
            self.element_key.0[15],
        ]);
        sets.extend(self.track_sets(
            [u.file_track, u.file_sequence, u.file_clip],
            track_number,
            &data_def,
            &[0u8; 32],
            0,
        ));

        if let Some(crypto) = &self.crypto {
            sets.extend(self.crypto_sets(crypto));
        }

        sets.extend(self.descriptor_sets());
        sets
    }

    /// 时间线轨道 + 序列 + 源片段
    fn track_sets(
        &self,
        [track_uid, seq_uid, clip_uid]: [[u8; 16]; 3],
        track_number: u32,
        data_def: &Ul,
        source_package: &[u8; 32],
        source_track: u32,
    ) -> Vec<LocalSet> {
        let mut track = LocalSet::new(labels::TIMELINE_TRACK, &track_uid);
        track
            .u32(items::TRACK_ID, ESSENCE_TRACK_ID)
            .u32(items::TRACK_NUMBER, track_number)
            .rational(items::EDIT_RATE, self.edit_rate)
            .u64(items::ORIGIN, 0)
            .bytes(items::SEQUENCE_REF, &seq_uid);

        let mut seq = LocalSet::new(labels::SEQUENCE, &seq_uid);
        seq.ul(items::DATA_DEFINITION, data_def)
            .u64(items::DURATION, self.duration)
            .batch16(items::STRUCTURAL_COMPONENTS, [&clip_uid]);

        let mut clip = LocalSet::new(labels::SOURCE_CLIP, &clip_uid);
        clip.ul(items::DATA_DEFINITION, data_def)
            .u64(items::DURATION, self.duration)
            .u64(items::START_POSITION, 0)
            .bytes(items::SOURCE_PACKAGE_ID, source_package)
            .u32(items::SOURCE_TRACK_ID, source_track);

        vec![track, seq, clip]
    }

    /// 加密描述性元数据: 静态轨道 + 序列 + DM 段 + 加密框架 + 加密上下文
    fn crypto_sets(&self, crypto: &CryptoMetadata) -> Vec<LocalSet> {
        let u = &self.uids;
        let mut track = LocalSet::new(labels::STATIC_TRACK, &u.dm_track);
        track
            .u32(items::TRACK_ID, CRYPTO_TRACK_ID)
            .u32(items::TRACK_NUMBER, 0)
            .bytes(items::SEQUENCE_REF, &u.dm_sequence);

        let mut seq = LocalSet::new(labels::SEQUENCE, &u.dm_sequence);
        seq.ul(items::DATA_DEFINITION, &labels::DATA_DEF_DESCRIPTIVE)
            .u64(items::DURATION, self.duration)
            .batch16(items::STRUCTURAL_COMPONENTS, [&u.dm_segment]);

        let mut segment = LocalSet::new(labels::DM_SEGMENT, &u.dm_segment);
        segment
            .ul(items::DATA_DEFINITION, &labels::DATA_DEF_DESCRIPTIVE)
            .u64(items::DURATION, self.duration)
            .bytes(items::DM_FRAMEWORK, &u.crypto_framework);

        let mut framework = LocalSet::new(labels::CRYPTOGRAPHIC_FRAMEWORK, &u.crypto_framework);
        framework.bytes(items::CRYPTOGRAPHIC_CONTEXT_REF, &u.crypto_context);

        let mic = if crypto.uses_hmac {
            labels::MIC_HMAC_SHA1
        } else {
            labels::MIC_NONE
        };
        let mut context = LocalSet::new(labels::CRYPTOGRAPHIC_CONTEXT, &u.crypto_context);
        context
            .bytes(items::CONTEXT_ID, &crypto.context_id)
            .ul(items::SOURCE_ESSENCE_CONTAINER, &self.essence_container)
            .ul(items::CIPHER_ALGORITHM, &labels::CIPHER_AES_128_CBC)
            .ul(items::MIC_ALGORITHM, &mic)
            .bytes(items::CRYPTOGRAPHIC_KEY_ID, &crypto.key_id);

        vec![track, seq, segment, framework, context]
    }

    fn descriptor_sets(&self) -> Vec<LocalSet> {
        let u = &self.uids;
        match &self.descriptor {
            FileDescriptor::Picture(p) => {
                let mut desc = LocalSet::new(labels::RGBA_DESCRIPTOR, &u.descriptor);
                desc.u32(items::LINKED_TRACK_ID, ESSENCE_TRACK_ID)
                    .rational(items::SAMPLE_RATE, p.edit_rate)
                    .u64(items::CONTAINER_DURATION, p.container_duration)
                    .ul(items::ESSENCE_CONTAINER, &self.essence_container)
                    .ul(items::PICTURE_ESSENCE_CODING, &labels::PICTURE_CODING_JPEG2000)
                    .u8(items::FRAME_LAYOUT, 0)
                    .u32(items::STORED_WIDTH, p.stored_width)
                    .u32(items::STORED_HEIGHT, p.stored_height)
                    .rational(items::ASPECT_RATIO, p.aspect_ratio)
                    .batch16(items::SUB_DESCRIPTORS, [&u.sub_descriptor]);

                let j = &p.j2k;
                let mut sizing = Vec::with_capacity(8 + j.components.len() * 3);
                sizing.extend_from_slice(&(j.components.len() as u32).to_be_bytes());
                sizing.extend_from_slice(&3u32.to_be_bytes());
                for c in &j.components {
                    sizing.extend_from_slice(&[c.ssiz, c.xrsiz, c.yrsiz]);
                }
                let mut sub = LocalSet::new(labels::JPEG2000_SUB_DESCRIPTOR, &u.sub_descriptor);
                sub.u16(items::J2K_RSIZ, j.rsiz)
                    .u32(items::J2K_XSIZ, j.xsiz)
                    .u32(items::J2K_YSIZ, j.ysiz)
                    .u32(items::J2K_XOSIZ, j.xosiz)
                    .u32(items::J2K_YOSIZ, j.yosiz)
                    .u32(items::J2K_XTSIZ, j.xtsiz)
                    .u32(items::J2K_YTSIZ, j.ytsiz)
                    .u32(items::J2K_XTOSIZ, j.xtosiz)
                    .u32(items::J2K_YTOSIZ, j.ytosiz)
                    .u16(items::J2K_CSIZ, j.components.len() as u16)
                    .bytes(items::J2K_COMPONENT_SIZING, &sizing)
                    .bytes(items::J2K_CODING_STYLE_DEFAULT, &j.cod)
                    .bytes(items::J2K_QUANTIZATION_DEFAULT, &j.qcd);
                vec![desc, sub]
            }
            FileDescriptor::Audio(w) => {
                let a = &w.audio;
                let mut desc = LocalSet::new(labels::WAVE_AUDIO_DESCRIPTOR, &u.descriptor);
                desc.u32(items::LINKED_TRACK_ID, ESSENCE_TRACK_ID)
                    .rational(items::SAMPLE_RATE, a.edit_rate)
                    .u64(items::CONTAINER_DURATION, a.container_duration)
                    .ul(items::ESSENCE_CONTAINER, &self.essence_container)
                    .rational(items::AUDIO_SAMPLING_RATE, a.audio_sampling_rate)
                    .u8(items::LOCKED, 0)
                    .u32(items::CHANNEL_COUNT, a.channel_count)
                    .u32(items::QUANTIZATION_BITS, a.quantization_bits)
                    .u16(items::BLOCK_ALIGN, a.block_align as u16)
                    .u32(items::AVG_BPS, a.avg_bytes_per_second);
                if let Some(ul) = &w.channel_assignment {
                    desc.ul(items::CHANNEL_ASSIGNMENT, ul);
                }
                vec![desc]
            }
        }
    }
}

/// 头部元数据扫描结果 (用于检查已写出的文件)
#[derive(Debug)]
pub struct HeaderScan<'a> {
    /// 本地标签映射
    pub primer: Primer,
    /// 全部集合 (不含 Primer 与填充项)
    pub sets: Vec<KlvRef<'a>>,
}

impl HeaderScan<'_> {
    /// 第一个指定键的集合中某属性的值
    pub fn find(&self, set_key: &Ul, item: &Item) -> As02Result<Option<&[u8]>> {
        for set in self.sets.iter().filter(|s| s.key == *set_key) {
            if let Some(v) = self.primer.find_item(set.value, &item.ul)? {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }
}

/// 扫描头部元数据字节 (Primer Pack 起始)
pub fn scan_header(data: &[u8]) -> As02Result<HeaderScan<'_>> {
    let mut reader = KlvReader::new(data);
    let first = reader
        .next_klv()?
        .ok_or_else(|| As02Error::InvalidData("头部元数据为空".into()))?;
    if first.key != labels::PRIMER_PACK {
        return Err(As02Error::InvalidData("头部元数据不以 Primer Pack 开始".into()));
    }
    let primer = Primer::parse(first.value)?;
    let mut sets = Vec::new();
    while let Some(klv) = reader.next_klv()? {
        if klv.key != labels::FILL_ITEM {
            sets.push(klv);
        }
    }
    Ok(HeaderScan { primer, sets })
}
