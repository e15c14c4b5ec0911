//! SMPTE 429-6 加密三元组.
//!
//! 加密帧以一个 KLV 写出, 其值依次为以 4 字节 BER 长度前缀的字段:
//! ```text
//! ContextID | PlaintextOffset | SourceKey | SourceLength | ESV | TrackFileID | SequenceNumber [| MIC]
//! ```
//! MIC 覆盖 ESV、TrackFileID 与 SequenceNumber 的值字节.

use as02_core::{As02Error, As02Result, Ul};
use as02_crypto::{CBC_BLOCK_SIZE, FrameCrypto, Iv, MIC_LEN};

use super::klv::{decode_ber_length, encode_ber4, write_klv_header4};
use super::labels;

/// 三元组中与加密无关的帧标识
#[derive(Debug, Clone, Copy)]
pub struct TripletHeader<'a> {
    /// 加密上下文 ID
    pub context_id: &'a [u8; 16],
    /// 明文素材元素键
    pub source_key: &'a Ul,
    /// 轨道文件 ID
    pub track_file_id: &'a [u8; 16],
    /// 序号 (从 1 开始)
    pub sequence_number: u64,
}

/// 一帧编码结果
#[derive(Debug, Clone)]
pub struct EncodedTriplet {
    /// 完整 KLV
    pub bytes: Vec<u8>,
    /// 下一帧使用的 IV
    pub next_iv: Iv,
}

fn put_field(out: &mut Vec<u8>, value: &[u8]) -> As02Result<()> {
    out.extend_from_slice(&encode_ber4(value.len())?);
    out.extend_from_slice(value);
    Ok(())
}

/// 加密一帧并编码为三元组
pub fn encode_triplet(
    header: &TripletHeader<'_>,
    frame: &[u8],
    plaintext_offset: usize,
    crypto: &FrameCrypto<'_>,
) -> As02Result<EncodedTriplet> {
    let encrypted = crypto
        .cipher
        .encrypt_frame(&crypto.iv, frame, plaintext_offset)?;
    let sequence = header.sequence_number.to_be_bytes();

    let mut value = Vec::with_capacity(encrypted.value.len() + 160);
    put_field(&mut value, header.context_id)?;
    put_field(&mut value, &(plaintext_offset as u64).to_be_bytes())?;
    put_field(&mut value, header.source_key.as_bytes())?;
    put_field(&mut value, &(frame.len() as u64).to_be_bytes())?;
    put_field(&mut value, &encrypted.value)?;
    put_field(&mut value, header.track_file_id)?;
    put_field(&mut value, &sequence)?;
    if let Some(hmac) = crypto.hmac {
        let mic = hmac.mic(&[
            encrypted.value.as_slice(),
            header.track_file_id.as_slice(),
            sequence.as_slice(),
        ])?;
        put_field(&mut value, &mic)?;
    }

    let mut bytes = Vec::with_capacity(value.len() + 20);
    write_klv_header4(&mut bytes, &labels::ENCRYPTED_TRIPLET, value.len())?;
    bytes.extend_from_slice(&value);
    Ok(EncodedTriplet {
        bytes,
        next_iv: encrypted.next_iv,
    })
}

/// 已解析的三元组字段
#[derive(Debug, Clone, Copy)]
pub struct ParsedTriplet<'a> {
    /// 加密上下文 ID
    pub context_id: &'a [u8],
    /// 明文偏移
    pub plaintext_offset: u64,
    /// 明文素材元素键
    pub source_key: Ul,
    /// 明文长度
    pub source_length: u64,
    /// 加密后的源值
    pub esv: &'a [u8],
    /// 轨道文件 ID
    pub track_file_id: &'a [u8],
    /// 序号
    pub sequence_number: u64,
    /// MIC
    pub mic: Option<&'a [u8]>,
}

impl<'a> ParsedTriplet<'a> {
    /// 从三元组 KLV 的值解析
    pub fn parse(value: &'a [u8]) -> As02Result<Self> {
        let mut fields = Vec::with_capacity(8);
        let mut pos = 0;
        while pos < value.len() {
            let (len, size) = decode_ber_length(&value[pos..])?;
            let start = pos + size;
            let end = start
                .checked_add(len)
                .filter(|end| *end <= value.len())
                .ok_or_else(|| As02Error::InvalidData("三元组字段长度越界".into()))?;
            fields.push(&value[start..end]);
            pos = end;
        }
        if fields.len() != 7 && fields.len() != 8 {
            return Err(As02Error::InvalidData(format!(
                "三元组字段数应为 7 或 8, 实际 {}",
                fields.len()
            )));
        }
        let key: [u8; 16] = fields[2]
            .try_into()
            .map_err(|_| As02Error::InvalidData("三元组素材键长度错误".into()))?;
        if fields[4].len() < CBC_BLOCK_SIZE * 2 {
            return Err(As02Error::InvalidData("加密源值过短".into()));
        }
        if fields.get(7).is_some_and(|mic| mic.len() != MIC_LEN) {
            return Err(As02Error::InvalidData("MIC 长度错误".into()));
        }
        Ok(Self {
            context_id: fields[0],
            plaintext_offset: be_u64(fields[1])?,
            source_key: Ul(key),
            source_length: be_u64(fields[3])?,
            esv: fields[4],
            track_file_id: fields[5],
            sequence_number: be_u64(fields[6])?,
            mic: fields.get(7).copied(),
        })
    }

    /// 本帧使用的 IV
    pub fn iv(&self) -> Iv {
        let mut iv = [0u8; CBC_BLOCK_SIZE];
        iv.copy_from_slice(&self.esv[..CBC_BLOCK_SIZE]);
        iv
    }

    /// 本帧密文的最后一个分组
    pub fn last_block(&self) -> Iv {
        let mut block = [0u8; CBC_BLOCK_SIZE];
        block.copy_from_slice(&self.esv[self.esv.len() - CBC_BLOCK_SIZE..]);
        block
    }
}

fn be_u64(bytes: &[u8]) -> As02Result<u64> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| As02Error::InvalidData("三元组整数字段应为 8 字节".into()))?;
    Ok(u64::from_be_bytes(array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mxf::klv::KlvReader;
    use as02_crypto::{CipherContext, HmacContext, LabelSet};

    const KEY: [u8; 16] = [0x42; 16];

    fn header<'a>(ctx: &'a [u8; 16], tfid: &'a [u8; 16], seq: u64) -> TripletHeader<'a> {
        TripletHeader {
            context_id: ctx,
            source_key: &labels::ELEMENT_JPEG2000,
            track_file_id: tfid,
            sequence_number: seq,
        }
    }

    #[test]
    fn test_三元组字段() {
        let cipher = CipherContext::new(&KEY).unwrap();
        let hmac = HmacContext::new(&KEY, LabelSet::Smpte).unwrap();
        let crypto = FrameCrypto {
            cipher: &cipher,
            iv: [9u8; 16],
            hmac: Some(&hmac),
        };
        let ctx = [1u8; 16];
        let tfid = [2u8; 16];
        let frame = vec![0xabu8; 300];
        let out = encode_triplet(&header(&ctx, &tfid, 1), &frame, 40, &crypto).unwrap();

        let klv = KlvReader::new(&out.bytes).next_klv().unwrap().unwrap();
        assert_eq!(klv.key, labels::ENCRYPTED_TRIPLET);
        let t = ParsedTriplet::parse(klv.value).unwrap();
        assert_eq!(t.context_id, &ctx);
        assert_eq!(t.plaintext_offset, 40);
        assert_eq!(t.source_key, labels::ELEMENT_JPEG2000);
        assert_eq!(t.source_length, 300);
        assert_eq!(t.iv(), [9u8; 16]);
        assert_eq!(t.last_block(), out.next_iv);
        assert_eq!(t.sequence_number, 1);
        assert_eq!(&t.esv[32..72], &frame[..40]);

        let seq = 1u64.to_be_bytes();
        let mic = hmac.mic(&[t.esv, tfid.as_slice(), seq.as_slice()]).unwrap();
        assert_eq!(t.mic.unwrap(), &mic);
    }

    #[test]
    fn test_无_hmac_时不写_mic() {
        let cipher = CipherContext::new(&KEY).unwrap();
        let crypto = FrameCrypto {
            cipher: &cipher,
            iv: [0u8; 16],
            hmac: None,
        };
        let ctx = [1u8; 16];
        let tfid = [2u8; 16];
        let out = encode_triplet(&header(&ctx, &tfid, 7), &[1, 2, 3], 0, &crypto).unwrap();
        let klv = KlvReader::new(&out.bytes).next_klv().unwrap().unwrap();
        let t = ParsedTriplet::parse(klv.value).unwrap();
        assert!(t.mic.is_none());
        assert_eq!(t.sequence_number, 7);
    }
}
