//! 有理数类型, 用于编辑速率 (edit rate)、采样率、宽高比等场景.
//!
//! MXF 中所有速率均以 (分子, 分母) 两个 32 位整数存储.

use std::fmt;

/// 有理数, 由分子和分母组成
///
/// 例如: 编辑速率 24/1 表示 24fps, 48000/1 表示 48kHz 采样率.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// 分子
    pub num: i32,
    /// 分母
    pub den: i32,
}

impl Rational {
    /// 创建新的有理数
    ///
    /// # 参数
    /// - `num`: 分子
    /// - `den`: 分母 (不应为 0)
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// 未定义 (分母为 0)
    pub const UNDEFINED: Self = Self { num: 0, den: 0 };

    /// 默认输出编辑速率 24/1
    pub const EDIT_RATE_24: Self = Self { num: 24, den: 1 };

    /// 48kHz 采样率
    pub const SAMPLE_RATE_48K: Self = Self {
        num: 48_000,
        den: 1,
    };

    /// 96kHz 采样率
    pub const SAMPLE_RATE_96K: Self = Self {
        num: 96_000,
        den: 1,
    };

    /// 判断是否有效 (分子分母均为正)
    pub const fn is_valid(&self) -> bool {
        self.den > 0 && self.num > 0
    }

    /// 对有理数进行约分
    pub fn reduce(self) -> Self {
        if self.den == 0 {
            return self;
        }
        let g = gcd(self.num.unsigned_abs(), self.den.unsigned_abs());
        if g == 0 {
            return self;
        }
        let g = g as i32;
        // 保证分母为正
        let sign = if self.den < 0 { -1 } else { 1 };
        Self {
            num: sign * self.num / g,
            den: sign * self.den / g,
        }
    }

    /// 编码为 MXF Rational (大端 分子 + 分母, 共 8 字节)
    pub fn to_be_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.num.to_be_bytes());
        out[4..].copy_from_slice(&self.den.to_be_bytes());
        out
    }

    /// 将以本速率计数的位置换算为另一速率下的单位数 (向上取整)
    ///
    /// 例如 48000/1 的采样率在 24/1 编辑速率下每帧 2000 个采样.
    pub fn units_per(self, rate: Rational) -> u64 {
        if !self.is_valid() || !rate.is_valid() {
            return 0;
        }
        let num = u64::from(self.num.unsigned_abs()) * u64::from(rate.den.unsigned_abs());
        let den = u64::from(self.den.unsigned_abs()) * u64::from(rate.num.unsigned_abs());
        num.div_ceil(den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self { num, den }
    }
}

impl From<i32> for Rational {
    fn from(num: i32) -> Self {
        Self { num, den: 1 }
    }
}

/// 求最大公约数 (欧几里得算法)
fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational_reduce() {
        let r = Rational::new(48, 2).reduce();
        assert_eq!(r, Rational::new(24, 1));
    }

    #[test]
    fn test_rational_invalid_value() {
        assert!(!Rational::UNDEFINED.is_valid());
        assert!(!Rational::new(-24, 1).is_valid());
    }

    #[test]
    fn test_rational_display() {
        let r = Rational::new(24000, 1001);
        assert_eq!(format!("{r}"), "24000/1001");
    }

    #[test]
    fn test_rational_mxf_bytes() {
        let bytes = Rational::EDIT_RATE_24.to_be_bytes();
        assert_eq!(bytes, [0, 0, 0, 24, 0, 0, 0, 1]);
    }

    #[test]
    fn test_每帧采样数() {
        assert_eq!(Rational::SAMPLE_RATE_48K.units_per(Rational::EDIT_RATE_24), 2000);
        assert_eq!(Rational::SAMPLE_RATE_96K.units_per(Rational::new(25, 1)), 3840);
        // 29.97fps 下不能整除, 向上取整
        assert_eq!(
            Rational::SAMPLE_RATE_48K.units_per(Rational::new(30000, 1001)),
            1602
        );
        assert_eq!(Rational::SAMPLE_RATE_48K.units_per(Rational::UNDEFINED), 0);
    }
}
