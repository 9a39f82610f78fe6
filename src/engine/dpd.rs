//! Decimal interchange formats: densely-packed-decimal declets and the
//! 32/64/128-bit encodings (sign bit, 5-bit combination field, exponent
//! continuation, coefficient declets). `decode` accepts any bit pattern;
//! `encode_raw` always produces the canonical one.

use super::value::{DecValue, Kind};

/// One of the three fixed-width interchange encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Decimal32,
    Decimal64,
    Decimal128,
}

impl Format {
    pub const fn bytes(self) -> usize {
        match self {
            Format::Decimal32 => 4,
            Format::Decimal64 => 8,
            Format::Decimal128 => 16,
        }
    }

    /// Coefficient length in digits.
    pub const fn digits(self) -> i32 {
        match self {
            Format::Decimal32 => 7,
            Format::Decimal64 => 16,
            Format::Decimal128 => 34,
        }
    }

    pub const fn bias(self) -> i32 {
        match self {
            Format::Decimal32 => 101,
            Format::Decimal64 => 398,
            Format::Decimal128 => 6176,
        }
    }

    pub const fn emax(self) -> i32 {
        match self {
            Format::Decimal32 => 96,
            Format::Decimal64 => 384,
            Format::Decimal128 => 6144,
        }
    }

    pub const fn emin(self) -> i32 {
        match self {
            Format::Decimal32 => -95,
            Format::Decimal64 => -383,
            Format::Decimal128 => -6143,
        }
    }

    /// Width of the exponent continuation field.
    pub const fn econt_bits(self) -> u32 {
        match self {
            Format::Decimal32 => 6,
            Format::Decimal64 => 8,
            Format::Decimal128 => 12,
        }
    }

    pub const fn declets(self) -> usize {
        (self.digits() as usize - 1) / 3
    }

    /// Map a hex-notation digit count (8, 16 or 32) to its format.
    pub fn from_hex_digits(n: usize) -> Option<Format> {
        match n {
            8 => Some(Format::Decimal32),
            16 => Some(Format::Decimal64),
            32 => Some(Format::Decimal128),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Decimal32 => "decimal32",
            Format::Decimal64 => "decimal64",
            Format::Decimal128 => "decimal128",
        }
    }
}

/// Expand one 10-bit declet into three digits. All 1024 patterns decode;
/// the 24 non-canonical ones alias values containing eights and nines.
pub fn declet_to_digits(declet: u16) -> [u8; 3] {
    let b = |i: u32| ((declet >> i) & 1) as u8;
    let small = |x2: u8, x1: u8, x0: u8| 4 * x2 + 2 * x1 + x0;
    if b(3) == 0 {
        return [small(b(9), b(8), b(7)), small(b(6), b(5), b(4)), small(b(2), b(1), b(0))];
    }
    match (b(2), b(1)) {
        (0, 0) => [small(b(9), b(8), b(7)), small(b(6), b(5), b(4)), 8 + b(0)],
        (0, 1) => [small(b(9), b(8), b(7)), 8 + b(4), small(b(6), b(5), b(0))],
        (1, 0) => [8 + b(7), small(b(6), b(5), b(4)), small(b(9), b(8), b(0))],
        _ => match (b(6), b(5)) {
            (0, 0) => [8 + b(7), 8 + b(4), small(b(9), b(8), b(0))],
            (0, 1) => [8 + b(7), small(b(9), b(8), b(4)), 8 + b(0)],
            (1, 0) => [small(b(9), b(8), b(7)), 8 + b(4), 8 + b(0)],
            _ => [8 + b(7), 8 + b(4), 8 + b(0)],
        },
    }
}

/// Pack three digits into the canonical 10-bit declet.
pub fn digits_to_declet(d: [u8; 3]) -> u16 {
    let bits = |p: u16, q: u16, r: u16, s: u16, t: u16, u: u16, v: u16, w: u16, x: u16, y: u16| {
        p << 9 | q << 8 | r << 7 | s << 6 | t << 5 | u << 4 | v << 3 | w << 2 | x << 1 | y
    };
    let bit = |d: u8, i: u32| ((d >> i) & 1) as u16;
    let (d1, d2, d3) = (d[0], d[1], d[2]);
    match (d1 >= 8, d2 >= 8, d3 >= 8) {
        (false, false, false) => bits(
            bit(d1, 2), bit(d1, 1), bit(d1, 0),
            bit(d2, 2), bit(d2, 1), bit(d2, 0),
            0,
            bit(d3, 2), bit(d3, 1), bit(d3, 0),
        ),
        (false, false, true) => bits(
            bit(d1, 2), bit(d1, 1), bit(d1, 0),
            bit(d2, 2), bit(d2, 1), bit(d2, 0),
            1, 0, 0, bit(d3, 0),
        ),
        (false, true, false) => bits(
            bit(d1, 2), bit(d1, 1), bit(d1, 0),
            bit(d3, 2), bit(d3, 1), bit(d2, 0),
            1, 0, 1, bit(d3, 0),
        ),
        (true, false, false) => bits(
            bit(d3, 2), bit(d3, 1), bit(d1, 0),
            bit(d2, 2), bit(d2, 1), bit(d2, 0),
            1, 1, 0, bit(d3, 0),
        ),
        (true, true, false) => bits(
            bit(d3, 2), bit(d3, 1), bit(d1, 0),
            0, 0, bit(d2, 0),
            1, 1, 1, bit(d3, 0),
        ),
        (true, false, true) => bits(
            bit(d2, 2), bit(d2, 1), bit(d1, 0),
            0, 1, bit(d2, 0),
            1, 1, 1, bit(d3, 0),
        ),
        (false, true, true) => bits(
            bit(d1, 2), bit(d1, 1), bit(d1, 0),
            1, 0, bit(d2, 0),
            1, 1, 1, bit(d3, 0),
        ),
        (true, true, true) => bits(
            0, 0, bit(d1, 0),
            1, 1, bit(d2, 0),
            1, 1, 1, bit(d3, 0),
        ),
    }
}

/// Decode an interchange encoding (most significant byte first).
pub fn decode(fmt: Format, bytes: &[u8]) -> DecValue {
    debug_assert_eq!(bytes.len(), fmt.bytes());
    let mut acc: u128 = 0;
    for &b in bytes {
        acc = acc << 8 | b as u128;
    }
    let total = fmt.bytes() * 8;
    let ec_bits = fmt.econt_bits();
    let sign = (acc >> (total - 1)) & 1 == 1;
    let comb = ((acc >> (total - 6)) & 0x1f) as u32;
    let econt = ((acc >> (total - 6 - ec_bits as usize)) & ((1u128 << ec_bits) - 1)) as u32;
    match comb {
        0b11110 => DecValue::infinity(sign),
        0b11111 => {
            let signaling = econt >> (ec_bits - 1) & 1 == 1;
            DecValue::nan(sign, unpack_declets(acc, fmt.declets()), signaling)
        }
        _ => {
            let (exp_msbs, msd) = if comb >> 3 == 0b11 {
                ((comb >> 1) & 0b11, 8 + (comb & 1))
            } else {
                (comb >> 3, comb & 0b111)
            };
            let exponent = ((exp_msbs << ec_bits) | econt) as i32 - fmt.bias();
            let mut digits = vec![msd as u8];
            digits.extend(unpack_declets(acc, fmt.declets()));
            DecValue::finite(sign, digits, exponent)
        }
    }
}

fn unpack_declets(acc: u128, declets: usize) -> Vec<u8> {
    let mut digits = Vec::with_capacity(declets * 3);
    for i in (0..declets).rev() {
        let declet = ((acc >> (i * 10)) & 0x3ff) as u16;
        digits.extend_from_slice(&declet_to_digits(declet));
    }
    digits
}

/// Encode a value that already fits the format: coefficient no wider than
/// `fmt.digits()` and, for finite values, a biased exponent in range.
pub fn encode_raw(fmt: Format, value: &DecValue) -> Vec<u8> {
    let total = fmt.bytes() * 8;
    let ec_bits = fmt.econt_bits() as usize;
    let mut acc: u128 = 0;
    if value.sign {
        acc |= 1 << (total - 1);
    }
    match value.kind {
        Kind::Infinite => {
            acc |= 0b11110 << (total - 6);
        }
        Kind::Quiet | Kind::Signaling => {
            acc |= 0b11111 << (total - 6);
            if value.kind == Kind::Signaling {
                acc |= 1 << (total - 7);
            }
            let payload = pad_left(&value.digits, fmt.declets() * 3);
            acc |= pack_declets(&payload);
        }
        Kind::Finite => {
            let biased = (value.exponent + fmt.bias()) as u32;
            let exp_msbs = biased >> ec_bits;
            let econt = biased & ((1 << ec_bits) - 1);
            let padded = pad_left(&value.digits, fmt.digits() as usize);
            let msd = padded[0] as u32;
            let comb = if msd >= 8 {
                0b11000 | exp_msbs << 1 | (msd & 1)
            } else {
                exp_msbs << 3 | msd
            };
            acc |= (comb as u128) << (total - 6);
            acc |= (econt as u128) << (total - 6 - ec_bits);
            acc |= pack_declets(&padded[1..]);
        }
    }
    (0..fmt.bytes()).rev().map(|i| (acc >> (i * 8)) as u8).collect()
}

fn pad_left(digits: &[u8], width: usize) -> Vec<u8> {
    if digits.len() >= width {
        digits[digits.len() - width..].to_vec()
    } else {
        let mut v = vec![0; width - digits.len()];
        v.extend_from_slice(digits);
        v
    }
}

fn pack_declets(digits: &[u8]) -> u128 {
    let mut acc = 0u128;
    for chunk in digits.chunks(3) {
        acc = acc << 10 | digits_to_declet([chunk[0], chunk[1], chunk[2]]) as u128;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02X}")).collect()
    }

    fn unhex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn declets_round_trip_all_values() {
        for n in 0u16..1000 {
            let digits = [(n / 100) as u8, (n / 10 % 10) as u8, (n % 10) as u8];
            assert_eq!(declet_to_digits(digits_to_declet(digits)), digits);
        }
    }

    #[test]
    fn known_declets() {
        assert_eq!(digits_to_declet([7, 5, 0]), 0x3D0);
        assert_eq!(digits_to_declet([9, 9, 9]), 0x0FF);
        // a non-canonical alias of 999
        assert_eq!(declet_to_digits(0x3FF), [9, 9, 9]);
    }

    #[test]
    fn one_in_each_width() {
        let one = DecValue::finite(false, vec![1], 0);
        assert_eq!(hex(&encode_raw(Format::Decimal32, &one)), "22500001");
        assert_eq!(hex(&encode_raw(Format::Decimal64, &one)), "2238000000000001");
        assert_eq!(
            hex(&encode_raw(Format::Decimal128, &one)),
            "22080000000000000000000000000001"
        );
        for fmt in [Format::Decimal32, Format::Decimal64, Format::Decimal128] {
            assert_eq!(decode(fmt, &encode_raw(fmt, &one)), one);
        }
    }

    #[test]
    fn signed_fraction_decimal32() {
        let v = DecValue::finite(true, vec![7, 5, 0], -2);
        assert_eq!(hex(&encode_raw(Format::Decimal32, &v)), "A23003D0");
        assert_eq!(decode(Format::Decimal32, &unhex("A23003D0")), v);
    }

    #[test]
    fn specials_round_trip() {
        for fmt in [Format::Decimal32, Format::Decimal64, Format::Decimal128] {
            for v in [
                DecValue::infinity(false),
                DecValue::infinity(true),
                DecValue::nan(false, vec![], false),
                DecValue::nan(false, vec![1, 2], true),
                DecValue::nan(true, vec![9, 8, 7], false),
            ] {
                assert_eq!(decode(fmt, &encode_raw(fmt, &v)), v, "{}", fmt.name());
            }
        }
    }

    #[test]
    fn non_canonical_declet_is_rewritten() {
        // low declet 0x3FF aliases 999; re-encoding canonicalizes it to 0x0FF
        let raw = unhex("223003FF");
        let v = decode(Format::Decimal32, &raw);
        assert_eq!(v.digits, vec![9, 9, 9]);
        assert_eq!(hex(&encode_raw(Format::Decimal32, &v)), "223000FF");
    }

    #[test]
    fn hex_width_table() {
        assert_eq!(Format::from_hex_digits(8), Some(Format::Decimal32));
        assert_eq!(Format::from_hex_digits(16), Some(Format::Decimal64));
        assert_eq!(Format::from_hex_digits(32), Some(Format::Decimal128));
        assert_eq!(Format::from_hex_digits(10), None);
    }
}
