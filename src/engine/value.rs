//! The numeric value exchanged with the engine: sign, coefficient digits,
//! exponent, and a special-value tag. Formatting follows the
//! to-scientific-string and to-engineering-string rules of the decimal
//! arithmetic specification.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Finite,
    Infinite,
    /// Quiet NaN; `digits` holds the diagnostic payload.
    Quiet,
    /// Signaling NaN.
    Signaling,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecValue {
    /// True for negative (including -0 and -NaN).
    pub sign: bool,
    /// Coefficient or NaN payload, most significant digit first, no leading
    /// zeros (a lone 0 for zero or an empty payload).
    pub digits: Vec<u8>,
    pub exponent: i32,
    pub kind: Kind,
}

fn normalize(mut digits: Vec<u8>) -> Vec<u8> {
    let lead = digits.iter().take_while(|&&d| d == 0).count();
    if lead == digits.len() {
        return vec![0];
    }
    digits.drain(..lead);
    digits
}

impl DecValue {
    pub fn zero() -> DecValue {
        DecValue { sign: false, digits: vec![0], exponent: 0, kind: Kind::Finite }
    }

    pub fn finite(sign: bool, digits: Vec<u8>, exponent: i32) -> DecValue {
        DecValue { sign, digits: normalize(digits), exponent, kind: Kind::Finite }
    }

    pub fn from_int(n: i64) -> DecValue {
        let digits = n
            .unsigned_abs()
            .to_string()
            .bytes()
            .map(|b| b - b'0')
            .collect();
        DecValue { sign: n < 0, digits, exponent: 0, kind: Kind::Finite }
    }

    pub fn infinity(sign: bool) -> DecValue {
        DecValue { sign, digits: vec![0], exponent: 0, kind: Kind::Infinite }
    }

    pub fn nan(sign: bool, payload: Vec<u8>, signaling: bool) -> DecValue {
        DecValue {
            sign,
            digits: normalize(payload),
            exponent: 0,
            kind: if signaling { Kind::Signaling } else { Kind::Quiet },
        }
    }

    pub fn is_finite(&self) -> bool {
        self.kind == Kind::Finite
    }

    pub fn is_infinite(&self) -> bool {
        self.kind == Kind::Infinite
    }

    pub fn is_nan(&self) -> bool {
        matches!(self.kind, Kind::Quiet | Kind::Signaling)
    }

    pub fn is_signaling(&self) -> bool {
        self.kind == Kind::Signaling
    }

    pub fn is_special(&self) -> bool {
        self.kind != Kind::Finite
    }

    pub fn is_zero(&self) -> bool {
        self.is_finite() && self.digits == [0]
    }

    /// Exponent of the most significant digit.
    pub fn adjusted_exponent(&self) -> i64 {
        self.exponent as i64 + self.digits.len() as i64 - 1
    }

    fn digit_str(&self) -> String {
        self.digits.iter().map(|&d| (b'0' + d) as char).collect()
    }

    /// Scientific notation per the arithmetic specification.
    pub fn to_sci_string(&self) -> String {
        let mut out = String::new();
        if self.sign {
            out.push('-');
        }
        match self.kind {
            Kind::Infinite => out.push_str("Infinity"),
            Kind::Quiet | Kind::Signaling => {
                if self.kind == Kind::Signaling {
                    out.push('s');
                }
                out.push_str("NaN");
                if self.digits != [0] {
                    out.push_str(&self.digit_str());
                }
            }
            Kind::Finite => out.push_str(&self.format_finite(false)),
        }
        out
    }

    /// Engineering notation: like scientific, but the printed exponent is a
    /// multiple of three.
    pub fn to_eng_string(&self) -> String {
        if self.kind != Kind::Finite {
            return self.to_sci_string();
        }
        let mut out = String::new();
        if self.sign {
            out.push('-');
        }
        out.push_str(&self.format_finite(true));
        out
    }

    fn format_finite(&self, eng: bool) -> String {
        let n = self.digits.len() as i64;
        let exp = self.exponent as i64;
        let adjusted = exp + n - 1;
        let ds = self.digit_str();
        if exp <= 0 && adjusted >= -6 {
            // plain notation
            if exp == 0 {
                return ds;
            }
            let point = n + exp; // digits left of the point
            if point > 0 {
                format!("{}.{}", &ds[..point as usize], &ds[point as usize..])
            } else {
                format!("0.{}{}", "0".repeat((-point) as usize), ds)
            }
        } else if eng {
            self.format_eng(ds, exp, adjusted)
        } else {
            let mut s = String::new();
            s.push_str(&ds[..1]);
            if n > 1 {
                s.push('.');
                s.push_str(&ds[1..]);
            }
            s.push('E');
            s.push_str(&format_exponent(adjusted));
            s
        }
    }

    fn format_eng(&self, mut ds: String, exp: i64, adjusted: i64) -> String {
        if self.digits == [0] {
            // exponent moves up to a multiple of three; zeros keep the scale
            let shown = (exp + 2).div_euclid(3) * 3;
            let zeros = (shown - exp) as usize;
            let mut s = if zeros == 0 {
                "0".to_string()
            } else {
                format!("0.{}", "0".repeat(zeros))
            };
            if shown != 0 {
                s.push('E');
                s.push_str(&format_exponent(shown));
            }
            return s;
        }
        let int_digits = (adjusted.rem_euclid(3) + 1) as usize;
        let shown = adjusted - (int_digits as i64 - 1);
        while ds.len() < int_digits {
            ds.push('0');
        }
        let mut s = if ds.len() == int_digits {
            ds
        } else {
            format!("{}.{}", &ds[..int_digits], &ds[int_digits..])
        };
        if shown != 0 {
            s.push('E');
            s.push_str(&format_exponent(shown));
        }
        s
    }
}

fn format_exponent(e: i64) -> String {
    if e < 0 {
        format!("-{}", -e)
    } else {
        format!("+{e}")
    }
}

impl fmt::Display for DecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sci_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(sign: bool, digits: &[u8], exponent: i32) -> DecValue {
        DecValue::finite(sign, digits.to_vec(), exponent)
    }

    #[test]
    fn plain_notation() {
        assert_eq!(v(false, &[1, 2, 3], 0).to_sci_string(), "123");
        assert_eq!(v(false, &[1, 2, 3], -2).to_sci_string(), "1.23");
        assert_eq!(v(false, &[1, 2, 3], -5).to_sci_string(), "0.00123");
        assert_eq!(v(true, &[5, 0, 0], -2).to_sci_string(), "-5.00");
        assert_eq!(v(false, &[0], -2).to_sci_string(), "0.00");
    }

    #[test]
    fn scientific_notation() {
        assert_eq!(v(false, &[1, 2, 3], 1).to_sci_string(), "1.23E+3");
        assert_eq!(v(false, &[1], 6).to_sci_string(), "1E+6");
        assert_eq!(v(false, &[1, 2, 3], -10).to_sci_string(), "1.23E-8");
        assert_eq!(v(false, &[1], -7).to_sci_string(), "1E-7");
    }

    #[test]
    fn engineering_notation() {
        assert_eq!(v(false, &[1, 2, 3], 1).to_eng_string(), "1.23E+3");
        assert_eq!(v(false, &[1, 2, 3], 2).to_eng_string(), "12.3E+3");
        assert_eq!(v(false, &[1, 2, 3], 3).to_eng_string(), "123E+3");
        assert_eq!(v(false, &[1], 4).to_eng_string(), "10E+3");
        assert_eq!(v(false, &[1, 2], 1).to_eng_string(), "120");
        assert_eq!(v(false, &[1], -7).to_eng_string(), "100E-9");
        // zero keeps its scale with padding zeros
        assert_eq!(v(false, &[0], 1).to_eng_string(), "0.00E+3");
    }

    #[test]
    fn specials() {
        assert_eq!(DecValue::infinity(false).to_sci_string(), "Infinity");
        assert_eq!(DecValue::infinity(true).to_sci_string(), "-Infinity");
        assert_eq!(DecValue::nan(false, vec![], false).to_sci_string(), "NaN");
        assert_eq!(DecValue::nan(false, vec![1, 2], false).to_sci_string(), "NaN12");
        assert_eq!(DecValue::nan(true, vec![], true).to_sci_string(), "-sNaN");
    }

    #[test]
    fn normalization_strips_leading_zeros() {
        assert_eq!(v(false, &[0, 0, 7, 5, 0], -2).digits, vec![7, 5, 0]);
        assert_eq!(v(false, &[0, 0, 0], 5).digits, vec![0]);
        assert!(v(true, &[0, 0], 0).is_zero());
    }
}
