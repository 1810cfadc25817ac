use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel data types a raster tile can carry. Mirrors GDAL's numeric
/// type set (the concrete raster library this system sits on top of).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl DType {
    /// The smallest integer/float type that can hold `v` exactly,
    /// used by `constant(v)` (spec §3 invariant 2).
    pub fn smallest_for_value(v: f64) -> DType {
        if v.fract() != 0.0 {
            return if (v as f32) as f64 == v { DType::F32 } else { DType::F64 };
        }
        if v >= 0.0 {
            if v <= u8::MAX as f64 {
                DType::U8
            } else if v <= u16::MAX as f64 {
                DType::U16
            } else if v <= u32::MAX as f64 {
                DType::U32
            } else {
                DType::F64
            }
        } else {
            if v >= i8::MIN as f64 {
                DType::I8
            } else if v >= i16::MIN as f64 {
                DType::I16
            } else if v >= i32::MIN as f64 {
                DType::I32
            } else {
                DType::F64
            }
        }
    }

    /// The widened dtype a binary arithmetic operator produces (spec
    /// §3 invariant 3: "a widened numeric type... sufficient to hold
    /// arithmetic and comparison outputs").
    pub fn widen_for_arithmetic(_lhs: DType, _rhs: DType) -> DType {
        DType::F64
    }

    /// The dtype a comparison operator produces. Tightened from the
    /// source's hardcoded F64 (spec §9 open question: "implementers
    /// may tighten without changing observable pixel values") since a
    /// boolean raster fits naturally in a byte.
    pub fn for_comparison() -> DType {
        DType::U8
    }

    /// The dtype floor division produces when both operands are
    /// already integral (spec §4.2 "Division semantics").
    pub fn widen_for_floor_div(lhs: DType, rhs: DType) -> DType {
        if lhs.is_integral() && rhs.is_integral() {
            if lhs.size_bytes() >= rhs.size_bytes() {
                lhs
            } else {
                rhs
            }
        } else {
            DType::F64
        }
    }

    pub fn is_integral(&self) -> bool {
        !matches!(self, DType::F32 | DType::F64)
    }

    pub fn size_bytes(&self) -> u8 {
        match self {
            DType::U8 | DType::I8 => 1,
            DType::U16 | DType::I16 => 2,
            DType::U32 | DType::I32 | DType::F32 => 4,
            DType::F64 => 8,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::U8 => "uint8",
            DType::U16 => "uint16",
            DType::U32 => "uint32",
            DType::I8 => "int8",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::F32 => "float32",
            DType::F64 => "float64",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_for_value_picks_the_tightest_integer_type() {
        assert_eq!(DType::smallest_for_value(4.0), DType::U8);
        assert_eq!(DType::smallest_for_value(-4.0), DType::I8);
        assert_eq!(DType::smallest_for_value(90_000.0), DType::U32);
        assert_eq!(DType::smallest_for_value(1.5), DType::F32);
    }

    #[test]
    fn arithmetic_always_widens_to_f64() {
        assert_eq!(DType::widen_for_arithmetic(DType::U8, DType::I16), DType::F64);
    }

    #[test]
    fn floor_div_of_two_integrals_keeps_the_wider_integer_type() {
        assert_eq!(DType::widen_for_floor_div(DType::U8, DType::I16), DType::I16);
        assert_eq!(DType::widen_for_floor_div(DType::F32, DType::U8), DType::F64);
    }
}
