//! Binding table values as statement parameters
//!
//! Parameter types come from the destination columns, so each cell is
//! encoded as whatever type its column has.

use crate::table::Value;
use bytes::{BufMut, BytesMut};
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

// NUMERIC sign words
const NUMERIC_POS: i16 = 0x0000;
const NUMERIC_NEG: i16 = 0x4000;

fn is_text(ty: &Type) -> bool {
    [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN].contains(ty)
}

fn unsupported(value: &Value, ty: &Type) -> BoxError {
    format!("cannot bind {} to a column of type {}", value, ty).into()
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Integer(i) => integer_to_sql(*i, ty, out).ok_or_else(|| unsupported(self, ty))?,
            Value::Float(f) => float_to_sql(*f, ty, out).ok_or_else(|| unsupported(self, ty))?,
            Value::Text(s) if is_text(ty) => s.as_str().to_sql(ty, out),
            Value::Text(_) => Err(unsupported(self, ty)),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// `None` when the column type can't hold an integer
fn integer_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Option<Result<IsNull, BoxError>> {
    let encoded = if *ty == Type::INT2 {
        i16::try_from(v)
            .map_err(BoxError::from)
            .and_then(|v| v.to_sql(ty, out))
    } else if *ty == Type::INT4 {
        i32::try_from(v)
            .map_err(BoxError::from)
            .and_then(|v| v.to_sql(ty, out))
    } else if *ty == Type::INT8 {
        v.to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (v as f32).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (v as f64).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        numeric_to_sql(v < 0, &v.unsigned_abs().to_string(), "", out)
    } else if *ty == Type::BOOL {
        match v {
            0 => false.to_sql(ty, out),
            1 => true.to_sql(ty, out),
            _ => Err(format!("{} is not a boolean", v).into()),
        }
    } else if is_text(ty) {
        v.to_string().to_sql(ty, out)
    } else {
        return None;
    };
    Some(encoded)
}

/// `None` when the column type can't hold a float
fn float_to_sql(v: f64, ty: &Type, out: &mut BytesMut) -> Option<Result<IsNull, BoxError>> {
    let integral = v.fract() == 0.0 && v.is_finite();
    let encoded = if *ty == Type::FLOAT4 {
        (v as f32).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        v.to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        float_to_numeric(v, out)
    } else if integral && [Type::INT2, Type::INT4, Type::INT8, Type::BOOL].contains(ty) {
        if v < i64::MIN as f64 || v >= i64::MAX as f64 {
            Err(format!("{} is out of range for {}", v, ty).into())
        } else {
            integer_to_sql(v as i64, ty, out)?
        }
    } else if is_text(ty) {
        Value::Float(v).to_field().into_owned().to_sql(ty, out)
    } else {
        return None;
    };
    Some(encoded)
}

fn float_to_numeric(v: f64, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if !v.is_finite() {
        return Err(format!("{} cannot be stored as numeric", v).into());
    }
    // Display never uses exponent notation for f64
    let rendered = v.abs().to_string();
    let (integer, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    numeric_to_sql(v < 0.0, integer, fraction, out)
}

/// Write a decimal in the binary NUMERIC layout
///
/// `integer` and `fraction` are the ASCII digits either side of the point.
/// The layout is four i16 header words (ndigits, weight, sign, dscale)
/// followed by base-10000 digits, most significant first.
fn numeric_to_sql(
    negative: bool,
    integer: &str,
    fraction: &str,
    out: &mut BytesMut,
) -> Result<IsNull, BoxError> {
    let pad = |len: usize| (4 - len % 4) % 4;
    let integer_pad = pad(integer.len());
    let padded: Vec<u8> = std::iter::repeat_n(b'0', integer_pad)
        .chain(integer.bytes())
        .chain(fraction.bytes())
        .chain(std::iter::repeat_n(b'0', pad(fraction.len())))
        .collect();

    let mut digits: Vec<i16> = padded
        .chunks(4)
        .map(|group| group.iter().fold(0i16, |acc, &d| acc * 10 + (d - b'0') as i16))
        .collect();
    let mut weight = i16::try_from((integer.len() + integer_pad) / 4)? - 1;

    let leading = digits.iter().take_while(|&&d| d == 0).count();
    digits.drain(..leading);
    weight -= i16::try_from(leading)?;
    while digits.last() == Some(&0) {
        digits.pop();
    }

    let sign = if negative && !digits.is_empty() {
        NUMERIC_NEG
    } else {
        NUMERIC_POS
    };
    if digits.is_empty() {
        weight = 0;
    }

    out.put_i16(i16::try_from(digits.len())?);
    out.put_i16(weight);
    out.put_i16(sign);
    out.put_i16(i16::try_from(fraction.len())?);
    for digit in digits {
        out.put_i16(digit);
    }
    Ok(IsNull::No)
}
