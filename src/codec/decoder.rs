//! CBOR decoder for untrusted input
//!
//! Built on `minicbor`'s pull decoder. Accepts any well-formed item
//! (including indefinite lengths and non-shortest heads) but rejects
//! floats, duplicate map keys, trailing bytes and excessive nesting.

use super::value::{
    canonical_key_order, CborValue, TAG_NEGATIVE_BIGNUM, TAG_POSITIVE_BIGNUM,
};
use super::CodecError;
use minicbor::data::Type;
use minicbor::Decoder;

/// Nesting limit for arrays, maps and tags
pub const MAX_DEPTH: usize = 128;

/// Decode exactly one CBOR item spanning the whole input
pub fn decode(bytes: &[u8]) -> Result<CborValue, CodecError> {
    let mut d = Decoder::new(bytes);
    let value = read_value(&mut d)?;
    let consumed = d.position();
    if consumed != bytes.len() {
        return Err(CodecError::TrailingBytes(bytes.len() - consumed));
    }
    Ok(value)
}

/// Read the next item from a decoder positioned inside a larger input
pub fn read_value(d: &mut Decoder<'_>) -> Result<CborValue, CodecError> {
    read_nested(d, 0)
}

fn read_nested(d: &mut Decoder<'_>, depth: usize) -> Result<CborValue, CodecError> {
    if depth > MAX_DEPTH {
        return Err(CodecError::NestingTooDeep);
    }

    match d.datatype()? {
        Type::Bool => Ok(CborValue::Bool(d.bool()?)),
        Type::Null => {
            d.null()?;
            Ok(CborValue::Null)
        }
        Type::Undefined => {
            d.undefined()?;
            Ok(CborValue::Undefined)
        }
        Type::Simple => Ok(CborValue::Simple(d.simple()?)),
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => Ok(CborValue::Int(i128::from(d.int()?))),
        Type::Bytes => Ok(CborValue::Bytes(d.bytes()?.to_vec())),
        Type::BytesIndef => {
            let mut out = Vec::new();
            for chunk in d.bytes_iter()? {
                out.extend_from_slice(chunk?);
            }
            Ok(CborValue::Bytes(out))
        }
        Type::String => Ok(CborValue::Text(d.str()?.to_string())),
        Type::StringIndef => {
            let mut out = String::new();
            for chunk in d.str_iter()? {
                out.push_str(chunk?);
            }
            Ok(CborValue::Text(out))
        }
        Type::Array | Type::ArrayIndef => {
            let len = d.array()?;
            let mut items = Vec::with_capacity(bounded_capacity(len, d));
            match len {
                Some(n) => {
                    for _ in 0..n {
                        items.push(read_nested(d, depth + 1)?);
                    }
                }
                None => {
                    while !at_break(d)? {
                        items.push(read_nested(d, depth + 1)?);
                    }
                }
            }
            Ok(CborValue::Array(items))
        }
        Type::Map | Type::MapIndef => {
            let len = d.map()?;
            let mut entries = Vec::with_capacity(bounded_capacity(len, d));
            match len {
                Some(n) => {
                    for _ in 0..n {
                        let key = read_nested(d, depth + 1)?;
                        let value = read_nested(d, depth + 1)?;
                        entries.push((key, value));
                    }
                }
                None => {
                    while !at_break(d)? {
                        let key = read_nested(d, depth + 1)?;
                        let value = read_nested(d, depth + 1)?;
                        entries.push((key, value));
                    }
                }
            }
            let map = CborValue::map(entries);
            if let CborValue::Map(sorted) = &map {
                let duplicated = sorted
                    .windows(2)
                    .any(|pair| canonical_key_order(&pair[0].0, &pair[1].0).is_eq());
                if duplicated {
                    return Err(CodecError::DuplicateMapKey);
                }
            }
            Ok(map)
        }
        Type::Tag => {
            let tag = d.tag()?.as_u64();
            let inner = read_nested(d, depth + 1)?;
            match (tag, inner) {
                (TAG_POSITIVE_BIGNUM, CborValue::Bytes(magnitude)) => {
                    let n = magnitude_to_i128(&magnitude)?;
                    Ok(CborValue::Int(n))
                }
                (TAG_NEGATIVE_BIGNUM, CborValue::Bytes(magnitude)) => {
                    let n = magnitude_to_i128(&magnitude)?;
                    Ok(CborValue::Int(-1 - n))
                }
                (TAG_POSITIVE_BIGNUM | TAG_NEGATIVE_BIGNUM, _) => {
                    Err(CodecError::Malformed("bignum tag must wrap a byte string".to_string()))
                }
                (tag, inner) => Ok(CborValue::tagged(tag, inner)),
            }
        }
        Type::F16 | Type::F32 | Type::F64 => {
            Err(CodecError::Unsupported("floating point values"))
        }
        Type::Break => Err(CodecError::Malformed("unexpected break".to_string())),
        Type::Unknown(byte) => Err(CodecError::Malformed(format!(
            "reserved initial byte 0x{:02x}",
            byte
        ))),
        #[allow(unreachable_patterns)]
        _ => Err(CodecError::Unsupported("unknown data item")),
    }
}

/// Consume a break marker if one is next
pub(crate) fn at_break(d: &mut Decoder<'_>) -> Result<bool, CodecError> {
    if d.datatype()? == Type::Break {
        d.set_position(d.position() + 1);
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Never pre-allocate more slots than there are bytes left to read
fn bounded_capacity(len: Option<u64>, d: &Decoder<'_>) -> usize {
    let remaining = d.input().len().saturating_sub(d.position());
    match len {
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX).min(remaining),
        None => 0,
    }
}

/// Big-endian magnitude into the i128 container; the result is non-negative
fn magnitude_to_i128(bytes: &[u8]) -> Result<i128, CodecError> {
    let start = bytes.iter().take_while(|&&b| b == 0).count();
    let significant = &bytes[start..];
    // 127 usable bits keeps both signs representable
    if significant.len() > 16 || (significant.len() == 16 && significant[0] & 0x80 != 0) {
        return Err(CodecError::IntegerOverflow);
    }
    let mut buf = [0u8; 16];
    buf[16 - significant.len()..].copy_from_slice(significant);
    Ok(i128::from_be_bytes(buf))
}
