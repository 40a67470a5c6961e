//! Canonical CBOR encoder
//!
//! Heads always use the shortest form, lengths are always definite and map
//! keys are emitted in canonical order. The output is the byte string the
//! hardware device hashes, so nothing here may depend on insertion order.

use super::value::{canonical_key_order, CborValue, TAG_NEGATIVE_BIGNUM, TAG_POSITIVE_BIGNUM};
use minicbor::data::{Int, Tag};
use minicbor::encode::{Error, Write};
use minicbor::Encoder;

/// Encode a value in canonical form
pub fn encode_canonical(value: &CborValue) -> Vec<u8> {
    let mut e = Encoder::new(Vec::new());
    write_value(&mut e, value).expect("encoding into a Vec should not fail");
    e.into_writer()
}

/// Write the canonical encoding of `value` through `e`
pub fn write_value<W: Write>(e: &mut Encoder<W>, value: &CborValue) -> Result<(), Error<W::Error>> {
    match value {
        CborValue::Int(n) => write_int(e, *n)?,
        CborValue::Bytes(bytes) => {
            e.bytes(bytes)?;
        }
        CborValue::Text(text) => {
            e.str(text)?;
        }
        CborValue::Array(items) => {
            e.array(items.len() as u64)?;
            for item in items {
                write_value(e, item)?;
            }
        }
        CborValue::Map(entries) => {
            let mut sorted: Vec<&(CborValue, CborValue)> = entries.iter().collect();
            sorted.sort_by(|(a, _), (b, _)| canonical_key_order(a, b));
            e.map(sorted.len() as u64)?;
            for (key, val) in sorted {
                write_value(e, key)?;
                write_value(e, val)?;
            }
        }
        CborValue::Tag(tag, inner) => {
            e.tag(Tag::new(*tag))?;
            write_value(e, inner)?;
        }
        CborValue::Bool(flag) => {
            e.bool(*flag)?;
        }
        CborValue::Null => {
            e.null()?;
        }
        CborValue::Undefined => {
            e.undefined()?;
        }
        CborValue::Simple(n) => {
            e.simple(*n)?;
        }
    }
    Ok(())
}

/// Integers in `[-2^64, 2^64 - 1]` use major types 0/1; everything else is
/// a tagged bignum with a minimal big-endian magnitude.
fn write_int<W: Write>(e: &mut Encoder<W>, n: i128) -> Result<(), Error<W::Error>> {
    if let Ok(int) = Int::try_from(n) {
        e.int(int)?;
        return Ok(());
    }

    // CBOR negative integers carry -1 - n
    let (tag, magnitude) = if n >= 0 {
        (TAG_POSITIVE_BIGNUM, n as u128)
    } else {
        (TAG_NEGATIVE_BIGNUM, (-1 - n) as u128)
    };
    let bytes = magnitude.to_be_bytes();
    let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    e.tag(Tag::new(tag))?.bytes(&bytes[leading_zeros..])?;
    Ok(())
}
