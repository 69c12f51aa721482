//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use ascii::{AsciiStr, AsAsciiStrError};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::take,
    combinator::{map, map_opt, map_res, verify},
    error::ErrorKind,
    number::complete::{be_u8, be_u16, be_u32, be_u64, be_i64, be_f32, be_f64},
    sequence::tuple,
};

use std::convert::TryFrom;
use std::string::FromUtf16Error;

use crate::document::ObjectFormat;
use crate::de::parser::utils::{be_u128_n, be_usize_list};

/// Returns a parser which consumes a marker conforming to the specified format.
/// On success, the parser yields both the validated format and the encoded value.
/// This allows the function to be used to verify a marker byte is of the specified
/// format and to decode the value contained therein, if any.
fn marker(
    format: ObjectFormat
) -> impl Fn(&[u8]) -> IResult<&[u8], (ObjectFormat, u8)> {
    move |input: &[u8]| {
        map(
            verify(take(1usize), move |b: &[u8]| -> bool {
                format.matches(b[0])
            }),
            move |b: &[u8]| -> (ObjectFormat, u8) {
                (format, b[0] & format.value_mask())
            }
        )(input)
    }
}

/// Parses a marker byte and returns both the object format and encoded value.
pub fn any_marker(input: &[u8]) -> IResult<&[u8], (ObjectFormat, u8)> {
    map_opt(be_u8, ObjectFormat::from_marker)(input)
}

/// Parses the null singleton.
pub fn null(input: &[u8]) -> IResult<&[u8], ()> {
    map(
        marker(ObjectFormat::Null),
        |_| ()
    )(input)
}

/// Parses a boolean object with an encoded value bit.
pub fn boolean(input: &[u8]) -> IResult<&[u8], bool> {
    map(
        marker(ObjectFormat::Boolean),
        |(_, value)| value == 1
    )(input)
}

/// Parses a fill object, which is represented as a unit type.
pub fn fill(input: &[u8]) -> IResult<&[u8], ()> {
    map(
        marker(ObjectFormat::Fill),
        |_| ()
    )(input)
}

/// Parses an 8-bit unsigned integer object.
pub fn uint8(input: &[u8]) -> IResult<&[u8], u8> {
    map(
        tuple((
            marker(ObjectFormat::UInt8),
            be_u8,
        )),
        |(_, value)| value
    )(input)
}

/// Parses a 16-bit unsigned integer object.
pub fn uint16(input: &[u8]) -> IResult<&[u8], u16> {
    map(
        tuple((
            marker(ObjectFormat::UInt16),
            be_u16,
        )),
        |(_, value)| value
    )(input)
}

/// Parses a 32-bit unsigned integer object.
pub fn uint32(input: &[u8]) -> IResult<&[u8], u32> {
    map(
        tuple((
            marker(ObjectFormat::UInt32),
            be_u32,
        )),
        |(_, value)| value
    )(input)
}

/// Parses a 64-bit signed integer object.
pub fn sint64(input: &[u8]) -> IResult<&[u8], i64> {
    map(
        tuple((
            marker(ObjectFormat::SInt64),
            be_i64,
        )),
        |(_, value)| value
    )(input)
}

/// Parses a 128-bit signed integer object stored as two big-endian 64-bit words.
pub fn sint128(input: &[u8]) -> IResult<&[u8], i128> {
    map(
        tuple((
            marker(ObjectFormat::SInt128),
            be_u64,
            be_u64,
        )),
        |(_, high, low)| ((u128::from(high) << 64) | u128::from(low)) as i128
    )(input)
}

/// Parses an integer object of any width.
///
/// # Notes
///
/// 1. 1, 2 and 4-byte integers are unsigned.
/// 2. 8 and 16-byte integers are two's complement signed values.
pub fn integer(input: &[u8]) -> IResult<&[u8], i128> {
    alt((
        map(uint8, i128::from),
        map(uint16, i128::from),
        map(uint32, i128::from),
        map(sint64, i128::from),
        sint128,
    ))(input)
}

/// Parses a 32-bit single-precision floating point value.
pub fn float32(input: &[u8]) -> IResult<&[u8], f32> {
    map(
        tuple((
            marker(ObjectFormat::Float32),
            be_f32,
        )),
        |(_, value)| value
    )(input)
}

/// Parses a 64-bit double-precision floating point value.
pub fn float64(input: &[u8]) -> IResult<&[u8], f64> {
    map(
        tuple((
            marker(ObjectFormat::Float64),
            be_f64,
        )),
        |(_, value)| value
    )(input)
}

/// Parses a floating point value of either precision, widened to 64 bits.
pub fn real(input: &[u8]) -> IResult<&[u8], f64> {
    alt((
        map(float32, f64::from),
        float64,
    ))(input)
}

/// Parses a 64-bit double-precision CFTimeInterval date value.
pub fn date(input: &[u8]) -> IResult<&[u8], f64> {
    map(
        tuple((
            marker(ObjectFormat::Date),
            be_f64,
        )),
        |(_, value)| value
    )(input)
}

/// Returns a parser for the length of an object payload.
/// The parameter is the value encoded in the marker byte to which the payload corresponds.
/// If the encoded value is:
///   0b0000_0000 ..= 0b0000_1110:
///     No additional input is consumed and the encoded value represents directly
///     the payload count value.
///   0b0000_1111:
///     An integer object of any width follows.
///     This object is consumed, checked to be a valid count, and returned.
fn payload_count(
    encoded_value: u8,
) -> impl Fn(&[u8]) -> IResult<&[u8], usize> {
    assert!((encoded_value & 0b1111_0000) == 0, "encoded length must be a 4-bit value");
    move |input: &[u8]| {
        if encoded_value == 0b0000_1111 {
            map_res(
                integer,
                |value| usize::try_from(value)
            )(input)
        } else {
            Ok((input, encoded_value as usize))
        }
    }
}

/// Multiplies a payload count by the width of its elements without overflowing.
fn payload_length(input: &[u8], count: usize, width: usize) -> IResult<&[u8], usize> {
    match count.checked_mul(width) {
        Some(length) => Ok((input, length)),
        None => Err(nom::Err::Error((input, ErrorKind::TooLarge))),
    }
}

/// Parses a variable-length data object and returns the corresponding slice of the input.
pub fn data(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::Data)(input)?;
    let (input, data_length) = payload_count(encoded_value)(input)?;
    take(data_length)(input)
}

/// Parses a variable-length ASCII string object and returns a corresponding borrowed string slice.
///
/// # Notes
///
/// 1. Validates that the data contained in the object is an ASCII string.
/// 2. This is a zero-copy operation.
pub fn ascii_string(input: &[u8]) -> IResult<&[u8], &str> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::AsciiString)(input)?;
    let (input, char_count) = payload_count(encoded_value)(input)?;
    map_res(
        take(char_count),
        |bytes| -> Result<&str, AsAsciiStrError> {
            AsciiStr::from_ascii(bytes).map(|value| value.as_str())
        }
    )(input)
}

/// Parses a variable-length UTF-16 string object and returns an owned string.
/// The count in the marker is the number of 16-bit code units.
///
/// # Notes
///
/// 1. Validates that the data contained in the object is valid UTF-16.
/// 2. This is not a zero-copy operation.
pub fn utf16_string(input: &[u8]) -> IResult<&[u8], String> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::Utf16String)(input)?;
    let (input, unit_count) = payload_count(encoded_value)(input)?;
    let (input, byte_count) = payload_length(input, unit_count, 2)?;
    map_res(
        take(byte_count),
        |bytes: &[u8]| -> Result<String, FromUtf16Error> {
            let code_units = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect::<Vec<u16>>();
            String::from_utf16(&code_units)
        }
    )(input)
}

/// Parses a variable-length UTF-8 string object and returns a borrowed string slice.
/// The count in the marker is the number of bytes.
pub fn utf8_string(input: &[u8]) -> IResult<&[u8], &str> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::Utf8String)(input)?;
    let (input, byte_count) = payload_count(encoded_value)(input)?;
    map_res(
        take(byte_count),
        std::str::from_utf8
    )(input)
}

/// Parses a string object in any of the supported encodings.
pub fn any_string(input: &[u8]) -> IResult<&[u8], String> {
    alt((
        map(ascii_string, String::from),
        utf16_string,
        map(utf8_string, String::from),
    ))(input)
}

/// Parses a UID object, whose value is always unsigned.
/// The value encoded in the marker is one less than the number of bytes which follow.
pub fn uid(input: &[u8]) -> IResult<&[u8], u128> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::Uid)(input)?;
    be_u128_n(encoded_value as usize + 1)(input)
}

/// Parses a URL object and its inline string.
/// The value returned is whether the URL carries a scheme, and the URL text.
pub fn url(input: &[u8]) -> IResult<&[u8], (bool, String)> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::Url)(input)?;
    map(
        any_string,
        move |text| (encoded_value == 1, text)
    )(input)
}

/// Parses a 16-byte UUID object.
pub fn uuid(input: &[u8]) -> IResult<&[u8], [u8; 16]> {
    let (input, _) = marker(ObjectFormat::Uuid)(input)?;
    map_res(
        take(16usize),
        |bytes: &[u8]| <[u8; 16]>::try_from(bytes)
    )(input)
}

/// Returns a parser for a collection of the given format holding a list of
/// object references of the specified width.
fn references(
    format: ObjectFormat,
    object_reference_size: usize,
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    assert!(object_reference_size >= 1 && object_reference_size <= 8, "object references must be 1 to 8 bytes long");
    move |input: &[u8]| {
        let (input, (_, encoded_value)) = marker(format)(input)?;
        let (input, length) = payload_count(encoded_value)(input)?;
        be_usize_list(length, object_reference_size)(input)
    }
}

/// Returns a parser for an array with the specified-width object references.
///
/// The value returned by the parser is a list of value object references.
pub fn array(
    object_reference_size: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    references(ObjectFormat::Array, object_reference_size)
}

/// Returns a parser for an ordered set with the specified-width object references.
pub fn ordered_set(
    object_reference_size: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    references(ObjectFormat::OrderedSet, object_reference_size)
}

/// Returns a parser for a set with the specified-width object references.
pub fn set(
    object_reference_size: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    references(ObjectFormat::Set, object_reference_size)
}

/// Returns a parser for a dictionary with the specified-width key and value references.
///
/// The value returned by the parser is a list of matched key and value object references.
/// In each tuple, the key is first and the value is second.
pub fn dictionary(
    object_reference_size: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<(usize, usize)>> {
    assert!(object_reference_size >= 1 && object_reference_size <= 8, "object references must be 1 to 8 bytes long");
    move |input: &[u8]| {
        let (input, (_, encoded_value)) = marker(ObjectFormat::Dictionary)(input)?;
        let (input, entry_count) = payload_count(encoded_value)(input)?;

        // All key references precede all value references.
        let (input, keys) = be_usize_list(entry_count, object_reference_size)(input)?;
        let (input, values) = be_usize_list(entry_count, object_reference_size)(input)?;
        Ok((input, keys.into_iter().zip(values).collect()))
    }
}
