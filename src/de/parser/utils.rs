//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use nom::{
    IResult,
    combinator::map_res,
    bytes::complete::take,
    error::ErrorKind,
    multi::many_m_n,
};

use std::convert::TryFrom;

/// Returns a parser which recognizes a variable-length unsigned big-endian number
/// between 1 and 16 bytes long, inclusive.
pub fn be_u128_n(
    n: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], u128> {
    assert!(n >= 1 && n <= 16, "number must be between 1 and 16 bytes, inclusive");
    move |input: &[u8]| {
        let (input, bytes) = take(n)(input)?;
        let value = bytes.iter().fold(0u128, |acc, x| {
            (acc << 8) | u128::from(*x)
        });
        Ok((input, value))
    }
}

/// Returns a parser which recognizes a variable-length big-endian number
/// between 1 and 8 bytes long, inclusive.
///
/// # Notes
///
/// 1. A valid result will be returned for unsigned values between 1 and 8 bytes.
/// 2. A valid result will be returned for a signed value of exactly 8 bytes.
pub fn be_u64_n(
    n: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], u64> {
    assert!(n >= 1 && n <= 8, "number must be between 1 and 8 bytes, inclusive");
    move |input: &[u8]| {
        let (input, bytes) = take(n)(input)?;
        let value = bytes.iter().fold(0u64, |acc, x| {
            (acc << 8) + *x as u64
        });
        Ok((input, value))
    }
}

/// Returns a parser which recognizes a variable-length unsigned big-endian number
/// between 1 and 8 bytes long, inclusive. This value is then converted safely
/// into a usize, which varies based on the pointer size of the platform.
///
/// # Notes
///
/// 1. n may be up to 8 even on platforms with smaller word sizes.
/// 2. The value is checked to confirm it is in range before it is cast to usize.
pub fn be_usize_n(
    n: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], usize> {
    move |input: &[u8]| {
        map_res(
            be_u64_n(n),
            |value| usize::try_from(value)
        )(input)
    }
}

/// Returns a parser for `count` consecutive `size`-byte unsigned big-endian numbers.
///
/// # Notes
///
/// 1. The input length is checked before anything is allocated, as the count
///    is read from the document and cannot be trusted.
pub fn be_usize_list(
    count: usize,
    size: usize,
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    move |input: &[u8]| {
        let fits = count
            .checked_mul(size)
            .map_or(false, |length| length <= input.len());
        if !fits {
            return Err(nom::Err::Error((input, ErrorKind::Eof)));
        }
        many_m_n(count, count, be_usize_n(size))(input)
    }
}

#[cfg(test)]
mod tests {
    use super::{be_u128_n, be_u64_n, be_usize_list, be_usize_n};

    #[test]
    fn test_be_usize_n_length_1() {
        let (input, result) = be_usize_n(1)(&[0x05]).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, 5);
    }

    #[test]
    fn test_be_usize_n_length_3() {
        let (input, result) = be_usize_n(3)(&[0x00, 0x01, 0xFF]).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, 511);
    }

    #[test]
    fn test_be_u64_n_length_8() {
        let (input, result) = be_u64_n(8)(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0xFF]).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, 72057594037928447);
    }

    #[test]
    fn test_be_u128_n_length_16() {
        let (input, result) = be_u128_n(16)(&[0xFF; 17]).unwrap();
        assert_eq!(input.len(), 1);
        assert_eq!(result, u128::MAX);
    }

    #[test]
    fn test_be_u64_n_truncated() {
        assert!(be_u64_n(4)(&[0x00, 0x01]).is_err());
    }

    #[test]
    fn test_be_usize_list() {
        let (input, result) = be_usize_list(2, 2)(&[0x00, 0x01, 0x01, 0x00, 0x07]).unwrap();
        assert_eq!(input, &[0x07]);
        assert_eq!(result, vec![1, 256]);
    }

    #[test]
    fn test_be_usize_list_rejects_oversized_count() {
        assert!(be_usize_list(usize::MAX, 1)(&[0x00, 0x01]).is_err());
        assert!(be_usize_list(usize::MAX / 2 + 1, 2)(&[0x00, 0x01]).is_err());
    }
}
