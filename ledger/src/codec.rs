//! # Binary Codec
//!
//! The versioned binary encoding used for every record the ledger
//! persists. The layout is deliberately primitive — no framing, no
//! self-description — because the field order of each record type is a
//! fixed contract and the store directory's marker file carries the
//! format version out-of-band.
//!
//! ## Wire rules (format v3)
//!
//! | Value                  | Encoding                                  |
//! |------------------------|-------------------------------------------|
//! | fixed-width integer    | raw little-endian bytes, no prefix        |
//! | string                 | `u16` LE byte length, then raw UTF-8      |
//! | 32-byte digest         | raw bytes, no prefix                      |
//!
//! The `u16` length prefix means strings longer than 65,535 bytes are
//! not representable. [`Encoder::put_str`] fails with
//! [`EncodeError::StringTooLong`] rather than truncating — a truncated
//! string would silently change the bytes that get content-addressed.
//!
//! Decoding always checks the remaining input length before consuming
//! bytes, so a truncated record surfaces as
//! [`DecodeError::UnexpectedEof`] instead of a panic or garbage value.
//! Decode errors are "malformed input" errors, distinct from the I/O
//! errors of the store layer.

use thiserror::Error;

use crate::identity::ID_SIZE;

/// Current on-disk encoding version. Stamped into each store's marker
/// file (see [`crate::store::FORMAT_TAG`]); records themselves carry no
/// version byte.
pub const FORMAT_VERSION: u32 = 3;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while encoding a value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The string does not fit the `u16` length prefix.
    #[error("string of {len} bytes exceeds the encodable maximum of 65535")]
    StringTooLong {
        /// Byte length of the offending string.
        len: usize,
    },

    /// A sequence has more elements than its `u16` count field can hold.
    #[error("sequence of {len} elements exceeds the encodable maximum of 65535")]
    SequenceTooLong {
        /// Number of elements in the offending sequence.
        len: usize,
    },
}

/// Errors produced while decoding a byte stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ended before the value was complete.
    #[error("unexpected end of input: needed {needed} more bytes, {remaining} available")]
    UnexpectedEof {
        /// Bytes the decoder tried to consume.
        needed: usize,
        /// Bytes actually left in the input.
        remaining: usize,
    },

    /// A length-prefixed string did not contain valid UTF-8.
    #[error("string bytes are not valid UTF-8")]
    InvalidUtf8,
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Buffering encoder for format v3.
///
/// Values are appended to an in-memory buffer in call order; the caller
/// decides the field order, which for persisted records is a fixed
/// contract. Encode into memory first, then hand the finished buffer to
/// the store — this is what lets transaction hashing operate on exactly
/// the bytes that will be written.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

macro_rules! put_int {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Append a `", stringify!($ty), "` as raw little-endian bytes.")]
            pub fn $name(&mut self, value: $ty) {
                self.buf.extend_from_slice(&value.to_le_bytes());
            }
        )*
    };
}

impl Encoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    put_int! {
        put_u8: u8,
        put_i8: i8,
        put_u16: u16,
        put_i16: i16,
        put_u32: u32,
        put_i32: i32,
        put_u64: u64,
        put_i64: i64,
    }

    /// Append a 32-byte digest as raw bytes, no prefix.
    pub fn put_digest(&mut self, digest: &[u8; ID_SIZE]) {
        self.buf.extend_from_slice(digest);
    }

    /// Append raw bytes verbatim.
    ///
    /// Used for the historical account-ID digest layout, which
    /// concatenates string fields without length prefixes. Not suitable
    /// for values that must be decoded back — there is no way to find
    /// the end.
    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a length-prefixed string (`u16` LE length, then bytes).
    pub fn put_str(&mut self, s: &str) -> Result<(), EncodeError> {
        let len =
            u16::try_from(s.len()).map_err(|_| EncodeError::StringTooLong { len: s.len() })?;
        self.put_u16(len);
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Bytes encoded so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the encoder and return the finished buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Cursor-based decoder for format v3.
///
/// Borrows the full record bytes and consumes them front to back. Every
/// accessor validates the remaining length before touching the input.
#[derive(Debug)]
pub struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
}

macro_rules! get_int {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Decode a little-endian `", stringify!($ty), "`.")]
            pub fn $name(&mut self) -> Result<$ty, DecodeError> {
                let bytes = self.take(std::mem::size_of::<$ty>())?;
                Ok(<$ty>::from_le_bytes(bytes.try_into().expect("take returned exact length")))
            }
        )*
    };
}

impl<'a> Decoder<'a> {
    /// Create a decoder over the given input.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Consume exactly `n` bytes, or fail if the input is shorter.
    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.input.len() - self.pos;
        if n > remaining {
            return Err(DecodeError::UnexpectedEof { needed: n, remaining });
        }
        let bytes = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    get_int! {
        get_u8: u8,
        get_i8: i8,
        get_u16: u16,
        get_i16: i16,
        get_u32: u32,
        get_i32: i32,
        get_u64: u64,
        get_i64: i64,
    }

    /// Decode a 32-byte digest.
    pub fn get_digest(&mut self) -> Result<[u8; ID_SIZE], DecodeError> {
        let bytes = self.take(ID_SIZE)?;
        let mut digest = [0u8; ID_SIZE];
        digest.copy_from_slice(bytes);
        Ok(digest)
    }

    /// Decode a length-prefixed string.
    pub fn get_str(&mut self) -> Result<String, DecodeError> {
        let len = self.get_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Whether the whole input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
