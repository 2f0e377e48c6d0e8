//! # Address Payload Decoder
//!
//! Base-58 with a four byte double-SHA-256 checksum, as used by legacy
//! Bitcoin addresses. The first decoded byte is the address version; the
//! bytes between it and the checksum are the payload a P2FK sender chose.

use super::errors::AddressError;
use sha2::{Digest, Sha256};

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const CHECKSUM_LEN: usize = 4;

/// Double SHA-256.
#[must_use]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

fn alphabet_index(byte: u8) -> Option<u8> {
    ALPHABET.iter().position(|c| *c == byte).map(|i| i as u8)
}

/// Decode plain base-58 text (no checksum handling).
///
/// # Errors
///
/// `AddressError::InvalidCharacter` for characters outside the alphabet.
pub fn base58_decode(text: &str) -> Result<Vec<u8>, AddressError> {
    // Big-endian base-256 accumulator
    let mut bytes: Vec<u8> = Vec::with_capacity(text.len());
    for (position, ch) in text.chars().enumerate() {
        let digit = u8::try_from(ch)
            .ok()
            .and_then(alphabet_index)
            .ok_or(AddressError::InvalidCharacter {
                character: ch,
                position,
            })?;

        let mut carry = u32::from(digit);
        for byte in bytes.iter_mut().rev() {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.insert(0, (carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let leading_zeros = text.bytes().take_while(|b| *b == b'1').count();
    let mut out = vec![0u8; leading_zeros];
    out.extend(bytes);
    Ok(out)
}

/// Encode bytes as plain base-58 text.
#[must_use]
pub fn base58_encode(data: &[u8]) -> String {
    let leading_zeros = data.iter().take_while(|b| **b == 0).count();

    // Little-endian base-58 digits
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 138 / 100 + 1);
    for byte in &data[leading_zeros..] {
        let mut carry = u32::from(*byte);
        for digit in &mut digits {
            carry += u32::from(*digit) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut text = String::with_capacity(leading_zeros + digits.len());
    text.extend(std::iter::repeat('1').take(leading_zeros));
    text.extend(digits.iter().rev().map(|d| ALPHABET[*d as usize] as char));
    text
}

/// Decode base58check text into `version || payload`, verifying the checksum.
///
/// # Errors
///
/// Invalid alphabet, input shorter than the checksum, or checksum mismatch.
pub fn base58check_decode(text: &str) -> Result<Vec<u8>, AddressError> {
    let mut raw = base58_decode(text)?;
    if raw.len() < CHECKSUM_LEN {
        return Err(AddressError::TooShort(raw.len()));
    }
    let body_len = raw.len() - CHECKSUM_LEN;
    let expected = double_sha256(&raw[..body_len]);
    if raw[body_len..] != expected[..CHECKSUM_LEN] {
        return Err(AddressError::ChecksumMismatch);
    }
    raw.truncate(body_len);
    Ok(raw)
}

/// Encode `version || payload` as base58check text.
#[must_use]
pub fn encode_address_payload(version: u8, payload: &[u8]) -> String {
    let mut body = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    body.push(version);
    body.extend_from_slice(payload);
    let checksum = double_sha256(&body);
    body.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    base58_encode(&body)
}

/// Recover the payload hidden in an address.
///
/// The version byte is dropped. At least one payload byte must follow it.
///
/// # Errors
///
/// Any base58check failure, or `AddressError::PayloadTooShort` when the
/// decoded body is only a version byte.
pub fn decode_address_payload(address: &str) -> Result<Vec<u8>, AddressError> {
    let mut body = base58check_decode(address)?;
    if body.len() <= 1 {
        return Err(AddressError::PayloadTooShort(body.len()));
    }
    body.remove(0);
    Ok(body)
}
