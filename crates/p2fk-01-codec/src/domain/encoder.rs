//! # P2FK Encoder
//!
//! Builds carrier outputs that the frame parser will decode back into the
//! queued messages and file stubs. Used by tooling and tests; the monitor
//! only ever decodes.

use super::base58::encode_address_payload;
use super::carrier::{format_amount, is_carrier_sats, DEFAULT_CARRIER_SATS};
use super::errors::EncodeError;
use super::frames::{is_file_name, FRAME_CHARS};
use super::record::CarrierOutput;

/// Payload bytes per address (the size of a HASH160).
pub const ADDRESS_PAYLOAD_LEN: usize = 20;

/// Testnet P2PKH version byte.
pub const TESTNET_P2PKH_VERSION: u8 = 0x6f;

/// Accumulates frames and splits them into carrier outputs.
#[derive(Debug, Clone)]
pub struct P2fkEncoder {
    version: u8,
    amount_sats: u64,
    stream: Vec<u8>,
}

impl Default for P2fkEncoder {
    fn default() -> Self {
        Self {
            version: TESTNET_P2PKH_VERSION,
            amount_sats: DEFAULT_CARRIER_SATS,
            stream: Vec::new(),
        }
    }
}

impl P2fkEncoder {
    /// Encoder with the testnet P2PKH version and the default carrier amount.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different address version byte.
    #[must_use]
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Use a different carrier amount.
    ///
    /// # Errors
    ///
    /// `EncodeError::NotCarrierAmount` if the amount is not on the allow-list.
    pub fn with_amount(mut self, sats: u64) -> Result<Self, EncodeError> {
        if !is_carrier_sats(sats) {
            return Err(EncodeError::NotCarrierAmount(format_amount(sats)));
        }
        self.amount_sats = sats;
        Ok(self)
    }

    /// Queue a text message frame.
    ///
    /// # Errors
    ///
    /// `EncodeError::MessageTooShort` for messages under two bytes.
    pub fn message(&mut self, text: &str) -> Result<&mut Self, EncodeError> {
        if text.len() < 2 {
            return Err(EncodeError::MessageTooShort(text.len()));
        }
        self.push_frame("", text.as_bytes());
        Ok(self)
    }

    /// Queue a file frame carrying `content`.
    ///
    /// # Errors
    ///
    /// The name must pass the decoder's filename rule and contain no
    /// framing characters.
    pub fn file(&mut self, name: &str, content: &[u8]) -> Result<&mut Self, EncodeError> {
        if name.bytes().any(|b| FRAME_CHARS.contains(&b) || b >= 0x80) {
            return Err(EncodeError::ReservedCharacter(name.to_string()));
        }
        if !is_file_name(name) {
            return Err(EncodeError::InvalidFileName(name.to_string()));
        }
        self.push_frame(name, content);
        Ok(self)
    }

    fn push_frame(&mut self, header: &str, body: &[u8]) {
        self.stream.extend_from_slice(header.as_bytes());
        self.stream
            .extend_from_slice(format!("\\{}\\", body.len()).as_bytes());
        self.stream.extend_from_slice(body);
    }

    /// The raw frame stream queued so far.
    #[must_use]
    pub fn stream(&self) -> &[u8] {
        &self.stream
    }

    /// Split the stream into zero-padded address payloads and render them
    /// as carrier outputs, in order.
    ///
    /// # Errors
    ///
    /// `EncodeError::Empty` if nothing was queued.
    pub fn build(&self) -> Result<Vec<CarrierOutput>, EncodeError> {
        if self.stream.is_empty() {
            return Err(EncodeError::Empty);
        }
        let amount = format_amount(self.amount_sats);
        Ok(self
            .stream
            .chunks(ADDRESS_PAYLOAD_LEN)
            .map(|chunk| {
                let mut payload = [0u8; ADDRESS_PAYLOAD_LEN];
                payload[..chunk.len()].copy_from_slice(chunk);
                CarrierOutput::new(encode_address_payload(self.version, &payload), &amount)
            })
            .collect())
    }
}
