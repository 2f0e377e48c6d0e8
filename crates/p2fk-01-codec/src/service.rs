//! # Codec Service
//!
//! Ties the address decoder and the frame parser together:
//!
//! ```text
//! outputs ──filter carrier amounts──→ addresses ──base58check──→ payloads
//!                                                                  │ concat
//!                                                                  ↓
//!                                          DecodedRecord ←── FrameParser
//! ```

use crate::domain::{
    decode_address_payload, is_carrier_amount, CarrierOutput, DecodedRecord, FrameParser,
};
use crate::ports::{CarrierTransaction, RecordDecoder};
use chrono::Utc;
use tracing::{debug, trace};

/// Concatenate the payloads of every carrier output, in output order.
///
/// Outputs with a non-carrier amount or an undecodable address are skipped.
#[must_use]
pub fn collect_carrier_payload(outputs: &[CarrierOutput]) -> Vec<u8> {
    let mut buffer = Vec::new();
    for output in outputs.iter().filter(|o| is_carrier_amount(&o.amount)) {
        match decode_address_payload(&output.address) {
            Ok(payload) => buffer.extend_from_slice(&payload),
            Err(e) => trace!(address = %output.address, error = %e, "Skipping carrier output"),
        }
    }
    buffer
}

/// Stateless P2FK codec.
#[derive(Debug, Clone, Default)]
pub struct P2fkCodec {
    parser: FrameParser,
}

impl P2fkCodec {
    /// Create a codec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordDecoder for P2fkCodec {
    fn decode(&self, tx: &CarrierTransaction) -> Option<DecodedRecord> {
        let payload = collect_carrier_payload(&tx.outputs);
        if payload.is_empty() {
            return None;
        }

        let frames = self.parser.parse(&payload)?;
        debug!(
            tx_id = %tx.tx_id,
            messages = frames.messages.len(),
            files = frames.files.len(),
            "[p2fk-01] Decoded P2FK record"
        );

        Some(DecodedRecord {
            tx_id: tx.tx_id,
            messages: frames.messages,
            files: frames.files,
            signed_by: tx.signed_by.clone(),
            outputs: tx.outputs.clone(),
            block: tx.block.clone(),
            total_byte_size: tx.total_byte_size,
            built_at: Utc::now(),
        })
    }
}
