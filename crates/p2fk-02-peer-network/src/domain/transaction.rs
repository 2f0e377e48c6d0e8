//! # Transactions
//!
//! Parsing of raw transactions (legacy and segregated-witness serialisation)
//! and the views the monitor needs: rendered output addresses, carrier
//! amounts, and the signer address.

use super::chain::ChainParams;
use super::errors::WireError;
use super::wire::ByteReader;
use p2fk_01_codec::{double_sha256, encode_address_payload, format_amount, CarrierOutput};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use shared_types::TxId;

/// Input of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    pub prev_txid: [u8; 32],
    pub prev_vout: u32,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    pub witness: Vec<Vec<u8>>,
}

impl TxIn {
    /// Coinbase inputs spend the null outpoint.
    #[must_use]
    pub fn is_coinbase(&self) -> bool {
        self.prev_txid == [0u8; 32] && self.prev_vout == u32::MAX
    }
}

/// Output of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

/// A parsed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub txid: TxId,
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
    /// Serialized size as received.
    pub size: usize,
}

impl Transaction {
    /// Parse a raw transaction. The whole buffer must be consumed.
    ///
    /// # Errors
    ///
    /// Truncated data, implausible counts or trailing bytes.
    pub fn parse(raw: &[u8]) -> Result<Self, WireError> {
        let mut r = ByteReader::new(raw);
        let version = r.i32("tx version")?;

        // Marker 0x00 + flag 0x01 announce witness data
        let segwit = r.peek(0) == Some(0x00) && r.peek(1) == Some(0x01);
        if segwit {
            r.take(2, "segwit marker")?;
        }
        let body_start = r.position();

        let input_count = r.count("input count", 41)?;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            inputs.push(TxIn {
                prev_txid: r.hash("prevout hash")?,
                prev_vout: r.u32("prevout index")?,
                script_sig: r.var_bytes("script sig")?.to_vec(),
                sequence: r.u32("sequence")?,
                witness: Vec::new(),
            });
        }

        let output_count = r.count("output count", 9)?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            outputs.push(TxOut {
                value: r.u64("output value")?,
                script_pubkey: r.var_bytes("script pubkey")?.to_vec(),
            });
        }
        let body_end = r.position();

        if segwit {
            for input in &mut inputs {
                let items = r.count("witness count", 1)?;
                for _ in 0..items {
                    input.witness.push(r.var_bytes("witness item")?.to_vec());
                }
            }
        }

        let lock_time = r.u32("lock time")?;
        if r.remaining() != 0 {
            return Err(WireError::TrailingBytes(r.remaining()));
        }

        // txid commits to the serialisation without marker, flag and witnesses
        let mut stripped = Vec::with_capacity(raw.len());
        stripped.extend_from_slice(&raw[..4]);
        stripped.extend_from_slice(&raw[body_start..body_end]);
        stripped.extend_from_slice(&lock_time.to_le_bytes());

        Ok(Self {
            txid: TxId::from_bytes(double_sha256(&stripped)),
            version,
            inputs,
            outputs,
            lock_time,
            size: raw.len(),
        })
    }

    /// Outputs with a base58 address, rendered for the codec.
    ///
    /// Outputs with script types that have no base58 address are left out.
    #[must_use]
    pub fn carrier_outputs(&self, params: &ChainParams) -> Vec<CarrierOutput> {
        self.outputs
            .iter()
            .filter_map(|out| {
                script_address(&out.script_pubkey, params)
                    .map(|address| CarrierOutput::new(address, format_amount(out.value)))
            })
            .collect()
    }

    /// P2PKH address of the key that signed the first input.
    ///
    /// Taken from the last push of the scriptSig, or the second witness
    /// item. `None` when neither holds a plausible public key.
    #[must_use]
    pub fn signer_address(&self, params: &ChainParams) -> Option<String> {
        let first = self.inputs.first()?;
        if first.is_coinbase() {
            return None;
        }
        let pubkey = match first.witness.as_slice() {
            [_, key] => Some(key.clone()),
            _ => last_push(&first.script_sig),
        }?;
        is_public_key(&pubkey)
            .then(|| encode_address_payload(params.p2pkh_version, &hash160(&pubkey)))
    }
}

/// RIPEMD-160 of SHA-256.
#[must_use]
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

fn is_public_key(bytes: &[u8]) -> bool {
    matches!(
        (bytes.len(), bytes.first()),
        (33, Some(0x02 | 0x03)) | (65, Some(0x04))
    )
}

/// Base58 address of a P2PKH or P2SH output script.
#[must_use]
pub fn script_address(script: &[u8], params: &ChainParams) -> Option<String> {
    match script {
        // OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
        [0x76, 0xa9, 0x14, hash @ .., 0x88, 0xac] if hash.len() == 20 => {
            Some(encode_address_payload(params.p2pkh_version, hash))
        }
        // OP_HASH160 <20> OP_EQUAL
        [0xa9, 0x14, hash @ .., 0x87] if hash.len() == 20 => {
            Some(encode_address_payload(params.p2sh_version, hash))
        }
        _ => None,
    }
}

/// The data of the last push opcode in a script.
fn last_push(script: &[u8]) -> Option<Vec<u8>> {
    let mut r = ByteReader::new(script);
    let mut last = None;
    while r.remaining() > 0 {
        let op = r.u8("opcode").ok()?;
        let len = match op {
            0x01..=0x4b => usize::from(op),
            0x4c => usize::from(r.u8("pushdata1").ok()?),
            0x4d => usize::from(r.u16("pushdata2").ok()?),
            0x4e => r.u32("pushdata4").ok()? as usize,
            _ => {
                last = None;
                continue;
            }
        };
        last = Some(r.take(len, "push data").ok()?.to_vec());
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::Chain;
    use crate::domain::wire::ByteWriter;
    use crate::testing::{p2pkh_script, raw_transaction as build_tx, SIGNER_PUBKEY as PUBKEY};

    fn build_segwit_tx() -> (Vec<u8>, Vec<u8>) {
        let out_script = p2pkh_script(&[9; 20]);
        let mut legacy = ByteWriter::new();
        legacy.i32(2).varint(1).bytes(&[0xcd; 32]).u32(1).var_bytes(&[]).u32(0xffff_ffff);
        legacy.varint(1).u64(5_500).var_bytes(&out_script).u32(0);
        let stripped = legacy.finish();

        let mut w = ByteWriter::new();
        w.i32(2).u8(0).u8(1).varint(1).bytes(&[0xcd; 32]).u32(1).var_bytes(&[]).u32(0xffff_ffff);
        w.varint(1).u64(5_500).var_bytes(&out_script);
        w.varint(2).var_bytes(&[0x30; 71]).var_bytes(&PUBKEY);
        w.u32(0);
        (w.finish(), stripped)
    }

    #[test]
    fn test_parse_legacy_transaction() {
        let raw = build_tx(&[(5_500, p2pkh_script(&[1; 20])), (90_000, vec![0x6a, 0x01, 0x00])]);
        let tx = Transaction::parse(&raw).unwrap();
        assert_eq!(tx.version, 2);
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.size, raw.len());
        assert_eq!(tx.txid, TxId::from_bytes(double_sha256(&raw)));
    }

    #[test]
    fn test_segwit_txid_ignores_witness() {
        let (raw, stripped) = build_segwit_tx();
        let tx = Transaction::parse(&raw).unwrap();
        assert_eq!(tx.txid, TxId::from_bytes(double_sha256(&stripped)));
        assert_eq!(tx.inputs[0].witness.len(), 2);
        assert_eq!(tx.size, raw.len());
    }

    #[test]
    fn test_truncated_and_trailing_rejected() {
        let raw = build_tx(&[(5_500, p2pkh_script(&[1; 20]))]);
        assert!(Transaction::parse(&raw[..raw.len() - 1]).is_err());
        let mut long = raw.clone();
        long.push(0);
        assert_eq!(Transaction::parse(&long), Err(WireError::TrailingBytes(1)));
    }

    #[test]
    fn test_carrier_outputs_render_addresses() {
        let params = Chain::Testnet.params();
        let raw = build_tx(&[(5_500, p2pkh_script(&[1; 20])), (90_000, vec![0x6a, 0x01, 0x00])]);
        let tx = Transaction::parse(&raw).unwrap();
        let outputs = tx.carrier_outputs(&params);
        // OP_RETURN output has no address
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].amount, "0.00005500");
        assert_eq!(outputs[0].address, encode_address_payload(0x6f, &[1; 20]));
    }

    #[test]
    fn test_p2sh_address() {
        let params = Chain::Mainnet.params();
        let mut script = vec![0xa9, 0x14];
        script.extend_from_slice(&[4; 20]);
        script.push(0x87);
        let address = script_address(&script, &params).unwrap();
        assert!(address.starts_with('3'));
    }

    #[test]
    fn test_signer_from_script_sig_and_witness() {
        let params = Chain::Testnet.params();
        let expected = encode_address_payload(0x6f, &hash160(&PUBKEY));

        let legacy = Transaction::parse(&build_tx(&[(1, p2pkh_script(&[0; 20]))])).unwrap();
        assert_eq!(legacy.signer_address(&params), Some(expected.clone()));

        let (raw, _) = build_segwit_tx();
        let segwit = Transaction::parse(&raw).unwrap();
        assert_eq!(segwit.signer_address(&params), Some(expected));
    }

    #[test]
    fn test_hash160_known_vector() {
        // HASH160 of the secp256k1 generator point (compressed)
        assert_eq!(
            hex::encode(hash160(&PUBKEY)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }
}
