//! Testing Utilities
//!
//! An in-process `Dialer` whose peers are driven by the test, plus builders
//! for raw transactions. Available with the `test-utils` feature flag.

use crate::adapters::framing::{read_message, write_message};
use crate::domain::wire::{
    build_inventory_payload, build_version_payload, parse_inventory, Command, InvVector,
    WireMessage, MSG_TX,
};
use crate::domain::{Chain, PeerNetworkError, Transaction, WireError};
use crate::ports::{BoxedPeerStream, Dialer};
use async_trait::async_trait;
use p2fk_01_codec::{decode_address_payload, CarrierOutput};
use shared_types::TxId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{duplex, DuplexStream};
use tokio::sync::mpsc;

/// Compressed secp256k1 generator point; signs every built transaction.
pub const SIGNER_PUBKEY: [u8; 33] = [
    0x02, 0x79, 0xbe, 0x66, 0x7e, 0xf9, 0xdc, 0xbb, 0xac, 0x55, 0xa0, 0x62, 0x95, 0xce, 0x87, 0x0b,
    0x07, 0x02, 0x9b, 0xfc, 0xdb, 0x2d, 0xce, 0x28, 0xd9, 0x59, 0xf2, 0x81, 0x5b, 0x16, 0xf8, 0x17,
    0x98,
];

const STREAM_BUFFER: usize = 256 * 1024;

/// P2PKH script paying to a 20-byte hash.
#[must_use]
pub fn p2pkh_script(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = vec![0x76, 0xa9, 0x14];
    script.extend_from_slice(hash);
    script.extend_from_slice(&[0x88, 0xac]);
    script
}

/// Legacy transaction with one input signed by `SIGNER_PUBKEY`.
#[must_use]
pub fn raw_transaction(outputs: &[(u64, Vec<u8>)]) -> Vec<u8> {
    use crate::domain::wire::ByteWriter;

    let mut script_sig = vec![0x47];
    script_sig.extend_from_slice(&[0x30; 0x47]);
    script_sig.push(33);
    script_sig.extend_from_slice(&SIGNER_PUBKEY);

    let mut w = ByteWriter::new();
    w.i32(2)
        .varint(1)
        .bytes(&[0xab; 32])
        .u32(0)
        .var_bytes(&script_sig)
        .u32(0xffff_fffe);
    w.varint(outputs.len() as u64);
    for (value, script) in outputs {
        w.u64(*value).var_bytes(script);
    }
    w.u32(0);
    w.finish()
}

/// Raw transaction paying `sats` to each encoder output, in order.
///
/// # Panics
///
/// If an output address does not decode to a 20-byte payload.
#[must_use]
pub fn raw_carrier_transaction(outputs: &[CarrierOutput], sats: u64) -> Vec<u8> {
    let scripts: Vec<(u64, Vec<u8>)> = outputs
        .iter()
        .map(|out| {
            let payload = decode_address_payload(&out.address).expect("carrier address");
            let hash: [u8; 20] = payload.as_slice().try_into().expect("20-byte payload");
            (sats, p2pkh_script(&hash))
        })
        .collect();
    raw_transaction(&scripts)
}

/// Id of a raw transaction.
///
/// # Panics
///
/// If the bytes do not parse.
#[must_use]
pub fn txid_of(raw: &[u8]) -> TxId {
    Transaction::parse(raw).expect("valid transaction").txid
}

/// The far end of a dialed connection.
#[derive(Debug)]
pub struct RemotePeer {
    /// Address the client dialed.
    pub addr: String,
    stream: DuplexStream,
    magic: [u8; 4],
}

impl RemotePeer {
    /// Answer the client's handshake.
    ///
    /// # Errors
    ///
    /// Stream failure.
    pub async fn accept_handshake(&mut self) -> Result<(), WireError> {
        self.expect(Command::Version).await?;
        let version = build_version_payload(7, 0, true);
        self.send(WireMessage::new(Command::Version, version)).await?;
        self.send(WireMessage::empty(Command::Verack)).await?;
        self.expect(Command::Verack).await?;
        Ok(())
    }

    /// Next message from the client.
    ///
    /// # Errors
    ///
    /// Stream failure.
    pub async fn recv(&mut self) -> Result<WireMessage, WireError> {
        read_message(&mut self.stream, self.magic).await
    }

    /// Skip messages until one with `command` arrives.
    ///
    /// # Errors
    ///
    /// Stream failure.
    pub async fn expect(&mut self, command: Command) -> Result<WireMessage, WireError> {
        loop {
            let message = self.recv().await?;
            if message.command == command {
                return Ok(message);
            }
        }
    }

    /// Send a message to the client.
    ///
    /// # Errors
    ///
    /// Stream failure.
    pub async fn send(&mut self, message: WireMessage) -> Result<(), WireError> {
        write_message(&mut self.stream, self.magic, &message).await
    }

    /// Announce transaction ids.
    ///
    /// # Errors
    ///
    /// Stream failure.
    pub async fn announce(&mut self, ids: &[TxId]) -> Result<(), WireError> {
        let items: Vec<InvVector> = ids
            .iter()
            .map(|id| InvVector {
                kind: MSG_TX,
                hash: *id.as_bytes(),
            })
            .collect();
        self.send(WireMessage::new(Command::Inv, build_inventory_payload(&items)))
            .await
    }

    /// Wait for a `getdata` and answer with whichever of `raws` it asks for.
    /// Returns the requested ids.
    ///
    /// # Errors
    ///
    /// Stream failure or malformed `getdata`.
    pub async fn serve_getdata(&mut self, raws: &[Vec<u8>]) -> Result<Vec<TxId>, WireError> {
        let request = self.expect(Command::GetData).await?;
        let requested: Vec<TxId> = parse_inventory(&request.payload)?
            .into_iter()
            .map(|item| TxId::from_bytes(item.hash))
            .collect();
        for raw in raws {
            if let Ok(tx) = Transaction::parse(raw) {
                if requested.contains(&tx.txid) {
                    self.send(WireMessage::new(Command::Tx, raw.clone())).await?;
                }
            }
        }
        Ok(requested)
    }
}

/// Dialer that hands the remote end of every connection to the test.
#[derive(Debug, Clone)]
pub struct ScriptedDialer {
    magic: [u8; 4],
    online: Arc<AtomicBool>,
    dials: Arc<AtomicUsize>,
    accepted: mpsc::UnboundedSender<RemotePeer>,
}

impl ScriptedDialer {
    /// Make dials succeed or fail.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Dial attempts so far, failed ones included.
    #[must_use]
    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

/// A dialer for `chain` and the receiver of its remote peers.
#[must_use]
pub fn scripted_network(chain: Chain) -> (ScriptedDialer, mpsc::UnboundedReceiver<RemotePeer>) {
    let (accepted, remotes) = mpsc::unbounded_channel();
    let dialer = ScriptedDialer {
        magic: chain.params().magic,
        online: Arc::new(AtomicBool::new(true)),
        dials: Arc::new(AtomicUsize::new(0)),
        accepted,
    };
    (dialer, remotes)
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn resolve(&self, seed: &str) -> Result<Vec<String>, PeerNetworkError> {
        Ok(vec![seed.to_string()])
    }

    async fn dial(&self, addr: &str) -> Result<BoxedPeerStream, PeerNetworkError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        if !self.online.load(Ordering::SeqCst) {
            return Err(PeerNetworkError::ConnectFailed {
                addr: addr.to_string(),
                reason: "offline".into(),
            });
        }
        let (local, remote) = duplex(STREAM_BUFFER);
        self.accepted
            .send(RemotePeer {
                addr: addr.to_string(),
                stream: remote,
                magic: self.magic,
            })
            .map_err(|_| PeerNetworkError::ConnectFailed {
                addr: addr.to_string(),
                reason: "test harness gone".into(),
            })?;
        Ok(Box::new(local))
    }
}
