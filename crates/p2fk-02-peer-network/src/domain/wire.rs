//! # Bitcoin Wire Format
//!
//! Message framing and the handful of payloads the client speaks.
//!
//! ```text
//! +------------+--------------+---------------+-------------+
//! | magic (4)  | command (12) | length (4 LE) | checksum (4)|
//! +------------+--------------+---------------+-------------+
//! | payload (length bytes)                                  |
//! +---------------------------------------------------------+
//! ```
//!
//! The checksum is the first four bytes of `SHA256(SHA256(payload))`.

use super::errors::WireError;
use p2fk_01_codec::double_sha256;
use shared_types::TxId;

/// Header size in bytes.
pub const HEADER_LEN: usize = 24;

/// Largest payload accepted from a peer.
pub const MAX_PAYLOAD_SIZE: usize = 32 * 1024 * 1024;

/// Protocol version announced in `version`.
pub const PROTOCOL_VERSION: i32 = 70015;

/// User agent announced in `version`.
pub const USER_AGENT: &str = "/p2fk-node:0.1.0/";

/// Inventory type: transaction.
pub const MSG_TX: u32 = 1;

/// Inventory type: transaction with witness.
pub const MSG_WITNESS_TX: u32 = 0x4000_0001;

/// Commands the client understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Version,
    Verack,
    Ping,
    Pong,
    Mempool,
    Inv,
    GetData,
    Tx,
    NotFound,
    /// Anything else; ignored.
    Other(String),
}

impl Command {
    /// ASCII command name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Version => "version",
            Self::Verack => "verack",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Mempool => "mempool",
            Self::Inv => "inv",
            Self::GetData => "getdata",
            Self::Tx => "tx",
            Self::NotFound => "notfound",
            Self::Other(name) => name,
        }
    }

    /// Parse the NUL-padded 12-byte command field.
    #[must_use]
    pub fn from_field(field: &[u8]) -> Self {
        let name: String = field
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| char::from(*b))
            .collect();
        match name.as_str() {
            "version" => Self::Version,
            "verack" => Self::Verack,
            "ping" => Self::Ping,
            "pong" => Self::Pong,
            "mempool" => Self::Mempool,
            "inv" => Self::Inv,
            "getdata" => Self::GetData,
            "tx" => Self::Tx,
            "notfound" => Self::NotFound,
            _ => Self::Other(name),
        }
    }
}

/// A complete message ready to be framed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    /// Command.
    pub command: Command,
    /// Raw payload.
    pub payload: Vec<u8>,
}

impl WireMessage {
    /// Build a message.
    #[must_use]
    pub fn new(command: Command, payload: Vec<u8>) -> Self {
        Self { command, payload }
    }

    /// Payload-less message.
    #[must_use]
    pub fn empty(command: Command) -> Self {
        Self::new(command, Vec::new())
    }
}

/// Parsed message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub command: Command,
    pub length: usize,
    pub checksum: [u8; 4],
}

/// Frame a message for the wire.
///
/// # Errors
///
/// `WireError::CommandTooLong` for commands over 12 bytes.
pub fn encode_frame(magic: [u8; 4], message: &WireMessage) -> Result<Vec<u8>, WireError> {
    let name = message.command.as_str().as_bytes();
    if name.len() > 12 {
        return Err(WireError::CommandTooLong(message.command.as_str().to_string()));
    }
    let mut command = [0u8; 12];
    command[..name.len()].copy_from_slice(name);

    let mut frame = Vec::with_capacity(HEADER_LEN + message.payload.len());
    frame.extend_from_slice(&magic);
    frame.extend_from_slice(&command);
    frame.extend_from_slice(&(message.payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&double_sha256(&message.payload)[..4]);
    frame.extend_from_slice(&message.payload);
    Ok(frame)
}

/// Parse and validate a 24-byte header.
///
/// # Errors
///
/// Wrong magic or oversized payload.
pub fn decode_header(magic: [u8; 4], header: &[u8; HEADER_LEN]) -> Result<MessageHeader, WireError> {
    let mut got = [0u8; 4];
    got.copy_from_slice(&header[..4]);
    if got != magic {
        return Err(WireError::BadMagic(got));
    }
    let command = Command::from_field(&header[4..16]);
    let length = u32::from_le_bytes([header[16], header[17], header[18], header[19]]) as usize;
    if length > MAX_PAYLOAD_SIZE {
        return Err(WireError::PayloadTooLarge(length));
    }
    let mut checksum = [0u8; 4];
    checksum.copy_from_slice(&header[20..24]);
    Ok(MessageHeader {
        command,
        length,
        checksum,
    })
}

/// Verify a payload against its header checksum.
///
/// # Errors
///
/// `WireError::BadChecksum` on mismatch.
pub fn verify_payload(header: &MessageHeader, payload: &[u8]) -> Result<(), WireError> {
    if double_sha256(payload)[..4] != header.checksum {
        return Err(WireError::BadChecksum {
            command: header.command.as_str().to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// PRIMITIVE ENCODING
// =============================================================================

/// Little-endian byte writer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16_be(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(v);
        self
    }

    /// CompactSize integer.
    pub fn varint(&mut self, v: u64) -> &mut Self {
        match v {
            0..=0xfc => self.u8(v as u8),
            0xfd..=0xffff => self.u8(0xfd).bytes(&(v as u16).to_le_bytes()),
            0x1_0000..=0xffff_ffff => self.u8(0xfe).u32(v as u32),
            _ => self.u8(0xff).u64(v),
        }
    }

    /// Length-prefixed bytes.
    pub fn var_bytes(&mut self, v: &[u8]) -> &mut Self {
        self.varint(v.len() as u64).bytes(v)
    }

    #[must_use]
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Little-endian byte reader over a borrowed slice.
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Look at the next byte without consuming it.
    #[must_use]
    pub fn peek(&self, ahead: usize) -> Option<u8> {
        self.data.get(self.pos + ahead).copied()
    }

    pub fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::UnexpectedEof { field });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8, WireError> {
        Ok(self.take(1, field)?[0])
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16, WireError> {
        Ok(u16::from_le_bytes(self.array(field)?))
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32, WireError> {
        Ok(u32::from_le_bytes(self.array(field)?))
    }

    pub fn i32(&mut self, field: &'static str) -> Result<i32, WireError> {
        Ok(i32::from_le_bytes(self.array(field)?))
    }

    pub fn u64(&mut self, field: &'static str) -> Result<u64, WireError> {
        Ok(u64::from_le_bytes(self.array(field)?))
    }

    pub fn hash(&mut self, field: &'static str) -> Result<[u8; 32], WireError> {
        self.array(field)
    }

    /// CompactSize integer.
    pub fn varint(&mut self, field: &'static str) -> Result<u64, WireError> {
        match self.u8(field)? {
            0xfd => Ok(u64::from(self.u16(field)?)),
            0xfe => Ok(u64::from(self.u32(field)?)),
            0xff => self.u64(field),
            n => Ok(u64::from(n)),
        }
    }

    /// A count that must fit in the remaining data at `min_item_len` bytes each.
    pub fn count(&mut self, field: &'static str, min_item_len: usize) -> Result<usize, WireError> {
        let value = self.varint(field)?;
        let max = (self.remaining() / min_item_len.max(1)) as u64;
        if value > max {
            return Err(WireError::Implausible { field, value });
        }
        Ok(value as usize)
    }

    /// Length-prefixed bytes.
    pub fn var_bytes(&mut self, field: &'static str) -> Result<&'a [u8], WireError> {
        let len = self.count(field, 1)?;
        self.take(len, field)
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Fields of interest from a peer's `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: i32,
    pub user_agent: String,
    pub start_height: i32,
}

fn write_net_addr(w: &mut ByteWriter, services: u64) {
    w.u64(services).bytes(&[0u8; 16]).u16_be(0);
}

/// Our `version` payload. `relay` asks the peer to announce transactions.
#[must_use]
pub fn build_version_payload(nonce: u64, timestamp: i64, relay: bool) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.i32(PROTOCOL_VERSION).u64(0).i64(timestamp);
    write_net_addr(&mut w, 0);
    write_net_addr(&mut w, 0);
    w.u64(nonce)
        .var_bytes(USER_AGENT.as_bytes())
        .i32(0)
        .u8(u8::from(relay));
    w.finish()
}

/// Parse a peer's `version`.
///
/// # Errors
///
/// Truncated payload.
pub fn parse_version(payload: &[u8]) -> Result<VersionInfo, WireError> {
    let mut r = ByteReader::new(payload);
    let version = r.i32("version")?;
    r.take(8 + 8 + 26 + 26 + 8, "version header")?;
    let user_agent = String::from_utf8_lossy(r.var_bytes("user agent")?).into_owned();
    let start_height = r.i32("start height")?;
    Ok(VersionInfo {
        version,
        user_agent,
        start_height,
    })
}

/// One inventory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvVector {
    pub kind: u32,
    pub hash: [u8; 32],
}

impl InvVector {
    /// Transaction announcement (either plain or witness form).
    #[must_use]
    pub fn is_tx(&self) -> bool {
        self.kind == MSG_TX || self.kind == MSG_WITNESS_TX
    }
}

/// Encode an `inv` / `getdata` payload.
#[must_use]
pub fn build_inventory_payload(items: &[InvVector]) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.varint(items.len() as u64);
    for item in items {
        w.u32(item.kind).bytes(&item.hash);
    }
    w.finish()
}

/// `getdata` payload requesting transactions.
#[must_use]
pub fn build_getdata_tx_payload(ids: &[TxId]) -> Vec<u8> {
    let items: Vec<InvVector> = ids
        .iter()
        .map(|id| InvVector {
            kind: MSG_TX,
            hash: *id.as_bytes(),
        })
        .collect();
    build_inventory_payload(&items)
}

/// Parse an `inv` / `getdata` / `notfound` payload.
///
/// # Errors
///
/// Truncated or implausible count.
pub fn parse_inventory(payload: &[u8]) -> Result<Vec<InvVector>, WireError> {
    let mut r = ByteReader::new(payload);
    let count = r.count("inventory count", 36)?;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(InvVector {
            kind: r.u32("inventory type")?,
            hash: r.hash("inventory hash")?,
        });
    }
    Ok(out)
}

/// Transaction ids announced in an inventory.
#[must_use]
pub fn announced_tx_ids(items: &[InvVector]) -> Vec<TxId> {
    items
        .iter()
        .filter(|i| i.is_tx())
        .map(|i| TxId::from_bytes(i.hash))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TESTNET: [u8; 4] = [0x0b, 0x11, 0x09, 0x07];

    #[test]
    fn test_verack_frame_layout() {
        let frame = encode_frame(TESTNET, &WireMessage::empty(Command::Verack)).unwrap();
        assert_eq!(frame.len(), HEADER_LEN);
        assert_eq!(&frame[..4], &TESTNET);
        assert_eq!(&frame[4..10], b"verack");
        assert_eq!(&frame[10..16], &[0u8; 6]);
        // Checksum of the empty payload
        assert_eq!(&frame[20..24], &[0x5d, 0xf6, 0xe0, 0xe2]);
    }

    #[test]
    fn test_header_decode_and_verify() {
        let msg = WireMessage::new(Command::Ping, 42u64.to_le_bytes().to_vec());
        let frame = encode_frame(TESTNET, &msg).unwrap();
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&frame[..HEADER_LEN]);

        let parsed = decode_header(TESTNET, &header).unwrap();
        assert_eq!(parsed.command, Command::Ping);
        assert_eq!(parsed.length, 8);
        verify_payload(&parsed, &frame[HEADER_LEN..]).unwrap();
        assert!(verify_payload(&parsed, &[0u8; 8]).is_err());
    }

    #[test]
    fn test_header_rejects_wrong_magic_and_size() {
        let frame = encode_frame(TESTNET, &WireMessage::empty(Command::Verack)).unwrap();
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&frame);
        assert!(matches!(
            decode_header([0xf9, 0xbe, 0xb4, 0xd9], &header),
            Err(WireError::BadMagic(_))
        ));

        header[16..20].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode_header(TESTNET, &header),
            Err(WireError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_unknown_command_preserved() {
        assert_eq!(
            Command::from_field(b"sendcmpct\0\0\0"),
            Command::Other("sendcmpct".into())
        );
    }

    #[test]
    fn test_varint_boundaries() {
        for v in [0u64, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, 0x1_0000_0000] {
            let bytes = ByteWriter::new().varint(v).finish();
            let mut r = ByteReader::new(&bytes);
            assert_eq!(r.varint("v").unwrap(), v);
            assert_eq!(r.remaining(), 0);
        }
    }

    #[test]
    fn test_version_payload_parses() {
        let payload = build_version_payload(7, 1_700_000_000, true);
        let info = parse_version(&payload).unwrap();
        assert_eq!(info.version, PROTOCOL_VERSION);
        assert_eq!(info.user_agent, USER_AGENT);
        assert_eq!(info.start_height, 0);
        assert_eq!(*payload.last().unwrap(), 1);
    }

    #[test]
    fn test_inventory_filters_transactions() {
        let items = [
            InvVector { kind: MSG_TX, hash: [1; 32] },
            InvVector { kind: 2, hash: [2; 32] },
            InvVector { kind: MSG_WITNESS_TX, hash: [3; 32] },
        ];
        let parsed = parse_inventory(&build_inventory_payload(&items)).unwrap();
        assert_eq!(parsed, items.to_vec());
        let ids = announced_tx_ids(&parsed);
        assert_eq!(ids, vec![TxId::from_bytes([1; 32]), TxId::from_bytes([3; 32])]);
    }

    #[test]
    fn test_inventory_implausible_count() {
        // Claims 1000 entries but carries none
        let payload = ByteWriter::new().varint(1000).finish();
        assert!(matches!(
            parse_inventory(&payload),
            Err(WireError::Implausible { .. })
        ));
    }
}
