//! Datagram framing shared by server and client.

use crate::grid::{Change, Grid};
use crate::{ProtocolError, PROTOCOL_VERSION};
use bincode::{deserialize, serialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a broadcast tick.
pub type SnapshotId = u32;

/// Zero-based player index assigned in lobby arrival order.
pub type PlayerId = u8;

/// One datagram on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub version: u8,
    /// Tick this packet represents; `None` for anything that is not a tick broadcast or ACK.
    pub snapshot_id: Option<SnapshotId>,
    /// Per-sender counter, diagnostic only.
    pub seq_num: u32,
    /// Milliseconds since the UNIX epoch when the packet was sent.
    pub server_timestamp: u64,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Hello,
    Lobby {
        game_ready: bool,
        message: String,
        player_id: PlayerId,
    },
    Event {
        row: u16,
        col: u16,
        player_id: PlayerId,
    },
    Ack,
    Snapshot {
        grid: Grid,
        message: String,
        game_ongoing: bool,
    },
    Delta {
        changes: Vec<Change>,
        game_ongoing: bool,
    },
    Info {
        message: String,
        player_id: PlayerId,
        game_ongoing: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    Hello,
    Lobby,
    Event,
    Ack,
    Snapshot,
    Delta,
    Info,
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MsgType::Hello => "HELLO",
            MsgType::Lobby => "LOBBY",
            MsgType::Event => "EVENT",
            MsgType::Ack => "ACK",
            MsgType::Snapshot => "SNAPSHOT",
            MsgType::Delta => "DELTA",
            MsgType::Info => "INFO",
        };
        f.write_str(name)
    }
}

impl Payload {
    /// Message kind of this payload, used for logging and dispatch.
    pub fn msg_type(&self) -> MsgType {
        match self {
            Payload::Hello => MsgType::Hello,
            Payload::Lobby { .. } => MsgType::Lobby,
            Payload::Event { .. } => MsgType::Event,
            Payload::Ack => MsgType::Ack,
            Payload::Snapshot { .. } => MsgType::Snapshot,
            Payload::Delta { .. } => MsgType::Delta,
            Payload::Info { .. } => MsgType::Info,
        }
    }
}

impl Packet {
    /// Builds a packet with an unstamped header. The sending task fills in
    /// `seq_num` and `server_timestamp` right before transmission.
    pub fn new(snapshot_id: Option<SnapshotId>, payload: Payload) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            snapshot_id,
            seq_num: 0,
            server_timestamp: 0,
            payload,
        }
    }

    /// ACK confirming that the sender applied `snapshot_id`.
    pub fn ack(snapshot_id: SnapshotId) -> Self {
        Self::new(Some(snapshot_id), Payload::Ack)
    }

    /// Message kind carried by this packet.
    pub fn msg_type(&self) -> MsgType {
        self.payload.msg_type()
    }

    /// Fills in the sender's sequence number and send time.
    pub fn stamp(&mut self, seq_num: u32, timestamp: u64) {
        self.seq_num = seq_num;
        self.server_timestamp = timestamp;
    }

    /// Serializes the packet into a single datagram.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        serialize(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decodes one datagram, rejecting anything not built for this protocol version.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let packet: Packet =
            deserialize(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))?;
        if packet.version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: packet.version,
            });
        }
        Ok(packet)
    }
}
