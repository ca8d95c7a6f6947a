use crate::grpc::{ProtoBullyKind, ProtoBullyMessage};
use bytes::Bytes;
use prost::Message;

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Undecodable election message")]
    Decode(#[from] prost::DecodeError),
    #[error("Unknown election message kind {0}")]
    UnknownKind(i32),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BullyKind {
    /// Sent to higher members when starting an election.
    Election,
    /// Announces the sender as master.
    Coordinator,
    Ping,
    /// Reply to Election and Ping.
    Alive,
    Ack,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BullyMessage {
    pub kind: BullyKind,
    pub from: String,
}

impl BullyMessage {
    pub fn new(kind: BullyKind, from: impl Into<String>) -> Self {
        BullyMessage { kind, from: from.into() }
    }

    pub fn encode(&self) -> Bytes {
        let proto = ProtoBullyMessage {
            kind: ProtoBullyKind::from(self.kind) as i32,
            from: self.from.clone(),
        };
        let mut buf = Vec::with_capacity(proto.encoded_len());
        proto.encode(&mut buf).expect("Vec<u8> always has room to encode");
        Bytes::from(buf)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, MessageError> {
        let proto = ProtoBullyMessage::decode(payload)?;
        let kind = match ProtoBullyKind::from_i32(proto.kind) {
            Some(ProtoBullyKind::Election) => BullyKind::Election,
            Some(ProtoBullyKind::Coordinator) => BullyKind::Coordinator,
            Some(ProtoBullyKind::Ping) => BullyKind::Ping,
            Some(ProtoBullyKind::Alive) => BullyKind::Alive,
            Some(ProtoBullyKind::Ack) => BullyKind::Ack,
            Some(ProtoBullyKind::Unknown) | None => return Err(MessageError::UnknownKind(proto.kind)),
        };

        Ok(BullyMessage { kind, from: proto.from })
    }
}

impl From<BullyKind> for ProtoBullyKind {
    fn from(kind: BullyKind) -> Self {
        match kind {
            BullyKind::Election => ProtoBullyKind::Election,
            BullyKind::Coordinator => ProtoBullyKind::Coordinator,
            BullyKind::Ping => ProtoBullyKind::Ping,
            BullyKind::Alive => ProtoBullyKind::Alive,
            BullyKind::Ack => ProtoBullyKind::Ack,
        }
    }
}
