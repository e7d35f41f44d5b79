use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A sync frame must fit one UDP datagram.
pub const MAX_FRAME_BYTES: usize = 65507;

const TAG_SNAPSHOT: u8 = 0x01;
const TAG_HEARTBEAT: u8 = 0x02;

/// Body of a primary heartbeat frame.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrimaryHeartbeat {
    /// Wall-clock seconds on the primary when the frame was sent.
    pub ts: f64,
}

/// One multicast datagram: a single tag byte followed by a JSON body.
#[derive(Debug, PartialEq)]
pub enum SyncFrame {
    /// Tag 0x01: a state snapshot as produced by the state store.
    Snapshot(Vec<u8>),
    /// Tag 0x02: primary liveness heartbeat.
    Heartbeat(f64),
}

impl SyncFrame {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut frame;
        match self {
            SyncFrame::Snapshot(body) => {
                frame = Vec::with_capacity(1 + body.len());
                frame.push(TAG_SNAPSHOT);
                frame.extend_from_slice(body);
            }
            SyncFrame::Heartbeat(ts) => {
                let body = serde_json::to_vec(&PrimaryHeartbeat { ts: *ts })?;
                frame = Vec::with_capacity(1 + body.len());
                frame.push(TAG_HEARTBEAT);
                frame.extend_from_slice(&body);
            }
        }
        Ok(frame)
    }

    /// Splits a received datagram into its frame kind. Unknown tags and
    /// malformed heartbeat bodies are errors; snapshot bodies are validated
    /// later, by the state store.
    pub fn decode(datagram: &[u8]) -> Result<Self> {
        let (&tag, body) = datagram
            .split_first()
            .ok_or_else(|| anyhow!("empty sync datagram"))?;

        match tag {
            TAG_SNAPSHOT => Ok(SyncFrame::Snapshot(body.to_vec())),
            TAG_HEARTBEAT => {
                let heartbeat: PrimaryHeartbeat = serde_json::from_slice(body)?;
                Ok(SyncFrame::Heartbeat(heartbeat.ts))
            }
            other => Err(anyhow!("unknown sync frame tag: {:#04x}", other)),
        }
    }
}
