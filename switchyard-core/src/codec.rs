// Encoding of mapping replies and kernel-generated error bodies

use crate::Error;
use serde_json::{Map, Value};

/// Encoded body plus its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Turns a key-value mapping into response bytes
pub trait Codec: Send + Sync {
    fn encode(&self, mapping: &Map<String, Value>) -> Result<Encoded, Error>;
}

/// The default codec: compact JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent output; handy while debugging
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn encode(&self, mapping: &Map<String, Value>) -> Result<Encoded, Error> {
        let body = if self.pretty {
            serde_json::to_vec_pretty(mapping)?
        } else {
            serde_json::to_vec(mapping)?
        };
        Ok(Encoded {
            body,
            content_type: "application/json".to_string(),
        })
    }
}
