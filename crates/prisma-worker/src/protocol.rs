//! Message contracts between a caller and the processing worker.
//!
//! Both enums are internally tagged on `kind`, so a request reads
//! `{"kind": "process", "buffer": {...}, "adjustments": {...}}`. Pixel
//! bytes travel as base64 inside [`WireBuffer`].

use serde::{Deserialize, Serialize};

use prisma_core::grading::ColorBalance;
use prisma_core::{
    Adjustments, ChannelStats, EngineError, ErrorCode, Histogram, PixelBuffer, ProcessParams,
    SelectiveColorState,
};

/// Request kinds the worker understands.
pub const REQUEST_KINDS: [&str; 2] = ["process", "histogram"];

/// Pixel buffer as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBuffer {
    pub width: u32,
    pub height: u32,
    /// Flat RGBA bytes, base64-encoded in JSON.
    #[serde(with = "base64_bytes")]
    pub pixels: Vec<u8>,
}

impl From<&PixelBuffer> for WireBuffer {
    fn from(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            pixels: buffer.as_bytes().to_vec(),
        }
    }
}

impl From<PixelBuffer> for WireBuffer {
    fn from(buffer: PixelBuffer) -> Self {
        let (width, height) = buffer.dimensions();
        Self {
            width,
            height,
            pixels: buffer.into_raw(),
        }
    }
}

impl TryFrom<WireBuffer> for PixelBuffer {
    type Error = EngineError;

    fn try_from(wire: WireBuffer) -> Result<Self, Self::Error> {
        PixelBuffer::new(wire.width, wire.height, wire.pixels)
    }
}

/// Messages from the caller to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerRequest {
    /// Grade a buffer and measure the result.
    Process {
        buffer: WireBuffer,
        adjustments: Adjustments,
        #[serde(default)]
        selective: SelectiveColorState,
        #[serde(default)]
        balance: ColorBalance,
    },

    /// Measure a buffer without changing it.
    Histogram { buffer: WireBuffer },
}

impl WorkerRequest {
    /// Processing request from typed parts.
    pub fn process(buffer: impl Into<WireBuffer>, params: ProcessParams) -> Self {
        Self::Process {
            buffer: buffer.into(),
            adjustments: params.adjustments,
            selective: params.selective,
            balance: params.balance,
        }
    }

    /// Histogram-only request.
    pub fn histogram(buffer: impl Into<WireBuffer>) -> Self {
        Self::Histogram {
            buffer: buffer.into(),
        }
    }

    /// Wire name of this request's kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Process { .. } => "process",
            Self::Histogram { .. } => "histogram",
        }
    }
}

/// Messages from the worker back to the caller. Every request gets exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerReply {
    Processed {
        buffer: WireBuffer,
        histogram: Histogram,
        stats: ChannelStats,
    },

    Histogram {
        histogram: Histogram,
        stats: ChannelStats,
    },

    Error { code: ErrorCode, message: String },
}

impl WorkerReply {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl From<&EngineError> for WorkerReply {
    fn from(err: &EngineError) -> Self {
        Self::Error {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<EngineError> for WorkerReply {
    fn from(err: EngineError) -> Self {
        Self::from(&err)
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let buffer = PixelBuffer::filled(1, 1, [1, 2, 3, 4]).unwrap();
        let json = serde_json::to_value(WorkerRequest::histogram(buffer)).unwrap();
        assert_eq!(json["kind"], "histogram");
        assert_eq!(json["buffer"]["width"], 1);
        assert_eq!(json["buffer"]["pixels"], "AQIDBA==");
    }

    #[test]
    fn test_process_request_defaults_optional_fields() {
        let json = r#"{
            "kind": "process",
            "buffer": {"width": 1, "height": 1, "pixels": "AAAAAA=="},
            "adjustments": {"exposure": 25}
        }"#;
        let request: WorkerRequest = serde_json::from_str(json).unwrap();
        match request {
            WorkerRequest::Process {
                adjustments,
                selective,
                balance,
                ..
            } => {
                assert_eq!(adjustments.exposure, 25.0);
                assert!(!selective.has_active_changes());
                assert!(balance.is_identity());
            }
            other => panic!("expected a process request, got {other:?}"),
        }
    }

    #[test]
    fn test_wire_buffer_validation() {
        let wire = WireBuffer {
            width: 2,
            height: 2,
            pixels: vec![0; 5],
        };
        assert!(PixelBuffer::try_from(wire).is_err());
        let bad_base64 = r#"{"width":1,"height":1,"pixels":"!!"}"#;
        assert!(serde_json::from_str::<WireBuffer>(bad_base64).is_err());
    }

    #[test]
    fn test_error_reply_carries_code() {
        let reply = WorkerReply::from(EngineError::UnknownOperation("blur".into()));
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["code"], "unknown_operation");
        assert!(reply.is_error());
    }
}
