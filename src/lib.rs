//! Bit-exact codec for LLRP (Low Level Reader Protocol, EPCglobal
//! v1.x): message framing, TLV/TV parameter codecs, ROSpec/AccessSpec
//! construction, tag-report and event decoding, plus a thin async
//! client session for driving a UHF RFID reader over TCP port 5084.
//!
//! The codec itself is pure: encode/decode calls work on byte slices
//! and typed values, hold no session state, and are freely shareable
//! across threads.

pub mod accessspec;
pub mod buffer;
pub mod capabilities;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod messages;
pub mod params;
pub mod render;
pub mod report;
pub mod rospec;
pub mod types;

pub use accessspec::{AccessCommand, AccessSpec, C1G2OpSpec};
pub use capabilities::{ReaderCapabilities, ReaderMode, ReaderModeTable};
pub use client::LlrpClient;
pub use error::{LlrpError, Result};
pub use events::ReaderEventNotificationData;
pub use frame::{LLRP_PORT, VER_PROTO_V1};
pub use messages::{LlrpMessage, Message, SetReaderConfig, StatusResponse};
pub use params::{LLRPStatus, ReaderConfig};
pub use render::ToNode;
pub use report::{Epc, ROAccessReport, TagReportData};
pub use rospec::{ROSpec, ROSpecBuilder};
pub use types::{MessageType, ParamType, StatusCode, TvType};
