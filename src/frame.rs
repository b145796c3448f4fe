use bytes::{BufMut, BytesMut};

use crate::error::{LlrpError, Result};

/// Default LLRP TCP port.
pub const LLRP_PORT: u16 = 5084;

/// LLRP protocol version 1; the only version this codec speaks.
pub const VER_PROTO_V1: u8 = 1;

/// Envelope size: version/type word, 32-bit length, 32-bit message id.
pub const MSG_HEADER_LEN: usize = 10;

const VERSION_SHIFT: u16 = 10;
const VERSION_MASK: u16 = 0x7;
const TYPE_MASK: u16 = 0x3FF;

/// Decoded message envelope.
///
/// `message_length` covers the full frame including these ten bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
  pub version        : u8,
  pub message_type   : u16,
  pub message_length : u32,
  pub message_id     : u32,
}

/// Splits one complete frame off the front of `buf`.
///
/// Returns the header and the body slice (`message_length - 10` bytes).
/// A buffer holding less than a full frame yields `NeedMoreData` with the
/// total byte count to accumulate; a header advertising fewer than ten
/// bytes yields `ShortFrame`.
pub fn decode_frame(buf: &[u8]) -> Result<(FrameHeader, &[u8])> {
  if buf.len() < MSG_HEADER_LEN {
    return Err(LlrpError::NeedMoreData(MSG_HEADER_LEN));
  }

  let word = u16::from_be_bytes([buf[0], buf[1]]);
  let version = ((word >> VERSION_SHIFT) & VERSION_MASK) as u8;
  let message_type = word & TYPE_MASK;
  let message_length = u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]);
  let message_id = u32::from_be_bytes([buf[6], buf[7], buf[8], buf[9]]);

  if (message_length as usize) < MSG_HEADER_LEN {
    return Err(LlrpError::ShortFrame);
  }
  if buf.len() < message_length as usize {
    return Err(LlrpError::NeedMoreData(message_length as usize));
  }

  let body = &buf[MSG_HEADER_LEN..message_length as usize];
  let header = FrameHeader { version, message_type, message_length, message_id };

  Ok((header, body))
}

/// Emits a complete frame around `body` with protocol version 1.
pub fn encode_frame(message_type: u16, message_id: u32, body: &[u8]) -> BytesMut {
  encode_frame_versioned(VER_PROTO_V1, message_type, message_id, body)
}

pub fn encode_frame_versioned(
  version: u8,
  message_type: u16,
  message_id: u32,
  body: &[u8],
) -> BytesMut {
  let message_length = (MSG_HEADER_LEN + body.len()) as u32;
  let mut buf = BytesMut::with_capacity(message_length as usize);

  let word = ((version as u16 & VERSION_MASK) << VERSION_SHIFT) | (message_type & TYPE_MASK);
  buf.put_u16(word);
  buf.put_u32(message_length);
  buf.put_u32(message_id);
  buf.extend_from_slice(body);

  buf
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_body_frame_is_exactly_the_envelope() {
    // KEEPALIVE_ACK, message id 0.
    let frame = encode_frame(72, 0, &[]);
    assert_eq!(&frame[..], &[0x04, 0x48, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x00]);
  }

  #[test]
  fn decode_round_trips_the_header() {
    let frame = encode_frame(24, 3, &[0x00, 0x00, 0x04, 0xd2]);
    let (header, body) = decode_frame(&frame).unwrap();
    assert_eq!(header.version, VER_PROTO_V1);
    assert_eq!(header.message_type, 24);
    assert_eq!(header.message_length, 14);
    assert_eq!(header.message_id, 3);
    assert_eq!(body, &[0x00, 0x00, 0x04, 0xd2]);
  }

  #[test]
  fn every_proper_prefix_needs_more_data() {
    let frame = encode_frame(61, 9, &[0xaa; 23]);
    for k in 0..frame.len() {
      match decode_frame(&frame[..k]) {
        Err(LlrpError::NeedMoreData(n)) => {
          assert_eq!(n, if k < MSG_HEADER_LEN { MSG_HEADER_LEN } else { frame.len() });
        }
        other => panic!("prefix {} decoded to {:?}", k, other),
      }
    }
    assert!(decode_frame(&frame).is_ok());
  }

  #[test]
  fn undersized_length_field_is_a_short_frame() {
    let mut frame = encode_frame(62, 1, &[]).to_vec();
    frame[5] = 9;
    assert!(matches!(decode_frame(&frame), Err(LlrpError::ShortFrame)));
  }
}
