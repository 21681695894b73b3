//! ESP3 framing: byte stream to packets and back.
//!
//! Frame format:
//! ```text
//! +------+----------+---------+------+--------+--------+----------+--------+
//! | Sync | Data len | Opt len | Type | CRC8H  |  Data  | Optional | CRC8D  |
//! | 0x55 |  u16 BE  |   u8    |  u8  |        |        |          |        |
//! +------+----------+---------+------+--------+--------+----------+--------+
//! |  1   |    2     |    1    |  1   |   1    |  N     |    M     |   1    |
//! ```
//!
//! CRC8H covers the four header bytes after the sync byte, CRC8D covers
//! data followed by optional data.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use crc::{Crc, CRC_8_SMBUS};
use log::trace;

use crate::error::ProtocolError;
use crate::types::{Esp3Packet, PacketType, SYNC_BYTE};

/// Sync byte + 4 header bytes + header CRC.
pub const HEADER_SIZE: usize = 6;

/// CRC-8 with polynomial 0x07, initial value 0, no reflection.
const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Compute the ESP3 CRC-8 over `bytes`.
pub fn crc8(bytes: &[u8]) -> u8 {
    CRC8.checksum(bytes)
}

/// Size of the ESP3 frame carrying `packet`.
///
/// Fails when the data or optional section does not fit its length field.
pub fn frame_len(packet: &Esp3Packet) -> Result<usize, ProtocolError> {
    let data_len = packet.data.len();
    if data_len > u16::MAX as usize {
        return Err(ProtocolError::PacketTooLarge {
            section: "data",
            len: data_len,
            max: u16::MAX as usize,
        });
    }
    let opt_len = packet.optional.len();
    if opt_len > u8::MAX as usize {
        return Err(ProtocolError::PacketTooLarge {
            section: "optional",
            len: opt_len,
            max: u8::MAX as usize,
        });
    }
    Ok(HEADER_SIZE + data_len + opt_len + 1)
}

/// Serialize a packet into one ESP3 frame.
pub fn encode_packet(packet: &Esp3Packet) -> Result<Bytes, ProtocolError> {
    let mut buf = BytesMut::with_capacity(frame_len(packet)?);
    encode_packet_into(packet, &mut buf)?;
    Ok(buf.freeze())
}

/// Serialize a packet, appending the frame to `dst`.
///
/// Nothing is written when the packet is too large.
pub fn encode_packet_into(packet: &Esp3Packet, dst: &mut BytesMut) -> Result<(), ProtocolError> {
    dst.reserve(frame_len(packet)?);
    dst.put_u8(SYNC_BYTE);

    let header_start = dst.len();
    dst.put_u16(packet.data.len() as u16);
    dst.put_u8(packet.optional.len() as u8);
    dst.put_u8(packet.packet_type.into());
    let header_crc = crc8(&dst[header_start..]);
    dst.put_u8(header_crc);

    let body_start = dst.len();
    dst.put_slice(&packet.data);
    dst.put_slice(&packet.optional);
    let body_crc = crc8(&dst[body_start..]);
    dst.put_u8(body_crc);
    Ok(())
}

/// Try to extract one packet from the front of `buf`.
///
/// Returns `None` when more bytes are needed. Noise before a sync byte and
/// frames failing either CRC are dropped from `buf`; scanning resumes one
/// byte after the rejected sync byte.
pub fn decode_packet(buf: &mut BytesMut) -> Option<Esp3Packet> {
    loop {
        match buf.iter().position(|&b| b == SYNC_BYTE) {
            Some(0) => {}
            Some(pos) => {
                trace!("Discarding {} bytes of noise before sync byte", pos);
                buf.advance(pos);
            }
            None => {
                if !buf.is_empty() {
                    trace!("Discarding {} bytes without sync byte", buf.len());
                    buf.clear();
                }
                return None;
            }
        }

        if buf.len() < HEADER_SIZE {
            return None;
        }

        if crc8(&buf[1..5]) != buf[5] {
            trace!("Header CRC mismatch, resynchronizing");
            buf.advance(1);
            continue;
        }

        let data_len = u16::from_be_bytes([buf[1], buf[2]]) as usize;
        let opt_len = buf[3] as usize;
        let frame_len = HEADER_SIZE + data_len + opt_len + 1;
        if buf.len() < frame_len {
            return None;
        }

        let body = &buf[HEADER_SIZE..frame_len - 1];
        if crc8(body) != buf[frame_len - 1] {
            trace!("Data CRC mismatch, resynchronizing");
            buf.advance(1);
            continue;
        }

        let packet_type = PacketType::from(buf[4]);
        let mut frame = buf.split_to(frame_len);
        frame.advance(HEADER_SIZE);
        let data = frame.split_to(data_len).freeze();
        let optional = frame.split_to(opt_len).freeze();
        return Some(Esp3Packet {
            packet_type,
            data,
            optional,
        });
    }
}

/// Decode every complete packet currently in `buf`.
pub fn decode_all(buf: &mut BytesMut) -> Vec<Esp3Packet> {
    let mut packets = Vec::new();
    while let Some(packet) = decode_packet(buf) {
        packets.push(packet);
    }
    packets
}
