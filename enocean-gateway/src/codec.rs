//! ESP3 framing as a tokio codec.

use std::io;

use bytes::BytesMut;
use log::debug;
use tokio_util::codec::{Decoder, Encoder};

use enocean_protocol::{decode_packet, encode_packet_into, Esp3Packet};

/// Frames a byte stream into [`Esp3Packet`]s.
///
/// Corrupt frames and noise are skipped, so decoding never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Esp3Codec;

impl Decoder for Esp3Codec {
    type Item = Esp3Packet;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Esp3Packet>, io::Error> {
        Ok(decode_packet(src))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Esp3Packet>, io::Error> {
        if let Some(packet) = self.decode(buf)? {
            return Ok(Some(packet));
        }
        if !buf.is_empty() {
            debug!("Discarding {} bytes of incomplete frame at end of stream", buf.len());
            buf.clear();
        }
        Ok(None)
    }
}

impl Encoder<Esp3Packet> for Esp3Codec {
    type Error = io::Error;

    fn encode(&mut self, item: Esp3Packet, dst: &mut BytesMut) -> Result<(), io::Error> {
        encode_packet_into(&item, dst).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
    }
}
