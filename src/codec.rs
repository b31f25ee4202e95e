use bytes::{Buf, BytesMut};
use std::io;
use tokio_util::codec::Decoder;

/// Re-encodes a non-UTF-8 upload (Latin-1 spreadsheets exports, mostly) into
/// UTF-8 chunks for the CSV parser. Malformed sequences become U+FFFD.
pub struct Transcoder {
    decoder: encoding_rs::Decoder,
    finished: bool,
}

impl Transcoder {
    pub fn new(encoding: &'static encoding_rs::Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder(),
            finished: false,
        }
    }

    fn convert(&mut self, src: &mut BytesMut, last: bool) -> Option<BytesMut> {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or_else(|| src.len() * 3 + 16);
        let mut out = vec![0u8; capacity];

        let (_result, read, written, _replaced) = self.decoder.decode_to_utf8(src, &mut out, last);
        src.advance(read);

        if written == 0 {
            return None;
        }
        out.truncate(written);
        Some(BytesMut::from(&out[..]))
    }
}

impl Decoder for Transcoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        // A lone lead byte of a multi-byte sequence stays buffered inside the
        // decoder, so `written` can be zero while input was still consumed.
        Ok(self.convert(src, false))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.finished {
            return Ok(None);
        }
        self.finished = true;
        let out = self.convert(buf, true);
        buf.clear();
        Ok(out)
    }
}
