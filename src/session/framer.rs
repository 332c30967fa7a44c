use bytes::{Buf, Bytes, BytesMut};
use codec::frame;

/// Incremental RTCM 3 frame scanner.
///
/// Bytes received from the caster are appended to a rolling buffer and
/// complete frames are sliced off the front. The `0xD3` preamble byte
/// can legitimately occur inside payloads, so alignment is only ever
/// committed by a matching CRC: on a mismatch the scanner slips a
/// single byte and resumes the preamble hunt, which keeps subsequent
/// frames recoverable.
#[derive(Default)]
pub struct Framer {
    buffer: BytesMut,
    preamble_found: bool,
    aligned: bool,
}

impl Framer {
    /// Appends received bytes to the scan buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Whether the most recently extracted frame verified its CRC.
    pub fn aligned(&self) -> bool {
        self.aligned
    }

    /// Extracts the next CRC-clean frame, or `None` when the buffer
    /// holds no complete frame yet.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            if !self.preamble_found {
                match self.buffer.iter().position(|&byte| byte == frame::PREAMBLE) {
                    Some(0) => {}
                    Some(start) => self.buffer.advance(start),
                    None => {
                        self.buffer.clear();
                        return None;
                    }
                }

                self.preamble_found = true;
            }

            // Preamble, reserved bits, payload length and CRC make a
            // complete frame at least 6 bytes.
            if self.buffer.len() < 6 {
                return None;
            }

            let size = match frame::frame_size(&self.buffer) {
                Ok(size) => size,
                Err(_) => {
                    self.slip();
                    continue;
                }
            };

            if self.buffer.len() < size {
                return None;
            }

            if frame::verify(&self.buffer[..size]) {
                self.aligned = true;
                self.preamble_found = false;
                return Some(self.buffer.split_to(size).freeze());
            }

            log::warn!("rtcm crc mismatch, resynchronising: candidate_size={size}");
            self.aligned = false;
            self.slip();
        }
    }

    fn slip(&mut self) {
        self.buffer.advance(1);
        self.preamble_found = false;
    }
}

#[cfg(test)]
mod tests {
    use super::Framer;
    use codec::{frame, message::TextMessage};

    /// A live 1005 frame with a 0xD3 byte inside the payload.
    #[rustfmt::skip]
    const MSG1005_FRAME: &[u8] = &[
        0xD3, 0x00, 0x13, 0x3E, 0xD7, 0xD3, 0x02, 0x02, 0x98, 0x0E, 0xDE, 0xEF,
        0x34, 0xB4, 0xBD, 0x62, 0xAC, 0x09, 0x41, 0x98, 0x6F, 0x33, 0x36, 0x0B,
        0x98,
    ];

    fn text_frame(text: &str) -> Vec<u8> {
        let mut message = TextMessage::new(text);
        message.mjd_day = 59000;
        message.utc_seconds = 1;
        frame::seal(&message.encode()).unwrap().to_vec()
    }

    #[test]
    fn frames_with_embedded_preamble() {
        let mut framer = Framer::default();
        framer.extend(MSG1005_FRAME);
        framer.extend(MSG1005_FRAME);

        assert_eq!(&framer.next_frame().unwrap()[..], MSG1005_FRAME);
        assert_eq!(&framer.next_frame().unwrap()[..], MSG1005_FRAME);
        assert!(framer.next_frame().is_none());
        assert!(framer.aligned());
    }

    #[test]
    fn garbage_between_frames_is_skipped() {
        let mut framer = Framer::default();
        framer.extend(b"SOURCETABLE leftovers");
        framer.extend(MSG1005_FRAME);
        framer.extend(&[0x00, 0xD3, 0x01]);
        framer.extend(&text_frame("hello"));

        assert_eq!(&framer.next_frame().unwrap()[..], MSG1005_FRAME);
        let second = framer.next_frame().unwrap();
        assert_eq!(frame::message_type(&second).unwrap(), 1029);
    }

    #[test]
    fn corrupted_frame_resynchronises() {
        let mut corrupted = MSG1005_FRAME.to_vec();
        corrupted[20] ^= 0xFF;

        // The corrupted frame contains a payload 0xD3 whose false
        // header declares a 520 byte frame; enough trailing traffic is
        // needed before the scanner can reject it and lock back on.
        let mut framer = Framer::default();
        framer.extend(&corrupted);
        framer.extend(MSG1005_FRAME);
        for index in 0..40 {
            framer.extend(&text_frame(&format!("msg-{index}")));
        }

        let mut collected = Vec::new();
        while let Some(frame) = framer.next_frame() {
            collected.push(frame);
        }

        assert_eq!(collected.len(), 41);
        assert_eq!(&collected[0][..], MSG1005_FRAME);
        assert!(
            collected[1..]
                .iter()
                .all(|frame| frame::message_type(frame).unwrap() == 1029)
        );
    }

    #[test]
    fn byte_at_a_time_matches_bulk_feeding() {
        let mut stream = Vec::new();
        stream.extend_from_slice(b"junk");
        stream.extend_from_slice(MSG1005_FRAME);
        stream.extend_from_slice(&text_frame("one"));
        stream.extend_from_slice(&[0x42, 0x00]);
        stream.extend_from_slice(&text_frame("two"));

        let mut bulk = Framer::default();
        bulk.extend(&stream);
        let mut expected = Vec::new();
        while let Some(frame) = bulk.next_frame() {
            expected.push(frame);
        }

        let mut trickle = Framer::default();
        let mut collected = Vec::new();
        for &byte in &stream {
            trickle.extend(&[byte]);
            while let Some(frame) = trickle.next_frame() {
                collected.push(frame);
            }
        }

        assert_eq!(expected.len(), 3);
        assert_eq!(collected, expected);
    }
}
