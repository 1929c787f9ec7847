//! Application framing of reports sent over the 2.4G link
//!
//! ```text
//! +-------------+-------------------+
//! | Opcode (1B) | Payload (0..=9 B) |
//! +-------------+-------------------+
//! ```

use heapless::Vec;

use super::service::{LinkError, Result};

/// Largest frame the link accepts, opcode included
pub const MAX_FRAME_SIZE: usize = 10;

/// A framed report
pub type Frame = Vec<u8, MAX_FRAME_SIZE>;

/// Application opcodes. The top two bits of the opcode byte must stay clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    Keyboard = 0x10,
    Consumer = 0x11,
    Vendor = 0x12,
    Dpi = 0x20,
    ReportRate = 0x21,
}

impl Opcode {
    pub fn byte(self) -> u8 {
        self as u8
    }
}

/// Frame `payload` behind `opcode`
pub fn encode(opcode: Opcode, payload: &[u8]) -> Result<Frame> {
    let mut frame = Frame::new();
    frame.push(opcode.byte()).map_err(|_| LinkError::FrameTooLarge)?;
    frame.extend_from_slice(payload).map_err(|_| LinkError::FrameTooLarge)?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_keyboard_report() {
        let frame = encode(Opcode::Keyboard, &[0x02, 0x00, 0x04]).unwrap();
        assert_eq!(&frame[..], &[0x10, 0x02, 0x00, 0x04]);
    }

    #[test]
    fn test_encode_too_large() {
        assert_eq!(encode(Opcode::Vendor, &[0u8; 10]), Err(LinkError::FrameTooLarge));
        assert!(encode(Opcode::Vendor, &[0u8; 9]).is_ok());
    }

    #[test]
    fn test_opcode_header_bits_clear() {
        for opcode in [Opcode::Keyboard, Opcode::Consumer, Opcode::Vendor, Opcode::Dpi, Opcode::ReportRate] {
            assert_eq!(opcode.byte() & 0xC0, 0);
        }
    }
}
