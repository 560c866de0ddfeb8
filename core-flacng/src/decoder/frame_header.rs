//! Reads the per-frame format fields from the start of a FLAC frame.
//!
//! symphonia reports the stream-level format for every decoded buffer, so the
//! sample rate and bit depth a frame actually declares are taken from its
//! header bytes here.

/// Format fields declared by one frame header. `None` means "same as
/// STREAMINFO".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FrameFormatFields {
    pub(crate) sample_rate: Option<u32>,
    pub(crate) bits_per_sample: Option<u32>,
}

/// Parse the header at the start of `frame`. Returns `None` if the bytes do
/// not start with a well-formed header.
pub(crate) fn read_frame_format(frame: &[u8]) -> Option<FrameFormatFields> {
    if frame.len() < 5 || frame[0] != 0xFF || frame[1] & 0xFE != 0xF8 {
        return None;
    }

    let blocksize_code = frame[2] >> 4;
    let sample_rate_code = frame[2] & 0x0F;
    let sample_size_code = (frame[3] >> 1) & 0x07;

    let bits_per_sample = match sample_size_code {
        0b000 => None,
        0b001 => Some(8),
        0b010 => Some(12),
        0b100 => Some(16),
        0b101 => Some(20),
        0b110 => Some(24),
        0b111 => Some(32),
        _ => return None,
    };

    // Coded frame/sample number: 1 byte, or as many bytes as leading ones.
    let number_len = match frame[4].leading_ones() {
        0 => 1,
        n @ 2..=7 => n as usize,
        _ => return None,
    };
    let mut pos = 4 + number_len;

    pos += match blocksize_code {
        0b0110 => 1,
        0b0111 => 2,
        _ => 0,
    };

    let byte = |at: usize| frame.get(at).map(|&b| b as u32);
    let word = |at: usize| Some(byte(at)? << 8 | byte(at + 1)?);

    let sample_rate = match sample_rate_code {
        0 => None,
        1 => Some(88_200),
        2 => Some(176_400),
        3 => Some(192_000),
        4 => Some(8_000),
        5 => Some(16_000),
        6 => Some(22_050),
        7 => Some(24_000),
        8 => Some(32_000),
        9 => Some(44_100),
        10 => Some(48_000),
        11 => Some(96_000),
        12 => Some(byte(pos)? * 1000),
        13 => Some(word(pos)?),
        14 => Some(word(pos)? * 10),
        _ => return None,
    };

    Some(FrameFormatFields {
        sample_rate,
        bits_per_sample,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_codes() {
        // 44.1 kHz, stereo, 16 bit, frame 0, 8-bit blocksize follows
        let header = [0xFF, 0xF8, 0x69, 0x18, 0x00, 0x0F, 0x00];
        assert_eq!(
            read_frame_format(&header),
            Some(FrameFormatFields {
                sample_rate: Some(44_100),
                bits_per_sample: Some(16),
            })
        );

        // 48 kHz, 24 bit
        let header = [0xFF, 0xF8, 0xCA, 0x0C, 0x00, 0x00];
        assert_eq!(
            read_frame_format(&header),
            Some(FrameFormatFields {
                sample_rate: Some(48_000),
                bits_per_sample: Some(24),
            })
        );
    }

    #[test]
    fn values_inherited_from_streaminfo() {
        let header = [0xFF, 0xF8, 0xC0, 0x00, 0x00, 0x00];
        assert_eq!(read_frame_format(&header), Some(FrameFormatFields::default()));
    }

    #[test]
    fn explicit_sample_rates_follow_number_and_blocksize() {
        // Two-byte coded number, 16-bit blocksize, rate in Hz
        let header = [0xFF, 0xF9, 0x7D, 0x08, 0xC2, 0x80, 0x0F, 0xFF, 0x2B, 0x11, 0x00];
        assert_eq!(
            read_frame_format(&header).and_then(|f| f.sample_rate),
            Some(11_025)
        );

        // Rate in kHz after a one-byte number
        let header = [0xFF, 0xF8, 0x1C, 0x02, 0x05, 0x0C, 0x00];
        let fields = read_frame_format(&header).unwrap();
        assert_eq!(fields.sample_rate, Some(12_000));
        assert_eq!(fields.bits_per_sample, Some(8));

        // Rate in tens of Hz
        let header = [0xFF, 0xF8, 0x1E, 0x08, 0x01, 0x0F, 0xA0, 0x00];
        assert_eq!(
            read_frame_format(&header).and_then(|f| f.sample_rate),
            Some(40_000)
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert_eq!(read_frame_format(&[0xFF, 0xF8, 0x69]), None);
        assert_eq!(read_frame_format(&[0x00, 0xF8, 0x69, 0x18, 0x00]), None);
        // Reserved sample size
        assert_eq!(read_frame_format(&[0xFF, 0xF8, 0x69, 0x06, 0x00]), None);
        // Invalid sample rate code
        assert_eq!(read_frame_format(&[0xFF, 0xF8, 0x6F, 0x08, 0x00]), None);
        // Continuation byte where the coded number starts
        assert_eq!(read_frame_format(&[0xFF, 0xF8, 0x69, 0x08, 0x80]), None);
        // Explicit rate missing
        assert_eq!(read_frame_format(&[0xFF, 0xF8, 0x1D, 0x08, 0x00, 0x00]), None);
    }
}
