//! Host code page fix-ups
//!
//! The host translates EBCDIC to an 8-bit code page before the bytes reach the
//! printer channel. A handful of symbols come out at the wrong code point; this
//! table moves them back. Everything else is taken as Latin-1, which is what the
//! host translation produces for the remaining printable characters. This is
//! deliberately not a full code page table.

const NOT_SIGN: u8 = 0x5E;
const CENT_SIGN: u8 = 0xD6;
const BROKEN_BAR: u8 = 0xA6;
const CIRCUMFLEX: u8 = 0xAC;
const COPYRIGHT: u8 = 0x9F;

const CHARACTER_OVERRIDES: [Option<char>; 256] = {
    let mut table = [None; 256];
    // the host swaps '¬' and '^' relative to Latin-1
    table[NOT_SIGN as usize] = Some('¬');
    table[CIRCUMFLEX as usize] = Some('^');
    table[CENT_SIGN as usize] = Some('¢');
    table[BROKEN_BAR as usize] = Some('|');
    table[COPYRIGHT as usize] = Some('©');
    table
};

/// Maps a host byte to the character it stands for.
///
/// Returns the character and whether the byte had to be passed through without a
/// known mapping (any byte above 0x7F that is not in the override table).
#[inline]
pub fn map_byte(byte: u8) -> (char, bool) {
    match CHARACTER_OVERRIDES[byte as usize] {
        Some(ch) => (ch, false),
        None => (char::from(byte), byte > 0x7F),
    }
}

/// Decodes one printer line, calling `unmapped` for every byte that passed through without a mapping.
pub fn decode_line(bytes: &[u8], mut unmapped: impl FnMut(u8)) -> String {
    let mut line = String::with_capacity(bytes.len());
    for &b in bytes {
        let (ch, passthrough) = map_byte(b);
        if passthrough {
            unmapped(b);
        }
        line.push(ch);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        for b in 0x20..0x7F_u8 {
            if b == NOT_SIGN {
                continue;
            }
            assert_eq!(map_byte(b), (b as char, false));
        }
    }

    #[test]
    fn overrides_host_symbols() {
        assert_eq!(map_byte(0x5E).0, '¬');
        assert_eq!(map_byte(0xAC).0, '^');
        assert_eq!(map_byte(0xD6).0, '¢');
        assert_eq!(map_byte(0xA6).0, '|');
        assert_eq!(map_byte(0x9F).0, '©');
    }

    #[test]
    fn reports_each_unmapped_byte() {
        let mut seen = Vec::new();
        let line = decode_line(&[b'A', 0xC1, 0xD6, 0xC1], |b| seen.push(b));
        assert_eq!(line, "A\u{C1}¢\u{C1}");
        assert_eq!(seen, vec![0xC1, 0xC1]);
    }
}
