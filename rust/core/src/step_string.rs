// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISO-10303-21 string encoding
//!
//! STEP files are 7-bit: anything outside printable ASCII is written with
//! control directives. `decode` turns the raw literal body into a Rust
//! string, `encode` produces a literal body (without the surrounding quotes)
//! that any IFC reader accepts.

/// Decode the body of a STEP string literal.
///
/// Handles `''`, `\\`, `\X2\…\X0\`, `\X4\…\X0\`, `\X\hh`, `\S\c` and drops
/// `\P?\` code page switches. Malformed directives are kept verbatim.
pub fn decode(raw: &str) -> String {
    if !raw.contains('\\') && !raw.contains("''") {
        return raw.to_string();
    }

    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' if bytes.get(i + 1) == Some(&b'\'') => {
                out.push('\'');
                i += 2;
            }
            b'\\' => {
                if let Some(consumed) = decode_directive(&raw[i..], &mut out) {
                    i += consumed;
                } else {
                    out.push('\\');
                    i += 1;
                }
            }
            _ => {
                // Copy the whole (possibly multi-byte) character
                let ch_len = utf8_len(bytes[i]);
                out.push_str(&raw[i..i + ch_len]);
                i += ch_len;
            }
        }
    }

    out
}

/// Try to decode one `\…` directive at the start of `input`.
/// Returns the number of bytes consumed.
fn decode_directive(input: &str, out: &mut String) -> Option<usize> {
    let bytes = input.as_bytes();

    if input.starts_with("\\\\") {
        out.push('\\');
        return Some(2);
    }

    if input.starts_with("\\X2\\") || input.starts_with("\\X4\\") {
        let width = if bytes[2] == b'2' { 4 } else { 8 };
        let body_start = 4;
        let body_len = input[body_start..].find("\\X0\\")?;
        let body = &input[body_start..body_start + body_len];
        if body.len() % width != 0 {
            return None;
        }

        let mut units = Vec::with_capacity(body.len() / width);
        for chunk in body.as_bytes().chunks(width) {
            let hex = std::str::from_utf8(chunk).ok()?;
            units.push(u32::from_str_radix(hex, 16).ok()?);
        }

        if width == 4 {
            let utf16: Vec<u16> = units.iter().map(|&u| u as u16).collect();
            out.extend(char::decode_utf16(utf16).map(|r| r.unwrap_or('\u{FFFD}')));
        } else {
            out.extend(units.into_iter().map(|u| char::from_u32(u).unwrap_or('\u{FFFD}')));
        }
        return Some(body_start + body_len + 4);
    }

    if input.starts_with("\\X\\") && input.len() >= 5 {
        let code = u8::from_str_radix(input.get(3..5)?, 16).ok()?;
        out.push(code as char);
        return Some(5);
    }

    if input.starts_with("\\S\\") {
        let c = *bytes.get(3)?;
        if c.is_ascii() {
            out.push((c + 0x80) as char);
            return Some(4);
        }
        return None;
    }

    if input.starts_with("\\P") && bytes.get(3) == Some(&b'\\') {
        return Some(4);
    }

    None
}

fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

/// Encode text as the body of a STEP string literal.
///
/// Runs of BMP characters share one `\X2\` block; characters beyond the
/// BMP go into a `\X4\` block.
pub fn encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut pending: Vec<u32> = Vec::new();
    let mut wide = false;

    for ch in text.chars() {
        if ch.is_ascii() && !ch.is_ascii_control() {
            flush_run(&mut pending, wide, &mut out);
            match ch {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(ch),
            }
        } else {
            let is_wide = u32::from(ch) > 0xFFFF;
            if is_wide != wide {
                flush_run(&mut pending, wide, &mut out);
                wide = is_wide;
            }
            pending.push(u32::from(ch));
        }
    }
    flush_run(&mut pending, wide, &mut out);

    out
}

fn flush_run(pending: &mut Vec<u32>, wide: bool, out: &mut String) {
    if pending.is_empty() {
        return;
    }
    if wide {
        out.push_str("\\X4\\");
        for code in pending.drain(..) {
            out.push_str(&format!("{:08X}", code));
        }
    } else {
        out.push_str("\\X2\\");
        for code in pending.drain(..) {
            out.push_str(&format!("{:04X}", code));
        }
    }
    out.push_str("\\X0\\");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_is_untouched() {
        assert_eq!(decode("Pset_WallCommon"), "Pset_WallCommon");
        assert_eq!(encode("Pset_WallCommon"), "Pset_WallCommon");
    }

    #[test]
    fn decodes_quotes_and_backslashes() {
        assert_eq!(decode("it''s"), "it's");
        assert_eq!(decode("C:\\\\temp"), "C:\\temp");
        assert_eq!(encode("it's C:\\temp"), "it''s C:\\\\temp");
    }

    #[test]
    fn decodes_x2_blocks() {
        assert_eq!(decode("Gr\\X2\\00F8\\X0\\nn"), "Grønn");
        assert_eq!(decode("\\X2\\00C600D800C5\\X0\\"), "ÆØÅ");
    }

    #[test]
    fn decodes_iso_8859_directives() {
        assert_eq!(decode("Bl\\X\\E5"), "Blå");
        assert_eq!(decode("R\\S\\xd"), "Rød");
        assert_eq!(decode("\\PA\\abc"), "abc");
    }

    #[test]
    fn decodes_x4_blocks() {
        assert_eq!(decode("\\X4\\0001F600\\X0\\"), "\u{1F600}");
    }

    #[test]
    fn encodes_non_ascii_runs_as_x2() {
        assert_eq!(encode("Grønn"), "Gr\\X2\\00F8\\X0\\nn");
        assert_eq!(encode("basert på"), "basert p\\X2\\00E5\\X0\\");
    }

    #[test]
    fn encodes_astral_characters_as_x4() {
        assert_eq!(encode("\u{1F600}"), "\\X4\\0001F600\\X0\\");
        assert_eq!(
            encode("a\u{1F600}\u{1F601}ø"),
            "a\\X4\\0001F6000001F601\\X0\\\\X2\\00F8\\X0\\"
        );
        assert_eq!(decode(&encode("ø\u{1F600}å")), "ø\u{1F600}å");
    }

    #[test]
    fn encode_then_decode_preserves_text() {
        let text = "Farget med \"Rød\" basert på Pset.MMI=700.";
        assert_eq!(decode(&encode(text)), text);
    }

    #[test]
    fn malformed_directive_is_kept() {
        assert_eq!(decode("a\\X2\\00F"), "a\\X2\\00F");
    }
}
