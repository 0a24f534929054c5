//! Escape decoding for the literal match-data token of a rule.
//!
//! Decoding is an ordered list of independent rewrite passes over the whole
//! token, not a single-pass escape grammar. Overlapping interpretations
//! resolve by pass order: `\\101` first collapses to `\101`, which the
//! octal pass then turns into `A`. The passes, in order:
//!
//! 1. `\ ` becomes a space
//! 2. `\\` becomes a backslash
//! 3. `\NNN` (one to three octal digits) becomes that byte
//! 4. `\xNN` (one or two hex digits) becomes that byte
//! 5. `0xH...H` becomes its decimal value as a string, so `0xffd8`
//!    compares equal to a big-endian short read of `FF D8`
//!
//! The result is a byte string: octal and hex escapes denote raw bytes,
//! which need not be valid UTF-8.

/// Decodes a raw match-data token into the byte string it stands for.
pub fn decode(raw: &str) -> Vec<u8> {
    let mut data = replace(raw.as_bytes(), b"\\ ", b" ");
    data = replace(&data, b"\\\\", b"\\");
    data = rewrite_octal(&data);
    data = rewrite_hex_escapes(&data);
    rewrite_hex_literals(&data)
}

fn replace(input: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(input[i]);
            i += 1;
        }
    }
    out
}

fn rewrite_octal(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'\\' {
            let digits = input[i + 1..]
                .iter()
                .take(3)
                .take_while(|b| (b'0'..=b'7').contains(*b))
                .count();
            if digits > 0 {
                let mut value = 0u32;
                for d in &input[i + 1..i + 1 + digits] {
                    value = value * 8 + u32::from(d - b'0');
                }
                // Three octal digits can reach 0o777; wrap to a byte.
                out.push((value & 0xff) as u8);
                i += 1 + digits;
                continue;
            }
        }
        out.push(input[i]);
        i += 1;
    }
    out
}

fn rewrite_hex_escapes(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'\\' && input.get(i + 1) == Some(&b'x') {
            let digits = input[i + 2..]
                .iter()
                .take(2)
                .take_while(|b| b.is_ascii_hexdigit())
                .count();
            if digits > 0 {
                let mut value = 0u32;
                for d in &input[i + 2..i + 2 + digits] {
                    value = value * 16 + u32::from((*d as char).to_digit(16).unwrap_or(0));
                }
                out.push(value as u8);
                i += 2 + digits;
                continue;
            }
        }
        out.push(input[i]);
        i += 1;
    }
    out
}

fn rewrite_hex_literals(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'0' && input.get(i + 1) == Some(&b'x') {
            let digits = input[i + 2..]
                .iter()
                .take_while(|b| b.is_ascii_hexdigit())
                .count();
            let run = std::str::from_utf8(&input[i + 2..i + 2 + digits]).ok();
            if let Some(value) = run.and_then(|hex| u64::from_str_radix(hex, 16).ok()) {
                out.extend_from_slice(value.to_string().as_bytes());
                i += 2 + digits;
                continue;
            }
        }
        out.push(input[i]);
        i += 1;
    }
    out
}
