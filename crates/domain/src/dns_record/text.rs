//! Tokenizer for record data in presentation (zone file) form.

use crate::errors::DomainError;
use std::fmt;

pub(crate) const MAX_CHARACTER_STRING: usize = 255;

/// One whitespace-separated token. `raw` keeps escapes intact (domain names
/// are parsed from it), `value` holds the unescaped octets.
#[derive(Debug)]
pub(crate) struct Token {
    pub raw: String,
    pub value: Vec<u8>,
}

fn invalid(reason: impl Into<String>) -> DomainError {
    DomainError::InvalidRecordData(reason.into())
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, DomainError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            break;
        };

        let quoted = first == '"';
        if quoted {
            chars.next();
        }

        let mut raw = String::new();
        let mut value = Vec::new();
        let mut closed = !quoted;

        while let Some(c) = chars.next() {
            match c {
                '"' if quoted => {
                    closed = true;
                    break;
                }
                c if !quoted && c.is_whitespace() => break,
                '\\' => {
                    raw.push('\\');
                    let next = chars.next().ok_or_else(|| invalid("dangling escape"))?;
                    raw.push(next);
                    if let Some(first_digit) = next.to_digit(10) {
                        let mut octet = first_digit;
                        for _ in 0..2 {
                            let digit = chars
                                .next()
                                .filter(char::is_ascii_digit)
                                .ok_or_else(|| invalid("escape requires three decimal digits"))?;
                            raw.push(digit);
                            octet = octet * 10 + digit.to_digit(10).unwrap_or(0);
                        }
                        if octet > 255 {
                            return Err(invalid("escape value above 255"));
                        }
                        value.push(octet as u8);
                    } else {
                        push_char(&mut value, next);
                    }
                }
                c => {
                    raw.push(c);
                    push_char(&mut value, c);
                }
            }
        }

        if !closed {
            return Err(invalid("unterminated quoted string"));
        }
        tokens.push(Token { raw, value });
    }

    Ok(tokens)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

pub(crate) fn character_string(token: Token) -> Result<Vec<u8>, DomainError> {
    if token.value.len() > MAX_CHARACTER_STRING {
        return Err(invalid(format!(
            "character-string exceeds {} octets",
            MAX_CHARACTER_STRING
        )));
    }
    Ok(token.value)
}

/// Writes a character-string in quoted presentation form.
pub(crate) fn write_character_string(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("\"")?;
    for &b in bytes {
        match b {
            b'"' | b'\\' => write!(f, "\\{}", b as char)?,
            0x20..=0x7e => write!(f, "{}", b as char)?,
            _ => write!(f, "\\{:03}", b)?,
        }
    }
    f.write_str("\"")
}

pub(crate) fn parse_hex(input: &str) -> Result<Vec<u8>, DomainError> {
    if input.len() % 2 != 0 {
        return Err(invalid("odd number of hex digits"));
    }
    (0..input.len())
        .step_by(2)
        .map(|i| {
            input
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| invalid(format!("invalid hex digits in {:?}", input)))
        })
        .collect()
}
