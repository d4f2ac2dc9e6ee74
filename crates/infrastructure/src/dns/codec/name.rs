use super::reader::WireReader;
use bytes::{BufMut, BytesMut};
use meridian_dns_domain::domain_name::MAX_NAME_LEN;
use meridian_dns_domain::{Domain, DomainError, Label};
use rustc_hash::FxHashMap;

const POINTER_MASK: u8 = 0xC0;
const MAX_POINTER_OFFSET: usize = 0x3FFF;

fn malformed(reason: impl Into<String>) -> DomainError {
    DomainError::Format(reason.into())
}

/// Reads a possibly compressed name (RFC 1035 §4.1.4).
///
/// The first pointer must target an offset below its own position and every
/// later pointer an offset below the previous target, so decoding always
/// terminates.
pub fn read_name(reader: &mut WireReader<'_>) -> Result<Domain, DomainError> {
    let packet = reader.packet();
    let mut labels: Vec<Label> = Vec::new();
    let mut wire_len = 1;
    // Read position inside `packet` once a pointer has been followed.
    let mut cursor: Option<usize> = None;
    let mut last_target: Option<usize> = None;

    loop {
        let len_pos = cursor.unwrap_or_else(|| reader.position());
        let len = next_octet(reader, &mut cursor)?;

        match len & POINTER_MASK {
            0x00 if len == 0 => break,
            0x00 => {
                let len = len as usize;
                let bytes = match cursor {
                    None => reader.read_bytes(len)?,
                    Some(pos) => {
                        let bytes = packet
                            .get(pos..pos + len)
                            .ok_or_else(|| malformed("label past end of message"))?;
                        cursor = Some(pos + len);
                        bytes
                    }
                };
                wire_len += len + 1;
                if wire_len > MAX_NAME_LEN {
                    return Err(malformed(format!("name exceeds {} octets", MAX_NAME_LEN)));
                }
                labels.push(Label::new(bytes).map_err(|e| malformed(e.to_string()))?);
            }
            POINTER_MASK => {
                let low = next_octet(reader, &mut cursor)?;
                let target = (((len & !POINTER_MASK) as usize) << 8) | low as usize;
                let bound = last_target.unwrap_or(len_pos);
                if target >= bound {
                    return Err(malformed(format!(
                        "compression pointer at offset {} does not point backward",
                        len_pos
                    )));
                }
                last_target = Some(target);
                cursor = Some(target);
            }
            _ => return Err(malformed(format!("unsupported label type 0x{:02x}", len))),
        }
    }

    Domain::from_labels(labels).map_err(|e| malformed(e.to_string()))
}

fn next_octet(reader: &mut WireReader<'_>, cursor: &mut Option<usize>) -> Result<u8, DomainError> {
    match cursor {
        None => reader.read_u8(),
        Some(pos) => {
            let b = *reader
                .packet()
                .get(*pos)
                .ok_or_else(|| malformed("compression pointer past end of message"))?;
            *pos += 1;
            Ok(b)
        }
    }
}

/// Writes `name` without compression.
pub fn write_name(buf: &mut BytesMut, name: &Domain) {
    for label in name.labels() {
        buf.put_u8(label.len() as u8);
        buf.put_slice(label.as_bytes());
    }
    buf.put_u8(0);
}

/// Remembers where each written name suffix starts so later names can point at it.
#[derive(Debug, Default)]
pub struct NameCompressor {
    offsets: FxHashMap<Domain, u16>,
}

impl NameCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `name`, replacing the longest already-written suffix with a pointer.
    pub fn write(&mut self, buf: &mut BytesMut, name: &Domain) {
        let mut suffix = name.clone();
        while !suffix.is_root() {
            if let Some(&offset) = self.offsets.get(&suffix) {
                buf.put_u16(0xC000 | offset);
                return;
            }
            let start = buf.len();
            if start <= MAX_POINTER_OFFSET {
                self.offsets.insert(suffix.clone(), start as u16);
            }
            let label = &suffix.labels()[0];
            buf.put_u8(label.len() as u8);
            buf.put_slice(label.as_bytes());
            suffix = match suffix.parent() {
                Some(parent) => parent,
                None => break,
            };
        }
        buf.put_u8(0);
    }
}
