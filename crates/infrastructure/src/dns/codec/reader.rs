use meridian_dns_domain::DomainError;

/// Bounds-checked big-endian cursor over a received message.
///
/// A reader may be narrowed to a sub-view (`sub_reader`) for RDATA; the
/// sub-view keeps a handle to the whole packet so compression pointers can
/// still reach earlier names.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    packet: &'a [u8],
    pos: usize,
    end: usize,
}

fn underrun(what: &str) -> DomainError {
    DomainError::Format(format!("buffer underrun reading {}", what))
}

impl<'a> WireReader<'a> {
    pub fn new(packet: &'a [u8]) -> Self {
        Self {
            packet,
            pos: 0,
            end: packet.len(),
        }
    }

    #[inline]
    pub fn packet(&self) -> &'a [u8] {
        self.packet
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.end
    }

    pub fn read_u8(&mut self) -> Result<u8, DomainError> {
        Ok(self.read_bytes(1).map_err(|_| underrun("u8"))?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DomainError> {
        let b = self.read_bytes(2).map_err(|_| underrun("u16"))?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, DomainError> {
        let b = self.read_bytes(4).map_err(|_| underrun("u32"))?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DomainError> {
        if self.remaining() < len {
            return Err(underrun(&format!("{} octets", len)));
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.packet[start..self.pos])
    }

    pub fn read_rest(&mut self) -> &'a [u8] {
        let start = self.pos;
        self.pos = self.end;
        &self.packet[start..self.end]
    }

    /// Splits off the next `len` octets as their own reader and skips past them.
    pub fn sub_reader(&mut self, len: usize) -> Result<WireReader<'a>, DomainError> {
        if self.remaining() < len {
            return Err(underrun("record data"));
        }
        let sub = WireReader {
            packet: self.packet,
            pos: self.pos,
            end: self.pos + len,
        };
        self.pos += len;
        Ok(sub)
    }
}
