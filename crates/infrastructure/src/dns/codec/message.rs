//! Query encoding and response decoding (RFC 1035 §4.1).

use super::name::{read_name, write_name, NameCompressor};
use super::reader::WireReader;
use super::record::{read_record, write_record};
use bytes::{BufMut, BytesMut};
use meridian_dns_domain::{
    Answer, AnswerBuilder, AnswerFlags, DomainError, Query, QueryFlags, RecordClass, RecordType,
    ResultCode,
};

pub const HEADER_LEN: usize = 12;

pub const FLAG_QR: u16 = 0x8000;
pub const FLAG_AA: u16 = 0x0400;
pub const FLAG_TC: u16 = 0x0200;
pub const FLAG_RD: u16 = 0x0100;
pub const FLAG_RA: u16 = 0x0080;
pub const RCODE_MASK: u16 = 0x000F;

/// Outcome of inspecting one inbound datagram.
#[derive(Debug)]
pub enum Disposition {
    /// The datagram answers the outstanding query.
    Complete(Answer),
    /// Not ours (stale id, not a response, foreign question); keep listening.
    Ignore(&'static str),
}

/// Encodes a standard query: opcode 0, RD unless `NO_RECURSION`, one question.
pub fn encode_query(id: u16, query: &Query) -> BytesMut {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + query.domain.wire_len() + 4);
    let flags = if query.has_flag(QueryFlags::NO_RECURSION) {
        0
    } else {
        FLAG_RD
    };

    buf.put_u16(id);
    buf.put_u16(flags);
    buf.put_u16(1);
    buf.put_u16(0);
    buf.put_u16(0);
    buf.put_u16(0);

    write_name(&mut buf, &query.domain);
    buf.put_u16(query.record_type.to_u16());
    buf.put_u16(query.class.to_u16());
    buf
}

/// Decodes a datagram received for `query` under transaction `expected_id`.
///
/// Truncated responses complete with FORMAT_ERROR. Any underrun or malformed
/// field is returned as `DomainError::Format`.
pub fn decode_response(
    packet: &[u8],
    expected_id: u16,
    query: &Query,
    received_at_millis: u64,
) -> Result<Disposition, DomainError> {
    let mut reader = WireReader::new(packet);

    if packet.len() < 2 {
        return Ok(Disposition::Ignore("datagram too short for a transaction id"));
    }
    if reader.read_u16()? != expected_id {
        return Ok(Disposition::Ignore("transaction id mismatch"));
    }
    let flags = reader.read_u16()?;
    if flags & FLAG_QR == 0 {
        return Ok(Disposition::Ignore("not a response"));
    }
    let qdcount = reader.read_u16()?;
    let ancount = reader.read_u16()?;
    let nscount = reader.read_u16()?;
    let arcount = reader.read_u16()?;
    if qdcount != 1 {
        return Ok(Disposition::Ignore("question count is not 1"));
    }

    if flags & FLAG_TC != 0 {
        let answer = AnswerBuilder::new()
            .result_code(ResultCode::FormatError)
            .flag(AnswerFlags::TRUNCATED)
            .build();
        return Ok(Disposition::Complete(answer));
    }

    let qname = read_name(&mut reader)?;
    let qtype = RecordType::from_u16(reader.read_u16()?);
    let qclass = RecordClass::from_u16(reader.read_u16()?);
    if qname != query.domain || qtype != query.record_type || qclass != query.class {
        return Ok(Disposition::Ignore("question does not match query"));
    }

    let rcode = ResultCode::from_u8((flags & RCODE_MASK) as u8);
    let mut builder = AnswerBuilder::new().result_code(rcode);
    for (bit, flag) in [
        (FLAG_AA, AnswerFlags::AUTHORITATIVE),
        (FLAG_RD, AnswerFlags::RECURSION_DESIRED),
        (FLAG_RA, AnswerFlags::RECURSION_AVAILABLE),
    ] {
        if flags & bit != 0 {
            builder = builder.flag(flag);
        }
    }

    for _ in 0..ancount {
        builder = builder.answer(read_record(&mut reader, received_at_millis)?);
    }
    for _ in 0..nscount {
        builder = builder.authority(read_record(&mut reader, received_at_millis)?);
    }
    for _ in 0..arcount {
        builder = builder.additional(read_record(&mut reader, received_at_millis)?);
    }

    Ok(Disposition::Complete(builder.build()))
}

/// Encodes a full response message with name compression.
///
/// `flags` is written verbatim (QR, AA, TC, RCODE, ...), so callers control
/// every header bit.
pub fn encode_response(
    id: u16,
    flags: u16,
    query: &Query,
    answer: &Answer,
    now_millis: u64,
) -> BytesMut {
    let mut buf = BytesMut::with_capacity(512);
    buf.put_u16(id);
    buf.put_u16(flags);
    buf.put_u16(1);
    buf.put_u16(answer.answer_records().len() as u16);
    buf.put_u16(answer.authority_records().len() as u16);
    buf.put_u16(answer.additional_records().len() as u16);

    let mut compressor = NameCompressor::new();
    compressor.write(&mut buf, &query.domain);
    buf.put_u16(query.record_type.to_u16());
    buf.put_u16(query.class.to_u16());

    for record in answer.records() {
        write_record(&mut buf, record, &mut compressor, now_millis);
    }
    buf
}
