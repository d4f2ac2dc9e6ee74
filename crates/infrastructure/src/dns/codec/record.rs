//! Resource record (de)serialization with a type-code indexed decoder table.

use super::name::{read_name, NameCompressor};
use super::reader::WireReader;
use bytes::{BufMut, BytesMut};
use meridian_dns_domain::{
    DomainError, Record, RecordClass, RecordData, RecordType, Soa, TtlSpec, WksProtocol,
};
use std::net::{Ipv4Addr, Ipv6Addr};

type RecordDecoder = fn(&mut WireReader<'_>) -> Result<RecordData, DomainError>;

const DECODERS: &[(RecordType, RecordDecoder)] = &[
    (RecordType::A, decode_a),
    (RecordType::NS, decode_ns),
    (RecordType::CNAME, decode_cname),
    (RecordType::SOA, decode_soa),
    (RecordType::WKS, decode_wks),
    (RecordType::PTR, decode_ptr),
    (RecordType::HINFO, decode_hinfo),
    (RecordType::MX, decode_mx),
    (RecordType::TXT, decode_txt),
    (RecordType::AAAA, decode_aaaa),
];

fn decoder_for(record_type: RecordType) -> Option<RecordDecoder> {
    DECODERS
        .iter()
        .find(|(rt, _)| *rt == record_type)
        .map(|(_, decoder)| *decoder)
}

/// Reads one resource record. The wire TTL is anchored at `received_at_millis`.
pub fn read_record(
    reader: &mut WireReader<'_>,
    received_at_millis: u64,
) -> Result<Record, DomainError> {
    let name = read_name(reader)?;
    let record_type = RecordType::from_u16(reader.read_u16()?);
    let class = RecordClass::from_u16(reader.read_u16()?);
    let ttl = reader.read_u32()?;
    let rdlength = reader.read_u16()? as usize;
    let mut rdata = reader.sub_reader(rdlength)?;

    let data = match decoder_for(record_type) {
        Some(decode) => {
            let data = decode(&mut rdata)?;
            if !rdata.is_empty() {
                return Err(DomainError::Format(format!(
                    "{} octets of trailing {} record data",
                    rdata.remaining(),
                    record_type
                )));
            }
            data
        }
        None => RecordData::Unknown {
            record_type,
            data: rdata.read_rest().to_vec(),
        },
    };

    Ok(Record::new(
        name,
        class,
        TtlSpec::from_receipt(received_at_millis, ttl),
        data,
    ))
}

fn decode_a(r: &mut WireReader<'_>) -> Result<RecordData, DomainError> {
    let b = r.read_bytes(4)?;
    Ok(RecordData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3])))
}

fn decode_ns(r: &mut WireReader<'_>) -> Result<RecordData, DomainError> {
    read_name(r).map(RecordData::Ns)
}

fn decode_cname(r: &mut WireReader<'_>) -> Result<RecordData, DomainError> {
    read_name(r).map(RecordData::Cname)
}

fn decode_ptr(r: &mut WireReader<'_>) -> Result<RecordData, DomainError> {
    read_name(r).map(RecordData::Ptr)
}

fn decode_aaaa(r: &mut WireReader<'_>) -> Result<RecordData, DomainError> {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(r.read_bytes(16)?);
    Ok(RecordData::Aaaa(Ipv6Addr::from(octets)))
}

fn decode_mx(r: &mut WireReader<'_>) -> Result<RecordData, DomainError> {
    let preference = r.read_u16()?;
    let exchange = read_name(r)?;
    Ok(RecordData::Mx {
        preference,
        exchange,
    })
}

fn decode_soa(r: &mut WireReader<'_>) -> Result<RecordData, DomainError> {
    Ok(RecordData::Soa(Soa {
        mname: read_name(r)?,
        rname: read_name(r)?,
        serial: r.read_u32()?,
        refresh: r.read_u32()?,
        retry: r.read_u32()?,
        expire: r.read_u32()?,
        minimum: r.read_u32()?,
    }))
}

fn read_character_string(r: &mut WireReader<'_>) -> Result<Vec<u8>, DomainError> {
    let len = r.read_u8()? as usize;
    Ok(r.read_bytes(len)?.to_vec())
}

fn decode_txt(r: &mut WireReader<'_>) -> Result<RecordData, DomainError> {
    let mut strings = Vec::new();
    while !r.is_empty() {
        strings.push(read_character_string(r)?);
    }
    if strings.is_empty() {
        return Err(DomainError::Format("empty TXT record".to_string()));
    }
    Ok(RecordData::Txt(strings))
}

fn decode_hinfo(r: &mut WireReader<'_>) -> Result<RecordData, DomainError> {
    Ok(RecordData::Hinfo {
        cpu: read_character_string(r)?,
        os: read_character_string(r)?,
    })
}

fn decode_wks(r: &mut WireReader<'_>) -> Result<RecordData, DomainError> {
    let b = r.read_bytes(4)?;
    let address = Ipv4Addr::new(b[0], b[1], b[2], b[3]);
    let protocol = WksProtocol::from_u8(r.read_u8()?);
    let ports = r
        .read_rest()
        .iter()
        .enumerate()
        .flat_map(|(i, byte)| {
            (0..8u16)
                .filter(move |bit| byte & (0x80 >> bit) != 0)
                .map(move |bit| i as u16 * 8 + bit)
        })
        .collect();
    Ok(RecordData::Wks {
        address,
        protocol,
        ports,
    })
}

/// Writes `record` with its remaining TTL at `now_millis`.
pub fn write_record(
    buf: &mut BytesMut,
    record: &Record,
    compressor: &mut NameCompressor,
    now_millis: u64,
) {
    compressor.write(buf, record.name());
    buf.put_u16(record.record_type().to_u16());
    buf.put_u16(record.class().to_u16());
    buf.put_u32(record.ttl().remaining_at(now_millis));

    let length_at = buf.len();
    buf.put_u16(0);
    write_record_data(buf, record.data(), compressor);
    let rdlength = (buf.len() - length_at - 2) as u16;
    buf[length_at..length_at + 2].copy_from_slice(&rdlength.to_be_bytes());
}

fn write_character_string(buf: &mut BytesMut, s: &[u8]) {
    buf.put_u8(s.len() as u8);
    buf.put_slice(s);
}

fn write_record_data(buf: &mut BytesMut, data: &RecordData, compressor: &mut NameCompressor) {
    match data {
        RecordData::A(v4) => buf.put_slice(&v4.octets()),
        RecordData::Aaaa(v6) => buf.put_slice(&v6.octets()),
        RecordData::Cname(name) | RecordData::Ns(name) | RecordData::Ptr(name) => {
            compressor.write(buf, name)
        }
        RecordData::Mx {
            preference,
            exchange,
        } => {
            buf.put_u16(*preference);
            compressor.write(buf, exchange);
        }
        RecordData::Soa(soa) => {
            compressor.write(buf, &soa.mname);
            compressor.write(buf, &soa.rname);
            buf.put_u32(soa.serial);
            buf.put_u32(soa.refresh);
            buf.put_u32(soa.retry);
            buf.put_u32(soa.expire);
            buf.put_u32(soa.minimum);
        }
        RecordData::Txt(strings) => {
            for s in strings {
                write_character_string(buf, s);
            }
        }
        RecordData::Hinfo { cpu, os } => {
            write_character_string(buf, cpu);
            write_character_string(buf, os);
        }
        RecordData::Wks {
            address,
            protocol,
            ports,
        } => {
            buf.put_slice(&address.octets());
            buf.put_u8(protocol.to_u8());
            let mut bitmap = vec![0u8; ports.iter().max().map_or(0, |p| *p as usize / 8 + 1)];
            for port in ports {
                bitmap[*port as usize / 8] |= 0x80 >> (port % 8);
            }
            buf.put_slice(&bitmap);
        }
        RecordData::Unknown { data, .. } => buf.put_slice(data),
    }
}
