//! PDF stream filters

use std::fmt;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::trace;

use crate::error::{PDFError, PDFResult};

/// PDF stream filters supported for encode and decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    ASCII85Decode,
    ASCIIHexDecode,
    FlateDecode,
    RunLengthDecode,
}

impl Filter {
    /// Create filter from name
    pub fn from_name(name: &str) -> PDFResult<Self> {
        match name {
            "ASCII85Decode" | "A85" => Ok(Filter::ASCII85Decode),
            "ASCIIHexDecode" | "AHx" => Ok(Filter::ASCIIHexDecode),
            "FlateDecode" | "Fl" => Ok(Filter::FlateDecode),
            "RunLengthDecode" | "RL" => Ok(Filter::RunLengthDecode),
            _ => Err(PDFError::UnsupportedFilter(name.to_string())),
        }
    }

    /// Name used for the `/Filter` entry
    pub fn name(&self) -> &'static str {
        match self {
            Filter::ASCII85Decode => "ASCII85Decode",
            Filter::ASCIIHexDecode => "ASCIIHexDecode",
            Filter::FlateDecode => "FlateDecode",
            Filter::RunLengthDecode => "RunLengthDecode",
        }
    }

    /// Decode data using this filter
    pub fn decode(&self, data: &[u8]) -> PDFResult<Vec<u8>> {
        trace!("Decoding {} bytes with {}", data.len(), self);
        match self {
            Filter::ASCII85Decode => decode_ascii85(data),
            Filter::ASCIIHexDecode => decode_ascii_hex(data),
            Filter::FlateDecode => decode_flate(data),
            Filter::RunLengthDecode => decode_run_length(data),
        }
    }

    /// Encode data using this filter
    pub fn encode(&self, data: &[u8]) -> PDFResult<Vec<u8>> {
        trace!("Encoding {} bytes with {}", data.len(), self);
        match self {
            Filter::ASCII85Decode => Ok(encode_ascii85(data)),
            Filter::ASCIIHexDecode => Ok(encode_ascii_hex(data)),
            Filter::FlateDecode => encode_flate(data),
            Filter::RunLengthDecode => Ok(encode_run_length(data)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ASCII85 Implementation
fn decode_ascii85(data: &[u8]) -> PDFResult<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() * 4 / 5);
    let mut value: u32 = 0;
    let mut count = 0;

    for &byte in data {
        match byte {
            b'z' if count == 0 => output.extend_from_slice(&[0, 0, 0, 0]),
            b'~' => break,
            b'\n' | b'\r' | b'\t' | b' ' | b'\x0c' | b'\0' => continue,
            b'!'..=b'u' => {
                value = value
                    .checked_mul(85)
                    .and_then(|v| v.checked_add((byte - b'!') as u32))
                    .ok_or_else(|| PDFError::InvalidData("ASCII85 group overflow".to_string()))?;
                count += 1;

                if count == 5 {
                    output.extend_from_slice(&value.to_be_bytes());
                    value = 0;
                    count = 0;
                }
            }
            _ => return Err(PDFError::InvalidData(
                format!("Invalid ASCII85 character: {}", byte)
            )),
        }
    }

    if count == 1 {
        return Err(PDFError::InvalidData("Truncated ASCII85 group".to_string()));
    }
    if count > 0 {
        let produced = count - 1;
        for _ in count..5 {
            value = value.wrapping_mul(85).wrapping_add(84);
        }
        output.extend_from_slice(&value.to_be_bytes()[..produced]);
    }

    Ok(output)
}

fn encode_ascii85(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() * 5 / 4 + 2);
    let mut buffer = [0u8; 4];

    for chunk in data.chunks(4) {
        buffer.fill(0);
        buffer[..chunk.len()].copy_from_slice(chunk);

        let value = u32::from_be_bytes(buffer);

        if value == 0 && chunk.len() == 4 {
            output.push(b'z');
            continue;
        }

        let mut digits = [0u8; 5];
        let mut temp = value;

        for digit in digits.iter_mut().rev() {
            *digit = (temp % 85) as u8 + b'!';
            temp /= 85;
        }

        output.extend_from_slice(&digits[..chunk.len() + 1]);
    }

    output.extend_from_slice(b"~>");
    output
}

// ASCIIHex Implementation
fn decode_ascii_hex(data: &[u8]) -> PDFResult<Vec<u8>> {
    let mut digits = Vec::with_capacity(data.len());

    for &byte in data {
        match byte {
            b'>' => break,
            b'\n' | b'\r' | b'\t' | b' ' | b'\x0c' | b'\0' => continue,
            b if b.is_ascii_hexdigit() => digits.push(b),
            _ => return Err(PDFError::InvalidData(
                format!("Invalid hex character: {}", byte)
            )),
        }
    }

    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }

    Ok(hex::decode(&digits)?)
}

fn encode_ascii_hex(data: &[u8]) -> Vec<u8> {
    let mut output = hex::encode_upper(data).into_bytes();
    output.push(b'>');
    output
}

// RunLength Implementation
fn decode_run_length(data: &[u8]) -> PDFResult<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() * 2);
    let mut i = 0;

    while i < data.len() {
        let length = data[i];
        i += 1;

        match length {
            128 => break,
            0..=127 => {
                let count = length as usize + 1;
                if i + count > data.len() {
                    return Err(PDFError::InvalidData(
                        "Invalid run length data".to_string()
                    ));
                }
                output.extend_from_slice(&data[i..i + count]);
                i += count;
            }
            _ => {
                let byte = *data.get(i).ok_or_else(|| {
                    PDFError::InvalidData("Invalid run length data".to_string())
                })?;
                let count = 257 - length as usize;
                output.extend(std::iter::repeat(byte).take(count));
                i += 1;
            }
        }
    }

    Ok(output)
}

fn encode_run_length(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() + data.len() / 128 + 1);
    let mut i = 0;

    while i < data.len() {
        let mut run_length = 1;
        while i + run_length < data.len() && data[i] == data[i + run_length] && run_length < 128 {
            run_length += 1;
        }

        if run_length >= 2 {
            output.push((257 - run_length) as u8);
            output.push(data[i]);
            i += run_length;
            continue;
        }

        // Literal run up to the next repeated pair
        let start = i;
        while i < data.len() && i - start < 128 {
            if i + 1 < data.len() && data[i] == data[i + 1] {
                break;
            }
            i += 1;
        }
        output.push((i - start - 1) as u8);
        output.extend_from_slice(&data[start..i]);
    }

    output.push(128);
    output
}

// Flate Implementation
fn decode_flate(data: &[u8]) -> PDFResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut output = Vec::with_capacity(data.len() * 2);
    decoder
        .read_to_end(&mut output)
        .map_err(|e| PDFError::InvalidData(format!("Flate stream: {}", e)))?;
    Ok(output)
}

fn encode_flate(data: &[u8]) -> PDFResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PDFError::CompressionError(e.to_string()))?;
    encoder.finish().map_err(|e| PDFError::CompressionError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Filter::ASCII85Decode)]
    #[case(Filter::ASCIIHexDecode)]
    #[case(Filter::FlateDecode)]
    #[case(Filter::RunLengthDecode)]
    fn test_filter_roundtrip(#[case] filter: Filter) -> PDFResult<()> {
        let original = b"aaaaaaaaaabcdefg\x00\x00\x00\x00zzzz Hello, World!";
        let encoded = filter.encode(original)?;
        assert_eq!(filter.decode(&encoded)?, original.to_vec());
        Ok(())
    }

    #[test]
    fn test_ascii85_known_value() -> PDFResult<()> {
        assert_eq!(encode_ascii85(b"Man "), b"9jqo^~>".to_vec());
        assert_eq!(decode_ascii85(b"9jqo^~>")?, b"Man ".to_vec());
        assert_eq!(decode_ascii85(b"z~>")?, vec![0, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_ascii_hex_decoding() -> PDFResult<()> {
        assert_eq!(decode_ascii_hex(b"48 65 6c 6C 6F>")?, b"Hello".to_vec());
        assert_eq!(decode_ascii_hex(b"7>")?, vec![0x70]);
        assert!(decode_ascii_hex(b"4G>").is_err());
        Ok(())
    }

    #[test]
    fn test_run_length_decoding() -> PDFResult<()> {
        // two literal bytes, then 'x' repeated four times, then EOD
        let encoded = [1, b'a', b'b', 253, b'x', 128];
        assert_eq!(decode_run_length(&encoded)?, b"abxxxx".to_vec());
        assert!(decode_run_length(&[5, b'a']).is_err());
        Ok(())
    }

    #[test]
    fn test_filter_names() -> PDFResult<()> {
        assert_eq!(Filter::from_name("FlateDecode")?, Filter::FlateDecode);
        assert_eq!(Filter::from_name("AHx")?, Filter::ASCIIHexDecode);
        assert!(matches!(
            Filter::from_name("JBIG2Decode"),
            Err(PDFError::UnsupportedFilter(_))
        ));
        assert_eq!(Filter::RunLengthDecode.to_string(), "RunLengthDecode");
        Ok(())
    }

    #[test]
    fn test_flate_rejects_garbage() {
        assert!(matches!(
            Filter::FlateDecode.decode(b"not zlib"),
            Err(PDFError::InvalidData(_))
        ));
    }
}
