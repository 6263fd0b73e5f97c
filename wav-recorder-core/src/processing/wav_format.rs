//! Canonical PCM RIFF/WAVE header encoding and parsing.
//!
//! The header is modelled as an ordered list of typed fields and encoded
//! explicitly little-endian, independent of any in-memory struct layout.

use std::io::Write;

use crate::models::audio_models::AudioFormat;
use crate::models::error::CaptureError;

/// Size of the canonical PCM WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Size of the PCM `fmt ` sub-chunk body.
const FMT_CHUNK_SIZE: u32 = 16;

/// Format tag for uncompressed integer PCM.
const PCM_FORMAT_TAG: u16 = 1;

/// One field of the header, in serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Tag([u8; 4]),
    U16(u16),
    U32(u32),
}

impl HeaderField {
    fn encoded_len(&self) -> usize {
        match self {
            Self::Tag(_) | Self::U32(_) => 4,
            Self::U16(_) => 2,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Self::Tag(tag) => out.extend_from_slice(tag),
            Self::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// Largest data chunk a RIFF header can describe.
pub const MAX_DATA_SIZE: u32 = u32::MAX - 36;

/// Header of a canonical 44-byte PCM WAV file.
///
/// Only constructed through [`WavHeader::new`], so every size field it
/// encodes is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    format: AudioFormat,
    data_size: u32,
}

impl WavHeader {
    pub fn new(format: AudioFormat, data_size: u32) -> Result<Self, CaptureError> {
        if data_size > MAX_DATA_SIZE {
            return Err(CaptureError::InvalidArgument(format!(
                "data size {} exceeds the WAV limit of {} bytes",
                data_size, MAX_DATA_SIZE
            )));
        }
        if format.checked_byte_rate().is_none() || format.checked_block_align().is_none() {
            return Err(CaptureError::InvalidArgument(format!(
                "{:?} has no representable byte rate or block align",
                format
            )));
        }
        Ok(Self { format, data_size })
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    /// RIFF chunk size: everything after the first 8 bytes.
    pub fn chunk_size(&self) -> u32 {
        36 + self.data_size
    }

    /// Layout:
    /// ```text
    /// [0-3]    "RIFF"
    /// [4-7]    chunk size = 36 + data_size
    /// [8-11]   "WAVE"
    /// [12-15]  "fmt "
    /// [16-19]  16 (PCM format chunk size)
    /// [20-21]  1 (PCM format code)
    /// [22-23]  channels
    /// [24-27]  sample_rate
    /// [28-31]  byte_rate = sample_rate * channels * bits_per_sample / 8
    /// [32-33]  block_align = channels * bits_per_sample / 8
    /// [34-35]  bits_per_sample
    /// [36-39]  "data"
    /// [40-43]  data_size
    /// ```
    pub fn fields(&self) -> [HeaderField; 13] {
        [
            HeaderField::Tag(*b"RIFF"),
            HeaderField::U32(self.chunk_size()),
            HeaderField::Tag(*b"WAVE"),
            HeaderField::Tag(*b"fmt "),
            HeaderField::U32(FMT_CHUNK_SIZE),
            HeaderField::U16(PCM_FORMAT_TAG),
            HeaderField::U16(self.format.channels),
            HeaderField::U32(self.format.sample_rate),
            HeaderField::U32(self.format.byte_rate()),
            HeaderField::U16(self.format.block_align()),
            HeaderField::U16(self.format.bits_per_sample),
            HeaderField::Tag(*b"data"),
            HeaderField::U32(self.data_size),
        ]
    }

    pub fn to_bytes(&self) -> [u8; WAV_HEADER_SIZE] {
        let fields = self.fields();
        let mut encoded = Vec::with_capacity(WAV_HEADER_SIZE);
        for field in &fields {
            field.write_to(&mut encoded);
        }
        debug_assert_eq!(
            fields.iter().map(HeaderField::encoded_len).sum::<usize>(),
            WAV_HEADER_SIZE
        );

        let mut header = [0u8; WAV_HEADER_SIZE];
        header.copy_from_slice(&encoded);
        header
    }
}

/// Write the 44-byte header for `data_size` bytes of PCM in the given layout.
pub fn write_header<W: Write>(
    sink: &mut W,
    sample_rate: u32,
    bits_per_sample: u16,
    channels: u16,
    data_size: u32,
) -> Result<(), CaptureError> {
    let format = AudioFormat {
        sample_rate,
        bits_per_sample,
        channels,
    };
    let header = WavHeader::new(format, data_size)?;
    sink.write_all(&header.to_bytes())
        .map_err(|e| CaptureError::StorageError(format!("failed to write WAV header: {}", e)))
}

/// Append raw sample bytes directly after the header. No padding, no framing.
pub fn write_data<W: Write>(sink: &mut W, data: &[u8]) -> Result<(), CaptureError> {
    sink.write_all(data)
        .map_err(|e| CaptureError::StorageError(format!("failed to write audio data: {}", e)))
}

/// Parse a canonical PCM header back out of the first 44 bytes of `bytes`.
pub fn parse_header(bytes: &[u8]) -> Result<WavHeader, CaptureError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(CaptureError::InvalidWav(format!(
            "header needs {} bytes, got {}",
            WAV_HEADER_SIZE,
            bytes.len()
        )));
    }

    let tag = |offset: usize| &bytes[offset..offset + 4];
    let u16_at = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
    let u32_at = |offset: usize| {
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    };

    for (offset, expected) in [(0, b"RIFF"), (8, b"WAVE"), (12, b"fmt "), (36, b"data")] {
        if tag(offset) != expected {
            return Err(CaptureError::InvalidWav(format!(
                "expected {:?} at offset {}",
                String::from_utf8_lossy(expected),
                offset
            )));
        }
    }

    if u32_at(16) != FMT_CHUNK_SIZE {
        return Err(CaptureError::InvalidWav(format!("fmt chunk size {} is not 16", u32_at(16))));
    }
    if u16_at(20) != PCM_FORMAT_TAG {
        return Err(CaptureError::InvalidWav(format!("format tag {} is not PCM", u16_at(20))));
    }

    let format = AudioFormat {
        channels: u16_at(22),
        sample_rate: u32_at(24),
        bits_per_sample: u16_at(34),
    };
    if format.checked_byte_rate() != Some(u32_at(28)) || format.checked_block_align() != Some(u16_at(32)) {
        return Err(CaptureError::InvalidWav("byte rate or block align disagrees with format".into()));
    }

    let header = WavHeader::new(format, u32_at(40)).map_err(|e| CaptureError::InvalidWav(e.to_string()))?;
    if u32_at(4) != header.chunk_size() {
        return Err(CaptureError::InvalidWav(format!(
            "chunk size {} does not match data size {}",
            u32_at(4),
            header.data_size
        )));
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    fn read_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    #[test]
    fn header_magic_and_pcm_fields() {
        let header = WavHeader::new(AudioFormat::CD_STEREO, 0).unwrap().to_bytes();
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
        assert_eq!(read_u32(&header, 16), 16);
        assert_eq!(read_u16(&header, 20), 1);
    }

    #[test]
    fn one_second_cd_stereo() {
        let mut file = Vec::new();
        let data = vec![0u8; 176_400];
        write_header(&mut file, 44100, 16, 2, data.len() as u32).unwrap();
        write_data(&mut file, &data).unwrap();

        assert_eq!(file.len(), 176_444);
        assert_eq!(read_u32(&file, 4), 176_436);
        assert_eq!(read_u16(&file, 22), 2);
        assert_eq!(read_u32(&file, 24), 44100);
        assert_eq!(read_u32(&file, 28), 176_400);
        assert_eq!(read_u16(&file, 32), 4);
        assert_eq!(read_u16(&file, 34), 16);
        assert_eq!(read_u32(&file, 40), 176_400);
    }

    #[test]
    fn size_fields_track_data_length() {
        let formats = [
            AudioFormat::CD_STEREO,
            AudioFormat { sample_rate: 8000, bits_per_sample: 8, channels: 1 },
            AudioFormat { sample_rate: 48000, bits_per_sample: 24, channels: 6 },
        ];
        for format in formats {
            for data_size in [0usize, 1, 4, 1000, 48_000] {
                let mut file = Vec::new();
                write_header(&mut file, format.sample_rate, format.bits_per_sample, format.channels, data_size as u32)
                    .unwrap();
                write_data(&mut file, &vec![0x5Au8; data_size]).unwrap();

                assert_eq!(file.len(), WAV_HEADER_SIZE + data_size);
                assert_eq!(read_u32(&file, 4), 36 + data_size as u32);
                assert_eq!(read_u32(&file, 40), data_size as u32);
            }
        }
    }

    #[test]
    fn data_follows_header_unframed() {
        let mut file = Vec::new();
        write_header(&mut file, 44100, 16, 2, 4).unwrap();
        write_data(&mut file, &[1, 2, 3, 4]).unwrap();
        assert_eq!(&file[44..], &[1, 2, 3, 4]);
    }

    #[test]
    fn parse_recovers_written_parameters() {
        let format = AudioFormat { sample_rate: 22050, bits_per_sample: 16, channels: 1 };
        let bytes = WavHeader::new(format, 1234).unwrap().to_bytes();
        let parsed = parse_header(&bytes).unwrap();
        assert_eq!(parsed.format(), format);
        assert_eq!(parsed.data_size(), 1234);
    }

    #[test]
    fn parse_rejects_short_input() {
        assert!(matches!(parse_header(&[0u8; 20]), Err(CaptureError::InvalidWav(_))));
    }

    #[test]
    fn parse_rejects_bad_magic() {
        let mut bytes = WavHeader::new(AudioFormat::CD_STEREO, 8).unwrap().to_bytes();
        bytes[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(parse_header(&bytes), Err(CaptureError::InvalidWav(_))));
    }

    #[test]
    fn parse_rejects_inconsistent_derived_fields() {
        let mut bytes = WavHeader::new(AudioFormat::CD_STEREO, 8).unwrap().to_bytes();
        bytes[28..32].copy_from_slice(&1u32.to_le_bytes());
        assert!(parse_header(&bytes).is_err());

        let mut bytes = WavHeader::new(AudioFormat::CD_STEREO, 8).unwrap().to_bytes();
        bytes[4..8].copy_from_slice(&0u32.to_le_bytes());
        assert!(parse_header(&bytes).is_err());
    }

    #[test]
    fn parse_rejects_overflowing_format_fields() {
        let mut bytes = WavHeader::new(AudioFormat::CD_STEREO, 8).unwrap().to_bytes();
        bytes[22..24].copy_from_slice(&u16::MAX.to_le_bytes());
        bytes[34..36].copy_from_slice(&u16::MAX.to_le_bytes());
        assert!(matches!(parse_header(&bytes), Err(CaptureError::InvalidWav(_))));

        let mut bytes = WavHeader::new(AudioFormat::CD_STEREO, 8).unwrap().to_bytes();
        bytes[24..28].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(parse_header(&bytes), Err(CaptureError::InvalidWav(_))));
    }

    #[test]
    fn parse_rejects_unrepresentable_data_size() {
        let mut bytes = WavHeader::new(AudioFormat::CD_STEREO, 8).unwrap().to_bytes();
        bytes[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        bytes[40..44].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(parse_header(&bytes), Err(CaptureError::InvalidWav(_))));
    }

    #[test]
    fn data_size_limit_boundary() {
        let header = WavHeader::new(AudioFormat::CD_STEREO, MAX_DATA_SIZE).unwrap();
        assert_eq!(header.chunk_size(), u32::MAX);
        assert_eq!(read_u32(&header.to_bytes(), 4), u32::MAX);

        assert!(matches!(
            WavHeader::new(AudioFormat::CD_STEREO, MAX_DATA_SIZE + 1),
            Err(CaptureError::InvalidArgument(_))
        ));
        let mut sink = Vec::new();
        assert!(matches!(
            write_header(&mut sink, 44100, 16, 2, u32::MAX),
            Err(CaptureError::InvalidArgument(_))
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn write_header_rejects_overflowing_format() {
        let mut sink = Vec::new();
        assert!(matches!(
            write_header(&mut sink, u32::MAX, u16::MAX, u16::MAX, 0),
            Err(CaptureError::InvalidArgument(_))
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn hound_reads_generated_file() {
        let mut file = Vec::new();
        let samples: Vec<i16> = vec![0, 1000, -1000, i16::MAX, i16::MIN, 7];
        let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        write_header(&mut file, 44100, 16, 2, data.len() as u32).unwrap();
        write_data(&mut file, &data).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(file)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }
}
