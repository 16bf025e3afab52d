//! WAV container synthesis for raw interleaved PCM captures.
//!
//! Produces a standard 44-byte RIFF header followed by the PCM payload
//! verbatim. The raw audio file written during capture has no framing, so
//! this is all that is needed to make it playable.

use crate::models::error::CaptureError;
use crate::models::profile::AudioFormat;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Largest payload whose size still fits the 32-bit RIFF chunk size field.
pub const MAX_WAV_DATA_SIZE: u64 = u32::MAX as u64 - 36;

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * block_align
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// Fails when the block align or byte rate do not fit their header fields,
/// or when `data_size` leaves no room for the chunk size.
pub fn generate_wav_header(
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
    data_size: u32,
) -> Result<[u8; WAV_HEADER_SIZE], CaptureError> {
    let block_align = u16::try_from(u32::from(channels) * u32::from(bit_depth) / 8).map_err(|_| {
        CaptureError::Config(format!(
            "block align of {} channels at {} bits exceeds the WAV field",
            channels, bit_depth
        ))
    })?;
    let byte_rate = sample_rate.checked_mul(u32::from(block_align)).ok_or_else(|| {
        CaptureError::Config(format!(
            "byte rate of {} Hz x {} bytes exceeds the WAV field",
            sample_rate, block_align
        ))
    })?;
    let chunk_size = data_size.checked_add(36).ok_or_else(|| {
        CaptureError::Storage(format!("audio payload of {} bytes exceeds the WAV size limit", data_size))
    })?;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    Ok(header)
}

/// Build a complete WAV file from raw interleaved PCM.
///
/// The output is exactly `WAV_HEADER_SIZE + pcm.len()` bytes. An empty
/// payload yields a well-formed header-only file. Payloads too large for
/// the 32-bit size fields are rejected, as are formats a capture profile
/// would not accept.
pub fn build_wav(pcm: &[u8], format: &AudioFormat) -> Result<Vec<u8>, CaptureError> {
    format.validate().map_err(CaptureError::Config)?;
    if pcm.len() as u64 > MAX_WAV_DATA_SIZE {
        return Err(CaptureError::Storage(format!(
            "audio payload of {} bytes exceeds the WAV size limit",
            pcm.len()
        )));
    }

    let header = generate_wav_header(format.sample_rate, format.bit_depth, format.channels, pcm.len() as u32)?;

    let mut wav = Vec::with_capacity(WAV_HEADER_SIZE + pcm.len());
    wav.extend_from_slice(&header);
    wav.extend_from_slice(pcm);
    Ok(wav)
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
    fn header_riff_magic() {
        let header = generate_wav_header(48000, 32, 2, 0).unwrap();
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_48khz_stereo_32bit() {
        let header = generate_wav_header(48000, 32, 2, 8192).unwrap();

        assert_eq!(read_u32(&header, 16), 16);
        assert_eq!(read_u16(&header, 20), 1);
        assert_eq!(read_u16(&header, 22), 2);
        assert_eq!(read_u32(&header, 24), 48000);
        assert_eq!(read_u32(&header, 28), 384_000); // 48000 * 8
        assert_eq!(read_u16(&header, 32), 8); // 2 * 32/8
        assert_eq!(read_u16(&header, 34), 32);
        assert_eq!(read_u32(&header, 40), 8192);
        assert_eq!(read_u32(&header, 4), 36 + 8192);
    }

    #[test]
    fn build_declares_payload_length() {
        let pcm: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let wav = build_wav(&pcm, &AudioFormat::default()).unwrap();

        assert_eq!(wav.len(), pcm.len() + WAV_HEADER_SIZE);
        assert_eq!(read_u32(&wav, 40), 1000);
        assert_eq!(read_u32(&wav, 4), 1036);
        assert_eq!(&wav[WAV_HEADER_SIZE..], pcm.as_slice());
    }

    #[test]
    fn build_empty_payload_is_header_only() {
        let wav = build_wav(&[], &AudioFormat::default()).unwrap();

        assert_eq!(wav.len(), WAV_HEADER_SIZE);
        assert_eq!(read_u32(&wav, 40), 0);
        assert_eq!(read_u32(&wav, 4), 36);
        assert_eq!(&wav[0..4], b"RIFF");
    }

    #[test]
    fn build_16bit_eight_channel() {
        let format = AudioFormat {
            sample_rate: 44100,
            bit_depth: 16,
            channels: 8,
        };
        let wav = build_wav(&[0u8; 32], &format).unwrap();

        assert_eq!(read_u16(&wav, 22), 8);
        assert_eq!(read_u16(&wav, 32), 16);
        assert_eq!(read_u32(&wav, 28), 44100 * 16);
    }

    #[test]
    fn build_rejects_sample_rate_past_limit() {
        let format = AudioFormat {
            sample_rate: 600_000_000,
            bit_depth: 32,
            channels: 2,
        };
        let err = build_wav(&[], &format).unwrap_err();
        assert!(matches!(err, CaptureError::Config(_)));
    }

    #[test]
    fn build_rejects_unsupported_channel_count() {
        let format = AudioFormat {
            channels: 4096,
            ..Default::default()
        };
        let err = build_wav(&[], &format).unwrap_err();
        assert!(matches!(err, CaptureError::Config(_)));
    }

    #[test]
    fn header_refuses_overflowing_fields() {
        assert!(matches!(
            generate_wav_header(600_000_000, 32, 2, 0),
            Err(CaptureError::Config(_))
        ));
        assert!(matches!(
            generate_wav_header(48000, 32, u16::MAX, 0),
            Err(CaptureError::Config(_))
        ));
        assert!(matches!(
            generate_wav_header(48000, 32, 2, u32::MAX),
            Err(CaptureError::Storage(_))
        ));
    }
}
