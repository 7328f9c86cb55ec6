// Raw PCM (audio/L16) to WAV wrapping for TTS engines that return headerless audio.
use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::{MediaError, MediaResult};

pub const DEFAULT_BITS_PER_SAMPLE: u16 = 16;
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub bits_per_sample: u16,
    pub sample_rate: u32,
}

/// Reads bit depth and rate from a mime type such as `audio/L16;rate=24000`.
/// Missing or unparsable parameters fall back to 16 bits at 24 kHz.
pub fn parse_audio_mime_type(mime_type: &str) -> PcmFormat {
    let mut format = PcmFormat {
        bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
        sample_rate: DEFAULT_SAMPLE_RATE,
    };

    for param in mime_type.split(';').map(str::trim) {
        if let Some(rate) = param
            .get(..5)
            .filter(|key| key.eq_ignore_ascii_case("rate="))
            .and_then(|_| param[5..].parse().ok())
        {
            format.sample_rate = rate;
        } else if let Some(bits) = param.strip_prefix("audio/L").and_then(|b| b.parse().ok()) {
            format.bits_per_sample = bits;
        }
    }
    format
}

/// Whether a TTS response needs a WAV header before it can be played.
pub fn is_raw_pcm(mime_type: &str) -> bool {
    mime_type.trim().starts_with("audio/L") || mime_type.trim().is_empty()
}

/// Wraps little-endian mono PCM in a WAV container.
pub fn pcm_to_wav(pcm: &[u8], mime_type: &str) -> MediaResult<Vec<u8>> {
    let format = parse_audio_mime_type(mime_type);
    if format.bits_per_sample != 16 {
        return Err(MediaError::BadResponse(format!(
            "unsupported PCM bit depth {} in {:?}",
            format.bits_per_sample, mime_type
        )));
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for frame in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([frame[0], frame[1]]))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
