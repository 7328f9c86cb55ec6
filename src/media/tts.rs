// Text-to-speech backends: gtts-cli (Google Translate voice) and the Gemini
// TTS HTTP API. Long text is chunked, each chunk synthesized separately and
// the pieces joined with ffmpeg.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use super::wav::{is_raw_pcm, pcm_to_wav};
use super::{concat_entry, ensure_binary, ensure_parent_dir, run_command, AudioArtifact, Synthesizer};
use crate::error::{MediaError, MediaResult};

/// Upper bound on characters sent to a TTS engine in one request.
pub const TTS_CHUNK_CHARS: usize = 3500;

pub const GEMINI_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const GEMINI_DEFAULT_VOICE: &str = "Kore";
const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT_SECS: u64 = 300;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[।.!?] ").unwrap());

/// Splits text into pieces of at most `max_chars` characters for TTS.
///
/// Whitespace is collapsed first. Sentences (ending in `।.!?` followed by a
/// space) are packed greedily, joined by single spaces; a sentence longer than
/// `max_chars` is cut into fixed-size character slices.
pub fn split_text_for_tts(text: &str, max_chars: usize) -> Vec<String> {
    let clean = WHITESPACE.replace_all(text, " ").trim().to_string();
    if clean.is_empty() {
        return Vec::new();
    }
    if clean.chars().count() <= max_chars {
        return vec![clean];
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_BREAK.find_iter(&clean) {
        sentences.push(&clean[start..m.end() - 1]);
        start = m.end();
    }
    sentences.push(&clean[start..]);

    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for sentence in sentences.into_iter().map(str::trim).filter(|s| !s.is_empty()) {
        let len = sentence.chars().count();

        if len > max_chars {
            if !current.is_empty() {
                chunks.push(current.join(" "));
                current.clear();
                current_len = 0;
            }
            let chars: Vec<char> = sentence.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|piece| piece.iter().collect::<String>()));
            continue;
        }

        let projected = current_len + len + usize::from(!current.is_empty());
        if projected > max_chars {
            chunks.push(current.join(" "));
            current = vec![sentence];
            current_len = len;
        } else {
            current.push(sentence);
            current_len = projected;
        }
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks.retain(|c| !c.trim().is_empty());
    chunks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatMode {
    /// Stream copy; all inputs share one codec.
    Copy,
    /// Re-encode to MP3 (libmp3lame, VBR quality 2).
    Mp3,
}

/// Joins audio files in order with the ffmpeg concat demuxer.
pub fn concat_audio(parts: &[PathBuf], workdir: &Path, output: &Path, mode: ConcatMode) -> MediaResult<()> {
    ensure_binary("ffmpeg")?;
    let list_path = workdir.join("concat.txt");
    let list: String = parts.iter().map(|p| concat_entry(p)).collect();
    fs::write(&list_path, list)?;

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-f", "concat", "-safe", "0", "-i"]).arg(&list_path);
    match mode {
        ConcatMode::Copy => cmd.args(["-c", "copy"]),
        ConcatMode::Mp3 => cmd.args(["-c:a", "libmp3lame", "-q:a", "2"]),
    };
    cmd.arg(output);
    run_command(&mut cmd)?;
    Ok(())
}

fn chunk_progress(len: usize) -> MediaResult<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {wide_bar} {pos}/{len} {msg}")
        .map_err(|e| MediaError::BadResponse(e.to_string()))?
        .progress_chars("=>-");
    pb.set_style(style);
    Ok(pb)
}

/// Google Translate voice through the `gtts-cli` tool of the gTTS package.
#[derive(Debug, Clone)]
pub struct GttsSynthesizer {
    binary: String,
}

impl Default for GttsSynthesizer {
    fn default() -> Self {
        Self {
            binary: "gtts-cli".to_string(),
        }
    }
}

impl Synthesizer for GttsSynthesizer {
    fn synthesize(&self, text: &str, language: &str, output: &Path) -> MediaResult<AudioArtifact> {
        let chunks = split_text_for_tts(text, TTS_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(MediaError::EmptyText);
        }
        ensure_binary(&self.binary)?;
        ensure_parent_dir(output)?;

        let tmp = tempfile::Builder::new().prefix("tts_chunks_").tempdir()?;
        let pb = chunk_progress(chunks.len())?;
        pb.set_message("gtts");

        let mut parts = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            let text_path = tmp.path().join(format!("chunk_{:04}.txt", idx + 1));
            let audio_path = tmp.path().join(format!("chunk_{:04}.mp3", idx + 1));
            fs::write(&text_path, chunk)?;
            run_command(
                Command::new(&self.binary)
                    .arg("--file")
                    .arg(&text_path)
                    .args(["--lang", language, "--output"])
                    .arg(&audio_path),
            )?;
            parts.push(audio_path);
            pb.inc(1);
        }
        pb.finish_with_message("synthesized");

        if let [single] = parts.as_slice() {
            fs::copy(single, output)?;
        } else {
            concat_audio(&parts, tmp.path(), output, ConcatMode::Copy)?;
        }
        tracing::info!(path = %output.display(), chunks = parts.len(), "wrote gTTS audio");
        Ok(AudioArtifact {
            path: output.to_path_buf(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

/// Gemini prebuilt-voice TTS over the `generateContent` REST endpoint.
pub struct GeminiSynthesizer {
    client: reqwest::blocking::Client,
    api_key: String,
    voice: String,
    model: String,
    endpoint: String,
}

impl GeminiSynthesizer {
    pub fn new(api_key: &str, voice: &str) -> MediaResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MediaError::MissingConfig(
                "GEMINI_API_KEY is required for Gemini TTS".to_string(),
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            voice: voice.to_string(),
            model: GEMINI_TTS_MODEL.to_string(),
            endpoint: GEMINI_ENDPOINT.to_string(),
        })
    }

    fn request_chunk(&self, prompt: &str) -> MediaResult<(Vec<u8>, String)> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 1,
                "responseModalities": ["audio"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": self.voice } }
                }
            }
        });
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let response: GenerateResponse = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        extract_audio(response)
    }
}

// Concatenates every inline audio part of the first candidate.
fn extract_audio(response: GenerateResponse) -> MediaResult<(Vec<u8>, String)> {
    let mut audio = Vec::new();
    let mut mime_type: Option<String> = None;

    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    for inline in parts.into_iter().filter_map(|p| p.inline_data) {
        if inline.data.is_empty() {
            continue;
        }
        let decoded = BASE64
            .decode(inline.data.as_bytes())
            .map_err(|e| MediaError::BadResponse(format!("invalid base64 audio: {}", e)))?;
        mime_type.get_or_insert(inline.mime_type);
        audio.extend_from_slice(&decoded);
    }

    if audio.is_empty() {
        return Err(MediaError::EmptyAudio);
    }
    Ok((audio, mime_type.unwrap_or_default()))
}

fn language_name(code: &str) -> &str {
    match code {
        "hi" => "Hindi",
        "en" => "English",
        other => other,
    }
}

fn tts_prompt(language: &str, text: &str) -> String {
    format!(
        "Read this in {} in a warm and friendly tone: {}",
        language_name(language),
        text
    )
}

fn container_extension(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.as_str() {
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/ogg" => Some("ogg"),
        _ => None,
    }
}

impl Synthesizer for GeminiSynthesizer {
    fn synthesize(&self, text: &str, language: &str, output: &Path) -> MediaResult<AudioArtifact> {
        let chunks = split_text_for_tts(text, TTS_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(MediaError::EmptyText);
        }
        ensure_binary("ffmpeg")?;
        ensure_parent_dir(output)?;

        let tmp = tempfile::Builder::new().prefix("gemini_tts_").tempdir()?;
        let pb = chunk_progress(chunks.len())?;
        pb.set_message(self.voice.clone());

        let mut parts = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            let (audio, mime_type) = self.request_chunk(&tts_prompt(language, chunk))?;
            let (ext, bytes) = match container_extension(&mime_type) {
                Some(ext) => (ext, audio),
                None if is_raw_pcm(&mime_type) => ("wav", pcm_to_wav(&audio, &mime_type)?),
                None => ("wav", pcm_to_wav(&audio, "audio/L16;rate=24000")?),
            };
            let path = tmp.path().join(format!("chunk_{:04}.{}", idx + 1, ext));
            fs::write(&path, bytes)?;
            tracing::debug!(chunk = idx + 1, mime = %mime_type, "received Gemini audio");
            parts.push(path);
            pb.inc(1);
        }
        pb.finish_with_message("synthesized");

        concat_audio(&parts, tmp.path(), output, ConcatMode::Mp3)?;
        tracing::info!(path = %output.display(), chunks = parts.len(), voice = %self.voice, "wrote Gemini audio");
        Ok(AudioArtifact {
            path: output.to_path_buf(),
        })
    }
}
