// Audio and video stages. Every implementation here is a thin wrapper over an
// external engine (gtts-cli, Gemini TTS, ffmpeg, ffprobe); the summarization
// core never depends on this module.
pub mod images;
pub mod tts;
pub mod video;
pub mod wav;

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::{MediaError, MediaResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoArtifact {
    pub path: PathBuf,
}

/// Text-to-speech engine: writes speech for `text` in `language` to `output`.
pub trait Synthesizer {
    fn synthesize(&self, text: &str, language: &str, output: &Path) -> MediaResult<AudioArtifact>;
}

/// Slideshow encoder pairing an audio track with still images.
pub trait VideoRenderer {
    fn render(
        &self,
        audio: &AudioArtifact,
        images: &[PathBuf],
        output: &Path,
    ) -> MediaResult<VideoArtifact>;
}

/// Resolves `name` on `PATH`, failing early when the tool is not installed.
pub fn ensure_binary(name: &str) -> MediaResult<PathBuf> {
    let paths = env::var_os("PATH").unwrap_or_default();
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| MediaError::MissingBinary(name.to_string()))
}

/// Runs an external command to completion, turning a non-zero exit into
/// `MediaError::CommandFailed` with the captured stderr.
pub(crate) fn run_command(cmd: &mut Command) -> MediaResult<Output> {
    tracing::debug!(command = ?cmd, "running external command");
    let output = cmd.output()?;
    if !output.status.success() {
        return Err(MediaError::CommandFailed {
            program: cmd.get_program().to_string_lossy().into_owned(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

// ffmpeg concat demuxer entry; single quotes inside paths are escaped the way
// the demuxer expects.
pub(crate) fn concat_entry(path: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    format!("file '{}'\n", resolved.display().to_string().replace('\'', r"'\''"))
}

pub(crate) fn ensure_parent_dir(path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
