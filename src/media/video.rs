// Slideshow rendering: still images shown for equal shares of the narration,
// encoded with ffmpeg at 1280x720.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{concat_entry, ensure_binary, ensure_parent_dir, run_command, AudioArtifact, VideoArtifact, VideoRenderer};
use crate::error::{MediaError, MediaResult};

/// Shortest time any single image stays on screen.
pub const MIN_SLIDE_SECS: f64 = 3.0;

const SCALE_FILTER: &str =
    "scale=1280:720:force_original_aspect_ratio=decrease,pad=1280:720:(ow-iw)/2:(oh-ih)/2";

/// Audio length in seconds as reported by ffprobe.
pub fn probe_duration(audio: &Path) -> MediaResult<f64> {
    ensure_binary("ffprobe")?;
    let output = run_command(
        Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(audio),
    )?;
    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_duration(stdout: &str) -> MediaResult<f64> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| MediaError::BadResponse(format!("ffprobe returned duration {:?}", stdout.trim())))
}

pub fn slide_duration(total_secs: f64, images: usize) -> f64 {
    if images == 0 {
        return MIN_SLIDE_SECS;
    }
    (total_secs / images as f64).max(MIN_SLIDE_SECS)
}

/// Concat-demuxer script showing each image for `secs`. The last image is
/// listed twice so its duration is honoured.
pub fn slideshow_script(images: &[PathBuf], secs: f64) -> String {
    let mut script = String::new();
    for image in images {
        script.push_str(&concat_entry(image));
        script.push_str(&format!("duration {:.2}\n", secs));
    }
    if let Some(last) = images.last() {
        script.push_str(&concat_entry(last));
    }
    script
}

#[derive(Debug, Clone, Default)]
pub struct FfmpegVideoRenderer;

impl VideoRenderer for FfmpegVideoRenderer {
    fn render(
        &self,
        audio: &AudioArtifact,
        images: &[PathBuf],
        output: &Path,
    ) -> MediaResult<VideoArtifact> {
        if images.is_empty() {
            return Err(MediaError::NoImages("no images provided for video generation".to_string()));
        }
        ensure_binary("ffmpeg")?;

        let duration = probe_duration(&audio.path)?;
        let secs = slide_duration(duration, images.len());
        ensure_parent_dir(output)?;

        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let script_path = output.with_file_name(format!("{}_images.txt", stem));
        fs::write(&script_path, slideshow_script(images, secs))?;
        tracing::info!(images = images.len(), audio_secs = duration, slide_secs = secs, "rendering slideshow");

        run_command(
            Command::new("ffmpeg")
                .args(["-y", "-f", "concat", "-safe", "0", "-i"])
                .arg(&script_path)
                .arg("-i")
                .arg(&audio.path)
                .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-vf", SCALE_FILTER])
                .args(["-c:a", "aac", "-shortest"])
                .arg(output),
        )?;

        tracing::info!(path = %output.display(), "wrote video");
        Ok(VideoArtifact {
            path: output.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_duration() {
        assert_eq!(slide_duration(60.0, 4), 15.0);
        assert_eq!(slide_duration(5.0, 4), MIN_SLIDE_SECS);
        assert_eq!(slide_duration(10.0, 0), MIN_SLIDE_SECS);
    }

    #[test]
    fn test_parse_duration() -> anyhow::Result<()> {
        assert_eq!(parse_duration("12.345000\n")?, 12.345);
        assert!(parse_duration("N/A\n").is_err());
        assert!(parse_duration("").is_err());
        Ok(())
    }

    #[test]
    fn test_slideshow_script_repeats_last_image() {
        let images = vec![PathBuf::from("/no/such/a.jpg"), PathBuf::from("/no/such/b.png")];
        let script = slideshow_script(&images, 7.5);
        assert_eq!(
            script,
            "file '/no/such/a.jpg'\nduration 7.50\nfile '/no/such/b.png'\nduration 7.50\nfile '/no/such/b.png'\n"
        );
    }

    #[test]
    fn test_render_without_images() {
        let audio = AudioArtifact { path: PathBuf::from("audio.mp3") };
        let result = FfmpegVideoRenderer.render(&audio, &[], Path::new("out.mp4"));
        assert!(matches!(result, Err(MediaError::NoImages(_))));
    }
}
