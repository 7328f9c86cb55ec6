// granth: chapter-wise extractive summaries of Hindi books, with optional
// spoken-Hindi audio and slideshow video stages.
mod error;
mod loader;
mod media;
mod nlp;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::EnvFilter;

use crate::loader::load_document;
use crate::media::images::{list_images, rank_images, WikimediaImageSource};
use crate::media::tts::{GeminiSynthesizer, GttsSynthesizer, GEMINI_DEFAULT_VOICE};
use crate::media::video::FfmpegVideoRenderer;
use crate::media::{AudioArtifact, Synthesizer, VideoRenderer};
use crate::nlp::{summarize_document, write_summary, Summary, SummaryConfig, DEFAULT_RATIO};

#[derive(Parser)]
#[command(name = "granth", version, about = "Hindi book summary, audiobook and slideshow generator")]
struct Cli {
    /// Debug logging (GRANTH_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a .txt or .pdf book chapter by chapter, optionally narrating the summary
    Summarize {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short = 'o', long)]
        summary_output: PathBuf,
        /// Fraction of sentences kept per chapter, in (0, 1]
        #[arg(short, long, default_value_t = DEFAULT_RATIO)]
        ratio: f64,
        /// Narrate the summary into this file
        #[arg(long)]
        audio_output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = TtsProvider::Gtts)]
        tts_provider: TtsProvider,
        #[command(flatten)]
        tts: TtsArgs,
    },
    /// Narrate the full text of a PDF (or .txt) book
    Audio {
        #[arg(long, alias = "input")]
        pdf: PathBuf,
        #[arg(long)]
        audio_output: PathBuf,
        #[arg(long, value_enum, default_value_t = TtsProvider::Gemini)]
        tts_provider: TtsProvider,
        #[command(flatten)]
        tts: TtsArgs,
    },
    /// Render a slideshow video from narration audio and still images
    Video {
        #[arg(long)]
        audio: PathBuf,
        #[arg(long)]
        video_output: PathBuf,
        /// Use images from this folder (jpg/png/webp); downloaded from Wikimedia Commons when omitted
        #[arg(long)]
        images_dir: Option<PathBuf>,
        /// Order local images by relevance to this summary file
        #[arg(long)]
        summary: Option<PathBuf>,
        #[arg(long, default_value = "belief effect placebo psychology")]
        query: String,
        #[arg(long, default_value_t = 8)]
        auto_images_count: usize,
        #[arg(long, default_value = "output/auto_images")]
        auto_images_dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TtsProvider {
    Gtts,
    Gemini,
}

#[derive(Args, Debug)]
struct TtsArgs {
    /// TTS language code
    #[arg(long, default_value = "hi")]
    lang: String,
    /// Gemini prebuilt voice name
    #[arg(long, default_value = GEMINI_DEFAULT_VOICE)]
    gemini_voice: String,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("GRANTH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "granth=debug" } else { "granth=info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(label: &str, detail: &str) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    write!(stdout, "{:>12}", label)?;
    stdout.reset()?;
    writeln!(stdout, " {}", detail)?;
    Ok(())
}

fn make_synthesizer(provider: TtsProvider, tts: &TtsArgs) -> Result<Box<dyn Synthesizer>> {
    let synthesizer: Box<dyn Synthesizer> = match provider {
        TtsProvider::Gtts => Box::new(GttsSynthesizer::default()),
        TtsProvider::Gemini => Box::new(GeminiSynthesizer::new(
            tts.gemini_api_key.as_deref().unwrap_or_default(),
            &tts.gemini_voice,
        )?),
    };
    Ok(synthesizer)
}

fn run_summarize(input: &Path, output: &Path, ratio: f64) -> Result<Summary> {
    let config = SummaryConfig::new(ratio)?;
    let doc = load_document(input).with_context(|| format!("failed to load {}", input.display()))?;
    let summary = summarize_document(&doc, &config);
    write_summary(output, &summary.text)
        .with_context(|| format!("failed to write summary to {}", output.display()))?;
    Ok(summary)
}

fn run_audio(text: &str, output: &Path, synthesizer: &dyn Synthesizer, lang: &str) -> Result<AudioArtifact> {
    let artifact = synthesizer
        .synthesize(text, lang, output)
        .with_context(|| format!("failed to synthesize audio to {}", output.display()))?;
    report("Audio", &artifact.path.display().to_string())?;
    Ok(artifact)
}

fn collect_images(
    images_dir: Option<&Path>,
    summary: Option<&Path>,
    query: &str,
    count: usize,
    download_dir: &Path,
) -> Result<Vec<PathBuf>> {
    match images_dir {
        Some(dir) => {
            let images = list_images(dir)?;
            match summary {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read summary {}", path.display()))?;
                    Ok(rank_images(images, &text))
                }
                None => Ok(images),
            }
        }
        None => {
            let source = WikimediaImageSource::new()?;
            Ok(source.fetch(query, download_dir, count)?)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Summarize {
            input,
            summary_output,
            ratio,
            audio_output,
            tts_provider,
            tts,
        } => {
            let summary = run_summarize(&input, &summary_output, ratio)?;
            report(
                "Summarized",
                &format!(
                    "{} of {} sentences across {} sections -> {}",
                    summary.selected_sentences(),
                    summary.source_sentences(),
                    summary.sections.len(),
                    summary_output.display()
                ),
            )?;
            if let Some(audio_output) = audio_output {
                let synthesizer = make_synthesizer(tts_provider, &tts)?;
                run_audio(&summary.text, &audio_output, synthesizer.as_ref(), &tts.lang)?;
            }
        }
        Commands::Audio {
            pdf,
            audio_output,
            tts_provider,
            tts,
        } => {
            let synthesizer = make_synthesizer(tts_provider, &tts)?;
            let doc = load_document(&pdf).with_context(|| format!("failed to load {}", pdf.display()))?;
            run_audio(doc.text(), &audio_output, synthesizer.as_ref(), &tts.lang)?;
        }
        Commands::Video {
            audio,
            video_output,
            images_dir,
            summary,
            query,
            auto_images_count,
            auto_images_dir,
        } => {
            let images = collect_images(
                images_dir.as_deref(),
                summary.as_deref(),
                &query,
                auto_images_count,
                &auto_images_dir,
            )?;
            let artifact = FfmpegVideoRenderer
                .render(&AudioArtifact { path: audio }, &images, &video_output)
                .with_context(|| format!("failed to render {}", video_output.display()))?;
            report("Video", &artifact.path.display().to_string())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SummaryError;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_summarize_defaults() {
        let cli = Cli::try_parse_from(["granth", "summarize", "-i", "book.txt", "-o", "out/summary.txt"]).unwrap();
        match cli.command {
            Commands::Summarize { ratio, audio_output, tts_provider, tts, .. } => {
                assert_eq!(ratio, 0.3);
                assert!(audio_output.is_none());
                assert_eq!(tts_provider, TtsProvider::Gtts);
                assert_eq!(tts.lang, "hi");
                assert_eq!(tts.gemini_voice, "Kore");
            }
            _ => panic!("expected summarize"),
        }
    }

    #[test]
    fn test_parse_audio_defaults_to_gemini() {
        let cli = Cli::try_parse_from(["granth", "audio", "--pdf", "book.pdf", "--audio-output", "a.mp3"]).unwrap();
        match cli.command {
            Commands::Audio { tts_provider, .. } => assert_eq!(tts_provider, TtsProvider::Gemini),
            _ => panic!("expected audio"),
        }
    }

    #[test]
    fn test_parse_video_options() {
        let cli = Cli::try_parse_from([
            "granth", "video", "--audio", "a.mp3", "--video-output", "v.mp4", "--images-dir", "imgs",
        ])
        .unwrap();
        match cli.command {
            Commands::Video { images_dir, auto_images_count, query, .. } => {
                assert_eq!(images_dir, Some(PathBuf::from("imgs")));
                assert_eq!(auto_images_count, 8);
                assert_eq!(query, "belief effect placebo psychology");
            }
            _ => panic!("expected video"),
        }
    }

    #[test]
    fn test_run_summarize_writes_file() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("book.txt");
        let output = dir.path().join("out").join("summary.txt");
        fs::write(
            &input,
            "अध्याय 1: परिचय\nयह एक वाक्य है। यह दूसरा वाक्य है। तीसरा वाक्य यहाँ है।\nChapter 2: Summary\nThis is sentence one. This is sentence two.",
        )?;

        let summary = run_summarize(&input, &output, 0.34)?;
        let written = fs::read_to_string(&output)?;
        assert_eq!(written, summary.text);
        assert_eq!(
            written,
            "अध्याय 1: परिचय\nयह एक वाक्य है।\n\nChapter 2: Summary\nThis is sentence one.\n"
        );
        Ok(())
    }

    #[test]
    fn test_run_summarize_twice_is_byte_identical() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("book.txt");
        fs::write(&input, "पहला वाक्य सुंदर है। दूसरा वाक्य लंबा और सुंदर है। तीसरा।")?;
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");

        run_summarize(&input, &first, 0.5)?;
        run_summarize(&input, &second, 0.5)?;
        assert_eq!(fs::read(&first)?, fs::read(&second)?);
        Ok(())
    }

    #[test]
    fn test_empty_document_writes_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("empty.txt");
        let output = dir.path().join("summary.txt");
        fs::write(&input, "   \n")?;

        let err = run_summarize(&input, &output, 0.3).unwrap_err();
        assert!(matches!(err.downcast_ref::<SummaryError>(), Some(SummaryError::Input(_))));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_bad_ratio_rejected_before_reading_input() -> Result<()> {
        let dir = TempDir::new()?;
        let output = dir.path().join("summary.txt");

        let err = run_summarize(&dir.path().join("missing.txt"), &output, 1.5).unwrap_err();
        assert!(matches!(err.downcast_ref::<SummaryError>(), Some(SummaryError::Config(_))));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_collect_images_ranks_by_summary() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("a_river.jpg"), b"x")?;
        fs::write(dir.path().join("b_forest.png"), b"x")?;
        let summary = dir.path().join("summary.txt");
        fs::write(&summary, "forest में एक दिन।")?;

        let images = collect_images(Some(dir.path()), Some(&summary), "", 0, dir.path())?;
        assert_eq!(images[0].file_name().unwrap(), "b_forest.png");
        assert_eq!(images.len(), 2);
        Ok(())
    }

    #[test]
    fn test_make_gemini_synthesizer_requires_key() {
        let tts = TtsArgs {
            lang: "hi".to_string(),
            gemini_voice: "Kore".to_string(),
            gemini_api_key: None,
        };
        assert!(make_synthesizer(TtsProvider::Gemini, &tts).is_err());
        assert!(make_synthesizer(TtsProvider::Gtts, &tts).is_ok());
    }

    struct RecordingSynthesizer;

    impl Synthesizer for RecordingSynthesizer {
        fn synthesize(&self, text: &str, language: &str, output: &Path) -> crate::error::MediaResult<AudioArtifact> {
            fs::write(output, format!("{}|{}", language, text))?;
            Ok(AudioArtifact { path: output.to_path_buf() })
        }
    }

    #[test]
    fn test_run_audio_passes_summary_verbatim() -> Result<()> {
        let dir = TempDir::new()?;
        let output = dir.path().join("summary.mp3");
        let artifact = run_audio("सारांश।\n", &output, &RecordingSynthesizer, "hi")?;
        assert_eq!(artifact.path, output);
        assert_eq!(fs::read_to_string(&output)?, "hi|सारांश।\n");
        Ok(())
    }
}
