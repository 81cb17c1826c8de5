use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "speechfetch")]
#[command(author, version, about = "YouTube audio acquisition for speech-processing pipelines")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// YouTube URL to download (shorthand for `download <URL>`)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    #[command(flatten)]
    pub options: DownloadOptions,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download audio from a single URL
    Download {
        /// YouTube URL
        url: String,

        #[command(flatten)]
        options: DownloadOptions,
    },

    /// Check whether URLs are YouTube video URLs
    Validate {
        /// URLs to check
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Check that yt-dlp and ffmpeg are installed
    Doctor,

    /// Show configuration
    Config,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct DownloadOptions {
    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Settings preset (overrides the configured one)
    #[arg(short, long, value_enum)]
    pub preset: Option<Preset>,

    /// Audio format
    #[arg(short, long, value_enum)]
    pub format: Option<AudioFormat>,

    /// Bitrate in kbps for lossy formats
    #[arg(long)]
    pub quality: Option<u32>,

    /// Sample rate in Hz (0 keeps the original)
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Keep stereo instead of downmixing to mono
    #[arg(long)]
    pub stereo: bool,

    /// Reject videos longer than this many seconds
    #[arg(long, value_parser = positive_seconds)]
    pub max_duration: Option<f64>,

    /// Filename template without extension ({title}, {id}, {uploader})
    #[arg(short, long)]
    pub template: Option<String>,

    /// Do not embed metadata in the audio file
    #[arg(long)]
    pub no_metadata: bool,

    /// Borrow cookies from this browser (chrome, firefox, edge, ...)
    #[arg(long, value_name = "BROWSER")]
    pub cookies_from_browser: Option<String>,

    /// Skip the ffmpeg check of the downloaded file
    #[arg(long)]
    pub no_verify: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

fn positive_seconds(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err("must be greater than 0".to_string())
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioFormat {
    /// WAV - Uncompressed PCM (recommended for transcription)
    Wav,
    /// MP3 - Lossy, widely compatible
    Mp3,
    /// M4A - AAC in MP4, good quality/size ratio
    M4a,
    /// Opus - Lossy, best quality/size ratio
    Opus,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// WAV, 16 kHz, mono
    Transcription,
    /// WAV, 44.1 kHz, stereo
    HighQuality,
    /// MP3 128 kbps, 16 kHz, mono
    Compact,
}

impl From<AudioFormat> for speechfetch_core::AudioFormat {
    fn from(format: AudioFormat) -> Self {
        match format {
            AudioFormat::Wav => speechfetch_core::AudioFormat::Wav,
            AudioFormat::Mp3 => speechfetch_core::AudioFormat::Mp3,
            AudioFormat::M4a => speechfetch_core::AudioFormat::M4a,
            AudioFormat::Opus => speechfetch_core::AudioFormat::Opus,
        }
    }
}

impl From<Preset> for speechfetch_core::Preset {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Transcription => speechfetch_core::Preset::Transcription,
            Preset::HighQuality => speechfetch_core::Preset::HighQuality,
            Preset::Compact => speechfetch_core::Preset::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_url_shorthand() {
        let cli = Cli::try_parse_from([
            "speechfetch",
            "https://youtu.be/dQw4w9WgXcQ",
            "--max-duration",
            "600",
            "-f",
            "mp3",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.url.as_deref(), Some("https://youtu.be/dQw4w9WgXcQ"));
        assert_eq!(cli.options.max_duration, Some(600.0));
        assert_eq!(cli.options.format, Some(AudioFormat::Mp3));
    }

    #[test]
    fn test_download_subcommand() {
        let cli = Cli::try_parse_from([
            "speechfetch",
            "download",
            "https://youtu.be/dQw4w9WgXcQ",
            "--preset",
            "high-quality",
            "--stereo",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Download { url, options }) => {
                assert_eq!(url, "https://youtu.be/dQw4w9WgXcQ");
                assert_eq!(options.preset, Some(Preset::HighQuality));
                assert!(options.stereo);
                assert!(options.json);
            }
            _ => panic!("expected download subcommand"),
        }
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        assert!(Cli::try_parse_from(["speechfetch", "x", "--max-duration", "0"]).is_err());
    }

    #[test]
    fn test_validate_requires_urls() {
        assert!(Cli::try_parse_from(["speechfetch", "validate"]).is_err());
    }
}
