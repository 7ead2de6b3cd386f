use anyhow::Context;
use clap::{CommandFactory, Parser};
use commonvoice::request::{validate_pitch_jitter, validate_speed_jitter};
use commonvoice::{
    credentials, init_logging, AudioEncoding, CommonVoice, Corpus, GenerateOptions,
    GoogleSynthesizer, Jitter, VoiceId,
};
use std::path::PathBuf;
use std::time::Duration;

/// Generates synthetic Common Voice clips with Google Text-to-Speech.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Common Voice file, a tab separated file with client_id, path, sentence, etc.
    #[arg(short, long, alias = "commonvoice_file")]
    commonvoice_file: Option<PathBuf>,

    /// Directory where the sound files will be stored.
    #[arg(short, long, alias = "output_dir")]
    output_dir: Option<PathBuf>,

    /// List supported voice types.
    #[arg(short, long, alias = "list_voice_types")]
    list_voice_types: bool,

    /// Voice types such as id-ID-Standard-A or id-ID-Wavenet-B.
    #[arg(short, long, alias = "voice_types", num_args = 1..)]
    voice_types: Vec<VoiceId>,

    #[arg(long, alias = "audio_encoding", value_enum, default_value_t = AudioEncoding::Mp3)]
    audio_encoding: AudioEncoding,

    /// Randomize pitch within [-random_pitch_minmax, random_pitch_minmax].
    #[arg(long, alias = "random_pitch")]
    random_pitch: bool,

    #[arg(
        long,
        alias = "random_pitch_minmax",
        default_value_t = 5.0,
        allow_negative_numbers = true
    )]
    random_pitch_minmax: f64,

    /// Randomize speed within [1 - random_speed_minmax, 1 + random_speed_minmax].
    #[arg(long, alias = "random_speed")]
    random_speed: bool,

    #[arg(
        long,
        alias = "random_speed_minmax",
        default_value_t = 0.1,
        allow_negative_numbers = true
    )]
    random_speed_minmax: f64,

    /// Regenerate files that already exist.
    #[arg(short = 'r', long, alias = "rewrite")]
    overwrite: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug messages.
    #[arg(short, long)]
    debug: bool,

    /// Sleep between requests.
    #[arg(short, long)]
    sleep: bool,

    /// Seconds to sleep between requests.
    #[arg(
        short = 't',
        long,
        alias = "sleep_time",
        default_value_t = 0.1,
        allow_negative_numbers = true
    )]
    sleep_time: f64,

    /// First corpus row to synthesize.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    start: i64,

    /// Row to stop before, -1 for the end of the corpus.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    end: i64,
}

impl Args {
    /// Synthesis needs a corpus, an output directory and at least one voice.
    fn missing_required(&self) -> bool {
        !self.list_voice_types
            && (self.commonvoice_file.is_none()
                || self.output_dir.is_none()
                || self.voice_types.is_empty())
    }

    fn options(&self) -> anyhow::Result<GenerateOptions> {
        let pitch_jitter = Jitter::from_flag(self.random_pitch, self.random_pitch_minmax);
        let speed_jitter = Jitter::from_flag(self.random_speed, self.random_speed_minmax);
        validate_pitch_jitter(pitch_jitter)?;
        validate_speed_jitter(speed_jitter)?;

        let sleep = if self.sleep {
            Some(Duration::try_from_secs_f64(self.sleep_time).context("invalid --sleep-time")?)
        } else {
            None
        };

        Ok(GenerateOptions {
            overwrite: self.overwrite,
            sleep,
            encoding: self.audio_encoding,
            pitch_jitter,
            speed_jitter,
            start_row: self.start,
            end_row: self.end,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.quiet);

    if args.missing_required() {
        Args::command().print_help()?;
        std::process::exit(1);
    }

    if args.list_voice_types {
        let synthesizer = GoogleSynthesizer::create(credentials()?).await?;
        return CommonVoice::new(synthesizer).list_voice_types().await;
    }

    let (Some(commonvoice_file), Some(output_dir)) = (&args.commonvoice_file, &args.output_dir)
    else {
        anyhow::bail!("--commonvoice-file and --output-dir are required");
    };

    let options = args.options()?;
    let corpus = Corpus::load(commonvoice_file)?;
    let synthesizer = GoogleSynthesizer::create(credentials()?).await?;
    let mut commonvoice = CommonVoice::new(synthesizer);

    let stats = commonvoice
        .generate(&corpus, &args.voice_types, output_dir, &options)
        .await?;

    log::info!(
        "{} files synthesized, {} skipped",
        stats.synthesized,
        stats.skipped
    );
    println!("Synthesized characters: {}", stats.number_of_chars);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("commonvoice").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn required_combination() {
        assert!(parse(&[]).missing_required());
        assert!(parse(&["-c", "validated.tsv", "-o", "out"]).missing_required());
        assert!(parse(&["-c", "validated.tsv", "-v", "id-ID-Standard-A"]).missing_required());
        assert!(parse(&["-o", "out", "-v", "id-ID-Standard-A"]).missing_required());
        assert!(!parse(&["-l"]).missing_required());
        assert!(!parse(&["-c", "validated.tsv", "-o", "out", "-v", "id-ID-Standard-A"])
            .missing_required());
    }

    #[test]
    fn multiple_voices_and_defaults() {
        let args = parse(&[
            "-c",
            "validated.tsv",
            "-o",
            "out",
            "-v",
            "id-ID-Standard-A",
            "id-ID-Wavenet-B",
        ]);
        assert_eq!(
            args.voice_types,
            [VoiceId::new("id-ID-Standard-A"), VoiceId::new("id-ID-Wavenet-B")]
        );

        let options = args.options().unwrap();
        assert!(!options.overwrite);
        assert_eq!(options.sleep, None);
        assert_eq!(options.encoding, AudioEncoding::Mp3);
        assert_eq!(options.pitch_jitter, Jitter::none());
        assert_eq!(options.speed_jitter, Jitter::none());
        assert_eq!((options.start_row, options.end_row), (0, -1));
    }

    #[test]
    fn snake_case_aliases() {
        let args = parse(&[
            "--commonvoice_file",
            "validated.tsv",
            "--output_dir",
            "out",
            "--voice_types",
            "id-ID-Standard-A",
            "--audio_encoding",
            "OGG_OPUS",
            "--random_pitch",
            "--random_pitch_minmax",
            "3.0",
            "--random_speed",
            "--random_speed_minmax",
            "0.2",
            "--sleep_time",
            "0.5",
            "--rewrite",
        ]);
        assert!(!args.missing_required());

        let options = args.options().unwrap();
        assert!(options.overwrite);
        assert_eq!(options.encoding, AudioEncoding::OggOpus);
        assert_eq!(options.pitch_jitter, Jitter::up_to(3.0));
        assert_eq!(options.speed_jitter, Jitter::up_to(0.2));
        // --sleep_time alone does not enable sleeping.
        assert_eq!(options.sleep, None);
    }

    #[test]
    fn sleep_and_bounds() {
        let args = parse(&["-l", "-s", "-t", "0.25", "--start", "-3", "--end", "-1"]);
        let options = args.options().unwrap();
        assert_eq!(options.sleep, Some(Duration::from_millis(250)));
        assert_eq!((options.start_row, options.end_row), (-3, -1));
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(parse(&["-l", "--random-pitch", "--random-pitch-minmax", "25"])
            .options()
            .is_err());
        assert!(parse(&["-l", "--random-speed", "--random-speed-minmax", "0.8"])
            .options()
            .is_err());
        assert!(parse(&["-l", "-s", "-t", "-1"]).options().is_err());
        // Ranges only matter when randomization is on.
        assert!(parse(&["-l", "--random-pitch-minmax", "25"]).options().is_ok());
    }

    #[test]
    fn unknown_encoding_is_a_parse_error() {
        let result = Args::try_parse_from(["commonvoice", "-l", "--audio-encoding", "FLAC"]);
        assert!(result.is_err());
    }
}
