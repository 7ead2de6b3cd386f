pub mod corpus;
pub mod generator;
pub mod request;
pub mod synthesizer;
pub mod video;
pub mod voice;

use std::env;
use std::fs;

pub use corpus::{Corpus, CorpusRow};
pub use generator::{CommonVoice, GenerateOptions, GenerationStats};
pub use request::{AudioEncoding, Jitter, SynthesisRequest};
pub use synthesizer::{GoogleSynthesizer, SpeechSynthesizer};
pub use voice::VoiceId;

/// Service account JSON named by `GOOGLE_APPLICATION_CREDENTIALS`.
pub fn credentials() -> Result<String, anyhow::Error> {
    let path = env::var("GOOGLE_APPLICATION_CREDENTIALS")
        .map_err(|_| anyhow::anyhow!("GOOGLE_APPLICATION_CREDENTIALS is not set"))?;
    Ok(fs::read_to_string(path)?)
}

/// `debug` wins over `quiet`. `RUST_LOG` still applies on top.
pub fn init_logging(debug: bool, quiet: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else if quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
