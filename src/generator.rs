use crate::corpus::Corpus;
use crate::request::{AudioEncoding, Jitter, SynthesisRequest};
use crate::synthesizer::SpeechSynthesizer;
use crate::voice::VoiceId;
use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Knobs for a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub overwrite: bool,
    /// Pause after every real call, `None` to run flat out.
    pub sleep: Option<Duration>,
    pub encoding: AudioEncoding,
    pub pitch_jitter: Jitter,
    pub speed_jitter: Jitter,
    pub start_row: i64,
    /// `-1` means "to the end".
    pub end_row: i64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            sleep: None,
            encoding: AudioEncoding::default(),
            pitch_jitter: Jitter::none(),
            speed_jitter: Jitter::none(),
            start_row: 0,
            end_row: -1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub number_of_chars: usize,
    pub synthesized: usize,
    pub skipped: usize,
}

/// Clamps `[start, end)` into `[0, len]`. Out of range values never fail.
pub fn row_range(start: i64, end: i64, len: usize) -> Range<usize> {
    let clamp = |i: i64| i.clamp(0, len as i64) as usize;
    let start = clamp(start);
    let end = if end == -1 { len } else { clamp(end) };
    start..end.max(start)
}

/// `{output_dir}/{voice}/{file_name}`. Both parts must stay below `output_dir`.
pub fn output_path(
    output_dir: &Path,
    voice: &VoiceId,
    file_name: &str,
) -> anyhow::Result<PathBuf> {
    ensure_relative(voice.as_str())?;
    ensure_relative(file_name)?;
    Ok(output_dir.join(voice.as_str()).join(file_name))
}

fn ensure_relative(part: &str) -> anyhow::Result<()> {
    let path = Path::new(part);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if part.is_empty() || escapes {
        anyhow::bail!("{:?} is not a relative path inside the output directory", part);
    }
    Ok(())
}

/// Drives one synthesizer over a corpus.
pub struct CommonVoice<S> {
    synthesizer: S,
    rng: StdRng,
}

impl<S: SpeechSynthesizer> CommonVoice<S> {
    pub fn new(synthesizer: S) -> Self {
        Self::with_rng(synthesizer, StdRng::from_entropy())
    }

    pub fn with_rng(synthesizer: S, rng: StdRng) -> Self {
        Self { synthesizer, rng }
    }

    #[cfg(test)]
    fn synthesizer(&self) -> &S {
        &self.synthesizer
    }

    pub async fn list_voice_types(&mut self) -> anyhow::Result<()> {
        let voices = self.synthesizer.list_voices().await?;
        println!("{}", voices);
        Ok(())
    }

    /// Returns `false` when the output already exists and was left alone.
    #[allow(clippy::too_many_arguments)]
    pub async fn synthesize_one(
        &mut self,
        text: &str,
        voice: &VoiceId,
        output_dir: &Path,
        file_name: &str,
        overwrite: bool,
        encoding: AudioEncoding,
        pitch_jitter: Jitter,
        speed_jitter: Jitter,
    ) -> anyhow::Result<bool> {
        let file = output_path(output_dir, voice, file_name)?;
        if !overwrite && file.exists() {
            log::debug!("{} is ignored", file.display());
            return Ok(false);
        }

        let request = SynthesisRequest::new(
            text,
            voice,
            encoding,
            pitch_jitter,
            speed_jitter,
            &mut self.rng,
        );
        log::debug!(
            "pitch {:.3}, speaking rate {:.3} for {}",
            request.pitch,
            request.speaking_rate,
            file.display()
        );
        let data = self.synthesizer.synthesize(&request).await?;

        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        tokio::fs::write(&file, &data)
            .await
            .with_context(|| format!("writing {}", file.display()))?;
        log::info!("{} created", file.display());
        Ok(true)
    }

    pub async fn generate(
        &mut self,
        corpus: &Corpus,
        voices: &[VoiceId],
        output_dir: &Path,
        options: &GenerateOptions,
    ) -> anyhow::Result<GenerationStats> {
        let mut stats = GenerationStats::default();
        let range = row_range(options.start_row, options.end_row, corpus.len());
        log::info!(
            "Generating rows {}..{} of {} for {} voice(s)",
            range.start,
            range.end,
            corpus.len(),
            voices.len()
        );

        for voice in voices {
            for row in &corpus.rows()[range.clone()] {
                stats.number_of_chars += row.char_count();
                let created = self
                    .synthesize_one(
                        &row.sentence,
                        voice,
                        output_dir,
                        &row.path,
                        options.overwrite,
                        options.encoding,
                        options.pitch_jitter,
                        options.speed_jitter,
                    )
                    .await?;
                if created {
                    stats.synthesized += 1;
                    if let Some(pause) = options.sleep {
                        tokio::time::sleep(pause).await;
                    }
                } else {
                    stats.skipped += 1;
                }
            }
        }

        Ok(stats)
    }
}
