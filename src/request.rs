use crate::voice::VoiceId;
use rand::Rng;

/// Pitch accepted by the service, in semitones either side of zero.
pub const MAX_PITCH: f64 = 20.0;
/// Speaking rate accepted by the service is `[0.25, 4.0]`; a symmetric
/// jitter around 1.0 must stay above the lower bound.
pub const MAX_SPEED_JITTER: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AudioEncoding {
    #[value(name = "LINEAR16")]
    Linear16,
    #[default]
    #[value(name = "MP3")]
    Mp3,
    #[value(name = "OGG_OPUS")]
    OggOpus,
}

/// Optional symmetric randomization of a numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Jitter(Option<f64>);

impl Jitter {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn up_to(max: f64) -> Self {
        Self(Some(max))
    }

    pub fn from_flag(enabled: bool, max: f64) -> Self {
        if enabled {
            Self::up_to(max)
        } else {
            Self::none()
        }
    }

    pub fn max(&self) -> Option<f64> {
        self.0
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self.0 {
            Some(max) if max > 0.0 => rng.gen_range(-max..=max),
            _ => 0.0,
        }
    }
}

pub fn validate_pitch_jitter(jitter: Jitter) -> anyhow::Result<()> {
    if let Some(max) = jitter.max() {
        if !(0.0..=MAX_PITCH).contains(&max) {
            anyhow::bail!("random pitch range must be within [0, {}], got {}", MAX_PITCH, max);
        }
    }
    Ok(())
}

pub fn validate_speed_jitter(jitter: Jitter) -> anyhow::Result<()> {
    if let Some(max) = jitter.max() {
        if !(0.0..MAX_SPEED_JITTER).contains(&max) {
            anyhow::bail!(
                "random speed range must be within [0, {}), got {}",
                MAX_SPEED_JITTER,
                max
            );
        }
    }
    Ok(())
}

/// `0.0`, or uniform in `[-max, max]`.
pub fn pitch<R: Rng + ?Sized>(jitter: Jitter, rng: &mut R) -> f64 {
    jitter.sample(rng)
}

/// `1.0`, or uniform in `[1 - max, 1 + max]`.
pub fn speaking_rate<R: Rng + ?Sized>(jitter: Jitter, rng: &mut R) -> f64 {
    1.0 + jitter.sample(rng)
}

/// Everything one synthesis call needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: VoiceId,
    pub encoding: AudioEncoding,
    pub pitch: f64,
    pub speaking_rate: f64,
}

impl SynthesisRequest {
    pub fn new<R: Rng + ?Sized>(
        text: &str,
        voice: &VoiceId,
        encoding: AudioEncoding,
        pitch_jitter: Jitter,
        speed_jitter: Jitter,
        rng: &mut R,
    ) -> Self {
        Self {
            text: text.to_owned(),
            voice: voice.clone(),
            encoding,
            pitch: pitch(pitch_jitter, rng),
            speaking_rate: speaking_rate(speed_jitter, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn no_jitter_is_exact() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(pitch(Jitter::none(), &mut rng), 0.0);
            assert_eq!(speaking_rate(Jitter::none(), &mut rng), 1.0);
        }
    }

    #[test]
    fn pitch_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut saw_negative = false;
        for _ in 0..1000 {
            let p = pitch(Jitter::up_to(5.0), &mut rng);
            assert!((-5.0..=5.0).contains(&p), "{}", p);
            saw_negative |= p < 0.0;
        }
        assert!(saw_negative);
    }

    #[test]
    fn speed_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..1000 {
            let s = speaking_rate(Jitter::up_to(0.1), &mut rng);
            assert!((0.9..=1.1).contains(&s), "{}", s);
        }
    }

    #[test]
    fn zero_max_is_identity() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(pitch(Jitter::up_to(0.0), &mut rng), 0.0);
        assert_eq!(speaking_rate(Jitter::up_to(0.0), &mut rng), 1.0);
    }

    #[test]
    fn from_flag() {
        assert_eq!(Jitter::from_flag(false, 5.0), Jitter::none());
        assert_eq!(Jitter::from_flag(true, 5.0).max(), Some(5.0));
    }

    #[test]
    fn validation() {
        assert!(validate_pitch_jitter(Jitter::up_to(5.0)).is_ok());
        assert!(validate_pitch_jitter(Jitter::up_to(20.5)).is_err());
        assert!(validate_pitch_jitter(Jitter::up_to(-1.0)).is_err());
        assert!(validate_speed_jitter(Jitter::up_to(0.1)).is_ok());
        assert!(validate_speed_jitter(Jitter::up_to(0.75)).is_err());
        assert!(validate_speed_jitter(Jitter::none()).is_ok());
    }

    #[test]
    fn request_carries_voice_and_encoding() {
        let mut rng = StdRng::seed_from_u64(4);
        let voice = VoiceId::new("id-ID-Standard-A");
        let request = SynthesisRequest::new(
            "Halo",
            &voice,
            AudioEncoding::OggOpus,
            Jitter::none(),
            Jitter::none(),
            &mut rng,
        );
        assert_eq!(request.text, "Halo");
        assert_eq!(request.voice, voice);
        assert_eq!(request.encoding, AudioEncoding::OggOpus);
        assert_eq!(request.pitch, 0.0);
        assert_eq!(request.speaking_rate, 1.0);
    }
}
