use crate::request::{AudioEncoding, SynthesisRequest};
use async_trait::async_trait;
use google_cognitive_apis::api::grpc::google::cloud::texttospeech::v1::{
    synthesis_input::InputSource, AudioConfig, AudioEncoding as GoogleAudioEncoding,
    ListVoicesRequest, SsmlVoiceGender, SynthesisInput, SynthesizeSpeechRequest,
    VoiceSelectionParams,
};
use google_cognitive_apis::texttospeech::synthesizer::Synthesizer;

/// The remote text-to-speech service.
#[async_trait]
pub trait SpeechSynthesizer: Send {
    /// Returns the raw audio payload for one request.
    async fn synthesize(&mut self, request: &SynthesisRequest) -> anyhow::Result<Vec<u8>>;

    /// Returns the voice catalog in printable form.
    async fn list_voices(&mut self) -> anyhow::Result<String>;
}

pub struct GoogleSynthesizer {
    synthesizer: Synthesizer,
}

impl GoogleSynthesizer {
    /// `credentials` is the service account JSON, not a path.
    pub async fn create(credentials: String) -> anyhow::Result<Self> {
        let synthesizer = Synthesizer::create(credentials)
            .await
            .map_err(|e| anyhow::anyhow!("Synthesizer::create error: {:?}", e))?;
        Ok(Self { synthesizer })
    }
}

impl From<AudioEncoding> for GoogleAudioEncoding {
    fn from(encoding: AudioEncoding) -> Self {
        match encoding {
            AudioEncoding::Linear16 => GoogleAudioEncoding::Linear16,
            AudioEncoding::Mp3 => GoogleAudioEncoding::Mp3,
            AudioEncoding::OggOpus => GoogleAudioEncoding::OggOpus,
        }
    }
}

fn speech_request(request: &SynthesisRequest) -> SynthesizeSpeechRequest {
    SynthesizeSpeechRequest {
        input: Some(SynthesisInput {
            input_source: Some(InputSource::Text(request.text.clone())),
        }),
        voice: Some(VoiceSelectionParams {
            language_code: request.voice.language_code(),
            name: request.voice.as_str().to_owned(),
            ssml_gender: SsmlVoiceGender::Unspecified as i32,
        }),
        audio_config: Some(AudioConfig {
            audio_encoding: GoogleAudioEncoding::from(request.encoding) as i32,
            speaking_rate: request.speaking_rate,
            pitch: request.pitch,
            volume_gain_db: 0f64,
            // Zero lets the service pick the voice's native rate.
            sample_rate_hertz: 0,
            effects_profile_id: vec![],
        }),
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSynthesizer {
    async fn synthesize(&mut self, request: &SynthesisRequest) -> anyhow::Result<Vec<u8>> {
        log::trace!("Synthesizing {:?} with {}", &request.text, request.voice);
        let start_time = std::time::Instant::now();
        let response = self
            .synthesizer
            .synthesize_speech(speech_request(request))
            .await
            .map_err(|e| anyhow::anyhow!("synthesize_speech error: {:?}", e))?;

        let data: Vec<u8> = response.audio_content;
        log::trace!(
            "synthesize_speech took {}ms, {} bytes input, {} bytes output",
            start_time.elapsed().as_millis(),
            request.text.len(),
            data.len()
        );
        Ok(data)
    }

    async fn list_voices(&mut self) -> anyhow::Result<String> {
        let response = self
            .synthesizer
            .list_voices(ListVoicesRequest {
                language_code: String::new(),
            })
            .await
            .map_err(|e| anyhow::anyhow!("list_voices error: {:?}", e))?;
        log::debug!("Service returned {} voices", response.voices.len());
        Ok(format!("{:#?}", response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::VoiceId;

    #[test]
    fn builds_grpc_request() {
        let request = SynthesisRequest {
            text: "Selamat pagi".to_owned(),
            voice: VoiceId::new("id-ID-Wavenet-B"),
            encoding: AudioEncoding::OggOpus,
            pitch: -2.5,
            speaking_rate: 1.05,
        };
        let grpc = speech_request(&request);

        let voice = grpc.voice.unwrap();
        assert_eq!(voice.language_code, "id-ID");
        assert_eq!(voice.name, "id-ID-Wavenet-B");

        let audio = grpc.audio_config.unwrap();
        assert_eq!(audio.audio_encoding, GoogleAudioEncoding::OggOpus as i32);
        assert_eq!(audio.pitch, -2.5);
        assert_eq!(audio.speaking_rate, 1.05);

        match grpc.input.unwrap().input_source.unwrap() {
            InputSource::Text(text) => assert_eq!(text, "Selamat pagi"),
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn encoding_mapping() {
        assert_eq!(
            GoogleAudioEncoding::from(AudioEncoding::Linear16),
            GoogleAudioEncoding::Linear16
        );
        assert_eq!(GoogleAudioEncoding::from(AudioEncoding::Mp3), GoogleAudioEncoding::Mp3);
    }
}
