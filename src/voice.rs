use std::fmt;
use std::str::FromStr;

/// A Text-to-Speech voice name such as `id-ID-Wavenet-B`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `id-ID-Wavenet-B` -> `id-ID`.
    pub fn language_code(&self) -> String {
        self.0.splitn(3, '-').take(2).collect::<Vec<_>>().join("-")
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VoiceId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            anyhow::bail!("voice name is empty");
        }
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_code_takes_two_segments() {
        assert_eq!(VoiceId::new("id-ID-Wavenet-B").language_code(), "id-ID");
        assert_eq!(VoiceId::new("en-US-Studio-O").language_code(), "en-US");
        assert_eq!(VoiceId::new("cmn-CN-Standard-A").language_code(), "cmn-CN");
    }

    #[test]
    fn short_names() {
        assert_eq!(VoiceId::new("en-US").language_code(), "en-US");
        assert_eq!(VoiceId::new("en").language_code(), "en");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!("  ".parse::<VoiceId>().is_err());
        assert_eq!("en-GB-Neural2-A".parse::<VoiceId>().unwrap().as_str(), "en-GB-Neural2-A");
    }
}
