//! Placeholder output for degraded mode.

use rand::seq::SliceRandom;

/// Phrases returned by transcription when no provider is reachable.
pub const MOCK_PHRASES: &[&str] = &[
    "Hello",
    "Hello, I'd like to chat with you",
    "What's the weather like today?",
    "Can you help me with a question?",
    "Please tell me an interesting story",
    "What do you think the future of artificial intelligence looks like?",
    "I want to learn something new",
    "Can you recommend some good books?",
    "Has anything interesting happened lately?",
    "I'd like to hear your thoughts",
    "Can we talk about philosophy?",
];

/// A single silent MPEG-1 Layer III frame header padded with zeros.
pub const SILENT_MP3_FRAME: [u8; 24] = [
    0xff, 0xfb, 0x90, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Picks a mock transcription phrase.
#[must_use]
pub fn mock_transcript() -> &'static str {
    MOCK_PHRASES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Hello")
}

/// Returns placeholder audio.
#[must_use]
pub fn silent_audio() -> Vec<u8> {
    SILENT_MP3_FRAME.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_transcript_comes_from_phrase_set() {
        for _ in 0..32 {
            assert!(MOCK_PHRASES.contains(&mock_transcript()));
        }
    }

    #[test]
    fn silent_audio_has_mp3_sync_word() {
        let audio = silent_audio();
        assert_eq!(audio.len(), 24);
        assert_eq!(&audio[..2], &[0xff, 0xfb]);
    }
}
