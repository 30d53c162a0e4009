//! On-disk naming: `AudioFiles/player_{sanitized}/sample_{ticks}.wav`.

use std::path::Path;

/// Directory under the data dir that holds every speaker folder.
pub const AUDIO_DIR: &str = "AudioFiles";

const SPEAKER_PREFIX: &str = "player_";
const SAMPLE_PREFIX: &str = "sample_";
const SAMPLE_EXT: &str = ".wav";

/// Make a speaker id safe to use as one path component.
///
/// ASCII letters, digits, `-` and `_` are kept; everything else becomes `_`.
pub fn sanitize_speaker_id(speaker_id: &str) -> String {
    speaker_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn speaker_dir_name(speaker_id: &str) -> String {
    format!("{SPEAKER_PREFIX}{}", sanitize_speaker_id(speaker_id))
}

/// Inverse of [`speaker_dir_name`] (yields the sanitized id).
pub fn speaker_from_dir_name(name: &str) -> Option<&str> {
    name.strip_prefix(SPEAKER_PREFIX).filter(|s| !s.is_empty())
}

pub fn sample_file_name(ticks: u64) -> String {
    format!("{SAMPLE_PREFIX}{ticks}{SAMPLE_EXT}")
}

/// Creation ticks encoded in a sample file name, if it is one of ours.
pub fn sample_ticks(path: &Path) -> Option<u64> {
    path.file_name()?
        .to_str()?
        .strip_prefix(SAMPLE_PREFIX)?
        .strip_suffix(SAMPLE_EXT)?
        .parse()
        .ok()
}
