// FormatSelector - picks the single best playable format
//
// Filters out formats a browser player cannot use directly (audio-only,
// missing URL, anything that is neither HLS nor an MP4 file) and ranks the
// rest by resolution area, then bitrate, then file size.

use super::extractors::CandidateFormat;
use super::models::{StreamKind, StreamSource};

/// A format that survived filtering, with its kind and score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedFormat<'a> {
    pub kind: StreamKind,
    pub format: &'a CandidateFormat,
    pub score: u64,
}

impl SelectedFormat<'_> {
    /// Only constructed for formats with a URL, so this never yields an empty one
    pub fn to_source(&self) -> StreamSource {
        StreamSource::new(self.kind, self.format.url.clone().unwrap_or_default())
    }
}

/// Format selector with the resolution/bitrate/size heuristic
pub struct FormatSelector;

impl FormatSelector {
    /// Classify a format as HLS (by protocol) or MP4 (by container)
    pub fn classify(format: &CandidateFormat) -> Option<StreamKind> {
        if format.protocol.as_deref().map_or(false, |p| p.contains("m3u8")) {
            Some(StreamKind::Hls)
        } else if format.ext.as_deref() == Some("mp4") {
            Some(StreamKind::Mp4)
        } else {
            None
        }
    }

    /// `(height × width) × 1000 + bitrate × 1000 + size`, missing values as zero.
    ///
    /// Not normalized: a measured resolution outranks any bitrate on an
    /// unmeasured one.
    pub fn score(format: &CandidateFormat) -> u64 {
        let area = u64::from(format.height.unwrap_or(0)) * u64::from(format.width.unwrap_or(0));
        // Float-to-int `as` saturates; negative and NaN become 0
        let bitrate = (format.tbr.unwrap_or(0.0) * 1000.0) as u64;
        let size = format.effective_size().unwrap_or(0);

        area.saturating_mul(1000)
            .saturating_add(bitrate)
            .saturating_add(size)
    }

    /// Filter and classify one format
    fn candidate(format: &CandidateFormat) -> Option<SelectedFormat<'_>> {
        if format.url.as_deref().map_or(true, str::is_empty) {
            return None;
        }
        if format.is_audio_only() {
            return None;
        }
        let kind = Self::classify(format)?;
        Some(SelectedFormat {
            kind,
            format,
            score: Self::score(format),
        })
    }

    /// All formats that survive filtering, in input order
    pub fn playable(formats: &[CandidateFormat]) -> Vec<SelectedFormat<'_>> {
        formats.iter().filter_map(Self::candidate).collect()
    }

    /// Pick the highest-scoring playable format; the earliest one wins ties
    pub fn select_best(formats: &[CandidateFormat]) -> Option<SelectedFormat<'_>> {
        // `Iterator::max_by_key` keeps the last maximum, so fold with a strict comparison
        formats
            .iter()
            .filter_map(Self::candidate)
            .fold(None, |best: Option<SelectedFormat<'_>>, next| match best {
                Some(current) if current.score >= next.score => Some(current),
                _ => Some(next),
            })
    }
}
