//! Elapsed-time label formatting.

/// Render elapsed seconds as `H:MM:SS`.
///
/// Hours are not padded and never wrap, so a spindle with 1200 hours on it
/// shows `1200:00:00`.
#[must_use]
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds / 60) % 60;
    let secs = seconds % 60;
    format!("{hours}:{minutes:02}:{secs:02}")
}
