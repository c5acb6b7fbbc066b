//! Utility functions for naming, formatting and file housekeeping

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Size unit labels used by [`format_size`]
const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Timestamp format for completion records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("ANSI escape pattern is valid")
});

/// Format a byte count for display
///
/// Uses base-1024 units and at most two decimals. Zero is rendered as `0B`.
///
/// # Examples
///
/// ```
/// use media_dl::utils::format_size;
///
/// assert_eq!(format_size(0), "0B");
/// assert_eq!(format_size(1536), "1.5 KB");
/// assert_eq!(format_size(10 * 1024 * 1024), "10.0 MB");
/// ```
#[must_use]
pub fn format_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0B".to_string();
    }

    let mut unit = 0;
    let mut value = size_bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    let mut number = format!("{:.2}", rounded);
    while number.ends_with('0') {
        number.pop();
    }
    if number.ends_with('.') {
        number.push('0');
    }

    format!("{} {}", number, SIZE_UNITS[unit])
}

/// Tag the source platform of a URL
///
/// # Examples
///
/// ```
/// use media_dl::utils::detect_platform;
///
/// assert_eq!(detect_platform("https://youtu.be/abc"), "YouTube");
/// assert_eq!(detect_platform("https://example.com/video1"), "Generic");
/// ```
#[must_use]
pub fn detect_platform(url: &str) -> &'static str {
    let url = url.to_lowercase();
    if url.contains("youtube") || url.contains("youtu.be") {
        "YouTube"
    } else if url.contains("tiktok") {
        "TikTok"
    } else if url.contains("instagram") {
        "Instagram"
    } else {
        "Generic"
    }
}

/// Strip ANSI escape sequences (terminal colours) from extractor output
#[must_use]
pub fn clean_text(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Reduce a media title to characters that are safe in a file name
///
/// Keeps alphanumerics, spaces, `.`, `-` and `_`, then trims trailing whitespace.
#[must_use]
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '-' | '_'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Current local time in [`TIMESTAMP_FORMAT`]
#[must_use]
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Default download directory: `<home>/Downloads/MediaDL`
///
/// Falls back to `./downloads` when no home directory is known.
#[must_use]
pub fn default_download_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join("Downloads").join("MediaDL"))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}

/// Remove a file, logging instead of failing
///
/// Returns `true` if a file was removed.
pub async fn remove_file_best_effort(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed file");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "File already gone");
            false
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove file");
            false
        }
    }
}
