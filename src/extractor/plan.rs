//! Translation of job options into an extraction plan

use crate::config::ExtractorConfig;
use crate::types::{JobOptions, OutputMode, Resolution};
use std::path::{Path, PathBuf};

/// Post-processing step requested from the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// Extract the audio track and convert it to `codec`
    ExtractAudio {
        /// Target codec (e.g. "mp3")
        codec: String,
    },
    /// Convert the downloaded thumbnail to `format`
    ConvertThumbnail {
        /// Target image format (e.g. "jpg")
        format: String,
    },
}

/// Everything an adapter needs to know to perform one job
///
/// Built once per job from its [`JobOptions`] snapshot and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    /// Output mode the plan was built for
    pub mode: OutputMode,
    /// Directory the output lands in
    pub output_dir: PathBuf,
    /// Output template understood by the extractor
    pub output_template: String,
    /// Format selector; `None` when no media is downloaded
    pub format: Option<String>,
    /// Container to merge separate video and audio streams into
    pub merge_output_format: Option<String>,
    /// Post-processing steps, in order
    pub post_processors: Vec<PostProcessor>,
    /// Only fetch the thumbnail
    pub skip_download: bool,
    /// Write the thumbnail next to the media
    pub write_thumbnail: bool,
    /// Download subtitles and embed them
    pub embed_subs: bool,
    /// Parallel fragment downloads for segmented streams
    pub concurrent_fragments: Option<u32>,
    /// Extractor-side retry count
    pub retries: u32,
    /// Network proxy
    pub proxy: Option<String>,
    /// Cookies file
    pub cookies_path: Option<PathBuf>,
    /// Location of the media-processing binary, when installed
    pub processor_location: Option<PathBuf>,
}

impl DownloadPlan {
    /// Build the plan for a job
    pub fn from_options(options: &JobOptions, extractor: &ExtractorConfig) -> Self {
        let dir = &options.download_path;

        let mut plan = Self {
            mode: options.mode,
            output_dir: dir.clone(),
            output_template: template(dir, "%(title)s.%(ext)s"),
            format: None,
            merge_output_format: None,
            post_processors: Vec::new(),
            skip_download: false,
            write_thumbnail: false,
            embed_subs: false,
            concurrent_fragments: None,
            retries: extractor.retries,
            proxy: options.proxy.clone().filter(|p| !p.is_empty()),
            cookies_path: options.cookies_path.clone(),
            processor_location: None,
        };

        match options.mode {
            OutputMode::Thumbnail => {
                // No extension: the converter appends ".jpg"
                plan.output_template = template(dir, "%(title)s");
                plan.skip_download = true;
                plan.write_thumbnail = true;
                plan.post_processors.push(PostProcessor::ConvertThumbnail {
                    format: "jpg".to_string(),
                });
            }
            OutputMode::AudioOnly => {
                plan.apply_media_options(options, extractor);
                plan.format = Some("bestaudio/best".to_string());
                plan.post_processors.push(PostProcessor::ExtractAudio {
                    codec: "mp3".to_string(),
                });
            }
            OutputMode::VideoAudio => {
                plan.apply_media_options(options, extractor);
                plan.format = Some(video_format(options.resolution));
                plan.merge_output_format = Some("mp4".to_string());
            }
        }

        plan
    }

    /// Point the extractor at an installed media-processing binary
    pub fn with_processor_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.processor_location = Some(location.into());
        self
    }

    fn apply_media_options(&mut self, options: &JobOptions, extractor: &ExtractorConfig) {
        self.write_thumbnail = options.save_thumbnail;
        self.embed_subs = options.embed_subs;
        self.concurrent_fragments = Some(extractor.concurrent_fragments);
    }
}

fn template(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

/// Format selector for a resolution preference
///
/// Prefers an exact height, then anything taller, then whatever is best.
fn video_format(resolution: Resolution) -> String {
    match resolution {
        Resolution::Best => "bestvideo+bestaudio/best".to_string(),
        Resolution::Uhd4k => {
            "bestvideo[height>=2160]+bestaudio/bestvideo[height>=1440]+bestaudio/best".to_string()
        }
        Resolution::Fhd1080 | Resolution::Hd720 | Resolution::Sd480 => {
            let h = resolution.height().unwrap_or_default();
            format!("bestvideo[height={h}]+bestaudio/bestvideo[height>={h}]+bestaudio/best")
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn options(mode: OutputMode) -> JobOptions {
        JobOptions::new("/media").with_mode(mode)
    }

    #[test]
    fn video_plan_merges_to_mp4() {
        let plan = DownloadPlan::from_options(
            &options(OutputMode::VideoAudio),
            &ExtractorConfig::default(),
        );

        assert_eq!(plan.format.as_deref(), Some("bestvideo+bestaudio/best"));
        assert_eq!(plan.merge_output_format.as_deref(), Some("mp4"));
        assert_eq!(
            plan.output_template,
            Path::new("/media").join("%(title)s.%(ext)s").to_string_lossy()
        );
        assert_eq!(plan.concurrent_fragments, Some(16));
        assert_eq!(plan.retries, 30);
        assert!(plan.post_processors.is_empty());
        assert!(!plan.skip_download);
    }

    #[test]
    fn resolution_selectors() {
        let config = ExtractorConfig::default();
        let format_for = |res| {
            DownloadPlan::from_options(&options(OutputMode::VideoAudio).with_resolution(res), &config)
                .format
                .unwrap()
        };

        assert_eq!(
            format_for(Resolution::Uhd4k),
            "bestvideo[height>=2160]+bestaudio/bestvideo[height>=1440]+bestaudio/best"
        );
        assert_eq!(
            format_for(Resolution::Fhd1080),
            "bestvideo[height=1080]+bestaudio/bestvideo[height>=1080]+bestaudio/best"
        );
        assert_eq!(
            format_for(Resolution::Hd720),
            "bestvideo[height=720]+bestaudio/bestvideo[height>=720]+bestaudio/best"
        );
        assert_eq!(
            format_for(Resolution::Sd480),
            "bestvideo[height=480]+bestaudio/bestvideo[height>=480]+bestaudio/best"
        );
    }

    #[test]
    fn audio_plan_extracts_mp3() {
        let plan =
            DownloadPlan::from_options(&options(OutputMode::AudioOnly), &ExtractorConfig::default());

        assert_eq!(plan.format.as_deref(), Some("bestaudio/best"));
        assert_eq!(plan.merge_output_format, None);
        assert_eq!(
            plan.post_processors,
            vec![PostProcessor::ExtractAudio {
                codec: "mp3".into()
            }]
        );
    }

    #[test]
    fn thumbnail_plan_skips_media() {
        let mut opts = options(OutputMode::Thumbnail);
        opts.embed_subs = true;
        let plan = DownloadPlan::from_options(&opts, &ExtractorConfig::default());

        assert!(plan.skip_download);
        assert!(plan.write_thumbnail);
        assert_eq!(plan.format, None);
        assert!(!plan.embed_subs, "subtitles only apply to media downloads");
        assert_eq!(plan.concurrent_fragments, None);
        assert_eq!(
            plan.output_template,
            Path::new("/media").join("%(title)s").to_string_lossy()
        );
    }

    #[test]
    fn media_plan_honours_side_options() {
        let mut opts = options(OutputMode::VideoAudio);
        opts.save_thumbnail = true;
        opts.embed_subs = true;
        opts.proxy = Some("http://proxy:8080".into());
        opts.cookies_path = Some(PathBuf::from("/cookies.txt"));

        let plan = DownloadPlan::from_options(&opts, &ExtractorConfig::default())
            .with_processor_location("/opt/ffmpeg");

        assert!(plan.write_thumbnail);
        assert!(plan.embed_subs);
        assert_eq!(plan.proxy.as_deref(), Some("http://proxy:8080"));
        assert_eq!(plan.cookies_path, Some(PathBuf::from("/cookies.txt")));
        assert_eq!(plan.processor_location, Some(PathBuf::from("/opt/ffmpeg")));
    }
}
