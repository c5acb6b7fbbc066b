//! `yt-dlp` command-line adapter

use super::{
    DownloadPlan, ExtractionAdapter, MediaMetadata, PostProcessor, ProgressReporter,
    ProgressUpdate,
};
use crate::config::ExtractorConfig;
use crate::error::ExtractionError;
use crate::utils::clean_text;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

/// Marker prefixed to progress lines so they can be told apart from other output
const PROGRESS_PREFIX: &str = "[media-dl]";

/// Extraction adapter backed by the `yt-dlp` executable
///
/// # Examples
///
/// ```no_run
/// use media_dl::extractor::YtDlpAdapter;
///
/// let adapter = YtDlpAdapter::from_path().expect("yt-dlp not found in PATH");
/// ```
pub struct YtDlpAdapter {
    binary_path: PathBuf,
}

/// Subset of the `--dump-single-json` document we use
#[derive(Debug, Deserialize)]
struct InfoJson {
    title: Option<String>,
    filesize: Option<u64>,
    filesize_approx: Option<f64>,
    #[serde(rename = "_filename")]
    filename: Option<PathBuf>,
}

impl YtDlpAdapter {
    /// Create an adapter with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Use the configured binary, falling back to a PATH lookup
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractionError> {
        match &config.ytdlp_path {
            Some(path) => Ok(Self::new(path.clone())),
            None => Self::from_path()
                .ok_or_else(|| ExtractionError::ToolNotFound("yt-dlp not found in PATH".into())),
        }
    }

    /// Path of the executable this adapter runs
    pub fn binary_path(&self) -> &std::path::Path {
        &self.binary_path
    }

    /// Arguments shared by metadata and download invocations
    fn common_args(plan: &DownloadPlan) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--no-warnings".into(),
            "--no-color".into(),
            "--no-playlist".into(),
            "--retries".into(),
            plan.retries.to_string().into(),
            "-o".into(),
            plan.output_template.clone().into(),
        ];

        if let Some(format) = &plan.format {
            args.push("-f".into());
            args.push(format.into());
        }
        if let Some(proxy) = &plan.proxy {
            args.push("--proxy".into());
            args.push(proxy.into());
        }
        if let Some(cookies) = &plan.cookies_path {
            args.push("--cookies".into());
            args.push(cookies.into());
        }
        if let Some(location) = &plan.processor_location {
            args.push("--ffmpeg-location".into());
            args.push(location.into());
        }

        args
    }

    fn metadata_args(url: &str, plan: &DownloadPlan) -> Vec<OsString> {
        let mut args = Self::common_args(plan);
        args.push("--dump-single-json".into());
        args.push("--".into());
        args.push(url.into());
        args
    }

    fn download_args(url: &str, plan: &DownloadPlan) -> Vec<OsString> {
        let mut args = Self::common_args(plan);

        args.push("--newline".into());
        args.push("--progress".into());
        args.push("--progress-template".into());
        args.push(
            format!(
                "download:{} %(progress.downloaded_bytes)s %(progress.total_bytes)s \
                 %(progress.total_bytes_estimate)s %(progress._speed_str)s",
                PROGRESS_PREFIX
            )
            .into(),
        );
        args.push("--print".into());
        args.push("after_move:filepath".into());

        if plan.skip_download {
            args.push("--skip-download".into());
        }
        if plan.write_thumbnail {
            args.push("--write-thumbnail".into());
        }
        if plan.embed_subs {
            args.push("--write-subs".into());
            args.push("--embed-subs".into());
        }
        if let Some(container) = &plan.merge_output_format {
            args.push("--merge-output-format".into());
            args.push(container.into());
        }
        if let Some(n) = plan.concurrent_fragments {
            args.push("--concurrent-fragments".into());
            args.push(n.to_string().into());
        }
        for step in &plan.post_processors {
            match step {
                PostProcessor::ExtractAudio { codec } => {
                    args.push("--extract-audio".into());
                    args.push("--audio-format".into());
                    args.push(codec.into());
                }
                PostProcessor::ConvertThumbnail { format } => {
                    args.push("--convert-thumbnails".into());
                    args.push(format.into());
                }
            }
        }

        args.push("--".into());
        args.push(url.into());
        args
    }

    fn spawn_error(&self, e: std::io::Error) -> ExtractionError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractionError::ToolNotFound(self.binary_path.display().to_string())
        } else {
            ExtractionError::Process {
                exit_code: None,
                stderr: format!("failed to execute yt-dlp: {}", e),
            }
        }
    }
}

#[async_trait]
impl ExtractionAdapter for YtDlpAdapter {
    async fn resolve_metadata(
        &self,
        url: &str,
        plan: &DownloadPlan,
    ) -> Result<MediaMetadata, ExtractionError> {
        let output = Command::new(&self.binary_path)
            .args(Self::metadata_args(url, plan))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(classify_failure(
                output.status.code(),
                &String::from_utf8_lossy(&output.stderr),
            ));
        }

        parse_info_json(&output.stdout)
    }

    async fn download(
        &self,
        url: &str,
        plan: &DownloadPlan,
        reporter: &ProgressReporter,
    ) -> Result<PathBuf, ExtractionError> {
        let mut child = Command::new(&self.binary_path)
            .args(Self::download_args(url, plan))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ExtractionError::InvalidOutput("yt-dlp stdout was not captured".into())
        })?;

        // Drain stderr concurrently so a chatty process never blocks on a full pipe
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut final_path: Option<PathBuf> = None;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ExtractionError::InvalidOutput(e.to_string()))?
        {
            if let Some(update) = parse_progress_line(&line) {
                if reporter.report(update).is_break() {
                    tracing::debug!(adapter = self.name(), "Stopping yt-dlp on request");
                    if let Err(e) = child.kill().await {
                        tracing::warn!(error = %e, "Failed to kill yt-dlp process");
                    }
                    return Err(ExtractionError::Aborted);
                }
            } else {
                let line = line.trim();
                if !line.is_empty() {
                    final_path = Some(PathBuf::from(line));
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ExtractionError::InvalidOutput(e.to_string()))?;

        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(classify_failure(status.code(), &stderr));
        }

        match final_path {
            Some(path) => Ok(path),
            // No post-processing runs without a media download, so nothing is printed
            None if plan.skip_download => Ok(plan.output_dir.clone()),
            None => Err(ExtractionError::InvalidOutput(
                "yt-dlp did not report an output path".into(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

fn parse_info_json(stdout: &[u8]) -> Result<MediaMetadata, ExtractionError> {
    let info: InfoJson = serde_json::from_slice(stdout)
        .map_err(|e| ExtractionError::InvalidOutput(format!("invalid info JSON: {}", e)))?;

    Ok(MediaMetadata {
        title: info
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Unknown Media".to_string()),
        size_hint: info
            .filesize
            .or_else(|| info.filesize_approx.map(|approx| approx.max(0.0) as u64)),
        filename: info.filename,
    })
}

/// Parse a line produced by our `--progress-template`
///
/// Fields yt-dlp cannot fill in are printed as `NA`.
fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let rest = line.trim_start().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.trim_start().splitn(4, ' ');

    let number = |field: Option<&str>| -> Option<u64> {
        let field = field?.trim();
        field
            .parse::<u64>()
            .ok()
            .or_else(|| field.parse::<f64>().ok().map(|v| v.max(0.0) as u64))
    };

    let downloaded_bytes = number(fields.next()).unwrap_or(0);
    let total = number(fields.next());
    let estimate = number(fields.next());
    let rate = fields
        .next()
        .map(|r| clean_text(r).trim().to_string())
        .filter(|r| !r.is_empty() && r != "NA" && r != "Unknown");

    Some(ProgressUpdate {
        downloaded_bytes,
        total_bytes: total.or(estimate).filter(|t| *t > 0),
        rate,
    })
}

fn classify_failure(exit_code: Option<i32>, stderr: &str) -> ExtractionError {
    let message = clean_text(stderr)
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim()
        .to_string();
    let lower = message.to_lowercase();

    if lower.contains("unsupported url")
        || lower.contains("private video")
        || lower.contains("video unavailable")
        || lower.contains("not available")
    {
        ExtractionError::Unavailable(message)
    } else if lower.contains("unable to download")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("getaddrinfo")
    {
        ExtractionError::Network(message)
    } else {
        ExtractionError::Process {
            exit_code,
            stderr: message,
        }
    }
}
