//! Core types for media-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a job
///
/// Allocated from a process-wide counter at submission time and never reused,
/// so it is the only key needed for event routing and cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Create a new JobId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<JobId> for u64 {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Job lifecycle state
///
/// `Pending -> Running -> {Completed | Failed | Cancelled}`. A job can also go
/// straight from `Pending` to `Cancelled` if it is cancelled before its task runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Created, task not yet executing
    Pending,
    /// Driving the extraction adapter
    Running,
    /// Finished successfully; the only state with a result
    Completed,
    /// The adapter reported an unrecoverable error
    Failed,
    /// Cancellation was observed at a check point
    Cancelled,
}

impl JobState {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// What a job produces
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// Best video merged with best audio
    #[default]
    #[serde(rename = "Video + Audio")]
    VideoAudio,
    /// Audio track only, converted to mp3
    #[serde(rename = "Audio Only")]
    AudioOnly,
    /// Cover image only, converted to jpg
    #[serde(rename = "Thumbnail")]
    Thumbnail,
}

/// Preferred video resolution
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Whatever the source offers at the highest quality
    #[default]
    Best,
    /// 2160p, falling back to 1440p
    #[serde(rename = "4K")]
    Uhd4k,
    /// 1080p
    #[serde(rename = "1080p")]
    Fhd1080,
    /// 720p
    #[serde(rename = "720p")]
    Hd720,
    /// 480p
    #[serde(rename = "480p")]
    Sd480,
}

impl Resolution {
    /// Target height in pixels (None for `Best`)
    pub fn height(&self) -> Option<u32> {
        match self {
            Resolution::Best => None,
            Resolution::Uhd4k => Some(2160),
            Resolution::Fhd1080 => Some(1080),
            Resolution::Hd720 => Some(720),
            Resolution::Sd480 => Some(480),
        }
    }
}

/// Per-job options, captured when the job is submitted
///
/// Jobs hold this behind an `Arc` and never mutate it, so later settings
/// changes do not reach jobs that are already in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Directory the output is written to
    pub download_path: PathBuf,
    /// Output mode
    pub mode: OutputMode,
    /// Resolution preference (ignored for audio and thumbnail modes)
    pub resolution: Resolution,
    /// Network proxy URL
    pub proxy: Option<String>,
    /// Netscape-format cookies file
    pub cookies_path: Option<PathBuf>,
    /// Download and embed subtitles
    pub embed_subs: bool,
    /// Keep the thumbnail next to the media file
    pub save_thumbnail: bool,
}

impl JobOptions {
    /// Options with defaults for everything except the target directory
    pub fn new(download_path: impl Into<PathBuf>) -> Self {
        Self {
            download_path: download_path.into(),
            mode: OutputMode::default(),
            resolution: Resolution::default(),
            proxy: None,
            cookies_path: None,
            embed_subs: false,
            save_thumbnail: false,
        }
    }

    /// Set the output mode
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the resolution preference
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Last known progress of a job
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Percent complete (0.0 to 100.0); `None` while the total size is unknown
    pub percent: Option<f32>,
    /// Human-readable transfer rate as reported by the extractor
    pub rate: Option<String>,
}

/// Outcome details of a completed job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// Media title
    pub title: String,
    /// Source platform tag (YouTube, TikTok, Instagram, Generic)
    pub platform: String,
    /// Human-readable size
    pub size: String,
    /// Final output path
    pub path: PathBuf,
    /// Completion timestamp (`%Y-%m-%d %H:%M`, local time)
    pub date: String,
}

/// Point-in-time view of a job in the registry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobInfo {
    /// Job ID
    pub id: JobId,
    /// Source URL
    pub url: String,
    /// Options snapshot
    pub options: JobOptions,
    /// Lifecycle state
    pub state: JobState,
    /// Last known progress
    pub progress: Progress,
    /// Present if and only if `state == Completed`
    pub result: Option<JobResult>,
    /// Failure message, present only when `state == Failed`
    pub error: Option<String>,
}

/// Event emitted during a job's lifecycle
///
/// Delivered through a broadcast channel. Events for one job arrive in the
/// order they were emitted; there is no ordering across jobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job registered
    Queued {
        /// Job ID
        id: JobId,
        /// Source URL
        url: String,
    },

    /// Job task started driving the adapter
    Started {
        /// Job ID
        id: JobId,
    },

    /// Informational message (e.g. resolved title)
    Log {
        /// Job ID
        id: JobId,
        /// Message text
        message: String,
    },

    /// Transfer progress
    Progress {
        /// Job ID
        id: JobId,
        /// Percent complete, `None` when indeterminate
        #[serde(skip_serializing_if = "Option::is_none")]
        percent: Option<f32>,
        /// Transfer rate string
        #[serde(skip_serializing_if = "Option::is_none")]
        rate: Option<String>,
    },

    /// Job completed successfully
    Completed {
        /// Job ID
        id: JobId,
        /// Outcome details
        result: JobResult,
    },

    /// Job failed
    Failed {
        /// Job ID
        id: JobId,
        /// Error message
        error: String,
    },

    /// Job stopped on request
    Cancelled {
        /// Job ID
        id: JobId,
    },

    /// A completed job could not be recorded in history
    PersistenceWarning {
        /// Job ID
        id: JobId,
        /// Error message
        message: String,
    },

    /// Downloader is shutting down
    Shutdown,
}

impl Event {
    /// The job this event belongs to, if any
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Event::Queued { id, .. }
            | Event::Started { id }
            | Event::Log { id, .. }
            | Event::Progress { id, .. }
            | Event::Completed { id, .. }
            | Event::Failed { id, .. }
            | Event::Cancelled { id }
            | Event::PersistenceWarning { id, .. } => Some(*id),
            Event::Shutdown => None,
        }
    }

    /// Whether this event marks the end of a job
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::Completed { .. } | Event::Failed { .. } | Event::Cancelled { .. }
        )
    }
}

/// Completed download record in the history ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Ledger row id
    pub id: i64,
    /// Media title
    pub title: String,
    /// Source platform tag
    pub platform: String,
    /// Human-readable size
    pub size: String,
    /// Output file path
    pub path: PathBuf,
    /// Completion timestamp string
    pub date: String,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_round_trips_through_display() {
        let id = JobId(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<JobId>().unwrap(), id);
    }

    #[test]
    fn terminal_states() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
    }

    #[test]
    fn output_mode_uses_settings_labels() {
        assert_eq!(
            serde_json::to_string(&OutputMode::AudioOnly).unwrap(),
            "\"Audio Only\""
        );
        let mode: OutputMode = serde_json::from_str("\"Video + Audio\"").unwrap();
        assert_eq!(mode, OutputMode::VideoAudio);
    }

    #[test]
    fn resolution_labels_and_heights() {
        let res: Resolution = serde_json::from_str("\"1080p\"").unwrap();
        assert_eq!(res, Resolution::Fhd1080);
        assert_eq!(res.height(), Some(1080));
        assert_eq!(serde_json::to_string(&Resolution::Uhd4k).unwrap(), "\"4K\"");
        assert_eq!(Resolution::Best.height(), None);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::Progress {
            id: JobId(3),
            percent: None,
            rate: Some("1.2MiB/s".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["id"], 3);
        assert!(json.get("percent").is_none());
        assert_eq!(event.job_id(), Some(JobId(3)));
        assert!(!event.is_terminal());
    }
}
