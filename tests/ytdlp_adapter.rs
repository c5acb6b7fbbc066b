//! YtDlpAdapter against a stand-in executable
//!
//! A small shell script speaks just enough of the yt-dlp command line to
//! exercise metadata parsing, progress lines, the final path and process kill.

#![cfg(unix)]

mod common;

use common::{WaitResult, create_downloader, wait_for_progress, wait_for_terminal};
use media_dl::extractor::YtDlpAdapter;
use media_dl::{JobOptions, OutputMode};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(20);

/// Emits a fixed info document, then three progress lines and the output path
///
/// With `--skip-download` it writes the cover image and prints nothing, as
/// yt-dlp skips the after_move stage when no media is downloaded.
const FAKE_YTDLP: &str = r#"#!/bin/sh
out=""
prev=""
skip=0
for arg in "$@"; do
  if [ "$arg" = "--dump-single-json" ]; then
    echo '{"title":"Fake Clip","filesize":2048}'
    exit 0
  fi
  if [ "$arg" = "--skip-download" ]; then skip=1; fi
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
dir=$(dirname "$out")
mkdir -p "$dir"
if [ "$skip" = 1 ]; then
  printf 'jpg' > "$dir/Fake Clip.jpg"
  exit 0
fi
echo "[media-dl] 0 2048 NA 1.00MiB/s"
echo "[media-dl] 1024 2048 NA 1.00MiB/s"
echo "[media-dl] 2048 2048 NA 1.00MiB/s"
printf 'media' > "$dir/Fake Clip.mp4"
echo "$dir/Fake Clip.mp4"
"#;

/// Metadata works, the download never finishes on its own
const SLOW_YTDLP: &str = r#"#!/bin/sh
for arg in "$@"; do
  if [ "$arg" = "--dump-single-json" ]; then
    echo '{"title":"Endless","filesize_approx":1000000.0}'
    exit 0
  fi
done
i=0
while true; do
  i=$((i + 1000))
  echo "[media-dl] $i NA 1000000 500.00KiB/s"
  sleep 0.1
done
"#;

/// Refuses every URL the way yt-dlp does for private media
const PRIVATE_YTDLP: &str = r#"#!/bin/sh
echo "ERROR: [youtube] abc: Private video. Sign in if you've been granted access" >&2
exit 1
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// All scenarios live in one test so no script is still open for writing while
// another test forks a child process.
#[tokio::test]
async fn test_ytdlp_adapter_scenarios() {
    let scripts = tempfile::tempdir().unwrap();
    let fake = write_script(scripts.path(), "yt-dlp-fake", FAKE_YTDLP);
    let slow = write_script(scripts.path(), "yt-dlp-slow", SLOW_YTDLP);
    let private = write_script(scripts.path(), "yt-dlp-private", PRIVATE_YTDLP);

    // Successful download
    {
        let (downloader, dir) = create_downloader(Arc::new(YtDlpAdapter::new(fake.clone()))).await;
        let mut events = downloader.subscribe();
        let options = JobOptions::new(dir.path().join("downloads")).with_mode(OutputMode::VideoAudio);

        let id = downloader
            .submit("https://www.youtube.com/watch?v=abc", options)
            .await
            .unwrap();
        let (outcome, seen) = wait_for_terminal(&mut events, id, TIMEOUT).await;

        let WaitResult::Completed(result) = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };
        assert_eq!(result.title, "Fake Clip");
        assert_eq!(result.size, "2.0 KB");
        assert_eq!(result.path, dir.path().join("downloads").join("Fake Clip.mp4"));
        assert!(result.path.exists());

        let progress: Vec<(Option<f32>, Option<String>)> = seen
            .iter()
            .filter_map(|e| match e {
                media_dl::Event::Progress { percent, rate, .. } => Some((*percent, rate.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 3);
        assert_eq!(progress[0].0, Some(0.0));
        assert_eq!(progress[1].0, Some(50.0));
        assert_eq!(progress[2].0, Some(100.0));
        assert_eq!(progress[2].1.as_deref(), Some("1.00MiB/s"));
    }

    // Thumbnail only: no path is printed
    {
        let (downloader, dir) = create_downloader(Arc::new(YtDlpAdapter::new(fake.clone()))).await;
        let mut events = downloader.subscribe();
        let options = JobOptions::new(dir.path().join("downloads")).with_mode(OutputMode::Thumbnail);

        let id = downloader
            .submit("https://www.youtube.com/watch?v=abc", options)
            .await
            .unwrap();
        let (outcome, _) = wait_for_terminal(&mut events, id, TIMEOUT).await;

        let WaitResult::Completed(result) = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };
        assert_eq!(result.path, dir.path().join("downloads").join("Fake Clip.jpg"));
        assert!(result.path.exists());
    }

    // Cancellation kills the running process
    {
        let (downloader, dir) = create_downloader(Arc::new(YtDlpAdapter::new(slow))).await;
        let mut events = downloader.subscribe();

        let id = downloader
            .submit("https://youtu.be/endless", JobOptions::new(dir.path().join("downloads")))
            .await
            .unwrap();
        assert!(wait_for_progress(&mut events, id, TIMEOUT).await);
        downloader.cancel(id).await.unwrap();

        let (outcome, _) = wait_for_terminal(&mut events, id, TIMEOUT).await;
        assert!(matches!(outcome, WaitResult::Cancelled), "{:?}", outcome);
        assert_eq!(downloader.db.count_history().await.unwrap(), 0);
    }

    // Tool failure surfaces as a failed job
    {
        let (downloader, dir) = create_downloader(Arc::new(YtDlpAdapter::new(private))).await;
        let mut events = downloader.subscribe();

        let id = downloader
            .submit("https://youtu.be/abc", JobOptions::new(dir.path().join("downloads")))
            .await
            .unwrap();
        let (outcome, _) = wait_for_terminal(&mut events, id, TIMEOUT).await;

        match outcome {
            WaitResult::Failed(error) => assert!(error.contains("Private video"), "{}", error),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
