//! Async file, JSON and timing helpers.
//!
//! Responsibility:
//! - tokio::fs wrappers that attach the offending path to I/O and parse
//!   errors
//! - scheduler-friendly JSON (de)serialization
//! - recursive directory traversal as a channel-based producer
//!
//! No cancellation and no retries: the first failure terminates the
//! operation and is surfaced to the caller.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a file to a UTF-8 string.
pub async fn read_file(path: impl AsRef<Path>) -> Result<String, FileError> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FileError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Read and deserialize a JSON file.
pub async fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, FileError> {
    let path = path.as_ref();
    let text = read_file(path).await?;
    serde_json::from_str(&text).map_err(|source| FileError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Deserialize JSON after yielding to the scheduler, so a burst of large
/// payloads does not starve concurrent request handling at the call site.
pub async fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    tokio::task::yield_now().await;
    serde_json::from_str(text)
}

/// Serialize to JSON after yielding to the scheduler.
pub async fn stringify_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    tokio::task::yield_now().await;
    serde_json::to_string(value)
}

/// Suspend for `ms` milliseconds; `0` is a bare yield.
pub async fn wait(ms: u64) {
    if ms == 0 {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

pub type PathFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Options for [`walk_files`] / [`for_each_file`].
pub struct WalkOptions {
    pub dir: PathBuf,
    /// Follow symbolic links. When off, symlinked files and directories are
    /// skipped entirely.
    pub follow_links: bool,
    /// Stop after this many files.
    pub limit: Option<usize>,
    /// Paths for which this returns false are not produced.
    pub filter: Option<PathFilter>,
}

impl WalkOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            follow_links: false,
            limit: None,
            filter: None,
        }
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(mut self, filter: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }
}

/// Walk a directory tree, producing matching file paths over a bounded
/// channel.
///
/// The channel has capacity 1: a slow consumer stalls traversal instead of
/// buffering the whole tree in memory. Dropping the receiver stops the walk.
/// A traversal error is sent as the final item.
pub fn walk_files(options: WalkOptions) -> mpsc::Receiver<io::Result<PathBuf>> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut remaining = options.limit.unwrap_or(usize::MAX);
        let root = options.dir.clone();
        if let Err(e) = walk_dir(&root, &options, &mut remaining, &tx).await {
            let _ = tx.send(Err(e)).await;
        }
    });

    rx
}

fn walk_dir<'a>(
    dir: &'a Path,
    options: &'a WalkOptions,
    remaining: &'a mut usize,
    tx: &'a mpsc::Sender<io::Result<PathBuf>>,
) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = tokio::fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if *remaining == 0 {
                return Ok(());
            }
            let path = entry.path();

            let mut file_type = entry.file_type().await?;
            if file_type.is_symlink() {
                if !options.follow_links {
                    continue;
                }
                // metadata() follows the link
                file_type = tokio::fs::metadata(&path).await?.file_type();
            }

            if file_type.is_dir() {
                walk_dir(&path, options, remaining, tx).await?;
            } else if file_type.is_file() {
                if let Some(filter) = &options.filter
                    && !filter(&path)
                {
                    continue;
                }
                *remaining -= 1;
                if tx.send(Ok(path)).await.is_err() {
                    // receiver gone; stop quietly
                    return Ok(());
                }
            }
        }

        Ok(())
    })
}

/// Drain [`walk_files`], awaiting `callback` once per file. The callback is
/// the backpressure point: traversal does not run ahead of it.
pub async fn for_each_file<F, Fut>(options: WalkOptions, mut callback: F) -> io::Result<()>
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut rx = walk_files(options);
    while let Some(item) = rx.recv().await {
        callback(item?).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"n": 1}"#).unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("sub/c.json"), r#"{"n": 2}"#).unwrap();
        std::fs::write(dir.path().join("sub/deeper/d.txt"), "d").unwrap();
        dir
    }

    #[tokio::test]
    async fn read_json_parses_and_reports_paths() {
        let dir = tree();
        let value: serde_json::Value = read_json(dir.path().join("a.json")).await.unwrap();
        assert_eq!(value["n"], 1);

        let err = read_json::<serde_json::Value>(dir.path().join("b.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Json { .. }));
        assert!(err.to_string().contains("b.txt"));

        let err = read_file(dir.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, FileError::Io { .. }));
    }

    #[tokio::test]
    async fn json_helpers_round_trip() {
        let text = stringify_json(&serde_json::json!({"a": [1, 2]}))
            .await
            .unwrap();
        let value: serde_json::Value = parse_json(&text).await.unwrap();
        assert_eq!(value["a"][1], 2);

        assert!(parse_json::<serde_json::Value>("{nope").await.is_err());
    }

    #[tokio::test]
    async fn for_each_file_visits_all_files() {
        let dir = tree();
        let mut seen = BTreeSet::new();
        for_each_file(WalkOptions::new(dir.path()), |path| {
            seen.insert(path.file_name().unwrap().to_string_lossy().into_owned());
            async {}
        })
        .await
        .unwrap();
        assert_eq!(
            seen.into_iter().collect::<Vec<_>>(),
            ["a.json", "b.txt", "c.json", "d.txt"]
        );
    }

    #[tokio::test]
    async fn for_each_file_honors_filter_and_limit() {
        let dir = tree();

        let mut count = 0;
        for_each_file(
            WalkOptions::new(dir.path()).filter(|p| p.extension().is_some_and(|e| e == "json")),
            |_| {
                count += 1;
                async {}
            },
        )
        .await
        .unwrap();
        assert_eq!(count, 2);

        let mut count = 0;
        for_each_file(WalkOptions::new(dir.path()).limit(3), |_| {
            count += 1;
            async {}
        })
        .await
        .unwrap();
        assert_eq!(count, 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_are_skipped_unless_followed() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path().join("a.json"), dir.path().join("link.json"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path().join("sub"), dir.path().join("sublink")).unwrap();

        let mut paths = Vec::new();
        for_each_file(WalkOptions::new(dir.path()), |p| {
            paths.push(p);
            async {}
        })
        .await
        .unwrap();
        let mut names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        // both links skipped: only the four regular files
        assert_eq!(names, ["a.json", "b.txt", "c.json", "d.txt"]);

        let mut paths = Vec::new();
        for_each_file(WalkOptions::new(dir.path()).follow_links(true), |p| {
            paths.push(p);
            async {}
        })
        .await
        .unwrap();
        // four regular files, the linked file, and sub's two files seen
        // again through the directory link
        assert_eq!(paths.len(), 7);
        assert!(paths.iter().any(|p| p.ends_with("link.json")));
        assert!(
            paths
                .iter()
                .any(|p| p.strip_prefix(dir.path()).unwrap().starts_with("sublink"))
        );
    }

    #[tokio::test]
    async fn walk_reports_missing_root() {
        let err = for_each_file(WalkOptions::new("/definitely/not/here"), |_| async {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn wait_zero_is_a_yield() {
        // Just exercise both branches.
        wait(0).await;
        wait(1).await;
    }
}
