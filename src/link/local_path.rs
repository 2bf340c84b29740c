// src/link/local_path.rs
// =============================================================================
// Maps a canonical URL to the file that holds its mirrored copy.
//
// Layout:   <root>/<host>/<path>
//   http://example.com/            -> <root>/example.com/index.html
//   http://example.com/docs/intro  -> <root>/example.com/docs/intro
//   http://cdn.org:8080/a/b.css    -> <root>/cdn.org:8080/a/b.css
//
// This is a pure function of its inputs: nothing is created on disk here.
// The page processor creates the directory right before writing.
// =============================================================================

use super::canonical::CanonicalUrl;
use std::path::{Component, Path, PathBuf};

const INDEX_FILE: &str = "index.html";

/// Where a canonical URL is stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalPath {
    pub directory: PathBuf,
    pub filename: String,
}

/// How rewritten references point at mirrored files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStyle {
    /// Absolute file system path, e.g. `/srv/mirror/example.com/about`
    #[default]
    Absolute,
    /// Path relative to the directory of the referring file, e.g. `../about`
    Relative,
}

impl LocalPath {
    // Full path of the file
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }

    // The text to put in an href/src/url() that points at this file
    //
    // Parameters:
    //   from_dir: directory of the file that contains the reference
    //   style: absolute or relative rendering
    //
    // '%' is escaped because file names keep the URL's percent-encoding
    // verbatim, and a browser would otherwise decode it.
    pub fn href_from(&self, from_dir: &Path, style: LinkStyle) -> String {
        let raw = match style {
            LinkStyle::Absolute => self.file_path().to_string_lossy().replace('\\', "/"),
            LinkStyle::Relative => relative_path(from_dir, &self.file_path()),
        };
        raw.replace('%', "%25")
    }
}

// Maps a canonical URL into the mirror rooted at `root_dir`
pub fn to_local_path(url: &CanonicalUrl, root_dir: &Path) -> LocalPath {
    let path = if url.path() == "/" {
        format!("/{}", INDEX_FILE)
    } else {
        url.path().to_string()
    };

    let mut directory = root_dir.join(url.host());
    let mut segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    // The path always has at least one non-empty segment at this point
    let filename = segments.pop().unwrap_or(INDEX_FILE).to_string();
    for segment in segments {
        directory.push(segment);
    }

    LocalPath { directory, filename }
}

// Computes a '/'-separated path from `from_dir` to `target`
//
// Both paths come from to_local_path() with the same root, so they share
// a prefix; no file system lookups are needed.
fn relative_path(from_dir: &Path, target: &Path) -> String {
    let from: Vec<Component> = from_dir.components().collect();
    let to: Vec<Component> = target.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    parts.join("/")
}
