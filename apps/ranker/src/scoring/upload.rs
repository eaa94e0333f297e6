//! Upload directory helpers: file-name sanitizing, collision-free storage and safe lookup.

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "png", "jpg", "jpeg"];

/// True when the name has one of the accepted document extensions (case-insensitive).
pub fn allowed_file(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reduces a client-supplied name to a safe, flat ASCII file name.
///
/// Path separators and whitespace runs become `_`, characters outside `[A-Za-z0-9_.-]` are
/// dropped, leading and trailing `.`/`_` are stripped. Returns `None` if nothing is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let joined = name
        .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Resolves a stored file name inside `dir`. Anything but a single plain path component
/// (`..`, absolute paths, separators) is refused.
pub fn resolve_stored(dir: &Path, name: &str) -> Option<PathBuf> {
    if name.contains(['/', '\\']) {
        return None;
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => Some(dir.join(part)),
        _ => None,
    }
}

/// `resume.pdf` → `resume_3.pdf`
fn suffixed(name: &str, n: usize) -> String {
    match name.rfind('.') {
        Some(dot) => format!("{}_{n}{}", &name[..dot], &name[dot..]),
        None => format!("{name}_{n}"),
    }
}

/// Writes `data` under `name`, or `name_1`, `name_2`, … if taken. Returns the stored name.
pub async fn store(dir: &Path, name: &str, data: &[u8]) -> io::Result<String> {
    let mut candidate = name.to_string();
    let mut n = 0;
    loop {
        let opened = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&candidate))
            .await;
        match opened {
            Ok(mut file) => {
                file.write_all(data).await?;
                file.flush().await?;
                debug!("Stored upload as {candidate} ({} bytes)", data.len());
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                n += 1;
                candidate = suffixed(name, n);
            }
            Err(e) => return Err(e),
        }
    }
}

/// MIME type served for a stored document, by extension.
pub fn content_type(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Inclusive on both ends; a missing bound is open.
fn within(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |from| date >= from) && to.map_or(true, |to| date <= to)
}

/// Stored documents with an accepted extension, sorted by name.
///
/// `from`/`to` filter on the UTC date of the file's last modification, which is its upload
/// time since stored files are never rewritten.
pub async fn list_stored(
    dir: &Path,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !allowed_file(&name) {
            continue;
        }
        if from.is_some() || to.is_some() {
            let uploaded = DateTime::<Utc>::from(metadata.modified()?).date_naive();
            if !within(uploaded, from, to) {
                continue;
            }
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("cv.pdf"));
        assert!(allowed_file("CV.DOCX"));
        assert!(allowed_file("scan.final.JPeg"));
        assert!(!allowed_file("notes.txt"));
        assert!(!allowed_file("pdf"));
        assert!(!allowed_file("archive.pdf.zip"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My CV 2024.pdf").as_deref(), Some("My_CV_2024.pdf"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("etc_passwd"));
        assert_eq!(sanitize_filename("C:\\Users\\jo\\cv.docx").as_deref(), Some("C_Users_jo_cv.docx"));
        assert_eq!(sanitize_filename("résumé (final).pdf").as_deref(), Some("rsum_final.pdf"));
        assert_eq!(sanitize_filename("._hidden.png").as_deref(), Some("hidden.png"));
        assert_eq!(sanitize_filename("…"), None);
        assert_eq!(sanitize_filename(" / "), None);
    }

    #[test]
    fn test_resolve_stored_rejects_traversal() {
        let dir = Path::new("/srv/uploads");
        assert_eq!(resolve_stored(dir, "cv.pdf"), Some(dir.join("cv.pdf")));
        assert_eq!(resolve_stored(dir, ".."), None);
        assert_eq!(resolve_stored(dir, "../secret.pdf"), None);
        assert_eq!(resolve_stored(dir, "/etc/passwd"), None);
        assert_eq!(resolve_stored(dir, "sub\\cv.pdf"), None);
        assert_eq!(resolve_stored(dir, "."), None);
        assert_eq!(resolve_stored(dir, ""), None);
    }

    #[test]
    fn test_suffixed() {
        assert_eq!(suffixed("cv.pdf", 1), "cv_1.pdf");
        assert_eq!(suffixed("cv.v2.pdf", 2), "cv.v2_2.pdf");
        assert_eq!(suffixed("README", 3), "README_3");
    }

    #[tokio::test]
    async fn test_store_adds_collision_suffixes() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(store(dir.path(), "cv.pdf", b"one").await.unwrap(), "cv.pdf");
        assert_eq!(store(dir.path(), "cv.pdf", b"two").await.unwrap(), "cv_1.pdf");
        assert_eq!(store(dir.path(), "cv.pdf", b"three").await.unwrap(), "cv_2.pdf");

        assert_eq!(std::fs::read(dir.path().join("cv.pdf")).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join("cv_2.pdf")).unwrap(), b"three");
    }

    #[tokio::test]
    async fn test_list_stored_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.docx", "a.pdf", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        assert_eq!(
            list_stored(dir.path(), None, None).await.unwrap(),
            vec!["a.pdf", "b.docx"]
        );
    }

    #[test]
    fn test_within_is_inclusive() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        assert!(within(day(10), None, None));
        assert!(within(day(10), Some(day(10)), Some(day(10))));
        assert!(within(day(10), Some(day(1)), None));
        assert!(!within(day(10), Some(day(11)), None));
        assert!(!within(day(10), None, Some(day(9))));
    }

    #[tokio::test]
    async fn test_list_stored_filters_by_upload_date() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cv.pdf"), b"x").unwrap();
        let today = Utc::now().date_naive();
        let long_ago = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();

        assert_eq!(
            list_stored(dir.path(), Some(today), Some(today)).await.unwrap(),
            vec!["cv.pdf"]
        );
        assert!(list_stored(dir.path(), None, Some(long_ago)).await.unwrap().is_empty());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("cv.PDF"), "application/pdf");
        assert_eq!(content_type("scan.jpeg"), "image/jpeg");
        assert_eq!(
            content_type("cv.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(content_type("README"), "application/octet-stream");
    }
}
