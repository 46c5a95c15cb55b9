use std::path::{Path, PathBuf};

use axum::body::Bytes;
use unicode_normalization::UnicodeNormalization;

use crate::error::ServiceError;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// A file received in the `file` part of an upload form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

pub fn extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

pub fn allowed_file(file_name: &str) -> bool {
    extension(file_name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Reduces a client supplied file name to something safe to join onto the
/// upload directory. Accented letters fold to their ASCII base; the result
/// never contains a path separator or a leading dot.
pub fn secure_filename(file_name: &str) -> String {
    let ascii: String = file_name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Name the upload is stored under inside the upload directory.
pub fn stored_name(file_name: &str) -> String {
    let secured = secure_filename(file_name);
    if secured.is_empty() {
        "upload".to_string()
    } else {
        secured
    }
}

pub fn ensure_upload_dir(dir: &Path) -> Result<(), ServiceError> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

pub async fn persist(dir: &Path, upload: &Upload) -> Result<PathBuf, ServiceError> {
    let path = dir.join(stored_name(&upload.file_name));
    tokio::fs::write(&path, &upload.bytes).await?;
    tracing::debug!(path = %path.display(), size = upload.bytes.len(), "upload stored");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_extensions_case_insensitively() {
        assert!(allowed_file("fundus.png"));
        assert!(allowed_file("fundus.JPG"));
        assert!(allowed_file("scan.2024.jpeg"));
    }

    #[test]
    fn rejects_other_or_missing_extensions() {
        assert!(!allowed_file("fundus.gif"));
        assert!(!allowed_file("png"));
        assert!(!allowed_file("fundus.png.exe"));
        assert!(!allowed_file("fundus."));
        assert!(!allowed_file(""));
    }

    #[test]
    fn secure_filename_joins_whitespace() {
        assert_eq!(secure_filename("My cool scan.png"), "My_cool_scan.png");
    }

    #[test]
    fn secure_filename_strips_traversal() {
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("..\\..\\boot.ini"), "boot.ini");
    }

    #[test]
    fn secure_filename_drops_unsafe_characters() {
        assert_eq!(secure_filename("ret$ina<1>.jpg"), "retina1.jpg");
        assert_eq!(secure_filename("€ scan?.png"), "scan.png");
    }

    #[test]
    fn secure_filename_folds_accents_to_ascii() {
        assert_eq!(secure_filename("fündus café.png"), "fundus_cafe.png");
        assert_eq!(secure_filename("Ｒｅｔｉｎａ.jpg"), "Retina.jpg");
    }

    #[test]
    fn stored_name_falls_back_when_nothing_survives() {
        assert_eq!(stored_name("../"), "upload");
        assert_eq!(stored_name("...png"), "png");
        assert_eq!(stored_name("fundus.png"), "fundus.png");
    }

    #[tokio::test]
    async fn persist_writes_under_sanitized_name() {
        let dir = tempfile::tempdir().unwrap();
        let upload = Upload {
            file_name: "../left eye.png".to_string(),
            bytes: Bytes::from_static(b"not really a png"),
        };

        let path = persist(dir.path(), &upload).await.unwrap();

        assert_eq!(path, dir.path().join("left_eye.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"not really a png");
    }
}
