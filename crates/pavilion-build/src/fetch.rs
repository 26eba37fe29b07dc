// crates/pavilion-build/src/fetch.rs
// ============================================================================
// Module: Source Acquisition
// Description: Resolves a `source_path` against configured `test_src`
//              directories, or downloads it when it names a URL.
// Purpose: Produce a single local path the classifier and extractor can act
//          on, honoring the download policy.
// Dependencies: pavilion-core, reqwest, url
// ============================================================================

//! ## Overview
//! A relative `source_path` is resolved against `test_src` directories, first
//! match wins. A URL triggers [`DownloadPolicy`]: `never` requires the file
//! already present under `downloads/`, `missing` (the default) downloads
//! only if absent, `latest` always re-downloads. Downloads are keyed by a
//! hash of the URL unless `source_download_name` overrides the on-disk name.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use pavilion_core::spec::DownloadPolicy;
use sha2::Digest;
use sha2::Sha256;
use url::Url;

use crate::error::BuildEngineError;

/// Resolves `source_path` to a local filesystem path, downloading it first
/// if it names a URL and the policy requires it.
///
/// # Errors
///
/// Returns [`BuildEngineError::Fetch`] if the path cannot be found in any
/// `test_src` directory, or if a required download fails.
pub fn acquire(
    source_path: &str,
    download_name: Option<&str>,
    policy: DownloadPolicy,
    test_src_dirs: &[PathBuf],
    downloads_dir: &Path,
) -> Result<PathBuf, BuildEngineError> {
    if let Ok(url) = Url::parse(source_path)
        && matches!(url.scheme(), "http" | "https")
    {
        return download(&url, download_name, policy, downloads_dir);
    }
    resolve_local(source_path, test_src_dirs)
}

pub(crate) fn resolve_local(source_path: &str, test_src_dirs: &[PathBuf]) -> Result<PathBuf, BuildEngineError> {
    for dir in test_src_dirs {
        let candidate = dir.join(source_path);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(BuildEngineError::Fetch(format!(
        "'{source_path}' not found in any configured test_src directory"
    )))
}

fn download(
    url: &Url,
    download_name: Option<&str>,
    policy: DownloadPolicy,
    downloads_dir: &Path,
) -> Result<PathBuf, BuildEngineError> {
    let file_name = download_name.map_or_else(|| url_hash_name(url), ToString::to_string);
    let dest = downloads_dir.join(&file_name);

    match policy {
        DownloadPolicy::Never => {
            if dest.exists() {
                return Ok(dest);
            }
            return Err(BuildEngineError::Fetch(format!(
                "'{url}' not present under downloads/ and download policy is 'never'"
            )));
        }
        DownloadPolicy::Missing if dest.exists() => return Ok(dest),
        DownloadPolicy::Missing | DownloadPolicy::Latest => {}
    }

    fs::create_dir_all(downloads_dir)?;
    let sentinel = downloads_dir.join(format!(".{file_name}.lock"));
    let _lock = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&sentinel)
        .map_err(|err| BuildEngineError::Fetch(format!("download lock for '{url}': {err}")))?;

    let result = fetch_bytes(url).and_then(|bytes| {
        let tmp = downloads_dir.join(format!(".{file_name}.part"));
        fs::File::create(&tmp)?.write_all(&bytes)?;
        fs::rename(&tmp, &dest)?;
        Ok(dest.clone())
    });

    let _ = fs::remove_file(&sentinel);
    result
}

fn fetch_bytes(url: &Url) -> Result<Vec<u8>, BuildEngineError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(|err| BuildEngineError::Fetch(err.to_string()))?;
    let response = client
        .get(url.clone())
        .send()
        .map_err(|err| BuildEngineError::Fetch(err.to_string()))?
        .error_for_status()
        .map_err(|err| BuildEngineError::Fetch(err.to_string()))?;
    response.bytes().map(|b| b.to_vec()).map_err(|err| BuildEngineError::Fetch(err.to_string()))
}

fn url_hash_name(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_first_matching_test_src_dir() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        fs::write(dir_b.path().join("main.c"), b"int main(){}").unwrap();

        let resolved = resolve_local(
            "main.c",
            &[dir_a.path().to_path_buf(), dir_b.path().to_path_buf()],
        )
        .unwrap();
        assert_eq!(resolved, dir_b.path().join("main.c"));
    }

    #[test]
    fn missing_local_source_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_local("nope.c", &[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, BuildEngineError::Fetch(_)));
    }

    #[test]
    fn url_hash_name_is_stable() {
        let url = Url::parse("https://example.com/src.tar.gz").unwrap();
        assert_eq!(url_hash_name(&url), url_hash_name(&url));
    }
}
