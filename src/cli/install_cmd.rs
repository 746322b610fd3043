//! `lochound install` — download Chrome for Testing.

use crate::browser::launcher::{find_chromium, lochound_home};
use crate::cli::output::{self, Styled};
use anyhow::{bail, Context, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Google's version manifest for Chrome for Testing.
const MANIFEST_URL: &str =
    "https://googlechromelabs.github.io/chrome-for-testing/last-known-good-versions-with-downloads.json";

#[derive(Debug, Deserialize)]
struct Manifest {
    channels: Channels,
}

#[derive(Debug, Deserialize)]
struct Channels {
    #[serde(rename = "Stable")]
    stable: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    version: String,
    downloads: Downloads,
}

#[derive(Debug, Deserialize)]
struct Downloads {
    chrome: Vec<DownloadEntry>,
}

#[derive(Debug, Deserialize)]
struct DownloadEntry {
    platform: String,
    url: String,
}

/// Download and install Chrome for Testing into ~/.lochound/chromium/.
pub async fn run(force: bool) -> Result<()> {
    let s = Styled::new();

    // Check if already installed (unless --force)
    if !force {
        if let Some(path) = find_chromium() {
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "installed": true,
                    "path": path.display().to_string(),
                    "message": "Chromium is already installed. Use --force to reinstall."
                }));
                return Ok(());
            }
            if !output::is_quiet() {
                eprintln!(
                    "  {} Chromium is already installed at {}",
                    s.ok_sym(),
                    path.display()
                );
                eprintln!("  Use --force to reinstall.");
            }
            return Ok(());
        }
    }

    let platform = cft_platform()?;
    let chromium_dir = lochound_home().join("chromium");
    std::fs::create_dir_all(&chromium_dir)?;

    if !output::is_quiet() && !output::is_json() {
        eprintln!("  Installing Chrome for Testing...");
        eprintln!();
        eprintln!("  Platform:  {platform}");
        eprintln!("  Target:    {}", chromium_dir.display());
        eprintln!();
    }

    let manifest = fetch_manifest(MANIFEST_URL).await?;
    let version = manifest.channels.stable.version.clone();
    let url = pick_download(&manifest, platform)
        .with_context(|| format!("no Chrome for Testing build for platform {platform}"))?;

    info!("downloading Chrome for Testing {version} for {platform}");
    let archive = chromium_dir.join("chrome.zip");
    download_with_progress(&url, &archive).await?;

    extract_archive(&archive, &chromium_dir)?;
    let _ = std::fs::remove_file(&archive);

    let installed = find_chromium()
        .context("extraction finished but no Chromium executable was found — archive layout changed?")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&installed)?.permissions();
        perms.set_mode(perms.mode() | 0o755);
        std::fs::set_permissions(&installed, perms)?;
    }

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "installed": true,
            "version": version,
            "platform": platform,
            "path": installed.display().to_string(),
        }));
        return Ok(());
    }

    if !output::is_quiet() {
        eprintln!(
            "  {} Chrome for Testing {version} installed at {}",
            s.ok_sym(),
            installed.display()
        );

        // macOS Gatekeeper hint
        if std::env::consts::OS == "macos" {
            eprintln!();
            eprintln!(
                "  {} macOS users: if Gatekeeper blocks Chromium, run:",
                s.info_sym()
            );
            eprintln!("    xattr -cr ~/.lochound/chromium/");
        }
        eprintln!();
        eprintln!("  Run 'lochound doctor' to verify setup.");
    }

    Ok(())
}

/// Chrome for Testing platform identifier for this build target.
fn cft_platform() -> Result<&'static str> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("linux", "x86_64") => Ok("linux64"),
        ("macos", "aarch64") => Ok("mac-arm64"),
        ("macos", "x86_64") => Ok("mac-x64"),
        ("windows", "x86_64") => Ok("win64"),
        (os, arch) => bail!("no Chrome for Testing build for {os}/{arch}"),
    }
}

/// Fetch and parse the version manifest.
async fn fetch_manifest(url: &str) -> Result<Manifest> {
    let response = reqwest::get(url)
        .await
        .context("failed to fetch Chrome for Testing manifest")?;
    if !response.status().is_success() {
        bail!("manifest request returned {}", response.status());
    }
    response
        .json::<Manifest>()
        .await
        .context("failed to parse Chrome for Testing manifest")
}

/// Pick the Stable-channel chrome download URL for a platform.
fn pick_download(manifest: &Manifest, platform: &str) -> Option<String> {
    manifest
        .channels
        .stable
        .downloads
        .chrome
        .iter()
        .find(|d| d.platform == platform)
        .map(|d| d.url.clone())
}

/// Stream a download to disk with a progress bar.
async fn download_with_progress(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::get(url).await.context("download request failed")?;
    if !response.status().is_success() {
        bail!("download returned {}", response.status());
    }

    let total = response.content_length().unwrap_or(0);
    let bar = if output::is_quiet() || output::is_json() || total == 0 {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Downloading [{bar:36}] {bytes}/{total_bytes}",
            )
            .unwrap()
            .progress_chars("\u{2588}\u{2591}\u{2591}"),
        );
        bar
    };

    let mut file = std::fs::File::create(dest)
        .with_context(|| format!("failed to create {}", dest.display()))?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("download interrupted")?;
        file.write_all(&chunk)?;
        bar.inc(chunk.len() as u64);
    }
    file.flush()?;
    bar.finish_and_clear();
    Ok(())
}

/// Extract the downloaded archive using the platform's unzip tool.
fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let status = if cfg!(windows) {
        std::process::Command::new("tar")
            .args(["-xf", &archive.display().to_string()])
            .arg("-C")
            .arg(dest)
            .status()
    } else {
        std::process::Command::new("unzip")
            .args(["-q", "-o", &archive.display().to_string(), "-d"])
            .arg(dest)
            .status()
    };

    match status {
        Ok(st) if st.success() => Ok(()),
        Ok(st) => bail!("archive extraction exited with {st}"),
        Err(e) => bail!("could not run the system unzip tool: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_MANIFEST: &str = r#"{
        "channels": {
            "Stable": {
                "version": "131.0.6778.85",
                "downloads": {
                    "chrome": [
                        {"platform": "linux64", "url": "https://example.com/linux64/chrome.zip"},
                        {"platform": "mac-arm64", "url": "https://example.com/mac-arm64/chrome.zip"}
                    ]
                }
            }
        }
    }"#;

    #[test]
    fn test_pick_download_by_platform() {
        let manifest: Manifest = serde_json::from_str(SAMPLE_MANIFEST).unwrap();
        assert_eq!(
            pick_download(&manifest, "linux64").as_deref(),
            Some("https://example.com/linux64/chrome.zip")
        );
        assert_eq!(pick_download(&manifest, "win64"), None);
    }

    #[tokio::test]
    async fn test_fetch_manifest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manifest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_MANIFEST))
            .mount(&server)
            .await;

        let manifest = fetch_manifest(&format!("{}/manifest.json", server.uri()))
            .await
            .unwrap();
        assert_eq!(manifest.channels.stable.version, "131.0.6778.85");
    }

    #[tokio::test]
    async fn test_fetch_manifest_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manifest.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = fetch_manifest(&format!("{}/manifest.json", server.uri())).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_download_with_progress_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chrome.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake zip bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("chrome.zip");
        download_with_progress(&format!("{}/chrome.zip", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"fake zip bytes");
    }
}
