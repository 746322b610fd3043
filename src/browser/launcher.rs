//! Chromium executable discovery and environment probing.

use std::path::PathBuf;

/// Get the Lochound home directory (~/.lochound/).
pub fn lochound_home() -> PathBuf {
    if let Ok(p) = std::env::var("LOCHOUND_HOME") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".lochound")
}

/// Find a Chromium binary by checking multiple locations.
///
/// Order: `LOCHOUND_CHROMIUM_PATH` env, the managed install under
/// `~/.lochound/chromium/`, the system PATH, then platform app paths.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. Explicit override
    if let Ok(p) = std::env::var("LOCHOUND_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Managed install from 'lochound install'
    let install_dir = lochound_home().join("chromium");
    let candidates = if cfg!(target_os = "macos") {
        vec![
            install_dir.join("chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
            install_dir.join("chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
            install_dir.join("chrome"),
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            install_dir.join("chrome-win64/chrome.exe"),
            install_dir.join("chrome.exe"),
        ]
    } else {
        vec![
            install_dir.join("chrome-linux64/chrome"),
            install_dir.join("chrome"),
        ]
    };
    for c in candidates {
        if c.exists() {
            return Some(c);
        }
    }

    // 3. System PATH
    for name in &["google-chrome", "chromium", "chromium-browser", "chrome"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Whether the sandbox must be disabled for Chromium to launch.
///
/// True when explicitly requested via `LOCHOUND_NO_SANDBOX` or when
/// running inside Docker, where the kernel sandbox is unavailable.
pub fn needs_no_sandbox() -> bool {
    std::env::var("LOCHOUND_NO_SANDBOX").is_ok() || is_docker()
}

/// Check if running inside Docker.
pub fn is_docker() -> bool {
    PathBuf::from("/.dockerenv").exists()
        || std::fs::read_to_string("/proc/1/cgroup")
            .map(|s| s.contains("docker") || s.contains("containerd"))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_resolution() {
        std::env::remove_var("LOCHOUND_HOME");
        let home = lochound_home();
        assert!(home.ends_with(".lochound") || home.starts_with("/tmp"));

        std::env::set_var("LOCHOUND_HOME", "/tmp/lochound-test-home");
        assert_eq!(lochound_home(), PathBuf::from("/tmp/lochound-test-home"));
        std::env::remove_var("LOCHOUND_HOME");
    }
}
