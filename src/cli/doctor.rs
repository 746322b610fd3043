//! Environment readiness check.
//!
//! Diagnostic checks covering system, browser, and output concerns. Every
//! failure includes a specific fix instruction, because the single most
//! common support question is "why won't Chromium launch".

use crate::browser::launcher::{find_chromium, is_docker, lochound_home};
use crate::cli::output::{self, Styled};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run the full doctor diagnostic.
pub async fn run() -> Result<()> {
    if output::is_json() {
        return run_json().await;
    }

    let s = Styled::new();
    let mut ready = true;
    let mut has_warning = false;

    output::print_header(&s);

    // ── System ──────────────────────────────────────────────────────────
    output::print_section(&s, "System");

    let os = format_os();
    let arch = std::env::consts::ARCH;
    output::print_check(s.ok_sym(), "OS:", &format!("{os} ({arch})"));

    let (total_mb, avail_mb) = get_memory_mb();
    match avail_mb {
        // Eight concurrent Chromium processes want real memory.
        Some(a) if a >= 2048 => {
            let display = if let Some(t) = total_mb {
                format!(
                    "{:.1} GB total, {:.1} GB available",
                    t as f64 / 1024.0,
                    a as f64 / 1024.0
                )
            } else {
                format!("{:.1} GB available", a as f64 / 1024.0)
            };
            output::print_check(s.ok_sym(), "Memory:", &display);
        }
        Some(a) => {
            output::print_check(
                s.warn_sym(),
                "Memory:",
                &format!("{a} MB available (recommend >= 2 GB for 8 workers)"),
            );
            output::print_detail("Lower --workers if fetches start failing.");
            has_warning = true;
        }
        None => {
            output::print_check(s.warn_sym(), "Memory:", "could not determine");
            has_warning = true;
        }
    }

    let home = lochound_home();
    match get_free_disk_mb(&home) {
        Some(free_mb) if free_mb >= 500 => {
            output::print_check(
                s.ok_sym(),
                "Disk:",
                &format!(
                    "{} free at {}",
                    output::format_size(free_mb * 1_048_576),
                    home.display()
                ),
            );
        }
        Some(free_mb) => {
            output::print_check(
                s.fail_sym(),
                "Disk:",
                &format!("{free_mb} MB free (< 500 MB minimum for a Chromium install)"),
            );
            output::print_detail("Free up disk space or change LOCHOUND_HOME.");
            ready = false;
        }
        None => {
            output::print_check(s.warn_sym(), "Disk:", "could not determine free space");
            has_warning = true;
        }
    }

    eprintln!();

    // ── Browser ─────────────────────────────────────────────────────────
    output::print_section(&s, "Browser");

    let chromium_path = find_chromium();
    match &chromium_path {
        Some(path) => {
            let version = get_chromium_version(path);
            let ver_str = version.as_deref().unwrap_or("unknown version");
            output::print_check(
                s.ok_sym(),
                "Chromium:",
                &format!("{ver_str} at {}", path.display()),
            );

            match test_headless_launch(path) {
                Ok(ms) => {
                    output::print_check(
                        s.ok_sym(),
                        "Headless test:",
                        &format!("launched and closed in {ms}ms"),
                    );
                }
                Err(e) => {
                    let msg = e.to_string();
                    output::print_check(s.fail_sym(), "Headless test:", &format!("FAILED — {msg}"));
                    if msg.contains("shared librar") || msg.contains("libnss") {
                        suggest_shared_libs();
                    }
                    if is_docker() {
                        output::print_detail("Running in Docker? Try LOCHOUND_NO_SANDBOX=1");
                    }
                    ready = false;
                }
            }
        }
        None => {
            output::print_check(s.fail_sym(), "Chromium:", "NOT FOUND");
            output::print_detail("Fix: run 'lochound install'");
            output::print_detail("Or set LOCHOUND_CHROMIUM_PATH=/path/to/chrome");
            ready = false;
        }
    }

    #[cfg(target_os = "linux")]
    check_shared_libs(&s, &mut ready);

    #[cfg(target_os = "linux")]
    {
        if is_musl_libc() {
            output::print_check(
                s.warn_sym(),
                "C library:",
                "musl libc detected (Alpine Linux)",
            );
            output::print_detail("Chromium does not run natively on musl. Install gcompat:");
            output::print_detail("  apk add gcompat");
            has_warning = true;
        }
    }

    eprintln!();

    // ── Output ──────────────────────────────────────────────────────────
    output::print_section(&s, "Output");

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if dir_writable(&cwd) {
        output::print_check(
            s.ok_sym(),
            "Output dir:",
            &format!("{} (writable)", cwd.display()),
        );
    } else {
        output::print_check(
            s.fail_sym(),
            "Output dir:",
            &format!("{} is not writable", cwd.display()),
        );
        output::print_detail("Pass --out with a writable location.");
        ready = false;
    }

    let audit_path = home.join("harvest.jsonl");
    match audit_path.metadata() {
        Ok(meta) => output::print_check(
            s.info_sym(),
            "Audit log:",
            &format!(
                "{} ({})",
                audit_path.display(),
                output::format_size(meta.len())
            ),
        ),
        Err(_) => output::print_check(s.info_sym(), "Audit log:", "none yet"),
    }

    // Status summary
    if ready && !has_warning {
        output::print_status(&s, &s.green("READY"), "run 'lochound harvest'");
    } else if ready {
        output::print_status(&s, &s.yellow("READY"), "some warnings above");
    } else {
        output::print_status(&s, &s.red("NOT READY"), "fix issues above");
    }

    Ok(())
}

/// JSON output mode for doctor.
async fn run_json() -> Result<()> {
    let chromium_path = find_chromium();
    let chromium_version = chromium_path.as_ref().and_then(|p| get_chromium_version(p));
    let headless_ms = chromium_path
        .as_ref()
        .and_then(|p| test_headless_launch(p).ok());
    let (total_mb, avail_mb) = get_memory_mb();
    let home = lochound_home();
    let audit_size = home.join("harvest.jsonl").metadata().map(|m| m.len()).ok();

    let json = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "memory_total_mb": total_mb,
        "memory_available_mb": avail_mb,
        "home": home.display().to_string(),
        "disk_free_mb": get_free_disk_mb(&home),
        "chromium_path": chromium_path.map(|p| p.display().to_string()),
        "chromium_version": chromium_version,
        "headless_launch_ms": headless_ms,
        "docker": is_docker(),
        "audit_log_bytes": audit_size,
    });
    output::print_json(&json);
    Ok(())
}

// ── Helper functions ────────────────────────────────────────────────────────

/// Format OS name nicely.
fn format_os() -> String {
    match std::env::consts::OS {
        "macos" => {
            if let Ok(out) = Command::new("sw_vers").arg("-productVersion").output() {
                if out.status.success() {
                    let ver = String::from_utf8_lossy(&out.stdout).trim().to_string();
                    return format!("macOS {ver}");
                }
            }
            "macOS".to_string()
        }
        "linux" => {
            if let Ok(contents) = std::fs::read_to_string("/etc/os-release") {
                for line in contents.lines() {
                    if let Some(name) = line.strip_prefix("PRETTY_NAME=") {
                        return name.trim_matches('"').to_string();
                    }
                }
            }
            "Linux".to_string()
        }
        other => other.to_string(),
    }
}

/// Get Chromium version string.
fn get_chromium_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    if output.status.success() {
        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Some(raw.replace("Google Chrome for Testing ", "")
            .replace("Google Chrome ", "")
            .replace("Chromium ", ""))
    } else {
        None
    }
}

/// Test that Chromium can launch headless and close.
fn test_headless_launch(chromium_path: &Path) -> Result<u64> {
    let start = std::time::Instant::now();
    let mut cmd = Command::new(chromium_path);
    cmd.args(["--headless", "--disable-gpu", "--dump-dom", "about:blank"]);

    if is_docker() || std::env::var("LOCHOUND_NO_SANDBOX").is_ok() {
        cmd.arg("--no-sandbox");
    }

    let output = cmd
        .output()
        .map_err(|e| anyhow::anyhow!("failed to launch: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow::anyhow!(
            "{}",
            stderr.lines().next().unwrap_or("unknown error")
        ));
    }

    Ok(start.elapsed().as_millis() as u64)
}

/// Get total and available memory in MB.
fn get_memory_mb() -> (Option<u64>, Option<u64>) {
    #[cfg(target_os = "macos")]
    {
        let total = Command::new("sysctl")
            .args(["-n", "hw.memsize"])
            .output()
            .ok()
            .and_then(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .trim()
                    .parse::<u64>()
                    .ok()
            })
            .map(|b| b / 1_048_576);

        let avail = Command::new("vm_stat").output().ok().and_then(|o| {
            let s = String::from_utf8_lossy(&o.stdout);
            let mut free = 0u64;
            for line in s.lines() {
                if line.starts_with("Pages free") || line.starts_with("Pages inactive") {
                    if let Some(val) = line.split(':').nth(1) {
                        if let Ok(n) = val.trim().trim_end_matches('.').parse::<u64>() {
                            free += n * 4096;
                        }
                    }
                }
            }
            if free > 0 {
                Some(free / 1_048_576)
            } else {
                total
            }
        });

        (total, avail)
    }

    #[cfg(target_os = "linux")]
    {
        let output = Command::new("free").args(["-m"]).output().ok();
        if let Some(out) = output {
            let s = String::from_utf8_lossy(&out.stdout);
            for line in s.lines() {
                if line.starts_with("Mem:") {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    let total = parts.get(1).and_then(|v| v.parse().ok());
                    let avail = parts.get(6).and_then(|v| v.parse().ok());
                    return (total, avail);
                }
            }
        }
        (None, None)
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        (None, None)
    }
}

/// Get free disk space in MB at a given path.
fn get_free_disk_mb(path: &Path) -> Option<u64> {
    let check_path = if path.exists() {
        path.to_path_buf()
    } else if let Some(parent) = path.parent() {
        if parent.exists() {
            parent.to_path_buf()
        } else {
            PathBuf::from("/")
        }
    } else {
        PathBuf::from("/")
    };

    let output = Command::new("df")
        .args(["-m", &check_path.display().to_string()])
        .output()
        .ok()?;

    if output.status.success() {
        let s = String::from_utf8_lossy(&output.stdout);
        if let Some(line) = s.lines().nth(1) {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 4 {
                return parts[3].parse().ok();
            }
        }
    }
    None
}

/// Can we create a file in this directory?
fn dir_writable(dir: &Path) -> bool {
    let probe = dir.join(".lochound-write-probe");
    match std::fs::write(&probe, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

/// Check if the system uses musl libc (Alpine Linux).
#[cfg(target_os = "linux")]
fn is_musl_libc() -> bool {
    if let Ok(output) = Command::new("ldd").arg("--version").output() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stderr.contains("musl") || stdout.contains("musl") {
            return true;
        }
    }
    if let Ok(entries) = std::fs::read_dir("/lib") {
        for entry in entries.flatten() {
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with("ld-musl") {
                    return true;
                }
            }
        }
    }
    false
}

/// Suggest shared library installation commands.
fn suggest_shared_libs() {
    output::print_detail("Missing shared libraries for Chromium.");
    output::print_detail(
        "Fix (Ubuntu/Debian): sudo apt install libnss3 libatk1.0-0 libatk-bridge2.0-0",
    );
    output::print_detail("Fix (Alpine):        apk add nss atk at-spi2-atk");
}

/// Check shared libraries on Linux.
#[cfg(target_os = "linux")]
fn check_shared_libs(s: &Styled, ready: &mut bool) {
    let libs = [
        "libnss3",
        "libatk1.0-0",
        "libatk-bridge2.0-0",
        "libcups2",
        "libxcomposite1",
        "libxrandr2",
    ];
    let mut missing = Vec::new();
    for lib in &libs {
        if Command::new("ldconfig")
            .args(["-p"])
            .output()
            .ok()
            .map(|o| !String::from_utf8_lossy(&o.stdout).contains(lib))
            .unwrap_or(true)
        {
            missing.push(*lib);
        }
    }
    if !missing.is_empty() {
        output::print_check(
            s.warn_sym(),
            "Shared libs:",
            &format!("missing: {}", missing.join(", ")),
        );
        output::print_detail(&format!(
            "Fix (Ubuntu/Debian): sudo apt install {}",
            missing.join(" ")
        ));
        *ready = false;
    }
}
