//! Browser fingerprint patching — hide automation signals.

/// JavaScript injected at document creation that patches
/// navigator.webdriver and chrome.runtime.
pub const PATCH_SCRIPT: &str = r#"
(() => {
    // Hide webdriver flag
    Object.defineProperty(navigator, 'webdriver', {
        get: () => false,
        configurable: true,
    });

    // Patch chrome.runtime to look like a real browser
    if (!window.chrome) {
        window.chrome = {};
    }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: function() {},
            sendMessage: function() {},
        };
    }

    // Override permissions query to hide "notifications" prompt
    const originalQuery = window.navigator.permissions.query;
    window.navigator.permissions.query = (parameters) =>
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters);

    // Patch plugins to appear non-empty
    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3, 4, 5],
        configurable: true,
    });

    // Patch languages
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
        configurable: true,
    });
})();
"#;

/// Get the fingerprint patch script.
pub fn patch_script() -> &'static str {
    PATCH_SCRIPT
}

/// Chromium switches that suppress automation tells at launch.
pub fn launch_flags() -> Vec<&'static str> {
    vec![
        "--disable-blink-features=AutomationControlled",
        "--disable-infobars",
        "--no-first-run",
        "--no-default-browser-check",
        "--lang=en-US",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_script_covers_known_signals() {
        assert!(PATCH_SCRIPT.contains("webdriver"));
        assert!(PATCH_SCRIPT.contains("chrome.runtime"));
        assert!(PATCH_SCRIPT.contains("plugins"));
        assert!(PATCH_SCRIPT.contains("languages"));
    }

    #[test]
    fn test_launch_flags_disable_automation_marker() {
        let flags = launch_flags();
        assert!(flags
            .iter()
            .any(|f| f.contains("AutomationControlled")));
    }
}
