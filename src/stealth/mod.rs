//! Stealth measures for browser automation.
//!
//! Everything the harvester does to avoid bot detection lives here:
//! fingerprint signals patched at document creation, and the launch flags
//! that suppress Chromium's automation tells.

pub mod fingerprint;
