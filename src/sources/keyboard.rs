//! Keyboard lock states from the Linux LED class.
//!
//! The kernel exposes one LED per input device and lock, e.g.
//! `/sys/class/leds/input3::capslock/brightness`. A lock counts as on when
//! any matching LED has a non-zero brightness.

use std::fs;
use std::path::{Path, PathBuf};

use super::LockKeys;
use crate::error::MetricError;

/// Default LED class directory.
pub const LED_CLASS_DIR: &str = "/sys/class/leds";

/// Reads lock states from an LED class directory.
#[derive(Debug, Clone)]
pub struct LedLockKeys {
    root: PathBuf,
}

impl LedLockKeys {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn read(&self) -> Result<LockKeys, MetricError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|err| MetricError::unavailable("lock keys", format!("{}: {err}", self.root.display())))?;

        let mut keys = LockKeys::default();
        let mut found = false;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let slot = if name.ends_with("::capslock") {
                &mut keys.caps
            } else if name.ends_with("::numlock") {
                &mut keys.num
            } else if name.ends_with("::scrolllock") {
                &mut keys.scroll
            } else {
                continue;
            };
            found = true;
            *slot |= led_is_on(&entry.path().join("brightness"));
        }

        if found {
            Ok(keys)
        } else {
            Err(MetricError::unavailable("lock keys", "no keyboard lock LEDs found"))
        }
    }
}

impl Default for LedLockKeys {
    fn default() -> Self {
        Self::new(LED_CLASS_DIR)
    }
}

fn led_is_on(brightness: &Path) -> bool {
    fs::read_to_string(brightness)
        .ok()
        .and_then(|text| text.trim().parse::<u32>().ok())
        .is_some_and(|level| level > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn led(root: &Path, name: &str, brightness: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("brightness"), brightness).unwrap();
    }

    #[test]
    fn test_reads_lock_states() {
        let dir = tempfile::tempdir().unwrap();
        led(dir.path(), "input3::capslock", "1\n");
        led(dir.path(), "input3::numlock", "0\n");
        led(dir.path(), "input3::scrolllock", "0\n");
        led(dir.path(), "phy0-led", "1\n");

        let keys = LedLockKeys::new(dir.path()).read().unwrap();
        assert_eq!(keys, LockKeys { caps: true, num: false, scroll: false });
    }

    #[test]
    fn test_any_keyboard_lit_counts() {
        let dir = tempfile::tempdir().unwrap();
        led(dir.path(), "input3::numlock", "0");
        led(dir.path(), "input7::numlock", "1");

        let keys = LedLockKeys::new(dir.path()).read().unwrap();
        assert!(keys.num, "A lit LED on any keyboard means the lock is on");
    }

    #[test]
    fn test_no_leds_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        led(dir.path(), "mmc0::", "0");

        assert!(LedLockKeys::new(dir.path()).read().is_err());
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = LedLockKeys::new(dir.path().join("nope")).read().unwrap_err();
        assert!(matches!(err, MetricError::Unavailable { metric: "lock keys", .. }));
    }
}
