#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Renders a small sales CSV with `days` consecutive daily rows starting at
/// 2024-01-01, alternating product and city values, units trending upward
/// with a small deterministic wobble.
pub fn sales_csv(days: u32) -> String {
    let mut out = String::from("order_date,product,city,units\n");
    for day in 0..days {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .expect("valid date")
            + chrono::Days::new(u64::from(day));
        let product = if day % 2 == 0 { "widget" } else { "gadget" };
        let city = if day % 3 == 0 { "Mumbai" } else { "Delhi" };
        let wobble = match day % 4 {
            0 => 5,
            1 => 0,
            2 => 3,
            _ => 1,
        };
        let _ = writeln!(
            out,
            "{},{product},{city},{}",
            date.format("%Y-%m-%d"),
            10 + day * 2 + wobble
        );
    }
    out
}
