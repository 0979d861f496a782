//! Symbol/testdox dialect (PHPUnit `--testdox` output)
//!
//! A class header introduces the fully qualified case name:
//!
//! ```text
//! Checkout (App\Tests\Unit\Checkout)
//!  [x] Applies discount
//!  [ ] Rejects negative quantity
//! ```
//!
//! Each test's name is reconstructed as `App\Tests\Unit\Checkout::Applies
//! discount`. Captured logs sometimes carry JSON-escaped headers where the
//! namespace separator appears doubled (`App\\Tests\\Unit\\Checkout`);
//! those are collapsed to single backslashes so names compare byte-exactly
//! against dataset-declared names.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{OutcomeMap, TestOutcome};

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<short>[A-Za-z_][A-Za-z0-9_\\]*) \((?P<qualified>[A-Za-z0-9_\\]+)\)\s*$")
        .expect("valid regex")
});

static CASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+\[(?P<mark>[xX✔ ✘])\]\s+(?P<description>.+?)\s*$").expect("valid regex")
});

fn outcome_for(mark: &str) -> TestOutcome {
    match mark {
        "x" | "X" | "✔" => TestOutcome::Passed,
        _ => TestOutcome::Failed,
    }
}

pub fn parse(raw: &str) -> OutcomeMap {
    let mut outcomes = OutcomeMap::new();
    let mut current_class: Option<String> = None;

    for line in raw.lines() {
        if let Some(caps) = HEADER_RE.captures(line) {
            current_class = Some(caps["qualified"].replace("\\\\", "\\"));
            continue;
        }
        if let Some(caps) = CASE_RE.captures(line) {
            if let Some(class) = &current_class {
                let name = format!("{}::{}", class, &caps["description"]);
                outcomes.insert(name, outcome_for(&caps["mark"]));
            }
            continue;
        }
        if !line.starts_with(' ') {
            // anything else at column zero ends the current class block
            current_class = None;
        }
    }

    outcomes
}
