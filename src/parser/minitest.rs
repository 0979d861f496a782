//! Timing-annotated dialect (minitest/test-unit style runners)
//!
//! A single run can mix three line shapes, so all three are tried against
//! every line:
//!
//! - timing line with a one-character outcome code:
//!   `Foo::Bar#test_x = 0.01 s = .`
//! - bracketed-word outcome: `Foo::Bar#test_x [FAIL]`
//! - verbose `method(Container)` form: `test_x(FooTest) ... ok`,
//!   reconstructed as `FooTest#test_x`

use once_cell::sync::Lazy;
use regex::Regex;

use super::{OutcomeMap, TestOutcome};

static TIMING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>\S+#\S+)\s*=\s*\d+(?:\.\d+)?\s*s\s*=\s*(?P<code>[.FES])\s*$")
        .expect("valid regex")
});

static BRACKET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>\S+)\s+\[(?P<word>PASS(?:ED)?|FAIL(?:ED)?|ERROR|SKIP(?:PED)?)\]\s*$")
        .expect("valid regex")
});

static VERBOSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<method>[A-Za-z_][A-Za-z0-9_]*)\((?P<container>[A-Za-z0-9_:]+)\)\s*(?:\[[0-9.]+\s*s\])?\s*[:=.]*\s*(?P<verdict>\.|F|E|S|ok|OK|PASS|FAIL|ERROR|omitted|skipped)\s*$",
    )
    .expect("valid regex")
});

fn outcome_for_code(code: &str) -> Option<TestOutcome> {
    match code {
        "." => Some(TestOutcome::Passed),
        "F" => Some(TestOutcome::Failed),
        "E" => Some(TestOutcome::Error),
        "S" => Some(TestOutcome::Skipped),
        _ => None,
    }
}

fn outcome_for_word(word: &str) -> Option<TestOutcome> {
    match word {
        "PASS" | "PASSED" | "ok" | "OK" | "." => Some(TestOutcome::Passed),
        "FAIL" | "FAILED" | "F" => Some(TestOutcome::Failed),
        "ERROR" | "E" => Some(TestOutcome::Error),
        "SKIP" | "SKIPPED" | "omitted" | "skipped" | "S" => Some(TestOutcome::Skipped),
        _ => None,
    }
}

pub fn parse(raw: &str) -> OutcomeMap {
    let mut outcomes = OutcomeMap::new();

    for line in raw.lines() {
        let line = line.trim_end();

        if let Some(caps) = TIMING_RE.captures(line) {
            if let Some(outcome) = outcome_for_code(&caps["code"]) {
                outcomes.insert(caps["name"].to_string(), outcome);
            }
            continue;
        }

        if let Some(caps) = BRACKET_RE.captures(line) {
            if let Some(outcome) = outcome_for_word(&caps["word"]) {
                outcomes.insert(caps["name"].to_string(), outcome);
            }
            continue;
        }

        if let Some(caps) = VERBOSE_RE.captures(line) {
            if let Some(outcome) = outcome_for_word(&caps["verdict"]) {
                let name = format!("{}#{}", &caps["container"], &caps["method"]);
                outcomes.insert(name, outcome);
            }
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_form() {
        let raw = "\
Foo::Bar#test_x = 0.01 s = .
Foo::Bar#test_y = 1.20 s = F
Foo::Bar#test_z = 0.00 s = E
Foo::Bar#test_w = 0.00 s = S
";
        let parsed = parse(raw);
        assert_eq!(parsed["Foo::Bar#test_x"], TestOutcome::Passed);
        assert_eq!(parsed["Foo::Bar#test_y"], TestOutcome::Failed);
        assert_eq!(parsed["Foo::Bar#test_z"], TestOutcome::Error);
        assert_eq!(parsed["Foo::Bar#test_w"], TestOutcome::Skipped);
    }

    #[test]
    fn test_bracketed_word_form() {
        let raw = "Foo::Bar#test_x [PASS]\nFoo::Bar#test_y [FAIL]\nFoo::Bar#test_z [SKIPPED]\n";
        let parsed = parse(raw);
        assert_eq!(parsed["Foo::Bar#test_x"], TestOutcome::Passed);
        assert_eq!(parsed["Foo::Bar#test_y"], TestOutcome::Failed);
        assert_eq!(parsed["Foo::Bar#test_z"], TestOutcome::Skipped);
    }

    #[test]
    fn test_verbose_form() {
        let raw = "test_x(FooTest): .\ntest_y(FooTest) ... FAIL\n";
        let parsed = parse(raw);
        assert_eq!(parsed["FooTest#test_x"], TestOutcome::Passed);
        assert_eq!(parsed["FooTest#test_y"], TestOutcome::Failed);
    }

    #[test]
    fn test_mixed_forms_in_one_run() {
        let raw = "\
Run options: --seed 4242

Foo::Bar#test_x = 0.01 s = .
test_y(FooTest): .
Foo::Bar#test_z [FAIL]

Finished in 1.23s, 3 runs, 2 assertions
";
        let parsed = parse(raw);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed["Foo::Bar#test_x"], TestOutcome::Passed);
        assert_eq!(parsed["FooTest#test_y"], TestOutcome::Passed);
        assert_eq!(parsed["Foo::Bar#test_z"], TestOutcome::Failed);
    }

    #[test]
    fn test_summary_noise_ignored() {
        let raw = "3 runs, 2 assertions, 1 failures, 0 errors, 0 skips\n";
        assert!(parse(raw).is_empty());
    }

    #[test]
    fn test_concatenation_is_union() {
        let a = "Foo#test_a = 0.01 s = .\n";
        let b = "Foo#test_b = 0.02 s = F\n";
        let mut combined = parse(a);
        combined.extend(parse(b));
        assert_eq!(parse(&format!("{a}{b}")), combined);
    }
}
