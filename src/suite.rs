/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt, fs,
    path::Path,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use log::{info, warn};

use crate::Position;

/// A position and the perft counts it should produce, starting at depth 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerftCase {
    pub fen: String,
    pub expected: Vec<u64>,
}

/// A list of [`PerftCase`]s, usually read from a file.
///
/// Each non-empty line holds a FEN followed by the node counts for depths 1, 2, 3, and so on, separated by commas:
/// ```text
/// # Lines starting with '#' are ignored
/// rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1,20,400,8902
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerftSuite {
    cases: Vec<PerftCase>,
}

impl PerftSuite {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read perft suite {}", path.display()))?;

        Self::parse(&contents).with_context(|| format!("Malformed perft suite {}", path.display()))
    }

    /// # Example
    /// ```
    /// # use crudechess::PerftSuite;
    /// let suite = PerftSuite::parse("# bare kings\n8/8/8/8/8/8/8/k6K w - - 0 1,3,9\n").unwrap();
    /// assert_eq!(suite.cases().len(), 1);
    /// assert_eq!(suite.cases()[0].expected, [3, 9]);
    /// ```
    pub fn parse(contents: &str) -> Result<Self> {
        let mut cases = Vec::new();

        for (i, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split(',');
            let fen = fields.next().unwrap_or_default().trim().to_string();

            let expected = fields
                .map(|count| {
                    count.trim().parse::<u64>().with_context(|| {
                        format!("Line {}: Invalid node count {count:?}", i + 1)
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            if expected.is_empty() {
                bail!("Line {}: No node counts given for {fen:?}", i + 1);
            }

            cases.push(PerftCase { fen, expected });
        }

        Ok(Self { cases })
    }

    #[inline(always)]
    pub fn cases(&self) -> &[PerftCase] {
        &self.cases
    }

    /// Runs perft on every case, at every depth it lists up to `max_depth`.
    ///
    /// A count that does not match is recorded, not returned as an error, and ends that case.
    /// Errors are reserved for cases that cannot run at all, such as an invalid FEN.
    pub fn run(&self, max_depth: usize) -> Result<SuiteReport> {
        let mut results = Vec::new();

        for (i, case) in self.cases.iter().enumerate() {
            let mut position = Position::from_fen(&case.fen)
                .with_context(|| format!("Case {}: Cannot load {:?}", i + 1, case.fen))?;

            info!("Case {}/{}: {}", i + 1, self.cases.len(), case.fen);

            for (depth, &expected) in (1..=max_depth).zip(&case.expected) {
                let start = Instant::now();
                let found = position.perft(depth as i32)?;
                let elapsed = start.elapsed();

                if found == expected {
                    info!("depth {depth}: {found} nodes in {elapsed:?}");
                } else {
                    warn!("depth {depth}: expected {expected} nodes, found {found}");
                }

                results.push(SuiteResult {
                    case: i + 1,
                    fen: case.fen.clone(),
                    depth,
                    expected,
                    found,
                    elapsed,
                });

                // Deeper counts are meaningless once one depth is wrong
                if found != expected {
                    break;
                }
            }
        }

        Ok(SuiteReport { results })
    }
}

/// One perft count from a suite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteResult {
    /// 1-based position of the case in its suite.
    pub case: usize,
    pub fen: String,
    pub depth: usize,
    pub expected: u64,
    pub found: u64,
    pub elapsed: Duration,
}

impl SuiteResult {
    #[inline(always)]
    pub fn passed(&self) -> bool {
        self.expected == self.found
    }

    /// How many more nodes were found than expected. Negative if some were missed.
    #[inline(always)]
    pub fn delta(&self) -> i128 {
        i128::from(self.found) - i128::from(self.expected)
    }
}

/// Every count checked by [`PerftSuite::run`], in the order they ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    results: Vec<SuiteResult>,
}

impl SuiteReport {
    #[inline(always)]
    pub fn results(&self) -> &[SuiteResult] {
        &self.results
    }

    pub fn failures(&self) -> impl Iterator<Item = &SuiteResult> {
        self.results.iter().filter(|result| !result.passed())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Total nodes counted across every result.
    pub fn nodes(&self) -> u64 {
        self.results.iter().map(|result| result.found).sum()
    }

    pub fn elapsed(&self) -> Duration {
        self.results.iter().map(|result| result.elapsed).sum()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fen_width = self
            .results
            .iter()
            .map(|result| result.fen.len())
            .max()
            .unwrap_or_default()
            .max("FEN".len());

        writeln!(
            f,
            "| Case | {:<fen_width$} | Depth | {:>12} | {:>12} | {:>8} | Result |",
            "FEN", "Expected", "Found", "Delta"
        )?;

        for result in &self.results {
            let verdict = if result.passed() { "pass" } else { "FAIL" };
            writeln!(
                f,
                "| {:>4} | {:<fen_width$} | {:>5} | {:>12} | {:>12} | {:>+8} | {verdict:<6} |",
                result.case,
                result.fen,
                result.depth,
                result.expected,
                result.found,
                result.delta()
            )?;
        }

        let failed = self.failures().count();
        let elapsed = self.elapsed();
        let nps = (self.nodes() as f64 / elapsed.as_secs_f64().max(f64::EPSILON)) as u64;
        write!(
            f,
            "{}/{} tests passed, {} nodes in {} ms ({nps} nps)",
            self.results.len() - failed,
            self.results.len(),
            self.nodes(),
            elapsed.as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = "\
# Kings only
4k3/8/8/8/8/8/8/4K3 w - - 0 1 ,5,25

rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1, 20, 400, 8902
";

    #[test]
    fn test_parse_suite() {
        let suite = PerftSuite::parse(SUITE).unwrap();
        assert_eq!(suite.cases().len(), 2);
        assert_eq!(suite.cases()[0].fen, "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(suite.cases()[0].expected, [5, 25]);
        assert_eq!(suite.cases()[1].expected, [20, 400, 8902]);
    }

    #[test]
    fn test_parse_rejects_bad_counts() {
        assert!(PerftSuite::parse("4k3/8/8/8/8/8/8/4K3 w - - 0 1,five").is_err());
        assert!(PerftSuite::parse("4k3/8/8/8/8/8/8/4K3 w - - 0 1").is_err());
        assert!(PerftSuite::parse("").unwrap().cases().is_empty());
    }

    #[test]
    fn test_run_reports_mismatches() {
        let suite = PerftSuite::parse(
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1,5,26,99\n4k3/8/8/8/8/8/8/4K3 b - - 0 1,5",
        )
        .unwrap();
        let report = suite.run(5).unwrap();

        // The first case stops at its bad second depth
        assert_eq!(report.results().len(), 3);
        assert!(report.results()[0].passed());
        assert!(!report.is_success());

        let failure = report.failures().next().unwrap();
        assert_eq!((failure.case, failure.depth), (1, 2));
        assert_eq!((failure.expected, failure.found, failure.delta()), (26, 25, -1));
        assert_eq!(report.results()[2].case, 2);

        let table = report.to_string();
        assert!(table.contains("FAIL"));
        assert!(table.contains("2/3 tests passed"));
    }

    #[test]
    fn test_run_respects_max_depth() {
        let report = PerftSuite::parse(SUITE).unwrap().run(2).unwrap();
        assert_eq!(report.results().len(), 4);
        assert!(report.is_success());
        assert_eq!(report.nodes(), 5 + 25 + 20 + 400);
    }

    #[test]
    fn test_run_rejects_bad_fen() {
        let suite = PerftSuite::parse("not a fen,1").unwrap();
        assert!(suite.run(1).is_err());
    }
}
