//! The script runner: reads a decTest file line by line, applies directives
//! to the file's context, evaluates test cases, recurses into included
//! scripts, and prints one summary line per file.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::case::{self, Outcome};
use crate::context::{Context, Rounding};
use crate::engine::Engine;
use crate::errors::{Result, RunnerError};
use crate::tokens;

/// Suffix appended to the value of a `dectest:` inclusion directive.
pub const TEST_SUFFIX: &str = ".decTest";

/// Test-case ids skipped by default: published suite entries whose
/// expectations disagree with the corrected arithmetic.
pub const DEFAULT_SKIP_IDS: &[&str] = &[
    "pwsx805", "powx4302", "powx4303", "powx4342", "powx4343", "lnx116", "lnx732",
];

/// Per-file tallies. Every test line counts under `tests` and under exactly
/// one of the other three.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub tests: u64,
    pub successes: u64,
    pub failures: u64,
    pub skips: u64,
}

impl Counters {
    /// Fold a child file's tallies into this one.
    pub fn fold(&mut self, child: Counters) {
        self.tests += child.tests;
        self.successes += child.successes;
        self.failures += child.failures;
        self.skips += child.skips;
    }
}

/// Drives scripts against an engine. Holds the injectable skip list and the
/// stack of files currently open, which guards against inclusion cycles.
pub struct Runner<E> {
    engine: E,
    skip_ids: Vec<String>,
    active: Vec<PathBuf>,
}

impl<E: Engine> Runner<E> {
    /// A runner with the default skip list.
    pub fn new(engine: E) -> Runner<E> {
        Runner {
            engine,
            skip_ids: DEFAULT_SKIP_IDS.iter().map(|s| s.to_string()).collect(),
            active: Vec::new(),
        }
    }

    /// A runner with exactly the given skip list.
    pub fn with_skip_ids<I, S>(engine: E, ids: I) -> Runner<E>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Runner {
            engine,
            skip_ids: ids.into_iter().map(Into::into).collect(),
            active: Vec::new(),
        }
    }

    pub fn clear_skip_ids(&mut self) {
        self.skip_ids.clear();
    }

    pub fn add_skip_id(&mut self, id: impl Into<String>) {
        self.skip_ids.push(id.into());
    }

    /// Run a top-level script, writing diagnostics and summaries to `out`.
    /// The counters cover the whole tree of included files.
    pub fn run_file<W: Write>(&mut self, path: impl AsRef<Path>, out: &mut W) -> Result<Counters> {
        let (counters, result) = self.process_file(path.as_ref(), out);
        result.map(|()| counters)
    }

    /// Process one file. The summary line is printed and the counters are
    /// returned even when a hard error aborts the file early, so a parent
    /// can fold them before propagating the error.
    fn process_file<W: Write>(&mut self, path: &Path, out: &mut W) -> (Counters, Result<()>) {
        let mut counters = Counters::default();
        let mut result = self.file_loop(path, out, &mut counters);
        if result.is_err() {
            let _ = writeln!(out, "== break because of failure. {}", path.display());
        }
        let summary = writeln!(
            out,
            "== {}: tests={} success={} failure={} skip={}",
            path.display(),
            counters.tests,
            counters.successes,
            counters.failures,
            counters.skips,
        );
        if let (Err(e), true) = (summary, result.is_ok()) {
            result = Err(e.into());
        }
        (counters, result)
    }

    fn file_loop<W: Write>(
        &mut self,
        path: &Path,
        out: &mut W,
        counters: &mut Counters,
    ) -> Result<()> {
        let file = File::open(path).map_err(|source| RunnerError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if self.active.contains(&canonical) {
            return Err(RunnerError::IncludeCycle { path: path.to_path_buf() });
        }
        self.active.push(canonical);
        debug!(path = %path.display(), "processing script");
        let result = self.run_lines(path, BufReader::new(file), out, counters);
        self.active.pop();
        result
    }

    fn run_lines<W: Write>(
        &mut self,
        path: &Path,
        reader: impl BufRead,
        out: &mut W,
        counters: &mut Counters,
    ) -> Result<()> {
        // each file starts from the base context, directives notwithstanding
        // anything set by the including file
        let mut ctx = Context::default();
        for line in reader.lines() {
            let line = line.map_err(|source| RunnerError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let toks = tokens::tokenize(&line);
            if tokens::is_test(&toks) {
                counters.tests += 1;
                if ctx.extended {
                    debug!(id = %toks[0], "skipping under the extended gate");
                    counters.skips += 1;
                    continue;
                }
                match case::run(&self.engine, &toks, &mut ctx, &self.skip_ids, out)? {
                    Outcome::Pass => counters.successes += 1,
                    Outcome::Fail => counters.failures += 1,
                    Outcome::Skip => counters.skips += 1,
                }
            } else if tokens::is_directive(&toks) {
                self.directive(path, &toks, &mut ctx, out, counters)?;
            } else if !toks.is_empty() {
                return Err(RunnerError::UnsupportedLine(line.trim().to_string()));
            }
        }
        Ok(())
    }

    fn directive<W: Write>(
        &mut self,
        path: &Path,
        toks: &[String],
        ctx: &mut Context,
        out: &mut W,
        counters: &mut Counters,
    ) -> Result<()> {
        let name = toks[0].to_ascii_lowercase();
        let value = toks[2].as_str();
        debug!(directive = %name, value, "applying directive");
        match name.as_str() {
            "version" => {}
            "precision" => ctx.precision = int_value(&name, value)?,
            "rounding" => {
                ctx.rounding = Rounding::from_name(value)
                    .ok_or_else(|| RunnerError::UnknownRounding(value.to_string()))?;
            }
            "maxexponent" => ctx.emax = int_value(&name, value)?,
            "minexponent" => ctx.emin = int_value(&name, value)?,
            "clamp" => ctx.clamp = int_value(&name, value)? != 0,
            "extended" => ctx.extended = int_value(&name, value)? != 0,
            "dectest" => {
                let target = path
                    .parent()
                    .unwrap_or_else(|| Path::new(""))
                    .join(format!("{value}{TEST_SUFFIX}"));
                let (child, result) = self.process_file(&target, out);
                counters.fold(child);
                result?;
            }
            _ => return Err(RunnerError::UnknownDirective(toks[0].clone())),
        }
        Ok(())
    }
}

fn int_value(directive: &str, value: &str) -> Result<i32> {
    value.parse().map_err(|_| RunnerError::BadDirectiveValue {
        directive: directive.to_string(),
        value: value.to_string(),
    })
}
