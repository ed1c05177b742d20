// bettyfmt: Betty-style C source code formatter

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use bettyfmt::format_with_report;

#[derive(Parser)]
#[command(name = "bettyfmt", version, about = "Betty-style C source code formatter")]
struct Cli {
    /// Rewrite each file in place
    #[arg(short = 'i', long = "in-place", conflicts_with_all = ["output", "check", "diff"])]
    in_place: bool,

    /// Exit non-zero if any file would be reformatted, without writing
    #[arg(short = 'c', long = "check", conflicts_with_all = ["output", "diff"])]
    check: bool,

    /// Print a line diff between the input and the formatted output
    #[arg(short = 'd', long = "diff", conflicts_with = "output")]
    diff: bool,

    /// Write formatted output to FILE instead of stdout (single input only)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// C source files to format
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.output.is_some() && cli.files.len() > 1 {
        eprintln!("error: --output takes exactly one input file");
        return ExitCode::FAILURE;
    }

    let mut failed = false;
    let mut needs_formatting = false;
    for path in &cli.files {
        match process_file(&cli, path) {
            Ok(changed) => needs_formatting |= changed,
            Err(err) => {
                eprintln!("{}: {err:#}", path.display());
                failed = true;
            }
        }
    }

    if failed || (cli.check && needs_formatting) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Formats one file according to the selected mode.  Returns whether the
/// formatted text differs from the input.
fn process_file(cli: &Cli, path: &PathBuf) -> Result<bool> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let (formatted, report) = format_with_report(&source);

    if report.lex_errors > 0 {
        log::warn!(
            "{}: {} lexical error(s), affected text kept as-is",
            path.display(),
            report.lex_errors
        );
    }
    if report.parse_recoveries > 0 {
        log::warn!(
            "{}: {} construct(s) outside the modeled grammar kept verbatim",
            path.display(),
            report.parse_recoveries
        );
    }

    let changed = formatted != source;
    if cli.check {
        if changed {
            println!("{}: needs formatting", path.display());
        }
        return Ok(changed);
    }
    if cli.diff {
        print!("{}", line_diff(&source, &formatted, path));
        return Ok(changed);
    }
    if cli.in_place {
        if changed {
            fs::write(path, &formatted)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        return Ok(changed);
    }
    if let Some(out_path) = &cli.output {
        fs::write(out_path, &formatted)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        return Ok(changed);
    }
    print!("{formatted}");
    Ok(changed)
}

/// Minimal line diff: common prefix/suffix trimmed, the differing middle
/// printed as removals then additions.
fn line_diff(before: &str, after: &str, path: &std::path::Path) -> String {
    if before == after {
        return String::new();
    }
    let old: Vec<&str> = before.lines().collect();
    let new: Vec<&str> = after.lines().collect();

    let mut start = 0;
    while start < old.len() && start < new.len() && old[start] == new[start] {
        start += 1;
    }
    let mut old_end = old.len();
    let mut new_end = new.len();
    while old_end > start && new_end > start && old[old_end - 1] == new[new_end - 1] {
        old_end -= 1;
        new_end -= 1;
    }

    let mut out = format!("--- {}\n+++ {} (formatted)\n", path.display(), path.display());
    out.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        start + 1,
        old_end - start,
        start + 1,
        new_end - start
    ));
    for line in &old[start..old_end] {
        out.push('-');
        out.push_str(line);
        out.push('\n');
    }
    for line in &new[start..new_end] {
        out.push('+');
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_trims_common_context() {
        let before = "int a;\nint  b;\nint c;\n";
        let after = "int a;\nint b;\nint c;\n";
        let diff = line_diff(before, after, std::path::Path::new("t.c"));
        assert!(diff.contains("-int  b;"));
        assert!(diff.contains("+int b;"));
        assert!(!diff.contains("-int a;"));
        assert!(!diff.contains("-int c;"));
    }

    #[test]
    fn diff_is_empty_for_identical_text() {
        assert!(line_diff("x\n", "x\n", std::path::Path::new("t.c")).is_empty());
    }
}
