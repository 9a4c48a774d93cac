//! Command-line interface for the `profaln` crate.
//!
//! Subcommands are implemented in separate files (modules) under
//! `src/bin/profaln/`:
//! - `combine_cmd.rs`
//! - `cache_cmd.rs`
//!
//! Invocations using MUSCLE's profile-mode flags
//! (`-profile -in1 QUERY -in2 REFERENCE [-quiet]`) are rewritten to the
//! native `combine` form before parsing, so existing pipelines keep working.
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name="profaln", version=env!("CARGO_PKG_VERSION"), about="Profile alignment of protein sequences against a reference alignment", disable_help_subcommand=true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Align query sequences against a reference alignment (FASTA or cache).
    Combine(combine_cmd::CombineCmd),
    /// Build and persist a reference profile cache without aligning.
    BuildCache(cache_cmd::BuildCacheCmd),
}

#[path = "profaln/combine_cmd.rs"] mod combine_cmd;
#[path = "profaln/cache_cmd.rs"] mod cache_cmd;

fn main() -> Result<()> {
    let args = swap_muscle_args(std::env::args().collect());
    let cli = Cli::parse_from(args);
    match cli.command {
        Command::Combine(cmd) => combine_cmd::run(cmd),
        Command::BuildCache(cmd) => cache_cmd::run(cmd),
    }
}

/// Rewrite MUSCLE profile-mode arguments into the native `combine` form.
/// Arguments that are not MUSCLE flags pass through unchanged.
fn swap_muscle_args(args: Vec<String>) -> Vec<String> {
    let is_muscle_style = args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-profile" | "-in1" | "-in2"));
    if !is_muscle_style {
        return args;
    }

    let mut query = None;
    let mut reference = None;
    let mut extras = Vec::new();
    let mut iter = args.into_iter();
    let program = iter.next().unwrap_or_else(|| "profaln".to_string());
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            // profile-profile mode is the only mode, quiet is the default
            "-profile" | "-quiet" => {}
            "-in1" => query = iter.next(),
            "-in2" => reference = iter.next(),
            _ => extras.push(arg),
        }
    }

    let mut result = vec![program, "combine".to_string()];
    if let Some(query) = query {
        result.push(query);
    }
    if let Some(reference) = reference {
        result.push("--reference-alignment".to_string());
        result.push(reference);
    }
    result.extend(extras);
    result
}

#[cfg(test)]
mod tests {
    use super::swap_muscle_args;

    fn to_args(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn muscle_flags_are_rewritten() {
        let args = to_args(&[
            "profaln", "-profile", "-quiet", "-in1", "query.fasta", "-in2", "db.fasta",
        ]);
        assert_eq!(
            swap_muscle_args(args),
            to_args(&[
                "profaln",
                "combine",
                "query.fasta",
                "--reference-alignment",
                "db.fasta",
            ])
        );
    }

    #[test]
    fn native_arguments_pass_through() {
        let args = to_args(&["profaln", "combine", "q.fasta", "--reference-alignment", "r.fasta"]);
        assert_eq!(swap_muscle_args(args.clone()), args);
    }
}
