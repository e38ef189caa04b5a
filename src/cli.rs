//! Command-line surface: flag parsing only. Dispatch lives in `main.rs`.
use std::path::PathBuf;

use clap::Parser;

/// Inspects and optionally runs a JVM class file.
#[derive(Debug, Parser)]
#[command(name = "classgazer", version, about)]
pub struct Cli {
    /// Path to the `.class` file to inspect.
    pub path: PathBuf,

    /// Human-readable dump (default).
    #[arg(long, conflicts_with_all = ["json", "reader_mode"])]
    pub pretty: bool,

    /// Emit the class file as JSON instead of the pretty dump.
    #[arg(long, conflicts_with_all = ["pretty", "reader_mode"])]
    pub json: bool,

    /// Parse the class file but print nothing (used to validate the parser
    /// itself, or as a no-op smoke test).
    #[arg(long = "reader-mode", conflicts_with_all = ["pretty", "json"])]
    pub reader_mode: bool,

    /// Skip disassembling method bodies.
    #[arg(long = "no-code")]
    pub no_code: bool,

    /// Execute `main([Ljava/lang/String;)V` instead of printing.
    #[arg(short = 'r', long = "run")]
    pub run: bool,

    /// Like `--run`, but traces every executed instruction at debug level.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Raise the log level from `warn` to `debug`.
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses the process's argv. The documented CLI surface accepts the
    /// literal single-dash tokens `-run`/`-debug` alongside `--run`/`--debug`,
    /// which clap's short/long flag model can't express directly (a bare
    /// `short = 'r'` only matches `-r`, and clap would otherwise read `-run`
    /// as the bundled short flags `-r -u -n`), so those tokens are rewritten
    /// before clap ever sees them.
    pub fn parse_args() -> Self {
        Self::parse_from(Self::normalize(std::env::args()))
    }

    /// Rewrites literal `-run`/`-debug` tokens to their `--` long-flag form.
    fn normalize<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
        args.into_iter()
            .map(|arg| match arg.as_str() {
                "-run" => "--run".to_string(),
                "-debug" => "--debug".to_string(),
                other => other.to_string(),
            })
            .collect()
    }

    /// True when the pretty dump should be produced — the default output
    /// mode when neither `--json` nor `--reader-mode` was requested.
    pub fn wants_pretty(&self) -> bool {
        !self.json && !self.reader_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_pretty_output() {
        let cli = Cli::parse_from(["classgazer", "Foo.class"]);
        assert!(cli.wants_pretty());
        assert!(!cli.run);
        assert!(!cli.debug);
    }

    #[test]
    fn json_flag_overrides_default() {
        let cli = Cli::parse_from(["classgazer", "--json", "Foo.class"]);
        assert!(!cli.wants_pretty());
        assert!(cli.json);
    }

    #[test]
    fn pretty_and_json_are_mutually_exclusive() {
        let result = Cli::try_parse_from(["classgazer", "--pretty", "--json", "Foo.class"]);
        assert!(result.is_err());
    }

    #[test]
    fn normalizes_legacy_single_dash_run_and_debug() {
        let normalized = Cli::normalize(
            ["classgazer", "-run", "-debug", "Foo.class"].map(String::from),
        );
        assert_eq!(normalized, vec!["classgazer", "--run", "--debug", "Foo.class"]);
    }

    #[test]
    fn parses_legacy_single_dash_run_flag() {
        let args = Cli::normalize(["classgazer", "-run", "Foo.class"].map(String::from));
        let cli = Cli::parse_from(args);
        assert!(cli.run);
        assert!(!cli.debug);
    }

    #[test]
    fn short_flags_still_work() {
        let cli = Cli::parse_from(["classgazer", "-r", "-d", "Foo.class"]);
        assert!(cli.run);
        assert!(cli.debug);
    }
}
