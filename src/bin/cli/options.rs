use std::path::{Path, PathBuf};

use flightbench::config::RunConfig;
use flightbench::dataset::CachePolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Command {
    List,
    Prepare,
    Run,
}

#[derive(Clone, Debug, PartialEq)]
pub(super) struct CliOptions {
    pub(super) command: Command,
    pub(super) config: Option<PathBuf>,
    pub(super) out: PathBuf,
    pub(super) benches: Vec<String>,
    pub(super) data: Option<PathBuf>,
    pub(super) rows: Option<usize>,
    pub(super) test_fraction: Option<f64>,
    pub(super) no_shuffle: bool,
    pub(super) trees: Option<usize>,
    pub(super) threads: Option<usize>,
    pub(super) cache_per_limit: bool,
}

impl CliOptions {
    /// Command-line values replace whatever the config file set.
    pub(super) fn apply_to(&self, config: &mut RunConfig) {
        if let Some(data) = &self.data {
            config.storage_root = Some(data.clone());
        }
        if let Some(rows) = self.rows {
            config.row_limit = rows;
        }
        if let Some(fraction) = self.test_fraction {
            config.test_fraction = fraction;
        }
        if self.no_shuffle {
            config.shuffle = false;
        }
        if let Some(trees) = self.trees {
            config.n_trees = trees;
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        if self.cache_per_limit {
            config.cache_policy = CachePolicy::SourceAndRowLimit;
        }
    }
}

pub(super) fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let Some(first) = args.first() else {
        return Err(format!("Missing command\n\n{}", help_text()));
    };
    let command = match first.as_str() {
        "-h" | "--help" | "help" => {
            println!("{}", help_text());
            return Ok(None);
        }
        "list" => Command::List,
        "prepare" => Command::Prepare,
        "run" => Command::Run,
        other => return Err(format!("Unknown command: {other}\n\n{}", help_text())),
    };
    let mut options = default_options(command);
    if apply_args(&mut options, &args[1..])? {
        return Ok(None);
    }
    if command != Command::Run && !options.benches.is_empty() {
        return Err("--bench is only valid with `run`".to_string());
    }
    Ok(Some(options))
}

pub(super) fn write_output(path: &Path, payload: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|err| format!("Create output dir {} failed: {err}", parent.display()))?;
    }
    std::fs::write(path, payload)
        .map_err(|err| format!("Write output {} failed: {err}", path.display()))?;
    Ok(())
}

fn default_options(command: Command) -> CliOptions {
    CliOptions {
        command,
        config: None,
        out: PathBuf::from("flightbench.json"),
        benches: Vec::new(),
        data: None,
        rows: None,
        test_fraction: None,
        no_shuffle: false,
        trees: None,
        threads: None,
        cache_per_limit: false,
    }
}

/// Returns `true` when help was printed.
fn apply_args(options: &mut CliOptions, args: &[String]) -> Result<bool, String> {
    let mut idx = 0usize;
    while idx < args.len() {
        if apply_arg(options, args, &mut idx)? {
            return Ok(true);
        }
        idx += 1;
    }
    Ok(false)
}

fn apply_arg(options: &mut CliOptions, args: &[String], idx: &mut usize) -> Result<bool, String> {
    let flag = args.get(*idx).map(String::as_str).unwrap_or_default();
    if flag == "-h" || flag == "--help" {
        println!("{}", help_text());
        return Ok(true);
    }
    if apply_toggle(options, flag) {
        return Ok(false);
    }
    if apply_value(options, args, idx, flag)? {
        return Ok(false);
    }
    Err(format!("Unknown argument: {flag}\n\n{}", help_text()))
}

fn apply_toggle(options: &mut CliOptions, flag: &str) -> bool {
    match flag {
        "--no-shuffle" => options.no_shuffle = true,
        "--cache-per-limit" => options.cache_per_limit = true,
        _ => return false,
    }
    true
}

fn apply_value(
    options: &mut CliOptions,
    args: &[String],
    idx: &mut usize,
    flag: &str,
) -> Result<bool, String> {
    match flag {
        "--config" => options.config = Some(PathBuf::from(value_after(args, idx, "--config")?)),
        "--out" => options.out = PathBuf::from(value_after(args, idx, "--out")?),
        "--data" => options.data = Some(PathBuf::from(value_after(args, idx, "--data")?)),
        "--bench" => options.benches.push(value_after(args, idx, "--bench")?.to_string()),
        "--rows" => options.rows = Some(parse_usize(args, idx, "--rows")?),
        "--trees" => options.trees = Some(parse_usize(args, idx, "--trees")?),
        "--threads" => options.threads = Some(parse_usize(args, idx, "--threads")?),
        "--test-fraction" => options.test_fraction = Some(parse_f64(args, idx, "--test-fraction")?),
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_usize(args: &[String], idx: &mut usize, flag: &str) -> Result<usize, String> {
    let value = value_after(args, idx, flag)?;
    value
        .parse::<usize>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn parse_f64(args: &[String], idx: &mut usize, flag: &str) -> Result<f64, String> {
    let value = value_after(args, idx, flag)?;
    value
        .parse::<f64>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn value_after<'a>(args: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, String> {
    *idx += 1;
    let value = args.get(*idx).ok_or_else(|| format!("{flag} requires a value"))?;
    Ok(value)
}

fn help_text() -> &'static str {
    "Usage: flightbench <list|prepare|run> [options]\n\n\
Commands:\n\
  list                         Show the benchmark matrix and disabled entries\n\
  prepare                      Load, encode and cache the airline dataset, then split it\n\
  run                          Prepare the dataset and run benchmarks\n\n\
Options:\n\
  --config <path>              TOML run config (default: flightbench.toml in the app dir)\n\
  --data <dir>                 Storage root holding airline_14col.data.bz2\n\
  --rows <n>                   Rows read from the raw source (default: 20000000)\n\
  --test-fraction <f>          Share of rows in the test split (default: 0.2)\n\
  --no-shuffle                 Deterministic ordered split\n\
  --cache-per-limit            One cache artifact per row limit\n\
  --trees <n>                  Boosting rounds per engine (default: 100)\n\
  --threads <n>                CPU threads handed to engines (default: all cores)\n\
  --bench <name>               Benchmark to run; repeatable (default: every enabled entry)\n\
  --out <path>                 Output JSON path for `run` (default: flightbench.json)\n\
  -h, --help                   Show this help\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn run_flags_are_collected() {
        let options = parse_args(args(&[
            "run", "--bench", "xgb-cpu", "--bench", "cat-cpu", "--rows", "1000", "--no-shuffle",
            "--test-fraction", "0.25",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(options.command, Command::Run);
        assert_eq!(options.benches, vec!["xgb-cpu", "cat-cpu"]);
        assert_eq!(options.rows, Some(1000));

        let mut config = RunConfig::default();
        options.apply_to(&mut config);
        assert_eq!(config.row_limit, 1000);
        assert_eq!(config.test_fraction, 0.25);
        assert!(!config.shuffle);
        assert_eq!(config.n_trees, 100);
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["train"])).unwrap_err().starts_with("Unknown command"));
        assert_eq!(
            parse_args(args(&["prepare", "--rows", "many"])).unwrap_err(),
            "Invalid --rows value: many"
        );
        assert_eq!(
            parse_args(args(&["run", "--out"])).unwrap_err(),
            "--out requires a value"
        );
        assert!(parse_args(args(&["list", "--bench", "xgb-cpu"])).is_err());
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse_args(args(&["--help"])).unwrap(), None);
        assert_eq!(parse_args(args(&["run", "-h"])).unwrap(), None);
    }
}
