mod options;

use std::time::Instant;

use flightbench::benchmarks::{
    BenchmarkEntry, BenchmarkRegistry, BenchmarkReport, DatasetSummary, Runner, SystemInfo,
};
use flightbench::config::RunConfig;
use flightbench::dataset::{DatasetLoader, PreparedData};
use flightbench::engine::EngineSet;
use options::{CliOptions, Command, write_output};

pub(super) fn run(args: Vec<String>) -> Result<(), String> {
    let Some(options) = options::parse_args(args)? else {
        return Ok(());
    };
    if let Err(err) = flightbench::logging::init(None) {
        eprintln!("Logging disabled: {err}");
    }
    let config = load_config(&options)?;
    match options.command {
        Command::List => {
            list(&BenchmarkRegistry::airline(&config));
            Ok(())
        }
        Command::Prepare => {
            let data = prepare(&config)?;
            print_split(&data);
            Ok(())
        }
        Command::Run => run_benchmarks(&options, &config),
    }
}

fn load_config(options: &CliOptions) -> Result<RunConfig, String> {
    let mut config = match &options.config {
        Some(path) => RunConfig::load(path),
        None => RunConfig::load_default(),
    }
    .map_err(|err| err.to_string())?;
    options.apply_to(&mut config);
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn list(registry: &BenchmarkRegistry) {
    for (name, entry) in registry.iter() {
        match entry {
            BenchmarkEntry::Runnable(bench) => {
                println!("{name:<14} {:<9} {:<4} {}", bench.engine, bench.device, bench.metric.name());
            }
            BenchmarkEntry::Disabled { engine, device, reason } => {
                println!("{name:<14} {engine:<9} {device:<4} disabled: {reason}");
            }
        }
    }
}

fn prepare(config: &RunConfig) -> Result<PreparedData, String> {
    let root = config
        .resolved_storage_root()
        .map_err(|err| err.to_string())?;
    let loader = DatasetLoader::new(root);
    let options = config.prepare_options();
    tracing::info!(
        source = %loader.source_path().display(),
        cache = %loader.cache_path(&options).display(),
        row_limit = options.row_limit,
        "Preparing airline dataset"
    );
    loader.prepare(&options).map_err(|err| err.to_string())
}

fn print_split(data: &PreparedData) {
    println!(
        "train: {} rows ({:.1}% delayed)",
        data.train.len(),
        data.train.positive_rate() * 100.0
    );
    println!(
        "test:  {} rows ({:.1}% delayed)",
        data.test.len(),
        data.test.positive_rate() * 100.0
    );
    println!("features: {}", data.feature_names.join(", "));
}

fn run_benchmarks(options: &CliOptions, config: &RunConfig) -> Result<(), String> {
    let started_at = Instant::now();
    let registry = BenchmarkRegistry::airline(config);
    let names: Vec<String> = if options.benches.is_empty() {
        registry.enabled_names().map(str::to_string).collect()
    } else {
        options.benches.clone()
    };
    // Resolve names before the dataset load so a disabled entry fails fast.
    for name in &names {
        registry.runnable(name).map_err(|err| err.to_string())?;
    }

    let data = prepare(config)?;
    print_split(&data);
    let engines = EngineSet::builtin();
    let outcomes = Runner::new(&registry, &engines)
        .run(&data, names.as_slice())
        .map_err(|err| err.to_string())?;

    let mut report = BenchmarkReport::new(config.summary(), SystemInfo::detect());
    report.dataset = DatasetSummary::from_prepared(&data);
    for outcome in &outcomes {
        println!(
            "{:<14} train {:>9.1} ms  test {:>8.1} ms  acc {:.4}  f1 {:.4}  auc {}",
            outcome.name,
            outcome.train_ms,
            outcome.test_ms,
            outcome.metrics.accuracy,
            outcome.metrics.f1,
            outcome
                .metrics
                .auc
                .map(|auc| format!("{auc:.4}"))
                .unwrap_or_else(|| "n/a".to_string()),
        );
    }
    report.outcomes = outcomes;
    report.total_elapsed_ms = started_at.elapsed().as_millis() as u64;

    let json = report
        .to_json()
        .map_err(|err| format!("Serialize JSON failed: {err}"))?;
    write_output(&options.out, &json)?;
    println!("Wrote {}", options.out.display());
    Ok(())
}
