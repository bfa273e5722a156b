use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use chrono::Local;
use clap::Parser;
use log::{error, info, LevelFilter};
use knn_compact::{
    config::subsystems::{LoggingConfig, StrategyChoice},
    exec::{self, Comparison},
    input::{load_points_csv, prompt_usize, write_points_csv, PointGenerator},
    knn::{rank_clusters, validate::{check_neighbor_count, check_point_count}},
    CandidateReport,
    ClusterReport,
    KnnConfig,
    PointSet,
    Result,
    RunReport,
};

/// Find the point whose k nearest neighbors are closest on average.
#[derive(Parser, Debug)]
#[command(name = "knn_compact", version)]
struct Cli {
    /// INI configuration file (defaults to default.ini when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of points to generate
    #[arg(short = 'n', long)]
    points: Option<usize>,

    /// Number of neighbors per cluster
    #[arg(short = 'k', long)]
    neighbors: Option<usize>,

    /// Threads or processes (0 = one per CPU)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// serial, shared, distributed or all
    #[arg(short, long)]
    strategy: Option<String>,

    /// Seed for point generation
    #[arg(long)]
    seed: Option<u64>,

    /// Read points from a CSV file with an x,y header instead of generating them
    #[arg(long)]
    points_file: Option<PathBuf>,

    /// Write the points used for the run to a CSV file
    #[arg(long)]
    save_points: Option<PathBuf>,

    /// Also list every point's cluster, most compact first
    #[arg(long)]
    all_clusters: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(cli: &Cli) -> Result<KnnConfig> {
    let mut config = match &cli.config {
        Some(path) => KnnConfig::from_ini(path)?,
        None if Path::new("default.ini").exists() => KnnConfig::from_ini("default.ini")?,
        None => KnnConfig::default(),
    };

    // Command line wins over the file
    if let Some(n) = cli.points {
        config.input.points = Some(n);
    }
    if let Some(k) = cli.neighbors {
        config.input.neighbors = Some(k);
    }
    if let Some(seed) = cli.seed {
        config.input.seed = Some(seed);
    }
    if let Some(path) = &cli.points_file {
        config.input.points_file = Some(path.clone());
    }
    if let Some(workers) = cli.workers {
        config.executor.workers = workers;
    }
    if let Some(strategy) = &cli.strategy {
        config.executor.strategy = StrategyChoice::from_str(strategy).ok_or_else(|| {
            knn_compact::Error::config(format!("Invalid strategy: {}", strategy))
        })?;
    }

    Ok(config)
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = config.get_log_level();
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level);

    if config.log_to_file {
        fs::create_dir_all(&config.log_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_dir.join(format!("knn_{}.log", timestamp)))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }

    builder.init();
    if level != LevelFilter::Off {
        info!("Logging initialized at {:?}", level);
    }
    Ok(())
}

/// Resolve the point set and k, prompting on stdin for whatever is missing.
fn gather_input(config: &KnnConfig) -> Result<(PointSet, usize)> {
    let min_points = config.input.min_points;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut prompts = io::stderr();

    let points = match &config.input.points_file {
        Some(path) => load_points_csv(path)?,
        None => {
            let n = match config.input.points {
                Some(n) => n,
                None => prompt_usize(&mut input, &mut prompts,
                    &format!("Number of points (at least {})", min_points),
                    |n| n >= min_points)?,
            };
            check_point_count(n, min_points)?;
            PointGenerator::new(config.input.max_coordinate, config.input.seed).generate(n)?
        },
    };
    check_point_count(points.len(), min_points)?;

    let n = points.len();
    let k = match config.input.neighbors {
        Some(k) => k,
        None => prompt_usize(&mut input, &mut prompts,
            &format!("Number of neighbors (2 to {})", n - 1),
            |k| k >= 2 && k < n)?,
    };
    check_neighbor_count(k, n)?;

    Ok((points, k))
}

fn build_report(
    comparison: &Comparison,
    points: &PointSet,
    k: usize,
    all_clusters: bool,
) -> Result<RunReport> {
    let results = comparison
        .outcomes
        .iter()
        .map(|outcome| ClusterReport::from_outcome(outcome, points))
        .collect::<Result<Vec<_>>>()?;

    let clusters = if all_clusters {
        let ranked = rank_clusters(points, k)?;
        Some(CandidateReport::listing(&ranked, points)?)
    } else {
        None
    };

    Ok(RunReport { results, agree: comparison.agree(), clusters })
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    let reports = &report.results;
    match reports.as_slice() {
        [single] => println!("{}", single),
        [first, ..] => {
            println!("{}", first);
            println!();
            println!("{:<12} {:>8} {:>14}", "strategy", "workers", "seconds");
            for row in reports {
                println!("{:<12} {:>8} {:>14.6}", row.strategy, row.workers, row.elapsed_secs);
            }
            println!("Strategies agree: {}", if report.agree { "yes" } else { "NO" });
        },
        [] => {},
    }

    if let Some(clusters) = &report.clusters {
        println!();
        println!("All {} candidate clusters, most compact first:", clusters.len());
        for cluster in clusters {
            println!("{}", cluster);
        }
    }
    Ok(())
}

fn run(cli: &Cli, config: &KnnConfig) -> Result<bool> {
    let (points, k) = gather_input(config)?;
    if let Some(path) = &cli.save_points {
        write_points_csv(path, &points)?;
        info!("Saved {} points to {:?}", points.len(), path);
    }

    let strategies = config.executor.strategy.strategies();
    let comparison = exec::run_all(&strategies, &points, k, &config.executor, config.input.min_points)?;
    let report = build_report(&comparison, &points, k, cli.all_clusters)?;
    print_report(&report, cli.json)?;
    Ok(report.agree)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(1);
        },
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::from(1);
    }

    match run(&cli, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("Strategies produced different results");
            ExitCode::from(1)
        },
        Err(e) if e.is_validation() => {
            error!("Validation failed: {}", e);
            eprintln!("Invalid input: {}", e);
            ExitCode::from(2)
        },
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        },
    }
}
