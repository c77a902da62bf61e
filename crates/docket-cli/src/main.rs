mod output;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Result, WrapErr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docket_core::engine::RunReport;
use docket_core::scan::scan_source;
use docket_core::{Config, HeuristicScanner, Session, TestFilter};

#[derive(Parser)]
#[command(name = "docket")]
#[command(about = "Run the examples in your C/C++ doc comments as tests", long_about = None)]
struct Cli {
    /// Config file (defaults to ./docket.toml, then the user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every test and debug information
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show declarations and examples found in source files
    Scan {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print the scan as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the test tree
    List {
        /// Files to load (defaults to discovering under source.dir)
        files: Vec<PathBuf>,
        /// Only list tests matching this regex
        #[arg(long)]
        filter: Option<String>,
    },
    /// Run the examples
    Run {
        files: Vec<PathBuf>,
        /// Start every test at once
        #[arg(long)]
        parallel: bool,
        /// Regex over test name, id and description
        #[arg(long)]
        filter: Option<String>,
        /// Run tests from files whose path contains this
        #[arg(long = "file")]
        file_filters: Vec<String>,
        /// Run tests whose name contains this
        #[arg(long = "function")]
        function_filters: Vec<String>,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
        /// LCOV file to merge into coverage
        #[arg(long)]
        lcov: Option<String>,
    },
    /// Run everything and fail on test failures or missed thresholds
    Verify {
        files: Vec<PathBuf>,
    },
    /// Run everything and export coverage
    Coverage {
        files: Vec<PathBuf>,
        /// Write LCOV to this path
        #[arg(long)]
        lcov_out: Option<PathBuf>,
        /// Print coverage as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a default docket.toml
    Init {
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "docket_core=debug" } else { "docket_core=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("loading {}", path.display()))?,
        None => Config::load()?,
    };
    Ok(config)
}

fn file_list(files: &[PathBuf]) -> Option<&[PathBuf]> {
    (!files.is_empty()).then_some(files)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_ref())?;
    if cli.verbose {
        config.run.verbose = true;
    }
    tracing::debug!(
        source_dir = %config.source.dir,
        parallel = config.run.parallel,
        compiler = %config.backend.compiler,
        "configuration loaded"
    );

    match cli.command {
        Commands::Scan { files, json } => {
            let scanner = HeuristicScanner::new();
            let mut dumps = Vec::new();
            for file in &files {
                let content = std::fs::read_to_string(file)
                    .wrap_err_with(|| format!("reading {}", file.display()))?;
                let scan = scan_source(&file.to_string_lossy(), &content, &scanner);
                if json {
                    dumps.push(scan.to_json());
                } else {
                    output::print_scan(&scan);
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&dumps)?);
            }
        }
        Commands::List { files, filter } => {
            let mut session = Session::from_config(config)?;
            session.load(file_list(&files))?;
            match filter {
                Some(pattern) => {
                    for test in session.filter_tests(&pattern)? {
                        println!("{} [{}] {}", test.name, test.id, test.description);
                    }
                }
                None => output::print_tree(session.tree()),
            }
        }
        Commands::Run {
            files,
            parallel,
            filter,
            file_filters,
            function_filters,
            json,
            lcov,
        } => {
            if parallel {
                config.run.parallel = true;
            }
            if lcov.is_some() {
                config.coverage.lcov = lcov;
            }
            let verbose = config.run.verbose;

            let mut test_filter = TestFilter::new();
            if let Some(pattern) = &filter {
                test_filter = test_filter.with_pattern(pattern)?;
            }
            test_filter.files = file_filters;
            test_filter.functions = function_filters;

            let mut session = Session::from_config(config)?;
            session.load(file_list(&files))?;

            let pb = output::spinner(&format!("Running {} tests", session.test_count()), json);
            let summary = session.run(test_filter).await?;
            pb.finish_and_clear();

            if json {
                let report = RunReport::new(&summary, Some(*session.coverage().summary()));
                println!("{}", report.to_json_pretty()?);
            } else {
                output::print_results(session.tree(), &summary, verbose);
            }

            if !summary.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Verify { files } => {
            let mut session = Session::from_config(config)?;
            session.load(file_list(&files))?;

            let pb = output::spinner("Verifying", false);
            let verification = session.run_verify().await?;
            pb.finish_and_clear();

            output::print_results(session.tree(), &verification.summary, false);
            output::print_coverage(session.coverage().summary(), &verification.thresholds);

            if !verification.passed() {
                std::process::exit(1);
            }
        }
        Commands::Coverage {
            files,
            lcov_out,
            json,
        } => {
            let mut session = Session::from_config(config)?;
            session.load(file_list(&files))?;
            session.run(TestFilter::new()).await?;

            let coverage = session.coverage();
            if let Some(path) = lcov_out {
                std::fs::write(&path, coverage.to_lcov())
                    .wrap_err_with(|| format!("writing {}", path.display()))?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&coverage.to_json())?);
            } else {
                output::print_coverage(coverage.summary(), &coverage.check_thresholds());
            }
        }
        Commands::Init { force } => {
            let path = PathBuf::from(docket_core::config::DEFAULT_CONFIG_FILE);
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(&path, Config::default_config_string())?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
