//! mysql-dump CLI - logical backup and restore for MySQL through SQL text.

use clap::{Parser, Subcommand, ValueEnum};
use mysql_dump::compress::compress_file;
use mysql_dump::{
    CompressionLevel, Config, DryRunExecutor, DumpError, DumpSource, DumpSummary, Dumper,
    MergeMode, MysqlExecutor, MysqlSource, RestoreSummary, Restorer,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufRead, AsyncWriteExt, BufReader, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "mysql-dump")]
#[command(about = "Logical backup and restore for MySQL through plain SQL text")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write databases as SQL text
    Dump {
        /// Databases to dump (overrides config)
        #[arg(short, long, value_delimiter = ',')]
        databases: Vec<String>,

        /// Dump every non-system database
        #[arg(long, conflicts_with = "databases")]
        all_databases: bool,

        /// Restrict the dump to these tables (single database only)
        #[arg(short, long, value_delimiter = ',')]
        tables: Vec<String>,

        /// Structure only, no INSERT statements
        #[arg(long)]
        no_data: bool,

        /// Emit DROP ... IF EXISTS before each CREATE
        #[arg(long)]
        drop: bool,

        /// Emit USE before each database section
        #[arg(long)]
        use_database: bool,

        /// Rows per INSERT statement
        #[arg(long)]
        rows_per_insert: Option<usize>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Gzip the output file when done
        #[arg(long, value_enum)]
        compress: Option<CompressArg>,

        /// Log each table at info level
        #[arg(short, long)]
        verbose: bool,
    },

    /// Execute a SQL dump against the configured server
    Restore {
        /// Dump file to read (stdin when omitted or "-")
        input: Option<PathBuf>,

        /// Read and merge statements without executing them
        #[arg(long)]
        dry_run: bool,

        /// Merge up to this many consecutive INSERT statements
        #[arg(long)]
        merge_inserts: Option<usize>,

        /// How INSERT statements are merged
        #[arg(long, value_enum)]
        merge_mode: Option<MergeArg>,

        /// Log each statement at info level
        #[arg(short, long)]
        verbose: bool,
    },

    /// Test the database connection
    HealthCheck,
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressArg {
    Fastest,
    Default,
    Best,
}

impl From<CompressArg> for CompressionLevel {
    fn from(arg: CompressArg) -> Self {
        match arg {
            CompressArg::Fastest => CompressionLevel::Fastest,
            CompressArg::Default => CompressionLevel::Default,
            CompressArg::Best => CompressionLevel::Best,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MergeArg {
    Structural,
    Splice,
}

impl From<MergeArg> for MergeMode {
    fn from(arg: MergeArg) -> Self {
        match arg {
            MergeArg::Structural => MergeMode::Structural,
            MergeArg::Splice => MergeMode::Splice,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DumpError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(DumpError::Config)?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let cancel_token = setup_signal_handler().await?;

    match cli.command {
        Commands::Dump {
            databases,
            all_databases,
            tables,
            no_data,
            drop,
            use_database,
            rows_per_insert,
            output,
            compress,
            verbose,
        } => {
            // Apply overrides
            if !databases.is_empty() {
                config.dump.databases = databases;
                config.dump.all_databases = false;
            }
            if all_databases {
                config.dump.all_databases = true;
                config.dump.databases.clear();
            }
            if !tables.is_empty() {
                config.dump.tables = tables;
            }
            if no_data {
                config.dump.include_data = false;
            }
            config.dump.drop_objects |= drop;
            config.dump.use_database |= use_database;
            config.dump.verbose |= verbose;
            if let Some(n) = rows_per_insert {
                config.dump.rows_per_insert = n;
            }
            if let Some(path) = output {
                config.dump.output = Some(path);
            }
            if let Some(level) = compress {
                config.dump.compression = Some(level.into());
            }
            config.validate()?;

            let (summary, written_to) = run_dump(&config, &cancel_token).await?;

            if cli.output_json {
                let json = summary.to_json()?;
                if written_to.is_some() {
                    println!("{}", json);
                } else {
                    eprintln!("{}", json);
                }
            } else {
                print_dump_summary(&summary, written_to.as_ref());
            }
        }

        Commands::Restore {
            input,
            dry_run,
            merge_inserts,
            merge_mode,
            verbose,
        } => {
            config.restore.dry_run |= dry_run;
            config.restore.verbose |= verbose;
            if let Some(n) = merge_inserts {
                config.restore.merge_inserts = n;
            }
            if let Some(mode) = merge_mode {
                config.restore.merge_mode = mode.into();
            }
            config.validate()?;

            let summary = run_restore(&config, input, &cancel_token).await?;

            if cli.output_json {
                println!("{}", summary.to_json()?);
            } else {
                let status_msg = if summary.dry_run {
                    "Dry run completed!"
                } else {
                    "Restore completed!"
                };
                println!("\n{}", status_msg);
                println!("  Duration: {:.2}s", summary.duration_ms as f64 / 1000.0);
                println!("  Statements read: {}", summary.statements_read);
                println!("  Statements executed: {}", summary.statements_executed);
                println!("  Inserts merged: {}", summary.inserts_merged);
            }
        }

        Commands::HealthCheck => {
            let started = std::time::Instant::now();
            let mut source = MysqlSource::connect(&config.connection).await?;
            let version = source.server_version().await?;
            let latency_ms = started.elapsed().as_millis() as u64;
            let host = source.host().to_string();
            source.disconnect().await?;

            if cli.output_json {
                let result = serde_json::json!({
                    "host": host,
                    "server_version": version,
                    "latency_ms": latency_ms,
                    "healthy": true,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!("  Server: {} ({}ms)", host, latency_ms);
                println!("  Version: {}", version);
                println!("\n  Overall: HEALTHY");
            }
        }
    }

    Ok(())
}

async fn run_dump(
    config: &Config,
    cancel: &CancellationToken,
) -> Result<(DumpSummary, Option<PathBuf>), DumpError> {
    let options = config.dump_options();
    let output = options.output.clone();
    let compression = options.compression;
    if compression.is_some() && output.is_none() {
        return Err(DumpError::Config(
            "compression requires an output file".to_string(),
        ));
    }

    let source = MysqlSource::connect(&config.connection).await?;
    let mut dumper = Dumper::new(source, options);

    let summary = match &output {
        Some(path) => {
            let mut file = BufWriter::new(tokio::fs::File::create(path).await?);
            let summary = dumper.dump(&mut file, cancel).await?;
            file.flush().await?;
            file.into_inner().sync_all().await?;
            summary
        }
        None => {
            let mut stdout = BufWriter::new(tokio::io::stdout());
            let summary = dumper.dump(&mut stdout, cancel).await?;
            stdout.flush().await?;
            summary
        }
    };
    dumper.into_source().disconnect().await?;

    let written_to = match (output, compression) {
        (Some(path), Some(level)) => Some(compress_file(&path, level).await?),
        (path, _) => path,
    };
    Ok((summary, written_to))
}

async fn run_restore(
    config: &Config,
    input: Option<PathBuf>,
    cancel: &CancellationToken,
) -> Result<RestoreSummary, DumpError> {
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match input {
        Some(path) if path.as_os_str() != "-" => {
            info!("Reading statements from {}", path.display());
            Box::new(BufReader::new(tokio::fs::File::open(&path).await?))
        }
        _ => {
            info!("Reading statements from stdin");
            Box::new(BufReader::new(tokio::io::stdin()))
        }
    };

    let options = config.restore.clone();
    let database = config.connection.database.clone();

    if options.dry_run {
        let mut restorer = Restorer::new(DryRunExecutor::new(), options);
        if let Some(db) = database {
            restorer = restorer.with_database(db);
        }
        return restorer.run(reader, cancel).await;
    }

    let executor = MysqlExecutor::connect(&config.connection).await?;
    let mut restorer = Restorer::new(executor, options);
    if let Some(db) = database {
        restorer = restorer.with_database(db);
    }
    let summary = restorer.run(reader, cancel).await?;
    restorer.into_executor().disconnect().await?;
    Ok(summary)
}

fn print_dump_summary(summary: &DumpSummary, written_to: Option<&PathBuf>) {
    // stdout carries the dump itself when no file is given
    let print = |line: String| {
        if written_to.is_some() {
            println!("{}", line);
        } else {
            eprintln!("{}", line);
        }
    };
    print("\nDump completed!".to_string());
    if let Some(path) = written_to {
        print(format!("  Output: {}", path.display()));
    }
    print(format!("  Duration: {:.2}s", summary.duration_ms as f64 / 1000.0));
    print(format!("  Databases: {}", summary.databases));
    print(format!("  Tables: {} (views: {})", summary.tables, summary.views));
    print(format!("  Rows: {} in {} INSERT statements", summary.rows, summary.insert_statements));
    print(format!("  Triggers: {}", summary.triggers));
    if summary.skipped > 0 {
        print(format!("  Skipped objects: {}", summary.skipped));
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity: {}", other)),
    };

    // stdout may carry the dump, so logs always go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format: {}", other)),
    }

    Ok(())
}

/// Cancel the returned token on SIGINT or SIGTERM.
#[cfg(unix)]
async fn setup_signal_handler() -> Result<CancellationToken, DumpError> {
    let cancel_token = CancellationToken::new();

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token = cancel_token.clone();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        eprintln!("\nReceived {}. Stopping at the next statement boundary...", name);
        token.cancel();
    });

    Ok(cancel_token)
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
async fn setup_signal_handler() -> Result<CancellationToken, DumpError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Stopping at the next statement boundary...");
            token.cancel();
        }
    });

    Ok(cancel_token)
}
