//! Castings - SQL join exercises over a movies/actors/castings dataset.

mod cli;

use castings::config::Config;
use castings::db::{self, DatabaseClient, QueryResult};
use castings::error::{Error, Result};
use castings::output::{self, OutputFormat};
use castings::query::QueryExecutor;
use castings::{exercises, fixtures, logging};
use cli::{Cli, Command};
use tracing::{error, info};

fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let format = cli.output_format()?;

    if !cli.command.needs_connection() {
        for exercise in exercises::all() {
            println!("{:<32} {}", exercise.name, exercise.question);
        }
        return Ok(());
    }

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connection = cli.resolve_connection(&config)?.ok_or_else(|| {
        Error::config(
            "No database connection configured. Pass --url, set DATABASE_URL, or use --sample",
        )
    })?;
    info!("Connection: {}", connection.display_string());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::internal(format!("Failed to start runtime: {e}")))?;

    runtime.block_on(async {
        let client = db::connect(&connection).await?;
        let outcome = execute(&cli, client.as_ref(), format).await;
        client.close().await?;
        outcome
    })
}

async fn execute(cli: &Cli, client: &dyn DatabaseClient, format: OutputFormat) -> Result<()> {
    if cli.sample {
        fixtures::load_sample(client).await?;
    }
    if let Some(path) = &cli.seed {
        fixtures::create_schema(client).await?;
        fixtures::load_file(client, path).await?;
    }

    match &cli.command {
        Command::List => Ok(()),
        Command::Run { name } => {
            let exercise = exercises::get(name)?;
            let result = exercise.run(client).await?;
            print_result(&result, format)
        }
        Command::All => {
            for exercise in exercises::all() {
                let result = exercise.run(client).await?;
                if format == OutputFormat::Text {
                    println!("-- {}: {}", exercise.name, exercise.question);
                }
                print_result(&result, format)?;
                if format == OutputFormat::Text {
                    println!();
                }
            }
            Ok(())
        }
        Command::Query { sql } => {
            let result = QueryExecutor::new(client).execute(sql).await?;
            print_result(&result, format)
        }
    }
}

fn print_result(result: &QueryResult, format: OutputFormat) -> Result<()> {
    info!(
        "{} rows in {:.1}ms",
        result.row_count,
        result.execution_time.as_secs_f64() * 1000.0
    );
    println!("{}", output::render(result, format)?);
    Ok(())
}
