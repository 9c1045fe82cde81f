use analyzer::AnalyticsService;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use configuration::{Config, LogFormat};
use serde_json::json;

/// The main entry point for the stocklens application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Registration fields and client credentials usually live in .env.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config()?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => web_server::run_server(&config).await,
        Commands::Setup => handle_setup(&config, cli.json).await,
        Commands::Query(query) => {
            let service = web_server::build_service(&config)?;
            connect(&service, &config).await?;
            handle_query(&service, query, cli.json).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Price statistics over a remote stock service: averages, spreads and correlations.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print results as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    /// Overrides `logging.format` from the configuration.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register with the price service and check the issued credentials.
    Setup,
    /// Run the HTTP API.
    Serve,
    #[command(flatten)]
    Query(QueryCommands),
}

/// Commands that need an authenticated session.
#[derive(Subcommand)]
enum QueryCommands {
    /// List every ticker the price service knows.
    Tickers,
    /// Summary and price history of one ticker.
    Stock {
        ticker: String,
        #[arg(long, short)]
        minutes: u64,
    },
    /// Average price of one ticker.
    Average {
        ticker: String,
        #[arg(long, short)]
        minutes: u64,
    },
    /// Pearson correlation of two tickers.
    Correlation {
        first: String,
        second: String,
        #[arg(long, short)]
        minutes: u64,
    },
    /// Correlation matrix; every known ticker when none is given.
    Matrix {
        #[arg(long, short)]
        minutes: u64,
        tickers: Vec<String>,
    },
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Registers, then authenticates, printing what the user needs to keep.
async fn handle_setup(config: &Config, json: bool) -> anyhow::Result<()> {
    let service = web_server::build_service(config)?;
    let gateway = service.gateway();

    let credentials = gateway.register(&config.registration.to_details()).await?;
    let token = gateway.authenticate().await?;

    if json {
        let out = json!({
            "clientId": credentials.client_id,
            "clientSecret": credentials.client_secret,
            "token": token.masked(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Registered successfully. Add these to your .env file:");
        println!("CLIENT_ID={}", credentials.client_id);
        println!("CLIENT_SECRET={}", credentials.client_secret);
        println!("Authenticated (token {}).", token.masked());
    }
    Ok(())
}

/// Makes sure the session holds credentials and a fresh token.
async fn connect(service: &AnalyticsService, config: &Config) -> anyhow::Result<()> {
    let gateway = service.gateway();
    if gateway.session().credentials().await.is_none() {
        tracing::info!("No client credentials configured; registering first.");
        gateway.register(&config.registration.to_details()).await?;
    }
    gateway.authenticate().await?;
    Ok(())
}

async fn handle_query(service: &AnalyticsService, command: QueryCommands, json: bool) -> anyhow::Result<()> {
    match command {
        QueryCommands::Tickers => {
            let tickers = service.list_tickers().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tickers)?);
            } else {
                for ticker in tickers {
                    println!("{ticker}");
                }
            }
        }
        QueryCommands::Stock { ticker, minutes } => {
            let summary = service.get_stock_summary(&ticker, minutes).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{} over the last {} minutes", summary.ticker, minutes);
                println!("Average:            {:.4}", summary.average);
                println!("Standard deviation: {:.4}", summary.standard_deviation);

                let mut table = Table::new();
                table.load_preset(UTF8_FULL).set_header(vec!["Timestamp", "Price"]);
                for sample in summary.price_history.iter() {
                    table.add_row(vec![
                        Cell::new(&sample.timestamp),
                        Cell::new(format!("{:.4}", sample.price)),
                    ]);
                }
                println!("{table}");
            }
        }
        QueryCommands::Average { ticker, minutes } => {
            let result = service.get_average(&ticker, minutes).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}: {:.4}", result.ticker, result.average);
            }
        }
        QueryCommands::Correlation {
            first,
            second,
            minutes,
        } => {
            let result = service.get_correlation(&first, &second, minutes).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{} / {}: {:.4}", result.ticker1, result.ticker2, result.correlation);
            }
        }
        QueryCommands::Matrix { minutes, tickers } => {
            let matrix = service.get_correlation_matrix(&tickers, minutes).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&matrix)?);
            } else {
                let mut header = vec![String::new()];
                header.extend(matrix.tickers.iter().cloned());

                let mut table = Table::new();
                table.load_preset(UTF8_FULL).set_header(header);
                for (ticker, row) in matrix.tickers.iter().zip(&matrix.matrix) {
                    let mut cells = vec![Cell::new(ticker)];
                    cells.extend(row.iter().map(|cell| match cell {
                        Some(value) => Cell::new(format!("{value:.4}")),
                        None => Cell::new("-"),
                    }));
                    table.add_row(cells);
                }
                println!("{table}");
            }
        }
    }
    Ok(())
}
