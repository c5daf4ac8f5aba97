use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use skygamble::config::ModelConfig;
use skygamble::error::RiskError;
use skygamble::fetch::{FetchOptions, DEFAULT_ENDPOINT};
use skygamble::model::{DelayDistribution, Itinerary, RiskResult};
use skygamble::{itinerary, table, ticket, DistributionSource};

#[derive(Parser)]
#[command(
    name = "skygamble",
    about = "Estimate the odds of making every connection on a flight itinerary",
    version,
    after_help = "\
Examples:
  skygamble assess --leg \"F9 1234 ATL TPA 2025-10-04T22:00 2025-10-04T23:29\" \\
                   --leg \"UA 15 TPA SFO 2025-10-05T07:05 2025-10-05T09:41\" \\
                   --dist 0.5,0.2,0.15,0.1,0.05 --dist 0.7,0.1,0.1,0.05,0.05
  skygamble assess --ticket boarding-pass.json --predictor http://localhost:8000/predict
  skygamble assess --ticket - --dist-file predictions.json --json --pretty"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Log model details to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(
        about = "Assess the connection risk of an itinerary",
        long_about = "Assess the connection risk of an itinerary.\n\
            Legs come from repeated --leg flags or from a --ticket file produced by the upload parser.\n\
            Delay distributions come from --dist, --dist-file, or the --predictor service.",
        after_help = "\
Examples:
  Inline:       skygamble assess --leg \"DL 1 ATL JFK 2025-10-04T08:00 2025-10-04T10:00\" --dist 1,0,0,0,0
  Ticket:       skygamble assess --ticket itinerary.json --dist-file predictions.json
  Predictor:    skygamble assess --ticket itinerary.json --predictor http://localhost:8000/predict
  JSON output:  skygamble assess --ticket itinerary.json --dist-file predictions.json --json --pretty"
    )]
    Assess(AssessArgs),
    #[command(about = "Start MCP server for AI agents (stdio transport)")]
    Mcp {
        #[arg(long, value_name = "FILE", help = "Model configuration (JSON)")]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct AssessArgs {
    #[arg(
        long,
        value_name = "\"AIRLINE FLIGHT FROM TO DEPART ARRIVE\"",
        help = "Flight leg (repeatable, in travel order)",
        long_help = "Define a flight leg as \"AIRLINE FLIGHT FROM TO DEPART ARRIVE\", \
            times as YYYY-MM-DDTHH:MM local. Repeat once per leg in travel order.\n\
            Example: --leg \"UA 15 TPA SFO 2025-10-05T07:05 2025-10-05T09:41\"",
        num_args = 1,
    )]
    leg: Vec<String>,

    #[arg(
        long,
        value_name = "FILE",
        conflicts_with = "leg",
        help = "Ticket parser JSON output (- for stdin)"
    )]
    ticket: Option<String>,

    #[arg(
        long,
        value_name = "P0,P30,P90,P180,P300",
        help = "Raw delay distribution (repeatable, one per leg)",
        num_args = 1,
    )]
    dist: Vec<String>,

    #[arg(
        long,
        value_name = "FILE",
        conflicts_with = "dist",
        help = "JSON array of raw delay distributions, one per leg"
    )]
    dist_file: Option<PathBuf>,

    #[arg(
        long,
        value_name = "URL",
        num_args = 0..=1,
        default_missing_value = DEFAULT_ENDPOINT,
        conflicts_with_all = ["dist", "dist_file"],
        help = "Fetch distributions from the prediction service"
    )]
    predictor: Option<String>,

    #[arg(long, value_name = "FILE", help = "Model configuration (JSON)")]
    config: Option<PathBuf>,

    #[arg(long, help = "One line per connection (recommended for scripts and AI agents)")]
    compact: bool,

    #[arg(long, help = "Output as JSON")]
    json: bool,

    #[arg(long, help = "Output as pretty-printed JSON")]
    pretty: bool,

    #[arg(long, value_name = "URL", help = "HTTP or SOCKS5 proxy for the prediction service")]
    proxy: Option<String>,

    #[arg(long, default_value = "30", value_name = "SECS", help = "Prediction request timeout")]
    timeout: u64,
}

fn is_json(args: &AssessArgs) -> bool {
    args.json || args.pretty
}

fn die(err: &RiskError, json_mode: bool) -> ! {
    if json_mode {
        let json = serde_json::json!({
            "error": {
                "kind": err.kind(),
                "message": err.to_string(),
            }
        });
        println!("{json}");
    } else {
        eprintln!("error: {err}");
    }
    process::exit(err.exit_code());
}

fn read_input(path: &str) -> Result<String, RiskError> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| RiskError::TicketParse(format!("cannot read stdin: {e}")))?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .map_err(|e| RiskError::TicketParse(format!("cannot read {path}: {e}")))
}

fn build_itinerary(args: &AssessArgs) -> Result<Itinerary, RiskError> {
    if let Some(ref path) = args.ticket {
        return ticket::parse_ticket(&read_input(path)?);
    }
    if args.leg.is_empty() {
        return Err(RiskError::Validation(
            "--leg is required (or use --ticket)".into(),
        ));
    }
    let legs = args
        .leg
        .iter()
        .map(|s| itinerary::parse_leg(s))
        .collect::<Result<Vec<_>, _>>()?;
    Itinerary::new(legs)
}

fn read_dist_file(path: &Path) -> Result<Vec<DelayDistribution>, RiskError> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        RiskError::InvalidDistribution(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&json).map_err(|e| RiskError::InvalidDistribution(e.to_string()))
}

fn build_source(args: &AssessArgs) -> Result<DistributionSource, RiskError> {
    if let Some(ref path) = args.dist_file {
        return Ok(DistributionSource::Inline(read_dist_file(path)?));
    }
    if !args.dist.is_empty() {
        let raw = args
            .dist
            .iter()
            .map(|s| s.parse::<DelayDistribution>())
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(DistributionSource::Inline(raw));
    }
    if let Some(ref endpoint) = args.predictor {
        return Ok(DistributionSource::Predictor(FetchOptions {
            endpoint: endpoint.clone(),
            proxy: args.proxy.clone(),
            timeout: args.timeout,
        }));
    }
    Err(RiskError::Validation(
        "--dist, --dist-file or --predictor is required".into(),
    ))
}

fn load_config(path: Option<&Path>) -> Result<ModelConfig, RiskError> {
    match path {
        Some(p) => ModelConfig::load(p),
        None => Ok(ModelConfig::default()),
    }
}

fn print_compact(result: &RiskResult) {
    println!("overall {}%", result.success_percent);
    for c in &result.connections {
        println!(
            "{}% | {}>{} | layover {} | margin {} | {}",
            c.percent,
            c.arrival_airport,
            c.departure_airport,
            table::format_minutes(c.layover_minutes),
            table::format_minutes(c.margin_minutes),
            c.tier,
        );
    }
}

fn print_result(result: &RiskResult, args: &AssessArgs) -> Result<(), RiskError> {
    if args.compact {
        print_compact(result);
    } else if is_json(args) {
        let output = if args.pretty {
            serde_json::to_string_pretty(result)
        } else {
            serde_json::to_string(result)
        }
        .map_err(|e| RiskError::Validation(format!("failed to serialize result: {e}")))?;
        println!("{output}");
    } else {
        println!("{}", table::render(result));
        if let Some(weakest) = result.weakest_connection() {
            println!("\nWeakest link: {}", table::connection_summary(weakest));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    skygamble::logging::init(cli.verbose);

    match cli.command {
        Commands::Mcp { config } => {
            let config = match load_config(config.as_deref()) {
                Ok(c) => c,
                Err(e) => die(&e, false),
            };
            if let Err(e) = skygamble::mcp::run(config).await {
                eprintln!("error: MCP server failed: {e}");
                process::exit(1);
            }
        }
        Commands::Assess(args) => {
            let json_mode = is_json(&args);

            let config = match load_config(args.config.as_deref()) {
                Ok(c) => c,
                Err(e) => die(&e, json_mode),
            };
            let itinerary = match build_itinerary(&args) {
                Ok(i) => i,
                Err(e) => die(&e, json_mode),
            };
            let source = match build_source(&args) {
                Ok(s) => s,
                Err(e) => die(&e, json_mode),
            };

            match skygamble::assess(&itinerary, source, &config).await {
                Ok(result) => {
                    if let Err(e) = print_result(&result, &args) {
                        die(&e, json_mode);
                    }
                }
                Err(e) => die(&e, json_mode),
            }
        }
    }
}
