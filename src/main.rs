mod airport_resolver;
mod config;
mod error;
mod flight_search;
mod genai;
#[cfg(test)]
mod http_stub;
mod itinerary;
mod metrics;
mod otel;
mod planner;
mod trip;

use clap::{Parser, Subcommand};
use config::AppConfig;
use dotenv::dotenv;
use error::TravelError;
use flight_search::{SerpApiClient, format_flight_table};
use genai::GeminiGenerator;
use planner::{TripPlan, plan_trip};
use trip::{TripRequest, parse_date};
use tracing::{info, instrument};

/// Travel planning assistant: itinerary generation plus flight options
#[derive(Parser, Debug)]
#[command(name = "trip-planner")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an itinerary and search for flights
    Plan(PlanArgs),
    /// List generative models available to the configured key
    ListModels,
}

#[derive(clap::Args, Debug)]
struct PlanArgs {
    /// Source city (e.g., New York)
    #[arg(short, long)]
    from: String,

    /// Destination city (e.g., Paris)
    #[arg(short, long)]
    to: String,

    /// Outbound date (YYYY-MM-DD)
    #[arg(short, long)]
    date: String,

    /// Return date for round trips (YYYY-MM-DD)
    #[arg(short = 'R', long)]
    return_date: Option<String>,

    /// Budget, free text (e.g., $2000)
    #[arg(short, long, default_value = "")]
    budget: String,

    /// Number of travelers
    #[arg(short = 'n', long, default_value = "1")]
    travelers: u32,

    /// Interests (e.g., "Art, History, Food, Hiking")
    #[arg(short, long)]
    interests: String,

    /// Skip the flight search
    #[arg(long)]
    no_flights: bool,
}

impl PlanArgs {
    fn to_trip(&self) -> Result<TripRequest, TravelError> {
        Ok(TripRequest {
            source: self.from.clone(),
            destination: self.to.clone(),
            outbound_date: parse_date(&self.date)?,
            return_date: self.return_date.as_deref().map(parse_date).transpose()?,
            budget: self.budget.clone(),
            travelers: self.travelers,
            interests: self.interests.clone(),
        })
    }
}

#[instrument(skip(config, args))]
async fn run_plan(config: &AppConfig, args: &PlanArgs) -> Result<(), anyhow::Error> {
    let trip = args.to_trip()?;
    trip.validate()?;
    let generator = GeminiGenerator::from_config(config)?;
    let flight_api = SerpApiClient::new(
        config.http_client()?,
        &config.serpapi_base_url,
        config.serpapi_api_key.as_deref(),
    );

    let kind = if trip.is_round_trip() { "round trip" } else { "one-way trip" };
    eprintln!("Planning your {} to {}...", kind, trip.destination);
    let plan = plan_trip(&generator, &flight_api, &trip, !args.no_flights).await?;
    print_plan(&plan);
    Ok(())
}

fn print_plan(plan: &TripPlan) {
    if let Some(flights) = &plan.flights {
        println!("## Flights\n");
        match flights {
            Ok(offers) => println!("{}", format_flight_table(offers)),
            Err(e) => println!("Error fetching flight data: {}\n", e),
        }
    }
    println!("## Itinerary\n");
    match &plan.itinerary {
        Ok(document) => println!("{}", document.as_str()),
        Err(e) => println!("{}", e),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    let cli = Cli::parse();

    // OTEL graceful shutdown on success or error exit
    let _otel_guard = otel::init_otel()?;

    let config = AppConfig::from_env();
    info!("Starting trip planner with {:?}", config);

    match &cli.command {
        Command::Plan(args) => run_plan(&config, args).await,
        Command::ListModels => {
            let models = genai::list_models(&config.http_client()?, &config).await?;
            for name in models {
                println!("- {}", name);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_args_to_trip() {
        let cli = Cli::try_parse_from([
            "trip-planner",
            "plan",
            "--from",
            "New York",
            "--to",
            "Austin",
            "--date",
            "2026-03-03",
            "-n",
            "2",
            "--interests",
            "BBQ",
        ])
        .unwrap();
        let Command::Plan(args) = cli.command else {
            panic!("expected plan subcommand");
        };
        let trip = args.to_trip().unwrap();
        assert_eq!(trip.source, "New York");
        assert_eq!(trip.travelers, 2);
        assert!(trip.return_date.is_none());
        assert!(!args.no_flights);
    }

    #[test]
    fn test_bad_return_date_rejected() {
        let cli = Cli::try_parse_from([
            "trip-planner",
            "plan",
            "-f",
            "Paris",
            "-t",
            "Rome",
            "-d",
            "2026-05-01",
            "-R",
            "May 8",
            "-i",
            "Food",
        ])
        .unwrap();
        let Command::Plan(args) = cli.command else {
            panic!("expected plan subcommand");
        };
        assert!(matches!(args.to_trip(), Err(TravelError::InvalidTrip(_))));
    }
}
