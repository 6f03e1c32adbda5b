use crate::airport_resolver::{AirportCodes, resolve_airport_codes};
use crate::error::{QueryFailure, TravelError};
use crate::genai::TextGenerator;
use crate::metrics::{inc_flight_search_error, inc_flight_search_success};
use crate::trip::format_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

pub const CURRENCY: &str = "USD";
const ENGINE: &str = "google_flights";

/// One priced option, described by its first leg
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightOffer {
    pub airline: String,
    pub flight_number: String,
    pub departure_airport_id: String,
    pub departure_airport_name: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration_minutes: u32,
    /// Always in [`CURRENCY`]
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripType {
    RoundTrip,
    OneWay,
}

impl TripType {
    /// Value of the `type` query parameter
    pub fn code(self) -> u8 {
        match self {
            TripType::RoundTrip => 1,
            TripType::OneWay => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlightQuery {
    pub departure: AirportCodes,
    pub arrival: AirportCodes,
    pub outbound_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
}

impl FlightQuery {
    pub fn trip_type(&self) -> TripType {
        match self.return_date {
            Some(_) => TripType::RoundTrip,
            None => TripType::OneWay,
        }
    }

    /// Query parameters without the credential; values are encoded by the HTTP client
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("engine", ENGINE.to_string()),
            ("departure_id", self.departure.joined()),
            ("arrival_id", self.arrival.joined()),
            ("currency", CURRENCY.to_string()),
            ("type", self.trip_type().code().to_string()),
            ("outbound_date", format_date(self.outbound_date)),
            ("adults", self.adults.to_string()),
        ];
        if let Some(return_date) = self.return_date {
            params.push(("return_date", format_date(return_date)));
        }
        params
    }
}

/// Status and body of a flight-search HTTP exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

pub trait FlightSearchApi {
    async fn search(&self, params: &[(&'static str, String)]) -> Result<RawResponse, QueryFailure>;
}

pub struct SerpApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SerpApiClient {
    /// A missing key is sent empty and rejected upstream with 401
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<&str>) -> Self {
        if api_key.is_none() {
            warn!("SERPAPI_API_KEY is not set; flight searches will be rejected");
        }
        Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.unwrap_or_default().to_string(),
        }
    }
}

impl FlightSearchApi for SerpApiClient {
    #[instrument(name = "serpapi_search", skip(self))]
    async fn search(&self, params: &[(&'static str, String)]) -> Result<RawResponse, QueryFailure> {
        let response = self
            .http
            .get(&self.base_url)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| QueryFailure::Transport(e.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| QueryFailure::Transport(e.without_url().to_string()))?;
        Ok(RawResponse { status, body })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    best_flights: Option<Vec<OfferGroup>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OfferGroup {
    price: Option<f64>,
    #[serde(default)]
    flights: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    airline: String,
    flight_number: String,
    departure_airport: AirportStop,
    arrival_airport: AirportStop,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct AirportStop {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    time: String,
}

/// Turn a flight-search response into offers.
///
/// An empty `best_flights` list is a valid "no flights" answer; a missing
/// one is a malformed response.
pub fn parse_best_flights(response: &RawResponse) -> Result<Vec<FlightOffer>, QueryFailure> {
    if !(200..300).contains(&response.status) {
        return Err(QueryFailure::Status {
            status: response.status,
            body: response.body.clone(),
        });
    }
    let results: SearchResults = serde_json::from_str(&response.body)
        .map_err(|e| QueryFailure::Malformed(e.to_string()))?;
    let groups = match (results.best_flights, results.error) {
        (Some(groups), _) => groups,
        (None, Some(message)) => return Err(QueryFailure::Malformed(message)),
        (None, None) => {
            return Err(QueryFailure::Malformed(
                "response has no best_flights".to_string(),
            ));
        }
    };
    let mut offers = Vec::with_capacity(groups.len());
    for group in groups {
        let Some(price) = group.price else {
            warn!("Skipping offer with no price");
            continue;
        };
        let Some(leg) = group.flights.into_iter().next() else {
            warn!("Skipping offer priced {} with no flight legs", price);
            continue;
        };
        offers.push(FlightOffer {
            airline: leg.airline,
            flight_number: leg.flight_number,
            departure_airport_id: leg.departure_airport.id,
            departure_airport_name: leg.departure_airport.name,
            departure_time: leg.departure_airport.time,
            arrival_time: leg.arrival_airport.time,
            duration_minutes: leg.duration,
            price,
        });
    }
    Ok(offers)
}

/// Run a prepared query against the flight-search API
#[instrument(name = "search_flights", skip(api, query), fields(trip_type = ?query.trip_type()))]
pub async fn search_flights<F: FlightSearchApi>(
    api: &F,
    query: &FlightQuery,
) -> Result<Vec<FlightOffer>, QueryFailure> {
    let params = query.to_params();
    info!("Calling flight search with: {:?}", params);
    let result = match api.search(&params).await {
        Ok(response) => parse_best_flights(&response),
        Err(failure) => Err(failure),
    };
    match &result {
        Ok(offers) => {
            debug!("Parsed {} flight offers", offers.len());
            inc_flight_search_success(offers.len());
        }
        Err(failure) => {
            error!("Flight search failed: {}", failure);
            inc_flight_search_error(failure);
        }
    }
    result
}

/// Resolve both locations to airport codes, then search flights between them.
///
/// A resolution failure aborts before the flight-search API is called.
#[instrument(name = "query_flights", skip(generator, api))]
pub async fn query_flights<G: TextGenerator, F: FlightSearchApi>(
    generator: &G,
    api: &F,
    source: &str,
    destination: &str,
    travelers: u32,
    outbound_date: NaiveDate,
    return_date: Option<NaiveDate>,
) -> Result<Vec<FlightOffer>, TravelError> {
    if travelers == 0 {
        return Err(TravelError::InvalidTrip(
            "number of travelers must be at least 1".to_string(),
        ));
    }
    let (departure, arrival) = tokio::try_join!(
        resolve_airport_codes(generator, source),
        resolve_airport_codes(generator, destination),
    )?;
    let query = FlightQuery {
        departure,
        arrival,
        outbound_date,
        return_date,
        adults: travelers,
    };
    Ok(search_flights(api, &query).await?)
}

fn format_duration(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, mins) => format!("{}m", mins),
        (hrs, 0) => format!("{}h", hrs),
        (hrs, mins) => format!("{}h {}m", hrs, mins),
    }
}

/// Markdown table of offers for display
pub fn format_flight_table(offers: &[FlightOffer]) -> String {
    if offers.is_empty() {
        return "No flights found for the given criteria.\n".to_string();
    }
    let mut output = String::new();
    output.push_str("| Airline | Flight | From | Departs | Arrives | Duration | Price |\n");
    output.push_str("|---|---|---|---|---|---|---|\n");
    for offer in offers {
        output.push_str(&format!(
            "| {} | {} | {} ({}) | {} | {} | {} | ${:.2} {} |\n",
            offer.airline,
            offer.flight_number,
            offer.departure_airport_name,
            offer.departure_airport_id,
            offer.departure_time,
            offer.arrival_time,
            format_duration(offer.duration_minutes),
            offer.price,
            CURRENCY
        ));
    }
    output
}
