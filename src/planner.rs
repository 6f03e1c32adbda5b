use crate::error::TravelError;
use crate::flight_search::{FlightOffer, FlightSearchApi, query_flights};
use crate::genai::TextGenerator;
use crate::itinerary::{ItineraryDocument, generate_itinerary};
use crate::trip::TripRequest;
use tracing::{info, instrument};

/// Results of one submission. Each output succeeds or fails on its own.
#[derive(Debug)]
pub struct TripPlan {
    pub itinerary: Result<ItineraryDocument, TravelError>,
    /// `None` when flights were not requested
    pub flights: Option<Result<Vec<FlightOffer>, TravelError>>,
}

/// Validate the trip, then generate the itinerary and search flights concurrently
#[instrument(name = "plan_trip", skip_all, fields(source = %trip.source, destination = %trip.destination))]
pub async fn plan_trip<G: TextGenerator, F: FlightSearchApi>(
    generator: &G,
    flight_api: &F,
    trip: &TripRequest,
    include_flights: bool,
) -> Result<TripPlan, TravelError> {
    trip.validate()?;
    let flights = async {
        if !include_flights {
            return None;
        }
        Some(
            query_flights(
                generator,
                flight_api,
                &trip.source,
                &trip.destination,
                trip.travelers,
                trip.outbound_date,
                trip.return_date,
            )
            .await,
        )
    };
    let (itinerary, flights) = tokio::join!(generate_itinerary(generator, trip), flights);
    info!(
        itinerary_ok = itinerary.is_ok(),
        flights_ok = ?flights.as_ref().map(Result::is_ok),
        "Trip plan finished"
    );
    Ok(TripPlan { itinerary, flights })
}
