use crate::error::{QueryFailure, TravelError};
use crate::otel;
use opentelemetry::KeyValue;
use opentelemetry::metrics::Counter;
use std::sync::OnceLock;

pub fn inc_airport_resolution_success() {
    airport_resolution_success().add(1, &[])
}

pub fn inc_airport_resolution_error(error: &TravelError) {
    airport_resolution_error().add(1, &[KeyValue::new("kind", error.kind())])
}

pub fn inc_flight_search_success(offers: usize) {
    flight_search_success().add(1, &[KeyValue::new("offers", offers as i64)])
}

pub fn inc_flight_search_error(failure: &QueryFailure) {
    let attributes = vec![
        KeyValue::new("status", failure.status().to_string()),
        KeyValue::new("kind", failure.kind()),
    ];
    flight_search_error().add(1, &attributes)
}

pub fn inc_itinerary_success() {
    itinerary_success().add(1, &[])
}

pub fn inc_itinerary_error() {
    itinerary_error().add(1, &[])
}

fn counter(name: &'static str, description: &'static str) -> Counter<u64> {
    otel::get_meter()
        .u64_counter(name)
        .with_description(description)
        .build()
}

fn airport_resolution_success() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        counter(
            "airport_resolution_success",
            "Number of locations resolved to airport codes",
        )
    })
}

fn airport_resolution_error() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        counter(
            "airport_resolution_error",
            "Number of failed airport code resolutions",
        )
    })
}

fn flight_search_success() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        counter(
            "flight_search_success",
            "Number of successful flight search executions",
        )
    })
}

fn flight_search_error() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        counter(
            "flight_search_error",
            "Number of failed flight search executions",
        )
    })
}

fn itinerary_success() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| counter("itinerary_success", "Number of itineraries generated"))
}

fn itinerary_error() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| counter("itinerary_error", "Number of failed itinerary generations"))
}
