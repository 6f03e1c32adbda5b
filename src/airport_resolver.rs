use crate::error::TravelError;
use crate::genai::TextGenerator;
use crate::metrics::{inc_airport_resolution_error, inc_airport_resolution_success};
use std::fmt;
use tracing::{error, info, instrument};

pub const MAX_AIRPORT_CODES: usize = 3;

/// A 3-letter IATA airport code, always uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AirportCode(String);

impl AirportCode {
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.len() == 3 && token.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(AirportCode(token.to_ascii_uppercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One to three codes for a location, primary airport first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirportCodes(Vec<AirportCode>);

impl AirportCodes {
    pub fn primary(&self) -> &AirportCode {
        &self.0[0]
    }

    pub fn codes(&self) -> &[AirportCode] {
        &self.0
    }

    /// Comma-joined form accepted by the flight-search API
    pub fn joined(&self) -> String {
        self.codes()
            .iter()
            .map(AirportCode::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn resolution_prompt(location: &str) -> String {
    format!(
        "List the IATA airport codes for the airports serving \"{location}\". \
         Return at most {MAX_AIRPORT_CODES} codes, nearest or primary airport first, \
         as a comma-separated list such as: JFK,EWR,LGA. \
         Return only the codes and omit any other text."
    )
}

/// Parse a model reply like "JFK, EWR, LGA" into airport codes.
///
/// Anything other than 1..=3 comma-separated 3-letter tokens is rejected
/// rather than salvaged. Repeated codes collapse into one.
pub fn parse_airport_codes(text: &str) -> Result<AirportCodes, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty reply".to_string());
    }
    let mut codes: Vec<AirportCode> = Vec::new();
    for token in text.split(',') {
        let code = AirportCode::parse(token)
            .ok_or_else(|| format!("'{}' is not a 3-letter airport code", token.trim()))?;
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    if codes.len() > MAX_AIRPORT_CODES {
        return Err(format!(
            "expected at most {} codes, got {}",
            MAX_AIRPORT_CODES,
            codes.len()
        ));
    }
    Ok(AirportCodes(codes))
}

/// Ask the model which airports serve `location`. One call per invocation.
#[instrument(name = "resolve_airport_codes", skip(generator))]
pub async fn resolve_airport_codes<G: TextGenerator>(
    generator: &G,
    location: &str,
) -> Result<AirportCodes, TravelError> {
    let result = match generator.generate(&resolution_prompt(location)).await {
        Ok(reply) => parse_airport_codes(&reply).map_err(|reason| {
            error!("Unusable airport reply for {}: {:?}", location, reply);
            TravelError::resolution(location, reason)
        }),
        Err(e) => Err(TravelError::resolution(location, e.to_string())),
    };
    match &result {
        Ok(codes) => {
            info!(
                "Resolved {} to {} (primary {})",
                location,
                codes.joined(),
                codes.primary()
            );
            inc_airport_resolution_success();
        }
        Err(e) => inc_airport_resolution_error(e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::fake::ScriptedGenerator;

    #[test]
    fn test_parse_multiple_codes() {
        let codes = parse_airport_codes("JFK, EWR, LGA\n").unwrap();
        assert_eq!(codes.joined(), "JFK,EWR,LGA");
        assert_eq!(codes.primary().as_str(), "JFK");
    }

    #[test]
    fn test_parse_uppercases_and_dedupes() {
        let codes = parse_airport_codes("aus,AUS").unwrap();
        assert_eq!(codes.codes().len(), 1);
        assert_eq!(codes.joined(), "AUS");
    }

    #[test]
    fn test_parse_rejects_sentence() {
        assert!(parse_airport_codes("The main airport in Austin is AUS.").is_err());
    }

    #[test]
    fn test_parse_rejects_too_many_codes() {
        assert!(parse_airport_codes("JFK,EWR,LGA,HPN").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_and_blank_tokens() {
        assert!(parse_airport_codes("").is_err());
        assert!(parse_airport_codes("  \n").is_err());
        assert!(parse_airport_codes("JFK,,EWR").is_err());
        assert!(parse_airport_codes("JF1").is_err());
    }

    #[test]
    fn test_prompt_mentions_location_and_format() {
        let prompt = resolution_prompt("New York");
        assert!(prompt.contains("\"New York\""));
        assert!(prompt.contains("comma-separated"));
        assert!(prompt.contains("omit any other text"));
    }

    #[tokio::test]
    async fn test_resolve_makes_one_call_each_time() {
        let generator = ScriptedGenerator::replying(&["JFK,EWR,LGA", "JFK,EWR,LGA"]);
        let first = resolve_airport_codes(&generator, "New York").await.unwrap();
        let second = resolve_airport_codes(&generator, "New York").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_resolution_failure() {
        let generator = ScriptedGenerator::replying(&["Sure! Austin is served by AUS."]);
        let err = resolve_airport_codes(&generator, "Austin").await.unwrap_err();
        match err {
            TravelError::ResolutionFailure { location, .. } => assert_eq!(location, "Austin"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_error_is_resolution_failure() {
        let generator = ScriptedGenerator::new(vec![Err(TravelError::GenerationFailure(
            "quota exceeded".to_string(),
        ))]);
        let err = resolve_airport_codes(&generator, "Austin").await.unwrap_err();
        assert!(matches!(err, TravelError::ResolutionFailure { .. }));
        assert!(err.to_string().contains("quota exceeded"));
    }
}
