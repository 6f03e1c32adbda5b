use crate::error::TravelError;
use crate::genai::TextGenerator;
use crate::metrics::{inc_itinerary_error, inc_itinerary_success};
use crate::trip::TripRequest;
use tracing::{error, info, instrument};

/// Generated itinerary text (markdown), displayed as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryDocument(pub String);

impl ItineraryDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn itinerary_prompt(trip: &TripRequest) -> String {
    format!(
        "You are an expert travel planner AI. Create a detailed travel itinerary based on the following details:\n\
         - Source: {}\n\
         - Destination: {}\n\
         - Dates: {}\n\
         - Budget: {}\n\
         - Number of Travelers: {}\n\
         - Interests: {}\n\
         \n\
         Please provide:\n\
         1. A short overview of the trip.\n\
         2. A day-by-day itinerary.\n\
         3. Recommended local food and restaurants.\n\
         4. A budget breakdown with estimated costs for major activities.\n\
         5. Travel tips specific to the destination.\n\
         6. Packing essentials.\n\
         \n\
         Format the response in markdown with clear headings and bullet points for readability.",
        trip.source,
        trip.destination,
        trip.date_range(),
        trip.budget,
        trip.travelers,
        trip.interests,
    )
}

#[instrument(name = "generate_itinerary", skip_all, fields(destination = %trip.destination))]
pub async fn generate_itinerary<G: TextGenerator>(
    generator: &G,
    trip: &TripRequest,
) -> Result<ItineraryDocument, TravelError> {
    let result = generator
        .generate(&itinerary_prompt(trip))
        .await
        .map_err(|e| match e {
            TravelError::GenerationFailure(_) => e,
            other => TravelError::GenerationFailure(other.to_string()),
        })
        .and_then(|text| {
            if text.trim().is_empty() {
                Err(TravelError::GenerationFailure(
                    "model returned an empty itinerary".to_string(),
                ))
            } else {
                Ok(ItineraryDocument(text))
            }
        });
    match &result {
        Ok(document) => {
            info!("Generated itinerary of {} bytes", document.0.len());
            inc_itinerary_success();
        }
        Err(e) => {
            error!("Itinerary generation failed: {}", e);
            inc_itinerary_error();
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::fake::ScriptedGenerator;
    use crate::trip::sample_trip;

    #[test]
    fn test_prompt_embeds_all_fields_verbatim() {
        let trip = TripRequest {
            interests: "Art & <History>".to_string(),
            ..sample_trip()
        };
        let prompt = itinerary_prompt(&trip);
        assert!(prompt.contains("- Source: New York"));
        assert!(prompt.contains("- Destination: Austin"));
        assert!(prompt.contains("- Dates: 2026-03-03 (one-way)"));
        assert!(prompt.contains("- Budget: $2000"));
        assert!(prompt.contains("- Number of Travelers: 2"));
        assert!(prompt.contains("- Interests: Art & <History>"));
        assert!(prompt.contains("Packing essentials"));
    }

    #[tokio::test]
    async fn test_returns_text_unmodified() {
        let reply = "# Austin Getaway\n\n## Day 1\n- Barton Springs\n";
        let generator = ScriptedGenerator::replying(&[reply]);
        let document = generate_itinerary(&generator, &sample_trip()).await.unwrap();
        assert_eq!(document.as_str(), reply);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_reply_is_generation_failure() {
        let generator = ScriptedGenerator::replying(&["  \n"]);
        let err = generate_itinerary(&generator, &sample_trip()).await.unwrap_err();
        assert!(matches!(err, TravelError::GenerationFailure(_)));
    }

    #[tokio::test]
    async fn test_api_error_keeps_message() {
        let generator = ScriptedGenerator::new(vec![Err(TravelError::GenerationFailure(
            "503 Service Unavailable".to_string(),
        ))]);
        let err = generate_itinerary(&generator, &sample_trip()).await.unwrap_err();
        assert!(err.to_string().contains("503 Service Unavailable"));
    }

    #[tokio::test]
    async fn test_other_errors_become_generation_failure() {
        let generator = ScriptedGenerator::new(vec![Err(TravelError::ConfigMissing)]);
        let err = generate_itinerary(&generator, &sample_trip()).await.unwrap_err();
        match err {
            TravelError::GenerationFailure(message) => {
                assert!(message.contains("GOOGLE_API_KEY"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
