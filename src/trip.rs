use crate::error::TravelError;
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trip parameters collected from the user for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRequest {
    pub source: String,
    pub destination: String,
    pub outbound_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    /// Free text, e.g. "$2000"
    pub budget: String,
    pub travelers: u32,
    pub interests: String,
}

impl TripRequest {
    pub fn validate(&self) -> Result<(), TravelError> {
        let missing: Vec<&str> = [
            ("Source City", &self.source),
            ("Destination City", &self.destination),
            ("Interests", &self.interests),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(TravelError::InvalidTrip(format!(
                "the following fields must be filled in: {}",
                missing.join(", ")
            )));
        }
        if self.travelers == 0 {
            return Err(TravelError::InvalidTrip(
                "number of travelers must be at least 1".to_string(),
            ));
        }
        if let Some(return_date) = self.return_date {
            if return_date < self.outbound_date {
                return Err(TravelError::InvalidTrip(format!(
                    "return date {} is before outbound date {}",
                    return_date, self.outbound_date
                )));
            }
        }
        Ok(())
    }

    pub fn is_round_trip(&self) -> bool {
        self.return_date.is_some()
    }

    /// Dates as shown to the itinerary model
    pub fn date_range(&self) -> String {
        let outbound = self.outbound_date.format(DATE_FORMAT);
        match self.return_date {
            Some(return_date) => format!("{} to {}", outbound, return_date.format(DATE_FORMAT)),
            None => format!("{} (one-way)", outbound),
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, TravelError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| TravelError::InvalidTrip(format!("invalid date '{}': {}", value, e)))
}

#[cfg(test)]
pub(crate) fn sample_trip() -> TripRequest {
    TripRequest {
        source: "New York".to_string(),
        destination: "Austin".to_string(),
        outbound_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
        return_date: None,
        budget: "$2000".to_string(),
        travelers: 2,
        interests: "Live music, BBQ".to_string(),
    }
}
