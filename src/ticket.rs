use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::RiskError;
use crate::itinerary::build_leg;
use crate::model::{FlightLeg, Itinerary};

/// One element of the upload parser's output array.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketSegment {
    #[serde(default)]
    pub relevant: bool,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_datetime_local: Option<String>,
    pub arrival_datetime_local: Option<String>,
    pub airline_iata: Option<String>,
    pub flight_number: Option<String>,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TicketSegment {
    fn missing(&self) -> Vec<String> {
        let mut missing = self.missing_fields.clone();
        let fields = [
            ("departure_airport", &self.departure_airport),
            ("arrival_airport", &self.arrival_airport),
            ("departure_datetime_local", &self.departure_datetime_local),
            ("arrival_datetime_local", &self.arrival_datetime_local),
            ("airline_iata", &self.airline_iata),
            ("flight_number", &self.flight_number),
        ];
        for (name, value) in fields {
            let blank = value.as_deref().is_none_or(|v| v.trim().is_empty());
            if blank && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }

    fn to_leg(&self, index: usize) -> Result<FlightLeg, RiskError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(RiskError::Validation(format!(
                "ticket segment {} is missing {}",
                index + 1,
                missing.join(", ")
            )));
        }

        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        build_leg(
            &field(&self.airline_iata),
            &field(&self.flight_number),
            &field(&self.departure_airport),
            &field(&self.arrival_airport),
            &field(&self.departure_datetime_local),
            &field(&self.arrival_datetime_local),
        )
    }
}

pub fn parse_segments(json: &str) -> Result<Vec<TicketSegment>, RiskError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| RiskError::TicketParse(e.to_string()))?;
    if !value.is_array() {
        return Err(RiskError::TicketParse(
            "top-level value is not an array".into(),
        ));
    }
    serde_json::from_value(value).map_err(|e| RiskError::TicketParse(e.to_string()))
}

/// Turns the upload parser's JSON into an itinerary, keeping the relevant
/// segments in array order.
pub fn parse_ticket(json: &str) -> Result<Itinerary, RiskError> {
    let segments = parse_segments(json)?;

    let relevant: Vec<(usize, &TicketSegment)> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.relevant)
        .collect();

    if relevant.is_empty() {
        let notes = segments
            .first()
            .and_then(|s| s.notes.clone())
            .unwrap_or_default();
        return Err(RiskError::NoFlights(notes));
    }

    let legs = relevant
        .into_iter()
        .map(|(i, s)| s.to_leg(i))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        segments = segments.len(),
        legs = legs.len(),
        "decoded ticket"
    );
    Itinerary::new(legs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_an_array() {
        let err = parse_ticket(r#"{"relevant": true}"#).unwrap_err();
        assert!(matches!(err, RiskError::TicketParse(_)));
    }

    #[test]
    fn irrelevant_document_carries_notes() {
        let json = r#"[{"relevant": false, "departure_airport": null,
            "arrival_airport": null, "departure_datetime_local": null,
            "arrival_datetime_local": null, "airline_iata": null,
            "flight_number": null, "missing_fields": [],
            "notes": "electricity invoice"}]"#;
        match parse_ticket(json).unwrap_err() {
            RiskError::NoFlights(notes) => assert_eq!(notes, "electricity invoice"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_field_is_reported() {
        let json = r#"[{"relevant": true, "departure_airport": "JFK",
            "arrival_airport": "CDG", "departure_datetime_local": "2025-01-25T17:50",
            "arrival_datetime_local": null, "airline_iata": "AF",
            "flight_number": "AF23", "missing_fields": ["arrival_datetime_local"],
            "notes": ""}]"#;
        let err = parse_ticket(json).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("segment 1"));
        assert!(msg.contains("arrival_datetime_local"));
        assert!(!msg.contains("airline_iata"));
    }
}
