use chrono::{DateTime, NaiveDateTime};
use tracing::warn;

use crate::error::RiskError;
use crate::model::{FlightLeg, Itinerary};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a wall-clock timestamp. Values carrying a UTC offset are
/// converted to UTC.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, RiskError> {
    let value = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_utc())
        .map_err(|_| RiskError::InvalidDateTime(value.to_string()))
}

pub fn validate_airport(code: &str) -> Result<(), RiskError> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(RiskError::InvalidAirport(code.to_string()));
    }
    Ok(())
}

pub fn validate_airline(code: &str) -> Result<(), RiskError> {
    let ok = code.len() == 2
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if !ok {
        return Err(RiskError::InvalidAirline(code.to_string()));
    }
    Ok(())
}

/// Returns the flight number in `XX1234` form. Bare digits get the airline
/// code prepended; spaces are dropped ("FR 0123" becomes "FR0123").
pub fn normalize_flight_number(airline: &str, number: &str) -> Result<String, RiskError> {
    let compact: String = number
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    let digits = compact.strip_prefix(airline).unwrap_or(&compact);
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(RiskError::InvalidFlightNumber(number.to_string()));
    }
    Ok(format!("{airline}{digits}"))
}

/// Builds a leg from free-form fields, upper-casing codes and normalizing
/// the flight number before validating.
pub fn build_leg(
    airline: &str,
    flight_number: &str,
    departure_airport: &str,
    arrival_airport: &str,
    departure: &str,
    arrival: &str,
) -> Result<FlightLeg, RiskError> {
    let airline = airline.trim().to_uppercase();
    validate_airline(&airline)?;
    let flight_number = normalize_flight_number(&airline, flight_number)?;

    let leg = FlightLeg {
        airline,
        flight_number,
        departure_airport: departure_airport.trim().to_uppercase(),
        arrival_airport: arrival_airport.trim().to_uppercase(),
        departure: parse_datetime(departure)?,
        arrival: parse_datetime(arrival)?,
    };
    validate_leg(&leg)?;
    Ok(leg)
}

/// Parses `"AIRLINE FLIGHT FROM TO DEPART ARRIVE"`.
pub fn parse_leg(input: &str) -> Result<FlightLeg, RiskError> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() != 6 {
        return Err(RiskError::Validation(format!(
            "--leg must be \"AIRLINE FLIGHT FROM TO DEPART ARRIVE\", got: \"{input}\""
        )));
    }
    build_leg(parts[0], parts[1], parts[2], parts[3], parts[4], parts[5])
}

pub fn validate_leg(leg: &FlightLeg) -> Result<(), RiskError> {
    validate_airline(&leg.airline)?;
    normalize_flight_number(&leg.airline, &leg.flight_number)?;
    validate_airport(&leg.departure_airport)?;
    validate_airport(&leg.arrival_airport)?;

    // Local times: an eastbound date-line crossing lands "before" it departs.
    if leg.arrival < leg.departure {
        warn!(
            flight = %leg.flight_number,
            departure = %leg.departure,
            arrival = %leg.arrival,
            "local arrival time is earlier than departure"
        );
    }
    Ok(())
}

impl Itinerary {
    /// Checks every leg. Out-of-order connections are allowed but logged,
    /// since the layover is measured as an absolute gap.
    pub fn validate(&self) -> Result<(), RiskError> {
        for leg in self.legs() {
            validate_leg(leg)?;
        }
        for pair in self.legs().windows(2) {
            if pair[1].departure < pair[0].arrival {
                warn!(
                    arriving = %pair[0].flight_number,
                    departing = %pair[1].flight_number,
                    "next flight departs before the previous one lands"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minute_and_second_precision() {
        let a = parse_datetime("2025-01-25T17:50").unwrap();
        let b = parse_datetime("2025-01-25 17:50:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rfc3339_is_converted_to_utc() {
        let dt = parse_datetime("2025-01-25T17:50:00+02:00").unwrap();
        assert_eq!(dt, parse_datetime("2025-01-25T15:50").unwrap());
    }

    #[test]
    fn rejects_garbage_datetime() {
        assert!(matches!(
            parse_datetime("25/01/2025 17:50"),
            Err(RiskError::InvalidDateTime(_))
        ));
    }

    #[test]
    fn flight_number_normalization() {
        assert_eq!(normalize_flight_number("FR", "FR 0123").unwrap(), "FR0123");
        assert_eq!(normalize_flight_number("DL", "1234").unwrap(), "DL1234");
        assert_eq!(normalize_flight_number("F9", "f9 77").unwrap(), "F977");
        assert!(normalize_flight_number("DL", "DL12345").is_err());
        assert!(normalize_flight_number("DL", "UA12").is_err());
        assert!(normalize_flight_number("DL", "").is_err());
    }

    #[test]
    fn airline_codes() {
        assert!(validate_airline("F9").is_ok());
        assert!(validate_airline("UA").is_ok());
        assert!(validate_airline("U").is_err());
        assert!(validate_airline("ua").is_err());
    }

    #[test]
    fn parse_leg_uppercases_codes() {
        let leg = parse_leg("ua 15 tpa sfo 2025-10-05T07:05 2025-10-05T09:41").unwrap();
        assert_eq!(leg.airline, "UA");
        assert_eq!(leg.flight_number, "UA15");
        assert_eq!(leg.departure_airport, "TPA");
        assert_eq!(leg.arrival_airport, "SFO");
        assert_eq!(leg.duration_minutes(), Some(156));
    }

    #[test]
    fn parse_leg_wrong_field_count() {
        let err = parse_leg("UA 15 TPA SFO 2025-10-05T07:05").unwrap_err();
        assert!(err.to_string().contains("--leg must be"));
    }

    #[test]
    fn date_line_crossing_is_accepted() {
        let leg = parse_leg("UA 870 SYD SFO 2025-10-05T10:00 2025-10-05T06:00").unwrap();
        assert_eq!(leg.flight_number, "UA870");
        assert!(leg.arrival < leg.departure);
        assert_eq!(leg.duration_minutes(), None);
        assert!(validate_leg(&leg).is_ok());
    }

    #[test]
    fn out_of_order_legs_still_validate() {
        let legs = vec![
            parse_leg("F9 1 ATL TPA 2025-10-04T22:00 2025-10-04T23:29").unwrap(),
            parse_leg("UA 15 TPA SFO 2025-10-04T20:00 2025-10-04T22:00").unwrap(),
        ];
        assert!(Itinerary::new(legs).unwrap().validate().is_ok());
    }
}
