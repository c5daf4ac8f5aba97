use std::fmt;

#[derive(Debug)]
pub enum RiskError {
    InvalidDistribution(String),
    InputMismatch { legs: usize, distributions: usize },
    InvalidAirport(String),
    InvalidAirline(String),
    InvalidFlightNumber(String),
    InvalidDateTime(String),
    Validation(String),
    Config(String),
    TicketParse(String),
    NoFlights(String),
    Timeout,
    ConnectionFailed(String),
    DnsResolution(String),
    ProxyError(String),
    TlsError(String),
    RateLimited,
    HttpStatus(u16),
    PredictorResponse(String),
}

impl fmt::Display for RiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDistribution(detail) => write!(
                f,
                "invalid delay distribution — {detail}. \
                 Expected 5 non-negative values for the 0/30/90/180/300 minute buckets"
            ),
            Self::InputMismatch { legs, distributions } => write!(
                f,
                "got {distributions} delay distribution(s) for {legs} flight leg(s) — \
                 supply exactly one per leg, in itinerary order"
            ),
            Self::InvalidAirport(code) => write!(
                f,
                "invalid airport code \"{code}\" — must be exactly 3 letters (e.g. JFK, ATL, TPA)"
            ),
            Self::InvalidAirline(code) => write!(
                f,
                "invalid airline code \"{code}\" — must be a 2-character IATA code (e.g. DL, UA, F9)"
            ),
            Self::InvalidFlightNumber(number) => write!(
                f,
                "invalid flight number \"{number}\" — must be the airline code followed by \
                 1-4 digits (e.g. DL1234)"
            ),
            Self::InvalidDateTime(value) => write!(
                f,
                "invalid date/time \"{value}\" — must be YYYY-MM-DDTHH:MM (e.g. 2025-10-04T22:00)"
            ),
            Self::Validation(msg) => write!(f, "{msg}"),
            Self::Config(detail) => write!(f, "invalid model configuration — {detail}"),
            Self::TicketParse(detail) => write!(
                f,
                "failed to read ticket data — {detail}. \
                 Expected the JSON array produced by the ticket upload parser"
            ),
            Self::NoFlights(notes) => {
                if notes.is_empty() {
                    write!(f, "no flight information found in the uploaded ticket")
                } else {
                    write!(f, "no flight information found in the uploaded ticket ({notes})")
                }
            }
            Self::Timeout => write!(
                f,
                "prediction service timed out — try increasing --timeout or check the endpoint"
            ),
            Self::ConnectionFailed(detail) => write!(
                f,
                "connection to the prediction service failed ({detail})"
            ),
            Self::DnsResolution(host) => write!(
                f,
                "DNS resolution failed for {host} — check the --predictor URL"
            ),
            Self::ProxyError(detail) => write!(
                f,
                "proxy error — check your --proxy URL is correct ({detail})"
            ),
            Self::TlsError(detail) => write!(
                f,
                "TLS/SSL error — connection to the prediction service failed ({detail})"
            ),
            Self::RateLimited => write!(
                f,
                "rate limited by the prediction service (HTTP 429) — wait before retrying"
            ),
            Self::HttpStatus(status) => write!(
                f,
                "unexpected HTTP status {status} from the prediction service"
            ),
            Self::PredictorResponse(detail) => write!(
                f,
                "failed to read the prediction service response — {detail}"
            ),
        }
    }
}

impl std::error::Error for RiskError {}

pub fn from_http_error(err: wreq::Error) -> RiskError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();

    if err.is_timeout() {
        return RiskError::Timeout;
    }
    if err.is_decode() {
        return RiskError::PredictorResponse(msg);
    }
    // Proxy URLs are checked before the request is built, so this is the endpoint.
    if err.is_builder() {
        return RiskError::Validation(format!("invalid predictor endpoint: {msg}"));
    }

    let mentions = |keys: &[&str]| keys.iter().any(|k| lower.contains(k));

    if err.is_connect() {
        if mentions(&["dns", "resolve", "getaddrinfo"]) {
            return RiskError::DnsResolution(msg);
        }
        return RiskError::ConnectionFailed(msg);
    }
    if mentions(&["proxy", "socks"]) {
        return RiskError::ProxyError(msg);
    }
    if mentions(&["tls", "ssl", "certificate"]) {
        return RiskError::TlsError(msg);
    }
    RiskError::ConnectionFailed(msg)
}

impl RiskError {
    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidDistribution(_)
            | Self::InputMismatch { .. }
            | Self::InvalidAirport(_)
            | Self::InvalidAirline(_)
            | Self::InvalidFlightNumber(_)
            | Self::InvalidDateTime(_)
            | Self::Validation(_)
            | Self::Config(_)
            | Self::TicketParse(_)
            | Self::NoFlights(_) => 2,
            Self::Timeout
            | Self::ConnectionFailed(_)
            | Self::DnsResolution(_)
            | Self::TlsError(_)
            | Self::ProxyError(_) => 3,
            Self::RateLimited => 4,
            Self::HttpStatus(_) => 5,
            Self::PredictorResponse(_) => 6,
        }
    }

    /// Stable machine-readable name, used in JSON error output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidDistribution(_) => "invalid_distribution",
            Self::InputMismatch { .. } => "input_mismatch",
            Self::InvalidAirport(_) => "invalid_airport",
            Self::InvalidAirline(_) => "invalid_airline",
            Self::InvalidFlightNumber(_) => "invalid_flight_number",
            Self::InvalidDateTime(_) => "invalid_datetime",
            Self::Validation(_) => "validation_error",
            Self::Config(_) => "config_error",
            Self::TicketParse(_) => "ticket_parse_error",
            Self::NoFlights(_) => "no_flights",
            Self::Timeout => "timeout",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::DnsResolution(_) => "dns_error",
            Self::TlsError(_) => "tls_error",
            Self::ProxyError(_) => "proxy_error",
            Self::RateLimited => "rate_limited",
            Self::HttpStatus(_) => "http_error",
            Self::PredictorResponse(_) => "predictor_response_error",
        }
    }
}
