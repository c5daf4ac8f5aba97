use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::model::{ConnectionRisk, RiskResult};

pub fn format_minutes(minutes: f64) -> String {
    let total = minutes.round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let abs = total.abs();
    if abs >= 60 {
        format!("{sign}{}h {:02}m", abs / 60, abs % 60)
    } else {
        format!("{sign}{abs}m")
    }
}

pub fn format_delay(notable: Option<u32>) -> String {
    match notable {
        Some(m) => format!("~{}", format_minutes(f64::from(m))),
        None => "on time".to_string(),
    }
}

pub fn connection_summary(c: &ConnectionRisk) -> String {
    format!(
        "{}% chance to make the connection at {}",
        c.percent, c.arrival_airport
    )
}

pub fn render(result: &RiskResult) -> String {
    let mut legs = Table::new();
    legs.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Flight", "Route", "Duration", "Expected delay"]);

    for leg in &result.legs {
        legs.add_row(vec![
            (leg.index + 1).to_string(),
            leg.flight_number.clone(),
            format!("{} → {}", leg.departure_airport, leg.arrival_airport),
            leg.duration_minutes
                .map(|m| format_minutes(m as f64))
                .unwrap_or_else(|| "—".to_string()),
            format_delay(leg.notable_delay_minutes),
        ]);
    }

    let mut out = format!("Success rate: {}%\n\n{legs}", result.success_percent);

    if !result.connections.is_empty() {
        let mut conns = Table::new();
        conns
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                "Connection", "Layover", "Needed", "Margin", "Chance", "Risk",
            ]);

        for c in &result.connections {
            let place = if c.arrival_airport == c.departure_airport {
                c.arrival_airport.clone()
            } else {
                format!("{} → {}", c.arrival_airport, c.departure_airport)
            };
            conns.add_row(vec![
                place,
                format_minutes(c.layover_minutes),
                format_minutes(c.overhead_minutes),
                format_minutes(c.margin_minutes),
                format!("{}%", c.percent),
                c.tier.to_string(),
            ]);
        }
        out.push_str("\n\n");
        out.push_str(&conns.to_string());
    }

    out
}
