//! Format decoded records for display (dump text).

use crate::record::PositionRecord;
use std::fmt::Write;

fn on_off(v: Option<bool>) -> String {
    match v {
        Some(true) => "on".to_string(),
        Some(false) => "off".to_string(),
        None => "-".to_string(),
    }
}

fn or_dash<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Multi-line dump of one record; each line indented by `indent` levels.
pub fn format_record(record: &PositionRecord, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    let mut out = String::new();
    let mut line = |key: &str, value: String| {
        let _ = writeln!(out, "{}{}: {}", pad, key, value);
    };
    line("device", record.device.to_string());
    line("index", record.index.to_string());
    line("time", record.timestamp.to_rfc3339());
    line(
        "position",
        format!(
            "{:.6}, {:.6}{}",
            record.latitude,
            record.longitude,
            if record.valid { "" } else { " (invalid)" }
        ),
    );
    line("satellites", record.satellites.to_string());
    line("speed", format!("{:.2} kn", record.speed));
    line("course", format!("{} deg", record.course));
    line("ignition", on_off(record.ignition));
    line("input1", on_off(record.input1));
    line("input2", on_off(record.input2));
    line("event", or_dash(record.event));
    line("odometer", or_dash(record.odometer.map(|m| format!("{} m", m))));
    line("battery", format!("{:.3} V", record.battery));
    out
}

/// One-line summary: `device time lat,lon speed`.
pub fn format_summary(record: &PositionRecord) -> String {
    format!(
        "{} {} {:.6},{:.6} {:.1}kn",
        record.device,
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.latitude,
        record.longitude,
        record.speed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DeviceRef, PROTOCOL};
    use chrono::{TimeZone, Utc};

    fn record() -> PositionRecord {
        PositionRecord {
            protocol: PROTOCOL,
            device: DeviceRef(7),
            index: 3,
            satellites: 9,
            valid: true,
            timestamp: Utc.with_ymd_and_hms(2021, 1, 1, 15, 30, 45).unwrap(),
            latitude: 12.345678,
            longitude: -98.765432,
            speed: 0.9719222462203,
            course: 90.0,
            ignition: None,
            input1: None,
            input2: None,
            event: None,
            odometer: None,
            battery: 12.6,
        }
    }

    #[test]
    fn unset_fields_show_as_dash() {
        let text = format_record(&record(), 0);
        assert!(text.contains("ignition: -\n"));
        assert!(text.contains("odometer: -\n"));
        assert!(text.contains("battery: 12.600 V\n"));
        assert!(text.contains("time: 2021-01-01T15:30:45+00:00\n"));
    }

    #[test]
    fn set_fields_show_values() {
        let mut r = record();
        r.ignition = Some(false);
        r.input2 = Some(true);
        r.odometer = Some(12345);
        let text = format_record(&r, 1);
        assert!(text.contains("  ignition: off\n"));
        assert!(text.contains("  input2: on\n"));
        assert!(text.contains("  odometer: 12345 m\n"));
    }

    #[test]
    fn summary_line() {
        assert_eq!(
            format_summary(&record()),
            "7 2021-01-01 15:30:45 12.345678,-98.765432 1.0kn"
        );
    }
}
