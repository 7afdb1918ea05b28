//! Time parsing and formatting utilities

use std::time::Duration;

use crate::domain::errors::DomainError;

fn invalid(time_str: &str) -> DomainError {
    DomainError::Configuration(format!(
        "Invalid time format: {}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds",
        time_str
    ))
}

fn component(part: &str, time_str: &str) -> Result<f64, DomainError> {
    part.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| invalid(time_str))
}

/// Parse an offset given as seconds, MM:SS(.ms) or HH:MM:SS(.ms)
pub fn parse_offset(time_str: &str) -> Result<f64, DomainError> {
    let trimmed = time_str.trim();
    let parts: Vec<&str> = trimmed.split(':').collect();

    match parts.as_slice() {
        [seconds] => component(seconds, trimmed),
        [minutes, seconds] => {
            let seconds = component(seconds, trimmed)?;
            if seconds >= 60.0 {
                return Err(invalid(trimmed));
            }
            Ok(component(minutes, trimmed)? * 60.0 + seconds)
        }
        [hours, minutes, seconds] => {
            let minutes = component(minutes, trimmed)?;
            let seconds = component(seconds, trimmed)?;
            if minutes >= 60.0 || seconds >= 60.0 {
                return Err(invalid(trimmed));
            }
            Ok(component(hours, trimmed)? * 3600.0 + minutes * 60.0 + seconds)
        }
        _ => Err(invalid(trimmed)),
    }
}

/// Format a duration as HH:MM:SS.ms or MM:SS.ms
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let milliseconds = duration.subsec_millis();

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset_formats() {
        assert_eq!(parse_offset("12.5").unwrap(), 12.5);
        assert_eq!(parse_offset("01:30").unwrap(), 90.0);
        assert_eq!(parse_offset("1:30.5").unwrap(), 90.5);
        assert_eq!(parse_offset("01:02:03.25").unwrap(), 3723.25);
        assert_eq!(parse_offset(" 7 ").unwrap(), 7.0);
    }

    #[test]
    fn test_parse_offset_invalid() {
        assert!(parse_offset("abc").is_err());
        assert!(parse_offset("-3").is_err());
        assert!(parse_offset("00:60").is_err());
        assert!(parse_offset("1:75:00").is_err());
        assert!(parse_offset("1:2:3:4").is_err());
        assert!(matches!(
            parse_offset(""),
            Err(DomainError::Configuration(_))
        ));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(83_250)), "01:23.250");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "01:02:05.000");
    }
}
