use chrono::{NaiveDate, NaiveTime};

use crate::error::{AppError, AppResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Parse a reservation date string (`YYYY-MM-DD`).
pub fn parse_reservation_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| AppError::BadRequest(format!("Invalid reservation date: {}", value)))
}

/// Parse a reservation time string (`HH:MM`).
pub fn parse_reservation_time(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| AppError::BadRequest(format!("Invalid reservation time: {}", value)))
}

pub fn format_reservation_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_reservation_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_date_and_time() {
        assert_eq!(
            parse_reservation_date("2024-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert_eq!(
            parse_reservation_time("09:00").unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_reservation_date("2024/06/01").is_err());
        assert!(parse_reservation_date("2024-13-01").is_err());
        assert!(parse_reservation_date("").is_err());
        assert!(parse_reservation_time("9am").is_err());
        assert!(parse_reservation_time("25:00").is_err());
    }

    #[test]
    fn formats_back_to_wire_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(format_reservation_date(date), "2024-06-01");
        assert_eq!(format_reservation_time(time), "09:30");
    }
}
