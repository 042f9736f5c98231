//! Report periods: ISO weeks, calendar months and their Spanish labels.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::{AppError, Result};

const MESES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// ISO-8601 `(year, week)`. Early January days may belong to the previous
/// year and late December days to the next one.
pub fn iso_week(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

/// Monday..Sunday of the ISO week containing `date`.
pub fn week_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date.week(Weekday::Mon).first_day();
    let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(monday);
    (monday, sunday)
}

/// First and last day of the month containing `date`.
pub fn month_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let last = first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date);
    (first, last)
}

/// Spanish month name, 1-based.
pub fn month_name(month: u32) -> &'static str {
    MESES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// e.g. `Octubre 2026`.
pub fn month_label(date: NaiveDate) -> String {
    format!("{} {}", month_name(date.month()), date.year())
}

/// e.g. `Semana 42 de 2026 (12/10/2026 al 18/10/2026)`.
pub fn week_label(date: NaiveDate) -> String {
    let (year, week) = iso_week(date);
    let (start, end) = week_range(date);
    format!(
        "Semana {week} de {year} ({} al {})",
        format_fecha(start),
        format_fecha(end)
    )
}

/// Day/month/year as shown in reports.
pub fn format_fecha(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Parse a date typed by the user or passed on the command line.
///
/// Accepts `YYYY-MM-DD`, `YYYY/M/D`, `YYYY.M.D` and `DD/MM/YYYY`.
pub fn flexible_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(AppError::parse(format!("Fecha inválida: '{trimmed}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_week_year_boundaries() {
        assert_eq!(iso_week(date(2021, 1, 1)), (2020, 53));
        assert_eq!(iso_week(date(2023, 1, 1)), (2022, 52));
        assert_eq!(iso_week(date(2024, 12, 30)), (2025, 1));
        assert_eq!(iso_week(date(2026, 1, 1)), (2026, 1));
    }

    #[test]
    fn test_week_range_monday_to_sunday() {
        let (start, end) = week_range(date(2026, 10, 17));
        assert_eq!(start, date(2026, 10, 12));
        assert_eq!(end, date(2026, 10, 18));

        let (start, end) = week_range(date(2021, 1, 1));
        assert_eq!(start, date(2020, 12, 28));
        assert_eq!(end, date(2021, 1, 3));
    }

    #[test]
    fn test_month_range() {
        assert_eq!(month_range(date(2024, 2, 10)), (date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(month_range(date(2026, 12, 31)), (date(2026, 12, 1), date(2026, 12, 31)));
    }

    #[test]
    fn test_labels() {
        assert_eq!(month_label(date(2026, 10, 17)), "Octubre 2026");
        assert_eq!(
            week_label(date(2026, 10, 17)),
            "Semana 42 de 2026 (12/10/2026 al 18/10/2026)"
        );
        assert_eq!(month_name(0), "");
    }

    #[test]
    fn test_flexible_date() {
        assert_eq!(flexible_date("2026-10-17").unwrap(), date(2026, 10, 17));
        assert_eq!(flexible_date("2026/1/5").unwrap(), date(2026, 1, 5));
        assert_eq!(flexible_date("2026.1.5").unwrap(), date(2026, 1, 5));
        assert_eq!(flexible_date("17/10/2026").unwrap(), date(2026, 10, 17));
        assert!(flexible_date("mañana").is_err());
    }
}
