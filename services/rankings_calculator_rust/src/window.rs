use chrono::{Datelike, Duration, NaiveDate};

/// Days of fixtures loaded after a historical rankings date.
const HISTORICAL_WINDOW_DAYS: i64 = 7;

/// Date range of fixtures that will count towards the next rankings update.
///
/// For a requested historical date that is the week after the rankings; for
/// the latest rankings it runs up to the next Monday after today.
pub fn fixture_window(
    rankings_date: NaiveDate,
    date_requested: bool,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let to = if date_requested {
        rankings_date + Duration::days(HISTORICAL_WINDOW_DAYS)
    } else {
        next_monday(today)
    };
    (rankings_date, to)
}

/// The Monday strictly after `date`.
pub fn next_monday(date: NaiveDate) -> NaiveDate {
    let from_sunday = i64::from(date.weekday().num_days_from_sunday());
    date + Duration::days((7 - from_sunday) % 7 + 1)
}
