use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn report_stamp(dt: DateTime<Utc>) -> String {
    dt.format("%d.%m.%Y %H:%M UTC").to_string()
}

pub fn file_stamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%d_%H%M").to_string()
}
