#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod fix;
mod header;

use anyhow::Result;
use chrono::NaiveDate;

pub use self::fix::Fix;
pub use self::header::Header;

/// A parsed IGC track log: header metadata plus the recorded fixes in file
/// order, with UTC midnight rollover already applied to the timestamps.
pub struct IgcFile {
    pub header: Header,
    pub fixes: Vec<Fix>,
}

pub fn parse(raw: &str) -> Result<IgcFile> {
    let mut header = Header::default();
    let mut fixes: Vec<Fix> = Vec::new();
    let mut date: Option<NaiveDate> = None;
    let mut last_seconds: Option<u32> = None;

    for line in raw.lines() {
        let line = line.trim_end();
        match line.bytes().next() {
            Some(b'H') => {
                header.update(line)?;
                if date.is_none() {
                    date = header.date;
                }
            }
            Some(b'B') => {
                let rec = fix::parse_b_record(line)?;
                let mut day = match date {
                    Some(day) => day,
                    None => bail!("B record before any HFDTE date header"),
                };
                // The time of day stepping backwards means the track crossed
                // UTC midnight
                let seconds = rec.hour * 3600 + rec.minute * 60 + rec.second;
                if let Some(prev) = last_seconds {
                    if seconds < prev {
                        day = day
                            .succ_opt()
                            .ok_or_else(|| anyhow!("Date overflow after midnight rollover"))?;
                        date = Some(day);
                    }
                }
                last_seconds = Some(seconds);

                let timestamp_ms = day
                    .and_hms_opt(rec.hour, rec.minute, rec.second)
                    .ok_or_else(|| anyhow!("Bad time of day in B record: {}", line))?
                    .and_utc()
                    .timestamp_millis();
                fixes.push(Fix {
                    timestamp_ms,
                    latitude: rec.latitude,
                    longitude: rec.longitude,
                    valid: rec.valid,
                    pressure_altitude: rec.pressure_altitude,
                    gps_altitude: if rec.valid { Some(rec.gps_altitude) } else { None },
                });
            }
            // A, C, G, I, L and friends don't affect the trajectory
            _ => {}
        }
    }

    if fixes.is_empty() {
        warn!("No B records (fixes) in IGC input");
    }
    Ok(IgcFile { header, fixes })
}
