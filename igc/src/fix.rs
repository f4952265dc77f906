use anyhow::Result;

/// One recorded GPS sample, with the flight date already applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Fix {
    /// Epoch milliseconds, UTC
    pub timestamp_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// The record's validity flag; false marks a void/2D fix
    pub valid: bool,
    /// Meters, relative to the 1013.25 hPa isobar
    pub pressure_altitude: f64,
    /// Meters; absent on void/2D fixes
    pub gps_altitude: Option<f64>,
}

// BHHMMSSDDMMmmm{N|S}DDDMMmmm{E|W}{A|V}PPPPPGGGGG, extensions ignored
pub(crate) struct BRecord {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub valid: bool,
    pub pressure_altitude: f64,
    pub gps_altitude: f64,
}

pub(crate) fn parse_b_record(line: &str) -> Result<BRecord> {
    if !line.is_ascii() || line.len() < 35 {
        bail!("Truncated B record: {}", line);
    }

    let hour: u32 = line[1..3].parse()?;
    let minute: u32 = line[3..5].parse()?;
    let second: u32 = line[5..7].parse()?;
    if hour > 23 || minute > 59 || second > 59 {
        bail!("Bad time of day in B record: {}", line);
    }

    // DDMMmmm: whole degrees, then thousandths of minutes
    let mut latitude = line[7..9].parse::<f64>()? + line[9..14].parse::<f64>()? / 1000.0 / 60.0;
    match &line[14..15] {
        "N" => {}
        "S" => latitude = -latitude,
        x => bail!("Bad latitude hemisphere {} in B record: {}", x, line),
    }

    let mut longitude = line[15..18].parse::<f64>()? + line[18..23].parse::<f64>()? / 1000.0 / 60.0;
    match &line[23..24] {
        "E" => {}
        "W" => longitude = -longitude,
        x => bail!("Bad longitude hemisphere {} in B record: {}", x, line),
    }

    let valid = &line[24..25] == "A";
    let pressure_altitude = line[25..30].parse::<i32>()? as f64;
    let gps_altitude = line[30..35].parse::<i32>()? as f64;

    Ok(BRecord {
        hour,
        minute,
        second,
        latitude,
        longitude,
        valid,
        pressure_altitude,
        gps_altitude,
    })
}
