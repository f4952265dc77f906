use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Flight metadata from the H (header) records.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Header {
    pub date: Option<NaiveDate>,
    pub pilot: Option<String>,
    pub glider_type: Option<String>,
    pub site: Option<String>,
}

impl Header {
    pub(crate) fn update(&mut self, line: &str) -> Result<()> {
        if !line.is_ascii() || line.len() < 5 {
            return Ok(());
        }

        // HFDTE either inlines the date (HFDTEDDMMYY) or uses the newer
        // DATE: subfield, possibly with a flight number after a comma
        if let Some(rest) = line.strip_prefix("HFDTE") {
            let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).take(6).collect();
            if digits.len() != 6 {
                bail!("Bad date header: {}", line);
            }
            let day: u32 = digits[0..2].parse()?;
            let month: u32 = digits[2..4].parse()?;
            let year: i32 = digits[4..6].parse()?;
            let year = if year < 80 { 2000 + year } else { 1900 + year };
            self.date = Some(
                NaiveDate::from_ymd_opt(year, month, day)
                    .ok_or_else(|| anyhow!("Bad date header: {}", line))?,
            );
            return Ok(());
        }

        let value = match line.split_once(':') {
            Some((_, value)) => value.trim(),
            None => return Ok(()),
        };
        if value.is_empty() {
            return Ok(());
        }
        match &line[2..5] {
            "PLT" => self.pilot = Some(value.to_string()),
            "GTY" => self.glider_type = Some(value.to_string()),
            "SIT" => self.site = Some(value.to_string()),
            _ => {}
        }
        Ok(())
    }
}
