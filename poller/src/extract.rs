use crate::errors::{Error, Result};
use crate::model::Sample;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, error};

static NOW_POWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"var webdata_now_p = "([^"]+)""#).unwrap());
static TODAY_ENERGY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"var webdata_today_e = "([^"]+)""#).unwrap());
static TOTAL_ENERGY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"var webdata_total_e = "([^"]+)""#).unwrap());
static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());

/// Finds the first inline script block that assigns all three `webdata_*`
/// variables and converts them to a [`Sample`].
///
/// Blocks with only some of the variables are skipped.
pub fn extract(markup: &str) -> Result<Sample> {
    let document = Html::parse_document(markup);

    for script in document.select(&SCRIPT) {
        let text: String = script.text().collect();
        if let Some(sample) = extract_block(&text)? {
            debug!("Extracted {}", sample);
            return Ok(sample);
        }
    }

    error!("No script block carries all of webdata_now_p, webdata_today_e, webdata_total_e");
    Err(Error::Extraction(
        "telemetry variables not found in status page".to_string(),
    ))
}

fn extract_block(text: &str) -> Result<Option<Sample>> {
    let captured = (
        capture(&NOW_POWER, text),
        capture(&TODAY_ENERGY, text),
        capture(&TOTAL_ENERGY, text),
    );

    let (Some(now_p), Some(today_e), Some(total_e)) = captured else {
        return Ok(None);
    };

    Ok(Some(Sample {
        current_power: parse_watts("webdata_now_p", now_p)?,
        today_energy: parse_kilowatt_hours("webdata_today_e", today_e)?,
        total_energy: parse_kilowatt_hours("webdata_total_e", total_e)?,
    }))
}

fn capture<'a>(pattern: &Regex, text: &'a str) -> Option<&'a str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse_watts(name: &str, raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|e| {
        error!("Malformed {} value {:?}: {}", name, raw, e);
        Error::Extraction(format!("{name} is not an integer: {raw:?}"))
    })
}

/// Kilowatt-hours to watt-hours, truncated toward zero.
fn parse_kilowatt_hours(name: &str, raw: &str) -> Result<i64> {
    match raw.trim().parse::<f64>() {
        Ok(kwh) if kwh.is_finite() => Ok((kwh * 1000.0) as i64),
        _ => {
            error!("Malformed {} value {:?}", name, raw);
            Err(Error::Extraction(format!("{name} is not a number: {raw:?}")))
        }
    }
}
