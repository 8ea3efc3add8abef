//! Coordinate extraction from free text.
//!
//! Recognizes decimal-degree pairs, degrees-minutes-seconds pairs, and
//! labelled `lat:`/`lon:` pairs. Matches outside valid bounds and
//! unparsable numerics are misses, never errors.

use regex::Regex;
use std::sync::LazyLock;

static DECIMAL_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d{1,3}\.\d+)\s*,\s*(-?\d{1,3}\.\d+)").unwrap()
});

static DMS_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\d{1,3})°(\d{1,2})'([\d.]+)"\s*([NS])\s*,?\s*(\d{1,3})°(\d{1,2})'([\d.]+)"\s*([EW])"#)
        .unwrap()
});

static LABELLED_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)lat[:=]\s*(-?\d{1,3}\.\d+).{0,40}?lo?ng?[:=]\s*(-?\d{1,3}\.\d+)").unwrap()
});

fn in_bounds(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Extract the first in-bounds coordinate pair from text, by pattern
/// priority: decimal degrees, then DMS, then labelled pairs.
pub fn extract_coordinates(text: &str) -> Option<(f64, f64)> {
    for caps in DECIMAL_PAIR.captures_iter(text) {
        let (Ok(lat), Ok(lon)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) else {
            continue;
        };
        if in_bounds(lat, lon) {
            return Some((lat, lon));
        }
    }

    for caps in DMS_PAIR.captures_iter(text) {
        if let Some(pair) = dms_to_decimal(&caps) {
            return Some(pair);
        }
    }

    for caps in LABELLED_PAIR.captures_iter(text) {
        let (Ok(lat), Ok(lon)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) else {
            continue;
        };
        if in_bounds(lat, lon) {
            return Some((lat, lon));
        }
    }

    None
}

fn dms_to_decimal(caps: &regex::Captures<'_>) -> Option<(f64, f64)> {
    let lat_deg: f64 = caps[1].parse().ok()?;
    let lat_min: f64 = caps[2].parse().ok()?;
    let lat_sec: f64 = caps[3].parse().ok()?;
    let lon_deg: f64 = caps[5].parse().ok()?;
    let lon_min: f64 = caps[6].parse().ok()?;
    let lon_sec: f64 = caps[7].parse().ok()?;

    let mut lat = lat_deg + lat_min / 60.0 + lat_sec / 3600.0;
    let mut lon = lon_deg + lon_min / 60.0 + lon_sec / 3600.0;
    if &caps[4] == "S" {
        lat = -lat;
    }
    if &caps[8] == "W" {
        lon = -lon;
    }

    in_bounds(lat, lon).then_some((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_decimal_pair() {
        let (lat, lon) = extract_coordinates("Explosion at 50.4501, 30.5234 in Kyiv").unwrap();
        assert_relative_eq!(lat, 50.4501);
        assert_relative_eq!(lon, 30.5234);
    }

    #[test]
    fn test_negative_coordinates() {
        let (lat, lon) = extract_coordinates("position -33.8688, 151.2093").unwrap();
        assert_relative_eq!(lat, -33.8688);
        assert_relative_eq!(lon, 151.2093);
    }

    #[test]
    fn test_out_of_bounds_is_miss() {
        assert!(extract_coordinates("version 95.1234, 200.5678").is_none());
    }

    #[test]
    fn test_out_of_bounds_then_valid_pair() {
        // First match is out of bounds; the later valid pair still wins.
        let (lat, lon) = extract_coordinates("v 95.0, 200.0 then 50.4501, 30.5234").unwrap();
        assert_relative_eq!(lat, 50.4501);
        assert_relative_eq!(lon, 30.5234);
    }

    #[test]
    fn test_dms_pair() {
        let (lat, lon) =
            extract_coordinates(r#"40°42'51"N, 74°00'21"W"#).unwrap();
        assert_relative_eq!(lat, 40.714167, epsilon = 1e-4);
        assert_relative_eq!(lon, -74.005833, epsilon = 1e-4);
    }

    #[test]
    fn test_dms_southern_hemisphere() {
        let (lat, lon) =
            extract_coordinates(r#"33°52'8"S, 151°12'33"E"#).unwrap();
        assert!(lat < 0.0);
        assert!(lon > 0.0);
    }

    #[test]
    fn test_labelled_pair() {
        let (lat, lon) = extract_coordinates("lat: 40.7128, lon: -74.0060").unwrap();
        assert_relative_eq!(lat, 40.7128);
        assert_relative_eq!(lon, -74.0060);
    }

    #[test]
    fn test_no_coordinates() {
        assert!(extract_coordinates("Strike reported near the front line").is_none());
        assert!(extract_coordinates("").is_none());
    }

    #[test]
    fn test_integers_do_not_match() {
        // Plain integers (dates, counts) must not parse as coordinates.
        assert!(extract_coordinates("12, 30 casualties reported").is_none());
    }
}
