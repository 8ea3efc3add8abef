//! Entity location extraction.
//!
//! Pattern-based extraction of a place-name candidate from free text.
//! Patterns run in priority order and the first hit wins; the candidate
//! carries a provisional confidence but no coordinates — geocoding
//! turns it into a location.

use regex::Regex;
use std::sync::LazyLock;

use super::reference::CountryReference;

static CITY_COUNTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][a-z]+(?:[ '-][A-Z][a-z]+)*)\s*,\s*([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)")
        .unwrap()
});

static CITY_IN_COUNTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][a-z]+(?:[ '-][A-Z][a-z]+)*)\s+in\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)")
        .unwrap()
});

/// Which textual pattern produced a candidate. The geocoded source tag
/// names the pattern so downstream consumers can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidatePattern {
    CityCountry,
    CityInCountry,
    CityOnly,
}

impl CandidatePattern {
    pub fn source_tag(self) -> &'static str {
        match self {
            Self::CityCountry => "llm_geocoding_city_country",
            Self::CityInCountry => "llm_geocoding_city_in_country",
            Self::CityOnly => "llm_geocoding_city_only",
        }
    }

    /// Provisional confidence before geocoding.
    pub fn provisional_confidence(self) -> f64 {
        match self {
            Self::CityCountry => 0.70,
            Self::CityInCountry => 0.60,
            Self::CityOnly => 0.40,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CityCountry => "city_country",
            Self::CityInCountry => "city_in_country",
            Self::CityOnly => "city_only",
        }
    }
}

/// A place-name candidate handed to the geocoding stage.
#[derive(Debug, Clone)]
pub struct LocationCandidate {
    /// The query string sent to the geocoding service.
    pub query: String,
    pub pattern: CandidatePattern,
    /// Country code when the pattern resolved one from the reference.
    pub country_code: Option<String>,
}

/// Extract the highest-priority place-name candidate from text.
///
/// Priority: "City, Country" with a known country alias, then
/// "City in Country" with a known country alias, then a comma match
/// with an unrecognized country token, then a bare curated city name.
/// Comma matches always outrank the bare-city pattern; within the
/// comma pattern, known countries outrank unrecognized ones.
pub fn extract_candidate(text: &str, reference: &CountryReference) -> Option<LocationCandidate> {
    let mut first_raw_comma: Option<LocationCandidate> = None;

    for caps in CITY_COUNTRY.captures_iter(text) {
        let city = caps[1].trim();
        let country = caps[2].trim();
        match reference.country_for_alias(country) {
            Some(code) => {
                return Some(LocationCandidate {
                    query: format!("{}, {}", city, country),
                    pattern: CandidatePattern::CityCountry,
                    country_code: Some(code.to_string()),
                });
            }
            None => {
                if first_raw_comma.is_none() {
                    first_raw_comma = Some(LocationCandidate {
                        query: format!("{}, {}", city, country),
                        pattern: CandidatePattern::CityCountry,
                        country_code: None,
                    });
                }
            }
        }
    }

    for caps in CITY_IN_COUNTRY.captures_iter(text) {
        let city = caps[1].trim();
        let country = caps[2].trim();
        // Without a recognized country token this pattern is noise
        // ("Explosion in Kyiv" would read as city="Explosion").
        if let Some(code) = reference.country_for_alias(country) {
            return Some(LocationCandidate {
                query: format!("{}, {}", city, country),
                pattern: CandidatePattern::CityInCountry,
                country_code: Some(code.to_string()),
            });
        }
    }

    if first_raw_comma.is_some() {
        return first_raw_comma;
    }

    first_known_city(text, reference)
}

/// Earliest curated city name appearing in the text, word-bounded and
/// case-insensitive.
fn first_known_city(text: &str, reference: &CountryReference) -> Option<LocationCandidate> {
    let lowered = text.to_lowercase();
    let mut best: Option<(usize, &str, &str)> = None;

    for (name, code) in reference.known_cities() {
        let mut from = 0;
        while let Some(offset) = lowered[from..].find(name) {
            let start = from + offset;
            let end = start + name.len();
            if word_bounded(&lowered, start, end) {
                if best.map_or(true, |(pos, _, _)| start < pos) {
                    best = Some((start, name, code));
                }
                break;
            }
            from = end;
        }
    }

    best.map(|(start, name, code)| LocationCandidate {
        // Prefer the text as written; offsets come from the lowercased
        // copy, so fall back to the canonical name if lowercasing
        // shifted byte positions.
        query: text
            .get(start..start + name.len())
            .map_or_else(|| name.to_string(), str::to_string),
        pattern: CandidatePattern::CityOnly,
        country_code: Some(code.to_string()),
    })
}

fn word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> CountryReference {
        CountryReference::bundled().unwrap()
    }

    #[test]
    fn test_city_country_known_alias() {
        let c = extract_candidate("Explosion in Kyiv, Ukraine", &reference()).unwrap();
        assert_eq!(c.query, "Kyiv, Ukraine");
        assert_eq!(c.pattern, CandidatePattern::CityCountry);
        assert_eq!(c.country_code.as_deref(), Some("UKR"));
    }

    #[test]
    fn test_known_country_preferred_over_earlier_raw_comma() {
        // "Monday, Tuesday" matches the comma pattern first, but the
        // known-country match wins.
        let text = "Monday, Tuesday update: strikes on Kharkiv, Ukraine";
        let c = extract_candidate(text, &reference()).unwrap();
        assert_eq!(c.query, "Kharkiv, Ukraine");
        assert_eq!(c.country_code.as_deref(), Some("UKR"));
    }

    #[test]
    fn test_city_in_country() {
        let c = extract_candidate("Heavy fighting near Bakhmut in Ukraine", &reference()).unwrap();
        // "City, Country" does not match; the "in Country" pattern does.
        assert_eq!(c.pattern, CandidatePattern::CityInCountry);
        assert_eq!(c.query, "Bakhmut, Ukraine");
        assert_eq!(c.country_code.as_deref(), Some("UKR"));
    }

    #[test]
    fn test_bare_known_city() {
        let c = extract_candidate("Air raid sirens across Kharkiv tonight", &reference()).unwrap();
        assert_eq!(c.pattern, CandidatePattern::CityOnly);
        assert_eq!(c.query, "Kharkiv");
        assert_eq!(c.country_code.as_deref(), Some("UKR"));
    }

    #[test]
    fn test_earliest_known_city_wins() {
        let c = extract_candidate("from Moscow towards Kharkiv", &reference()).unwrap();
        assert_eq!(c.query, "Moscow");
        assert_eq!(c.country_code.as_deref(), Some("RUS"));
    }

    #[test]
    fn test_known_city_is_word_bounded() {
        // "Kyivstar" must not match "kyiv".
        assert!(extract_candidate("Kyivstar outage reported", &reference()).is_none());
    }

    #[test]
    fn test_raw_comma_fallback() {
        let c = extract_candidate("Fire in Bakhchysarai, Crimea", &reference()).unwrap();
        assert_eq!(c.pattern, CandidatePattern::CityCountry);
        assert_eq!(c.query, "Bakhchysarai, Crimea");
        assert!(c.country_code.is_none());
    }

    #[test]
    fn test_raw_comma_outranks_bare_city() {
        // A comma match with an unrecognized country token still beats
        // a bare curated city elsewhere in the text.
        let text = "Kharkiv under fire. Source: Bakhchysarai, Crimea";
        let c = extract_candidate(text, &reference()).unwrap();
        assert_eq!(c.pattern, CandidatePattern::CityCountry);
        assert_eq!(c.query, "Bakhchysarai, Crimea");
        assert!(c.country_code.is_none());
    }

    #[test]
    fn test_pattern_priority_city_country_first() {
        // Both a "City, Country" and a bare city are present; the comma
        // pattern has priority.
        let c = extract_candidate("Kramatorsk hit. Source: Dnipro, Ukraine", &reference()).unwrap();
        assert_eq!(c.pattern, CandidatePattern::CityCountry);
        assert_eq!(c.query, "Dnipro, Ukraine");
    }

    #[test]
    fn test_no_candidate() {
        assert!(extract_candidate("no places mentioned here", &reference()).is_none());
        assert!(extract_candidate("", &reference()).is_none());
    }

    #[test]
    fn test_provisional_confidence_ordering() {
        assert!(
            CandidatePattern::CityCountry.provisional_confidence()
                > CandidatePattern::CityInCountry.provisional_confidence()
        );
        assert!(
            CandidatePattern::CityInCountry.provisional_confidence()
                > CandidatePattern::CityOnly.provisional_confidence()
        );
    }
}
