//! ISO 3166-1 alpha-3 country codes with their Spanish names.
//!
//! SIFEN identifies countries by alpha-3 code (`cPaisRec`, `cPaisOrig`,
//! `cPaisDest`, `cNacTrans`) and expects the Spanish country name next to it.
//! This is the subset relevant to Paraguayan trade.

/// Check whether `code` is a known ISO 3166-1 alpha-3 country code.
pub fn is_known_country_code(code: &str) -> bool {
    COUNTRIES.binary_search_by_key(&code, |(c, _)| *c).is_ok()
}

/// Spanish name for an alpha-3 code, or an empty string when unknown.
pub fn describe_country(code: &str) -> &'static str {
    COUNTRIES
        .binary_search_by_key(&code, |(c, _)| *c)
        .map(|i| COUNTRIES[i].1)
        .unwrap_or("")
}

/// Sorted for binary search.
static COUNTRIES: &[(&str, &str)] = &[
    ("ARG", "Argentina"),
    ("AUS", "Australia"),
    ("AUT", "Austria"),
    ("BEL", "Bélgica"),
    ("BOL", "Bolivia"),
    ("BRA", "Brasil"),
    ("CAN", "Canadá"),
    ("CHE", "Suiza"),
    ("CHL", "Chile"),
    ("CHN", "China"),
    ("COL", "Colombia"),
    ("CRI", "Costa Rica"),
    ("CUB", "Cuba"),
    ("DEU", "Alemania"),
    ("DNK", "Dinamarca"),
    ("DOM", "República Dominicana"),
    ("DZA", "Argelia"),
    ("ECU", "Ecuador"),
    ("ESP", "España"),
    ("FRA", "Francia"),
    ("GBR", "Reino Unido"),
    ("GTM", "Guatemala"),
    ("HND", "Honduras"),
    ("IND", "India"),
    ("ISR", "Israel"),
    ("ITA", "Italia"),
    ("JPN", "Japón"),
    ("KOR", "Corea del Sur"),
    ("LBN", "Líbano"),
    ("MEX", "México"),
    ("NIC", "Nicaragua"),
    ("NLD", "Países Bajos"),
    ("PAN", "Panamá"),
    ("PER", "Perú"),
    ("PRT", "Portugal"),
    ("PRY", "Paraguay"),
    ("RUS", "Rusia"),
    ("SLV", "El Salvador"),
    ("SWE", "Suecia"),
    ("TUR", "Turquía"),
    ("TWN", "Taiwán"),
    ("URY", "Uruguay"),
    ("USA", "Estados Unidos"),
    ("VEN", "Venezuela"),
    ("ZAF", "Sudáfrica"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted() {
        assert!(COUNTRIES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn known_countries() {
        assert!(is_known_country_code("PRY"));
        assert!(is_known_country_code("ARG"));
        assert!(is_known_country_code("BRA"));
        assert_eq!(describe_country("PRY"), "Paraguay");
        assert_eq!(describe_country("DZA"), "Argelia");
    }

    #[test]
    fn unknown_countries() {
        assert!(!is_known_country_code("PY"));
        assert!(!is_known_country_code(""));
        assert_eq!(describe_country("XXX"), "");
    }
}
