/// A continent and the ISO 3166-1 alpha-2 codes of its member countries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continent {
    pub code: &'static str,
    pub name: &'static str,
    pub countries: &'static [&'static str],
}

impl Continent {
    /// Whether `country` belongs to this continent. Case-insensitive.
    pub fn contains(&self, country: &str) -> bool {
        self.countries
            .iter()
            .any(|c| c.eq_ignore_ascii_case(country.trim()))
    }
}

// Cyprus is listed under Europe so that an EU-wide rule covers it.
pub static CONTINENTS: &[Continent] = &[
    Continent {
        code: "AF",
        name: "Africa",
        countries: &[
            "AO", "BF", "BI", "BJ", "BW", "CD", "CF", "CG", "CI", "CM", "CV", "DJ", "DZ", "EG",
            "EH", "ER", "ET", "GA", "GH", "GM", "GN", "GQ", "GW", "KE", "KM", "LR", "LS", "LY",
            "MA", "MG", "ML", "MR", "MU", "MW", "MZ", "NA", "NE", "NG", "RE", "RW", "SC", "SD",
            "SH", "SL", "SN", "SO", "SS", "ST", "SZ", "TD", "TG", "TN", "TZ", "UG", "YT", "ZA",
            "ZM", "ZW",
        ],
    },
    Continent {
        code: "AN",
        name: "Antarctica",
        countries: &["AQ", "BV", "GS", "HM", "TF"],
    },
    Continent {
        code: "AS",
        name: "Asia",
        countries: &[
            "AE", "AF", "AM", "AZ", "BD", "BH", "BN", "BT", "CC", "CN", "CX", "GE", "HK", "ID",
            "IL", "IN", "IO", "IQ", "IR", "JO", "JP", "KG", "KH", "KP", "KR", "KW", "KZ", "LA",
            "LB", "LK", "MM", "MN", "MO", "MV", "MY", "NP", "OM", "PH", "PK", "PS", "QA", "SA",
            "SG", "SY", "TH", "TJ", "TL", "TM", "TR", "TW", "UZ", "VN", "YE",
        ],
    },
    Continent {
        code: "EU",
        name: "Europe",
        countries: &[
            "AD", "AL", "AT", "AX", "BA", "BE", "BG", "BY", "CH", "CY", "CZ", "DE", "DK", "EE",
            "ES", "FI", "FO", "FR", "GB", "GG", "GI", "GR", "HR", "HU", "IE", "IM", "IS", "IT",
            "JE", "LI", "LT", "LU", "LV", "MC", "MD", "ME", "MK", "MT", "NL", "NO", "PL", "PT",
            "RO", "RS", "RU", "SE", "SI", "SJ", "SK", "SM", "UA", "VA", "XK",
        ],
    },
    Continent {
        code: "NA",
        name: "North America",
        countries: &[
            "AG", "AI", "AW", "BB", "BL", "BM", "BQ", "BS", "BZ", "CA", "CR", "CU", "CW", "DM",
            "DO", "GD", "GL", "GP", "GT", "HN", "HT", "JM", "KN", "KY", "LC", "MF", "MQ", "MS",
            "MX", "NI", "PA", "PM", "PR", "SV", "SX", "TC", "TT", "UM", "US", "VC", "VG", "VI",
        ],
    },
    Continent {
        code: "OC",
        name: "Oceania",
        countries: &[
            "AS", "AU", "CK", "FJ", "FM", "GU", "KI", "MH", "MP", "NC", "NF", "NR", "NU", "NZ",
            "PF", "PG", "PN", "PW", "SB", "TK", "TO", "TV", "VU", "WF", "WS",
        ],
    },
    Continent {
        code: "SA",
        name: "South America",
        countries: &[
            "AR", "BO", "BR", "CL", "CO", "EC", "FK", "GF", "GY", "PE", "PY", "SR", "UY", "VE",
        ],
    },
];

/// Look up a continent by its two-letter code. Case-insensitive.
pub fn continent(code: &str) -> Option<&'static Continent> {
    let code = code.trim();
    CONTINENTS.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Continent expansion: is `country` one of the members of `continent_code`?
///
/// Unknown continent codes contain nothing.
pub fn continent_contains(continent_code: &str, country: &str) -> bool {
    continent(continent_code).is_some_and(|c| c.contains(country))
}
