//! Display-name and code translation for category dimensions.
//!
//! Presentation-only: codes feed UI affordances (country flags, stable DOM
//! ids) and never participate in window resolution or alignment.

/// Country display name -> ISO 3166-1 alpha-2 code, for the guest-country
/// dimension. The facts store full names; charts want the code.
static COUNTRY_CODES: &[(&str, &str)] = &[
    ("Albania", "al"),
    ("Argentina", "ar"),
    ("Australia", "au"),
    ("Austria", "at"),
    ("Belgium", "be"),
    ("Bosnia and Herzegovina", "ba"),
    ("Brazil", "br"),
    ("Bulgaria", "bg"),
    ("Canada", "ca"),
    ("Chile", "cl"),
    ("China", "cn"),
    ("Colombia", "co"),
    ("Croatia", "hr"),
    ("Cyprus", "cy"),
    ("Czech Republic", "cz"),
    ("Denmark", "dk"),
    ("Egypt", "eg"),
    ("Estonia", "ee"),
    ("Finland", "fi"),
    ("France", "fr"),
    ("Germany", "de"),
    ("Greece", "gr"),
    ("Hungary", "hu"),
    ("Iceland", "is"),
    ("India", "in"),
    ("Indonesia", "id"),
    ("Ireland", "ie"),
    ("Israel", "il"),
    ("Italy", "it"),
    ("Japan", "jp"),
    ("Latvia", "lv"),
    ("Lithuania", "lt"),
    ("Luxembourg", "lu"),
    ("Malta", "mt"),
    ("Mexico", "mx"),
    ("Montenegro", "me"),
    ("Netherlands", "nl"),
    ("New Zealand", "nz"),
    ("North Macedonia", "mk"),
    ("Norway", "no"),
    ("Poland", "pl"),
    ("Portugal", "pt"),
    ("Romania", "ro"),
    ("Serbia", "rs"),
    ("Singapore", "sg"),
    ("Slovakia", "sk"),
    ("Slovenia", "si"),
    ("South Africa", "za"),
    ("South Korea", "kr"),
    ("Spain", "es"),
    ("Sweden", "se"),
    ("Switzerland", "ch"),
    ("Turkey", "tr"),
    ("Ukraine", "ua"),
    ("United Arab Emirates", "ae"),
    ("United Kingdom", "gb"),
    ("United States", "us"),
];

/// Look up the ISO code for a country display name.
pub fn country_code(name: &str) -> Option<&'static str> {
    COUNTRY_CODES
        .iter()
        .find(|(country, _)| *country == name)
        .map(|(_, code)| *code)
}

/// Stable code for any category value of the given dimension field.
///
/// Guest countries resolve through the ISO table; everything else (producer
/// ids, market segments, ...) gets a lowercase slug.
pub fn category_code(field: &str, value: &str) -> String {
    if field == "guest_country" {
        if let Some(code) = country_code(value) {
            return code.to_string();
        }
    }
    slug(value)
}

fn slug(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
