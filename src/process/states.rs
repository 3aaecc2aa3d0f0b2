use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The 50 US states as (abbreviation, name).
static STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

static LOOKUP: Lazy<StateLookup> = Lazy::new(|| StateLookup {
    by_abbr: STATES.iter().copied().collect(),
});

/// Immutable abbreviation → full-name table, built once per process.
#[derive(Debug)]
pub struct StateLookup {
    by_abbr: HashMap<&'static str, &'static str>,
}

impl StateLookup {
    pub fn get() -> &'static StateLookup {
        &LOOKUP
    }

    pub fn name(&self, abbr: &str) -> Option<&'static str> {
        self.by_abbr.get(abbr.trim()).copied()
    }

    /// Entries in a stable (alphabetical by name) order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        STATES.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.by_abbr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_abbr.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifty_unique_states() {
        let lookup = StateLookup::get();
        assert_eq!(lookup.len(), 50);
        assert_eq!(lookup.entries().count(), 50);
    }

    #[test]
    fn resolves_abbreviations() {
        let lookup = StateLookup::get();
        assert_eq!(lookup.name("CA"), Some("California"));
        assert_eq!(lookup.name(" WY "), Some("Wyoming"));
        assert_eq!(lookup.name("DC"), None);
        assert_eq!(lookup.name("PR"), None);
    }
}
