//! Trigger terms that activate directory lookup.

/// Terms used when `TRIGGER_TERMS` is not set.
pub const DEFAULT_TRIGGER_TERMS: &[&str] = &[
    "find a doctor",
    "specialist",
    "recommend a doctor",
    "which doctor",
    "hospital",
];

/// Lower-cased, non-empty trigger terms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerSet {
    terms: Vec<String>,
}

impl TriggerSet {
    /// Builds a set from arbitrary terms. Blank terms are dropped, the rest lower-cased.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// Parses a comma separated list, e.g. `"pain, hospital"`.
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    /// True iff some term is a substring of the lower-cased query.
    ///
    /// Plain substring test: "painting" matches "pain".
    pub fn matches(&self, query: &str) -> bool {
        matches(query, self)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for TriggerSet {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_TERMS)
    }
}

/// Case-insensitive substring match of any trigger term against `query`.
pub fn matches(query: &str, triggers: &TriggerSet) -> bool {
    let q = query.to_lowercase();
    triggers.terms.iter().any(|t| q.contains(t.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_is_case_insensitive_substring() {
        let t = TriggerSet::new(["Pain", "find a doctor"]);
        assert!(t.matches("I have chest PAIN"));
        assert!(t.matches("Can you FIND A DOCTOR near me?"));
        assert!(t.matches("I like painting"));
        assert!(!t.matches("I have a headache"));
    }

    #[test]
    fn blank_terms_never_match_everything() {
        let t = TriggerSet::from_csv(" , hospital,,");
        assert_eq!(t.terms(), ["hospital"]);
        assert!(!t.matches("hello"));
        assert!(!TriggerSet::new(Vec::<String>::new()).matches("anything"));
    }

    #[test]
    fn matches_iff_some_term_is_substring() {
        let t = TriggerSet::default();
        let queries = [
            "Which doctor should I see?",
            "nearest HOSPITAL",
            "I need a specialist",
            "diet plan please",
            "",
        ];
        for q in queries {
            let expected = t.terms().iter().any(|term| q.to_lowercase().contains(term.as_str()));
            assert_eq!(t.matches(q), expected, "{q}");
        }
    }
}
