// Course identity resolution for the delete_course command.
//
// Input resolves against a static alias table by exact (case-insensitive)
// match; rows are then matched against the canonical course's name variants
// on word boundaries. Bare substring containment is deliberately not used —
// "dsp" buried inside an unrelated word must not match.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref COURSE_ALIASES: HashMap<&'static str, Vec<&'static str>> = {
        let mut map = HashMap::new();
        map.insert("MoM", vec!["MoM", "Mechanics of Materials"]);
        map.insert("DSP", vec!["DSP", "Digital Signal Processing"]);
        map.insert("LA", vec!["LA", "Linear Algebra"]);
        map.insert("OS", vec!["OS", "Operating Systems"]);
        map
    };
}

/// Resolve user/model input to a canonical course id by exact alias match.
pub fn resolve_course(input: &str) -> Option<&'static str> {
    let needle = input.trim();
    for (canonical, aliases) in COURSE_ALIASES.iter() {
        if aliases.iter().any(|a| a.eq_ignore_ascii_case(needle)) {
            return Some(canonical);
        }
    }
    None
}

/// Accepted name variants for a canonical course id.
pub fn course_variants(canonical: &str) -> &'static [&'static str] {
    COURSE_ALIASES
        .get(canonical)
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Whether `text` mentions any of the variants as a whole word.
pub fn mentions_course(text: &str, variants: &[&str]) -> bool {
    variants.iter().any(|variant| {
        Regex::new(&format!(r"(?i)\b{}\b", regex::escape(variant)))
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_abbreviation_and_full_name() {
        assert_eq!(resolve_course("MoM"), Some("MoM"));
        assert_eq!(resolve_course("mom"), Some("MoM"));
        assert_eq!(resolve_course("mechanics of materials"), Some("MoM"));
        assert_eq!(resolve_course("Basket Weaving"), None);
    }

    #[test]
    fn resolution_requires_exact_alias_not_substring() {
        // The original matched "dsp" anywhere in the input; here only a full
        // alias resolves.
        assert_eq!(resolve_course("handset dsp notes"), None);
        assert_eq!(resolve_course("DSP"), Some("DSP"));
    }

    #[test]
    fn variant_matching_is_word_bounded() {
        let variants = course_variants("DSP");
        assert!(mentions_course("DSP exercise session", variants));
        assert!(mentions_course("intro to digital signal processing", variants));
        assert!(!mentions_course("headset dspatcher config", variants));
    }

    #[test]
    fn mom_variants_match_case_insensitively() {
        let variants = course_variants("MoM");
        assert!(mentions_course("Mechanics of Materials lab", variants));
        assert!(mentions_course("MOM homework 3", variants));
        assert!(!mentions_course("Moment of inertia recap", variants));
    }
}
