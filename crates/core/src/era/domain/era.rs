use std::fmt;
use std::str::FromStr;

/// Placeholder a prompt template may carry for the detected group.
pub const GROUP_PLACEHOLDER: &str = "{{GROUP_DESCRIPTION}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EraId {
    OldEgypt,
    CopticEgypt,
    IslamicEgypt,
}

impl EraId {
    pub const ALL: &[EraId] = &[EraId::OldEgypt, EraId::CopticEgypt, EraId::IslamicEgypt];

    /// Stable identifier, used in export file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            EraId::OldEgypt => "OLD_EGYPT",
            EraId::CopticEgypt => "COPTIC_EGYPT",
            EraId::IslamicEgypt => "ISLAMIC_EGYPT",
        }
    }

    /// Short command-line name.
    pub fn slug(&self) -> &'static str {
        match self {
            EraId::OldEgypt => "old-kingdom",
            EraId::CopticEgypt => "coptic",
            EraId::IslamicEgypt => "islamic",
        }
    }
}

impl fmt::Display for EraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EraId {
    type Err = String;

    /// Accepts either the slug or the stable identifier, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EraId::ALL
            .iter()
            .copied()
            .find(|id| {
                id.slug().eq_ignore_ascii_case(wanted) || id.as_str().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| {
                let known: Vec<_> = EraId::ALL.iter().map(|id| id.slug()).collect();
                format!("unknown era '{wanted}', expected one of: {}", known.join(", "))
            })
    }
}

/// A selectable historical style target.
#[derive(Debug, PartialEq, Eq)]
pub struct Era {
    pub id: EraId,
    pub name: &'static str,
    pub description: &'static str,
    pub preview_image: &'static str,
    pub prompt_template: &'static str,
    pub fallback_fact: Option<&'static str>,
}

impl Era {
    pub fn has_group_placeholder(&self) -> bool {
        self.prompt_template.contains(GROUP_PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::slug("old-kingdom", EraId::OldEgypt)]
    #[case::stable_id("COPTIC_EGYPT", EraId::CopticEgypt)]
    #[case::mixed_case("Islamic", EraId::IslamicEgypt)]
    #[case::padded("  coptic ", EraId::CopticEgypt)]
    fn test_parse_era_id(#[case] input: &str, #[case] expected: EraId) {
        assert_eq!(input.parse::<EraId>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_era_lists_choices() {
        let err = "bronze-age".parse::<EraId>().unwrap_err();
        assert!(err.contains("bronze-age"));
        assert!(err.contains("old-kingdom"));
    }

    #[test]
    fn test_identifiers_are_unique() {
        for (i, a) in EraId::ALL.iter().enumerate() {
            for b in &EraId::ALL[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
                assert_ne!(a.slug(), b.slug());
            }
        }
    }
}
