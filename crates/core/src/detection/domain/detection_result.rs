use std::fmt;

use crate::detection::domain::gender_classifier::Gender;

/// Subject counts found in one captured still.
///
/// Built once per capture and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetectionResult {
    pub male_count: u32,
    pub female_count: u32,
    pub total_people: u32,
}

impl DetectionResult {
    pub fn new(male_count: u32, female_count: u32, total_people: u32) -> Self {
        Self {
            male_count,
            female_count,
            total_people: total_people.max(male_count.saturating_add(female_count)),
        }
    }

    /// Result reported when nobody was found or detection could not run.
    pub fn none() -> Self {
        Self::default()
    }

    /// Tallies per-face gender estimates. Faces without an estimate count
    /// toward the total only.
    pub fn from_genders<I>(genders: I) -> Self
    where
        I: IntoIterator<Item = Option<Gender>>,
    {
        let mut result = Self::none();
        for gender in genders {
            result.total_people += 1;
            match gender {
                Some(Gender::Male) => result.male_count += 1,
                Some(Gender::Female) => result.female_count += 1,
                None => {}
            }
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.total_people == 0
    }
}

impl fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Detected: Male: {}, Female: {}",
            self.male_count, self.female_count
        )
    }
}
