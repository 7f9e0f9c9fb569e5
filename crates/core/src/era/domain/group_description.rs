use crate::detection::domain::detection_result::DetectionResult;
use crate::era::domain::era::{Era, GROUP_PLACEHOLDER};

/// Phrase used when nobody could be described by gender.
pub const GENERIC_GROUP: &str = "the people";
pub const GENERIC_SINGLE: &str = "the person";

/// Describes the detected group by gender: "1 male", "2 males and 1 female".
///
/// Falls back to "the people" when neither count is positive.
pub fn group_description(detection: &DetectionResult) -> String {
    let mut parts = Vec::with_capacity(2);
    if detection.male_count > 0 {
        parts.push(counted(detection.male_count, "male"));
    }
    if detection.female_count > 0 {
        parts.push(counted(detection.female_count, "female"));
    }
    if parts.is_empty() {
        GENERIC_GROUP.to_string()
    } else {
        parts.join(" and ")
    }
}

/// "the person" for exactly one subject, "the people" otherwise.
pub fn generic_subject_phrase(total_people: u32) -> &'static str {
    if total_people == 1 {
        GENERIC_SINGLE
    } else {
        GENERIC_GROUP
    }
}

/// How the prompt refers to the subjects of the input image.
///
/// Templates carrying the group placeholder get the gendered description;
/// others only need the grammatical number taken from the total count.
pub fn subject_description(era: &Era, detection: &DetectionResult) -> String {
    if era.has_group_placeholder() {
        group_description(detection)
    } else {
        generic_subject_phrase(detection.total_people).to_string()
    }
}

/// The era's style guidance with the group placeholder substituted.
pub fn resolve_template(era: &Era, detection: &DetectionResult) -> String {
    if era.has_group_placeholder() {
        era.prompt_template
            .replace(GROUP_PLACEHOLDER, &group_description(detection))
    } else {
        era.prompt_template.to_string()
    }
}

fn counted(count: u32, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
