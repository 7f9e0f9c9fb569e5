use crate::detection::domain::detection_result::DetectionResult;
use crate::era::domain::era::Era;
use crate::era::domain::group_description::{resolve_template, subject_description};
use crate::generation::domain::image_editor::EditInstruction;
use crate::shared::constants::OUTPUT_ASPECT_RATIO;

/// Full instruction block for an era transformation.
pub fn generation_prompt(era: &Era, detection: &DetectionResult) -> String {
    let subjects = subject_description(era, detection);
    let style = resolve_template(era, detection);
    format!(
        "You are an expert VFX artist specializing in historical reconstruction.\n\
         \n\
         INPUT IMAGE: containing {subjects}.\n\
         TARGET ERA: {name}\n\
         STYLE GUIDANCE: {style}\n\
         \n\
         MANDATORY REQUIREMENTS:\n\
         1. IDENTITY LOCK: The generated image MUST feature the exact same face(s) as the input image. \
         Keep facial features, eye shape, nose shape, and mouth shape identical.\n\
         2. POSE LOCK: Keep the exact same head pose, angle, and expression as the input.\n\
         3. TRANSFORMATION: Only change the clothing, accessories, and hairstyle to match the {name}.\n\
         4. ENVIRONMENT: Place them in a realistic, depth-of-field background appropriate for the era.\n\
         5. ASPECT RATIO: The output image MUST be in vertical {OUTPUT_ASPECT_RATIO} aspect ratio (Portrait).\n\
         \n\
         Output a high-resolution, photorealistic image.",
        name = era.name,
    )
}

/// Instruction block for editing an already generated portrait.
pub fn edit_prompt(instruction: &EditInstruction) -> String {
    format!(
        "Edit this historical portrait.\n\
         \n\
         REQUESTED CHANGE: {instruction}\n\
         \n\
         MANDATORY REQUIREMENTS:\n\
         1. IDENTITY LOCK: Keep the exact same face(s), with identical facial features.\n\
         2. POSE LOCK: Keep the exact same head pose, angle, and expression.\n\
         3. Change only what the requested change asks for; keep everything else as it is.\n\
         4. ASPECT RATIO: Keep the vertical {OUTPUT_ASPECT_RATIO} aspect ratio (Portrait).\n\
         \n\
         Output a high-resolution, photorealistic image."
    )
}
