use rand::seq::SliceRandom;
use rand::Rng;

use crate::era::domain::era::{Era, EraId};

static OLD_KINGDOM: Era = Era {
    id: EraId::OldEgypt,
    name: "Old Kingdom",
    description: "Journey back to the time of Pharaohs and Pyramids (c. 2686-2181 BC).",
    preview_image: "Old-Egypt-Preview.jpg",
    prompt_template: "A hyper-realistic, high-resolution portrait-oriented photo of \
        {{GROUP_DESCRIPTION}} standing together, wearing ancient Egyptian pharaonic outfits. \
        Each person's appearance must accurately match their reference photo, fully preserving \
        identity, natural skin tone, ethnic features, gender, age, proportions, and expression. \
        All individuals are fully dressed in regal pharaonic costumes with elegant gold and deep \
        turquoise details and subtle hieroglyphic patterns. Lighting is warm and cinematic with \
        realistic shadows and natural depth of field. The final image should look like a modern \
        professional photoshoot with a strong pharaonic theme. No added accessories, no \
        distortion, and no cartoon style; everything must appear natural, cohesive, and true to \
        the original individuals.",
    fallback_fact: Some(
        "The Great Pyramid of Giza was the tallest man-made structure on Earth for almost 4,000 years.",
    ),
};

static COPTIC_ERA: Era = Era {
    id: EraId::CopticEgypt,
    name: "Coptic Era",
    description: "Experience the unique art and spirituality of late antique Egypt \
        (c. 3rd-7th century AD).",
    preview_image: "Coptic-Preview.jpg",
    prompt_template: "A hyper-realistic, high-resolution portrait-oriented photo of \
        {{GROUP_DESCRIPTION}} standing together, wearing traditional Coptic Egyptian clothing \
        from late antiquity. Each person's appearance must accurately match their reference \
        photo, fully preserving identity, natural skin tone, ethnic features, gender, age, \
        proportions, and expression. All individuals are dressed in authentic Coptic garments, \
        including woven linen tunics (kolobion) with tapestry-woven decorative clavi and \
        orbiculi, geometric and floral motifs, earthy beige and natural linen tones, and \
        hand-embroidered borders. Optional shawls, mantles, or veils may appear depending on \
        gender, but must remain historically accurate to early Christian Egypt. Textures should \
        show real linen weave and natural dyes. Lighting is warm and soft with realistic shadows \
        and natural depth of field, creating the look of a modern professional photoshoot with a \
        strong ancient Coptic Egyptian theme. No added accessories outside historical context, \
        no distortion, and no cartoon style; everything must appear natural, cohesive, and true \
        to the original individuals.",
    fallback_fact: Some(
        "Coptic, the last stage of the Egyptian language, is written with the Greek alphabet plus a few letters borrowed from Demotic.",
    ),
};

static ISLAMIC_GOLDEN_AGE: Era = Era {
    id: EraId::IslamicEgypt,
    name: "Islamic Golden Age",
    description: "Step into the vibrant culture of medieval Cairo (c. 7th-16th century AD).",
    preview_image: "Islamic-Preview.jpg",
    prompt_template: "A hyper-realistic, high-resolution portrait-oriented photo of \
        {{GROUP_DESCRIPTION}} standing together, wearing traditional clothing from early Islamic \
        Egypt. Each person's appearance must accurately match their reference photo, fully \
        preserving identity, natural skin tone, ethnic features, gender, age, proportions, and \
        expression. All individuals are dressed in historically accurate garments such as \
        loose-fitting linen or cotton tunics (qamis), decorated wool or silk outer robes, \
        embroidered hems, and woven geometric or vegetal motifs common in early Islamic Egyptian \
        textiles. Clothing may include long-sleeved tunics, layered cloaks, turbans, veils, \
        simple headscarves, or decorative tiraz bands with Kufic-inspired ornamental patterns, \
        depending on gender and social context, all staying authentic to early Islamic Egypt. \
        Colors should reflect natural dyes: soft whites, creams, deep blues, earthy reds, greens, \
        and muted tones. Lighting is warm and cinematic with realistic shadows and natural depth \
        of field, creating the look of a modern professional photoshoot with an early Islamic \
        Egyptian cultural theme. No added accessories outside historical context, no distortion, \
        and no cartoon style; everything must appear natural, cohesive, and true to the original \
        individuals.",
    fallback_fact: Some(
        "Al-Azhar in Cairo, founded in 970 AD, is one of the oldest continuously operating universities in the world.",
    ),
};

static ERAS: [&Era; 3] = [&OLD_KINGDOM, &COPTIC_ERA, &ISLAMIC_GOLDEN_AGE];

const OLD_KINGDOM_FACTS: &[&str] = &[
    "The Great Pyramid of Giza was the tallest man-made structure on Earth for almost 4,000 years.",
    "Pyramid builders were paid laborers who lived in nearby workers' towns, not slaves.",
    "Old Kingdom Egyptians wore wigs and kohl eyeliner, which also protected their eyes from the sun.",
    "The Step Pyramid of Djoser, designed by Imhotep, is the oldest large-scale cut-stone building.",
];

const COPTIC_FACTS: &[&str] = &[
    "Coptic, the last stage of the Egyptian language, is written with the Greek alphabet plus a few letters borrowed from Demotic.",
    "Coptic weavers were famous for tapestry-woven roundels called orbiculi sewn onto linen tunics.",
    "Christian monasticism began in the Egyptian desert, with figures such as Saint Anthony.",
    "The Fayum mummy portraits of late antique Egypt are among the earliest realistic painted portraits.",
];

const ISLAMIC_FACTS: &[&str] = &[
    "Al-Azhar in Cairo, founded in 970 AD, is one of the oldest continuously operating universities in the world.",
    "Tiraz bands, embroidered with inscriptions, were woven in state workshops and given as marks of honor.",
    "The Fatimids founded the city of al-Qahira, today's Cairo, in 969 AD.",
    "Ibn al-Haytham worked in Cairo on the optics that laid foundations for the camera obscura.",
];

/// The fixed, ordered registry of selectable eras.
///
/// Loaded once; nothing in it ever changes during a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct EraCatalog;

impl EraCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn eras(&self) -> impl Iterator<Item = &'static Era> {
        ERAS.iter().copied()
    }

    pub fn get(&self, id: EraId) -> &'static Era {
        match id {
            EraId::OldEgypt => &OLD_KINGDOM,
            EraId::CopticEgypt => &COPTIC_ERA,
            EraId::IslamicEgypt => &ISLAMIC_GOLDEN_AGE,
        }
    }

    /// Trivia shown next to a finished portrait.
    pub fn facts(&self, id: EraId) -> &'static [&'static str] {
        match id {
            EraId::OldEgypt => OLD_KINGDOM_FACTS,
            EraId::CopticEgypt => COPTIC_FACTS,
            EraId::IslamicEgypt => ISLAMIC_FACTS,
        }
    }

    pub fn random_fact<R: Rng + ?Sized>(&self, era: &Era, rng: &mut R) -> Option<&'static str> {
        pick_fact(self.facts(era.id), era.fallback_fact, rng)
    }
}

/// A random entry of `facts`, or `fallback` when the list is empty.
pub fn pick_fact<R: Rng + ?Sized>(
    facts: &[&'static str],
    fallback: Option<&'static str>,
    rng: &mut R,
) -> Option<&'static str> {
    facts.choose(rng).copied().or(fallback)
}
