use serde::{Deserialize, Serialize};
use shared::mysteries::Meditation;

pub const HAIL_MARY_REPEATS: usize = 10;
/// Announcement, Our Father, ten Hail Marys, Glory Be, Fatima prayer.
pub const STEPS_PER_MEDITATION: usize = HAIL_MARY_REPEATS + 4;

pub const OUR_FATHER: &str = "Our Father, who art in heaven, hallowed be thy name; \
thy kingdom come, thy will be done on earth as it is in heaven. \
Give us this day our daily bread, and forgive us our trespasses, \
as we forgive those who trespass against us; \
and lead us not into temptation, but deliver us from evil. Amen.";

pub const HAIL_MARY: &str = "Hail Mary, full of grace, the Lord is with thee. \
Blessed art thou among women, and blessed is the fruit of thy womb, Jesus. \
Holy Mary, Mother of God, pray for us sinners, now and at the hour of our death. Amen.";

pub const GLORY_BE: &str = "Glory be to the Father, and to the Son, and to the Holy Spirit. \
As it was in the beginning, is now, and ever shall be, world without end. Amen.";

pub const FATIMA_PRAYER: &str = "O my Jesus, forgive us our sins, save us from the fires of hell; \
lead all souls to heaven, especially those in most need of thy mercy.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    Announcement,
    FixedPrayer,
    RepeatedPrayer,
    OptionalPrayer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrayerStep {
    pub ordinal: usize,
    pub title: String,
    pub text: String,
    pub kind: StepKind,
    pub badge: String,
    pub optional: bool,
}

/// Flattens one meditation into its fourteen prayer steps.
pub fn build_steps(meditation: &Meditation) -> Vec<PrayerStep> {
    let mut steps = Vec::with_capacity(STEPS_PER_MEDITATION);

    let announcement = match meditation.scripture {
        Some(reference) => format!("{} ({reference})", meditation.description),
        None => meditation.description.to_string(),
    };
    push_step(
        &mut steps,
        meditation.title,
        announcement,
        StepKind::Announcement,
        format!("Mystery {}", meditation.id.ordinal + 1),
    );
    push_step(
        &mut steps,
        "Our Father",
        OUR_FATHER,
        StepKind::FixedPrayer,
        "Our Father",
    );
    for repeat in 1..=HAIL_MARY_REPEATS {
        push_step(
            &mut steps,
            format!("Hail Mary {repeat}"),
            HAIL_MARY,
            StepKind::RepeatedPrayer,
            format!("{repeat}/{HAIL_MARY_REPEATS}"),
        );
    }
    push_step(
        &mut steps,
        "Glory Be",
        GLORY_BE,
        StepKind::FixedPrayer,
        "Glory Be",
    );
    push_step(
        &mut steps,
        "Fatima Prayer",
        FATIMA_PRAYER,
        StepKind::OptionalPrayer,
        "Optional",
    );

    steps
}

fn push_step(
    steps: &mut Vec<PrayerStep>,
    title: impl Into<String>,
    text: impl Into<String>,
    kind: StepKind,
    badge: impl Into<String>,
) {
    steps.push(PrayerStep {
        ordinal: steps.len(),
        title: title.into(),
        text: text.into(),
        kind,
        badge: badge.into(),
        optional: kind == StepKind::OptionalPrayer,
    });
}

#[cfg(test)]
#[path = "tests/steps_tests.rs"]
mod tests;
