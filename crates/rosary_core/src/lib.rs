mod session;
pub mod steps;

pub use session::{
    PlaybackStatus, PrayerSessionController, SessionError, SessionEvent, SessionSnapshot,
    StepOutcome,
};
pub use steps::{build_steps, PrayerStep, StepKind, STEPS_PER_MEDITATION};
