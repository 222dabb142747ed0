//! Shake phase definitions

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One block of identical shake cycles
///
/// The block runs `repetitions` shakes at `speed` for `duration` each, with
/// `pause_between` between repetitions and `pause_after` once the block ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub name: String,
    /// Shakes per minute
    pub speed: u32,
    pub duration: Duration,
    pub repetitions: u32,
    pub pause_between: Duration,
    pub pause_after: Duration,
}

impl Phase {
    /// Single shake with no pauses
    pub fn new(speed: u32, duration: Duration) -> Self {
        Self {
            name: format!("{speed} spm"),
            speed,
            duration,
            repetitions: 1,
            pause_between: Duration::ZERO,
            pause_after: Duration::ZERO,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn with_pause_between(mut self, pause: Duration) -> Self {
        self.pause_between = pause;
        self
    }

    pub fn with_pause_after(mut self, pause: Duration) -> Self {
        self.pause_after = pause;
        self
    }

    /// Wall-clock time of the phase, pauses included (saturating)
    pub fn total_duration(&self) -> Duration {
        let reps = self.repetitions;
        self.duration
            .saturating_mul(reps)
            .saturating_add(self.pause_between.saturating_mul(reps.saturating_sub(1)))
            .saturating_add(self.pause_after)
    }

    pub fn validate(&self) -> Result<()> {
        if self.repetitions == 0 {
            return Err(Error::Validation(format!(
                "phase '{}' must repeat at least once",
                self.name
            )));
        }
        Ok(())
    }

    /// Standard mixing program: ten short low-speed bursts, then one long
    /// high-speed burst
    pub fn default_program() -> Vec<Phase> {
        vec![
            Phase::new(1200, Duration::from_secs(5))
                .with_name("burst")
                .with_repetitions(10)
                .with_pause_between(Duration::from_secs(2))
                .with_pause_after(Duration::from_secs(5)),
            Phase::new(1300, Duration::from_secs(30)).with_name("mix"),
        ]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: speed {}, {:?} x {}",
            self.name, self.speed, self.duration, self.repetitions
        )
    }
}

/// Phase as written in a configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PhaseSpec {
    name: Option<String>,
    speed: u32,
    duration_secs: f64,
    #[serde(default = "one")]
    repetitions: u32,
    #[serde(default)]
    pause_between_secs: f64,
    #[serde(default)]
    pause_after_secs: f64,
}

fn one() -> u32 {
    1
}

fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| Error::Validation(format!("{field} = {value}: {e}")))
}

impl TryFrom<PhaseSpec> for Phase {
    type Error = Error;

    fn try_from(spec: PhaseSpec) -> Result<Self> {
        let mut phase = Phase::new(spec.speed, seconds("duration_secs", spec.duration_secs)?)
            .with_repetitions(spec.repetitions)
            .with_pause_between(seconds("pause_between_secs", spec.pause_between_secs)?)
            .with_pause_after(seconds("pause_after_secs", spec.pause_after_secs)?);
        if let Some(name) = spec.name {
            phase.name = name;
        }
        phase.validate()?;
        Ok(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_program() {
        let program = Phase::default_program();

        assert_eq!(program.len(), 2);
        assert_eq!(program[0].speed, 1200);
        assert_eq!(program[0].repetitions, 10);
        assert_eq!(program[1].speed, 1300);
        assert_eq!(program[1].duration, Duration::from_secs(30));
    }

    #[test]
    fn test_total_duration() {
        // 10 x 5s + 9 x 2s + 5s
        assert_eq!(Phase::default_program()[0].total_duration(), Duration::from_secs(73));
    }

    #[test]
    fn test_total_duration_saturates() {
        let phase = Phase::new(1200, Duration::from_secs(u64::MAX / 2))
            .with_repetitions(3)
            .with_pause_after(Duration::from_secs(1));
        assert_eq!(phase.total_duration(), Duration::MAX);
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        let phase = Phase::new(1200, Duration::from_secs(1)).with_repetitions(0);
        assert!(phase.validate().is_err());
    }

    #[test]
    fn test_negative_duration_rejected() {
        let spec = PhaseSpec {
            name: None,
            speed: 1200,
            duration_secs: -1.0,
            repetitions: 1,
            pause_between_secs: 0.0,
            pause_after_secs: 0.0,
        };
        assert!(matches!(Phase::try_from(spec), Err(Error::Validation(_))));
    }
}
