//! Shake sequencing
//!
//! Speed, start, hold and stop built on top of the command protocol. Every
//! shake ends with exactly one stop attempt, whether the hold completed, a
//! step failed or the caller's shutdown future fired.

use std::future::{self, Future};
use std::pin::{Pin, pin};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use teleshake_core::{Command, CycleTime, Response};
use teleshake_types::{EventKind, Phase};

use crate::device::Device;
use crate::error::{Error, Result};

impl Device {
    /// Set the shake speed in shakes per minute
    ///
    /// # Errors
    ///
    /// A speed below 1000 (or one whose cycle time needs more than 24 bits)
    /// is rejected before anything is written to the line.
    pub async fn try_set_speed(&mut self, speed: u32) -> Result<Response> {
        let cycle = match CycleTime::from_speed(speed) {
            Ok(cycle) => cycle,
            Err(e) => {
                self.emit(EventKind::SpeedRejected {
                    speed,
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        debug!("Setting speed {} (cycle time {})", speed, cycle);
        self.send_command(Command::SetCycleTime, Some(cycle.to_bytes()))
            .await
    }

    /// Set the shake speed; `false` on any failure
    pub async fn set_speed(&mut self, speed: u32) -> bool {
        report(self.try_set_speed(speed).await, "set speed")
    }

    pub async fn try_start(&mut self) -> Result<Response> {
        self.send_command(Command::StartDevice, None).await
    }

    /// Start the motor; `false` on any failure
    pub async fn start(&mut self) -> bool {
        report(self.try_start().await, "start device")
    }

    pub async fn try_stop(&mut self) -> Result<Response> {
        self.send_command(Command::StopDevice, None).await
    }

    /// Stop the motor; `false` on any failure
    pub async fn stop(&mut self) -> bool {
        report(self.try_stop().await, "stop device")
    }

    /// Shake at `speed` for `duration`, then stop
    ///
    /// Returns `true` only if setting the speed, starting, holding and
    /// stopping all succeeded. Stop is attempted even if an earlier step
    /// failed.
    pub async fn shake_for(&mut self, speed: u32, duration: Duration) -> bool {
        self.shake_for_until(speed, duration, future::pending())
            .await
            .is_ok()
    }

    /// Like [`Device::shake_for`], but cut the hold short when `shutdown`
    /// completes
    ///
    /// # Errors
    ///
    /// Returns the first failing step, or [`Error::Interrupted`]. A stop
    /// failure is only returned when everything before it succeeded.
    pub async fn shake_for_until<F>(
        &mut self,
        speed: u32,
        duration: Duration,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let shutdown = pin!(shutdown);
        self.shake(speed, duration, shutdown).await
    }

    /// Run every phase in order; `false` if any step failed
    pub async fn run_sequence(&mut self, phases: &[Phase]) -> bool {
        self.run_sequence_until(phases, future::pending())
            .await
            .is_ok()
    }

    /// Run every phase in order until done, failed or `shutdown` completes
    ///
    /// The first failing shake aborts the remaining phases. The device has
    /// already been stopped by then.
    pub async fn run_sequence_until<F>(&mut self, phases: &[Phase], shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = pin!(shutdown);
        let result = self.run_phases(phases, shutdown.as_mut()).await;

        match &result {
            Ok(()) => self.emit(EventKind::SequenceCompleted),
            Err(e) => self.emit(EventKind::SequenceAborted {
                reason: e.to_string(),
            }),
        }
        result
    }

    async fn run_phases<F>(&mut self, phases: &[Phase], mut shutdown: Pin<&mut F>) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        for (index, phase) in phases.iter().enumerate() {
            phase.validate()?;
            self.emit(EventKind::PhaseStarted {
                index,
                name: phase.name.clone(),
                speed: phase.speed,
                duration: phase.duration,
                repetitions: phase.repetitions,
            });

            for repetition in 1..=phase.repetitions {
                self.emit(EventKind::RepetitionStarted {
                    phase: index,
                    repetition,
                    of: phase.repetitions,
                });
                self.shake(phase.speed, phase.duration, shutdown.as_mut())
                    .await?;

                if repetition < phase.repetitions {
                    self.pause(phase.pause_between, shutdown.as_mut()).await?;
                }
            }

            self.emit(EventKind::PhaseCompleted { index });
            self.pause(phase.pause_after, shutdown.as_mut()).await?;
        }
        Ok(())
    }

    async fn shake<F>(&mut self, speed: u32, duration: Duration, shutdown: Pin<&mut F>) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let outcome = self.drive(speed, duration, shutdown).await;

        let stopped = self.try_stop().await;
        if let Err(e) = &stopped {
            warn!("Failed to stop device: {}", e);
        }

        outcome.and(stopped.map(drop))
    }

    async fn drive<F>(&mut self, speed: u32, duration: Duration, shutdown: Pin<&mut F>) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.try_set_speed(speed).await?;
        self.try_start().await?;

        self.emit(EventKind::Hold { duration });
        self.hold(duration, shutdown).await
    }

    async fn pause<F>(&mut self, duration: Duration, shutdown: Pin<&mut F>) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if duration.is_zero() {
            return Ok(());
        }
        self.emit(EventKind::Pause { duration });
        self.hold(duration, shutdown).await
    }

    async fn hold<F>(&mut self, duration: Duration, shutdown: Pin<&mut F>) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = sleep(duration) => Ok(()),
            _ = shutdown => {
                self.emit(EventKind::Interrupted);
                Err(Error::Interrupted)
            }
        }
    }
}

fn report(result: Result<Response>, action: &str) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            warn!("Failed to {}: {}", action, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report() {
        assert!(!report(Err(Error::NotConnected), "start device"));
        assert!(!report(Err(Error::Interrupted), "stop device"));
    }
}
