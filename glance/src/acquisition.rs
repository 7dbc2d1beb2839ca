use crate::capture::ImageSource;
use crate::grounding::Grounder;
use crate::{ConfigError, GroundingError, GroundingResult};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Bounded exponential backoff: attempt `n` waits `base_delay * 2^n` before the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidRetryPolicy(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(Self {
            max_attempts,
            base_delay,
        })
    }

    /// Like [`RetryPolicy::new`] with the base delay given in (fractional) seconds.
    pub fn from_secs_f64(max_attempts: u32, base_delay_secs: f64) -> Result<Self, ConfigError> {
        let base_delay = Duration::try_from_secs_f64(base_delay_secs).map_err(|_| {
            ConfigError::InvalidRetryPolicy(format!(
                "base delay must be a finite, non-negative number of seconds (got {base_delay_secs})"
            ))
        })?;
        Self::new(max_attempts, base_delay)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay after the failed attempt with zero-based index `attempt`. Saturates at
    /// `Duration::MAX`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Blocking delay between attempts. Injected so the loop can be driven without real time.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<F> Sleeper for F
where
    F: Fn(Duration),
{
    fn sleep(&self, duration: Duration) {
        self(duration)
    }
}

/// A successful acquisition together with the screenshot it was grounded in.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub result: GroundingResult,
    pub image: PathBuf,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Repeats capture + ground until the target is found or the policy is exhausted.
pub struct AcquisitionLoop<'a, G: Grounder + ?Sized, S: Sleeper = ThreadSleeper> {
    grounder: &'a G,
    policy: RetryPolicy,
    sleeper: S,
}

impl<'a, G: Grounder + ?Sized> AcquisitionLoop<'a, G> {
    pub fn new(grounder: &'a G, policy: RetryPolicy) -> Self {
        Self {
            grounder,
            policy,
            sleeper: ThreadSleeper,
        }
    }
}

impl<'a, G: Grounder + ?Sized, S: Sleeper> AcquisitionLoop<'a, G, S> {
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> AcquisitionLoop<'a, G, T> {
        AcquisitionLoop {
            grounder: self.grounder,
            policy: self.policy,
            sleeper,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn acquire<I: ImageSource + ?Sized>(
        &self,
        source: &mut I,
        target: &str,
    ) -> Result<GroundingResult, GroundingError> {
        self.acquire_detailed(source, target).map(|a| a.result)
    }

    /// Capture a fresh image on every attempt and ground `target` in it.
    ///
    /// Returns the error of the final attempt once all attempts have failed.
    #[instrument(skip(self, source), fields(max_attempts = self.policy.max_attempts))]
    pub fn acquire_detailed<I: ImageSource + ?Sized>(
        &self,
        source: &mut I,
        target: &str,
    ) -> Result<Acquisition, GroundingError> {
        let max = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            let outcome = source
                .capture()
                .map_err(GroundingError::from)
                .and_then(|image| {
                    info!("Screenshot: {}", image.display());
                    self.grounder
                        .ground(&image, target)
                        .map(|result| (result, image))
                });

            match outcome {
                Ok((result, image)) => {
                    return Ok(Acquisition {
                        result,
                        image,
                        attempts: attempt + 1,
                    });
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed: {}", attempt + 1, max, e);
                    if attempt + 1 >= max {
                        error!("Giving up on '{}' after {} attempts", target, max);
                        return Err(e);
                    }

                    let delay = self.policy.delay_for(attempt);
                    info!("Retrying in {:.1}s...", delay.as_secs_f64());
                    self.sleeper.sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
