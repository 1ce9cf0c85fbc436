//! Deferred welcome-notification jobs handed to an external scheduler.
//!
//! # Responsibility
//! - Define the job payload and delivery policy a scheduler receives.
//! - Build welcome jobs from configured policy and hand them off.
//!
//! # Invariants
//! - The core never executes or retries a job; the scheduler owns both.
//! - Log events never include the contact address or the reset token.

use crate::config::NotifyConfig;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Scheduler function that delivers the welcome message.
pub const WELCOME_FUNCTION_NAME: &str = "send_welcome_notification";

/// Recipient data the welcome message is rendered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeNotification {
    pub recipient_id: String,
    pub username: String,
    pub display_name: String,
    pub contact_address: String,
    /// One-time credential-reset token embedded in the message.
    pub reset_token: String,
}

/// A job description plus its delivery policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredJob<P> {
    pub function_name: String,
    pub delay_secs: u64,
    pub retries: u32,
    /// Backoff before each retry, one entry per retry.
    pub retry_intervals_secs: Vec<u64>,
    pub description: String,
    pub payload: P,
}

impl<P> DeferredJob<P> {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn retry_intervals(&self) -> Vec<Duration> {
        self.retry_intervals_secs
            .iter()
            .copied()
            .map(Duration::from_secs)
            .collect()
    }
}

impl<P: Serialize> DeferredJob<P> {
    /// JSON form of the whole job, as stored by a scheduler.
    pub fn to_json(&self) -> Result<String, SchedulerError> {
        serde_json::to_string(self).map_err(SchedulerError::Encode)
    }
}

#[derive(Debug)]
pub enum SchedulerError {
    /// The payload is missing data the message needs.
    InvalidPayload(String),
    Encode(serde_json::Error),
    /// The scheduler refused the job.
    Rejected(String),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPayload(message) => write!(f, "invalid notification payload: {message}"),
            Self::Encode(err) => write!(f, "failed to encode deferred job: {err}"),
            Self::Rejected(message) => write!(f, "scheduler rejected job: {message}"),
        }
    }
}

impl Error for SchedulerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::InvalidPayload(_) | Self::Rejected(_) => None,
        }
    }
}

/// External engine that stores and later runs deferred jobs.
pub trait TaskScheduler<P> {
    fn schedule(&self, job: DeferredJob<P>) -> Result<(), SchedulerError>;
}

/// Builds the welcome job from `config` and hands it to `scheduler`.
pub fn schedule_welcome_notification<S>(
    scheduler: &S,
    config: &NotifyConfig,
    notification: WelcomeNotification,
) -> Result<(), SchedulerError>
where
    S: TaskScheduler<WelcomeNotification> + ?Sized,
{
    let job = welcome_job(config, notification)?;
    let recipient_id = job.payload.recipient_id.clone();
    let (delay_secs, retries) = (job.delay_secs, job.retries);

    match scheduler.schedule(job) {
        Ok(()) => {
            info!(
                "event=notify_schedule module=notify status=ok function={WELCOME_FUNCTION_NAME} recipient_id={recipient_id} delay_secs={delay_secs} retries={retries}"
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=notify_schedule module=notify status=error function={WELCOME_FUNCTION_NAME} recipient_id={recipient_id} error={err}"
            );
            Err(err)
        }
    }
}

fn welcome_job(
    config: &NotifyConfig,
    notification: WelcomeNotification,
) -> Result<DeferredJob<WelcomeNotification>, SchedulerError> {
    for (field, value) in [
        ("recipient_id", &notification.recipient_id),
        ("contact_address", &notification.contact_address),
        ("reset_token", &notification.reset_token),
    ] {
        if value.trim().is_empty() {
            return Err(SchedulerError::InvalidPayload(format!(
                "{field} must not be empty"
            )));
        }
    }

    Ok(DeferredJob {
        function_name: WELCOME_FUNCTION_NAME.to_string(),
        delay_secs: config.delay_secs,
        retries: config.retries,
        retry_intervals_secs: config.retry_intervals_secs.clone(),
        description: format!("Send welcome notification to {}", notification.contact_address),
        payload: notification,
    })
}
