use catalog_core::notify::{
    schedule_welcome_notification, DeferredJob, SchedulerError, TaskScheduler,
    WelcomeNotification, WELCOME_FUNCTION_NAME,
};
use catalog_core::NotifyConfig;
use std::cell::RefCell;
use std::time::Duration;

#[derive(Default)]
struct RecordingScheduler {
    jobs: RefCell<Vec<DeferredJob<WelcomeNotification>>>,
}

impl TaskScheduler<WelcomeNotification> for RecordingScheduler {
    fn schedule(&self, job: DeferredJob<WelcomeNotification>) -> Result<(), SchedulerError> {
        self.jobs.borrow_mut().push(job);
        Ok(())
    }
}

struct RejectingScheduler;

impl TaskScheduler<WelcomeNotification> for RejectingScheduler {
    fn schedule(&self, _job: DeferredJob<WelcomeNotification>) -> Result<(), SchedulerError> {
        Err(SchedulerError::Rejected("queue full".to_string()))
    }
}

fn notification() -> WelcomeNotification {
    WelcomeNotification {
        recipient_id: "7f0c2a54".to_string(),
        username: "instructor.one".to_string(),
        display_name: "Teacher One".to_string(),
        contact_address: "instructor.one@example.test".to_string(),
        reset_token: "reset-abc".to_string(),
    }
}

#[test]
fn welcome_job_carries_configured_retry_policy() {
    let scheduler = RecordingScheduler::default();
    schedule_welcome_notification(&scheduler, &NotifyConfig::default(), notification()).unwrap();

    let jobs = scheduler.jobs.borrow();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.function_name, WELCOME_FUNCTION_NAME);
    assert_eq!(job.delay(), Duration::from_secs(10));
    assert_eq!(job.retries, 3);
    assert_eq!(
        job.retry_intervals(),
        vec![
            Duration::from_secs(60),
            Duration::from_secs(300),
            Duration::from_secs(900)
        ]
    );
    assert_eq!(job.payload, notification());
}

#[test]
fn custom_policy_is_passed_through() {
    let scheduler = RecordingScheduler::default();
    let config = NotifyConfig {
        delay_secs: 1,
        retries: 1,
        retry_intervals_secs: vec![5],
    };
    schedule_welcome_notification(&scheduler, &config, notification()).unwrap();

    let jobs = scheduler.jobs.borrow();
    assert_eq!(jobs[0].delay_secs, 1);
    assert_eq!(jobs[0].retry_intervals_secs, vec![5]);
}

#[test]
fn job_serializes_payload_fields_to_json() {
    let scheduler = RecordingScheduler::default();
    schedule_welcome_notification(&scheduler, &NotifyConfig::default(), notification()).unwrap();

    let json = scheduler.jobs.borrow()[0].to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["function_name"], WELCOME_FUNCTION_NAME);
    assert_eq!(value["retry_intervals_secs"], serde_json::json!([60, 300, 900]));
    assert_eq!(value["payload"]["username"], "instructor.one");
    assert_eq!(value["payload"]["reset_token"], "reset-abc");
}

#[test]
fn scheduler_rejection_is_returned() {
    let err = schedule_welcome_notification(&RejectingScheduler, &NotifyConfig::default(), notification())
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Rejected(message) if message == "queue full"));
}

#[test]
fn missing_contact_address_is_never_scheduled() {
    let scheduler = RecordingScheduler::default();
    let mut payload = notification();
    payload.contact_address = String::new();

    let err = schedule_welcome_notification(&scheduler, &NotifyConfig::default(), payload)
        .unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidPayload(_)));
    assert!(scheduler.jobs.borrow().is_empty());
}
