use crate::models::{Channel, NotificationStatus};

use super::test_utils::*;

#[tokio::test]
async fn email_goes_through_email_sender_only() {
    let ctx = TestContext::new();
    let email = ctx.due_email().await;

    let status = ctx.dispatcher.process(&email).await.unwrap();

    assert_eq!(status, NotificationStatus::Sent);
    assert_eq!(ctx.email_sender.calls(), vec![email.id]);
    assert!(ctx.sms_sender.calls().is_empty());
    assert_eq!(
        ctx.storage.status_updates(),
        vec![(email.id, NotificationStatus::Sent)]
    );
}

#[tokio::test]
async fn sms_goes_through_sms_sender_only() {
    let ctx = TestContext::new();
    let sms = ctx.due_sms().await;

    let status = ctx.dispatcher.process(&sms).await.unwrap();

    assert_eq!(status, NotificationStatus::Sent);
    assert_eq!(ctx.sms_sender.calls(), vec![sms.id]);
    assert!(ctx.email_sender.calls().is_empty());
    assert_eq!(ctx.storage.status_of(sms.id).await, NotificationStatus::Sent);
}

#[tokio::test]
async fn failed_email_is_marked_failed_and_never_sent() {
    let ctx = TestContext::with_senders(
        TestSender::new(Channel::Email, SenderBehavior::Fail),
        TestSender::new(Channel::Sms, SenderBehavior::Succeed),
    );
    let email = ctx.due_email().await;

    let status = ctx.dispatcher.process(&email).await.unwrap();

    assert_eq!(status, NotificationStatus::Failed);
    assert_eq!(ctx.email_sender.calls(), vec![email.id]);
    assert_eq!(
        ctx.storage.status_updates(),
        vec![(email.id, NotificationStatus::Failed)]
    );
}

#[tokio::test]
async fn failed_sms_is_marked_failed() {
    let ctx = TestContext::with_senders(
        TestSender::new(Channel::Email, SenderBehavior::Succeed),
        TestSender::new(Channel::Sms, SenderBehavior::Fail),
    );
    let sms = ctx.due_sms().await;

    let status = ctx.dispatcher.process(&sms).await.unwrap();

    assert_eq!(status, NotificationStatus::Failed);
    assert_eq!(ctx.sms_sender.calls(), vec![sms.id]);
    assert_eq!(ctx.storage.status_of(sms.id).await, NotificationStatus::Failed);
}

#[tokio::test]
async fn misrouted_sender_rejection_counts_as_delivery_failure() {
    // Both slots hold an SMS-only sender, so the e-mail slot rejects its input.
    let sms_only = TestSender::new(Channel::Sms, SenderBehavior::Succeed);
    let ctx = TestContext::with_senders(sms_only.clone(), sms_only);
    let email = ctx.due_email().await;

    let status = ctx.dispatcher.process(&email).await.unwrap();

    assert_eq!(status, NotificationStatus::Failed);
    assert_eq!(
        ctx.storage.status_updates(),
        vec![(email.id, NotificationStatus::Failed)]
    );
}

#[tokio::test(start_paused = true)]
async fn stuck_send_times_out_as_failure() {
    let ctx = TestContext::with_senders(
        TestSender::new(Channel::Email, SenderBehavior::Hang),
        TestSender::new(Channel::Sms, SenderBehavior::Succeed),
    );
    let email = ctx.due_email().await;

    let status = ctx.dispatcher.process(&email).await.unwrap();

    assert_eq!(status, NotificationStatus::Failed);
    assert_eq!(ctx.storage.status_of(email.id).await, NotificationStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn send_finishing_within_timeout_is_sent() {
    let ctx = TestContext::with_senders(
        TestSender::new(
            Channel::Email,
            SenderBehavior::Delay(SEND_TIMEOUT - std::time::Duration::from_secs(1)),
        ),
        TestSender::new(Channel::Sms, SenderBehavior::Succeed),
    );
    let email = ctx.due_email().await;

    let status = ctx.dispatcher.process(&email).await.unwrap();

    assert_eq!(status, NotificationStatus::Sent);
}

#[tokio::test]
async fn status_write_failure_propagates_after_single_attempt() {
    let ctx = TestContext::new();
    let email = ctx.due_email().await;
    ctx.storage.fail_update_for(email.id);

    let result = ctx.dispatcher.process(&email).await;

    assert!(result.is_err());
    assert_eq!(ctx.email_sender.calls(), vec![email.id]);
    assert!(ctx.storage.status_updates().is_empty());
    assert_eq!(ctx.storage.status_of(email.id).await, NotificationStatus::Pending);
}
