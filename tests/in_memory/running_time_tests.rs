//! Running-time aggregation over transitions driven through the service.

use super::helpers::{ManualClock, SteppedService, create_named, stepped};
use mockable::Clock;
use readytodo::task::domain::TaskState;
use rstest::rstest;
use std::sync::Arc;


#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn paused_intervals_are_excluded(stepped: (SteppedService, Arc<ManualClock>)) {
    let (service, clock) = stepped;
    let task = create_named(&service, "measured", &[]).await.expect("task");

    clock.advance(5);
    service
        .transition(task.id(), TaskState::Running)
        .await
        .expect("start");
    clock.advance(90);
    service
        .transition(task.id(), TaskState::Waiting)
        .await
        .expect("pause");
    clock.advance(600);
    service
        .transition(task.id(), TaskState::Running)
        .await
        .expect("resume");
    clock.advance(30);
    service
        .transition(task.id(), TaskState::Done)
        .await
        .expect("finish");
    clock.advance(1_000);

    let total = service
        .total_running_seconds(task.id())
        .await
        .expect("aggregate");
    assert_eq!(total, 120);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn open_interval_grows_with_the_clock(stepped: (SteppedService, Arc<ManualClock>)) {
    let (service, clock) = stepped;
    let task = create_named(&service, "open", &[]).await.expect("task");
    service
        .transition(task.id(), TaskState::Running)
        .await
        .expect("start");

    clock.advance(10);
    let first = service
        .total_running_seconds(task.id())
        .await
        .expect("first reading");
    clock.advance(15);
    let second = service
        .total_running_seconds(task.id())
        .await
        .expect("second reading");

    assert_eq!(first, 10);
    assert_eq!(second, 25);
    assert!(second > first);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn never_started_task_has_no_running_time(stepped: (SteppedService, Arc<ManualClock>)) {
    let (service, clock) = stepped;
    let task = create_named(&service, "idle", &[]).await.expect("task");
    clock.advance(3_600);

    assert_eq!(
        service
            .total_running_seconds(task.id())
            .await
            .expect("aggregate"),
        0
    );
    let history = service.state_history(task.id()).await.expect("history");
    assert_eq!(
        history.first().map(|event| event.created_at()),
        Some(task.created_at())
    );
    assert!(clock.utc() > task.created_at());
}
