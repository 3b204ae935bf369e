//! In-memory integration tests for task lifecycle operations.

use super::helpers::{OWNER, WallClockService, create_named, service};
use readytodo::task::{
    domain::{OwnerId, TaskId, TaskState},
    ports::TaskRepositoryError,
    services::{CreateTaskRequest, TaskLifecycleError},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_task_round_trips_through_lookup(service: WallClockService) {
    let request = CreateTaskRequest::new(OWNER, "Write release notes")
        .with_description("Summarise the 0.4 changes")
        .with_related_url("https://example.com/releases/0.4");

    let created = service
        .create_task(request)
        .await
        .expect("task creation should succeed");
    let found = service
        .get_task(created.id())
        .await
        .expect("lookup should succeed");

    assert_eq!(found, Some(created.clone()));
    assert_eq!(created.description(), "Summarise the 0.4 changes");
    assert_eq!(
        created.related_url(),
        Some("https://example.com/releases/0.4")
    );
    assert_eq!(
        service.current_state(created.id()).await.expect("state"),
        TaskState::Waiting
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn long_names_are_accepted_without_truncation(service: WallClockService) {
    let name = "n".repeat(300);
    let created = service
        .create_task(CreateTaskRequest::new(OWNER, name.as_str()))
        .await
        .expect("a 300-character name should be accepted");

    let found = service
        .get_task(created.id())
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(found.name().as_str(), name);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookup_of_unknown_task_returns_none(service: WallClockService) {
    let found = service
        .get_task(TaskId::new())
        .await
        .expect("lookup should succeed");
    assert!(found.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn owner_listing_excludes_other_owners(service: WallClockService) {
    let mine = create_named(&service, "mine", &[])
        .await
        .expect("create own task");
    service
        .create_task(CreateTaskRequest::new("someone-else", "theirs"))
        .await
        .expect("create foreign task");

    let owner = OwnerId::new(OWNER).expect("valid owner");
    let listed = service
        .tasks_for_owner(&owner)
        .await
        .expect("listing should succeed");

    assert_eq!(listed, vec![mine.clone()]);
    assert!(mine.is_owned_by(&owner));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_parent_is_rejected(service: WallClockService) {
    let missing = TaskId::new();
    let result = service
        .create_task(CreateTaskRequest::new(OWNER, "orphan").with_parents([missing]))
        .await;

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Repository(TaskRepositoryError::UnknownParent(id))) if id == missing
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn child_becomes_ready_once_every_parent_is_done(service: WallClockService) {
    let design = create_named(&service, "design", &[]).await.expect("design");
    let review = create_named(&service, "review", &[]).await.expect("review");
    let build = create_named(&service, "build", &[&design, &review])
        .await
        .expect("build");

    assert!(!service.is_ready(build.id()).await.expect("readiness"));

    let finished = service
        .transition(design.id(), TaskState::Done)
        .await
        .expect("finish design");
    assert!(finished.accepted);
    assert!(!service.is_ready(build.id()).await.expect("readiness"));

    service
        .transition(review.id(), TaskState::Running)
        .await
        .expect("start review");
    service
        .transition(review.id(), TaskState::Done)
        .await
        .expect("finish review");
    assert!(service.is_ready(build.id()).await.expect("readiness"));

    let started = service
        .transition(build.id(), TaskState::Running)
        .await
        .expect("start build");
    assert!(started.accepted);
    assert_eq!(started.state, TaskState::Running);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn parent_and_child_views_carry_state_and_readiness(service: WallClockService) {
    let parent = create_named(&service, "parent", &[]).await.expect("parent");
    let child = create_named(&service, "child", &[&parent])
        .await
        .expect("child");
    service
        .transition(parent.id(), TaskState::Running)
        .await
        .expect("start parent");

    let parents = service.parents(child.id()).await.expect("parents");
    let children = service.children(parent.id()).await.expect("children");

    assert_eq!(parents.len(), 1);
    let parent_view = parents.first().expect("parent view");
    assert_eq!(parent_view.task.id(), parent.id());
    assert_eq!(parent_view.state, TaskState::Running);
    assert!(!parent_view.ready);

    assert_eq!(children.len(), 1);
    let child_view = children.first().expect("child view");
    assert_eq!(child_view.task.id(), child.id());
    assert_eq!(child_view.state, TaskState::Waiting);
    assert!(!child_view.ready);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn paused_task_can_resume_and_history_records_each_step(service: WallClockService) {
    let task = create_named(&service, "pausable", &[]).await.expect("task");
    for target in [TaskState::Running, TaskState::Waiting, TaskState::Running, TaskState::Done] {
        let outcome = service
            .transition(task.id(), target)
            .await
            .expect("transition should not error");
        assert!(outcome.accepted, "transition to {target} was rejected");
    }

    let history = service.state_history(task.id()).await.expect("history");
    let states: Vec<TaskState> = history.iter().map(|event| event.state()).collect();
    let sequences: Vec<u64> = history.iter().map(|event| event.sequence().value()).collect();

    assert_eq!(
        states,
        vec![
            TaskState::Waiting,
            TaskState::Running,
            TaskState::Waiting,
            TaskState::Running,
            TaskState::Done,
        ]
    );
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transition_on_unknown_task_is_not_found(service: WallClockService) {
    let missing = TaskId::new();
    let result = service.transition(missing, TaskState::Running).await;
    assert!(matches!(
        result,
        Err(TaskLifecycleError::NotFound(id)) if id == missing
    ));
}
