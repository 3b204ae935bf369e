//! Given steps for task dependency BDD scenarios.

use super::world::{TaskDependencyWorld, run_async};
use eyre::WrapErr;
use readytodo::task::{domain::TaskState, services::CreateTaskRequest};
use rstest_bdd_macros::given;

#[given(r#"a task named "{name}""#)]
fn task_named(world: &mut TaskDependencyWorld, name: String) -> Result<(), eyre::Report> {
    let created = run_async(
        world
            .service
            .create_task(CreateTaskRequest::new("scenario-owner", name.clone())),
    )
    .wrap_err("create task for scenario")?;
    world.tasks.insert(name, created.id());
    Ok(())
}

#[given(r#"a child task "{name}" of "{parent}""#)]
fn child_task(
    world: &mut TaskDependencyWorld,
    name: String,
    parent: String,
) -> Result<(), eyre::Report> {
    let parent_id = world.task_id(&parent)?;
    let request =
        CreateTaskRequest::new("scenario-owner", name.clone()).with_parents([parent_id]);
    let created =
        run_async(world.service.create_task(request)).wrap_err("create child task for scenario")?;
    world.tasks.insert(name, created.id());
    Ok(())
}

#[given(r#"task "{name}" has been moved to "{state}""#)]
fn task_has_been_moved(
    world: &mut TaskDependencyWorld,
    name: String,
    state: String,
) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&name)?;
    let target = TaskState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid state in scenario: {err}"))?;
    let outcome = run_async(world.service.transition(task_id, target))
        .wrap_err("transition task in scenario setup")?;
    eyre::ensure!(outcome.accepted, "setup transition of {name} to {state} was rejected");
    Ok(())
}
