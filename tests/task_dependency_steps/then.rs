//! Then steps for task dependency BDD scenarios.

use super::world::{TaskDependencyWorld, run_async};
use eyre::WrapErr;
use readytodo::task::domain::TaskState;
use rstest_bdd_macros::then;

fn last_accepted(world: &TaskDependencyWorld) -> Result<bool, eyre::Report> {
    world
        .last_outcome
        .map(|outcome| outcome.accepted)
        .ok_or_else(|| eyre::eyre!("missing transition outcome"))
}

#[then("the last transition is accepted")]
fn last_transition_accepted(world: &TaskDependencyWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(last_accepted(world)?, "expected the transition to be accepted");
    Ok(())
}

#[then("the last transition is rejected")]
fn last_transition_rejected(world: &TaskDependencyWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(!last_accepted(world)?, "expected the transition to be rejected");
    Ok(())
}

#[then(r#"task "{name}" is in state "{state}""#)]
fn task_in_state(
    world: &TaskDependencyWorld,
    name: String,
    state: String,
) -> Result<(), eyre::Report> {
    let expected = TaskState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected state in scenario: {err}"))?;
    let task_id = world.task_id(&name)?;
    let current =
        run_async(world.service.current_state(task_id)).wrap_err("read current state")?;
    eyre::ensure!(
        current == expected,
        "expected {name} to be {expected}, found {current}"
    );
    Ok(())
}

#[then(r#"task "{name}" is ready"#)]
fn task_is_ready(world: &TaskDependencyWorld, name: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&name)?;
    let ready = run_async(world.service.is_ready(task_id)).wrap_err("evaluate readiness")?;
    eyre::ensure!(ready, "expected {name} to be ready");
    Ok(())
}

#[then(r#"task "{name}" is blocked"#)]
fn task_is_blocked(world: &TaskDependencyWorld, name: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&name)?;
    let ready = run_async(world.service.is_ready(task_id)).wrap_err("evaluate readiness")?;
    eyre::ensure!(!ready, "expected {name} to be blocked");
    Ok(())
}
