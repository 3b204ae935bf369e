//! When steps for task dependency BDD scenarios.

use super::world::{TaskDependencyWorld, run_async};
use eyre::WrapErr;
use readytodo::task::domain::TaskState;
use rstest_bdd_macros::when;

#[when(r#"task "{name}" is moved to "{state}""#)]
fn task_is_moved(
    world: &mut TaskDependencyWorld,
    name: String,
    state: String,
) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&name)?;
    let target = TaskState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid state in scenario: {err}"))?;
    let outcome =
        run_async(world.service.transition(task_id, target)).wrap_err("transition task")?;
    world.last_outcome = Some(outcome);
    Ok(())
}
