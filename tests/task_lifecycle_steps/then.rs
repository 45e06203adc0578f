//! Then steps for task lifecycle BDD scenarios.

use super::world::TaskLifecycleWorld;
use rstest_bdd_macros::then;
use todo_list::task::services::TaskErrorKind;

#[then(r#"the only listed title is "{title}""#)]
fn only_listed_title_is(world: &TaskLifecycleWorld, title: String) -> Result<(), eyre::Report> {
    let titles: Vec<&str> = world.listed.iter().map(|task| task.title()).collect();
    if titles != [title.as_str()] {
        return Err(eyre::eyre!("expected only {title:?}, listed {titles:?}"));
    }
    Ok(())
}

#[then("no tasks are listed")]
fn no_tasks_are_listed(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    if !world.listed.is_empty() {
        return Err(eyre::eyre!("expected no tasks, listed {:?}", world.listed));
    }
    Ok(())
}

#[then("the operation succeeds")]
fn operation_succeeds(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    match world.last_outcome.as_ref() {
        Some(Ok(())) => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!("expected success, got {err}")),
        None => Err(eyre::eyre!("no operation was performed")),
    }
}

#[then(r#"the operation fails with "{kind}""#)]
fn operation_fails_with(world: &TaskLifecycleWorld, kind: String) -> Result<(), eyre::Report> {
    let outcome = world
        .last_outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no operation was performed"))?;
    match outcome {
        Err(err) if format!("{:?}", err.kind()) == kind => Ok(()),
        other => Err(eyre::eyre!("expected {kind} failure, got {other:?}")),
    }
}
