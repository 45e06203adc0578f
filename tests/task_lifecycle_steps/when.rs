//! When steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use todo_list::task::domain::TaskDate;

#[when(r#"a task "{title}" is created for "{day}""#)]
fn create_task(
    world: &mut TaskLifecycleWorld,
    title: String,
    day: String,
) -> Result<(), eyre::Report> {
    let active_at = TaskDate::parse(&day).wrap_err("parse scenario date")?;
    let result = run_async(world.service.create(title, active_at));
    if let Ok(id) = result.as_ref() {
        world.last_created = Some(*id);
    }
    world.last_outcome = Some(result.map(|_| ()));
    Ok(())
}

#[when("the active tasks are listed")]
fn list_active_tasks(world: &mut TaskLifecycleWorld) -> Result<(), eyre::Report> {
    world.listed = run_async(world.service.list("active")).wrap_err("list active tasks")?;
    Ok(())
}

#[when(r#"tasks with status "{status}" are listed"#)]
fn list_tasks_with_status(world: &mut TaskLifecycleWorld, status: String) {
    let result = run_async(world.service.list(&status));
    if let Ok(tasks) = result.as_ref() {
        world.listed.clone_from(tasks);
    }
    world.last_outcome = Some(result.map(|_| ()));
}
