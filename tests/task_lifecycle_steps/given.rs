//! Given steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use todo_list::task::domain::TaskDate;

#[given(r#"today is "{day}""#)]
fn today_is(world: &mut TaskLifecycleWorld, day: String) -> Result<(), eyre::Report> {
    let today = TaskDate::parse(&day).wrap_err("parse scenario date")?;
    world.set_today(today);
    Ok(())
}

#[given(r#"a task "{title}" is scheduled for "{day}""#)]
fn task_is_scheduled(
    world: &mut TaskLifecycleWorld,
    title: String,
    day: String,
) -> Result<(), eyre::Report> {
    let active_at = TaskDate::parse(&day).wrap_err("parse scenario date")?;
    let id = run_async(world.service.create(title, active_at))
        .wrap_err("create task in scenario setup")?;
    world.last_created = Some(id);
    Ok(())
}

#[given("that task is marked done")]
fn that_task_is_marked_done(world: &mut TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let id = world
        .last_created
        .ok_or_else(|| eyre::eyre!("missing created task in scenario world"))?;
    run_async(world.service.mark_task_done(&id.to_string()))
        .wrap_err("mark task done in scenario setup")?;
    Ok(())
}
