//! Device toggle controller tests

use std::sync::Arc;
use std::time::Duration;

use lumen_remote::DeviceToggle;
use lumen_remote::dispatch::CommandResult;

mod common;

use common::{ScriptedDispatcher, new_log};

fn toggle(dispatcher: &Arc<ScriptedDispatcher>) -> DeviceToggle {
    DeviceToggle::new("Kitchen", "http://device.test/kitchen", Arc::clone(dispatcher) as _)
}

#[tokio::test(start_paused = true)]
async fn success_shows_response_body() {
    let dispatcher = Arc::new(ScriptedDispatcher::new(
        new_log(),
        CommandResult::success("Kitchen lamp ON"),
    ));
    let toggle = toggle(&dispatcher);

    toggle.trigger().await;

    let state = toggle.state();
    assert_eq!(state.status.as_deref(), Some("Kitchen lamp ON"));
    assert!(!state.loading);
    assert_eq!(dispatcher.payloads(), vec![None]);
}

#[tokio::test(start_paused = true)]
async fn any_failure_shows_fixed_message() {
    // Server-supplied text is ignored on the toggle path
    let dispatcher = Arc::new(ScriptedDispatcher::new(
        new_log(),
        CommandResult::failure("internal error"),
    ));
    let toggle = toggle(&dispatcher);

    toggle.trigger().await;

    let state = toggle.state();
    assert_eq!(state.status.as_deref(), Some("device did not respond"));
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn loading_is_set_during_dispatch_and_always_cleared() {
    let dispatcher = Arc::new(
        ScriptedDispatcher::new(new_log(), CommandResult::failure(""))
            .with_delay(Duration::from_millis(50)),
    );
    let toggle = Arc::new(toggle(&dispatcher));

    let running = Arc::clone(&toggle);
    let handle = tokio::spawn(async move { running.trigger().await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(toggle.state().loading);

    handle.await.unwrap();
    assert!(!toggle.state().loading);
}

#[tokio::test(start_paused = true)]
async fn rapid_double_trigger_dispatches_once() {
    let dispatcher = Arc::new(
        ScriptedDispatcher::new(new_log(), CommandResult::success("ON"))
            .with_delay(Duration::from_millis(50)),
    );
    let toggle = toggle(&dispatcher);

    tokio::join!(toggle.trigger(), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        toggle.trigger().await;
    });

    assert_eq!(dispatcher.calls(), 1);
    assert!(!toggle.state().loading);
}

#[tokio::test(start_paused = true)]
async fn retrigger_after_completion_clears_previous_status() {
    let dispatcher = Arc::new(
        ScriptedDispatcher::new(new_log(), CommandResult::success("ON"))
            .with_queued(vec![
                CommandResult::success("ON"),
                CommandResult::failure(""),
            ])
            .with_delay(Duration::from_millis(10)),
    );
    let toggle = Arc::new(toggle(&dispatcher));

    toggle.trigger().await;
    assert_eq!(toggle.state().status.as_deref(), Some("ON"));

    // Status is cleared while the second dispatch is outstanding
    let running = Arc::clone(&toggle);
    let handle = tokio::spawn(async move { running.trigger().await });
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(toggle.state().status.is_none());

    handle.await.unwrap();
    assert_eq!(toggle.state().status.as_deref(), Some("device did not respond"));
    assert_eq!(dispatcher.calls(), 2);
}
