mod common;

use std::time::Duration;

use tokio::time::sleep;

use common::*;
use problem_render_submit::orchestrator::pump_events;
use problem_render_submit::{LoadOutcome, Phase, ProblemIdentifiers, SubmitControl, SurfaceEvent};

#[tokio::test(start_paused = true)]
async fn pump_dispatches_events_until_shutdown() {
    let (api, surface) = (FakeApi::new(), FakeSurface::new());
    let coordinator = coordinator(&api, &surface);
    surface.set_form(&[("AnSwEr0001", "x")]);

    assert_eq!(
        coordinator.load_problem(ProblemIdentifiers::new(1)).await,
        LoadOutcome::Applied
    );
    surface.push_event(SurfaceEvent::FieldChanged);
    surface.push_event(SurfaceEvent::Submit {
        control: SubmitControl::new("submitAnswers", "Submit Answers"),
    });

    let handled = pump_events(
        surface.as_ref(),
        &coordinator,
        Duration::from_millis(100),
        sleep(Duration::from_secs(1)),
    )
    .await;

    // 初次加载、字段变化、提交，以及提交后重新渲染的加载事件
    assert_eq!(handled, 4);
    assert_eq!(api.submit_count(), 1);
    assert_eq!(api.save_count(), 0);
    assert_eq!(surface.listener_count(), 2);

    let view = coordinator.view_state();
    assert_eq!(view.phase, Phase::Loaded);
    assert!(!view.loading);
    assert!(view.last_submitted_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn pump_ignores_loaded_event_for_replaced_content() {
    let (api, surface) = (FakeApi::new(), FakeSurface::new());
    let coordinator = coordinator(&api, &surface);
    surface.set_form(&[("AnSwEr0001", "")]);

    coordinator.load_problem(ProblemIdentifiers::new(1)).await;
    coordinator.load_problem(ProblemIdentifiers::new(2)).await;

    let handled = pump_events(
        surface.as_ref(),
        &coordinator,
        Duration::from_millis(100),
        sleep(Duration::from_millis(500)),
    )
    .await;

    assert_eq!(handled, 2);
    assert_eq!(surface.listener_count(), 1);
    assert_eq!(coordinator.view_state().markup, markup_for(2));
}
