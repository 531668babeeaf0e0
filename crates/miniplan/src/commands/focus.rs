use std::future::Future;
use std::io;
use std::time::Duration;

use anyhow::{Result, bail};
use miniplan_app::PlannerService;
use miniplan_core::FocusTarget;
use miniplan_core::patch::FocusTimerPatch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use super::{existing_note, existing_task};
use crate::FocusArgs;

/// How a countdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    Elapsed,
    Interrupted { left: u64 },
}

pub async fn run(args: FocusArgs, service: &mut PlannerService) -> Result<()> {
    let label = open(args, service)?;
    println!("focusing on {label} for {}", format_clock(service.focus().timer().time_left));
    let finish = countdown(service, Duration::from_secs(1), tokio::signal::ctrl_c()).await?;
    match finish {
        Finish::Elapsed => println!("focus session complete"),
        Finish::Interrupted { left } => println!("focus stopped with {} left", format_clock(left)),
    }
    service.with_focus(|focus, _| focus.stop());
    Ok(())
}

/// Start the session described by `args` and return what it is about.
fn open(args: FocusArgs, service: &mut PlannerService) -> Result<String> {
    let FocusArgs {
        task,
        note,
        minutes,
        extend,
    } = args;
    let (target, label) = match (task, note) {
        (Some(raw), _) => {
            let id = existing_task(service, &raw)?;
            let title = service.planner().task(&id).map(|task| task.title.clone()).unwrap_or_default();
            (Some(FocusTarget::Task(id)), format!("task {title:?}"))
        }
        (None, Some(raw)) => {
            let id = existing_note(service, &raw)?;
            let title = service.planner().note(&id).map(|note| note.title.clone()).unwrap_or_default();
            (Some(FocusTarget::Note(id)), format!("note {title:?}"))
        }
        (None, None) => (None, "a free-form session".to_owned()),
    };

    if !service.with_focus(|focus, planner| focus.start(target, planner)) {
        bail!("focus target disappeared");
    }
    service.with_focus(|focus, _| {
        if let Some(minutes) = minutes {
            let seconds = minutes.saturating_mul(60);
            focus.update_timer(FocusTimerPatch {
                duration: Some(seconds),
                time_left: Some(seconds),
                is_running: None,
            });
        }
        for _ in 0..extend {
            focus.extend();
        }
        // Free-form sessions open paused; the command runs them right away.
        focus.restore();
    });
    Ok(label)
}

/// Count the session down, one timer second per `period`, until it runs out
/// or `stop` resolves.
async fn countdown<F>(service: &mut PlannerService, period: Duration, stop: F) -> Result<Finish>
where
    F: Future<Output = io::Result<()>>,
{
    tokio::pin!(stop);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            result = &mut stop => {
                result?;
                return Ok(Finish::Interrupted { left: service.focus().timer().time_left });
            }
            _ = ticker.tick() => {
                if service.with_focus(|focus, _| focus.tick(1)) {
                    return Ok(Finish::Elapsed);
                }
                let left = service.focus().timer().time_left;
                if left.is_multiple_of(60) {
                    println!("{} left", format_clock(left));
                }
                debug!(left, "Focus tick");
            }
        }
    }
}

fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use miniplan_app::{MemoryStore, MusicConfig, NoopBridge};

    async fn service() -> PlannerService {
        PlannerService::load(Arc::new(MemoryStore::new()), Arc::new(NoopBridge), &MusicConfig::default())
            .await
            .unwrap_or_else(|err| panic!("load service: {err}"))
    }

    fn args(task: Option<String>, note: Option<String>) -> FocusArgs {
        FocusArgs {
            task,
            note,
            minutes: None,
            extend: 0,
        }
    }

    #[test]
    fn clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(20 * 60), "20:00");
        assert_eq!(format_clock(65), "01:05");
    }

    #[tokio::test]
    async fn task_sessions_honour_length_and_extensions() -> Result<()> {
        let mut service = service().await;
        let task = service.with_planner(|planner| planner.add_task(None, "Edit video"));
        let label = open(
            FocusArgs {
                minutes: Some(15),
                extend: 2,
                ..args(Some(task.to_string()), None)
            },
            &mut service,
        )?;

        assert_eq!(label, "task \"Edit video\"");
        assert_eq!(service.focus().target(), Some(&FocusTarget::Task(task)));
        let timer = *service.focus().timer();
        assert_eq!(timer.time_left, 25 * 60);
        assert_eq!(timer.duration, 25 * 60);
        assert!(timer.is_running);
        Ok(())
    }

    #[tokio::test]
    async fn free_form_sessions_start_running() -> Result<()> {
        let mut service = service().await;
        let label = open(args(None, None), &mut service)?;
        assert_eq!(label, "a free-form session");
        assert!(service.focus().target().is_none());
        assert!(service.focus().timer().is_running);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_notes_are_rejected() -> Result<()> {
        let mut service = service().await;
        let missing = miniplan_core::id::NoteId::new().to_string();
        assert!(open(args(None, Some(missing)), &mut service).is_err());
        assert!(!service.focus().is_active());
        Ok(())
    }

    #[tokio::test]
    async fn countdown_runs_the_timer_out() -> Result<()> {
        let mut service = service().await;
        open(args(None, None), &mut service)?;
        service.with_focus(|focus, _| {
            focus.update_timer(FocusTimerPatch {
                time_left: Some(3),
                ..FocusTimerPatch::default()
            });
        });

        let finish = countdown(&mut service, Duration::from_millis(1), std::future::pending()).await?;
        assert_eq!(finish, Finish::Elapsed);
        assert_eq!(service.focus().timer().time_left, 0);
        assert!(!service.focus().timer().is_running);
        Ok(())
    }

    #[tokio::test]
    async fn interrupting_keeps_the_remaining_time() -> Result<()> {
        let mut service = service().await;
        open(args(None, None), &mut service)?;

        let finish = countdown(&mut service, Duration::from_secs(60), std::future::ready(Ok(()))).await?;
        assert_eq!(finish, Finish::Interrupted { left: 20 * 60 });
        Ok(())
    }
}
