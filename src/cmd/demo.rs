//! Scripted walkthrough over the demo data set: `taskboard demo`.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use console::style;

use taskboard::board::clock::SystemClock;
use taskboard::board::filter::TaskFilters;
use taskboard::board::models::{NewTask, Priority, TaskPatch};
use taskboard::board::notify::{NoticeLevel, RecordingNotifier};
use taskboard::board::remote::{MemoryRecordStore, RecordStore, UnavailableRecordStore};
use taskboard::board::service::KanbanService;
use taskboard::config::TaskboardToml;
use taskboard::ui;
use taskboard::ui::icons::{CHECK, SPARKLE};

pub async fn cmd_demo(config: &TaskboardToml, board_id: &str, offline: bool) -> Result<()> {
    let store: Arc<dyn RecordStore> = if offline {
        Arc::new(UnavailableRecordStore)
    } else {
        Arc::new(MemoryRecordStore::new())
    };
    let notices = Arc::new(RecordingNotifier::new());
    let mut service = KanbanService::new(store, notices.clone(), Arc::new(SystemClock));

    let report = service.init_for_identity(config.identity()).await;
    println!(
        "{}Loaded {} board(s), {} task(s) for {} ({:?} data)",
        SPARKLE, report.boards, report.tasks, report.user_id, report.source
    );
    println!();

    let done_column = service
        .store()?
        .columns_of(board_id)
        .last()
        .map(|c| c.id.clone())
        .with_context(|| format!("Board '{}' not found in the demo data", board_id))?;

    let due = service.now() + Duration::days(2);
    let task = service
        .create_task(NewTask {
            board_id: board_id.to_string(),
            title: "Write release notes".to_string(),
            description: Some("Summarize the changes for this iteration".to_string()),
            due_date: Some(due),
            ..NewTask::default()
        })
        .await?;
    service
        .update_task(
            &task.id,
            TaskPatch {
                priority: Some(Priority::High),
                ..TaskPatch::default()
            },
        )
        .await?;
    service.drop_task(&task.id, &done_column).await?;
    service
        .update_task(
            &task.id,
            TaskPatch {
                completed: Some(true),
                ..TaskPatch::default()
            },
        )
        .await?;

    let now = service.now();
    let view = service.board_view(board_id, &TaskFilters::default())?;
    println!("{}", ui::render_board(&view, now));
    println!("{}", ui::render_stats(&service.board_stats(board_id)?));
    println!("{}", ui::render_dashboard(&service.dashboard()?));
    println!("{}", ui::render_activity(&service.activity_feed()?, now));

    for notice in notices.drain() {
        let line = match notice.level {
            NoticeLevel::Success => format!("{}{}", CHECK, notice.message),
            NoticeLevel::Error => style(&notice.message).red().to_string(),
        };
        println!("{}", line);
    }

    let pending = service.pending_writes().len();
    if pending > 0 {
        println!();
        println!(
            "{} write(s) could not reach the record store and are queued for replay.",
            style(pending).yellow()
        );
    }

    Ok(())
}
