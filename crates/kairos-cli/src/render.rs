//! Plain-text rendering of replies and notifications.

use kairos_core::{
    Event, LabelFocus, Notification, Phase, Reply, SessionStatus, Stats, TaskStatus, TaskView,
    UserId,
};

pub const HELP: &str = "\
Commands:
  /add <text>              add a task; tags: [high] [low] due:<date> project:<name>
  /list [filters]          list tasks (or /tasks); filters: open done today tomorrow week
  /done <task>             mark a task done, by id or title
  /status <task>, <status> set a task open or done
  /pomodoro [w s l n] [task]
                           start a pomodoro (minutes: work short long, cycles)
  /pomodoro_pause          pause the running phase
  /pomodoro_resume         resume a paused phase
  /pomodoro_stop           stop the session
  /pomodoro_status         show the current phase and time left
  /analytics               focus and task statistics
  /help                    show this message";

pub fn task_line(task: &TaskView) -> String {
    let mut line = format!("{}  {} [{}]", task.id, task.title, task.priority);
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due:{due}"));
    }
    if let Some(project) = &task.project {
        line.push_str(&format!(" project:{project}"));
    }
    if task.status == TaskStatus::Done {
        line.push_str(" (done)");
    }
    line
}

fn minutes_secs(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Idle",
        Phase::Working => "Work",
        Phase::ShortBreak => "Short break",
        Phase::LongBreak => "Long break",
        Phase::Paused => "Paused",
        Phase::Stopped => "Stopped",
    }
}

pub fn event(event: &Event) -> String {
    match event {
        Event::SessionStarted {
            duration_secs,
            label: None,
            ..
        } => format!("Pomodoro started: work for {} min.", duration_secs / 60),
        Event::SessionStarted {
            duration_secs,
            label: Some(label),
            ..
        } => format!(
            "Pomodoro started: work for {} min. Task: {label}",
            duration_secs / 60
        ),
        Event::PhaseAdvanced {
            to,
            cycles_completed,
            duration_secs,
            ..
        } => format!(
            "{} for {} min ({} cycle(s) done).",
            phase_name(*to),
            duration_secs / 60,
            cycles_completed
        ),
        Event::SessionPaused {
            phase, remaining_ms, ..
        } => format!(
            "{} paused with {} left.",
            phase_name(*phase),
            minutes_secs(*remaining_ms)
        ),
        Event::SessionResumed {
            phase, remaining_ms, ..
        } => format!(
            "{} resumed, {} left.",
            phase_name(*phase),
            minutes_secs(*remaining_ms)
        ),
        Event::SessionStopped {
            cycles_completed, ..
        } => format!("Pomodoro stopped after {cycles_completed} cycle(s)."),
    }
}

/// Background notices for phase changes the user did not ask for.
///
/// Commands already get a reply, so their echoes are skipped.
pub fn notification(note: &Notification) -> Option<String> {
    match &note.event {
        ev @ Event::PhaseAdvanced { .. } => Some(format!("[{}] {}", note.user, event(ev))),
        _ => None,
    }
}

pub fn status(status: &SessionStatus) -> String {
    let phase = match (status.phase, status.paused_from) {
        (Phase::Paused, Some(from)) => format!("Paused ({})", phase_name(from)),
        (phase, _) => phase_name(phase).to_string(),
    };
    let mut line = format!(
        "{phase}: {} left, {} cycle(s) done.",
        minutes_secs(status.remaining_ms),
        status.cycles_completed
    );
    if let Some(label) = &status.label {
        line.push_str(&format!(" Working on: {label}"));
    }
    line
}

pub fn reply(reply: &Reply) -> String {
    match reply {
        Reply::TaskCreated { task } => format!("Task added: {}", task_line(task)),
        Reply::Tasks { tasks } if tasks.is_empty() => "No tasks.".to_string(),
        Reply::Tasks { tasks } => tasks.iter().map(task_line).collect::<Vec<_>>().join("\n"),
        Reply::TaskUpdated { task } => format!("Task {}: {}", task.status, task_line(task)),
        Reply::Pomodoro { event: ev } => event(ev),
        Reply::Status { status: st } => status(st),
        Reply::Analytics { stats: st } => stats_body(st),
        Reply::Help => HELP.to_string(),
        Reply::Usage { usage } => format!("Usage: {usage}"),
        Reply::Unknown { .. } => "Sorry, I don't know that one. Type /help for commands.".to_string(),
    }
}

pub fn stats(user: &UserId, stats: &Stats) -> String {
    format!("Stats for {user}\n{}", stats_body(stats))
}

fn stats_body(stats: &Stats) -> String {
    let mut text = format!(
        "Focus today:  {} session(s), {} min\n\
         Last 7 days:  {} session(s), {} min\n\
         All time:     {} session(s), {} min\n\
         Tasks:        {} open, {} done",
        stats.focus_sessions_today,
        stats.focus_minutes_today,
        stats.focus_sessions_week,
        stats.focus_minutes_week,
        stats.focus_sessions_total,
        stats.focus_minutes_total,
        stats.open_tasks,
        stats.done_tasks,
    );
    if !stats.focus_by_label.is_empty() {
        text.push_str("\nBy task, last 7 days:");
        for entry in &stats.focus_by_label {
            text.push_str(&format!(
                "\n  {}: {} session(s), {} min",
                entry.label, entry.sessions, entry.minutes
            ));
        }
    }
    text
}
