//! View Adapters
//!
//! Projections of tasks into the drag surfaces the board and calendar
//! views sort on. Both wrap `Task` and map a denormalized field onto the
//! container key: the board groups by status, the calendar by due date.

use chrono::NaiveDate;

use crate::domain::Task;
use worksync_dnd::{Container, Sortable};

pub const UNSCHEDULED_KEY: &str = "unscheduled";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A task on the status board. Moving it between columns rewrites its
/// status.
#[derive(Clone, Debug)]
pub struct BoardCard(pub Task);

impl BoardCard {
    pub fn into_task(self) -> Task {
        self.0
    }
}

impl Sortable for BoardCard {
    fn sort_id(&self) -> &str {
        &self.0.id
    }

    fn position(&self) -> i32 {
        self.0.position
    }

    fn set_position(&mut self, position: i32) {
        self.0.position = position;
    }

    fn container_key(&self) -> &str {
        &self.0.status
    }

    fn set_container_key(&mut self, key: &str) {
        self.0.status = key.to_string();
    }
}

/// A task on the calendar. The container key is the due date formatted
/// `%Y-%m-%d`, or [`UNSCHEDULED_KEY`] when none is set.
#[derive(Clone, Debug)]
pub struct ScheduledTask {
    task: Task,
    key: String,
}

impl ScheduledTask {
    pub fn new(task: Task) -> Self {
        let key = date_key(task.due_date.as_ref());
        Self { task, key }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn into_task(self) -> Task {
        self.task
    }
}

fn date_key(date: Option<&NaiveDate>) -> String {
    match date {
        Some(date) => date.format(DATE_FORMAT).to_string(),
        None => UNSCHEDULED_KEY.to_string(),
    }
}

impl Sortable for ScheduledTask {
    fn sort_id(&self) -> &str {
        &self.task.id
    }

    fn position(&self) -> i32 {
        self.task.position
    }

    fn set_position(&mut self, position: i32) {
        self.task.position = position;
    }

    fn container_key(&self) -> &str {
        &self.key
    }

    fn set_container_key(&mut self, key: &str) {
        // An unparseable key clears the schedule rather than guessing
        self.task.due_date = NaiveDate::parse_from_str(key, DATE_FORMAT).ok();
        self.key = date_key(self.task.due_date.as_ref());
    }
}

/// Group tasks into one column per status, in the given column order.
/// Tasks with a status outside `statuses` are dropped. Items inside a
/// column keep their position order.
pub fn board_columns(tasks: &[Task], statuses: &[&str]) -> Vec<Container<BoardCard>> {
    let mut columns: Vec<Container<BoardCard>> = statuses
        .iter()
        .map(|status| Container::new(*status, Vec::new()))
        .collect();
    for task in tasks {
        if let Some(column) = columns.iter_mut().find(|c| c.key == task.status) {
            column.items.push(BoardCard(task.clone()));
        }
    }
    for column in &mut columns {
        column.items.sort_by_key(|card| card.position());
    }
    columns
}

/// Group tasks into one cell per day plus a trailing unscheduled cell.
/// Tasks due outside `days` are dropped.
pub fn calendar_cells(tasks: &[Task], days: &[NaiveDate]) -> Vec<Container<ScheduledTask>> {
    let mut cells: Vec<Container<ScheduledTask>> = days
        .iter()
        .map(|day| Container::new(day.format(DATE_FORMAT).to_string(), Vec::new()))
        .collect();
    cells.push(Container::new(UNSCHEDULED_KEY, Vec::new()));
    for task in tasks {
        let scheduled = ScheduledTask::new(task.clone());
        if let Some(cell) = cells.iter_mut().find(|c| c.key == scheduled.key) {
            cell.items.push(scheduled);
        }
    }
    for cell in &mut cells {
        cell.items.sort_by_key(|item| item.position());
    }
    cells
}
