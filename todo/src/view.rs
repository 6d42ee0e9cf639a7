//! Plain-text rendering of the list.

use crate::types::{PersistenceHealth, Todo, TodoStats};

const HEADER: &str = "My Todo App\nStay organized and productive\n\n";
const EMPTY: &str = "No todos yet!\nAdd your first todo to get started\n";

/// Render the whole screen
///
/// The stats block only appears for a non-empty list. A persistence
/// warning line is added when the newest load or write failed.
#[must_use]
pub fn render(todos: &[Todo], health: &PersistenceHealth) -> String {
    let mut out = String::from(HEADER);

    if let Some(error) = health.last_error() {
        out.push_str(&format!("! Changes may not be saved: {error}\n\n"));
    }

    if todos.is_empty() {
        out.push_str(EMPTY);
        return out;
    }

    out.push_str(&render_stats(TodoStats::from_todos(todos)));
    out.push('\n');
    for todo in todos {
        out.push_str(&render_item(todo));
        out.push('\n');
    }
    out
}

/// Counts block shown above the list
#[must_use]
pub fn render_stats(stats: TodoStats) -> String {
    format!(
        "Statistics\nTotal: {}  Completed: {}  Pending: {}\n",
        stats.total, stats.completed, stats.pending
    )
}

/// One line per todo: checkbox, id, text
#[must_use]
pub fn render_item(todo: &Todo) -> String {
    if todo.is_completed() {
        format!("[x] {}  {}  (Completed!)", todo.id(), todo.text())
    } else {
        format!("[ ] {}  {}", todo.id(), todo.text())
    }
}
