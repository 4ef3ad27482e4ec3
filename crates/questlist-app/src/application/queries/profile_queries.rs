use chrono::Datelike;
use std::collections::HashMap;

use questlist_domain::task::TaskRecord;

/// Pure projections over a task snapshot, used by the profile summary.

pub fn completed_count(tasks: &[TaskRecord]) -> usize {
    tasks.iter().filter(|t| t.is_completed()).count()
}

pub fn pending_count(tasks: &[TaskRecord]) -> usize {
    tasks.iter().filter(|t| !t.is_completed()).count()
}

/// Most frequent category among completed tasks. Ties break toward the
/// lexicographically smaller category so the answer is deterministic.
pub fn favorite_category(tasks: &[TaskRecord]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for task in tasks.iter().filter(|t| t.is_completed()) {
        *counts.entry(task.category()).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(cat_a, n_a), (cat_b, n_b)| n_a.cmp(n_b).then(cat_b.cmp(cat_a)))
        .map(|(category, _)| category.to_string())
}

/// Completed-task counts bucketed by creation weekday, Monday first.
pub fn completions_by_weekday(tasks: &[TaskRecord]) -> [usize; 7] {
    let mut buckets = [0usize; 7];
    for task in tasks.iter().filter(|t| t.is_completed()) {
        buckets[task.created_at().weekday().num_days_from_monday() as usize] += 1;
    }
    buckets
}
