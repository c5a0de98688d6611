use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::models::Task;

// Title match result
#[derive(Debug)]
pub struct TitleMatch<'a> {
    pub task: &'a Task,
    pub exact: bool,
    pub score: i64,
}

/// Finds the task whose title best matches `query`.
///
/// A case-insensitive exact title wins outright; otherwise the highest skim
/// score is returned and the caller should confirm it with the user.
pub fn find_task<'a>(tasks: &'a [Task], query: &str) -> Option<TitleMatch<'a>> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    if let Some(task) = tasks
        .iter()
        .find(|task| task.display_title().eq_ignore_ascii_case(query))
    {
        return Some(TitleMatch {
            task,
            exact: true,
            score: i64::MAX,
        });
    }

    let matcher = SkimMatcherV2::default();
    tasks
        .iter()
        .filter_map(|task| {
            matcher
                .fuzzy_match(task.display_title(), query)
                .map(|score| TitleMatch {
                    task,
                    exact: false,
                    score,
                })
        })
        .max_by_key(|candidate| candidate.score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> Vec<Task> {
        vec![Task::new("Write report", 60), Task::new("Read book", 60)]
    }

    #[test]
    fn test_exact_match_ignores_case() {
        let tasks = tasks();
        let found = find_task(&tasks, "read BOOK").unwrap();
        assert!(found.exact);
        assert_eq!(found.task.display_title(), "Read book");
    }

    #[test]
    fn test_fuzzy_match_suggests_closest() {
        let tasks = tasks();
        let found = find_task(&tasks, "wrtrep").unwrap();
        assert!(!found.exact);
        assert_eq!(found.task.display_title(), "Write report");
    }

    #[test]
    fn test_no_match() {
        let tasks = tasks();
        assert!(find_task(&tasks, "zzz").is_none());
        assert!(find_task(&tasks, "   ").is_none());
    }
}
