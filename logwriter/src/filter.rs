// ===== Уровни и фильтр приоритетов =====

/// Приоритет, который пишется всегда (исключения, безусловные записи).
pub const ALWAYS: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn priority(self) -> i64 {
        match self {
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
            LogLevel::Warning => 3,
            LogLevel::Error => 4,
        }
    }
}

/// Включительный диапазон приоритетов, которые попадают в файл.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityFilter {
    enabled: bool,
    min: i64,
    max: i64,
}

impl PriorityFilter {
    pub fn new(enabled: bool, min: i64, max: i64) -> Self {
        Self { enabled, min, max }
    }

    /// `path_known` — удалось ли получить непустой путь к файлу.
    pub fn should_log(&self, priority: i64, path_known: bool) -> bool {
        if !self.enabled || !path_known {
            return false;
        }
        (self.min..=self.max).contains(&priority) || priority == ALWAYS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive() {
        let filter = PriorityFilter::new(true, 2, 3);
        assert!(!filter.should_log(1, true));
        assert!(filter.should_log(2, true));
        assert!(filter.should_log(3, true));
        assert!(!filter.should_log(4, true));
        assert!(!filter.should_log(-2, true));
    }

    #[test]
    fn always_sentinel_passes_outside_range() {
        let filter = PriorityFilter::new(true, 2, 3);
        assert!(filter.should_log(ALWAYS, true));
    }

    #[test]
    fn disabled_or_pathless_logger_writes_nothing() {
        assert!(!PriorityFilter::new(false, 0, 10).should_log(ALWAYS, true));
        assert!(!PriorityFilter::new(true, 0, 10).should_log(5, false));
    }

    #[test]
    fn levels_map_to_conventional_priorities() {
        let levels = [LogLevel::Debug, LogLevel::Info, LogLevel::Warning, LogLevel::Error];
        let priorities: Vec<i64> = levels.iter().map(|l| l.priority()).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4]);
    }
}
