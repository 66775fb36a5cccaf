/// Qualitative freshness of a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyStatus {
    Fresh,
    Approaching,
    Drifted,
}

impl FuzzyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FuzzyStatus::Fresh => "In rhythm",
            FuzzyStatus::Approaching => "Coming up",
            FuzzyStatus::Drifted => "Drifted a bit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutineStatus {
    pub status: FuzzyStatus,
    /// Fractional days since the last completion.
    pub days_since: Option<f64>,
    /// Fractional days until the next due point, never negative.
    pub days_until: Option<f64>,
}

impl RoutineStatus {
    pub fn timing_label(&self) -> String {
        if let Some(since) = self.days_since {
            return match since.floor() as i64 {
                0 => "Done today".to_string(),
                1 => "1 day ago".to_string(),
                n => format!("{n} days ago"),
            };
        }
        if let Some(until) = self.days_until {
            return match until.ceil() as i64 {
                0 => "Due now".to_string(),
                1 => "In 1 day".to_string(),
                n => format!("In ~{n} days"),
            };
        }
        "Not done yet".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(days_since: Option<f64>, days_until: Option<f64>) -> RoutineStatus {
        RoutineStatus {
            status: FuzzyStatus::Fresh,
            days_since,
            days_until,
        }
    }

    #[test]
    fn timing_label_prefers_days_since() {
        assert_eq!(status(Some(0.4), Some(6.6)).timing_label(), "Done today");
        assert_eq!(status(Some(1.9), Some(5.1)).timing_label(), "1 day ago");
        assert_eq!(status(Some(10.0), Some(4.0)).timing_label(), "10 days ago");
    }

    #[test]
    fn timing_label_for_skips_and_new_routines() {
        assert_eq!(status(None, Some(6.2)).timing_label(), "In ~7 days");
        assert_eq!(status(None, Some(0.5)).timing_label(), "In 1 day");
        assert_eq!(status(None, None).timing_label(), "Not done yet");
    }
}
