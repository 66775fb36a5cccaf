use super::Routine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFilter {
    #[default]
    Active,
    Archived,
    All,
}

impl ArchiveFilter {
    pub fn label(&self) -> &'static str {
        match self {
            ArchiveFilter::Active => "Active",
            ArchiveFilter::Archived => "Idle",
            ArchiveFilter::All => "All",
        }
    }

    pub fn cycle(&self) -> Self {
        match self {
            ArchiveFilter::Active => ArchiveFilter::Archived,
            ArchiveFilter::Archived => ArchiveFilter::All,
            ArchiveFilter::All => ArchiveFilter::Active,
        }
    }

    pub fn matches(&self, routine: &Routine) -> bool {
        match self {
            ArchiveFilter::Active => !routine.is_archived,
            ArchiveFilter::Archived => routine.is_archived,
            ArchiveFilter::All => true,
        }
    }
}

/// Archive state plus an optional tag, as used by list views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutineFilter {
    pub archive: ArchiveFilter,
    pub tag: Option<String>,
}

impl RoutineFilter {
    pub fn matches(&self, routine: &Routine) -> bool {
        self.archive.matches(routine)
            && self.tag.as_deref().map_or(true, |tag| routine.has_tag(tag))
    }

    pub fn apply<'a>(&self, routines: &'a [Routine]) -> Vec<&'a Routine> {
        routines.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Sorted distinct tags across all routines.
pub fn all_tags(routines: &[Routine]) -> Vec<String> {
    let mut tags: Vec<String> = routines.iter().flat_map(|r| r.tags.iter().cloned()).collect();
    tags.sort();
    tags.dedup();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Friction;

    fn routine(id: &str, tags: &[&str], archived: bool) -> Routine {
        Routine {
            id: id.to_string(),
            name: id.to_string(),
            cadence_days: 7,
            cadence_by_season: None,
            friction: Friction::Low,
            link: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            last_completed_at: None,
            skipped_until: None,
            history: Vec::new(),
            is_archived: archived,
        }
    }

    #[test]
    fn filters_by_archive_state_and_tag() {
        let routines = vec![
            routine("a", &["face"], false),
            routine("b", &["hair", "face"], true),
            routine("c", &["hair"], false),
        ];

        let active: Vec<_> = RoutineFilter::default()
            .apply(&routines)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(active, vec!["a", "c"]);

        let face_all = RoutineFilter {
            archive: ArchiveFilter::All,
            tag: Some("face".into()),
        };
        let ids: Vec<_> = face_all.apply(&routines).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert_eq!(all_tags(&routines), vec!["face", "hair"]);
    }
}
