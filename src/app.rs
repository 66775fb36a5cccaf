use crate::clock::Clock;
use crate::config::Config;
use crate::db::KvBackend;
use crate::error::Result;
use crate::models::{all_tags, LogData, Routine, RoutineFilter};
use crate::store::RoutineStore;
use crate::tui::AppAction;

/// What the right-hand pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Details,
    Dashboard,
    Weekly,
}

impl View {
    pub fn label(&self) -> &'static str {
        match self {
            View::Details => "Details",
            View::Dashboard => "Dashboard",
            View::Weekly => "This Week",
        }
    }

    pub fn cycle(&self) -> Self {
        match self {
            View::Details => View::Dashboard,
            View::Dashboard => View::Weekly,
            View::Weekly => View::Details,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    SkipDays,
    Note,
}

pub struct App<B, C> {
    pub store: RoutineStore<B, C>,

    // UI State
    pub selected_index: usize,
    pub filter: RoutineFilter,
    pub view: View,
    pub show_help: bool,
    pub input_mode: Option<InputMode>,
    pub input: String,
    pub message: Option<String>,

    default_skip_days: u32,
    pub recent_activity_limit: usize,
}

impl<B: KvBackend, C: Clock> App<B, C> {
    pub fn new(store: RoutineStore<B, C>, config: &Config) -> Self {
        Self {
            store,
            selected_index: 0,
            filter: RoutineFilter::default(),
            view: View::default(),
            show_help: false,
            input_mode: None,
            input: String::new(),
            message: None,
            default_skip_days: config.default_skip_days.max(1),
            recent_activity_limit: config.recent_activity_limit,
        }
    }

    pub fn filtered_routines(&self) -> Vec<&Routine> {
        self.filter.apply(self.store.routines())
    }

    pub fn selected_routine(&self) -> Option<&Routine> {
        self.filtered_routines().get(self.selected_index).copied()
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_routine().map(|r| r.id.clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered_routines().len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    pub fn input_active(&self) -> bool {
        self.input_mode.is_some()
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }

            AppAction::MoveDown => {
                let len = self.filtered_routines().len();
                if len > 0 && self.selected_index < len - 1 {
                    self.selected_index += 1;
                }
            }

            AppAction::MoveToTop => {
                self.selected_index = 0;
            }

            AppAction::MoveToBottom => {
                self.selected_index = self.filtered_routines().len().saturating_sub(1);
            }

            AppAction::MarkDone => {
                if let Some(id) = self.selected_id() {
                    self.store.mark_done(&id, LogData::default()).await?;
                    self.message = Some("Logged. Nice work.".to_string());
                }
            }

            AppAction::LogWithNote => {
                if self.selected_routine().is_some() {
                    self.input_mode = Some(InputMode::Note);
                    self.input.clear();
                }
            }

            AppAction::SkipStart => {
                if self.selected_routine().is_some() {
                    self.input_mode = Some(InputMode::SkipDays);
                    self.input.clear();
                }
            }

            AppAction::ToggleArchive => {
                if let Some(id) = self.selected_id() {
                    self.store.toggle_archive(&id).await?;
                    self.clamp_selection();
                }
            }

            AppAction::DeleteRoutine => {
                if let Some(id) = self.selected_id() {
                    self.store.delete_routine(&id).await?;
                    self.clamp_selection();
                    self.message = Some("Rhythm deleted".to_string());
                }
            }

            AppAction::OpenLink => {
                if let Some(link) = self.selected_routine().and_then(|r| r.link.clone()) {
                    if let Err(e) = open::that(&link) {
                        tracing::warn!("Failed to open {}: {}", link, e);
                    }
                }
            }

            AppAction::CycleFilter => {
                self.filter.archive = self.filter.archive.cycle();
                self.selected_index = 0;
            }

            AppAction::CycleTag => {
                let tags = all_tags(self.store.routines());
                self.filter.tag = match &self.filter.tag {
                    None => tags.first().cloned(),
                    Some(current) => tags
                        .iter()
                        .position(|t| t == current)
                        .and_then(|i| tags.get(i + 1))
                        .cloned(),
                };
                self.selected_index = 0;
            }

            AppAction::CycleSeason => {
                let next = self.store.season().cycle();
                self.store.set_season(next).await?;
            }

            AppAction::CycleView => {
                self.view = self.view.cycle();
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }

            AppAction::InputChar(c) => {
                self.input.push(c);
            }

            AppAction::InputBackspace => {
                self.input.pop();
            }

            AppAction::InputConfirm => {
                self.confirm_input().await?;
                self.input_mode = None;
                self.input.clear();
            }

            AppAction::InputCancel => {
                self.input_mode = None;
                self.input.clear();
            }
        }

        Ok(false)
    }

    async fn confirm_input(&mut self) -> Result<()> {
        let Some(id) = self.selected_id() else {
            return Ok(());
        };
        let text = self.input.trim().to_string();

        match self.input_mode {
            Some(InputMode::SkipDays) => {
                let days = if text.is_empty() {
                    self.default_skip_days
                } else {
                    match text.parse::<u32>() {
                        Ok(days) if days > 0 => days,
                        _ => {
                            self.message = Some(format!("'{text}' is not a number of days"));
                            return Ok(());
                        }
                    }
                };
                self.store.skip_until(&id, days).await?;
                self.message = Some(format!("Skipped for {days} days"));
            }
            Some(InputMode::Note) => {
                let log = LogData {
                    note: (!text.is_empty()).then_some(text),
                    ..Default::default()
                };
                self.store.mark_done(&id, log).await?;
                self.message = Some("Logged with note".to_string());
            }
            None => {}
        }
        Ok(())
    }
}
