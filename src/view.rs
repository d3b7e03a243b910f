//! Named views: filter lenses over the task list.

use chrono::{Days, NaiveDate};

/// A named lens over tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    /// Tasks without a project.
    #[default]
    Inbox,
    /// Tasks due today.
    Today,
    /// Tasks due within the next seven days.
    Week,
    /// Tasks due within the next thirty days.
    Month,
    /// The project overview.
    Projects,
    /// No filtering.
    All,
}

impl View {
    /// Views that carry a pending-task badge.
    pub const COUNTED: [Self; 4] = [Self::Inbox, Self::Today, Self::Week, Self::Month];

    /// Parse a view name. Unknown names map to [`View::All`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "inbox" => Self::Inbox,
            "today" => Self::Today,
            "week" => Self::Week,
            "month" => Self::Month,
            "projects" => Self::Projects,
            _ => Self::All,
        }
    }

    /// Get the string representation of the view.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Projects => "projects",
            Self::All => "all",
        }
    }

    /// Heading shown above the view.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Today => "Today",
            Self::Week => "Next 7 Days",
            Self::Month => "Next 30 Days",
            Self::Projects => "Projects",
            Self::All => "All Tasks",
        }
    }

    /// The inclusive due-date window of a date-based view.
    #[must_use]
    pub fn date_window(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let span = match self {
            Self::Today => 0,
            Self::Week => 7,
            Self::Month => 30,
            _ => return None,
        };
        Some((today, today.checked_add_days(Days::new(span)).unwrap_or(NaiveDate::MAX)))
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
