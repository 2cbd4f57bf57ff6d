use serde::{Deserialize, Serialize};

/// Status of a single tasklist entry, recomputed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskListStatus {
    Completed,
    InProgress,
    NotYetStarted,
    CannotStartYet,
    /// Covers both "hidden" and "not required"; hidden entries never render.
    #[serde(alias = "NOT_REQUIRED")]
    Hidden,
}

impl TaskListStatus {
    pub const fn all() -> [Self; 5] {
        [
            Self::Completed,
            Self::InProgress,
            Self::NotYetStarted,
            Self::CannotStartYet,
            Self::Hidden,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::InProgress => "IN_PROGRESS",
            Self::NotYetStarted => "NOT_YET_STARTED",
            Self::CannotStartYet => "CANNOT_START_YET",
            Self::Hidden => "HIDDEN",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::InProgress => "In progress",
            Self::NotYetStarted => "Not yet started",
            Self::CannotStartYet => "Cannot start yet",
            Self::Hidden => "Not required",
        }
    }

    /// Maps a loosely written status name (`in_progress`, `InProgress`, `NOT_REQUIRED`)
    /// onto the vocabulary. Case and underscores are ignored.
    pub fn from_name(value: &str) -> Option<Self> {
        let key: String = value
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "completed" => Some(Self::Completed),
            "inprogress" => Some(Self::InProgress),
            "notyetstarted" => Some(Self::NotYetStarted),
            "cannotstartyet" => Some(Self::CannotStartYet),
            "notrequired" | "hidden" => Some(Self::Hidden),
            _ => None,
        }
    }

    /// Completed and hidden prerequisites both unblock dependants.
    pub const fn satisfies_dependency(self) -> bool {
        matches!(self, Self::Completed | Self::Hidden)
    }

    pub fn display(self) -> DisplayStatus {
        match self {
            Self::Completed => DisplayStatus::text(self.label(), None),
            Self::InProgress => DisplayStatus::tag(self.label(), "govuk-tag--light-blue"),
            Self::NotYetStarted => DisplayStatus::tag(self.label(), "govuk-tag--blue"),
            Self::CannotStartYet => DisplayStatus::text(
                self.label(),
                Some("govuk-task-list__status--cannot-start-yet"),
            ),
            Self::Hidden => DisplayStatus::text(self.label(), Some("govuk-tag--grey")),
        }
    }
}

/// Normalises a status name onto its canonical spelling; unknown names pass through.
pub fn normalise_status(value: &str) -> String {
    match TaskListStatus::from_name(value) {
        Some(status) => status.name().to_string(),
        None => value.to_string(),
    }
}

/// Display component handed to the view layer for a status badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<StatusTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTag {
    pub text: String,
    pub classes: String,
}

impl DisplayStatus {
    /// The visible wording, whether rendered as plain text or as a tag.
    pub fn label(&self) -> &str {
        match (&self.tag, &self.text) {
            (Some(tag), _) => &tag.text,
            (None, Some(text)) => text,
            (None, None) => "",
        }
    }

    fn text(text: &str, classes: Option<&str>) -> Self {
        Self {
            text: Some(text.to_string()),
            classes: classes.map(str::to_string),
            tag: None,
        }
    }

    fn tag(text: &str, classes: &str) -> Self {
        Self {
            text: None,
            classes: None,
            tag: Some(StatusTag {
                text: text.to_string(),
                classes: classes.to_string(),
            }),
        }
    }
}
