use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type of a feed item. `General` and `System` display as
/// announcements, everything else as notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedKind {
    General,
    System,
    DocumentUpload,
    RepositoryUpdate,
    SchedulerUpdate,
    ScheduleUpdate,
}

impl FeedKind {
    pub const ALL: [FeedKind; 6] = [
        FeedKind::General,
        FeedKind::System,
        FeedKind::DocumentUpload,
        FeedKind::RepositoryUpdate,
        FeedKind::SchedulerUpdate,
        FeedKind::ScheduleUpdate,
    ];

    pub const ANNOUNCEMENT_KINDS: [FeedKind; 2] = [FeedKind::General, FeedKind::System];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::General => "General",
            FeedKind::System => "System",
            FeedKind::DocumentUpload => "DocumentUpload",
            FeedKind::RepositoryUpdate => "RepositoryUpdate",
            FeedKind::SchedulerUpdate => "SchedulerUpdate",
            FeedKind::ScheduleUpdate => "ScheduleUpdate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
    }

    pub fn is_announcement(&self) -> bool {
        matches!(self, FeedKind::General | FeedKind::System)
    }
}

/// Who may see an item besides its author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Audience {
    #[default]
    All,
    Students,
    Staff,
    ModuleStudents,
}

impl Audience {
    pub const ALL: [Audience; 4] = [
        Audience::All,
        Audience::Students,
        Audience::Staff,
        Audience::ModuleStudents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::All => "All",
            Audience::Students => "Students",
            Audience::Staff => "Staff",
            Audience::ModuleStudents => "ModuleStudents",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|audience| audience.as_str().eq_ignore_ascii_case(s))
    }
}

/// Coarse display class used to narrow a feed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Announcement,
    Notification,
}

impl TypeClass {
    /// Parse the `typeFilter` query value. Anything unrecognised means "no
    /// filter" rather than an error.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("announcement") {
            Some(TypeClass::Announcement)
        } else if s.eq_ignore_ascii_case("notification") {
            Some(TypeClass::Notification)
        } else {
            None
        }
    }

    pub fn includes(&self, kind: FeedKind) -> bool {
        match self {
            TypeClass::Announcement => kind.is_announcement(),
            TypeClass::Notification => !kind.is_announcement(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub id: i64,
    pub kind: FeedKind,
    pub audience: Audience,
    pub title: String,
    pub message: String,
    pub image_path: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub module_id: Option<i64>,
}

/// An item that passed the creation checks and is ready to be stored.
#[derive(Debug, Clone)]
pub struct NewFeedItem {
    pub kind: FeedKind,
    pub audience: Audience,
    pub title: String,
    pub message: String,
    pub image_path: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub module_id: Option<i64>,
}

/// Wire shape of a feed item, including the viewer's read state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedItemView {
    pub id: i64,
    pub kind: FeedKind,
    pub title: String,
    pub message: String,
    pub image_path: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub module_id: Option<i64>,
    pub audience: Audience,
    pub is_read: bool,
}

impl FeedItemView {
    pub fn from_item(item: FeedItem, is_read: bool) -> Self {
        Self {
            id: item.id,
            kind: item.kind,
            title: item.title,
            message: item.message,
            image_path: item.image_path,
            created_by: item.created_by,
            created_at: item.created_at,
            module_id: item.module_id,
            audience: item.audience,
            is_read,
        }
    }
}

/// Raw creation input. Kind and audience stay strings until the audience
/// policy has validated them.
#[derive(Debug, Clone, Default)]
pub struct CreateFeedItemRequest {
    pub kind: String,
    pub title: String,
    pub message: String,
    pub module_id: Option<i64>,
    pub audience: Option<String>,
    pub attachment: Option<Attachment>,
}

/// A file sent along with a new item, not yet uploaded.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub data: Vec<u8>,
}
