use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// The capacity in which a user is assigned to a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleContext {
    Student,
    Lecturer,
    Coordinator,
}

impl RoleContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleContext::Student => "Student",
            RoleContext::Lecturer => "Lecturer",
            RoleContext::Coordinator => "Coordinator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("Student") => Some(RoleContext::Student),
            s if s.eq_ignore_ascii_case("Lecturer") => Some(RoleContext::Lecturer),
            s if s.eq_ignore_ascii_case("Coordinator") => Some(RoleContext::Coordinator),
            _ => None,
        }
    }
}

/// Make sure a document-upload post names its module: `[CODE] ` prefixes the
/// title and the code appears somewhere in the message. Applying it twice
/// gives the same result as applying it once.
pub fn tag_with_module_code(title: &str, message: &str, code: &str) -> (String, String) {
    let tag = format!("[{}] ", code);
    let title = if title.to_lowercase().starts_with(&tag.to_lowercase()) {
        title.to_string()
    } else {
        format!("{}{}", tag, title)
    };

    let message = if message.to_lowercase().contains(&code.to_lowercase()) {
        message.to_string()
    } else {
        format!("{} (Module: {})", message, code)
    };

    (title, message)
}
