use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Student,
    Lecturer,
    Coordinator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::Lecturer, Role::Coordinator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Lecturer => "Lecturer",
            Role::Coordinator => "Coordinator",
            Role::Admin => "Admin",
        }
    }

    /// Parse a role name, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
    }

    fn bit(self) -> u8 {
        match self {
            Role::Student => 0b0001,
            Role::Lecturer => 0b0010,
            Role::Coordinator => 0b0100,
            Role::Admin => 0b1000,
        }
    }
}

/// The set of roles a user holds, computed once per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Roles(u8);

impl Roles {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, role: Role) -> Self {
        self.insert(role);
        self
    }

    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|role| self.contains(*role))
    }

    pub fn is_student(&self) -> bool {
        self.contains(Role::Student)
    }

    pub fn is_staff(&self) -> bool {
        self.contains(Role::Lecturer) || self.contains(Role::Coordinator) || self.contains(Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.contains(Role::Admin)
    }

    /// Admins and coordinators act across modules and are not bound by the
    /// lecturer module-ownership rule.
    pub fn has_elevated_rights(&self) -> bool {
        self.contains(Role::Admin) || self.contains(Role::Coordinator)
    }

    /// Only staff may post to the feed.
    pub fn can_post(&self) -> bool {
        self.is_staff()
    }
}

impl FromIterator<Role> for Roles {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut roles = Roles::empty();
        for role in iter {
            roles.insert(role);
        }
        roles
    }
}

/// Everything the feed needs to know about the requesting user.
///
/// Assembled by a single directory lookup per request and passed explicitly
/// into the visibility predicate and the audience policy, so both rules read
/// the same snapshot of roles and module assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerContext {
    pub user_id: i64,
    pub user_name: String,
    pub join_date: Option<NaiveDate>,
    pub roles: Roles,
    /// Modules the user is assigned to in any role-context.
    pub registered_module_ids: BTreeSet<i64>,
    /// Subset of `registered_module_ids` where the user is the lecturer.
    pub lecturing_module_ids: BTreeSet<i64>,
}

impl ViewerContext {
    pub fn new(user_id: i64, user_name: impl Into<String>, roles: Roles) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            join_date: None,
            roles,
            registered_module_ids: BTreeSet::new(),
            lecturing_module_ids: BTreeSet::new(),
        }
    }

    pub fn with_join_date(mut self, join_date: NaiveDate) -> Self {
        self.join_date = Some(join_date);
        self
    }

    pub fn with_module(mut self, module_id: i64) -> Self {
        self.registered_module_ids.insert(module_id);
        self
    }

    pub fn with_lecturing_module(mut self, module_id: i64) -> Self {
        self.registered_module_ids.insert(module_id);
        self.lecturing_module_ids.insert(module_id);
        self
    }

    pub fn is_student(&self) -> bool {
        self.roles.is_student()
    }

    pub fn is_staff(&self) -> bool {
        self.roles.is_staff()
    }

    pub fn is_registered_in(&self, module_id: i64) -> bool {
        self.registered_module_ids.contains(&module_id)
    }

    pub fn lectures(&self, module_id: i64) -> bool {
        self.lecturing_module_ids.contains(&module_id)
    }

    /// Earliest creation time the user may see, or `None` for unbounded
    /// history. The join date counts from midnight UTC.
    pub fn visible_from(&self) -> Option<DateTime<Utc>> {
        self.join_date
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
    }
}
