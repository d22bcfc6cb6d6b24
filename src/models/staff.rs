//! Staff model.
//!
//! Staff members are the rows of a roster. Each has a role, three skill
//! flags that drive daily coverage rules, and an annual holiday
//! entitlement used for year-end quota accounting.

use serde::{Deserialize, Serialize};

/// A staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    /// Unique login identifier.
    pub id: String,
    /// Display name. Matrix rows and request rows key on this.
    pub name: String,
    /// Whether the member participates in solving.
    pub role: Role,
    /// Speaks language A.
    pub language_a: bool,
    /// Speaks language B.
    pub language_b: bool,
    /// Counts toward veteran coverage.
    pub veteran: bool,
    /// Annual rest-day entitlement.
    pub holiday_target: u32,
}

/// Staff role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Appears in the roster and is scheduled.
    Schedulable,
    /// Administrator account; never scheduled.
    Administrative,
}

/// A coverage skill checked per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    LanguageA,
    LanguageB,
    Veteran,
}

impl Skill {
    /// All coverage skills in check order.
    pub const ALL: [Skill; 3] = [Skill::LanguageA, Skill::LanguageB, Skill::Veteran];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Skill::LanguageA => "language-A",
            Skill::LanguageB => "language-B",
            Skill::Veteran => "veteran",
        }
    }
}

impl Role {
    /// Parses the storage representation. `staff` is accepted as an alias.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "schedulable" | "staff" => Some(Role::Schedulable),
            "administrative" | "admin" => Some(Role::Administrative),
            _ => None,
        }
    }

    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Schedulable => "schedulable",
            Role::Administrative => "administrative",
        }
    }
}

impl StaffMember {
    /// Creates a schedulable member with no skills. `id` doubles as the name.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            role: Role::Schedulable,
            language_a: false,
            language_b: false,
            veteran: false,
            holiday_target: 0,
        }
    }

    /// Creates an administrative account.
    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id).with_role(Role::Administrative)
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Marks as a language-A speaker.
    pub fn language_a(mut self) -> Self {
        self.language_a = true;
        self
    }

    /// Marks as a language-B speaker.
    pub fn language_b(mut self) -> Self {
        self.language_b = true;
        self
    }

    /// Marks as a veteran.
    pub fn veteran(mut self) -> Self {
        self.veteran = true;
        self
    }

    /// Sets the annual entitlement.
    pub fn with_holiday_target(mut self, days: u32) -> Self {
        self.holiday_target = days;
        self
    }

    /// Whether this member is scheduled.
    #[inline]
    pub fn is_schedulable(&self) -> bool {
        self.role == Role::Schedulable
    }

    /// Whether this member has a coverage skill.
    pub fn has_skill(&self, skill: Skill) -> bool {
        match skill {
            Skill::LanguageA => self.language_a,
            Skill::LanguageB => self.language_b,
            Skill::Veteran => self.veteran,
        }
    }
}

/// Schedulable members in roster order.
pub fn schedulable(staff: &[StaffMember]) -> Vec<StaffMember> {
    staff.iter().filter(|s| s.is_schedulable()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_builder() {
        let s = StaffMember::new("u01")
            .with_name("Aiko")
            .language_a()
            .veteran()
            .with_holiday_target(120);

        assert_eq!(s.id, "u01");
        assert_eq!(s.name, "Aiko");
        assert!(s.is_schedulable());
        assert!(s.has_skill(Skill::LanguageA));
        assert!(!s.has_skill(Skill::LanguageB));
        assert!(s.has_skill(Skill::Veteran));
        assert_eq!(s.holiday_target, 120);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("staff"), Some(Role::Schedulable));
        assert_eq!(Role::parse(" Schedulable "), Some(Role::Schedulable));
        assert_eq!(Role::parse("admin"), Some(Role::Administrative));
        assert_eq!(Role::parse("guest"), None);
    }

    #[test]
    fn test_schedulable_filter() {
        let staff = vec![
            StaffMember::new("a"),
            StaffMember::admin("root"),
            StaffMember::new("b"),
        ];
        let active = schedulable(&staff);
        assert_eq!(active.len(), 2);
        assert_eq!(active[1].id, "b");
    }
}
