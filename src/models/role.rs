use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Staff role a shift is scheduled under. Closed set: payroll rules and the
/// rate tables are keyed on these four variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Lifeguard,
    Instructor,
    Reception,
    Cleaning,
}

impl Role {
    /// Roles paid by the hour against the category rate table. Instructors
    /// are paid per course bucket instead.
    pub const HOURLY: [Role; 3] = [Role::Lifeguard, Role::Reception, Role::Cleaning];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Lifeguard => "lifeguard",
            Role::Instructor => "instructor",
            Role::Reception => "reception",
            Role::Cleaning => "cleaning",
        }
    }

    /// Human label used on breakdown lines.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Lifeguard => "Lifeguard",
            Role::Instructor => "Instructor",
            Role::Reception => "Reception",
            Role::Cleaning => "Cleaning",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lifeguard" => Ok(Role::Lifeguard),
            "instructor" => Ok(Role::Instructor),
            "reception" => Ok(Role::Reception),
            "cleaning" => Ok(Role::Cleaning),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}
