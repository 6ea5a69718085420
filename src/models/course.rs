use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// How an instructor course accrues pay in the monthly breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    /// One unit per shift taught, regardless of duration.
    PerTurn,
    /// Accumulated duration in hours.
    PerHour,
}

impl BillingMode {
    /// Historical default: the open-ended "propaganda" and "agonismo" courses
    /// were hour-billed, everything else counted per turn. Kept as a seeding
    /// helper; the stored attribute is authoritative.
    pub fn default_for_name(name: &str) -> BillingMode {
        match name.to_lowercase().as_str() {
            "propaganda" | "agonismo" => BillingMode::PerHour,
            _ => BillingMode::PerTurn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMode::PerTurn => "per_turn",
            BillingMode::PerHour => "per_hour",
        }
    }
}

impl fmt::Display for BillingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_turn" => Ok(BillingMode::PerTurn),
            "per_hour" => Ok(BillingMode::PerHour),
            other => Err(format!("unknown billing mode '{other}'")),
        }
    }
}

/// Course catalog entry. Owned by the Directory Service; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseType {
    pub id: i32,
    pub name: String,
    /// Some course kinds have variable duration.
    pub default_minutes: Option<i32>,
    /// Base rate per unit (turn or hour, per `billing`).
    #[schema(value_type = String)]
    pub base_rate: Decimal,
    pub billing: BillingMode,
}
