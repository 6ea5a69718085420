use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::{DisplayBlock, Role};

/// How the quantity on a breakdown line was accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuantityUnit {
    Hours,
    Turns,
}

/// One itemized line of the monthly compensation breakdown.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BreakdownLine {
    pub label: String,
    pub role: Role,
    /// Set for instructor buckets; the rate is resolved against this id even
    /// when two course types share a display name.
    pub course_type_id: Option<i32>,
    #[schema(value_type = String)]
    pub quantity: Decimal,
    pub unit: QuantityUnit,
    #[schema(value_type = String)]
    pub rate: Decimal,
    /// True when the rate fell through to the unconfigured-zero fallback
    /// rather than a configured value.
    pub rate_unconfigured: bool,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
}

/// A day's shifts merged into display blocks.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DayBlocks {
    pub date: NaiveDate,
    pub blocks: Vec<DisplayBlock>,
}

/// Full monthly breakdown for one user: merged day views for display plus
/// the itemized compensation lines and their total.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyBreakdown {
    pub user_id: i32,
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayBlocks>,
    pub lines: Vec<BreakdownLine>,
    #[schema(value_type = String)]
    pub total: Decimal,
}
