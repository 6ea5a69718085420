//! Monthly payroll aggregation: buckets a user's shifts for a month and
//! prices each bucket through the rate resolver.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::merge::merge_day;
use crate::models::{
    BillingMode, BreakdownLine, CourseType, DayBlocks, MonthlyBreakdown, QuantityUnit, Role,
    Shift,
};
use crate::rates::RateResolver;
use crate::store::{Directory, ShiftStore};
use crate::{AppError, AppResult};

#[derive(Default)]
struct Bucket {
    minutes: i64,
    turns: i64,
}

pub struct PayrollEngine {
    shifts: Arc<dyn ShiftStore>,
    directory: Arc<dyn Directory>,
    rates: RateResolver,
}

impl PayrollEngine {
    pub fn new(
        shifts: Arc<dyn ShiftStore>,
        directory: Arc<dyn Directory>,
        strict_rates: bool,
    ) -> Self {
        let rates = RateResolver::new(directory.clone(), strict_rates);
        Self {
            shifts,
            directory,
            rates,
        }
    }

    /// Compensation breakdown for one user and one calendar month.
    ///
    /// Hourly roles accumulate exact fractional hours (minutes over sixty,
    /// never rounded). Instructor shifts bucket per course type and are
    /// priced per turn or per hour depending on the course's billing mode.
    /// An instructor shift without a course type aborts the whole breakdown.
    pub async fn monthly_breakdown(
        &self,
        user_id: i32,
        year: i32,
        month: u32,
    ) -> AppResult<MonthlyBreakdown> {
        let shifts = self
            .shifts
            .list_shifts_for_month(Some(user_id), year, month)
            .await?;

        let courses: HashMap<i32, CourseType> = self
            .directory
            .list_course_types()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut hourly: HashMap<Role, i64> = HashMap::new();
        let mut instructor: HashMap<i32, Bucket> = HashMap::new();

        for shift in &shifts {
            // A shift that ends at or before its start would silently
            // subtract pay; treat it as unclassifiable instead.
            if shift.end_time <= shift.start_time {
                return Err(AppError::UnclassifiableShift {
                    shift_id: shift.id,
                    reason: "shift ends at or before its start".to_string(),
                });
            }
            match shift.role {
                Role::Instructor => {
                    let course_id = shift.course_type_id.ok_or_else(|| {
                        AppError::UnclassifiableShift {
                            shift_id: shift.id,
                            reason: "instructor shift has no course type".to_string(),
                        }
                    })?;
                    // The billing mode is unknowable without the catalog
                    // entry, so a dangling reference cannot be bucketed.
                    if !courses.contains_key(&course_id) {
                        return Err(AppError::UnclassifiableShift {
                            shift_id: shift.id,
                            reason: format!("course type {course_id} is not in the catalog"),
                        });
                    }
                    let bucket = instructor.entry(course_id).or_default();
                    bucket.minutes += shift.duration_minutes();
                    bucket.turns += 1;
                }
                role => {
                    *hourly.entry(role).or_default() += shift.duration_minutes();
                }
            }
        }

        let mut lines = Vec::new();

        for role in Role::HOURLY {
            let Some(&minutes) = hourly.get(&role) else {
                continue;
            };
            let hours = exact_hours(minutes);
            let rate = self.rates.hourly_rate(role, user_id).await?;
            lines.push(BreakdownLine {
                label: role.label().to_string(),
                role,
                course_type_id: None,
                quantity: hours,
                unit: QuantityUnit::Hours,
                rate: rate.amount,
                rate_unconfigured: rate.is_unconfigured(),
                subtotal: hours * rate.amount,
            });
        }

        // Stable line order for instructors: course name, then id. Every
        // bucketed course id is in the catalog, checked above.
        let mut course_ids: Vec<i32> = instructor.keys().copied().collect();
        course_ids.sort_by_key(|id| (courses[id].name.clone(), *id));

        for course_id in course_ids {
            let bucket = &instructor[&course_id];
            let course = &courses[&course_id];
            let rate = self.rates.course_rate(user_id, course_id).await?;

            let (quantity, unit) = match course.billing {
                BillingMode::PerHour => (exact_hours(bucket.minutes), QuantityUnit::Hours),
                BillingMode::PerTurn => (Decimal::from(bucket.turns), QuantityUnit::Turns),
            };

            lines.push(BreakdownLine {
                label: course.name.clone(),
                role: Role::Instructor,
                course_type_id: Some(course_id),
                quantity,
                unit,
                rate: rate.amount,
                rate_unconfigured: rate.is_unconfigured(),
                subtotal: quantity * rate.amount,
            });
        }

        let total = lines.iter().map(|l| l.subtotal).sum();

        let names: HashMap<i32, String> = courses
            .iter()
            .map(|(id, c)| (*id, c.name.clone()))
            .collect();
        let mut by_date: BTreeMap<chrono::NaiveDate, Vec<Shift>> = BTreeMap::new();
        for shift in shifts {
            by_date.entry(shift.date).or_default().push(shift);
        }
        let days = by_date
            .into_iter()
            .map(|(date, day_shifts)| DayBlocks {
                date,
                blocks: merge_day(&day_shifts, &names),
            })
            .collect();

        Ok(MonthlyBreakdown {
            user_id,
            year,
            month,
            days,
            lines,
            total,
        })
    }
}

/// Minutes to hours without rounding: 100 minutes is 5/3 hours, kept exact
/// to Decimal precision.
fn exact_hours(minutes: i64) -> Decimal {
    Decimal::from(minutes) / Decimal::from(60)
}
