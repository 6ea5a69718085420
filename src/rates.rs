//! Rate resolver: turns (role, user) or (instructor, course type) into the
//! applicable monetary rate through the two-level override hierarchy.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::store::Directory;
use crate::models::Role;
use crate::{AppError, AppResult};

/// Where a resolved rate came from. Lets callers tell a configured zero
/// apart from the unconfigured fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    UserOverride,
    CategoryBase,
    CourseOverride,
    CourseBase,
    Unconfigured,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedRate {
    pub amount: Decimal,
    pub source: RateSource,
}

impl ResolvedRate {
    pub fn is_unconfigured(&self) -> bool {
        self.source == RateSource::Unconfigured
    }
}

pub struct RateResolver {
    directory: Arc<dyn Directory>,
    /// Strict mode turns the zero fallback into `UnconfiguredRate`.
    strict: bool,
}

impl RateResolver {
    pub fn new(directory: Arc<dyn Directory>, strict: bool) -> Self {
        Self { directory, strict }
    }

    /// Hourly rate for the non-instructor roles. A user override wins over
    /// the category base rate; user overrides are role-agnostic.
    pub async fn hourly_rate(&self, role: Role, user_id: i32) -> AppResult<ResolvedRate> {
        if let Some(amount) = self.directory.user_hourly_override(user_id).await? {
            return Ok(ResolvedRate {
                amount,
                source: RateSource::UserOverride,
            });
        }

        if let Some(amount) = self.directory.category_base_rate(role).await? {
            return Ok(ResolvedRate {
                amount,
                source: RateSource::CategoryBase,
            });
        }

        self.unconfigured(format!("role '{role}' (user {user_id})"))
    }

    /// Per-unit rate for an instructor teaching a given course type. The
    /// (instructor, course) override wins over the course's base rate.
    pub async fn course_rate(
        &self,
        instructor_id: i32,
        course_type_id: i32,
    ) -> AppResult<ResolvedRate> {
        if let Some(amount) = self
            .directory
            .instructor_course_override(instructor_id, course_type_id)
            .await?
        {
            return Ok(ResolvedRate {
                amount,
                source: RateSource::CourseOverride,
            });
        }

        if let Some(course) = self.directory.get_course_type(course_type_id).await? {
            return Ok(ResolvedRate {
                amount: course.base_rate,
                source: RateSource::CourseBase,
            });
        }

        self.unconfigured(format!(
            "course type {course_type_id} (instructor {instructor_id})"
        ))
    }

    fn unconfigured(&self, what: String) -> AppResult<ResolvedRate> {
        if self.strict {
            return Err(AppError::UnconfiguredRate(what));
        }
        tracing::warn!(%what, "No rate configured, falling back to zero");
        Ok(ResolvedRate {
            amount: Decimal::ZERO,
            source: RateSource::Unconfigured,
        })
    }
}
