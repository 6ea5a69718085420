pub mod health;
pub mod payroll_handler;
pub mod references_handler;
pub mod replacements_handler;
pub mod shifts_handler;

pub use health::health_check;

use crate::{AppError, AppResult};

pub(crate) fn check_month(month: u32) -> AppResult<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "month must be between 1 and 12, got {month}"
        )))
    }
}
