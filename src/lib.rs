pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod merge;
pub mod models;
pub mod openapi;
pub mod payroll;
pub mod rates;
pub mod replacements;
pub mod startup;
pub mod store;

use std::sync::Arc;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use payroll::PayrollEngine;
use replacements::ReplacementService;
use store::{Directory, ReplacementStore, ShiftStore};

pub struct AppState {
    pub config: AppConfig,
    pub shifts: Arc<dyn ShiftStore>,
    pub directory: Arc<dyn Directory>,
    pub replacements: ReplacementService,
    pub payroll: PayrollEngine,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        shifts: Arc<dyn ShiftStore>,
        directory: Arc<dyn Directory>,
        requests: Arc<dyn ReplacementStore>,
    ) -> Self {
        let replacements =
            ReplacementService::new(shifts.clone(), directory.clone(), requests);
        let payroll = PayrollEngine::new(shifts.clone(), directory.clone(), config.strict_rates);
        Self {
            config,
            shifts,
            directory,
            replacements,
            payroll,
        }
    }
}
