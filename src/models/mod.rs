pub mod course;
pub mod payroll;
pub mod replacement;
pub mod replacement_input;
pub mod role;
pub mod shift;
pub mod user;

pub use course::{BillingMode, CourseType};
pub use payroll::{BreakdownLine, DayBlocks, MonthlyBreakdown, QuantityUnit};
pub use replacement::{
    ReplacementRequest, ReplacementRequestView, RequestAction, RequestStatus, ShiftSnapshot,
};
pub use replacement_input::{
    AckResponse, CreateReplacementInput, CreateReplacementResponse, ReplacementListResponse,
    RespondInput, RespondResponse,
};
pub use role::Role;
pub use shift::{DisplayBlock, ReplacementInfo, Shift, ShiftView};
pub use user::User;
