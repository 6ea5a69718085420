use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PoolRota API",
        version = "1.0.0",
        description = "Shift replacement and payroll core for a pool staff rota"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // Health
        crate::handlers::health::health_check,

        // Shifts
        crate::handlers::shifts_handler::get_shifts_for_month,
        crate::handlers::shifts_handler::get_shifts_for_week,

        // Replacements
        crate::handlers::replacements_handler::create_replacements,
        crate::handlers::replacements_handler::respond_to_replacement,
        crate::handlers::replacements_handler::get_sent_replacements,
        crate::handlers::replacements_handler::get_received_replacements,
        crate::handlers::replacements_handler::acknowledge_replacements,

        // Payroll
        crate::handlers::payroll_handler::get_monthly_payroll,

        // References
        crate::handlers::references_handler::get_users,
        crate::handlers::references_handler::get_course_types,
    ),
    components(
        schemas(
            // Core models
            crate::models::Role,
            crate::models::User,
            crate::models::Shift,
            crate::models::ShiftView,
            crate::models::ReplacementInfo,
            crate::models::DisplayBlock,
            crate::models::CourseType,
            crate::models::BillingMode,
            crate::models::RequestStatus,
            crate::models::RequestAction,
            crate::models::ReplacementRequest,
            crate::models::ReplacementRequestView,
            crate::models::ShiftSnapshot,
            crate::models::QuantityUnit,
            crate::models::BreakdownLine,
            crate::models::DayBlocks,
            crate::models::MonthlyBreakdown,

            // Input and response models
            crate::models::CreateReplacementInput,
            crate::models::CreateReplacementResponse,
            crate::models::RespondInput,
            crate::models::RespondResponse,
            crate::models::ReplacementListResponse,
            crate::models::AckResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check"),
        (name = "shifts", description = "Month and week shift views"),
        (name = "replacements", description = "Shift replacement requests"),
        (name = "payroll", description = "Monthly compensation breakdowns"),
        (name = "references", description = "Staff and course reference data"),
    )
)]
pub struct ApiDoc;
