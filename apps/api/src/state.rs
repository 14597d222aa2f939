use leadflow_application::{ActivityService, AnalyticsService, LeadService, UserService};
use sqlx::PgPool;

use crate::events::EventBroadcaster;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub lead_service: LeadService,
    pub activity_service: ActivityService,
    pub analytics_service: AnalyticsService,
    pub events: EventBroadcaster,
    pub postgres_pool: PgPool,
    pub frontend_url: String,
}
