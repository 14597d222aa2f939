//! Application services and ports for Leadflow.
//!
//! Everything in this crate is I/O-free: persistence and delivery are reached
//! only through the repository and notifier ports, so every service is
//! testable against in-memory fakes.

#![forbid(unsafe_code)]

pub mod access;
mod activity_service;
mod analytics_service;
mod change_notifier;
mod lead_service;
mod user_service;

#[cfg(test)]
pub(crate) mod testing;

pub use access::{LeadVisibility, Operation};
pub use activity_service::{
    ActivityRecord, ActivityRepository, ActivityService, ActivityWithAuthor, LogActivity,
    NewActivity,
};
pub use analytics_service::{
    AnalyticsReport, AnalyticsService, DailyActivityCount, DashboardStats, MonthlyLeadCount,
    OwnerPerformance, StatusShare, compute_analytics, compute_stats,
};
pub use change_notifier::{ChangeEvent, ChangeNotifier};
pub use lead_service::{
    CreateLead, LeadDetail, LeadPatch, LeadRecord, LeadRepository, LeadService, LeadWithOwner,
    NewLead,
};
pub use user_service::{
    NewUser, PasswordHasher, RegisterUser, UserCredentials, UserRecord, UserRepository,
    UserService,
};
