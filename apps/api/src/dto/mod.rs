//! Wire types for the JSON API (camelCase fields) and their conversions
//! from application records.

mod conversions;
mod types;

pub use types::{
    ActivityResponse, CreateActivityRequest, CreateLeadRequest, HealthResponse, IdentityResponse,
    LeadDetailResponse, LeadResponse, LoginRequest, RegisterRequest, UpdateLeadRequest,
    UserResponse,
};
