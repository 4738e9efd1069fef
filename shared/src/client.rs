//! Client-related types shared between server and client
//!
//! Request/response bodies used in API communication.
//! These types are shared between attendance-server and attendance-client.

use serde::{Deserialize, Serialize};

use crate::models::{EmployeeId, EmployeeRecord, FieldEdit, Role};

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub role: Role,
    pub employee_id: EmployeeId,
}

/// Current user response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub employee_id: EmployeeId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

// =============================================================================
// Employee API DTOs
// =============================================================================

/// Response of `POST /api/employees`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployeeResponse {
    pub message: String,
    pub record: EmployeeRecord,
}

/// Response of `PATCH /api/employees/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditFieldResponse {
    pub message: String,
    /// Value as stored after server-side normalization
    pub confirmed: FieldEdit,
}

/// Body of `POST /api/employees/{id}/skills`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSkillRequest {
    pub skill: String,
}

/// Response of clock-in / clock-out / add-skill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeActionResponse {
    pub message: String,
    pub record: EmployeeRecord,
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions: usize,
}
