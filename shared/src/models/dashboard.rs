//! Dashboard snapshot

use serde::{Deserialize, Serialize};

use super::employee::{EmployeeId, EmployeeRecord};

/// Full admin dashboard state, as returned by `GET /api/admin/dashboard`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub attendance: Vec<EmployeeRecord>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

/// Opaque advisory message shown next to the attendance table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<EmployeeId>,
    pub message: String,
}

impl Recommendation {
    pub fn for_employee(employee_id: EmployeeId, message: impl Into<String>) -> Self {
        Self {
            employee_id: Some(employee_id),
            message: message.into(),
        }
    }
}
