//! Dashboard events
//!
//! Named, versionless events broadcast to every admin session.

use serde::{Deserialize, Serialize};

use crate::models::{EmployeeId, EmployeeRecord, FieldEdit, Role};

/// Broadcast event, serialized as `{"event": "<name>", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// 员工打卡上班（不含完整记录，未知 id 直接丢弃）
    EmployeeClockedIn { id: EmployeeId, name: String },

    /// 员工打卡下班
    EmployeeClockedOut { id: EmployeeId, name: String },

    /// 新员工注册，携带完整记录
    EmployeeCreated {
        id: EmployeeId,
        name: String,
        email: String,
        role: Role,
        record: Box<EmployeeRecord>,
    },

    /// 管理员确认修改了某个字段
    EmployeeUpdated {
        id: EmployeeId,
        name: String,
        edit: FieldEdit,
    },

    /// 新增技能，`skills` 为完整技能列表
    SkillAdded {
        id: EmployeeId,
        name: String,
        skill: String,
        skills: Vec<String>,
    },
}

impl DashboardEvent {
    /// Build the creation event from a stored record
    pub fn created(record: EmployeeRecord) -> Self {
        Self::EmployeeCreated {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
            role: record.role,
            record: Box::new(record),
        }
    }

    pub fn employee_id(&self) -> EmployeeId {
        match self {
            Self::EmployeeClockedIn { id, .. }
            | Self::EmployeeClockedOut { id, .. }
            | Self::EmployeeCreated { id, .. }
            | Self::EmployeeUpdated { id, .. }
            | Self::SkillAdded { id, .. } => *id,
        }
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::EmployeeClockedIn { .. } => "employee_clocked_in",
            Self::EmployeeClockedOut { .. } => "employee_clocked_out",
            Self::EmployeeCreated { .. } => "employee_created",
            Self::EmployeeUpdated { .. } => "employee_updated",
            Self::SkillAdded { .. } => "skill_added",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_event_carries_full_record() {
        let record = EmployeeRecord::new(3, "Kim", "kim@example.com", Role::Employee);
        let event = DashboardEvent::created(record.clone());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "employee_created");
        assert_eq!(json["data"]["email"], "kim@example.com");
        assert_eq!(json["data"]["role"], "employee");
        assert_eq!(json["data"]["record"]["leave_days"], 14);

        let back: DashboardEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.employee_id(), 3);
    }

    #[test]
    fn test_updated_event_format() {
        let event = DashboardEvent::EmployeeUpdated {
            id: 7,
            name: "Sam".into(),
            edit: FieldEdit::LeaveDays(3),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "employee_updated",
                "data": { "id": 7, "name": "Sam", "edit": { "leave_days": 3 } }
            })
        );
        assert_eq!(event.name(), json["event"]);
    }
}
