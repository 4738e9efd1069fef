//! Employee Model

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Employee identifier, assigned by the server
pub type EmployeeId = i64;

/// Leave balance granted to a newly created employee
pub const DEFAULT_LEAVE_DAYS: u32 = 14;

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Employee,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clock-in state as reported by the attendance store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockInStatus {
    #[serde(rename = "Clocked In")]
    ClockedIn,
    #[default]
    #[serde(rename = "Not Clocked In")]
    NotClockedIn,
}

/// Shift kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    Day,
    Night,
}

/// Scheduled work day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobSchedule {
    pub date: NaiveDate,
    pub shift: Shift,
}

/// Employee record as shown on the dashboard
///
/// `id` 是唯一键，其余字段均可修改。`attendance` 与 `overtime_hours`
/// 由考勤存储计算，这里原样保存。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub clock_in_status: ClockInStatus,
    #[serde(default)]
    pub job_schedule: Option<JobSchedule>,
    #[serde(default)]
    pub attendance: String,
    pub leave_days: u32,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub overtime_hours: Decimal,
    #[serde(default)]
    pub machine_line: Option<String>,
}

impl EmployeeRecord {
    /// Fresh record for a newly registered employee
    pub fn new(id: EmployeeId, name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role,
            clock_in_status: ClockInStatus::NotClockedIn,
            job_schedule: None,
            attendance: String::new(),
            leave_days: DEFAULT_LEAVE_DAYS,
            warnings: Vec::new(),
            skills: Vec::new(),
            overtime_hours: Decimal::ZERO,
            machine_line: None,
        }
    }

    pub fn is_clocked_in(&self) -> bool {
        self.clock_in_status == ClockInStatus::ClockedIn
    }

    /// Read one field as an edit value
    pub fn field_value(&self, field: EmployeeField) -> FieldEdit {
        match field {
            EmployeeField::Name => FieldEdit::Name(self.name.clone()),
            EmployeeField::ClockInStatus => FieldEdit::ClockInStatus(self.clock_in_status),
            EmployeeField::JobSchedule => FieldEdit::JobSchedule(self.job_schedule),
            EmployeeField::Attendance => FieldEdit::Attendance(self.attendance.clone()),
            EmployeeField::LeaveDays => FieldEdit::LeaveDays(self.leave_days),
            EmployeeField::Warnings => FieldEdit::Warnings(self.warnings.clone()),
            EmployeeField::Skills => FieldEdit::Skills(self.skills.clone()),
            EmployeeField::OvertimeHours => FieldEdit::OvertimeHours(self.overtime_hours),
            EmployeeField::MachineLine => FieldEdit::MachineLine(self.machine_line.clone()),
        }
    }

    /// Write exactly one field
    pub fn apply(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::Name(v) => self.name = v,
            FieldEdit::ClockInStatus(v) => self.clock_in_status = v,
            FieldEdit::JobSchedule(v) => self.job_schedule = v,
            FieldEdit::Attendance(v) => self.attendance = v,
            FieldEdit::LeaveDays(v) => self.leave_days = v,
            FieldEdit::Warnings(v) => self.warnings = v,
            FieldEdit::Skills(v) => self.skills = v,
            FieldEdit::OvertimeHours(v) => self.overtime_hours = v,
            FieldEdit::MachineLine(v) => self.machine_line = v,
        }
    }
}

/// Editable employee fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeField {
    Name,
    ClockInStatus,
    JobSchedule,
    Attendance,
    LeaveDays,
    Warnings,
    Skills,
    OvertimeHours,
    MachineLine,
}

impl EmployeeField {
    pub const ALL: [EmployeeField; 9] = [
        Self::Name,
        Self::ClockInStatus,
        Self::JobSchedule,
        Self::Attendance,
        Self::LeaveDays,
        Self::Warnings,
        Self::Skills,
        Self::OvertimeHours,
        Self::MachineLine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ClockInStatus => "clock_in_status",
            Self::JobSchedule => "job_schedule",
            Self::Attendance => "attendance",
            Self::LeaveDays => "leave_days",
            Self::Warnings => "warnings",
            Self::Skills => "skills",
            Self::OvertimeHours => "overtime_hours",
            Self::MachineLine => "machine_line",
        }
    }
}

impl fmt::Display for EmployeeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value for exactly one field
///
/// 序列化为单键对象 `{field: value}`，例如 `{"leave_days": 3}`，
/// 即 PATCH 请求体与确认值的格式。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEdit {
    Name(String),
    ClockInStatus(ClockInStatus),
    JobSchedule(Option<JobSchedule>),
    Attendance(String),
    LeaveDays(u32),
    Warnings(Vec<String>),
    Skills(Vec<String>),
    OvertimeHours(#[serde(with = "rust_decimal::serde::float")] Decimal),
    MachineLine(Option<String>),
}

impl FieldEdit {
    /// The field this value belongs to
    pub fn field(&self) -> EmployeeField {
        match self {
            Self::Name(_) => EmployeeField::Name,
            Self::ClockInStatus(_) => EmployeeField::ClockInStatus,
            Self::JobSchedule(_) => EmployeeField::JobSchedule,
            Self::Attendance(_) => EmployeeField::Attendance,
            Self::LeaveDays(_) => EmployeeField::LeaveDays,
            Self::Warnings(_) => EmployeeField::Warnings,
            Self::Skills(_) => EmployeeField::Skills,
            Self::OvertimeHours(_) => EmployeeField::OvertimeHours,
            Self::MachineLine(_) => EmployeeField::MachineLine,
        }
    }
}

/// Create employee payload
#[derive(Clone, Serialize, Deserialize)]
pub struct EmployeeCreate {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub password: String,
}

impl fmt::Debug for EmployeeCreate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmployeeCreate")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &"<redacted>")
            .finish()
    }
}
