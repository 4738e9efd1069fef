//! 看板视图 - 渲染层读取的不可变快照

use std::collections::BTreeSet;

use shared::models::{EmployeeField, EmployeeId, EmployeeRecord, Recommendation};

use crate::reconciler::FieldKey;

/// Event channel state as shown to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    /// 断开，正在重连
    Disconnected,
    /// 令牌被拒绝，需要重新登录
    Refused,
}

/// Inline message next to a row or field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub employee_id: Option<EmployeeId>,
    pub field: Option<EmployeeField>,
    pub message: String,
}

/// Consistent snapshot of the dashboard
///
/// 每次状态变化都会重新生成，`revision` 单调递增
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub revision: u64,
    pub status: ConnectionStatus,
    pub recommendations: Vec<Recommendation>,
    pub notices: Vec<Notice>,
    pub(crate) employees: Vec<EmployeeRecord>,
    pub(crate) pending: BTreeSet<FieldKey>,
}

impl DashboardView {
    /// Employees in id order; may be called any number of times
    pub fn iter(&self) -> impl Iterator<Item = &EmployeeRecord> {
        self.employees.iter()
    }

    pub fn employee(&self, id: EmployeeId) -> Option<&EmployeeRecord> {
        self.employees
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|i| &self.employees[i])
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn is_pending(&self, id: EmployeeId, field: EmployeeField) -> bool {
        self.pending.contains(&FieldKey::new(id, field))
    }

    pub fn pending(&self) -> impl Iterator<Item = &FieldKey> {
        self.pending.iter()
    }

    /// Notices attached to one field
    pub fn notices_for(
        &self,
        id: EmployeeId,
        field: EmployeeField,
    ) -> impl Iterator<Item = &Notice> {
        self.notices
            .iter()
            .filter(move |n| n.employee_id == Some(id) && n.field == Some(field))
    }
}
