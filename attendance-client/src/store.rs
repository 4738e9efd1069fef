//! 员工状态投影
//!
//! UI 渲染的唯一数据源。只由 Dispatcher 任务持有和修改，
//! 每次修改都是对单条记录的整体替换，读者看不到半更新的记录。

use std::collections::BTreeMap;

use shared::models::{ClockInStatus, EmployeeId, EmployeeRecord, FieldEdit};

use crate::{ClientError, ClientResult};

/// Client-side projection of the employee table, ordered by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeStore {
    records: BTreeMap<EmployeeId, EmployeeRecord>,
}

impl EmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全量替换 (初次加载 / 重连后刷新)
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = EmployeeRecord>) {
        self.records = records.into_iter().map(|r| (r.id, r)).collect();
    }

    /// 标记已上班，未知员工返回 `UnknownEmployee` 且不创建记录
    pub fn apply_clock_in(&mut self, id: EmployeeId) -> ClientResult<()> {
        self.apply_field_edit(id, FieldEdit::ClockInStatus(ClockInStatus::ClockedIn))
    }

    /// 插入新员工，已存在同 id 时为空操作
    ///
    /// 返回是否插入
    pub fn apply_created(&mut self, mut record: EmployeeRecord) -> bool {
        if self.records.contains_key(&record.id) {
            return false;
        }
        record.clock_in_status = ClockInStatus::NotClockedIn;
        self.records.insert(record.id, record);
        true
    }

    /// 设置单个字段 (本地乐观值与服务端确认值共用)
    pub fn apply_field_edit(&mut self, id: EmployeeId, edit: FieldEdit) -> ClientResult<()> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(ClientError::UnknownEmployee(id))?;
        record.apply(edit);
        Ok(())
    }

    pub fn get(&self, id: EmployeeId) -> Option<&EmployeeRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: EmployeeId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in id order
    pub fn iter(&self) -> impl Iterator<Item = &EmployeeRecord> {
        self.records.values()
    }
}
