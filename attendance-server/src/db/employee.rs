//! Employee Repository

use std::sync::atomic::Ordering;

use dashmap::mapref::entry::Entry;
use shared::ErrorCode;
use shared::models::{ClockInStatus, EmployeeCreate, EmployeeId, EmployeeRecord, FieldEdit};

use super::{MemoryDb, UserAccount, email_key};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    db: MemoryDb,
}

impl EmployeeRepository {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }

    /// 全部员工，按 id 升序
    pub fn find_all(&self) -> Vec<EmployeeRecord> {
        self.db.employees.read().values().cloned().collect()
    }

    pub fn find_by_id(&self, id: EmployeeId) -> Option<EmployeeRecord> {
        self.db.employees.read().get(&id).cloned()
    }

    /// 创建员工及其登录账号
    ///
    /// 邮箱已注册返回 `EmployeeEmailExists`。`on_commit` 在员工表写锁内调用
    pub async fn create(
        &self,
        payload: EmployeeCreate,
        on_commit: impl FnOnce(&EmployeeRecord),
    ) -> AppResult<EmployeeRecord> {
        let key = email_key(&payload.email);
        if self.db.accounts.contains_key(&key) {
            return Err(email_exists(&payload.email));
        }

        // argon2 较慢，放到阻塞线程池
        let password = payload.password;
        let hash_pass = tokio::task::spawn_blocking(move || UserAccount::hash_password(&password))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        match self.db.accounts.entry(key) {
            Entry::Occupied(_) => Err(email_exists(&payload.email)),
            Entry::Vacant(slot) => {
                let id = self.db.next_id.fetch_add(1, Ordering::SeqCst);
                let record = EmployeeRecord::new(
                    id,
                    payload.name.trim(),
                    payload.email.trim(),
                    payload.role,
                );
                let mut employees = self.db.employees.write();
                employees.insert(id, record.clone());
                on_commit(&record);
                drop(employees);
                slot.insert(UserAccount {
                    employee_id: id,
                    email: record.email.clone(),
                    role: payload.role,
                    hash_pass,
                });
                Ok(record)
            }
        }
    }

    /// 修改单个字段，返回修改后的记录
    pub fn update_field(
        &self,
        id: EmployeeId,
        edit: FieldEdit,
        on_commit: impl FnOnce(&EmployeeRecord),
    ) -> AppResult<EmployeeRecord> {
        self.modify(
            id,
            |record| {
                record.apply(edit);
                true
            },
            on_commit,
        )
        .map(|(record, _)| record)
    }

    pub fn set_clock_status(
        &self,
        id: EmployeeId,
        status: ClockInStatus,
        on_commit: impl FnOnce(&EmployeeRecord),
    ) -> AppResult<EmployeeRecord> {
        self.modify(
            id,
            |record| {
                record.clock_in_status = status;
                true
            },
            on_commit,
        )
        .map(|(record, _)| record)
    }

    /// 追加技能 (已存在时不重复)，返回记录与是否新增
    ///
    /// 未新增时不调用 `on_commit`
    pub fn add_skill(
        &self,
        id: EmployeeId,
        skill: &str,
        on_commit: impl FnOnce(&EmployeeRecord),
    ) -> AppResult<(EmployeeRecord, bool)> {
        self.modify(
            id,
            |record| {
                if record.skills.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
                    return false;
                }
                record.skills.push(skill.to_string());
                true
            },
            on_commit,
        )
    }

    pub fn count(&self) -> usize {
        self.db.employees.read().len()
    }

    /// 在写锁内修改并提交
    ///
    /// `on_commit` 仍持有写锁，同一员工的广播顺序与写入顺序一致
    fn modify(
        &self,
        id: EmployeeId,
        f: impl FnOnce(&mut EmployeeRecord) -> bool,
        on_commit: impl FnOnce(&EmployeeRecord),
    ) -> AppResult<(EmployeeRecord, bool)> {
        let mut employees = self.db.employees.write();
        let record = employees
            .get_mut(&id)
            .ok_or_else(|| AppError::employee_not_found(id))?;
        let changed = f(record);
        if changed {
            on_commit(record);
        }
        Ok((record.clone(), changed))
    }
}

fn email_exists(email: &str) -> AppError {
    AppError::conflict(
        ErrorCode::EmployeeEmailExists,
        format!("Email {} is already registered", email.trim()),
    )
    .with_detail("field", "email")
}
