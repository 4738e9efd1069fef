//! 编辑协调器 - 每个 (员工, 字段) 一个 Clean/Pending 状态机
//!
//! ```text
//!            begin(v)                      resolve(当前代, Ok(c))
//!   Clean ───────────► Pending(v, gen) ───────────────────────► Clean (store = c)
//!     ▲                  │   │  ▲
//!     │                  │   │  └── begin(v') : gen+1，旧请求变为过期
//!     │                  │   └── 外部推送: 不覆盖显示值，只更新回滚值
//!     └──────────────────┘
//!       resolve(当前代, Err) : store = 回滚值
//! ```
//!
//! 规则：
//!
//! - Pending 优先于外部推送，用户刚输入的值不会被推送覆盖
//! - 同一字段的新编辑取代进行中的编辑，只有最新一代的响应会落地
//! - 回滚值是最后已知的服务端值：过期的确认响应与被压制的推送都会更新它

use std::collections::{BTreeSet, HashMap};

use shared::models::{EmployeeField, EmployeeId, EmployeeRecord, FieldEdit};

use crate::store::EmployeeStore;
use crate::{ClientError, ClientResult};

/// Edit generation, unique per reconciler
pub type Generation = u64;

/// (employee, field) key of a pending edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub employee_id: EmployeeId,
    pub field: EmployeeField,
}

impl FieldKey {
    pub fn new(employee_id: EmployeeId, field: EmployeeField) -> Self {
        Self { employee_id, field }
    }
}

/// Handle for one submitted edit, used to resolve it later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTicket {
    pub key: FieldKey,
    pub generation: Generation,
}

#[derive(Debug, Clone)]
struct PendingEdit {
    generation: Generation,
    proposed: FieldEdit,
    rollback: FieldEdit,
}

/// Outcome of resolving an edit ticket
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// 当前代确认，store 已写入服务端值
    Confirmed(FieldEdit),
    /// 当前代失败，store 已恢复回滚值
    RolledBack(FieldEdit),
    /// 已被更新的编辑取代，不影响显示值
    Stale,
}

/// Outcome of an externally sourced field update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalUpdate {
    Applied,
    /// 字段处于 Pending，只记录为回滚值
    Suppressed,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    pending: HashMap<FieldKey, PendingEdit>,
    /// 全局单调递增，字段回到 Clean 后旧票据也不会与新编辑同代
    next_generation: Generation,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean → Pending (或 Pending → 更新的 Pending)
    ///
    /// 立即把提议值写入 store，返回用于匹配响应的票据
    pub fn begin(
        &mut self,
        store: &mut EmployeeStore,
        employee_id: EmployeeId,
        edit: FieldEdit,
    ) -> ClientResult<EditTicket> {
        let record = store
            .get(employee_id)
            .ok_or(ClientError::UnknownEmployee(employee_id))?;
        let key = FieldKey::new(employee_id, edit.field());

        let rollback = match self.pending.get(&key) {
            // 取代进行中的编辑时保留原回滚值 (最后已知的服务端值)
            Some(existing) => existing.rollback.clone(),
            None => record.field_value(key.field),
        };

        self.next_generation += 1;
        let generation = self.next_generation;

        store.apply_field_edit(employee_id, edit.clone())?;
        self.pending.insert(
            key,
            PendingEdit {
                generation,
                proposed: edit,
                rollback,
            },
        );

        tracing::debug!(employee_id, field = %key.field, generation, "Edit pending");
        Ok(EditTicket { key, generation })
    }

    /// 处理请求结果
    pub fn resolve(
        &mut self,
        store: &mut EmployeeStore,
        ticket: EditTicket,
        outcome: Result<FieldEdit, &ClientError>,
    ) -> Resolution {
        let key = ticket.key;
        let current = self
            .pending
            .get(&key)
            .is_some_and(|p| p.generation == ticket.generation);

        if !current {
            // 过期的成功响应仍是服务端的真实值，作为新的回滚值
            if let (Ok(confirmed), Some(newer)) = (&outcome, self.pending.get_mut(&key))
                && confirmed.field() == key.field
            {
                newer.rollback = confirmed.clone();
            }
            tracing::debug!(
                employee_id = key.employee_id,
                field = %key.field,
                generation = ticket.generation,
                "Stale edit response ignored"
            );
            return Resolution::Stale;
        }

        let Some(pending) = self.pending.remove(&key) else {
            return Resolution::Stale;
        };

        let (resolution, value) = match outcome {
            Ok(confirmed) if confirmed.field() == key.field => {
                (Resolution::Confirmed(confirmed.clone()), confirmed)
            }
            Ok(other) => {
                tracing::warn!(
                    employee_id = key.employee_id,
                    expected = %key.field,
                    got = %other.field(),
                    "Confirmation for a different field, rolling back"
                );
                (Resolution::RolledBack(pending.rollback.clone()), pending.rollback)
            }
            Err(_) => (Resolution::RolledBack(pending.rollback.clone()), pending.rollback),
        };

        if let Err(e) = store.apply_field_edit(key.employee_id, value) {
            // 员工已从快照中消失
            tracing::debug!(error = %e, "Edit resolved for a missing employee");
        }
        resolution
    }

    /// 外部来源 (推送事件) 的字段更新
    ///
    /// 字段 Pending 时不覆盖显示值
    pub fn apply_external(
        &mut self,
        store: &mut EmployeeStore,
        employee_id: EmployeeId,
        edit: FieldEdit,
    ) -> ClientResult<ExternalUpdate> {
        if !store.contains(employee_id) {
            return Err(ClientError::UnknownEmployee(employee_id));
        }

        let key = FieldKey::new(employee_id, edit.field());
        if let Some(pending) = self.pending.get_mut(&key) {
            pending.rollback = edit;
            return Ok(ExternalUpdate::Suppressed);
        }

        store.apply_field_edit(employee_id, edit)?;
        Ok(ExternalUpdate::Applied)
    }

    /// 用快照全量替换 store，Pending 字段保留提议值
    pub fn apply_snapshot(&mut self, store: &mut EmployeeStore, snapshot: Vec<EmployeeRecord>) {
        let mut records = snapshot;
        for record in &mut records {
            let id = record.id;
            for (key, pending) in self
                .pending
                .iter_mut()
                .filter(|(k, _)| k.employee_id == id)
            {
                pending.rollback = record.field_value(key.field);
                record.apply(pending.proposed.clone());
            }
        }
        store.replace_all(records);
    }

    pub fn is_pending(&self, key: &FieldKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_keys(&self) -> BTreeSet<FieldKey> {
        self.pending.keys().copied().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
