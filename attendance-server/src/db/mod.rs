//! 存储层 - 内存中的员工与账号表
//!
//! 持久化的考勤存储是外部协作方；这里实现其请求/响应契约，
//! 供看板与事件广播使用。
//!
//! # 模块结构
//!
//! - [`MemoryDb`] - 共享表 (Clone 浅拷贝)
//! - [`EmployeeRepository`] - 员工记录仓库
//! - [`AccountRepository`] - 登录账号仓库
//! - [`seed`] - 默认账号

pub mod account;
pub mod employee;
pub mod models;
pub mod seed;

pub use account::AccountRepository;
pub use employee::EmployeeRepository;
pub use models::UserAccount;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;

use dashmap::DashMap;
use parking_lot::RwLock;
use shared::models::{EmployeeId, EmployeeRecord};

/// 内存数据库
///
/// | 表 | 类型 | 说明 |
/// |----|------|------|
/// | employees | RwLock<BTreeMap> | 按 id 有序，读多写少 |
/// | accounts | DashMap | 小写邮箱 → 账号 |
#[derive(Debug, Clone)]
pub struct MemoryDb {
    pub(crate) employees: Arc<RwLock<BTreeMap<EmployeeId, EmployeeRecord>>>,
    pub(crate) accounts: Arc<DashMap<String, UserAccount>>,
    pub(crate) next_id: Arc<AtomicI64>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self {
            employees: Arc::new(RwLock::new(BTreeMap::new())),
            accounts: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

/// 邮箱作为账号键时统一小写
pub(crate) fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
