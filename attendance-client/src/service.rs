//! 员工存储请求接口
//!
//! Dispatcher 只通过 [`EmployeeService`] 发出请求，生产环境由
//! [`HttpClient`] 实现，测试中替换为脚本化实现。

use async_trait::async_trait;
use shared::models::{DashboardSnapshot, EmployeeCreate, EmployeeId, EmployeeRecord, FieldEdit};

use crate::{ClientResult, HttpClient};

#[async_trait]
pub trait EmployeeService: Send + Sync {
    /// 全量快照
    async fn fetch_snapshot(&self) -> ClientResult<DashboardSnapshot>;

    /// 注册员工，返回创建的记录
    async fn create_employee(&self, payload: EmployeeCreate) -> ClientResult<EmployeeRecord>;

    /// 修改单个字段，返回服务端确认的值 (可能经过规范化)
    async fn edit_field(&self, id: EmployeeId, edit: FieldEdit) -> ClientResult<FieldEdit>;
}

#[async_trait]
impl EmployeeService for HttpClient {
    async fn fetch_snapshot(&self) -> ClientResult<DashboardSnapshot> {
        self.dashboard().await
    }

    async fn create_employee(&self, payload: EmployeeCreate) -> ClientResult<EmployeeRecord> {
        Ok(HttpClient::create_employee(self, &payload).await?.record)
    }

    async fn edit_field(&self, id: EmployeeId, edit: FieldEdit) -> ClientResult<FieldEdit> {
        Ok(HttpClient::edit_field(self, id, &edit).await?.confirmed)
    }
}
