//! Attendance Client - 管理员实时看板客户端
//!
//! - [`HttpClient`]: REST 接口
//! - [`EventChannel`]: 事件推送通道，自动重连
//! - [`Dispatcher`]: 串行处理编辑、推送与请求结果，维护 [`DashboardView`]
//! - [`DashboardSession`]: 登录后把以上组件组装成一个会话

pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod reconciler;
pub mod service;
pub mod session;
pub mod store;
pub mod view;

pub use channel::{ChannelSignal, EventChannel};
pub use config::ClientConfig;
pub use dispatcher::{Dispatcher, DispatcherHandle};
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use reconciler::{EditTicket, FieldKey, Reconciler, Resolution};
pub use service::EmployeeService;
pub use session::DashboardSession;
pub use store::EmployeeStore;
pub use view::{ConnectionStatus, DashboardView, Notice};

// Re-export shared types for convenience
pub use shared::client::{CurrentUserResponse, LoginResponse};
pub use shared::message::DashboardEvent;
pub use shared::models::{EmployeeCreate, EmployeeField, EmployeeId, EmployeeRecord, FieldEdit};
