//! 默认账号
//!
//! | 邮箱 | 密码 | 角色 |
//! |------|------|------|
//! | admin@example.com | admin123 | admin |
//! | employee@example.com | employee123 | employee |

use shared::models::{EmployeeCreate, Role};

use super::{AccountRepository, EmployeeRepository, MemoryDb};
use crate::utils::AppResult;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_EMPLOYEE_EMAIL: &str = "employee@example.com";
pub const DEFAULT_EMPLOYEE_PASSWORD: &str = "employee123";

/// 创建缺失的默认账号，返回新建数量
pub async fn seed_default_users(db: &MemoryDb) -> AppResult<usize> {
    let accounts = AccountRepository::new(db.clone());
    let employees = EmployeeRepository::new(db.clone());

    let defaults = [
        (
            "Admin",
            DEFAULT_ADMIN_EMAIL,
            DEFAULT_ADMIN_PASSWORD,
            Role::Admin,
        ),
        (
            "Default Employee",
            DEFAULT_EMPLOYEE_EMAIL,
            DEFAULT_EMPLOYEE_PASSWORD,
            Role::Employee,
        ),
    ];

    let mut created = 0;
    for (name, email, password, role) in defaults {
        if accounts.find_by_email(email).is_some() {
            continue;
        }
        employees
            .create(
                EmployeeCreate {
                    name: name.to_string(),
                    email: email.to_string(),
                    role,
                    password: password.to_string(),
                },
                |_| {},
            )
            .await?;
        tracing::info!(email, role = role.as_str(), "Default user created");
        created += 1;
    }
    Ok(created)
}
