//! 看板快照
//!
//! 建议消息对客户端是不透明字符串，由当前员工状态推导。

use chrono::NaiveDate;
use shared::models::{DashboardSnapshot, EmployeeRecord, Recommendation};

use crate::db::EmployeeRepository;

/// 连续警告达到该数量时建议面谈
const WARNING_REVIEW_THRESHOLD: usize = 3;

/// 构建 `GET /api/admin/dashboard` 响应
pub fn build_snapshot(repo: &EmployeeRepository, today: NaiveDate) -> DashboardSnapshot {
    let attendance = repo.find_all();
    let recommendations = recommendations(&attendance, today);
    DashboardSnapshot {
        attendance,
        recommendations,
    }
}

pub fn recommendations(records: &[EmployeeRecord], today: NaiveDate) -> Vec<Recommendation> {
    let mut out = Vec::new();

    for record in records {
        if record.leave_days == 0 {
            out.push(Recommendation::for_employee(
                record.id,
                format!("{} has no leave days remaining", record.name),
            ));
        }

        match record.warnings.len() {
            0 => {}
            n if n >= WARNING_REVIEW_THRESHOLD => out.push(Recommendation::for_employee(
                record.id,
                format!("{} has {n} warnings, schedule a review", record.name),
            )),
            n => out.push(Recommendation::for_employee(
                record.id,
                format!("{} has {n} open warning(s)", record.name),
            )),
        }

        if let Some(schedule) = record.job_schedule
            && schedule.date == today
            && !record.is_clocked_in()
        {
            out.push(Recommendation::for_employee(
                record.id,
                format!(
                    "{} is scheduled for today's {:?} shift but not clocked in",
                    record.name, schedule.shift
                ),
            ));
        }
    }

    out
}
