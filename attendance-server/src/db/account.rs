//! Account Repository

use super::{MemoryDb, UserAccount, email_key};

#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: MemoryDb,
}

impl AccountRepository {
    pub fn new(db: MemoryDb) -> Self {
        Self { db }
    }

    /// 按邮箱查找 (不区分大小写)
    pub fn find_by_email(&self, email: &str) -> Option<UserAccount> {
        self.db.accounts.get(&email_key(email)).map(|a| a.clone())
    }

    pub fn count(&self) -> usize {
        self.db.accounts.len()
    }
}
