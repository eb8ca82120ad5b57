use serde::{Deserialize, Serialize};

/// One entry of the DART corporation code list as exported to JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpRecord {
    pub corp_code: String,
    pub corp_name: String,
    pub stock_code: String,
    pub modify_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: i64,
    pub corp_code: String,
    pub corp_name: String,
    pub stock_code: Option<String>,
    pub modify_date: Option<String>,
}

impl Company {
    /// Listed companies carry a non-blank stock code.
    pub fn is_listed(&self) -> bool {
        self.stock_code
            .as_deref()
            .map(|code| !code.trim().is_empty())
            .unwrap_or(false)
    }
}
