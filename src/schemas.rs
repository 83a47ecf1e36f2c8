use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = String;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: UserId,
    pub name: String,
}

/// One payer covering a cost, split equally among the participants.
///
/// `amount` is an exact integer in minor currency units (cents). The split
/// itself is not stored; balances are always derived from the ledger so a
/// deletion can never leave a stale share behind.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: i64,
    pub payer: UserId,
    pub participants: Vec<UserId>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A recorded peer-to-peer payment: `from` transferred `amount` to `to`.
/// Append-only; settlements are never edited or deleted.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub id: String,
    pub from: UserId,
    pub to: UserId,
    pub amount: i64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// A group document owns its membership list and its full ledger.
///
/// Keeping the ledger inside the group document means a read is one
/// snapshot and every ledger write is one atomic document update.
/// `ledger_version` increments on every write and keys the balance cache.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub members: Vec<Member>,
    pub expenses: Vec<Expense>,
    pub settlements: Vec<Settlement>,
    #[serde(default)]
    pub ledger_version: i64,
}

impl Group {
    pub fn new(id: String, name: String, creator: Member) -> Self {
        Self {
            id,
            name,
            members: vec![creator],
            expenses: vec![],
            settlements: vec![],
            ledger_version: 0,
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|member| member.id == user_id)
    }
}
