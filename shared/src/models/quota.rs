//! Quota ledger
//!
//! A client's per-category work allowance, stored as a JSON object on
//! `users.quota`:
//!
//! ```json
//! { "blog": { "total": 10, "remaining": 9 }, "follower": { "total": 5, "remaining": 5 } }
//! ```
//!
//! `users.remaining_quota` is a materialized sum of `remaining` over
//! [`QuotaCategory::ALL`] and is recomputed from the ledger on every write.
//! A ledger whose every canonical category has `total == 0` is the unmetered
//! (one-month / manual) plan and bypasses reservation checks entirely.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AppError, ErrorCode};

/// Canonical quota category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaCategory {
    Follower,
    Like,
    Hotpost,
    Momcafe,
    Powerblog,
    Clip,
    Blog,
    Receipt,
    Daangn,
    Experience,
    Myexpense,
}

impl QuotaCategory {
    /// The one authoritative category set. Every aggregate and every write
    /// path iterates this list.
    pub const ALL: [QuotaCategory; 11] = [
        QuotaCategory::Follower,
        QuotaCategory::Like,
        QuotaCategory::Hotpost,
        QuotaCategory::Momcafe,
        QuotaCategory::Powerblog,
        QuotaCategory::Clip,
        QuotaCategory::Blog,
        QuotaCategory::Receipt,
        QuotaCategory::Daangn,
        QuotaCategory::Experience,
        QuotaCategory::Myexpense,
    ];

    /// JSON key inside `users.quota`
    pub const fn key(&self) -> &'static str {
        match self {
            QuotaCategory::Follower => "follower",
            QuotaCategory::Like => "like",
            QuotaCategory::Hotpost => "hotpost",
            QuotaCategory::Momcafe => "momcafe",
            QuotaCategory::Powerblog => "powerblog",
            QuotaCategory::Clip => "clip",
            QuotaCategory::Blog => "blog",
            QuotaCategory::Receipt => "receipt",
            QuotaCategory::Daangn => "daangn",
            QuotaCategory::Experience => "experience",
            QuotaCategory::Myexpense => "myexpense",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Display label used in client-facing messages
    pub const fn label(&self) -> &'static str {
        match self {
            QuotaCategory::Follower => "팔로워",
            QuotaCategory::Like => "좋아요",
            QuotaCategory::Hotpost => "인기게시물",
            QuotaCategory::Momcafe => "맘카페",
            QuotaCategory::Powerblog => "파워블로그",
            QuotaCategory::Clip => "클립",
            QuotaCategory::Blog => "블로그 리뷰",
            QuotaCategory::Receipt => "영수증 리뷰",
            QuotaCategory::Daangn => "당근",
            QuotaCategory::Experience => "체험단",
            QuotaCategory::Myexpense => "내돈내산",
        }
    }
}

impl fmt::Display for QuotaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Allowance for a single category. Invariant: `0 <= remaining <= total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaEntry {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub remaining: i64,
}

impl QuotaEntry {
    pub const fn new(total: i64, remaining: i64) -> Self {
        Self { total, remaining }
    }

    /// Full allowance, nothing consumed yet
    pub const fn full(total: i64) -> Self {
        Self {
            total,
            remaining: total,
        }
    }
}

/// Admin-supplied replacement for the whole ledger
pub type QuotaSnapshot = BTreeMap<QuotaCategory, QuotaEntry>;

/// Outcome of a successful reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// Unmetered plan: nothing was debited
    Unmetered,
    /// `count` units were debited; `remaining` is the new balance
    Debited {
        category: QuotaCategory,
        count: i64,
        remaining: i64,
    },
}

/// Quota ledger errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuotaError {
    #[error(
        "{} 잔여 수량이 부족합니다 (요청 {requested}건, 잔여 {remaining}건, 부족 {}건)",
        category.label(),
        requested - remaining
    )]
    Insufficient {
        category: QuotaCategory,
        requested: i64,
        remaining: i64,
    },

    #[error("수량은 1 이상이어야 합니다 (요청 {0})")]
    InvalidCount(i64),

    #[error("{} 수량이 올바르지 않습니다: {reason}", category.label())]
    InvalidEntry {
        category: QuotaCategory,
        reason: &'static str,
    },
}

impl QuotaError {
    /// Units missing for an insufficient reservation
    pub fn shortfall(&self) -> i64 {
        match self {
            QuotaError::Insufficient {
                requested,
                remaining,
                ..
            } => requested - remaining,
            _ => 0,
        }
    }
}

impl From<QuotaError> for AppError {
    fn from(err: QuotaError) -> Self {
        let message = err.to_string();
        match err {
            QuotaError::Insufficient {
                category,
                requested,
                remaining,
            } => AppError::with_message(ErrorCode::InsufficientQuota, message)
                .with_detail("category", category.key())
                .with_detail("requested", requested)
                .with_detail("remaining", remaining)
                .with_detail("shortfall", requested - remaining),
            QuotaError::InvalidCount(_) => AppError::validation(message),
            QuotaError::InvalidEntry { category, .. } => {
                AppError::validation(message).with_detail("category", category.key())
            }
        }
    }
}

/// Per-category allowance map
///
/// Keys outside [`QuotaCategory::ALL`] are carried through untouched (legacy
/// rows) but never counted. Reading is tolerant: a missing or malformed
/// category reads as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuotaLedger {
    entries: BTreeMap<String, QuotaEntry>,
}

impl QuotaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from an admin snapshot, enforcing `0 <= remaining <= total`
    pub fn from_snapshot(snapshot: &QuotaSnapshot) -> Result<Self, QuotaError> {
        let mut ledger = Self::new();
        for (category, entry) in snapshot {
            if entry.total < 0 || entry.remaining < 0 {
                return Err(QuotaError::InvalidEntry {
                    category: *category,
                    reason: "음수는 허용되지 않습니다",
                });
            }
            if entry.remaining > entry.total {
                return Err(QuotaError::InvalidEntry {
                    category: *category,
                    reason: "잔여 수량이 총 수량보다 클 수 없습니다",
                });
            }
            ledger.entries.insert(category.key().to_string(), *entry);
        }
        Ok(ledger)
    }

    /// Admin override: replace the whole map. On error the ledger is unchanged.
    pub fn direct_set(&mut self, snapshot: &QuotaSnapshot) -> Result<(), QuotaError> {
        *self = Self::from_snapshot(snapshot)?;
        Ok(())
    }

    pub fn entry(&self, category: QuotaCategory) -> QuotaEntry {
        self.entries
            .get(category.key())
            .copied()
            .unwrap_or_default()
    }

    pub fn remaining(&self, category: QuotaCategory) -> i64 {
        self.entry(category).remaining
    }

    pub fn total(&self, category: QuotaCategory) -> i64 {
        self.entry(category).total
    }

    /// Every canonical category has `total == 0`
    pub fn is_unmetered(&self) -> bool {
        QuotaCategory::ALL.iter().all(|c| self.total(*c) == 0)
    }

    /// Aggregate `remainingQuota` over the canonical category set
    pub fn remaining_total(&self) -> i64 {
        QuotaCategory::ALL.iter().map(|c| self.remaining(*c)).sum()
    }

    /// Check `remaining[category] >= count` and debit on success.
    ///
    /// The ledger is left untouched on every error path.
    pub fn reserve(
        &mut self,
        category: QuotaCategory,
        count: i64,
    ) -> Result<Reservation, QuotaError> {
        if count < 1 {
            return Err(QuotaError::InvalidCount(count));
        }
        if self.is_unmetered() {
            return Ok(Reservation::Unmetered);
        }

        let entry = self.entry(category);
        if entry.remaining < count {
            return Err(QuotaError::Insufficient {
                category,
                requested: count,
                remaining: entry.remaining,
            });
        }

        let remaining = entry.remaining - count;
        self.entries.insert(
            category.key().to_string(),
            QuotaEntry::new(entry.total, remaining),
        );
        Ok(Reservation::Debited {
            category,
            count,
            remaining,
        })
    }

    /// Canonical categories with their entries, in declaration order
    pub fn canonical_entries(&self) -> impl Iterator<Item = (QuotaCategory, QuotaEntry)> + '_ {
        QuotaCategory::ALL.into_iter().map(|c| (c, self.entry(c)))
    }
}

impl<'de> Deserialize<'de> for QuotaLedger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let Value::Object(map) = raw else {
            return Ok(QuotaLedger::new());
        };

        let entries = map
            .into_iter()
            .map(|(key, value)| {
                let entry = QuotaEntry {
                    total: lenient_count(value.get("total")),
                    remaining: lenient_count(value.get("remaining")),
                };
                (key, entry)
            })
            .collect();
        Ok(QuotaLedger { entries })
    }
}

/// Parse a stored count that may be a number, a numeric string, or garbage.
/// Garbage and negatives read as zero.
fn lenient_count(value: Option<&Value>) -> i64 {
    let n = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.floor() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    n.max(0)
}

/// Purchased plan used to seed a new client's ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Basic,
    Standard,
    Premium,
    /// Manual/unlimited tier: every total is zero, so every check is bypassed
    OneMonth,
}

impl Plan {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Plan::Basic => "basic",
            Plan::Standard => "standard",
            Plan::Premium => "premium",
            Plan::OneMonth => "one_month",
        }
    }

    /// Initial quota snapshot for the plan
    pub fn initial_quota(&self) -> QuotaLedger {
        let totals: &[(QuotaCategory, i64)] = match self {
            Plan::Basic => &[
                (QuotaCategory::Blog, 10),
                (QuotaCategory::Receipt, 10),
                (QuotaCategory::Follower, 5),
                (QuotaCategory::Like, 5),
            ],
            Plan::Standard => &[
                (QuotaCategory::Blog, 20),
                (QuotaCategory::Receipt, 20),
                (QuotaCategory::Follower, 10),
                (QuotaCategory::Like, 10),
                (QuotaCategory::Hotpost, 5),
                (QuotaCategory::Momcafe, 5),
                (QuotaCategory::Clip, 5),
            ],
            Plan::Premium => &[
                (QuotaCategory::Blog, 40),
                (QuotaCategory::Receipt, 40),
                (QuotaCategory::Follower, 20),
                (QuotaCategory::Like, 20),
                (QuotaCategory::Hotpost, 10),
                (QuotaCategory::Momcafe, 10),
                (QuotaCategory::Powerblog, 5),
                (QuotaCategory::Clip, 10),
                (QuotaCategory::Daangn, 5),
                (QuotaCategory::Experience, 5),
                (QuotaCategory::Myexpense, 5),
            ],
            Plan::OneMonth => &[],
        };

        let snapshot: QuotaSnapshot = totals
            .iter()
            .map(|(c, total)| (*c, QuotaEntry::full(*total)))
            .collect();
        // Preset tables are non-negative with remaining == total
        QuotaLedger::from_snapshot(&snapshot).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(entries: &[(QuotaCategory, i64, i64)]) -> QuotaLedger {
        let snapshot: QuotaSnapshot = entries
            .iter()
            .map(|(c, t, r)| (*c, QuotaEntry::new(*t, *r)))
            .collect();
        QuotaLedger::from_snapshot(&snapshot).unwrap()
    }

    #[test]
    fn test_reserve_debits_exactly_count() {
        let mut q = ledger(&[(QuotaCategory::Blog, 10, 10)]);
        let r = q.reserve(QuotaCategory::Blog, 1).unwrap();
        assert_eq!(
            r,
            Reservation::Debited {
                category: QuotaCategory::Blog,
                count: 1,
                remaining: 9
            }
        );
        assert_eq!(q.remaining(QuotaCategory::Blog), 9);
        assert_eq!(q.total(QuotaCategory::Blog), 10);
        assert_eq!(q.remaining_total(), 9);
    }

    #[test]
    fn test_n_reservations_decrease_by_n_and_stop_at_zero() {
        let mut q = ledger(&[(QuotaCategory::Like, 3, 3), (QuotaCategory::Blog, 5, 5)]);
        for _ in 0..3 {
            q.reserve(QuotaCategory::Like, 1).unwrap();
        }
        assert_eq!(q.remaining(QuotaCategory::Like), 0);

        let err = q.reserve(QuotaCategory::Like, 1).unwrap_err();
        assert_eq!(err.shortfall(), 1);
        assert_eq!(q.remaining(QuotaCategory::Like), 0);
        assert_eq!(q.remaining(QuotaCategory::Blog), 5);
    }

    #[test]
    fn test_insufficient_iff_remaining_below_count() {
        let mut q = ledger(&[(QuotaCategory::Blog, 10, 2)]);
        assert!(q.clone().reserve(QuotaCategory::Blog, 2).is_ok());

        let err = q.reserve(QuotaCategory::Blog, 3).unwrap_err();
        assert_eq!(
            err,
            QuotaError::Insufficient {
                category: QuotaCategory::Blog,
                requested: 3,
                remaining: 2
            }
        );
        assert_eq!(q.remaining(QuotaCategory::Blog), 2);
    }

    #[test]
    fn test_insufficient_message_reports_shortfall() {
        let err = QuotaError::Insufficient {
            category: QuotaCategory::Blog,
            requested: 3,
            remaining: 2,
        };
        let message = err.to_string();
        assert!(message.contains("블로그 리뷰"));
        assert!(message.contains("부족 1건"));

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InsufficientQuota);
        assert_eq!(app.details.unwrap()["shortfall"], 1);
    }

    #[test]
    fn test_unmetered_plan_bypasses_checks() {
        let mut q = QuotaLedger::new();
        assert!(q.is_unmetered());
        assert_eq!(
            q.reserve(QuotaCategory::Blog, 50).unwrap(),
            Reservation::Unmetered
        );
        assert_eq!(q, QuotaLedger::new());

        let mut q = ledger(&[(QuotaCategory::Blog, 0, 0), (QuotaCategory::Like, 0, 0)]);
        assert!(q.reserve(QuotaCategory::Like, 1).is_ok());
    }

    #[test]
    fn test_one_nonzero_total_makes_ledger_metered() {
        let mut q = ledger(&[(QuotaCategory::Follower, 1, 0)]);
        assert!(!q.is_unmetered());
        assert!(q.reserve(QuotaCategory::Blog, 1).is_err());
    }

    #[test]
    fn test_missing_category_reads_as_zero() {
        let mut q = ledger(&[(QuotaCategory::Blog, 5, 5)]);
        assert_eq!(q.entry(QuotaCategory::Clip), QuotaEntry::default());
        let err = q.reserve(QuotaCategory::Clip, 1).unwrap_err();
        assert_eq!(err.shortfall(), 1);
    }

    #[test]
    fn test_invalid_count_rejected() {
        let mut q = ledger(&[(QuotaCategory::Blog, 5, 5)]);
        assert_eq!(
            q.reserve(QuotaCategory::Blog, 0),
            Err(QuotaError::InvalidCount(0))
        );
    }

    #[test]
    fn test_snapshot_validation() {
        let mut snapshot = QuotaSnapshot::new();
        snapshot.insert(QuotaCategory::Blog, QuotaEntry::new(5, 6));
        assert!(QuotaLedger::from_snapshot(&snapshot).is_err());

        snapshot.insert(QuotaCategory::Blog, QuotaEntry::new(-1, 0));
        assert!(QuotaLedger::from_snapshot(&snapshot).is_err());

        snapshot.insert(QuotaCategory::Blog, QuotaEntry::new(5, 5));
        assert!(QuotaLedger::from_snapshot(&snapshot).is_ok());
    }

    #[test]
    fn test_direct_set_replaces_whole_map() {
        let mut q = ledger(&[(QuotaCategory::Blog, 10, 3), (QuotaCategory::Like, 4, 4)]);

        let mut bad = QuotaSnapshot::new();
        bad.insert(QuotaCategory::Clip, QuotaEntry::new(1, 2));
        assert!(q.direct_set(&bad).is_err());
        assert_eq!(q.remaining(QuotaCategory::Blog), 3);

        let mut snapshot = QuotaSnapshot::new();
        snapshot.insert(QuotaCategory::Clip, QuotaEntry::full(6));
        q.direct_set(&snapshot).unwrap();
        assert_eq!(q.remaining(QuotaCategory::Blog), 0);
        assert_eq!(q.remaining(QuotaCategory::Like), 0);
        assert_eq!(q.remaining_total(), 6);
    }

    #[test]
    fn test_aggregate_ignores_unknown_keys() {
        let q: QuotaLedger = serde_json::from_value(serde_json::json!({
            "blog": { "total": 10, "remaining": 4 },
            "like": { "total": 3, "remaining": 3 },
            "legacy_category": { "total": 100, "remaining": 100 }
        }))
        .unwrap();
        assert_eq!(q.remaining_total(), 7);

        // Unknown keys survive a round trip
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["legacy_category"]["remaining"], 100);
    }

    #[test]
    fn test_malformed_storage_reads_as_zero() {
        let q: QuotaLedger = serde_json::from_value(serde_json::json!({
            "blog": { "total": "10", "remaining": "oops" },
            "like": "not an object",
            "clip": { "total": -4, "remaining": 2.7 }
        }))
        .unwrap();
        assert_eq!(q.entry(QuotaCategory::Blog), QuotaEntry::new(10, 0));
        assert_eq!(q.entry(QuotaCategory::Like), QuotaEntry::default());
        assert_eq!(q.entry(QuotaCategory::Clip), QuotaEntry::new(0, 2));

        let q: QuotaLedger = serde_json::from_value(serde_json::Value::Null).unwrap();
        assert!(q.is_unmetered());
    }

    #[test]
    fn test_plan_presets() {
        let basic = Plan::Basic.initial_quota();
        assert_eq!(basic.entry(QuotaCategory::Blog), QuotaEntry::full(10));
        assert!(!basic.is_unmetered());
        assert!(Plan::OneMonth.initial_quota().is_unmetered());
    }

    #[test]
    fn test_category_keys() {
        for c in QuotaCategory::ALL {
            assert_eq!(QuotaCategory::from_key(c.key()), Some(c));
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.key()));
        }
        assert_eq!(QuotaCategory::from_key("blog_review"), None);
    }
}
