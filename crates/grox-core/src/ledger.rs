//! # Ledger Reconstruction
//!
//! Rebuilds a product's stock history and running balance from stored events,
//! without trusting the cached [`StockLevel`](crate::types::StockLevel).
//!
//! ## Replay
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ledger_entries (stock_in, stock_out, return, adjustment)               │
//! │          │                                     sale lines of sales in   │
//! │          │                                     completed / partially_   │
//! │          ▼                                     returned / fully_refunded│
//! │   LedgerEvent::from_entry ──┐            ┌── LedgerEvent::from_sold_line│
//! │                             ▼            ▼                              │
//! │          sort by (occurred_at, recorded_at, source, seq)                │
//! │                             │                                           │
//! │                             ▼                                           │
//! │          balance_i = balance_{i-1} + in_i − out_i   (BalancePolicy)     │
//! │                             │                                           │
//! │                             ▼                                           │
//! │                 current_stock = last balance                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ledger entries of type `sale` are skipped: the sale line is the
//! authoritative OUT event, so a sale whose ledger append never happened is
//! still counted exactly once.
//!
//! Events with the same `occurred_at` replay in the order they were written
//! (`recorded_at`). Source and rowid only separate events written in the
//! same instant.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::dto::{Direction, LedgerRow};
use crate::error::ValidationError;
use crate::stock::apply_delta;
use crate::types::{invoice_label, LedgerEntry, LedgerEventType, SaleStatus};

// =============================================================================
// Balance Policy
// =============================================================================

/// How intermediate running balances are treated during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BalancePolicy {
    /// Report the arithmetic balance, which goes negative when stock was
    /// oversold. Shows the shortfall.
    #[default]
    AllowNegative,
    /// Floor every intermediate balance at zero, like the stock mutator.
    Clamp,
}

impl BalancePolicy {
    fn apply(&self, previous: i64, quantity_in: i64, quantity_out: i64) -> i64 {
        let delta = quantity_in - quantity_out;
        match self {
            BalancePolicy::AllowNegative => previous + delta,
            BalancePolicy::Clamp => apply_delta(previous, delta),
        }
    }
}

impl fmt::Display for BalancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalancePolicy::AllowNegative => f.write_str("allow_negative"),
            BalancePolicy::Clamp => f.write_str("clamp"),
        }
    }
}

impl FromStr for BalancePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow_negative" | "negative" => Ok(BalancePolicy::AllowNegative),
            "clamp" => Ok(BalancePolicy::Clamp),
            _ => Err(ValidationError::NotAllowed {
                field: "ledger balance policy".to_string(),
                allowed: vec!["allow_negative".to_string(), "clamp".to_string()],
            }),
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Where an event was read from. Order of variants is the last-resort
/// tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventSource {
    LedgerEntry,
    SaleLine,
}

/// A sale line joined with its sale, as read for replay.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SoldLine {
    /// Insertion order of the line (SQLite rowid).
    pub seq: i64,
    pub sale_id: String,
    pub invoice_number: i64,
    pub status: SaleStatus,
    pub cashier: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub cost_price_cents: i64,
    /// When the sale took stock (completion time for a held sale).
    pub sold_at: DateTime<Utc>,
    /// When the line's stock movement was written.
    pub recorded_at: DateTime<Utc>,
}

/// One normalized stock movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
    pub occurred_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub source: EventSource,
    pub seq: i64,
    pub event_type: LedgerEventType,
    pub quantity_in: i64,
    pub quantity_out: i64,
    pub reference_number: Option<String>,
    pub supplier_name: Option<String>,
    pub cashier: Option<String>,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub note: Option<String>,
}

impl LedgerEvent {
    /// Normalizes a stored ledger entry. Returns `None` for `sale` entries,
    /// which are replayed from sale lines instead.
    pub fn from_entry(entry: &LedgerEntry, seq: i64, supplier_name: Option<String>) -> Option<Self> {
        let delta = entry.quantity_delta;
        let (quantity_in, quantity_out) = match entry.event_type {
            LedgerEventType::Sale => return None,
            LedgerEventType::StockIn | LedgerEventType::Return => (delta.abs(), 0),
            LedgerEventType::StockOut => (0, delta.abs()),
            LedgerEventType::Adjustment if delta >= 0 => (delta, 0),
            LedgerEventType::Adjustment => (0, -delta),
        };

        Some(LedgerEvent {
            occurred_at: entry.occurred_at,
            recorded_at: entry.created_at,
            source: EventSource::LedgerEntry,
            seq,
            event_type: entry.event_type,
            quantity_in,
            quantity_out,
            reference_number: entry.reference_number.clone(),
            supplier_name,
            cashier: entry.recorded_by.clone(),
            cost_price_cents: entry.cost_price_cents,
            selling_price_cents: entry.selling_price_cents,
            note: entry.note.clone(),
        })
    }

    /// Normalizes a sale line. Returns `None` unless the sale's status counts
    /// toward stock.
    pub fn from_sold_line(line: &SoldLine) -> Option<Self> {
        if !line.status.affects_stock() {
            return None;
        }

        Some(LedgerEvent {
            occurred_at: line.sold_at,
            recorded_at: line.recorded_at,
            source: EventSource::SaleLine,
            seq: line.seq,
            event_type: LedgerEventType::Sale,
            quantity_in: 0,
            quantity_out: line.quantity,
            reference_number: Some(invoice_label(line.invoice_number)),
            supplier_name: None,
            cashier: line.cashier.clone(),
            cost_price_cents: line.cost_price_cents,
            selling_price_cents: line.unit_price_cents,
            note: None,
        })
    }

    fn direction(&self) -> Direction {
        if self.quantity_in > 0 || (self.quantity_in == 0 && self.quantity_out == 0) {
            Direction::In
        } else {
            Direction::Out
        }
    }
}

// =============================================================================
// Replay
// =============================================================================

/// Result of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    /// Balance after the last event; 0 for a product without history.
    pub current_stock: i64,
    /// What the floored stock level should hold after the same events.
    /// Comparable with the cached stock whatever the policy.
    pub floored_stock: i64,
    /// One row per event, oldest first.
    pub rows: Vec<LedgerRow>,
}

/// Sorts `events` chronologically and accumulates the running balance.
///
/// Deterministic: the same events always produce the same replay.
pub fn reconstruct(mut events: Vec<LedgerEvent>, policy: BalancePolicy) -> Replay {
    events.sort_by(|a, b| {
        (a.occurred_at, a.recorded_at, a.source, a.seq)
            .cmp(&(b.occurred_at, b.recorded_at, b.source, b.seq))
    });

    let mut balance = 0_i64;
    let mut floored = 0_i64;
    let rows = events
        .into_iter()
        .map(|event| {
            balance = policy.apply(balance, event.quantity_in, event.quantity_out);
            floored = apply_delta(floored, event.quantity_in - event.quantity_out);
            LedgerRow {
                date: event.occurred_at,
                direction: event.direction(),
                event_type: event.event_type,
                reference_number: event.reference_number.clone(),
                supplier_name: event.supplier_name.clone(),
                cashier: event.cashier.clone(),
                quantity_in: event.quantity_in,
                quantity_out: event.quantity_out,
                cost_price: event.cost_price_cents,
                selling_price: event.selling_price_cents,
                note: event.note.clone(),
                balance,
            }
        })
        .collect();

    Replay {
        current_stock: balance,
        floored_stock: floored,
        rows,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::days(n)
    }

    fn entry(event_type: LedgerEventType, delta: i64, at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id: format!("le-{}-{delta}", event_type.as_str()),
            product_id: "p-1".to_string(),
            supplier_id: None,
            event_type,
            quantity_delta: delta,
            resulting_balance: 0,
            cost_price_cents: 100,
            selling_price_cents: 150,
            reference_id: None,
            reference_number: Some("GRN-1".to_string()),
            recorded_by: Some("stock-clerk".to_string()),
            note: None,
            occurred_at: at,
            created_at: at,
        }
    }

    fn sold(seq: i64, qty: i64, at: DateTime<Utc>, status: SaleStatus) -> SoldLine {
        SoldLine {
            seq,
            sale_id: format!("s-{seq}"),
            invoice_number: seq,
            status,
            cashier: Some("amina".to_string()),
            quantity: qty,
            unit_price_cents: 150,
            cost_price_cents: 100,
            sold_at: at,
            recorded_at: at,
        }
    }

    /// Opening 10, +20 on day 1, sale of 5 on day 2, sale of 30 on day 3.
    fn oversold_history() -> Vec<LedgerEvent> {
        let mut events = vec![
            LedgerEvent::from_entry(&entry(LedgerEventType::Adjustment, 10, day(0)), 1, None).unwrap(),
            LedgerEvent::from_entry(&entry(LedgerEventType::StockIn, 20, day(1)), 2, Some("Acme".into()))
                .unwrap(),
        ];
        events.push(LedgerEvent::from_sold_line(&sold(1, 5, day(2), SaleStatus::Completed)).unwrap());
        events.push(LedgerEvent::from_sold_line(&sold(2, 30, day(3), SaleStatus::Completed)).unwrap());
        events
    }

    #[test]
    fn test_oversold_history_allow_negative() {
        let replay = reconstruct(oversold_history(), BalancePolicy::AllowNegative);
        let balances: Vec<i64> = replay.rows.iter().map(|r| r.balance).collect();
        assert_eq!(balances, vec![10, 30, 25, -5]);
        assert_eq!(replay.current_stock, -5);
        assert_eq!(replay.floored_stock, 0);
        assert_eq!(replay.rows[3].quantity_out, 30);
    }

    #[test]
    fn test_oversold_history_clamped() {
        let replay = reconstruct(oversold_history(), BalancePolicy::Clamp);
        let balances: Vec<i64> = replay.rows.iter().map(|r| r.balance).collect();
        assert_eq!(balances, vec![10, 30, 25, 0]);
        assert_eq!(replay.current_stock, 0);
        // the row still records the full quantity sold
        assert_eq!(replay.rows[3].quantity_out, 30);
    }

    #[test]
    fn test_events_sorted_by_time_not_input_order() {
        let mut events = oversold_history();
        events.reverse();
        let replay = reconstruct(events, BalancePolicy::AllowNegative);
        assert_eq!(replay.rows[0].date, day(0));
        assert_eq!(replay.rows[3].date, day(3));
        assert_eq!(replay.current_stock, -5);
    }

    #[test]
    fn test_current_stock_is_signed_sum() {
        let events = oversold_history();
        let signed: i64 = events.iter().map(|e| e.quantity_in - e.quantity_out).sum();
        assert_eq!(reconstruct(events, BalancePolicy::AllowNegative).current_stock, signed);
    }

    #[test]
    fn test_replay_is_idempotent() {
        let first = reconstruct(oversold_history(), BalancePolicy::AllowNegative);
        let second = reconstruct(oversold_history(), BalancePolicy::AllowNegative);
        assert_eq!(first, second);
    }

    #[test]
    fn test_equal_timestamps_replay_in_write_order() {
        let at = day(1);
        // sale line written first, then a delivery backdated to the same instant
        let line = sold(3, 4, at, SaleStatus::Completed);
        let mut delivery = entry(LedgerEventType::StockIn, 6, at);
        delivery.created_at = at + Duration::minutes(5);

        let events = vec![
            LedgerEvent::from_entry(&delivery, 1, None).unwrap(),
            LedgerEvent::from_sold_line(&line).unwrap(),
        ];

        let replay = reconstruct(events, BalancePolicy::AllowNegative);
        let balances: Vec<i64> = replay.rows.iter().map(|r| r.balance).collect();
        assert_eq!(replay.rows[0].reference_number.as_deref(), Some("INV-000003"));
        assert_eq!(balances, vec![-4, 2]);
    }

    #[test]
    fn test_same_write_instant_ledger_first_then_insertion_order() {
        let at = day(1);
        let events = vec![
            LedgerEvent::from_sold_line(&sold(9, 2, at, SaleStatus::Completed)).unwrap(),
            LedgerEvent::from_sold_line(&sold(4, 1, at, SaleStatus::Completed)).unwrap(),
            LedgerEvent::from_entry(&entry(LedgerEventType::StockIn, 3, at), 7, None).unwrap(),
        ];

        let replay = reconstruct(events, BalancePolicy::AllowNegative);
        let refs: Vec<Option<String>> = replay.rows.iter().map(|r| r.reference_number.clone()).collect();
        assert_eq!(
            refs,
            vec![
                Some("GRN-1".to_string()),
                Some("INV-000004".to_string()),
                Some("INV-000009".to_string()),
            ]
        );
        assert_eq!(replay.current_stock, 0);
    }

    #[test]
    fn test_sale_entries_and_non_stock_sales_skipped() {
        assert!(LedgerEvent::from_entry(&entry(LedgerEventType::Sale, -5, day(1)), 1, None).is_none());
        assert!(LedgerEvent::from_sold_line(&sold(1, 5, day(1), SaleStatus::Pending)).is_none());
        assert!(LedgerEvent::from_sold_line(&sold(1, 5, day(1), SaleStatus::Cancelled)).is_none());
        assert!(LedgerEvent::from_sold_line(&sold(1, 5, day(1), SaleStatus::FullyRefunded)).is_some());
    }

    #[test]
    fn test_directions() {
        let back = LedgerEvent::from_entry(&entry(LedgerEventType::Return, 2, day(1)), 1, None).unwrap();
        assert_eq!((back.quantity_in, back.quantity_out), (2, 0));

        let lost = LedgerEvent::from_entry(&entry(LedgerEventType::StockOut, -3, day(1)), 2, None).unwrap();
        assert_eq!((lost.quantity_in, lost.quantity_out), (0, 3));

        let recount = LedgerEvent::from_entry(&entry(LedgerEventType::Adjustment, -4, day(1)), 3, None).unwrap();
        assert_eq!((recount.quantity_in, recount.quantity_out), (0, 4));

        let replay = reconstruct(vec![back, lost, recount], BalancePolicy::AllowNegative);
        assert_eq!(replay.rows[0].direction, Direction::In);
        assert_eq!(replay.rows[1].direction, Direction::Out);
        assert_eq!(replay.current_stock, -5);
    }

    #[test]
    fn test_empty_history() {
        let replay = reconstruct(Vec::new(), BalancePolicy::Clamp);
        assert_eq!(replay.current_stock, 0);
        assert!(replay.rows.is_empty());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("clamp".parse::<BalancePolicy>().unwrap(), BalancePolicy::Clamp);
        assert_eq!(
            " ALLOW_NEGATIVE ".parse::<BalancePolicy>().unwrap(),
            BalancePolicy::AllowNegative
        );
        assert!("floor".parse::<BalancePolicy>().is_err());
        assert_eq!(BalancePolicy::Clamp.to_string(), "clamp");
    }
}
