//! Money and progress roll-ups for a single event.
//!
//! The SQL side only groups and sums; everything derived from those totals
//! (remaining budget, committed spend, completion percent) is computed here so
//! it can be tested without a database.

use chrono::NaiveDate;
use db::models::{
    booking::{Booking, BookingStatus, BookingStatusTotal},
    budget_item::{BudgetCategoryTotal, BudgetItem},
    event::Event,
    payment::{Payment, PaymentDirection, PaymentStatus, PaymentTotal},
    task::{Task, TaskStatusCounts},
};
use serde::Serialize;
use sqlx::SqlitePool;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, TS)]
pub struct BudgetSummary {
    /// The client's overall ceiling from the event record
    pub event_budget: Option<f64>,
    pub total_planned: f64,
    pub total_actual: f64,
    pub total_paid: f64,
    /// `total_planned - total_actual`; negative when over budget
    pub remaining: f64,
    pub over_budget: bool,
    pub utilization_percent: f64,
    pub categories: Vec<BudgetCategoryTotal>,
}

impl BudgetSummary {
    pub fn from_totals(categories: Vec<BudgetCategoryTotal>, event_budget: Option<f64>) -> Self {
        let total_planned: f64 = categories.iter().map(|c| c.planned).sum();
        let total_actual: f64 = categories.iter().map(|c| c.actual).sum();
        let total_paid: f64 = categories.iter().map(|c| c.paid).sum();

        Self {
            event_budget,
            total_planned,
            total_actual,
            total_paid,
            remaining: total_planned - total_actual,
            over_budget: total_actual > total_planned,
            utilization_percent: percent(total_actual, total_planned),
            categories,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, TS)]
pub struct BookingSummary {
    pub total: i64,
    pub requested: i64,
    pub confirmed: i64,
    pub declined: i64,
    pub cancelled: i64,
    pub completed: i64,
    /// Confirmed plus completed bookings
    pub committed_amount: f64,
    /// Bookings still awaiting a vendor answer
    pub pending_amount: f64,
    pub committed_deposits: f64,
}

impl BookingSummary {
    pub fn from_totals(totals: &[BookingStatusTotal]) -> Self {
        let mut summary = Self::default();
        for row in totals {
            summary.total += row.count;
            match row.status {
                BookingStatus::Requested => {
                    summary.requested += row.count;
                    summary.pending_amount += row.amount;
                }
                BookingStatus::Confirmed | BookingStatus::Completed => {
                    if row.status == BookingStatus::Confirmed {
                        summary.confirmed += row.count;
                    } else {
                        summary.completed += row.count;
                    }
                    summary.committed_amount += row.amount;
                    summary.committed_deposits += row.deposit_amount;
                }
                BookingStatus::Declined => summary.declined += row.count,
                BookingStatus::Cancelled => summary.cancelled += row.count,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Default, Serialize, TS)]
pub struct PaymentSummary {
    pub incoming_paid: f64,
    pub outgoing_paid: f64,
    /// Pending plus overdue, money still owed to the planner
    pub incoming_outstanding: f64,
    /// Pending plus overdue, money the planner still owes
    pub outgoing_outstanding: f64,
    pub refunded: f64,
    pub overdue_count: i64,
}

impl PaymentSummary {
    pub fn from_totals(totals: &[PaymentTotal]) -> Self {
        let mut summary = Self::default();
        for row in totals {
            let incoming = row.direction == PaymentDirection::Incoming;
            match row.status {
                PaymentStatus::Paid if incoming => summary.incoming_paid += row.amount,
                PaymentStatus::Paid => summary.outgoing_paid += row.amount,
                PaymentStatus::Pending | PaymentStatus::Overdue => {
                    if incoming {
                        summary.incoming_outstanding += row.amount;
                    } else {
                        summary.outgoing_outstanding += row.amount;
                    }
                    if row.status == PaymentStatus::Overdue {
                        summary.overdue_count += row.count;
                    }
                }
                PaymentStatus::Refunded => summary.refunded += row.amount,
                PaymentStatus::Cancelled => {}
            }
        }
        summary
    }

    /// Money received minus money paid out.
    pub fn net_cash(&self) -> f64 {
        self.incoming_paid - self.outgoing_paid
    }
}

#[derive(Debug, Clone, Default, Serialize, TS)]
pub struct TaskProgress {
    pub total: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub done: i64,
    pub cancelled: i64,
    pub overdue: i64,
    /// Done over all non-cancelled tasks
    pub completion_percent: f64,
}

impl From<TaskStatusCounts> for TaskProgress {
    fn from(counts: TaskStatusCounts) -> Self {
        let active = counts.total - counts.cancelled;
        Self {
            total: counts.total,
            todo: counts.todo,
            in_progress: counts.in_progress,
            done: counts.done,
            cancelled: counts.cancelled,
            overdue: counts.overdue,
            completion_percent: percent(counts.done as f64, active as f64),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct EventSummary {
    pub event_id: Uuid,
    pub budget: BudgetSummary,
    pub bookings: BookingSummary,
    pub payments: PaymentSummary,
    pub tasks: TaskProgress,
}

impl EventSummary {
    pub async fn load(
        pool: &SqlitePool,
        event: &Event,
        today: NaiveDate,
    ) -> Result<Self, sqlx::Error> {
        let org = event.organization_id;
        let categories = BudgetItem::category_totals(pool, org, event.id).await?;
        let bookings = Booking::status_totals(pool, org, event.id).await?;
        let payments = Payment::totals(pool, org, event.id).await?;
        let tasks = Task::status_counts(pool, org, event.id, today).await?;

        Ok(Self {
            event_id: event.id,
            budget: BudgetSummary::from_totals(categories, event.budget),
            bookings: BookingSummary::from_totals(&bookings),
            payments: PaymentSummary::from_totals(&payments),
            tasks: TaskProgress::from(tasks),
        })
    }
}

/// `part / whole` as a percentage rounded to two decimals; 0 when `whole` is 0.
fn percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    (part / whole * 10_000.0).round() / 100.0
}
