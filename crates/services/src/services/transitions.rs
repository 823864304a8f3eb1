//! Allowed status transitions for every stateful record.
//!
//! Each status enum declares its edges in [`StatusTransition::can_transition_to`];
//! [`StatusTransition::transition_to`] turns a rejected edge into a
//! [`TransitionError`], which the API reports as a conflict. Moving to the
//! status a record already has is never a transition.

use std::fmt::Display;

use db::models::{
    booking::BookingStatus, event::EventStatus, lead::LeadStatus, payment::PaymentStatus,
    task::TaskStatus,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot move {entity} from '{from}' to '{to}'")]
    Illegal {
        entity: &'static str,
        from: String,
        to: String,
    },
}

pub trait StatusTransition: Copy + PartialEq + Display {
    /// Record kind used in error messages.
    const ENTITY: &'static str;

    fn can_transition_to(self, next: Self) -> bool;

    fn is_terminal(self) -> bool;

    fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self != next && self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::Illegal {
                entity: Self::ENTITY,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl StatusTransition for BookingStatus {
    const ENTITY: &'static str = "booking";

    fn can_transition_to(self, next: Self) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Requested, Confirmed | Declined | Cancelled) | (Confirmed, Completed | Cancelled)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Declined | BookingStatus::Cancelled | BookingStatus::Completed
        )
    }
}

impl StatusTransition for LeadStatus {
    const ENTITY: &'static str = "lead";

    fn can_transition_to(self, next: Self) -> bool {
        match self {
            LeadStatus::Lost => next == LeadStatus::New,
            LeadStatus::Won => false,
            _ => self != next,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, LeadStatus::Won | LeadStatus::Lost)
    }
}

impl StatusTransition for TaskStatus {
    const ENTITY: &'static str = "task";

    fn can_transition_to(self, next: Self) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Todo, InProgress | Done | Cancelled)
                | (InProgress, Todo | Done | Cancelled)
                | (Done, Todo)
        )
    }

    fn is_terminal(self) -> bool {
        self == TaskStatus::Cancelled
    }
}

impl StatusTransition for PaymentStatus {
    const ENTITY: &'static str = "payment";

    fn can_transition_to(self, next: Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid | Cancelled | Overdue) | (Overdue, Paid | Cancelled) | (Paid, Refunded)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Refunded | PaymentStatus::Cancelled)
    }
}

impl StatusTransition for EventStatus {
    const ENTITY: &'static str = "event";

    fn can_transition_to(self, next: Self) -> bool {
        use EventStatus::*;
        if next == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Inquiry, Planning)
                | (Planning, Confirmed)
                | (Confirmed, InProgress)
                | (InProgress, Completed)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_edges() {
        use BookingStatus::*;
        assert_eq!(Requested.transition_to(Confirmed), Ok(Confirmed));
        assert_eq!(Requested.transition_to(Declined), Ok(Declined));
        assert_eq!(Confirmed.transition_to(Completed), Ok(Completed));
        assert_eq!(Confirmed.transition_to(Cancelled), Ok(Cancelled));

        assert!(Requested.transition_to(Completed).is_err());
        assert!(Declined.transition_to(Confirmed).is_err());
        assert!(Completed.transition_to(Cancelled).is_err());
    }

    #[test]
    fn test_illegal_transition_message() {
        let err = BookingStatus::Cancelled
            .transition_to(BookingStatus::Confirmed)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot move booking from 'cancelled' to 'confirmed'"
        );
    }

    #[test]
    fn test_same_status_is_rejected() {
        assert!(TaskStatus::Todo.transition_to(TaskStatus::Todo).is_err());
        assert!(LeadStatus::New.transition_to(LeadStatus::New).is_err());
    }

    #[test]
    fn test_lead_terminal_states() {
        use LeadStatus::*;
        assert!(New.transition_to(ProposalSent).is_ok());
        assert!(ProposalSent.transition_to(Contacted).is_ok());
        assert!(Qualified.transition_to(Lost).is_ok());
        assert!(Qualified.transition_to(Won).is_ok());

        assert_eq!(Lost.transition_to(New), Ok(New));
        assert!(Lost.transition_to(Qualified).is_err());
        assert!(Won.transition_to(New).is_err());
        assert!(Won.transition_to(Lost).is_err());
    }

    #[test]
    fn test_task_reopen() {
        use TaskStatus::*;
        assert!(Todo.transition_to(InProgress).is_ok());
        assert!(InProgress.transition_to(Todo).is_ok());
        assert!(InProgress.transition_to(Done).is_ok());
        assert!(Done.transition_to(Todo).is_ok());
        assert!(Done.transition_to(InProgress).is_err());
        assert!(Cancelled.transition_to(Todo).is_err());
    }

    #[test]
    fn test_payment_edges() {
        use PaymentStatus::*;
        assert!(Pending.transition_to(Overdue).is_ok());
        assert!(Overdue.transition_to(Paid).is_ok());
        assert!(Paid.transition_to(Refunded).is_ok());

        assert!(Overdue.transition_to(Pending).is_err());
        assert!(Paid.transition_to(Cancelled).is_err());
        assert!(Refunded.transition_to(Paid).is_err());
    }

    #[test]
    fn test_event_lifecycle() {
        use EventStatus::*;
        let mut status = Inquiry;
        for next in [Planning, Confirmed, InProgress, Completed] {
            status = status.transition_to(next).unwrap();
        }
        assert_eq!(status, Completed);

        assert!(Inquiry.transition_to(Confirmed).is_err());
        assert!(Planning.transition_to(Inquiry).is_err());
        assert!(InProgress.transition_to(Cancelled).is_ok());
        assert!(Completed.transition_to(Cancelled).is_err());
        assert!(Cancelled.transition_to(Cancelled).is_err());
    }
}
