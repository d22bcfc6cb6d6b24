//! Staff requests.
//!
//! Leave requests are collected before solving and pin cells to rest.
//! Change requests are raised against a published draft and are resolved
//! by the phase workflow. Requests are never deleted, only status-flagged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Status of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Requested,
    Cancelled,
}

/// Direction of a change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Rest → duty.
    Addition,
    /// Duty → rest.
    Reduction,
}

/// Status of a change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Requested,
    Approved,
    Rejected,
    Cancelled,
}

/// A pre-solve leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Row key (submission timestamp in storage).
    pub id: String,
    /// Requesting staff name.
    pub staff_name: String,
    /// Requested rest date.
    pub date: NaiveDate,
    /// Current status.
    pub status: LeaveStatus,
}

/// A post-draft change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Row key (submission timestamp in storage).
    pub id: String,
    /// Requesting staff name.
    pub staff_name: String,
    /// Target date.
    pub date: NaiveDate,
    /// Addition or reduction.
    pub kind: ChangeKind,
    /// Current status.
    pub status: RequestStatus,
}

impl LeaveRequest {
    /// Creates a pending leave request.
    pub fn new(id: impl Into<String>, staff_name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            staff_name: staff_name.into(),
            date,
            status: LeaveStatus::Requested,
        }
    }

    /// Whether this request still pins a cell.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == LeaveStatus::Requested
    }
}

impl ChangeRequest {
    /// Creates a pending change request.
    pub fn new(
        id: impl Into<String>,
        staff_name: impl Into<String>,
        date: NaiveDate,
        kind: ChangeKind,
    ) -> Self {
        Self {
            id: id.into(),
            staff_name: staff_name.into(),
            date,
            kind,
            status: RequestStatus::Requested,
        }
    }

    /// Whether this request is waiting for resolution.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Requested
    }

    /// Whether this request is still live (not cancelled).
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status != RequestStatus::Cancelled
    }
}

impl ChangeKind {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Addition => "addition",
            ChangeKind::Reduction => "reduction",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "addition" => Some(ChangeKind::Addition),
            "reduction" => Some(ChangeKind::Reduction),
            _ => None,
        }
    }
}

impl RequestStatus {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Requested => "requested",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "requested" => Some(RequestStatus::Requested),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            "cancelled" => Some(RequestStatus::Cancelled),
            _ => None,
        }
    }
}

impl LeaveStatus {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LeaveStatus::Requested => "requested",
            LeaveStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the storage representation. Resolved statuses read as
    /// `Requested` since only cancellation lifts the pin.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "requested" | "approved" => Some(LeaveStatus::Requested),
            "cancelled" | "rejected" => Some(LeaveStatus::Cancelled),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_change_request_lifecycle_flags() {
        let mut r = ChangeRequest::new("t1", "Aiko", day(3), ChangeKind::Reduction);
        assert!(r.is_pending());
        assert!(r.is_active());

        r.status = RequestStatus::Rejected;
        assert!(!r.is_pending());
        assert!(r.is_active());

        r.status = RequestStatus::Cancelled;
        assert!(!r.is_active());
    }

    #[test]
    fn test_leave_request_active() {
        let mut r = LeaveRequest::new("t1", "Aiko", day(3));
        assert!(r.is_active());
        r.status = LeaveStatus::Cancelled;
        assert!(!r.is_active());
    }

    #[test]
    fn test_parse_storage_values() {
        assert_eq!(ChangeKind::parse("Addition"), Some(ChangeKind::Addition));
        assert_eq!(ChangeKind::parse("swap"), None);
        assert_eq!(RequestStatus::parse(" approved "), Some(RequestStatus::Approved));
        assert_eq!(LeaveStatus::parse("approved"), Some(LeaveStatus::Requested));
        assert_eq!(LeaveStatus::parse("cancelled"), Some(LeaveStatus::Cancelled));
        assert_eq!(LeaveStatus::parse("?"), None);
    }
}
