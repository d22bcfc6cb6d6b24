//! Table codecs.
//!
//! Decoders never fail: a row that cannot be read is skipped (or a cell
//! defaulted) and recorded as a [`Diagnostic`](crate::validation::Diagnostic)
//! keyed by table name and row index.
//!
//! | Table | Columns |
//! |-------|---------|
//! | staff | `id,name,role,language_a,language_b,veteran,holiday_target` |
//! | public_holidays | `date,name` |
//! | leave_requests | `timestamp,staff_name,date,status` |
//! | change_requests | `timestamp,staff_name,date,kind,status` |
//! | draft_requirements | `date,weekday,required` |
//! | draft_schedule | `name,<m/d>...` with `1`/`0` cells |
//! | history | `date,weekday,<staff>...` with `1`/`0`, blank = not rostered |
//! | system_config | `key,value` |

use chrono::{Datelike, NaiveDate};

use super::{tables, Table};
use crate::models::{
    parse_date, weekday_label, ChangeKind, ChangeRequest, HistoryLog, HistoryRow, LeaveRequest, LeaveStatus,
    MonthCalendar, PublicHoliday, RequestStatus, RequirementPlan, Role, ScheduleMatrix, StaffMember,
};
use crate::validation::Diagnostics;
use crate::workflow::Phase;

const STAFF_HEADERS: [&str; 7] = [
    "id",
    "name",
    "role",
    "language_a",
    "language_b",
    "veteran",
    "holiday_target",
];
const HOLIDAY_HEADERS: [&str; 2] = ["date", "name"];
const LEAVE_HEADERS: [&str; 4] = ["timestamp", "staff_name", "date", "status"];
const CHANGE_HEADERS: [&str; 5] = ["timestamp", "staff_name", "date", "kind", "status"];
const PLAN_HEADERS: [&str; 3] = ["date", "weekday", "required"];

const KEY_PHASE: &str = "current_phase";
const KEY_YEAR: &str = "target_year";
const KEY_MONTH: &str = "target_month";

fn cell<'t>(table: &'t Table, row: usize, header: &str) -> &'t str {
    table.get(row, header).map(str::trim).unwrap_or("")
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_uppercase().as_str() {
        "TRUE" | "1" => Some(true),
        "FALSE" | "0" | "" => Some(false),
        _ => None,
    }
}

fn flag(on: bool) -> &'static str {
    if on {
        "TRUE"
    } else {
        "FALSE"
    }
}

fn bit(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

/// Reads the staff roster. Rows without a name are skipped; an unreadable
/// holiday target falls back to `fallback_target`.
pub fn decode_staff(table: &Table, fallback_target: u32) -> (Vec<StaffMember>, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut staff = Vec::new();
    for i in 0..table.len() {
        let name = cell(table, i, "name");
        if name.is_empty() {
            diags.push(tables::STAFF, i, "missing name");
            continue;
        }
        let id = match cell(table, i, "id") {
            "" => name,
            id => id,
        };
        let mut member = StaffMember::new(id).with_name(name);

        let role = cell(table, i, "role");
        member.role = if role.is_empty() {
            Role::Schedulable
        } else {
            Role::parse(role).unwrap_or_else(|| {
                diags.push(tables::STAFF, i, format!("unknown role '{role}'"));
                Role::Schedulable
            })
        };

        for (header, slot) in [
            ("language_a", &mut member.language_a),
            ("language_b", &mut member.language_b),
            ("veteran", &mut member.veteran),
        ] {
            let raw = cell(table, i, header);
            *slot = parse_flag(raw).unwrap_or_else(|| {
                diags.push(tables::STAFF, i, format!("unreadable {header} flag '{raw}'"));
                false
            });
        }

        let raw = cell(table, i, "holiday_target");
        member.holiday_target = match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => v as u32,
            _ => {
                diags.push(
                    tables::STAFF,
                    i,
                    format!("unreadable holiday_target '{raw}', using {fallback_target}"),
                );
                fallback_target
            }
        };
        staff.push(member);
    }
    (staff, diags)
}

/// Writes the staff roster.
pub fn encode_staff(staff: &[StaffMember]) -> Table {
    let mut table = Table::new(STAFF_HEADERS);
    for s in staff {
        table.push_row([
            s.id.clone(),
            s.name.clone(),
            s.role.as_str().to_string(),
            flag(s.language_a).to_string(),
            flag(s.language_b).to_string(),
            flag(s.veteran).to_string(),
            s.holiday_target.to_string(),
        ]);
    }
    table
}

// ---------------------------------------------------------------------------
// Public holidays
// ---------------------------------------------------------------------------

/// Reads the public-holiday master.
pub fn decode_holidays(table: &Table) -> (Vec<PublicHoliday>, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut out = Vec::new();
    for i in 0..table.len() {
        let raw = cell(table, i, "date");
        match parse_date(raw) {
            Some(date) => out.push(PublicHoliday::new(date, cell(table, i, "name"))),
            None => diags.push(tables::PUBLIC_HOLIDAYS, i, format!("unparseable date '{raw}'")),
        }
    }
    (out, diags)
}

/// Writes the public-holiday master.
pub fn encode_holidays(holidays: &[PublicHoliday]) -> Table {
    let mut table = Table::new(HOLIDAY_HEADERS);
    for h in holidays {
        table.push_row([iso(h.date), h.name.clone()]);
    }
    table
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Reads leave requests. The timestamp doubles as the request id.
pub fn decode_leave(table: &Table) -> (Vec<LeaveRequest>, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut out = Vec::new();
    for i in 0..table.len() {
        let name = cell(table, i, "staff_name");
        let raw_date = cell(table, i, "date");
        let Some(date) = parse_date(raw_date) else {
            diags.push(tables::LEAVE_REQUESTS, i, format!("unparseable date '{raw_date}'"));
            continue;
        };
        if name.is_empty() {
            diags.push(tables::LEAVE_REQUESTS, i, "missing staff_name");
            continue;
        }
        let raw_status = cell(table, i, "status");
        let status = if raw_status.is_empty() {
            LeaveStatus::Requested
        } else if let Some(s) = LeaveStatus::parse(raw_status) {
            s
        } else {
            diags.push(tables::LEAVE_REQUESTS, i, format!("unknown status '{raw_status}'"));
            continue;
        };
        let mut request = LeaveRequest::new(cell(table, i, "timestamp"), name, date);
        request.status = status;
        out.push(request);
    }
    (out, diags)
}

/// Writes leave requests.
pub fn encode_leave(requests: &[LeaveRequest]) -> Table {
    let mut table = Table::new(LEAVE_HEADERS);
    for r in requests {
        table.push_row([
            r.id.clone(),
            r.staff_name.clone(),
            iso(r.date),
            r.status.as_str().to_string(),
        ]);
    }
    table
}

/// Reads change requests.
pub fn decode_changes(table: &Table) -> (Vec<ChangeRequest>, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut out = Vec::new();
    for i in 0..table.len() {
        let name = cell(table, i, "staff_name");
        let raw_date = cell(table, i, "date");
        let raw_kind = cell(table, i, "kind");
        let raw_status = cell(table, i, "status");

        let Some(date) = parse_date(raw_date) else {
            diags.push(tables::CHANGE_REQUESTS, i, format!("unparseable date '{raw_date}'"));
            continue;
        };
        let Some(kind) = ChangeKind::parse(raw_kind) else {
            diags.push(tables::CHANGE_REQUESTS, i, format!("unknown kind '{raw_kind}'"));
            continue;
        };
        let status = if raw_status.is_empty() {
            RequestStatus::Requested
        } else if let Some(s) = RequestStatus::parse(raw_status) {
            s
        } else {
            diags.push(tables::CHANGE_REQUESTS, i, format!("unknown status '{raw_status}'"));
            continue;
        };
        if name.is_empty() {
            diags.push(tables::CHANGE_REQUESTS, i, "missing staff_name");
            continue;
        }
        let mut request = ChangeRequest::new(cell(table, i, "timestamp"), name, date, kind);
        request.status = status;
        out.push(request);
    }
    (out, diags)
}

/// Writes change requests.
pub fn encode_changes(requests: &[ChangeRequest]) -> Table {
    let mut table = Table::new(CHANGE_HEADERS);
    for r in requests {
        table.push_row([
            r.id.clone(),
            r.staff_name.clone(),
            iso(r.date),
            r.kind.as_str().to_string(),
            r.status.as_str().to_string(),
        ]);
    }
    table
}

// ---------------------------------------------------------------------------
// Requirement plan
// ---------------------------------------------------------------------------

/// Reads the plan rows of one month. Rows of other months are ignored.
pub fn decode_plan(table: &Table, calendar: &MonthCalendar, default_required: u32) -> (RequirementPlan, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut plan = RequirementPlan::with_default(default_required);
    for i in 0..table.len() {
        let raw_date = cell(table, i, "date");
        let Some(date) = parse_date(raw_date) else {
            diags.push(tables::DRAFT_REQUIREMENTS, i, format!("unparseable date '{raw_date}'"));
            continue;
        };
        let Some(day) = calendar.day_index(date) else {
            continue;
        };
        let raw = cell(table, i, "required");
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => plan.set(day, v as u32),
            _ => diags.push(tables::DRAFT_REQUIREMENTS, i, format!("unreadable required '{raw}'")),
        }
    }
    (plan, diags)
}

/// Merges one month's plan into an existing table, replacing only that
/// month's rows.
pub fn encode_plan(existing: &Table, calendar: &MonthCalendar, plan: &RequirementPlan) -> Table {
    let mut table = Table::new(PLAN_HEADERS);
    for i in 0..existing.len() {
        let raw = cell(existing, i, "date");
        if parse_date(raw).is_some_and(|d| calendar.day_index(d).is_some()) {
            continue;
        }
        table.push_row(PLAN_HEADERS.map(|h| cell(existing, i, h).to_string()));
    }
    for day in 0..calendar.days() {
        let date = calendar.date(day);
        table.push_row([
            iso(date),
            weekday_label(date.weekday()).to_string(),
            plan.required(day).to_string(),
        ]);
    }
    table
}

/// Drops one month's plan rows.
pub fn clear_plan_month(table: &mut Table, calendar: &MonthCalendar) {
    let Some(col) = table.column("date") else {
        return;
    };
    table.retain_rows(|row| {
        !row
            .get(col)
            .and_then(|raw| parse_date(raw))
            .is_some_and(|d| calendar.day_index(d).is_some())
    });
}

/// Drops plan rows of closed months (dated before `first`).
pub fn clear_plan_before(table: &mut Table, first: NaiveDate) {
    let Some(col) = table.column("date") else {
        return;
    };
    table.retain_rows(|row| !row.get(col).and_then(|raw| parse_date(raw)).is_some_and(|d| d < first));
}

// ---------------------------------------------------------------------------
// Schedule matrix
// ---------------------------------------------------------------------------

/// Reads a draft matrix for the given month. An empty table yields `None`.
/// Missing or unreadable cells read as rest.
pub fn decode_matrix(table: &Table, calendar: &MonthCalendar) -> (Option<ScheduleMatrix>, Diagnostics) {
    let mut diags = Diagnostics::new();
    if table.is_empty() {
        return (None, diags);
    }
    let columns: Vec<Option<usize>> = (0..calendar.days())
        .map(|d| table.column(&calendar.label(d)))
        .collect();
    if columns.iter().any(Option::is_none) {
        diags.push(
            tables::DRAFT_SCHEDULE,
            0,
            format!("draft does not cover every day of {}/{}", calendar.month, calendar.year),
        );
    }

    let mut rows = Vec::new();
    for i in 0..table.len() {
        let name = cell(table, i, "name");
        if name.is_empty() {
            diags.push(tables::DRAFT_SCHEDULE, i, "missing name");
            continue;
        }
        let raw_row = &table.rows()[i];
        let cells = columns
            .iter()
            .map(|col| {
                let raw = col.and_then(|c| raw_row.get(c)).map(|s| s.trim()).unwrap_or("0");
                parse_flag(raw).unwrap_or_else(|| {
                    diags.push(tables::DRAFT_SCHEDULE, i, format!("unreadable cell '{raw}'"));
                    false
                })
            })
            .collect();
        rows.push((name.to_string(), cells));
    }
    (ScheduleMatrix::from_rows(calendar, rows), diags)
}

/// Writes a draft matrix.
pub fn encode_matrix(matrix: &ScheduleMatrix, calendar: &MonthCalendar) -> Table {
    let mut headers = vec!["name".to_string()];
    headers.extend(calendar.labels());
    let mut table = Table::new(headers);
    for (name, row) in matrix.rows() {
        let mut cells = vec![name.to_string()];
        cells.extend(row.iter().map(|&on| bit(on).to_string()));
        table.push_row(cells);
    }
    table
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Reads the history log. Blank cells mean the member was not rostered.
pub fn decode_history(table: &Table) -> (HistoryLog, Diagnostics) {
    let mut diags = Diagnostics::new();
    let staff_cols: Vec<(usize, &str)> = table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| h.as_str() != "date" && h.as_str() != "weekday")
        .map(|(i, h)| (i, h.as_str()))
        .collect();

    let mut rows = Vec::new();
    for i in 0..table.len() {
        let raw_date = cell(table, i, "date");
        let Some(date) = parse_date(raw_date) else {
            diags.push(tables::HISTORY, i, format!("unparseable date '{raw_date}'"));
            continue;
        };
        let mut row = HistoryRow::new(date);
        let raw_row = &table.rows()[i];
        for &(col, name) in &staff_cols {
            let raw = raw_row.get(col).map(|s| s.trim()).unwrap_or("");
            if raw.is_empty() {
                continue;
            }
            match parse_flag(raw) {
                Some(on) => {
                    row.duty.insert(name.to_string(), on);
                }
                None => diags.push(tables::HISTORY, i, format!("unreadable cell '{raw}' for {name}")),
            }
        }
        rows.push(row);
    }
    (HistoryLog::from_rows(rows), diags)
}

/// Writes the history log with one column per staff name ever recorded.
pub fn encode_history(log: &HistoryLog) -> Table {
    let names = log.staff_names();
    let mut headers = vec!["date".to_string(), "weekday".to_string()];
    headers.extend(names.iter().cloned());
    let mut table = Table::new(headers);
    for row in log.rows() {
        let mut cells = vec![iso(row.date), row.weekday.clone()];
        cells.extend(
            names
                .iter()
                .map(|n| row.duty.get(n).map_or("", |&on| bit(on)).to_string()),
        );
        table.push_row(cells);
    }
    table
}

// ---------------------------------------------------------------------------
// System state
// ---------------------------------------------------------------------------

/// Persisted workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemState {
    /// Current phase.
    pub phase: Phase,
    /// Target year and month, if one was saved.
    pub target: Option<(i32, u32)>,
}

/// Reads the `key,value` state table.
pub fn decode_state(table: &Table) -> (SystemState, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut state = SystemState::default();
    let mut year = None;
    let mut month = None;
    for i in 0..table.len() {
        let value = cell(table, i, "value");
        match cell(table, i, "key") {
            KEY_PHASE => match Phase::parse(value) {
                Some(p) => state.phase = p,
                None => diags.push(tables::SYSTEM_CONFIG, i, format!("unknown phase '{value}'")),
            },
            KEY_YEAR => match value.parse::<i32>() {
                Ok(y) => year = Some(y),
                Err(_) => diags.push(tables::SYSTEM_CONFIG, i, format!("unreadable year '{value}'")),
            },
            KEY_MONTH => match value.parse::<u32>() {
                Ok(m) if (1..=12).contains(&m) => month = Some(m),
                _ => diags.push(tables::SYSTEM_CONFIG, i, format!("unreadable month '{value}'")),
            },
            _ => {}
        }
    }
    state.target = year.zip(month);
    (state, diags)
}

/// Writes the state table, keeping unrelated keys of `existing`.
pub fn encode_state(existing: &Table, state: &SystemState) -> Table {
    let mut table = Table::new(["key", "value"]);
    for i in 0..existing.len() {
        let key = cell(existing, i, "key");
        if [KEY_PHASE, KEY_YEAR, KEY_MONTH].contains(&key) || key.is_empty() {
            continue;
        }
        table.push_row([key, cell(existing, i, "value")]);
    }
    table.push_row([KEY_PHASE, state.phase.as_str()]);
    if let Some((year, month)) = state.target {
        table.push_row([KEY_YEAR.to_string(), year.to_string()]);
        table.push_row([KEY_MONTH.to_string(), month.to_string()]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_staff_flags_and_fallback_target() {
        let table = Table::new(STAFF_HEADERS)
            .with_row(["u1", "Aiko", "staff", "TRUE", "false", "True", "120"])
            .with_row(["u2", "Ben", "admin", "FALSE", "FALSE", "FALSE", "abc"])
            .with_row(["u3", "", "staff", "TRUE", "TRUE", "TRUE", "100"])
            .with_row(["u4", "Cho", "staff", "yes", "TRUE", "FALSE", "12.0"]);
        let (staff, diags) = decode_staff(&table, 139);

        assert_eq!(staff.len(), 3);
        assert!(staff[0].language_a && !staff[0].language_b && staff[0].veteran);
        assert_eq!(staff[0].holiday_target, 120);
        assert_eq!(staff[1].role, Role::Administrative);
        assert_eq!(staff[1].holiday_target, 139);
        assert!(!staff[2].language_a);
        assert_eq!(staff[2].holiday_target, 12);
        assert_eq!(diags.len(), 3);
    }

    #[test]
    fn test_staff_encode_decode() {
        let staff = vec![StaffMember::new("u1").with_name("Aiko").language_b().with_holiday_target(130)];
        let (back, diags) = decode_staff(&encode_staff(&staff), 139);
        assert!(diags.is_empty());
        assert_eq!(back, staff);
    }

    #[test]
    fn test_requests_skip_bad_rows() {
        let leave = Table::new(LEAVE_HEADERS)
            .with_row(["t1", "Aiko", "2025/06/10 00:00:00", "requested"])
            .with_row(["t2", "Aiko", "not a date", "requested"])
            .with_row(["t3", "Ben", "2025-06-11", "rejected"]);
        let (rows, diags) = decode_leave(&leave);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(2025, 6, 10));
        assert!(!rows[1].is_active());
        assert_eq!(diags.entries()[0].row, 1);

        let changes = Table::new(CHANGE_HEADERS)
            .with_row(["t1", "Aiko", "2025-06-10", "reduction", "requested"])
            .with_row(["t2", "Aiko", "2025-06-10", "swap", "requested"])
            .with_row(["t3", "Ben", "2025-06-12", "addition", "approved"]);
        let (rows, diags) = decode_changes(&changes);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].status, RequestStatus::Approved);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_plan_merge_replaces_only_target_month() {
        let june = MonthCalendar::new(2025, 6).unwrap();
        let existing = Table::new(PLAN_HEADERS)
            .with_row(["2025-05-31", "Sat", "3"])
            .with_row(["2025-06-01", "Sun", "9"]);
        let plan = RequirementPlan::with_default(4).with_day(2, 5);
        let table = encode_plan(&existing, &june, &plan);
        assert_eq!(table.len(), 31);
        assert_eq!(table.get(0, "date"), Some("2025-05-31"));

        let (decoded, diags) = decode_plan(&table, &june, 4);
        assert!(diags.is_empty());
        assert_eq!(decoded.required(0), 4);
        assert_eq!(decoded.required(2), 5);

        let mut cleared = table.clone();
        clear_plan_month(&mut cleared, &june);
        assert_eq!(cleared.len(), 1);

        let mut closed = table;
        clear_plan_before(&mut closed, june.date(0));
        assert_eq!(closed.len(), 30);
        assert_eq!(closed.get(0, "date"), Some("2025-06-01"));
    }

    #[test]
    fn test_plan_bad_count_skipped() {
        let june = MonthCalendar::new(2025, 6).unwrap();
        let table = Table::new(PLAN_HEADERS)
            .with_row(["2025-06-03", "Tue", "many"])
            .with_row(["2025-06-04", "Wed", "2"]);
        let (plan, diags) = decode_plan(&table, &june, 4);
        assert_eq!(plan.required(2), 4);
        assert_eq!(plan.required(3), 2);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_matrix_table() {
        let cal = MonthCalendar::new(2025, 2).unwrap();
        let mut m = ScheduleMatrix::new(&cal, vec!["Aiko".into(), "Ben".into()]);
        m.set(1, 27, true);
        let table = encode_matrix(&m, &cal);
        assert_eq!(table.headers()[1], "2/1");
        assert_eq!(table.get(1, "2/28"), Some("1"));

        let (back, diags) = decode_matrix(&table, &cal);
        assert!(diags.is_empty());
        assert_eq!(back, Some(m));
        assert_eq!(decode_matrix(&Table::default(), &cal).0, None);
    }

    #[test]
    fn test_history_blank_cells_not_rostered() {
        let table = Table::new(["date", "weekday", "Aiko", "Ben"])
            .with_row(["2025-06-02", "Mon", "1", ""])
            .with_row(["2025-06-01", "Sun", "0", "1"])
            .with_row(["junk", "", "1", "1"]);
        let (log, diags) = decode_history(&table);
        assert_eq!(log.len(), 2);
        assert_eq!(log.rows()[0].date, d(2025, 6, 1));
        assert!(!log.rows()[1].duty.contains_key("Ben"));
        assert_eq!(diags.len(), 1);

        let again = encode_history(&log);
        assert_eq!(again.get(1, "Ben"), Some(""));
        assert_eq!(decode_history(&again).0, log);
    }

    #[test]
    fn test_state_table() {
        let existing = Table::new(["key", "value"])
            .with_row(["theme", "dark"])
            .with_row(["current_phase", "normal"]);
        let state = SystemState {
            phase: Phase::ReductionPhase,
            target: Some((2026, 1)),
        };
        let table = encode_state(&existing, &state);
        assert_eq!(table.get(0, "key"), Some("theme"));

        let (back, diags) = decode_state(&table);
        assert!(diags.is_empty());
        assert_eq!(back, state);

        let broken = Table::new(["key", "value"])
            .with_row(["current_phase", "frozen"])
            .with_row(["target_month", "13"]);
        let (back, diags) = decode_state(&broken);
        assert_eq!(back, SystemState::default());
        assert_eq!(diags.len(), 2);
    }
}
