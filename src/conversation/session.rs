use chrono::NaiveDate;

use crate::conversation::replies;
use crate::model::request::{DATE_FORMAT, RequestDetails, RequestKind};
use crate::notify::Controls;
use crate::utils::text::{Confirmation, is_no, parse_confirmation};

/// Longest free-text answer accepted, in characters. Keeps the approver
/// alert, which carries both free-text fields, under the chat message limit.
pub const MAX_FIELD_CHARS: usize = 1000;

/// In-flight conversation of one participant. Each step carries exactly the
/// fields collected so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Leave(LeaveStep),
    ShortAbsence(AbsenceStep),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveStep {
    AwaitStart,
    AwaitEnd {
        start: NaiveDate,
    },
    AwaitReason {
        start: NaiveDate,
        end: NaiveDate,
    },
    AwaitConfirm {
        start: NaiveDate,
        end: NaiveDate,
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsenceStep {
    AwaitDate,
    AwaitDuration {
        date: NaiveDate,
    },
    AwaitReason {
        date: NaiveDate,
        duration: String,
    },
    AwaitConfirm {
        date: NaiveDate,
        duration: String,
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub controls: Option<Controls>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            controls: None,
        }
    }

    pub fn with_controls(text: impl Into<String>, controls: Controls) -> Self {
        Self {
            text: text.into(),
            controls: Some(controls),
        }
    }
}

/// Result of feeding one text message to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Continue(Session, Reply),
    /// The user confirmed; the draft is complete.
    Submit {
        details: RequestDetails,
        reason: Option<String>,
    },
    /// The session ends without a request.
    Discard(&'static str),
}

impl Session {
    pub fn start(kind: RequestKind) -> (Session, Reply) {
        match kind {
            RequestKind::Leave => (
                Session::Leave(LeaveStep::AwaitStart),
                Reply::text(replies::LEAVE_START),
            ),
            RequestKind::ShortAbsence => (
                Session::ShortAbsence(AbsenceStep::AwaitDate),
                Reply::text(replies::ABSENCE_START),
            ),
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Session::Leave(_) => RequestKind::Leave,
            Session::ShortAbsence(_) => RequestKind::ShortAbsence,
        }
    }

    pub fn step_name(&self) -> &'static str {
        match self {
            Session::Leave(LeaveStep::AwaitStart) => "await_start",
            Session::Leave(LeaveStep::AwaitEnd { .. }) => "await_end",
            Session::Leave(LeaveStep::AwaitReason { .. })
            | Session::ShortAbsence(AbsenceStep::AwaitReason { .. }) => "await_reason",
            Session::Leave(LeaveStep::AwaitConfirm { .. })
            | Session::ShortAbsence(AbsenceStep::AwaitConfirm { .. }) => "await_confirm",
            Session::ShortAbsence(AbsenceStep::AwaitDate) => "await_date",
            Session::ShortAbsence(AbsenceStep::AwaitDuration { .. }) => "await_duration",
        }
    }

    pub fn advance(self, text: &str) -> Advance {
        match self {
            Session::Leave(step) => advance_leave(step, text),
            Session::ShortAbsence(step) => advance_absence(step, text),
        }
    }
}

fn advance_leave(step: LeaveStep, text: &str) -> Advance {
    let stay = |step: LeaveStep, msg: &str| Advance::Continue(Session::Leave(step), Reply::text(msg));

    match step {
        LeaveStep::AwaitStart => match parse_date(text) {
            Some(start) => stay(LeaveStep::AwaitEnd { start }, replies::LEAVE_ASK_END),
            None => stay(LeaveStep::AwaitStart, replies::INVALID_DATE),
        },
        LeaveStep::AwaitEnd { start } => match parse_date(text) {
            Some(end) if end < start => stay(LeaveStep::AwaitEnd { start }, replies::END_BEFORE_START),
            Some(end) => stay(LeaveStep::AwaitReason { start, end }, replies::ASK_REASON),
            None => stay(LeaveStep::AwaitEnd { start }, replies::INVALID_DATE),
        },
        LeaveStep::AwaitReason { start, end } if too_long(text) => {
            stay(LeaveStep::AwaitReason { start, end }, replies::FIELD_TOO_LONG)
        }
        LeaveStep::AwaitReason { start, end } => {
            let reason = parse_reason(text);
            let details = RequestDetails::Leave {
                start_date: start,
                end_date: end,
            };
            let summary = replies::summary(&details, reason.as_deref());
            Advance::Continue(
                Session::Leave(LeaveStep::AwaitConfirm { start, end, reason }),
                Reply::with_controls(summary, Controls::Confirm),
            )
        }
        LeaveStep::AwaitConfirm { start, end, reason } => confirm(
            text,
            RequestDetails::Leave {
                start_date: start,
                end_date: end,
            },
            reason,
        ),
    }
}

fn advance_absence(step: AbsenceStep, text: &str) -> Advance {
    let stay = |step: AbsenceStep, msg: &str| {
        Advance::Continue(Session::ShortAbsence(step), Reply::text(msg))
    };

    match step {
        AbsenceStep::AwaitDate => match parse_date(text) {
            Some(date) => stay(AbsenceStep::AwaitDuration { date }, replies::ABSENCE_ASK_DURATION),
            None => stay(AbsenceStep::AwaitDate, replies::INVALID_DATE),
        },
        AbsenceStep::AwaitDuration { date } => {
            let duration = text.trim();
            if duration.is_empty() {
                return stay(AbsenceStep::AwaitDuration { date }, replies::EMPTY_DURATION);
            }
            if too_long(duration) {
                return stay(AbsenceStep::AwaitDuration { date }, replies::FIELD_TOO_LONG);
            }
            stay(
                AbsenceStep::AwaitReason {
                    date,
                    duration: duration.to_string(),
                },
                replies::ASK_REASON,
            )
        }
        AbsenceStep::AwaitReason { date, duration } if too_long(text) => {
            stay(AbsenceStep::AwaitReason { date, duration }, replies::FIELD_TOO_LONG)
        }
        AbsenceStep::AwaitReason { date, duration } => {
            let reason = parse_reason(text);
            let details = RequestDetails::ShortAbsence {
                date,
                duration: duration.clone(),
            };
            let summary = replies::summary(&details, reason.as_deref());
            Advance::Continue(
                Session::ShortAbsence(AbsenceStep::AwaitConfirm {
                    date,
                    duration,
                    reason,
                }),
                Reply::with_controls(summary, Controls::Confirm),
            )
        }
        AbsenceStep::AwaitConfirm {
            date,
            duration,
            reason,
        } => confirm(text, RequestDetails::ShortAbsence { date, duration }, reason),
    }
}

/// Anything that is not a clear yes ends the session.
fn confirm(text: &str, details: RequestDetails, reason: Option<String>) -> Advance {
    match parse_confirmation(text) {
        Confirmation::Yes => Advance::Submit { details, reason },
        Confirmation::No => Advance::Discard(replies::DECLINED),
        Confirmation::Unrecognized => Advance::Discard(replies::UNRECOGNIZED_CONFIRMATION),
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

fn too_long(text: &str) -> bool {
    text.trim().chars().count() > MAX_FIELD_CHARS
}

fn parse_reason(text: &str) -> Option<String> {
    let reason = text.trim();
    if reason.is_empty() || is_no(reason) {
        None
    } else {
        Some(reason.to_string())
    }
}
