/// Pure reductions over fetched rows: monthly series, category and class breakdowns
pub mod aggregation;

/// Category budgets and budget-versus-actual variance
pub mod budget;

/// Dashboard summary, payment coverage and the analytics view
pub mod dashboard;

/// Rupiah and percentage formatting for display
pub mod format;

/// Club roster management
pub mod member;

/// Monthly dues payments
pub mod payment;

/// Calendar months and half-open date windows
pub mod period;

/// Request generations that discard superseded loads
pub mod refresh;

/// Payment reminders for unpaid members
pub mod reminder;

/// Monthly financial and membership reports
pub mod report;

/// Income and expense ledger
pub mod transaction;
