//! Report generation business logic.
//!
//! This module builds the monthly financial and membership reports and renders them as
//! plain text. Building returns structured data so that another front end can lay the
//! same figures out differently; rendering applies rupiah formatting and Indonesian
//! month names.

use crate::{
    config::ClubConfig,
    core::{
        aggregation::payment_rate,
        budget::{BudgetVariance, budget_tracker},
        dashboard::{FinancialSummary, financial_summary},
        format::{category_label, format_percentage, format_rupiah},
        member::list_active_members,
        payment::list_payments,
        period::Period,
        transaction::list_transactions_in_period,
    },
    errors::Result,
    models::{Member, Transaction},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::{collections::HashMap, fmt::Write};
use tracing::instrument;

/// Which report to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Ledger totals, transactions and budgets
    Financial,
    /// Dues status of every active member
    Membership,
}

/// Monthly financial report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialReport {
    /// Club name for the title
    pub club_name: String,
    /// Month the report covers
    pub period: Period,
    /// Totals of the period's transactions only
    pub summary: FinancialSummary,
    /// The period's transactions, oldest first
    pub transactions: Vec<Transaction>,
    /// Budget-vs-actual rows for the period
    pub budgets: Vec<BudgetVariance>,
}

/// Payment state of one active member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberStatusRow {
    /// The active member
    pub member: Member,
    /// Date of the member's payment for the period, if any
    pub payment_date: Option<NaiveDate>,
}

impl MemberStatusRow {
    /// Whether the member paid for the period.
    #[must_use]
    pub fn has_paid(&self) -> bool {
        self.payment_date.is_some()
    }
}

/// Monthly membership report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembershipReport {
    /// Club name for the title
    pub club_name: String,
    /// Month the report covers
    pub period: Period,
    /// Number of active members
    pub active_members: usize,
    /// Active members with a payment for the period
    pub paid: usize,
    /// Active members without one
    pub unpaid: usize,
    /// `paid / active_members * 100`, or 0 without active members
    pub payment_rate: f64,
    /// Active members ordered by name
    pub rows: Vec<MemberStatusRow>,
}

/// Generates the financial report for a period.
///
/// # Arguments
/// * `db` - Database connection
/// * `club` - Club settings, for the report title
/// * `period` - Month to report on
///
/// # Returns
/// Period totals, the period's transactions and budget-vs-actual rows
#[instrument(skip(db, club))]
pub async fn financial_report(
    db: &DatabaseConnection,
    club: &ClubConfig,
    period: Period,
) -> Result<FinancialReport> {
    let (transactions, tracker) = tokio::try_join!(
        list_transactions_in_period(db, period),
        budget_tracker(db, period)
    )?;

    Ok(FinancialReport {
        club_name: club.name.clone(),
        period,
        summary: financial_summary(&transactions),
        transactions,
        budgets: tracker.rows,
    })
}

/// Generates the membership report for a period.
///
/// A member counts as paid when any payment for the period exists; inactive members are
/// left out entirely.
#[instrument(skip(db, club))]
pub async fn membership_report(
    db: &DatabaseConnection,
    club: &ClubConfig,
    period: Period,
) -> Result<MembershipReport> {
    let (active, payments) = tokio::try_join!(list_active_members(db), list_payments(db, period))?;

    let paid_on: HashMap<i64, NaiveDate> = payments
        .iter()
        .map(|p| (p.member_id, p.payment_date))
        .collect();

    let rows: Vec<MemberStatusRow> = active
        .into_iter()
        .map(|member| MemberStatusRow {
            payment_date: paid_on.get(&member.id).copied(),
            member,
        })
        .collect();

    let paid = rows.iter().filter(|r| r.has_paid()).count();
    Ok(MembershipReport {
        club_name: club.name.clone(),
        period,
        active_members: rows.len(),
        paid,
        unpaid: rows.len() - paid,
        payment_rate: payment_rate(paid, rows.len()),
        rows,
    })
}

/// File name (without extension) for a report,
/// e.g. `Laporan_Keuangan_Januari_2025`.
#[must_use]
pub fn report_file_name(kind: ReportKind, period: Period) -> String {
    let prefix = match kind {
        ReportKind::Financial => "Laporan_Keuangan",
        ReportKind::Membership => "Laporan_Keanggotaan",
    };
    format!("{prefix}_{}_{}", period.month_name(), period.year())
}

/// Generates a progress bar string for a budget's usage.
///
/// Creates a text-based bar like: `[████████░░] 80.0%`. The bar is clamped to 0-100%
/// but the printed percentage is not.
///
/// # Arguments
/// * `percentage` - Share of the limit used
/// * `bar_length` - Length of the bar in characters (default 10)
#[must_use]
pub fn format_usage_bar(percentage: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped = percentage.clamp(0.0, 100.0);

    // Cast safety: clamped ∈ [0, 100], length is small.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!(
        "[{}{}] {}",
        "█".repeat(filled),
        "░".repeat(empty),
        format_percentage(percentage)
    )
}

/// Renders the financial report as plain text.
#[must_use]
pub fn render_financial_report(report: &FinancialReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "LAPORAN KEUANGAN {}", report.club_name.to_uppercase());
    let _ = writeln!(out, "Periode: {}", report.period);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Total Pemasukan   : {}",
        format_rupiah(summary.total_income)
    );
    let _ = writeln!(
        out,
        "Total Pengeluaran : {}",
        format_rupiah(summary.total_expense)
    );
    let _ = writeln!(
        out,
        "Saldo             : {} ({})",
        format_rupiah(summary.balance),
        if summary.is_surplus() { "Surplus" } else { "Defisit" }
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Transaksi:");
    if report.transactions.is_empty() {
        let _ = writeln!(out, "  Tidak ada transaksi");
    }
    for tx in &report.transactions {
        let category = tx
            .category
            .as_deref()
            .map_or_else(|| "-".to_string(), category_label);
        let _ = writeln!(
            out,
            "  {} | {} | {} | {} | {}",
            tx.date.format("%d/%m/%Y"),
            tx.kind.label(),
            category,
            tx.description,
            format_rupiah(tx.amount)
        );
    }

    if !report.budgets.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Anggaran vs Realisasi:");
        for row in &report.budgets {
            let _ = writeln!(
                out,
                "  {}: {} / {} {} {}",
                category_label(&row.budget.category),
                format_rupiah(row.actual),
                format_rupiah(row.budget.monthly_limit),
                format_usage_bar(row.percentage, None),
                row.status.label()
            );
        }
    }
    out
}

/// Renders the membership report as plain text.
#[must_use]
pub fn render_membership_report(report: &MembershipReport) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "LAPORAN KEANGGOTAAN {}",
        report.club_name.to_uppercase()
    );
    let _ = writeln!(out, "Periode: {}", report.period);
    let _ = writeln!(out);
    let _ = writeln!(out, "Anggota Aktif     : {}", report.active_members);
    let _ = writeln!(out, "Sudah Bayar       : {}", report.paid);
    let _ = writeln!(out, "Belum Bayar       : {}", report.unpaid);
    let _ = writeln!(
        out,
        "Tingkat Pembayaran: {}",
        format_percentage(report.payment_rate)
    );
    let _ = writeln!(out);

    for (index, row) in report.rows.iter().enumerate() {
        let status = match row.payment_date {
            Some(date) => format!("Lunas ({})", date.format("%d/%m/%Y")),
            None => "Belum Bayar".to_string(),
        };
        let _ = writeln!(
            out,
            "  {}. {} | {} | {}",
            index + 1,
            row.member.name,
            row.member.class,
            status
        );
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::budget::BudgetStatus;
    use crate::models::{MemberStatus, TransactionKind};
    use crate::test_utils::*;

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            report_file_name(ReportKind::Financial, period(1, 2025)),
            "Laporan_Keuangan_Januari_2025"
        );
        assert_eq!(
            report_file_name(ReportKind::Membership, period(12, 2024)),
            "Laporan_Keanggotaan_Desember_2024"
        );
    }

    #[test]
    fn test_format_usage_bar() {
        assert_eq!(format_usage_bar(50.0, Some(10)), "[█████░░░░░] 50.0%");
        assert_eq!(format_usage_bar(0.0, Some(4)), "[░░░░] 0.0%");
        // Overspending fills the bar but keeps the real percentage
        assert_eq!(format_usage_bar(133.3, Some(5)), "[█████] 133.3%");
    }

    #[tokio::test]
    async fn test_financial_report_for_period() -> Result<()> {
        let db = setup_test_db().await?;
        let club = ClubConfig::default();
        create_test_transaction(
            &db,
            TransactionKind::Income,
            500_000.0,
            date(2025, 1, 5),
            None,
        )
        .await?;
        create_test_transaction(
            &db,
            TransactionKind::Expense,
            200_000.0,
            date(2025, 1, 10),
            Some("konsumsi"),
        )
        .await?;
        create_test_transaction(
            &db,
            TransactionKind::Income,
            75_000.0,
            date(2025, 2, 1),
            None,
        )
        .await?;
        create_test_budget(&db, "konsumsi", 150_000.0, period(1, 2025)).await?;

        let report = financial_report(&db, &club, period(1, 2025)).await?;

        assert_eq!(report.summary.balance, 300_000.0);
        assert_eq!(report.transactions.len(), 2);
        assert_eq!(report.transactions[0].date, date(2025, 1, 5));
        assert_eq!(report.budgets[0].status, BudgetStatus::OverBudget);

        let text = render_financial_report(&report);
        assert!(text.contains("Periode: Januari 2025"));
        assert!(text.contains("Saldo             : Rp 300.000 (Surplus)"));
        assert!(text.contains("KONSUMSI: Rp 200.000 / Rp 150.000"));
        assert!(text.contains("Over Budget!"));
        Ok(())
    }

    #[tokio::test]
    async fn test_membership_report() -> Result<()> {
        let db = setup_test_db().await?;
        let club = ClubConfig::default();
        let budi = create_test_member(&db, "Budi", "X-1").await?;
        create_test_member(&db, "Andi", "X-2").await?;
        create_custom_member(&db, "Citra", "X-2", MemberStatus::Inactive).await?;
        create_test_payment(&db, budi.id, period(1, 2025)).await?;

        let report = membership_report(&db, &club, period(1, 2025)).await?;

        assert_eq!(report.active_members, 2);
        assert_eq!(report.paid, 1);
        assert_eq!(report.unpaid, 1);
        assert_eq!(report.payment_rate, 50.0);
        assert_eq!(report.rows[0].member.name, "Andi");
        assert!(!report.rows[0].has_paid());
        assert!(report.rows[1].has_paid());

        let text = render_membership_report(&report);
        assert!(text.contains("Tingkat Pembayaran: 50.0%"));
        assert!(text.contains("1. Andi | X-2 | Belum Bayar"));
        Ok(())
    }

    #[tokio::test]
    async fn test_membership_report_without_members() -> Result<()> {
        let db = setup_test_db().await?;

        let report = membership_report(&db, &ClubConfig::default(), period(1, 2025)).await?;

        assert_eq!(report.payment_rate, 0.0);
        assert!(report.rows.is_empty());
        Ok(())
    }
}
