use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use kas_tracker::{
    AppContext,
    config::{club::load_default_config, database::get_database_url},
    core::{
        budget::budget_tracker,
        dashboard::{analytics, refresh_dashboard},
        format::{category_label, format_percentage, format_rupiah},
        member::{NewMember, create_member, list_members},
        payment::{NewPayment, period_collection, record_payment},
        period::Period,
        reminder::{generate_reminders, list_reminders, mark_reminder_paid, mark_reminder_sent},
        report::{
            ReportKind, financial_report, membership_report, render_financial_report,
            render_membership_report, report_file_name,
        },
        transaction::{NewTransaction, create_transaction},
    },
    errors::Result,
    models::{MemberStatus, TransactionKind},
};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Treasury bookkeeping for a school extracurricular club.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Balance and this month's dues coverage.
    Dashboard,

    /// Monthly series, category breakdown and class completion for a year.
    Analytics {
        #[arg(long)]
        year: i32,
        /// Month used for the class completion chart (defaults to the current month).
        #[arg(long)]
        month: Option<u32>,
    },

    /// Budget versus actual spending for one month.
    Budgets {
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
    },

    /// Who has and has not paid dues for one month.
    Payments {
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
    },

    /// Record a dues payment.
    Pay {
        #[arg(long)]
        member_id: i64,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
        /// Defaults to the configured dues amount.
        #[arg(long)]
        amount: Option<f64>,
        /// Payment date as YYYY-MM-DD (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Record an income or expense.
    AddTransaction {
        /// `income` or `expense`.
        #[arg(long)]
        kind: TransactionKind,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        description: String,
        /// Transaction date as YYYY-MM-DD (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        category: Option<String>,
    },

    /// List members.
    Members {
        /// Only list active members.
        #[arg(long)]
        active: bool,
    },

    /// Add a member to the roster.
    AddMember {
        #[arg(long)]
        name: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Manage payment reminders.
    Reminders {
        #[command(subcommand)]
        action: ReminderAction,
    },

    /// Print a monthly report.
    Report {
        #[command(subcommand)]
        kind: ReportCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ReminderAction {
    /// Remind every active member who has not paid this month.
    Generate,
    /// List all reminders.
    List,
    /// Mark a reminder as sent.
    Send { id: i64 },
    /// Mark a reminder as paid.
    Paid { id: i64 },
}

#[derive(clap::Args, Debug)]
struct ReportPeriod {
    #[arg(long)]
    month: u32,
    #[arg(long)]
    year: i32,
    /// Directory to also save the report to, as `<report name>.txt`.
    #[arg(long)]
    save_to: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    Financial(ReportPeriod),
    Membership(ReportPeriod),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    let args = Args::parse();

    // 3. Load club settings and open the database
    let club = load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    let ctx = AppContext::connect(&get_database_url(), club)
        .await
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 4. Run the command, then close the connection whatever the outcome
    let outcome = run(&ctx, args.command).await.inspect_err(|e| {
        if e.is_rejected_input() {
            warn!("Command rejected: {e}");
        } else {
            error!("Command failed: {e}");
        }
    });
    ctx.close().await?;
    outcome
}

async fn run(ctx: &AppContext, command: Command) -> Result<()> {
    let db = ctx.db();
    let today = Local::now().date_naive();

    match command {
        Command::Dashboard => {
            let snapshot = refresh_dashboard(db, today).await?;
            let summary = snapshot.summary;
            let coverage = snapshot.coverage;
            println!("{}", ctx.club.name);
            println!(
                "Total Pemasukan   : {}",
                format_rupiah(summary.total_income)
            );
            println!(
                "Total Pengeluaran : {}",
                format_rupiah(summary.total_expense)
            );
            println!(
                "Saldo             : {} ({})",
                format_rupiah(summary.balance),
                if summary.is_surplus() { "Surplus" } else { "Defisit" }
            );
            println!();
            println!("Kas {}", coverage.period);
            println!("Anggota Aktif     : {}", coverage.total_members);
            println!("Sudah Bayar       : {}", coverage.paid_this_month);
            println!("Belum Bayar       : {}", coverage.unpaid_this_month);
            println!(
                "Terkumpul         : {}",
                format_rupiah(coverage.total_collected)
            );
            if coverage.has_integrity_warning() {
                println!("Peringatan: jumlah pembayaran melebihi jumlah anggota aktif");
            }
            println!();
            println!("Transaksi terbaru:");
            for tx in &snapshot.recent_transactions {
                println!(
                    "  {} | {} | {} | {}",
                    tx.date,
                    tx.kind.label(),
                    tx.description,
                    format_rupiah(tx.amount)
                );
            }
        }
        Command::Analytics { year, month } => {
            let period = match month {
                Some(month) => Period::new(month, year)?,
                None => Period::containing(today)?,
            };
            let view = analytics(db, year, period).await?;
            println!("Tren bulanan {year}:");
            for row in &view.monthly {
                println!(
                    "  {:<3} | masuk {} | keluar {} | bersih {}",
                    row.label,
                    format_rupiah(row.income),
                    format_rupiah(row.expense),
                    format_rupiah(row.net)
                );
            }
            println!("Pengeluaran per kategori:");
            for share in &view.categories {
                let label = ctx
                    .club
                    .label_for(&share.category)
                    .map_or_else(|| category_label(&share.category), str::to_string);
                println!(
                    "  {label}: {} ({})",
                    format_rupiah(share.amount),
                    format_percentage(share.percentage)
                );
            }
            println!("Pembayaran per kelas ({}):", view.period);
            for class in &view.classes {
                println!(
                    "  {}: {}/{} ({})",
                    class.class,
                    class.paid,
                    class.total,
                    format_percentage(class.percentage)
                );
            }
        }
        Command::Budgets { month, year } => {
            let tracker = budget_tracker(db, Period::new(month, year)?).await?;
            for row in &tracker.rows {
                println!(
                    "{}: {} / {} | sisa {} | {} | {}",
                    category_label(&row.budget.category),
                    format_rupiah(row.actual),
                    format_rupiah(row.budget.monthly_limit),
                    format_rupiah(row.remaining),
                    format_percentage(row.percentage),
                    row.status.label()
                );
            }
            println!(
                "Total anggaran {} | terpakai {} | sisa {}",
                format_rupiah(tracker.totals.total_budget),
                format_rupiah(tracker.totals.total_spent),
                format_rupiah(tracker.totals.total_remaining)
            );
        }
        Command::Payments { month, year } => {
            let collection = period_collection(db, Period::new(month, year)?).await?;
            println!(
                "{}: {} sudah bayar, {} belum, terkumpul {}",
                collection.period,
                collection.paid_count(),
                collection.unpaid_count(),
                format_rupiah(collection.total_collected)
            );
            for row in &collection.payments {
                let name = row.member.as_ref().map_or("-", |m| m.name.as_str());
                println!(
                    "  {} | {} | {}",
                    row.payment.payment_date,
                    name,
                    format_rupiah(row.payment.amount)
                );
            }
            for member in &collection.unpaid {
                println!("  belum bayar: {} ({})", member.name, member.class);
            }
        }
        Command::Pay {
            member_id,
            month,
            year,
            amount,
            date,
            notes,
        } => {
            let recorded = record_payment(
                db,
                NewPayment {
                    member_id,
                    amount: amount.unwrap_or(ctx.club.dues_amount),
                    period: Period::new(month, year)?,
                    payment_date: date.unwrap_or(today),
                    notes,
                },
            )
            .await?;
            println!("Tercatat: {}", recorded.income.description);
        }
        Command::AddTransaction {
            kind,
            amount,
            description,
            date,
            category,
        } => {
            let created = create_transaction(
                db,
                NewTransaction {
                    kind,
                    amount,
                    description,
                    date: date.unwrap_or(today),
                    category,
                },
            )
            .await?;
            info!(transaction_id = created.id, "Transaction added");
            println!("Transaksi #{} ditambahkan", created.id);
        }
        Command::Members { active } => {
            let status = active.then_some(MemberStatus::Active);
            for member in list_members(db, status).await? {
                println!(
                    "  #{} {} | {} | {}",
                    member.id, member.name, member.class, member.status
                );
            }
        }
        Command::AddMember { name, class, phone } => {
            let member = create_member(
                db,
                NewMember {
                    name,
                    class,
                    phone,
                    status: MemberStatus::Active,
                },
            )
            .await?;
            println!("Anggota #{} ditambahkan", member.id);
        }
        Command::Reminders { action } => match action {
            ReminderAction::Generate => {
                let count = generate_reminders(db, today, ctx.club.reminder_lead_days).await?;
                println!("{count} reminder dibuat");
            }
            ReminderAction::List => {
                for row in list_reminders(db).await? {
                    let name = row.member.as_ref().map_or("-", |m| m.name.as_str());
                    println!(
                        "  #{} {} | {} | {} | {}",
                        row.reminder.id,
                        row.reminder.reminder_date,
                        name,
                        row.reminder.status.label(),
                        row.reminder.message
                    );
                }
            }
            ReminderAction::Send { id } => {
                mark_reminder_sent(db, id).await?;
                println!("Reminder #{id} terkirim");
            }
            ReminderAction::Paid { id } => {
                mark_reminder_paid(db, id).await?;
                println!("Reminder #{id} lunas");
            }
        },
        Command::Report { kind } => {
            let (kind, args) = match kind {
                ReportCommand::Financial(args) => (ReportKind::Financial, args),
                ReportCommand::Membership(args) => (ReportKind::Membership, args),
            };
            let period = Period::new(args.month, args.year)?;
            let text = match kind {
                ReportKind::Financial => {
                    render_financial_report(&financial_report(db, &ctx.club, period).await?)
                }
                ReportKind::Membership => {
                    render_membership_report(&membership_report(db, &ctx.club, period).await?)
                }
            };
            print!("{text}");
            if let Some(dir) = args.save_to {
                let path = dir.join(format!("{}.txt", report_file_name(kind, period)));
                std::fs::write(&path, &text)?;
                info!("Report saved to {}", path.display());
            }
        }
    }
    Ok(())
}
