//! Writes TypeScript declarations for every API payload.
//!
//! Usage:
//!   cargo run --bin generate-types                 # writes shared/types.ts
//!   cargo run --bin generate-types -- out/api.ts   # custom path
//!   cargo run --bin generate-types -- --check      # fail if the file is stale

use std::{env, fs, path::PathBuf, process::ExitCode};

use db::models::{
    booking::{Booking, BookingStatus, CreateBooking, UpdateBooking},
    budget_item::{BudgetCategoryTotal, BudgetItem, CreateBudgetItem, UpdateBudgetItem},
    event::{CreateEvent, Event, EventStatus, UpdateEvent},
    lead::{CreateLead, Lead, LeadStatus, UpdateLead},
    payment::{CreatePayment, Payment, PaymentDirection, PaymentStatus, UpdatePayment},
    task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
    timeline_item::{CreateTimelineItem, TimelineItem, UpdateTimelineItem},
    vendor::{CreateVendor, UpdateVendor, Vendor},
};
use server::routes::{leads::RescoreAllResponse, payments::MarkOverdueResponse};
use services::services::{
    event_summary::{BookingSummary, BudgetSummary, EventSummary, PaymentSummary, TaskProgress},
    lead_conversion::{ConversionResult, ConvertLead},
    lead_scoring::{LeadCategory, LeadScore, LeadSignals, ScoreBreakdown},
};
use ts_rs::TS;
use utils::pagination::Pagination;

const DEFAULT_OUTPUT: &str = "shared/types.ts";

fn generate() -> String {
    let decls = [
        EventStatus::decl(),
        Event::decl(),
        CreateEvent::decl(),
        UpdateEvent::decl(),
        LeadStatus::decl(),
        Lead::decl(),
        CreateLead::decl(),
        UpdateLead::decl(),
        Vendor::decl(),
        CreateVendor::decl(),
        UpdateVendor::decl(),
        BookingStatus::decl(),
        Booking::decl(),
        CreateBooking::decl(),
        UpdateBooking::decl(),
        BudgetItem::decl(),
        CreateBudgetItem::decl(),
        UpdateBudgetItem::decl(),
        BudgetCategoryTotal::decl(),
        PaymentStatus::decl(),
        PaymentDirection::decl(),
        Payment::decl(),
        CreatePayment::decl(),
        UpdatePayment::decl(),
        TaskStatus::decl(),
        TaskPriority::decl(),
        Task::decl(),
        CreateTask::decl(),
        UpdateTask::decl(),
        TimelineItem::decl(),
        CreateTimelineItem::decl(),
        UpdateTimelineItem::decl(),
        LeadSignals::decl(),
        ScoreBreakdown::decl(),
        LeadCategory::decl(),
        LeadScore::decl(),
        BudgetSummary::decl(),
        BookingSummary::decl(),
        PaymentSummary::decl(),
        TaskProgress::decl(),
        EventSummary::decl(),
        ConvertLead::decl(),
        ConversionResult::decl(),
        RescoreAllResponse::decl(),
        MarkOverdueResponse::decl(),
        Pagination::decl(),
    ];

    let mut out = String::from("// Generated by `generate-types`. Do not edit.\n\n");
    out.push_str(
        "export type ApiResponse<T> = { success: boolean, data: T | null, error: string | null };\n\n",
    );
    for decl in decls {
        out.push_str("export ");
        out.push_str(&decl);
        out.push_str("\n\n");
    }
    out
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let check = args.iter().any(|a| a == "--check");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let generated = generate();

    if check {
        return match fs::read_to_string(&path) {
            Ok(existing) if existing == generated => {
                println!("{} is up to date", path.display());
                ExitCode::SUCCESS
            }
            Ok(_) => {
                eprintln!("{} is stale; rerun generate-types", path.display());
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("Failed to read {}: {e}", path.display());
                ExitCode::FAILURE
            }
        };
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = fs::create_dir_all(parent)
    {
        eprintln!("Failed to create {}: {e}", parent.display());
        return ExitCode::FAILURE;
    }
    match fs::write(&path, generated) {
        Ok(()) => {
            println!("Wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to write {}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}
