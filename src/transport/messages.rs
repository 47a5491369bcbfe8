//! Driver- and operator-facing message bodies.
//!
//! All money is rendered through `format_rupiah`; timestamps use the local
//! `DD/MM/YYYY HH:MM:SS` convention drivers are used to.

use crate::domain::driver::DriverRecord;
use crate::domain::order::OrderTicket;
use crate::services::admission::{AdmissionError, MAX_TOPUP_AMOUNT, MIN_TOPUP_AMOUNT};
use crate::utils::format::format_rupiah;
use chrono::{DateTime, Utc};

fn stamp(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y %H:%M:%S").to_string()
}

/// Reply to a freshly created order: how to pay, and until when.
pub fn payment_instructions(ticket: &OrderTicket) -> String {
    let mut text = format!(
        "*TOP-UP PAYMENT*\n\n\
         Amount: Rp {}\n\
         Order ID: {}\n\
         Expires: {}\n\n\
         Pay via the link below:\n{}",
        format_rupiah(ticket.amount),
        ticket.order_id,
        stamp(ticket.expires_at),
        ticket.payment_url,
    );
    if let Some(qr) = &ticket.qr_code {
        text.push_str(&format!("\nQR code: {}", qr));
    }
    text.push_str("\n\nThe payment expires in 24 hours.");
    text
}

pub fn topup_success(amount: i64, new_balance: i64, order_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "*TOP-UP SUCCESSFUL!*\n\n\
         Amount: Rp {}\n\
         Order ID: {}\n\
         New balance: Rp {}\n\
         Time: {}\n\n\
         Thank you for using the top-up service!",
        format_rupiah(amount),
        order_id,
        format_rupiah(new_balance),
        stamp(at),
    )
}

pub fn topup_expired(amount: i64) -> String {
    format!(
        "Your top-up payment of Rp {} has expired.\n\n\
         Start over with:\nTOPUP <amount>",
        format_rupiah(amount),
    )
}

pub fn topup_failed(amount: i64) -> String {
    format!(
        "Your top-up payment of Rp {} failed.\n\n\
         Please try again with:\nTOPUP <amount>",
        format_rupiah(amount),
    )
}

pub fn topup_cancelled(amount: i64) -> String {
    format!(
        "Your top-up payment of Rp {} was cancelled.\n\n\
         Start over with:\nTOPUP <amount>",
        format_rupiah(amount),
    )
}

pub fn topup_processing(amount: i64) -> String {
    format!(
        "Your top-up payment of Rp {} is being processed.\n\n\
         Please complete the payment.",
        format_rupiah(amount),
    )
}

pub fn balance_info(driver: &DriverRecord) -> String {
    let rating = driver
        .rating
        .map(|r| format!("{}/10", r))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "*DRIVER BALANCE*\n\n\
         ID: {}\n\
         Name: {}\n\
         Phone: {}\n\
         Balance: Rp {}\n\
         Rating: {}\n\
         Status: {}",
        driver.id,
        driver.name,
        driver.phone,
        format_rupiah(driver.balance),
        rating,
        driver.status,
    )
}

pub fn help_text() -> String {
    format!(
        "*TOP-UP BOT HELP*\n\n\
         Available commands:\n\n\
         TOPUP <amount> - top up your balance\n\
         Example: TOPUP 50000\n\
         Min: Rp {}, Max: Rp {}\n\n\
         SALDO - check your balance\n\n\
         HELP - show this help\n\n\
         INFO - about this bot\n\n\
         Payments expire 24 hours after creation.",
        format_rupiah(MIN_TOPUP_AMOUNT),
        format_rupiah(MAX_TOPUP_AMOUNT),
    )
}

pub fn info_text() -> String {
    format!(
        "*ABOUT THIS BOT*\n\n\
         Driver top-up service\n\
         Version: {}\n\n\
         Features:\n\
         - balance top-up via payment link or QR\n\
         - real-time balance check\n\
         - payment status notifications",
        env!("CARGO_PKG_VERSION"),
    )
}

pub fn unknown_command(body: &str) -> String {
    format!(
        "*UNKNOWN COMMAND*\n\n\
         Message: \"{}\"\n\n\
         Available commands:\n\
         - TOPUP <amount>\n\
         - SALDO\n\
         - HELP\n\
         - INFO\n\n\
         Send HELP for details.",
        body.trim(),
    )
}

pub fn topup_usage() -> String {
    "Format: TOPUP <amount>\nExample: TOPUP 50000".to_string()
}

pub fn admission_rejection(err: &AdmissionError) -> String {
    match err {
        AdmissionError::InvalidIdentity => {
            "Your number could not be recognized as a valid phone number.".to_string()
        }
        AdmissionError::AmountOutOfRange => format!(
            "Invalid top-up amount. Minimum Rp {}, maximum Rp {}.",
            format_rupiah(MIN_TOPUP_AMOUNT),
            format_rupiah(MAX_TOPUP_AMOUNT),
        ),
        AdmissionError::UnknownDriver => {
            "This number is not registered as a driver.".to_string()
        }
        AdmissionError::DuplicatePending => {
            "You still have a pending payment. Please complete it first.".to_string()
        }
        AdmissionError::RateLimited => {
            "Too many requests. Please wait a few minutes.".to_string()
        }
    }
}

pub fn gateway_unavailable() -> String {
    "Could not create the payment. Please try again.".to_string()
}

pub fn internal_error() -> String {
    "A system error occurred. Please try again.".to_string()
}

/// Operator-facing event summary.
pub fn operator_event(
    kind: &str,
    order_id: &str,
    payment_ref: &str,
    identity: &str,
    amount: i64,
    detail: Option<&str>,
) -> String {
    let mut text = format!(
        "*PAYMENT {}*\n\n\
         Order ID: {}\n\
         Payment ref: {}\n\
         Driver: {}\n\
         Amount: Rp {}\n\
         Time: {}",
        kind.to_uppercase(),
        order_id,
        payment_ref,
        identity,
        format_rupiah(amount),
        stamp(Utc::now()),
    );
    if let Some(detail) = detail {
        text.push_str(&format!("\nDetail: {}", detail));
    }
    text
}
