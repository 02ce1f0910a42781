use std::fmt::Write;

use crate::dispatch::record::LeadRecord;
use crate::lifecycle::PaymentProofs;

use super::{MessageSink, NotifyError};

fn field(value: &Option<String>) -> &str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("-")
}

/// Plain-text summary of a lead that stopped before completing.
pub fn abandonment_text(lead: &LeadRecord) -> String {
    let mut text = String::from("Registration abandoned\n\n");
    let _ = writeln!(text, "Name: {}", field(&lead.name));
    let _ = writeln!(text, "Email: {}", lead.email);
    let _ = writeln!(text, "WhatsApp: {}", field(&lead.whatsapp));
    let _ = writeln!(text, "Role: {}", field(&lead.role));
    let _ = writeln!(text, "College: {}", field(&lead.college));
    let _ = writeln!(text, "Year: {}", field(&lead.year));
    let _ = write!(text, "Category: {}", field(&lead.category));
    text
}

/// Full summary of a completed registration including the fee paid.
pub fn completion_text(lead: &LeadRecord) -> String {
    let mut text = String::from("New registration completed\n\n");
    let _ = writeln!(text, "Name: {}", field(&lead.name));
    let _ = writeln!(text, "Email: {}", lead.email);
    let _ = writeln!(text, "WhatsApp: {}", field(&lead.whatsapp));
    let _ = writeln!(text, "Role: {}", field(&lead.role));
    let _ = writeln!(text, "College: {}", field(&lead.college));
    let _ = writeln!(text, "Year: {}", field(&lead.year));
    let _ = writeln!(text, "Category: {}", field(&lead.category));
    let _ = writeln!(
        text,
        "Discount: {}",
        if lead.discount_flag { "yes" } else { "no" }
    );
    match lead.amount {
        Some(amount) => {
            let _ = write!(text, "Amount: {}", format_amount(amount));
        }
        None => text.push_str("Amount: -"),
    }
    text
}

/// Group thousands with dots, e.g. `150000` -> `150.000`.
fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

pub async fn notify_abandonment(
    sink: &dyn MessageSink,
    lead: &LeadRecord,
) -> Result<(), NotifyError> {
    sink.send_text(&abandonment_text(lead)).await
}

/// Send the completion summary, shaped by how many payment proofs exist.
///
/// One proof: a single photo captioned with the summary. Two proofs: the
/// summary as text, then both proofs as a photo group. No proof: text only.
pub async fn notify_completion(
    sink: &dyn MessageSink,
    lead: &LeadRecord,
) -> Result<(), NotifyError> {
    let text = completion_text(lead);
    match lead.proofs() {
        Some(PaymentProofs::Single(url)) => sink.send_photo(&url, &text).await,
        Some(PaymentProofs::Pair(first, second)) => {
            sink.send_text(&text).await?;
            sink.send_photo_group(&[first, second]).await
        }
        None => {
            tracing::warn!(email = %lead.email, "Completed registration has no payment proof");
            sink.send_text(&text).await
        }
    }
}
