//! # Printable Receipts
//!
//! A receipt shows the shop header, the order date, one row per line
//! (name, quantity, rate, amount), and the total. [`Receipt::to_html`]
//! produces a standalone document with a print button hidden from print
//! media; [`Receipt::to_text`] lays out the same content for a terminal.
//!
//! Line amounts are `rate × count` computed here, never read from storage.
//! The total printed is the order's stored total.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use kaimanam_core::{Order, RecordKey};

/// Currency symbol printed before every amount.
pub const CURRENCY: &str = "₹";

/// The shop details printed at the top of every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopProfile {
    pub name: String,
    pub address: String,
    pub phone: String,
    /// Banner above the line table.
    pub tagline: String,
    /// Closing line.
    pub footer: String,
}

impl Default for ShopProfile {
    fn default() -> Self {
        Self {
            name: "Kaimanam".to_string(),
            address: "12/9 Vadanoombal Salai, Parvathi Nagar, 2nd Street, Perumalagaram, \
                      Chennai, Tamil Nadu 600077"
                .to_string(),
            phone: "1234567890".to_string(),
            tagline: "kaimanam home foods".to_string(),
            footer: "Thank You".to_string(),
        }
    }
}

/// A receipt for one placed order.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    profile: &'a ShopProfile,
    key: &'a RecordKey,
    order: &'a Order,
}

impl<'a> Receipt<'a> {
    pub fn new(profile: &'a ShopProfile, key: &'a RecordKey, order: &'a Order) -> Self {
        Self {
            profile,
            key,
            order,
        }
    }

    fn date(&self) -> String {
        self.order
            .created_at
            .as_ref()
            .map(|t| t.to_receipt_string())
            .unwrap_or_else(|| "date unknown".to_string())
    }

    /// Standalone HTML document.
    pub fn to_html(&self) -> String {
        let p = self.profile;
        let mut rows = String::new();
        for line in &self.order.items {
            // Writing to a String cannot fail.
            let _ = write!(
                rows,
                "\n        <tr><td>{}</td><td>{}</td><td>{CURRENCY}{}</td><td>{CURRENCY}{}</td></tr>",
                escape(&line.name),
                line.count,
                line.rate,
                line.amount()
            );
        }
        format!(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{name} receipt {key}</title>
    <style>
      body {{ font-family: sans-serif; max-width: 24rem; margin: 1rem auto; }}
      .center {{ text-align: center; }}
      .tagline {{ color: #dc3545; text-transform: capitalize; }}
      table {{ width: 100%; border-collapse: collapse; }}
      th, td {{ border: 1px solid #333; padding: 0.25rem 0.5rem; }}
      @media print {{ .btn-print {{ display: none; }} }}
    </style>
  </head>
  <body>
    <div class="center">
      <h2>{name}</h2>
      <p style="font-size: 13px;">{address}</p>
      <p>Phone_No: {phone} &middot; {date}</p>
    </div>
    <h4 class="center tagline">{tagline}</h4>
    <table>
      <thead>
        <tr><th>Item Name</th><th>Quantity</th><th>Rate</th><th>Amount</th></tr>
      </thead>
      <tbody>{rows}
      </tbody>
    </table>
    <p class="center"><strong>Total: {CURRENCY}{total}</strong></p>
    <p class="center">********** {footer} **********</p>
    <div class="center btn-print"><button onclick="window.print()">Print Bill</button></div>
  </body>
</html>
"#,
            name = escape(&p.name),
            key = escape(self.key.as_str()),
            address = escape(&p.address),
            phone = escape(&p.phone),
            date = escape(&self.date()),
            tagline = escape(&p.tagline),
            total = self.order.total,
            footer = escape(&p.footer),
        )
    }

    /// Fixed-width plain text.
    pub fn to_text(&self) -> String {
        let p = self.profile;
        let width = 48;
        let rule = "-".repeat(width);
        let mut out = String::new();
        let _ = writeln!(out, "{:^width$}", p.name);
        let _ = writeln!(out, "{}", p.address);
        let _ = writeln!(out, "Phone_No: {}", p.phone);
        let _ = writeln!(out, "{}", self.date());
        let _ = writeln!(out, "{:^width$}", p.tagline);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{:<22}{:>6}{:>10}{:>10}", "Item Name", "Qty", "Rate", "Amount");
        let _ = writeln!(out, "{rule}");
        for line in &self.order.items {
            let _ = writeln!(
                out,
                "{:<22}{:>6}{:>10}{:>10}",
                truncate(&line.name, 21),
                line.count,
                format!("{CURRENCY}{}", line.rate),
                format!("{CURRENCY}{}", line.amount())
            );
        }
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{:>width$}", format!("Total: {CURRENCY}{}", self.order.total));
        let _ = writeln!(out, "{:^width$}", format!("********** {} **********", p.footer));
        out
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// Escape text for HTML element content and attribute values.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
