//! Printable HTML ticket for an invoice. The page is self-contained so the
//! browser print dialog (or an external PDF renderer) can use it as is.

use std::fmt::Write;

use rust_decimal::Decimal;

use super::invoices::InvoiceDetail;
use crate::entities::{client, clinic, pet};

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn money(value: Decimal, currency: &str) -> String {
    format!("{} {:.2}", escape(currency), value)
}

pub fn render(
    clinic: &clinic::Model,
    client: &client::Model,
    pet: Option<&pet::Model>,
    detail: &InvoiceDetail,
) -> String {
    let invoice = &detail.invoice;
    let currency = clinic.currency.as_str();
    let mut html = String::with_capacity(4096);

    // Writing into a String cannot fail.
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{number}</title>
<style>
body {{ font-family: monospace; max-width: 80mm; margin: 0 auto; font-size: 12px; }}
h1 {{ font-size: 16px; text-align: center; margin-bottom: 0; }}
.center {{ text-align: center; }}
table {{ width: 100%; border-collapse: collapse; }}
td.num {{ text-align: right; }}
.totals td {{ border-top: 1px dashed #000; }}
.status {{ font-weight: bold; text-align: center; margin-top: 8px; }}
</style>
</head>
<body>
<h1>{clinic_name}</h1>
"#,
        number = escape(&invoice.number),
        clinic_name = escape(&clinic.name),
    );

    for line in [&clinic.legal_name, &clinic.tax_id, &clinic.address, &clinic.phone]
        .into_iter()
        .flatten()
    {
        let _ = writeln!(html, "<div class=\"center\">{}</div>", escape(line));
    }

    let _ = write!(
        html,
        "<p>Invoice: <strong>{}</strong><br>Date: {}<br>Client: {}",
        escape(&invoice.number),
        invoice.issue_date.format("%Y-%m-%d"),
        escape(&client.full_name()),
    );
    if let Some(pet) = pet {
        let _ = write!(html, "<br>Patient: {}", escape(&pet.name));
    }
    html.push_str("</p>\n<table>\n");

    for item in &detail.items {
        let _ = writeln!(
            html,
            "<tr><td>{} x {}</td><td class=\"num\">{}</td></tr>",
            item.quantity,
            escape(&item.description),
            money(item.line_total, currency),
        );
    }

    let _ = writeln!(
        html,
        "<tr class=\"totals\"><td>Subtotal</td><td class=\"num\">{}</td></tr>",
        money(invoice.subtotal, currency)
    );
    if !invoice.discount.is_zero() {
        let _ = writeln!(
            html,
            "<tr><td>Discount</td><td class=\"num\">-{}</td></tr>",
            money(invoice.discount, currency)
        );
    }
    if !invoice.tax_amount.is_zero() {
        let _ = writeln!(
            html,
            "<tr><td>Tax ({}%)</td><td class=\"num\">{}</td></tr>",
            invoice.tax_rate.normalize(),
            money(invoice.tax_amount, currency)
        );
    }
    let _ = writeln!(
        html,
        "<tr><td><strong>Total</strong></td><td class=\"num\"><strong>{}</strong></td></tr>",
        money(invoice.total, currency)
    );
    for payment in &detail.payments {
        let _ = writeln!(
            html,
            "<tr><td>Paid ({})</td><td class=\"num\">{}</td></tr>",
            payment.method,
            money(payment.amount, currency)
        );
    }
    if detail.balance_due > Decimal::ZERO {
        let _ = writeln!(
            html,
            "<tr><td>Balance due</td><td class=\"num\">{}</td></tr>",
            money(detail.balance_due, currency)
        );
    }

    let _ = write!(
        html,
        "</table>\n<div class=\"status\">{}</div>\n",
        invoice.status
    );
    if let Some(notes) = &invoice.notes {
        let _ = writeln!(html, "<p>{}</p>", escape(notes));
    }
    html.push_str("<p class=\"center\">Thank you!</p>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_escaped() {
        assert_eq!(
            escape("<b>Tom & \"Jerry\"</b>"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(money(Decimal::new(5, 0), "EUR"), "EUR 5.00");
        assert_eq!(money(Decimal::new(1234, 1), "USD"), "USD 123.40");
    }
}
