//! # Receipt Rendering
//!
//! Every checkout produces exactly one document: a thermal receipt for
//! ordinary sales, or a battery bill (with warranty terms) when any product
//! in the sale is a battery.
//!
//! ```text
//! ┌──────────────────────────────┐      ┌──────────────────────────────┐
//! │          RECEIPT             │      │  BATTERY PURCHASE RECEIPT    │
//! │  Ref: TXN12345678042         │      │  Reference: TXN...           │
//! │  16/10/2026 14:05:09         │      │  Date: ... Time: ...         │
//! │ ──────────────────────────── │      │  Items Purchased:            │
//! │  Oil 5W-30 (4L) x1  OMR 9.500│      │  NS60 (Qty: 1)  OMR 38.000   │
//! │  Trade-ins:                  │      │  Trade-ins Applied: ...      │
//! │  Old battery x1 -OMR 4.000   │      │  TOTAL AMOUNT: OMR 34.000    │
//! │  TOTAL: OMR 5.500            │      │  Battery Warranty Info       │
//! └──────────────────────────────┘      └──────────────────────────────┘
//!        thermal (80mm)                        battery bill
//! ```
//!
//! Rendering sits behind [`ReceiptRenderer`] so the checkout engine never
//! depends on a particular layout.

use chrono::{DateTime, Utc};
use std::fmt::{self, Write};
use uuid::Uuid;

use crate::catalog::ProductCatalog;
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, CURRENCY_CODE};
use crate::quantity::Quantity;
use crate::types::{CheckoutInput, LineItemKind};

/// Receipt name of service charge lines.
pub const SERVICE_CHARGE_NAME: &str = "Service charge";

// =============================================================================
// Receipt Data
// =============================================================================

/// One sold line as printed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: Quantity,
    pub selling_price: Money,
    pub volume_description: Option<String>,
}

impl ReceiptItem {
    pub fn line_total(&self) -> Money {
        self.selling_price.times(self.quantity)
    }
}

/// One trade-in line as printed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptTradeIn {
    pub name: String,
    pub quantity: i64,
    pub trade_in_value: Money,
}

/// Everything a renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptData {
    pub reference_number: String,
    pub total_amount: Money,
    pub payment_method: String,
    pub items: Vec<ReceiptItem>,
    pub trade_ins: Vec<ReceiptTradeIn>,
    pub issued_at: DateTime<Utc>,
}

impl ReceiptData {
    /// Builds receipt data from a validated checkout.
    ///
    /// Names come from the catalog. Unresolved products print as
    /// `Product <id>`; unresolved trade-ins fall back to the ad hoc name
    /// and then to `Trade-in <id>`.
    pub fn from_checkout(
        input: &CheckoutInput,
        catalog: &ProductCatalog,
        reference_number: &str,
        total_amount: Money,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let items = input
            .cart
            .iter()
            .map(|line| ReceiptItem {
                name: match line.kind {
                    LineItemKind::ServiceCharge => SERVICE_CHARGE_NAME.to_string(),
                    LineItemKind::InventoryProduct(id) => product_name(catalog, &id),
                },
                quantity: line.quantity,
                selling_price: line.selling_price,
                volume_description: line.volume_description.clone(),
            })
            .collect();

        let trade_ins = input
            .trade_ins
            .iter()
            .map(|t| ReceiptTradeIn {
                name: catalog
                    .name(&t.product_id)
                    .map(String::from)
                    .or_else(|| t.name.clone())
                    .unwrap_or_else(|| format!("Trade-in {}", t.product_id)),
                quantity: t.quantity,
                trade_in_value: t.trade_in_value,
            })
            .collect();

        ReceiptData {
            reference_number: reference_number.to_string(),
            total_amount,
            payment_method: input.payment_method.clone(),
            items,
            trade_ins,
            issued_at,
        }
    }

    /// `dd/mm/yyyy`
    pub fn date(&self) -> String {
        self.issued_at.format("%d/%m/%Y").to_string()
    }

    /// `HH:MM:SS`, 24-hour clock.
    pub fn time(&self) -> String {
        self.issued_at.format("%H:%M:%S").to_string()
    }
}

fn product_name(catalog: &ProductCatalog, id: &Uuid) -> String {
    catalog
        .name(id)
        .map(String::from)
        .unwrap_or_else(|| format!("Product {id}"))
}

/// `OMR 10.500`
pub fn format_currency(amount: Money) -> String {
    format!("{CURRENCY_CODE} {amount}")
}

// =============================================================================
// Renderer
// =============================================================================

/// Produces printable receipt documents.
pub trait ReceiptRenderer: Send + Sync {
    /// Standard thermal receipt.
    fn render_receipt(&self, data: &ReceiptData) -> CoreResult<String>;

    /// Battery bill with warranty terms.
    fn render_battery_bill(&self, data: &ReceiptData) -> CoreResult<String>;
}

/// HTML documents sized for an 80mm thermal printer and an A5 battery bill.
#[derive(Debug, Clone, Default)]
pub struct HtmlReceiptRenderer;

impl ReceiptRenderer for HtmlReceiptRenderer {
    fn render_receipt(&self, data: &ReceiptData) -> CoreResult<String> {
        let mut html = String::with_capacity(2048);
        write_thermal(&mut html, data).map_err(render_failed)?;
        Ok(html)
    }

    fn render_battery_bill(&self, data: &ReceiptData) -> CoreResult<String> {
        let mut html = String::with_capacity(4096);
        write_battery_bill(&mut html, data).map_err(render_failed)?;
        Ok(html)
    }
}

fn render_failed(_: fmt::Error) -> CoreError {
    CoreError::Internal("receipt rendering failed".to_string())
}

const THERMAL_STYLE: &str = "\
body { font-family: 'Courier New', monospace; font-size: 12px; margin: 0; padding: 10px; max-width: 300px; }
.header { text-align: center; margin-bottom: 15px; border-bottom: 1px dashed #000; padding-bottom: 10px; }
.item { display: flex; justify-content: space-between; margin: 3px 0; font-size: 11px; }
.item-name { flex: 1; margin-right: 10px; }
.item-price { font-weight: bold; }
.total { border-top: 1px solid #000; padding-top: 8px; margin-top: 15px; font-weight: bold; }
.trade-in { color: #666; font-size: 10px; }
.footer { text-align: center; margin-top: 20px; font-size: 10px; border-top: 1px dashed #000; padding-top: 10px; }
.separator { border-top: 1px dashed #ccc; margin: 5px 0; }";

const BATTERY_STYLE: &str = "\
body { font-family: Arial, sans-serif; font-size: 14px; margin: 0; padding: 20px; max-width: 500px; }
.header { text-align: center; margin-bottom: 25px; border-bottom: 2px solid #000; padding-bottom: 15px; }
.item { display: flex; justify-content: space-between; margin: 10px 0; padding: 8px 0; border-bottom: 1px solid #eee; }
.item-name { flex: 1; margin-right: 15px; }
.item-price { font-weight: bold; }
.total { border-top: 2px solid #000; padding-top: 15px; margin-top: 25px; font-size: 16px; font-weight: bold; }
.trade-in { background: #f8f8f8; padding: 10px; margin: 15px 0; border-radius: 5px; border-left: 4px solid #007bff; }
.footer { text-align: center; margin-top: 30px; font-size: 12px; }
.warranty { background: #fff3cd; padding: 15px; margin: 20px 0; border-radius: 8px; border-left: 4px solid #ffc107; }
.separator { border-top: 1px solid #ddd; margin: 10px 0; }";

fn write_head(out: &mut String, title: &str, style: &str) -> fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"UTF-8\">")?;
    writeln!(out, "<title>{title}</title>")?;
    writeln!(out, "<style>\n{style}\n</style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")
}

fn item_label(item: &ReceiptItem) -> String {
    match &item.volume_description {
        Some(volume) => format!("{} ({})", escape(&item.name), escape(volume)),
        None => escape(&item.name),
    }
}

fn write_trade_ins(out: &mut String, data: &ReceiptData, heading: &str) -> fmt::Result {
    if data.trade_ins.is_empty() {
        return Ok(());
    }

    writeln!(out, "<div class=\"separator\"></div>")?;
    writeln!(out, "<div class=\"trade-in\">")?;
    writeln!(out, "{heading}")?;
    for trade_in in &data.trade_ins {
        writeln!(
            out,
            "<div class=\"item\"><span class=\"item-name\">{} x{}</span>\
             <span class=\"item-price\">-{}</span></div>",
            escape(&trade_in.name),
            trade_in.quantity,
            format_currency(trade_in.trade_in_value),
        )?;
    }
    writeln!(out, "</div>")
}

fn write_thermal(out: &mut String, data: &ReceiptData) -> fmt::Result {
    write_head(out, "Receipt", THERMAL_STYLE)?;

    writeln!(out, "<div class=\"header\">")?;
    writeln!(out, "<h2>RECEIPT</h2>")?;
    writeln!(out, "<p><strong>Ref:</strong> {}</p>", escape(&data.reference_number))?;
    writeln!(out, "<p>{} {}</p>", data.date(), data.time())?;
    writeln!(out, "</div>")?;

    writeln!(out, "<div class=\"items\">")?;
    for item in &data.items {
        writeln!(
            out,
            "<div class=\"item\"><span class=\"item-name\">{} x{}</span>\
             <span class=\"item-price\">{}</span></div>",
            item_label(item),
            item.quantity,
            format_currency(item.line_total()),
        )?;
    }
    write_trade_ins(
        out,
        data,
        "<div style=\"font-weight: bold; margin-bottom: 5px;\">Trade-ins:</div>",
    )?;
    writeln!(out, "</div>")?;

    writeln!(out, "<div class=\"total\">")?;
    writeln!(
        out,
        "<div class=\"item\"><span><strong>TOTAL: {}</strong></span></div>",
        format_currency(data.total_amount)
    )?;
    writeln!(out, "<p>Payment: {}</p>", escape(&data.payment_method))?;
    writeln!(out, "</div>")?;

    writeln!(out, "<div class=\"footer\">")?;
    writeln!(out, "<p>Thank you for your business!</p>")?;
    writeln!(out, "<p>Keep this receipt for warranty</p>")?;
    writeln!(out, "</div>")?;
    writeln!(out, "</body>\n</html>")
}

fn write_battery_bill(out: &mut String, data: &ReceiptData) -> fmt::Result {
    write_head(out, "Battery Bill", BATTERY_STYLE)?;

    writeln!(out, "<div class=\"header\">")?;
    writeln!(out, "<h1>BATTERY PURCHASE RECEIPT</h1>")?;
    writeln!(
        out,
        "<p><strong>Reference:</strong> {}</p>",
        escape(&data.reference_number)
    )?;
    writeln!(
        out,
        "<p><strong>Date:</strong> {} <strong>Time:</strong> {}</p>",
        data.date(),
        data.time()
    )?;
    writeln!(out, "</div>")?;

    writeln!(out, "<div class=\"items\">")?;
    writeln!(out, "<h3>Items Purchased:</h3>")?;
    for item in &data.items {
        let (name, volume) = match &item.volume_description {
            Some(v) => (escape(&item.name), format!(" ({})", escape(v))),
            None => (escape(&item.name), String::new()),
        };
        writeln!(
            out,
            "<div class=\"item\"><span class=\"item-name\"><strong>{name}</strong>{volume} \
             (Qty: {})</span><span class=\"item-price\">{}</span></div>",
            item.quantity,
            format_currency(item.line_total()),
        )?;
    }
    write_trade_ins(out, data, "<h4>Trade-ins Applied:</h4>")?;
    writeln!(out, "</div>")?;

    writeln!(out, "<div class=\"total\">")?;
    writeln!(
        out,
        "<div class=\"item\"><span><strong>TOTAL AMOUNT:</strong></span>\
         <span><strong>{}</strong></span></div>",
        format_currency(data.total_amount)
    )?;
    writeln!(
        out,
        "<p><strong>Payment Method:</strong> {}</p>",
        escape(&data.payment_method)
    )?;
    writeln!(out, "</div>")?;

    writeln!(out, "<div class=\"warranty\">")?;
    writeln!(out, "<h4>Battery Warranty Information:</h4>")?;
    writeln!(out, "<ul style=\"margin: 10px 0; padding-left: 20px;\">")?;
    writeln!(out, "<li>12-month warranty from date of purchase</li>")?;
    writeln!(out, "<li>Warranty covers manufacturing defects only</li>")?;
    writeln!(out, "<li>Keep this receipt for warranty claims</li>")?;
    writeln!(out, "<li>Warranty void if battery is damaged or misused</li>")?;
    writeln!(out, "</ul>")?;
    writeln!(out, "</div>")?;

    writeln!(out, "<div class=\"footer\">")?;
    writeln!(
        out,
        "<p><strong>Thank you for choosing our battery services!</strong></p>"
    )?;
    writeln!(
        out,
        "<p>For warranty claims or questions, please contact us with this receipt.</p>"
    )?;
    writeln!(
        out,
        "<p style=\"margin-top: 15px; font-size: 10px; color: #666;\">\
         This receipt is your proof of purchase and warranty document.</p>"
    )?;
    writeln!(out, "</div>")?;
    writeln!(out, "</body>\n</html>")
}

/// Escapes text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ReceiptData {
        ReceiptData {
            reference_number: "TXN12345678042".to_string(),
            total_amount: Money::from_minor(5_500),
            payment_method: "cash".to_string(),
            items: vec![ReceiptItem {
                name: "Oil 5W-30".to_string(),
                quantity: Quantity::from_units(1),
                selling_price: Money::from_minor(9_500),
                volume_description: Some("4L".to_string()),
            }],
            trade_ins: vec![ReceiptTradeIn {
                name: "Old battery".to_string(),
                quantity: 1,
                trade_in_value: Money::from_minor(4_000),
            }],
            issued_at: Utc.with_ymd_and_hms(2026, 3, 7, 14, 5, 9).unwrap(),
        }
    }

    #[test]
    fn test_date_time_format() {
        let data = sample();
        assert_eq!(data.date(), "07/03/2026");
        assert_eq!(data.time(), "14:05:09");
    }

    #[test]
    fn test_thermal_receipt_content() {
        let html = HtmlReceiptRenderer.render_receipt(&sample()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h2>RECEIPT</h2>"));
        assert!(html.contains("TXN12345678042"));
        assert!(html.contains("Oil 5W-30 (4L) x1"));
        assert!(html.contains("OMR 9.500"));
        assert!(html.contains("Old battery x1"));
        assert!(html.contains("-OMR 4.000"));
        assert!(html.contains("TOTAL: OMR 5.500"));
        assert!(!html.contains("Warranty Information"));
    }

    #[test]
    fn test_battery_bill_content() {
        let html = HtmlReceiptRenderer.render_battery_bill(&sample()).unwrap();

        assert!(html.contains("BATTERY PURCHASE RECEIPT"));
        assert!(html.contains("(Qty: 1)"));
        assert!(html.contains("Trade-ins Applied:"));
        assert!(html.contains("TOTAL AMOUNT:"));
        assert!(html.contains("Battery Warranty Information"));
        assert!(html.contains("07/03/2026"));
    }

    #[test]
    fn test_fractional_quantity_line_total() {
        let mut data = sample();
        data.items[0].quantity = Quantity::from_milli(500);
        let html = HtmlReceiptRenderer.render_receipt(&data).unwrap();
        assert!(html.contains("x0.5"));
        assert!(html.contains("OMR 4.750"));
    }

    #[test]
    fn test_names_are_escaped() {
        let mut data = sample();
        data.items[0].name = "<script>alert('x')</script>".to_string();
        let html = HtmlReceiptRenderer.render_receipt(&data).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_no_trade_in_section_without_trade_ins() {
        let mut data = sample();
        data.trade_ins.clear();
        let html = HtmlReceiptRenderer.render_receipt(&data).unwrap();
        assert!(!html.contains("Trade-ins:"));
    }

    #[test]
    fn test_currency_format() {
        assert_eq!(format_currency(Money::from_minor(12_345)), "OMR 12.345");
    }
}
