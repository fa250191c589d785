//! Invoice statement PDF export.
//!
//! Formats an already-fetched invoice into a printable statement. No data
//! access beyond the invoice reader.

use std::io::BufWriter;

use anyhow::{anyhow, Result};
use printpdf::*;

use crate::db::DbConnection;
use crate::domain::invoice_service::InvoiceService;
use crate::events::EventBus;
use crate::storage::CardRepository;
use shared::{format_brl, LineItemStatus};

// A4 dimensions (mm)
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 18.0;
const MARGIN_RIGHT: f32 = 18.0;
const ROW_H: f32 = 5.5;
const FONT_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 16.0;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.len() as f32 * size * 0.18
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

struct StatementPdf {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl StatementPdf {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("PDF font error: {e:?}"))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("PDF font error: {e:?}"))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { self.font_bold.clone() } else { self.font.clone() };
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.use_text(s, size, Mm(x), Mm(self.pdf_y()), &font);
    }

    fn hline(&self) {
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.set_outline_thickness(0.5);
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.pdf_y())), false),
                (Point::new(Mm(PAGE_W - MARGIN_RIGHT), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        };
        layer.add_line(line);
    }

    fn header(&mut self, card_name: &str, statement_month: &str) {
        self.text("Invoice Statement", MARGIN_LEFT, TITLE_SIZE, true);
        self.y += 7.0;
        self.text(card_name, MARGIN_LEFT, FONT_SIZE, false);
        self.y += 5.0;
        self.text(&format!("Statement month {}", statement_month), MARGIN_LEFT, FONT_SIZE, false);
        self.y += 5.0;
        let ts = chrono::Local::now()
            .format("Generated %Y-%m-%d %H:%M")
            .to_string();
        self.text(&ts, MARGIN_LEFT, 8.0, false);
        self.y += 5.0;
        self.hline();
        self.y += 5.0;
    }

    fn table_row(&mut self, cols: &[Col], values: &[&str], bold: bool) {
        self.ensure_space(ROW_H);
        let mut x = MARGIN_LEFT;
        for (i, col) in cols.iter().enumerate() {
            if i < values.len() {
                match col.align {
                    Align::Left => self.text(values[i], x, FONT_SIZE, bold),
                    Align::Right => {
                        let tw = approx_text_width(values[i], FONT_SIZE);
                        self.text(values[i], x + col.width - tw, FONT_SIZE, bold);
                    }
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
    }

    fn table_header(&mut self, cols: &[Col], headers: &[&str]) {
        self.ensure_space(ROW_H * 2.0);
        self.table_row(cols, headers, true);
        self.y -= 3.0;
        self.hline();
        self.y += 2.0;
    }

    fn separator(&mut self) {
        self.hline();
        self.y += 2.0;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| anyhow!("PDF save error: {e:?}"))?;
        Ok(buf.into_inner().map_err(|e| anyhow!("PDF buffer error: {}", e))?)
    }
}

#[derive(Clone)]
pub struct StatementService {
    invoice_service: InvoiceService,
    card_repository: CardRepository,
}

impl StatementService {
    pub fn new(db: DbConnection, events: EventBus) -> Self {
        Self {
            invoice_service: InvoiceService::new(db.clone(), events),
            card_repository: CardRepository::new(db),
        }
    }

    /// Render one card's statement month as a PDF document.
    pub async fn render_statement(&self, card_id: &str, statement_month: &str) -> Result<Vec<u8>> {
        let card = self
            .card_repository
            .get_card(card_id)
            .await?
            .ok_or_else(|| anyhow!("Card not found: {}", card_id))?;
        let invoice = self.invoice_service.get_invoice(card_id, statement_month).await?;

        let mut pdf = StatementPdf::new("Invoice Statement")?;
        pdf.header(&card.name, statement_month);

        let cols = &[
            Col { width: 26.0, align: Align::Left },
            Col { width: 72.0, align: Align::Left },
            Col { width: 20.0, align: Align::Left },
            Col { width: 22.0, align: Align::Left },
            Col { width: 34.0, align: Align::Right },
        ];
        pdf.table_header(cols, &["Due date", "Description", "Parcel", "Status", "Amount"]);

        for item in &invoice.items {
            let due = item.due_date.to_string();
            let parcel = item.installment_label().unwrap_or_default();
            let status = match item.status {
                LineItemStatus::Pending => "pending",
                LineItemStatus::Paid => "paid",
                LineItemStatus::Canceled => "canceled",
            };
            let amount = format_brl(item.amount);
            pdf.table_row(cols, &[&due, &item.description, &parcel, status, &amount], false);
        }

        pdf.separator();
        let total = format_brl(invoice.total);
        pdf.table_row(cols, &["", "Total", "", "", &total], true);
        let paid = format_brl(invoice.total_paid);
        pdf.table_row(cols, &["", "Paid", "", "", &paid], false);
        let open = format_brl(invoice.total - invoice.total_paid);
        pdf.table_row(cols, &["", "Open", "", "", &open], false);

        if let Some(payment_date) = invoice.payment_date {
            let label = format!("Paid on {}", payment_date);
            pdf.table_row(cols, &["", &label, "", "", ""], false);
        }

        pdf.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account_service::AccountService;
    use crate::domain::card_service::CardService;
    use crate::domain::commands::accounts::CreateAccountCommand;
    use crate::domain::commands::cards::CreateCardCommand;
    use crate::domain::commands::invoices::CreatePurchaseCommand;
    use shared::AccountContext;

    async fn seeded_service() -> (StatementService, String) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let events = EventBus::new();
        let accounts = AccountService::new(db.clone(), events.clone());
        let cards = CardService::new(db.clone(), events.clone());
        let invoices = InvoiceService::new(db.clone(), events.clone());
        let statements = StatementService::new(db.clone(), events);

        let account = accounts
            .create_account(CreateAccountCommand {
                name: "Checking".to_string(),
                bank_name: None,
                context: AccountContext::Personal,
                opening_balance: 1000.0,
            })
            .await
            .unwrap()
            .account;
        let card = cards
            .create_card(CreateCardCommand {
                name: "Platinum".to_string(),
                account_id: account.id,
                credit_limit: 5000.0,
                closing_day: 25,
                due_day: 10,
                color: None,
                context: AccountContext::Personal,
            })
            .await
            .unwrap()
            .card;
        invoices
            .create_purchase(CreatePurchaseCommand {
                card_id: card.id.clone(),
                description: "Notebook".to_string(),
                amount: 3000.0,
                first_statement_month: "2025-03".to_string(),
                installments: 10,
                category_id: None,
            })
            .await
            .unwrap();

        (statements, card.id)
    }

    #[tokio::test]
    async fn test_render_statement_produces_pdf() {
        let (statements, card_id) = seeded_service().await;
        let bytes = statements.render_statement(&card_id, "2025-03").await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_render_statement_for_empty_month() {
        let (statements, card_id) = seeded_service().await;
        let bytes = statements.render_statement(&card_id, "2030-01").await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
