//! Renders a [Report] as a PDF 1.4 document.
//!
//! Uses the standard Helvetica fonts so that no font data needs to be
//! embedded. Text is encoded with WinAnsiEncoding, characters outside it are
//! replaced with '?'.

use std::io::Write;

use crate::report::{Report, format::format_currency};

const PAGE_WIDTH: i32 = 612;
const PAGE_HEIGHT: i32 = 792;
const MARGIN: i32 = 50;
const ROW_HEIGHT: i32 = 16;
const BOTTOM: i32 = MARGIN + 20;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// Column x positions for the transaction table.
const TRANSACTION_COLUMNS: [i32; 5] = [MARGIN, 125, 320, 430, 500];
const CATEGORY_COLUMNS: [i32; 3] = [MARGIN, 320, 450];

/// Render `report` to the bytes of a PDF file.
pub fn render_pdf(report: &Report) -> Vec<u8> {
    let mut layout = Layout::new();

    layout.text(BOLD, 20, MARGIN, &report.title);
    layout.advance(24);
    layout.text(
        REGULAR,
        10,
        MARGIN,
        &format!(
            "Period: {} to {}",
            report.window.start.date(),
            report.window.end.date()
        ),
    );
    layout.advance(14);
    layout.text(
        REGULAR,
        10,
        MARGIN,
        &format!("Generated: {}", report.generated_at.date()),
    );
    layout.advance(30);

    layout.heading("Summary");
    let summary = &report.summary;
    for (label, value) in [
        ("Total Income", summary.total_income),
        ("Total Expenses", summary.total_expense),
        ("Balance", summary.balance),
    ] {
        layout.ensure_space(ROW_HEIGHT);
        layout.text(REGULAR, 11, MARGIN, label);
        layout.text(BOLD, 11, 200, &format_currency(value));
        layout.advance(ROW_HEIGHT);
    }
    layout.advance(20);

    layout.heading("Expenses by Category");
    if report.categories.is_empty() {
        layout.text(REGULAR, 10, MARGIN, "No expenses in this period.");
        layout.advance(ROW_HEIGHT);
    } else {
        let header = ["Category", "Amount", "Percentage"];
        layout.table_header(&CATEGORY_COLUMNS, &header);
        for category in &report.categories {
            if layout.ensure_space(ROW_HEIGHT) {
                layout.table_header(&CATEGORY_COLUMNS, &header);
            }
            layout.row(
                &CATEGORY_COLUMNS,
                &[
                    &category.name,
                    &format_currency(category.total),
                    &format!("{}%", category.percentage),
                ],
            );
        }
    }
    layout.advance(20);

    layout.heading("Transactions");
    if report.transactions.is_empty() {
        layout.text(REGULAR, 10, MARGIN, "No transactions in this period.");
        layout.advance(ROW_HEIGHT);
    } else {
        let header = ["Date", "Description", "Category", "Type", "Amount"];
        layout.table_header(&TRANSACTION_COLUMNS, &header);
        for transaction in &report.transactions {
            if layout.ensure_space(ROW_HEIGHT) {
                layout.table_header(&TRANSACTION_COLUMNS, &header);
            }
            layout.row(
                &TRANSACTION_COLUMNS,
                &[
                    &transaction.date,
                    &transaction.description,
                    &transaction.category,
                    &transaction.expense_type,
                    &transaction.amount,
                ],
            );
        }
    }

    write_document(layout.finish())
}

/// Places text on pages from top to bottom, starting a new page when the
/// current one is full.
struct Layout {
    pages: Vec<Vec<u8>>,
    y: i32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn current_page(&mut self) -> &mut Vec<u8> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }

        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn text(&mut self, font: &str, size: i32, x: i32, text: &str) {
        let y = self.y;
        write_text(self.current_page(), font, size, x, y, text);
    }

    fn advance(&mut self, height: i32) {
        self.y -= height;
    }

    /// Start a new page if `height` does not fit on the current one.
    /// Returns whether a new page was started.
    fn ensure_space(&mut self, height: i32) -> bool {
        if self.y - height >= BOTTOM {
            return false;
        }

        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN;
        true
    }

    fn heading(&mut self, heading: &str) {
        self.ensure_space(ROW_HEIGHT * 3);
        self.text(BOLD, 14, MARGIN, heading);
        self.advance(20);
    }

    fn table_header(&mut self, columns: &[i32], header: &[&str]) {
        for (&x, label) in columns.iter().zip(header) {
            self.text(BOLD, 10, x, label);
        }

        let y = self.y - 4;
        let _ = writeln!(
            self.current_page(),
            "0.5 w {MARGIN} {y} m {} {y} l S",
            PAGE_WIDTH - MARGIN
        );
        self.advance(ROW_HEIGHT);
    }

    fn row(&mut self, columns: &[i32], cells: &[&str]) {
        for (&x, cell) in columns.iter().zip(cells) {
            self.text(REGULAR, 10, x, cell);
        }

        self.advance(ROW_HEIGHT);
    }

    /// Add page numbers and return the content stream of each page.
    fn finish(mut self) -> Vec<Vec<u8>> {
        let page_count = self.pages.len();

        for (index, page) in self.pages.iter_mut().enumerate() {
            write_text(
                page,
                REGULAR,
                9,
                PAGE_WIDTH - MARGIN - 60,
                MARGIN / 2,
                &format!("Page {} of {page_count}", index + 1),
            );
        }

        self.pages
    }
}

fn write_text(content: &mut Vec<u8>, font: &str, size: i32, x: i32, y: i32, text: &str) {
    content.extend_from_slice(format!("BT /{font} {size} Tf {x} {y} Td (").as_bytes());
    content.extend(encode_text(text));
    content.extend_from_slice(b") Tj ET\n");
}

/// Encode `text` as an escaped WinAnsiEncoding string literal body.
fn encode_text(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                bytes.push(b'\\');
                bytes.push(c as u8);
            }
            c if c.is_control() => bytes.push(b' '),
            c if (c as u32) < 0x80 => bytes.push(c as u8),
            c if (0xA0..=0xFF).contains(&(c as u32)) => bytes.push(c as u32 as u8),
            '€' => bytes.push(0x80),
            '…' => bytes.push(0x85),
            '‘' => bytes.push(0x91),
            '’' => bytes.push(0x92),
            '“' => bytes.push(0x93),
            '”' => bytes.push(0x94),
            '•' => bytes.push(0x95),
            '–' => bytes.push(0x96),
            '—' => bytes.push(0x97),
            _ => bytes.push(b'?'),
        }
    }

    bytes
}

/// Assemble the page content streams into a complete file with a cross-reference table.
fn write_document(pages: Vec<Vec<u8>>) -> Vec<u8> {
    // Objects 1 to 4 are fixed, each page then takes a page object and a content stream.
    const FIRST_PAGE_OBJECT: usize = 5;

    let kids = (0..pages.len())
        .map(|index| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * index))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()).into_bytes(),
        font_object("Helvetica"),
        font_object("Helvetica-Bold"),
    ];

    for (index, content) in pages.into_iter().enumerate() {
        let content_object = FIRST_PAGE_OBJECT + 2 * index + 1;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /{REGULAR} 3 0 R /{BOLD} 4 0 R >> >> \
                 /Contents {content_object} 0 R >>"
            )
            .into_bytes(),
        );

        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend(content);
        stream.extend_from_slice(b"\nendstream");
        objects.push(stream);
    }

    let mut document: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());

    for (index, object) in objects.iter().enumerate() {
        offsets.push(document.len());
        document.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        document.extend_from_slice(object);
        document.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = document.len();
    let size = objects.len() + 1;
    document.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
    for offset in offsets {
        document.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    document.extend_from_slice(
        format!("trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n")
            .as_bytes(),
    );

    document
}

fn font_object(base_font: &str) -> Vec<u8> {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{base_font} /Encoding /WinAnsiEncoding >>"
    )
    .into_bytes()
}
