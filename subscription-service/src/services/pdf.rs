//! Paged grid layout of report rows and its PDF rendering.
//!
//! Layout works in millimetres from the top-left corner of the page. The
//! renderer converts to PDF's bottom-left origin.

use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use service_core::error::AppError;

use super::report::ReportRow;

const A4_SHORT_MM: f32 = 210.0;
const A4_LONG_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const HEADER_MM: f32 = 15.0;
const PADDING_MM: f32 = 2.0;
const LINE_HEIGHT_MM: f32 = 7.0;
const MAX_LINES_PER_BOX: usize = 6;
const HEADER_FONT_SIZE: f32 = 11.0;
const BODY_FONT_SIZE: f32 = 10.0;
const PT_TO_MM: f32 = 0.3528;

pub const DEFAULT_COLUMNS: usize = 2;
pub const DEFAULT_ROWS: usize = 5;
/// Upper bound on columns and rows so boxes stay legible.
pub const MAX_GRID: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("portrait") => Ok(Orientation::Portrait),
            Some("landscape") => Ok(Orientation::Landscape),
            Some(other) => Err(AppError::validation(
                "orientation",
                "invalid",
                format!("Unknown orientation '{}'", other),
            )),
        }
    }

    fn page_size(&self) -> (f32, f32) {
        match self {
            Orientation::Portrait => (A4_SHORT_MM, A4_LONG_MM),
            Orientation::Landscape => (A4_LONG_MM, A4_SHORT_MM),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOptions {
    pub columns: usize,
    pub rows: usize,
    pub orientation: Orientation,
    pub char_limit: usize,
}

impl GridOptions {
    pub fn new(
        columns: Option<usize>,
        rows: Option<usize>,
        orientation: Orientation,
        char_limit: usize,
    ) -> Result<Self, AppError> {
        let columns = columns.unwrap_or(DEFAULT_COLUMNS);
        let rows = rows.unwrap_or(DEFAULT_ROWS);
        if !(1..=MAX_GRID).contains(&columns) {
            return Err(AppError::validation(
                "cols",
                "range",
                format!("cols must be between 1 and {}", MAX_GRID),
            ));
        }
        if !(1..=MAX_GRID).contains(&rows) {
            return Err(AppError::validation(
                "rows",
                "range",
                format!("rows must be between 1 and {}", MAX_GRID),
            ));
        }
        Ok(Self {
            columns,
            rows,
            orientation,
            char_limit,
        })
    }

    pub fn per_page(&self) -> usize {
        self.columns * self.rows
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxLayout {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub header: String,
    pub boxes: Vec<BoxLayout>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub width: f32,
    pub height: f32,
    pub pages: Vec<PageLayout>,
}

/// `"Status: Active | Category: ALL | Type: Gift"`.
pub fn header_text(status: &str, category: Option<&str>, stype: Option<&str>) -> String {
    format!(
        "Status: {} | Category: {} | Type: {}",
        capitalize(status),
        category.unwrap_or("ALL"),
        stype.unwrap_or("ALL")
    )
}

fn capitalize(value: &str) -> String {
    let lower = value.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Cut values longer than `char_limit` to `char_limit - 3` characters plus "...".
pub fn truncate(value: &str, char_limit: usize) -> String {
    if value.chars().count() <= char_limit {
        return value.to_string();
    }
    let kept: String = value.chars().take(char_limit.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn join_pair(first: &str, second: &str) -> String {
    format!("{}, {}", first, second)
        .trim_matches(|c| c == ',' || c == ' ')
        .to_string()
}

/// The printable lines of one record, blanks skipped.
pub fn box_lines(row: &ReportRow, char_limit: usize) -> Vec<String> {
    [
        row.name.clone(),
        row.address_line_1.clone(),
        row.address_line_2.clone(),
        join_pair(&row.city, &row.district),
        join_pair(&row.state, &row.pincode),
        row.phone.clone(),
    ]
    .iter()
    .map(|value| value.trim())
    .filter(|value| !value.is_empty() && *value != "null" && *value != "None")
    .map(|value| truncate(value, char_limit))
    .take(MAX_LINES_PER_BOX)
    .collect()
}

/// Fill a grid left-to-right, top-to-bottom, one page per `columns * rows`
/// records. An empty report still yields one page carrying the header.
pub fn layout_report(rows: &[ReportRow], header: &str, options: &GridOptions) -> ReportLayout {
    let (width, height) = options.orientation.page_size();
    let box_width = (width - 2.0 * MARGIN_MM) / options.columns as f32;
    let box_height = (height - 2.0 * MARGIN_MM - HEADER_MM) / options.rows as f32;
    let lines_that_fit = ((box_height - PADDING_MM) / LINE_HEIGHT_MM).floor().max(1.0) as usize;
    let max_lines = lines_that_fit.min(MAX_LINES_PER_BOX);

    let mut pages: Vec<PageLayout> = rows
        .chunks(options.per_page())
        .map(|chunk| PageLayout {
            header: header.to_string(),
            boxes: chunk
                .iter()
                .enumerate()
                .map(|(index, row)| {
                    let column = index % options.columns;
                    let grid_row = index / options.columns;
                    let mut lines = box_lines(row, options.char_limit);
                    lines.truncate(max_lines);
                    BoxLayout {
                        x: MARGIN_MM + column as f32 * box_width,
                        y: MARGIN_MM + HEADER_MM + grid_row as f32 * box_height,
                        width: box_width,
                        height: box_height,
                        lines,
                    }
                })
                .collect(),
        })
        .collect();

    if pages.is_empty() {
        pages.push(PageLayout {
            header: header.to_string(),
            boxes: Vec::new(),
        });
    }

    ReportLayout {
        width,
        height,
        pages,
    }
}

/// Turns a laid-out report into document bytes. Runs on a blocking thread.
pub trait ReportRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;
    fn render(&self, layout: &ReportLayout) -> Result<Vec<u8>, AppError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrintPdfRenderer;

impl PrintPdfRenderer {
    fn draw_page(
        layer: &PdfLayerReference,
        page: &PageLayout,
        page_height: f32,
        page_width: f32,
        font: &IndirectFontRef,
        bold: &IndirectFontRef,
    ) {
        let header_width = page.header.chars().count() as f32 * HEADER_FONT_SIZE * 0.5 * PT_TO_MM;
        let header_x = ((page_width - header_width) / 2.0).max(MARGIN_MM);
        layer.use_text(
            page.header.clone(),
            HEADER_FONT_SIZE,
            Mm(header_x),
            Mm(page_height - MARGIN_MM - LINE_HEIGHT_MM),
            bold,
        );

        for cell in &page.boxes {
            let top = page_height - cell.y;
            let bottom = top - cell.height;
            let right = cell.x + cell.width;
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(cell.x), Mm(top)), false),
                    (Point::new(Mm(right), Mm(top)), false),
                    (Point::new(Mm(right), Mm(bottom)), false),
                    (Point::new(Mm(cell.x), Mm(bottom)), false),
                ],
                is_closed: true,
            });

            for (index, text) in cell.lines.iter().enumerate() {
                let baseline = top - PADDING_MM - LINE_HEIGHT_MM * (index as f32 + 0.75);
                layer.use_text(
                    text.clone(),
                    BODY_FONT_SIZE,
                    Mm(cell.x + PADDING_MM),
                    Mm(baseline),
                    font,
                );
            }
        }
    }
}

impl ReportRenderer for PrintPdfRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, layout: &ReportLayout) -> Result<Vec<u8>, AppError> {
        let (doc, first_page, first_layer) = PdfDocument::new(
            "Subscriber report",
            Mm(layout.width),
            Mm(layout.height),
            "Layer 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("loading font: {}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("loading font: {}", e)))?;

        for (index, page) in layout.pages.iter().enumerate() {
            let (page_index, layer_index) = if index == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(Mm(layout.width), Mm(layout.height), "Layer 1")
            };
            let layer = doc.get_page(page_index).get_layer(layer_index);
            Self::draw_page(&layer, page, layout.height, layout.width, &font, &bold);
        }

        doc.save_to_bytes()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("writing PDF: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> ReportRow {
        ReportRow {
            name: name.to_string(),
            active: true,
            category: "N/A".to_string(),
            stype: "N/A".to_string(),
            address_line_1: "12 Temple Road".to_string(),
            address_line_2: String::new(),
            city: "Mysuru".to_string(),
            district: String::new(),
            state: "Karnataka".to_string(),
            pincode: "570001".to_string(),
            phone: "9876543210".to_string(),
        }
    }

    fn options(columns: usize, rows: usize) -> GridOptions {
        GridOptions::new(Some(columns), Some(rows), Orientation::Portrait, 42).unwrap()
    }

    #[test]
    fn test_header_text() {
        assert_eq!(
            header_text("active", None, Some("Gift")),
            "Status: Active | Category: ALL | Type: Gift"
        );
        assert_eq!(
            header_text("INACTIVE", Some("Library"), None),
            "Status: Inactive | Category: Library | Type: ALL"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("this is too long", 10), "this is...");
    }

    #[test]
    fn test_box_lines_skip_blanks_and_join_pairs() {
        let lines = box_lines(&row("Asha Rao"), 42);
        assert_eq!(
            lines,
            vec![
                "Asha Rao",
                "12 Temple Road",
                "Mysuru",
                "Karnataka, 570001",
                "9876543210"
            ]
        );
    }

    #[test]
    fn test_grid_pages() {
        let rows: Vec<ReportRow> = (0..23).map(|i| row(&format!("S{}", i))).collect();
        let layout = layout_report(&rows, "Status: Active | Category: ALL | Type: ALL", &options(2, 5));

        assert_eq!(layout.pages.len(), 3);
        assert_eq!(layout.pages[0].boxes.len(), 10);
        assert_eq!(layout.pages[2].boxes.len(), 3);
        assert!(layout.pages.iter().all(|p| p.header.starts_with("Status: Active")));

        let first = &layout.pages[0].boxes;
        assert_eq!(first[0].x, MARGIN_MM);
        assert_eq!(first[0].y, MARGIN_MM + HEADER_MM);
        // Second record sits to the right of the first, third starts the next row.
        assert_eq!(first[1].y, first[0].y);
        assert!(first[1].x > first[0].x);
        assert_eq!(first[2].x, first[0].x);
        assert!(first[2].y > first[0].y);
    }

    #[test]
    fn test_landscape_swaps_page_size() {
        let layout = layout_report(
            &[row("A")],
            "h",
            &GridOptions::new(None, None, Orientation::Landscape, 42).unwrap(),
        );
        assert_eq!((layout.width, layout.height), (A4_LONG_MM, A4_SHORT_MM));
    }

    #[test]
    fn test_dense_grid_caps_lines_to_box_height() {
        let layout = layout_report(&[row("A")], "h", &options(1, 10));
        // (297 - 20 - 15) / 10 = 26.2mm fits three 7mm lines.
        assert_eq!(layout.pages[0].boxes[0].lines.len(), 3);
    }

    #[test]
    fn test_empty_report_has_header_page() {
        let layout = layout_report(&[], "h", &options(2, 5));
        assert_eq!(layout.pages.len(), 1);
        assert!(layout.pages[0].boxes.is_empty());
    }

    #[test]
    fn test_grid_bounds() {
        assert!(GridOptions::new(Some(0), None, Orientation::Portrait, 42).is_err());
        assert!(GridOptions::new(None, Some(MAX_GRID + 1), Orientation::Portrait, 42).is_err());
        assert!(Orientation::parse(Some("sideways")).is_err());
        assert_eq!(Orientation::parse(Some("Landscape")).unwrap(), Orientation::Landscape);
    }

    #[test]
    fn test_printpdf_renderer_emits_pdf() {
        let rows: Vec<ReportRow> = (0..12).map(|i| row(&format!("S{}", i))).collect();
        let layout = layout_report(&rows, "Status: Active | Category: ALL | Type: ALL", &options(2, 5));

        let bytes = PrintPdfRenderer.render(&layout).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
