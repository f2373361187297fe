//! Rewriting an xlsx package with a regenerated active worksheet
//!
//! Every part except the active worksheet, the workbook, its relationships
//! and the content types is copied byte for byte, so shared styles, themes
//! and drawings stay valid. The calculation chain is dropped and the
//! workbook is flagged for a full recalculation on load.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{Seek, Write};
use zip::{ZipWriter, write::FileOptions};

use crate::address::ColumnId;
use crate::error::XlsxResult;
use crate::reader::parser_utils::attribute;
use crate::reader::xlsx_parser::{CONTENT_TYPES_PART, WORKBOOK_PART, WORKBOOK_RELS_PART};
use crate::reader::{Cell, CellValue, Package, Sheet};

pub const CALC_CHAIN_PART: &str = "xl/calcChain.xml";

/// Children of `<worksheet>` in schema order
const WORKSHEET_ORDER: &[&str] = &[
    "sheetPr",
    "dimension",
    "sheetViews",
    "sheetFormatPr",
    "cols",
    "sheetData",
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    "mergeCells",
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

/// Children of `<workbook>` that must follow `<calcPr>`
const AFTER_CALC_PR: &[&str] = &[
    "oleSize",
    "customWorkbookViews",
    "pivotCaches",
    "smartTagPr",
    "smartTagTypes",
    "webPublishing",
    "fileRecoveryPr",
    "webPublishObjects",
    "extLst",
];

/// Top-left cell of the scrollable area; rows above and columns to the
/// left stay visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrozenPane {
    pub col: ColumnId,
    pub row: u32,
}

/// Write a copy of `package` to `out`, with the worksheet at `sheet_path`
/// regenerated from `sheet`
pub fn write_package<W: Write + Seek>(
    package: &Package,
    sheet_path: &str,
    sheet: &Sheet,
    pane: Option<FrozenPane>,
    out: W,
) -> XlsxResult<W> {
    let mut zip_writer = ZipWriter::new(out);

    for (name, data) in package.parts() {
        if name == CALC_CHAIN_PART {
            continue;
        }

        let content = if name == sheet_path {
            rewrite_worksheet(data, sheet, pane)?
        } else if name == WORKBOOK_PART {
            set_full_calc_on_load(data)?
        } else if name == CONTENT_TYPES_PART {
            remove_calc_chain_content_type(data)?
        } else if name == WORKBOOK_RELS_PART {
            remove_calc_chain_relationship(data)?
        } else {
            data.to_vec()
        };

        zip_writer.start_file(name, FileOptions::<()>::default())?;
        zip_writer.write_all(&content)?;
    }

    Ok(zip_writer.finish()?)
}

fn element_position(local_name: &[u8]) -> usize {
    WORKSHEET_ORDER
        .iter()
        .position(|n| n.as_bytes() == local_name)
        .unwrap_or(WORKSHEET_ORDER.len())
}

/// Parts of the worksheet generated from the sheet model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Generated {
    Dimension,
    SheetViews,
    SheetData,
    MergeCells,
}

impl Generated {
    const ALL: [Generated; 4] = [
        Generated::Dimension,
        Generated::SheetViews,
        Generated::SheetData,
        Generated::MergeCells,
    ];

    fn name(self) -> &'static str {
        match self {
            Generated::Dimension => "dimension",
            Generated::SheetViews => "sheetViews",
            Generated::SheetData => "sheetData",
            Generated::MergeCells => "mergeCells",
        }
    }

    fn position(self) -> usize {
        element_position(self.name().as_bytes())
    }

    fn from_local_name(name: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name().as_bytes() == name)
    }
}

struct WorksheetRewriter<'a> {
    writer: Writer<Vec<u8>>,
    sheet: &'a Sheet,
    pane: Option<FrozenPane>,
    written: Vec<Generated>,
}

/// Replace dimension, pane, cell data and merged ranges of a worksheet part,
/// keeping every other element as it is
pub fn rewrite_worksheet(
    original: &[u8],
    sheet: &Sheet,
    pane: Option<FrozenPane>,
) -> XlsxResult<Vec<u8>> {
    let mut rw = WorksheetRewriter {
        writer: Writer::new(Vec::new()),
        sheet,
        pane,
        written: Vec::new(),
    };

    let mut reader = Reader::from_reader(original);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    // Depth of the original subtree being dropped
    let mut skip_until: Option<usize> = None;
    let mut in_sheet_view = false;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Eof => break,
            Event::Start(_) if skip_until.is_some() => depth += 1,
            Event::Start(e) => {
                depth += 1;
                let local = e.local_name();
                match depth {
                    2 => {
                        rw.emit_generated_before(element_position(local.as_ref()))?;
                        match Generated::from_local_name(local.as_ref()) {
                            Some(Generated::SheetViews) => {
                                rw.written.push(Generated::SheetViews);
                                rw.writer.write_event(Event::Start(e.borrow()))?;
                            }
                            Some(generated) => {
                                rw.emit(generated)?;
                                skip_until = Some(depth);
                            }
                            None => rw.writer.write_event(Event::Start(e.borrow()))?,
                        }
                    }
                    3 if local.as_ref() == b"sheetView" => {
                        rw.writer.write_event(Event::Start(e.borrow()))?;
                        rw.write_pane()?;
                        in_sheet_view = true;
                    }
                    4 if in_sheet_view && is_pane_child(local.as_ref()) => {
                        skip_until = Some(depth);
                    }
                    _ => rw.writer.write_event(Event::Start(e.borrow()))?,
                }
            }
            Event::Empty(_) if skip_until.is_some() => {}
            Event::Empty(e) => {
                let local = e.local_name();
                match depth + 1 {
                    2 => {
                        rw.emit_generated_before(element_position(local.as_ref()))?;
                        match Generated::from_local_name(local.as_ref()) {
                            Some(generated) => rw.emit(generated)?,
                            None => rw.writer.write_event(Event::Empty(e.borrow()))?,
                        }
                    }
                    3 if local.as_ref() == b"sheetView" => {
                        rw.writer.write_event(Event::Start(e.borrow()))?;
                        rw.write_pane()?;
                        rw.writer.write_event(Event::End(e.to_end()))?;
                    }
                    4 if in_sheet_view && is_pane_child(local.as_ref()) => {}
                    _ => rw.writer.write_event(Event::Empty(e.borrow()))?,
                }
            }
            Event::End(e) => {
                let level = depth;
                depth = depth.saturating_sub(1);
                if let Some(skip) = skip_until {
                    if level == skip {
                        skip_until = None;
                    }
                } else {
                    if level == 3 && e.local_name().as_ref() == b"sheetView" {
                        in_sheet_view = false;
                    }
                    if level == 1 {
                        rw.emit_generated_before(usize::MAX)?;
                    }
                    rw.writer.write_event(Event::End(e))?;
                }
            }
            other => {
                if skip_until.is_none() {
                    rw.writer.write_event(other)?;
                }
            }
        }
        buf.clear();
    }

    Ok(rw.writer.into_inner())
}

fn is_pane_child(local_name: &[u8]) -> bool {
    local_name == b"pane" || local_name == b"selection"
}

impl WorksheetRewriter<'_> {
    /// Emit generated parts that belong before an element at `position`
    fn emit_generated_before(&mut self, position: usize) -> XlsxResult<()> {
        for generated in Generated::ALL {
            if generated.position() < position && !self.written.contains(&generated) {
                self.emit(generated)?;
            }
        }
        Ok(())
    }

    fn emit(&mut self, generated: Generated) -> XlsxResult<()> {
        if self.written.contains(&generated) {
            return Ok(());
        }
        self.written.push(generated);
        match generated {
            Generated::Dimension => self.write_dimension(),
            Generated::SheetViews => {
                self.start("sheetViews", &[])?;
                self.start("sheetView", &[("workbookViewId", "0")])?;
                self.write_pane()?;
                self.end("sheetView")?;
                self.end("sheetViews")
            }
            Generated::SheetData => self.write_sheet_data(),
            Generated::MergeCells => self.write_merge_cells(),
        }
    }

    fn write_dimension(&mut self) -> XlsxResult<()> {
        let range = match self.sheet.extent() {
            Some((row, col)) if (row, col.index()) != (1, 1) => format!("A1:{}", col.at(row)),
            _ => "A1".to_string(),
        };
        self.empty("dimension", &[("ref", range.as_str())])
    }

    fn write_pane(&mut self) -> XlsxResult<()> {
        let Some(pane) = self.pane else {
            return Ok(());
        };
        let x_split = pane.col.index() - 1;
        let y_split = pane.row.saturating_sub(1);
        let active = match (x_split > 0, y_split > 0) {
            (true, true) => "bottomRight",
            (true, false) => "topRight",
            (false, true) => "bottomLeft",
            (false, false) => return Ok(()),
        };
        let top_left = pane.col.at(pane.row.max(1));
        let x_split = x_split.to_string();
        let y_split = y_split.to_string();

        let mut attrs: Vec<(&str, &str)> = Vec::new();
        if x_split != "0" {
            attrs.push(("xSplit", x_split.as_str()));
        }
        if y_split != "0" {
            attrs.push(("ySplit", y_split.as_str()));
        }
        attrs.extend([
            ("topLeftCell", top_left.as_str()),
            ("activePane", active),
            ("state", "frozen"),
        ]);
        self.empty("pane", &attrs)?;
        self.empty(
            "selection",
            &[
                ("pane", active),
                ("activeCell", top_left.as_str()),
                ("sqref", top_left.as_str()),
            ],
        )
    }

    fn write_sheet_data(&mut self) -> XlsxResult<()> {
        let mut rows: Vec<u32> = self.sheet.cells.keys().map(|(r, _)| *r).collect();
        rows.extend(self.sheet.row_heights.keys().copied());
        rows.sort_unstable();
        rows.dedup();

        if rows.is_empty() {
            return self.empty("sheetData", &[]);
        }

        self.start("sheetData", &[])?;
        let sheet = self.sheet;
        for row in rows {
            let r = row.to_string();
            let height = sheet.row_heights.get(&row).map(|h| h.to_string());
            let mut attrs: Vec<(&str, &str)> = vec![("r", r.as_str())];
            if let Some(height) = height.as_deref() {
                attrs.extend([("ht", height), ("customHeight", "1")]);
            }

            let cells: Vec<_> = sheet
                .cells
                .range((row, ColumnId::FIRST)..)
                .take_while(|((r, _), _)| *r == row)
                .filter(|(_, cell)| cell_is_written(cell))
                .collect();
            if cells.is_empty() {
                self.empty("row", &attrs)?;
                continue;
            }

            self.start("row", &attrs)?;
            for ((_, col), cell) in cells {
                self.write_cell(&col.at(row), cell)?;
            }
            self.end("row")?;
        }
        self.end("sheetData")
    }

    fn write_cell(&mut self, reference: &str, cell: &Cell) -> XlsxResult<()> {
        let style = cell.style.map(|s| s.to_string());
        let mut attrs: Vec<(&str, &str)> = vec![("r", reference)];
        if let Some(style) = style.as_deref() {
            attrs.push(("s", style));
        }

        match &cell.value {
            CellValue::Empty => self.empty("c", &attrs),
            CellValue::Text(s) if s.is_empty() => self.empty("c", &attrs),
            CellValue::Text(s) => {
                attrs.push(("t", "inlineStr"));
                self.start("c", &attrs)?;
                self.start("is", &[])?;
                if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
                    self.start("t", &[("xml:space", "preserve")])?;
                } else {
                    self.start("t", &[])?;
                }
                self.text(s)?;
                self.end("t")?;
                self.end("is")?;
                self.end("c")
            }
            CellValue::Number(n) if n.is_finite() => {
                self.start("c", &attrs)?;
                self.value(&n.to_string())?;
                self.end("c")
            }
            CellValue::Number(_) => {
                attrs.push(("t", "e"));
                self.start("c", &attrs)?;
                self.value("#NUM!")?;
                self.end("c")
            }
            CellValue::Boolean(b) => {
                attrs.push(("t", "b"));
                self.start("c", &attrs)?;
                self.value(if *b { "1" } else { "0" })?;
                self.end("c")
            }
            CellValue::Formula(f) => {
                self.start("c", &attrs)?;
                self.start("f", &[])?;
                self.text(f.strip_prefix('=').unwrap_or(f))?;
                self.end("f")?;
                self.end("c")
            }
            CellValue::Error(e) => {
                attrs.push(("t", "e"));
                self.start("c", &attrs)?;
                self.value(e)?;
                self.end("c")
            }
        }
    }

    fn write_merge_cells(&mut self) -> XlsxResult<()> {
        if self.sheet.merged_cells.is_empty() {
            return Ok(());
        }
        let count = self.sheet.merged_cells.len().to_string();
        self.start("mergeCells", &[("count", count.as_str())])?;
        let sheet = self.sheet;
        for range in &sheet.merged_cells {
            let reference = range.to_ref();
            self.empty("mergeCell", &[("ref", reference.as_str())])?;
        }
        self.end("mergeCells")
    }

    fn value(&mut self, v: &str) -> XlsxResult<()> {
        self.start("v", &[])?;
        self.text(v)?;
        self.end("v")
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> XlsxResult<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(elem))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> XlsxResult<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> XlsxResult<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text(&mut self, s: &str) -> XlsxResult<()> {
        self.writer.write_event(Event::Text(BytesText::new(s)))?;
        Ok(())
    }
}

fn cell_is_written(cell: &Cell) -> bool {
    cell.style.is_some() || !matches!(&cell.value, CellValue::Empty)
}

/// Set `fullCalcOnLoad="1"` on `<calcPr>`, adding the element when missing
fn set_full_calc_on_load(xml: &[u8]) -> XlsxResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut done = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                if e.local_name().as_ref() == b"calcPr" {
                    writer.write_event(Event::Start(with_full_calc(&e)?))?;
                    done = true;
                } else {
                    if depth == 2 && !done && follows_calc_pr(&e) {
                        writer.write_event(Event::Empty(full_calc_element()))?;
                        done = true;
                    }
                    writer.write_event(Event::Start(e))?;
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"calcPr" {
                    writer.write_event(Event::Empty(with_full_calc(&e)?))?;
                    done = true;
                } else {
                    if depth == 1 && !done && follows_calc_pr(&e) {
                        writer.write_event(Event::Empty(full_calc_element()))?;
                        done = true;
                    }
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::End(e) => {
                if depth == 1 && !done {
                    writer.write_event(Event::Empty(full_calc_element()))?;
                    done = true;
                }
                depth = depth.saturating_sub(1);
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            e => writer.write_event(e)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn follows_calc_pr(e: &BytesStart<'_>) -> bool {
    AFTER_CALC_PR
        .iter()
        .any(|n| n.as_bytes() == e.local_name().as_ref())
}

fn full_calc_element() -> BytesStart<'static> {
    BytesStart::new("calcPr").with_attributes([("fullCalcOnLoad", "1")])
}

fn with_full_calc(e: &BytesStart<'_>) -> XlsxResult<BytesStart<'static>> {
    let mut elem = e.clone().into_owned();
    elem.clear_attributes();
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() != b"fullCalcOnLoad" {
            elem.push_attribute(attr);
        }
    }
    elem.push_attribute(("fullCalcOnLoad", "1"));
    Ok(elem)
}

fn remove_calc_chain_content_type(xml: &[u8]) -> XlsxResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let calc_chain_part = format!("/{}", CALC_CHAIN_PART);

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) if e.local_name().as_ref() == b"Override" => {
                if attribute(&e, b"PartName")?.as_deref() != Some(calc_chain_part.as_str()) {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::Eof => break,
            e => writer.write_event(e)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn remove_calc_chain_relationship(xml: &[u8]) -> XlsxResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let is_calc_chain = attribute(&e, b"Type")?
                    .is_some_and(|t| t.ends_with("/calcChain"));
                if !is_calc_chain {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::Eof => break,
            e => writer.write_event(e)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MergedRange;

    fn col(s: &str) -> ColumnId {
        s.parse().unwrap()
    }

    fn render(original: &str, sheet: &Sheet, pane: Option<FrozenPane>) -> String {
        String::from_utf8(rewrite_worksheet(original.as_bytes(), sheet, pane).unwrap()).unwrap()
    }

    fn small_sheet() -> Sheet {
        let mut sheet = Sheet::new();
        sheet.set_cell(1, col("A"), Cell::new(CellValue::text("Titel"), Some(2)));
        sheet.set_cell(2, col("A"), Cell::new(CellValue::text(" Name "), None));
        sheet.set_cell(2, col("B"), Cell::new(CellValue::Number(3.0), Some(1)));
        sheet.set_cell(2, col("C"), Cell::new(CellValue::formula("=B2*2"), None));
        sheet.set_cell(2, col("D"), Cell::new(CellValue::Boolean(false), None));
        sheet.set_cell(2, col("E"), Cell::new(CellValue::Empty, None));
        sheet.row_heights.insert(1, 30.0);
        sheet.merged_cells.push(MergedRange {
            first_row: 1,
            first_col: col("A"),
            last_row: 1,
            last_col: col("C"),
        });
        sheet
    }

    #[test]
    fn test_rewrite_keeps_other_elements() {
        let original = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetPr><tabColor rgb="FF00FF00"/></sheetPr><dimension ref="A1:B9"/><sheetViews><sheetView tabSelected="1" workbookViewId="0"><selection activeCell="B3" sqref="B3"/></sheetView></sheetViews><cols><col min="1" max="1" width="25" customWidth="1"/></cols><sheetData><row r="9"><c r="B9"><v>1</v></c></row></sheetData><mergeCells count="1"><mergeCell ref="A9:B9"/></mergeCells><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#;
        let pane = FrozenPane {
            col: col("B"),
            row: 2,
        };
        let xml = render(original, &small_sheet(), Some(pane));

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<sheetPr><tabColor rgb="FF00FF00"/></sheetPr><dimension ref="A1:E2"/>"#));
        assert!(xml.contains(r#"<sheetView tabSelected="1" workbookViewId="0"><pane xSplit="1" ySplit="1" topLeftCell="B2" activePane="bottomRight" state="frozen"/><selection pane="bottomRight" activeCell="B2" sqref="B2"/></sheetView>"#));
        assert!(!xml.contains("B3"));
        assert!(xml.contains(r#"<cols><col min="1" max="1" width="25" customWidth="1"/></cols>"#));
        assert!(xml.contains(r#"<row r="1" ht="30" customHeight="1"><c r="A1" s="2" t="inlineStr"><is><t>Titel</t></is></c></row>"#));
        assert!(xml.contains(r#"<c r="A2" t="inlineStr"><is><t xml:space="preserve"> Name </t></is></c>"#));
        assert!(xml.contains(r#"<c r="B2" s="1"><v>3</v></c>"#));
        assert!(xml.contains(r#"<c r="C2"><f>B2*2</f></c>"#));
        assert!(xml.contains(r#"<c r="D2" t="b"><v>0</v></c>"#));
        assert!(!xml.contains(r#"r="E2""#));
        assert!(!xml.contains("B9"));
        assert!(xml.contains(r#"<mergeCells count="1"><mergeCell ref="A1:C1"/></mergeCells><pageMargins"#));
    }

    #[test]
    fn test_rewrite_inserts_missing_elements() {
        let original = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#;
        let pane = FrozenPane {
            col: col("A"),
            row: 5,
        };
        let xml = render(original, &small_sheet(), Some(pane));
        assert!(xml.contains(r#"<dimension ref="A1:E2"/><sheetViews><sheetView workbookViewId="0"><pane ySplit="4" topLeftCell="A5" activePane="bottomLeft" state="frozen"/>"#));
        assert!(xml.contains("</sheetData><mergeCells count=\"1\">"));
        assert!(xml.ends_with("</worksheet>"));
    }

    #[test]
    fn test_no_pane_at_a1() {
        let original = r#"<worksheet><sheetViews><sheetView workbookViewId="0"/></sheetViews><sheetData/></worksheet>"#;
        let pane = FrozenPane {
            col: col("A"),
            row: 1,
        };
        let xml = render(original, &Sheet::new(), Some(pane));
        assert!(xml.contains(r#"<sheetView workbookViewId="0"></sheetView>"#));
        assert!(xml.contains(r#"<dimension ref="A1"/>"#));
        assert!(xml.contains("<sheetData/>"));
    }

    #[test]
    fn test_full_calc_on_load() {
        let xml = br#"<workbook><sheets><sheet name="S" sheetId="1" r:id="rId1"/></sheets><calcPr calcId="191029" fullCalcOnLoad="0"/></workbook>"#;
        let out = String::from_utf8(set_full_calc_on_load(xml).unwrap()).unwrap();
        assert!(out.contains(r#"<calcPr calcId="191029" fullCalcOnLoad="1"/>"#));

        let xml = br#"<workbook><sheets><sheet name="S" sheetId="1" r:id="rId1"/></sheets><extLst/></workbook>"#;
        let out = String::from_utf8(set_full_calc_on_load(xml).unwrap()).unwrap();
        assert!(out.contains(r#"</sheets><calcPr fullCalcOnLoad="1"/><extLst/></workbook>"#));

        let xml = br#"<workbook><sheets/></workbook>"#;
        let out = String::from_utf8(set_full_calc_on_load(xml).unwrap()).unwrap();
        assert_eq!(out, r#"<workbook><sheets/><calcPr fullCalcOnLoad="1"/></workbook>"#);
    }

    #[test]
    fn test_remove_calc_chain_references() {
        let types = br#"<Types><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/calcChain.xml" ContentType="x"/><Override PartName="/xl/workbook.xml" ContentType="y"/></Types>"#;
        let out = String::from_utf8(remove_calc_chain_content_type(types).unwrap()).unwrap();
        assert!(!out.contains("calcChain"));
        assert!(out.contains("/xl/workbook.xml"));

        let rels = br#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain" Target="calcChain.xml"/></Relationships>"#;
        let out = String::from_utf8(remove_calc_chain_relationship(rels).unwrap()).unwrap();
        assert!(!out.contains("calcChain"));
        assert!(out.contains("worksheets/sheet1.xml"));
    }
}
