#![allow(dead_code)]

use rostersync::{RemoteRecord, Settings};
use serde_json::json;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Settings matching the layout of [`member_list`]
pub const CONFIG: &str = r#"[db]
url = "https://db.example.org/"
default_mail = "tester@example.com"

[file]
group_id = 42
header_lines = 4
footer_lines = 1
freeze_column = "D"

[rows]
A = "last_name"
B = "first_name"
C = "id"
D = ""
E = ""
F = ""
G = "=SUM(D{row}:F{row})"
"#;

pub fn settings() -> Settings {
    Settings::from_toml_str(CONFIG).unwrap()
}

pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="14"/><name val="Calibri"/></font></fonts>
<fills count="1"><fill><patternFill patternType="none"/></fill></fills>
<borders count="2"><border/><border><bottom style="thin"/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/><xf numFmtId="0" fontId="0" fillId="0" borderId="1" xfId="0" applyBorder="1"/></cellXfs>
</styleSheet>"#;

const SHARED_STRINGS: &[&str] = &[
    "Mitgliederliste",
    "Name",
    "Vorname",
    "Id",
    "Posten 1",
    "Posten 2",
    "Posten 3",
    "Total",
    "Anders",
    "Jemand",
    "Irgend",
    "Noch",
];

fn shared(s: &str) -> usize {
    SHARED_STRINGS.iter().position(|x| *x == s).unwrap()
}

fn text_cell(reference: &str, s: &str, style: Option<u32>) -> String {
    let style = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();
    format!(r#"<c r="{}"{} t="s"><v>{}</v></c>"#, reference, style, shared(s))
}

fn number_cell(reference: &str, n: f64, style: u32) -> String {
    format!(r#"<c r="{}" s="{}"><v>{}</v></c>"#, reference, style, n)
}

fn body_row(row: u32, last: &str, first: &str, id: u32, points: [u32; 3]) -> String {
    let mut xml = format!(r#"<row r="{}">"#, row);
    xml.push_str(&text_cell(&format!("A{}", row), last, Some(2)));
    xml.push_str(&text_cell(&format!("B{}", row), first, Some(2)));
    xml.push_str(&number_cell(&format!("C{}", row), f64::from(id), 2));
    for (col, p) in ["D", "E", "F"].iter().zip(points) {
        xml.push_str(&number_cell(&format!("{}{}", col, row), f64::from(p), 2));
    }
    xml.push_str(&format!(
        r#"<c r="G{row}" s="2"><f>SUM(D{row}:F{row})</f><v>{}</v></c>"#,
        points.iter().sum::<u32>(),
    ));
    xml.push_str("</row>");
    xml
}

/// Worksheet with a title, a label row, three persons and a total row
pub fn sheet_xml() -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetPr><pageSetUpPr fitToPage="1"/></sheetPr><dimension ref="A1:G8"/><sheetViews><sheetView tabSelected="1" workbookViewId="0"><selection activeCell="B2" sqref="B2"/></sheetView></sheetViews><sheetFormatPr defaultRowHeight="15"/><cols><col min="1" max="2" width="20.5" customWidth="1"/></cols><sheetData>"#,
    );
    xml.push_str(r#"<row r="1" ht="24" customHeight="1">"#);
    xml.push_str(&text_cell("A1", "Mitgliederliste", Some(1)));
    xml.push_str("</row>");
    xml.push_str(r#"<row r="4">"#);
    for (col, label) in ["A", "B", "C", "D", "E", "F", "G"].iter().zip([
        "Name", "Vorname", "Id", "Posten 1", "Posten 2", "Posten 3", "Total",
    ]) {
        xml.push_str(&text_cell(&format!("{}4", col), label, None));
    }
    xml.push_str("</row>");
    xml.push_str(&body_row(5, "Jemand", "Noch", 2, [5, 25, 20]));
    xml.push_str(&body_row(6, "Anders", "Jemand", 3, [14, 12, 16]));
    xml.push_str(&body_row(7, "Jemand", "Irgend", 1, [10, 20, 30]));
    xml.push_str(r#"<row r="8" ht="18" customHeight="1">"#);
    xml.push_str(&text_cell("A8", "Total", None));
    xml.push_str(r#"<c r="D8"><f>SUM(D5:D7)</f><v>29</v></c>"#);
    xml.push_str("</row>");
    xml.push_str(
        r#"</sheetData><mergeCells count="2"><mergeCell ref="A1:C1"/><mergeCell ref="A8:C8"/></mergeCells><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/><pageSetup paperSize="9" orientation="landscape"/></worksheet>"#,
    );
    xml
}

fn shared_strings_xml() -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        SHARED_STRINGS.len()
    );
    for s in SHARED_STRINGS {
        xml.push_str(&format!("<si><t>{}</t></si>", s));
    }
    xml.push_str("</sst>");
    xml
}

/// Write the member list package to `out`
pub fn write_member_list<W: Write + Seek>(out: W) -> anyhow::Result<W> {
    let mut zip = ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/><Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/></Types>"#.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.as_bytes())?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><bookViews><workbookView activeTab="0"/></bookViews><sheets><sheet name="Mitglieder" sheetId="1" r:id="rId1"/></sheets><calcPr calcId="191029"/></workbook>"#.as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/><Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain" Target="calcChain.xml"/></Relationships>"#.as_bytes())?;

    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(STYLES_XML.as_bytes())?;

    zip.start_file("xl/sharedStrings.xml", options)?;
    zip.write_all(shared_strings_xml().as_bytes())?;

    zip.start_file("xl/worksheets/sheet1.xml", options)?;
    zip.write_all(sheet_xml().as_bytes())?;

    zip.start_file("xl/calcChain.xml", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<calcChain xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><c r="G5" i="1"/><c r="G6"/><c r="G7"/><c r="D8"/></calcChain>"#.as_bytes())?;

    Ok(zip.finish()?)
}

pub fn member_list_bytes() -> Vec<u8> {
    write_member_list(Cursor::new(Vec::new()))
        .unwrap()
        .into_inner()
}

pub fn create_member_list(path: &Path) -> anyhow::Result<()> {
    write_member_list(std::fs::File::create(path)?)?;
    Ok(())
}

/// Members of group 42: two known persons and a new one
pub fn group_members() -> Vec<RemoteRecord> {
    serde_json::from_value(json!([
        {"id": 1, "last_name": "Jemand", "first_name": "Irgendwer"},
        {"id": 3, "last_name": "Anders", "first_name": "Jemand"},
        {"id": 4, "last_name": "Neue", "first_name": "Eine"},
    ]))
    .unwrap()
}
