//! XML parsing of the XLSX parts needed to read the active worksheet

use crate::address::{ColumnId, parse_cell_range, parse_cell_ref};
use crate::error::{XlsxError, XlsxResult};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

use super::parser_utils::{attribute, attributes, is_true, parse_value, read_text_node, skip_element};
use super::{Cell, CellValue, MergedRange, Sheet};

pub const WORKBOOK_PART: &str = "xl/workbook.xml";
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const MAX_PART_PREALLOC: usize = 1 << 20;

/// All parts of an xlsx package, held in memory in archive order
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// Read every part of a zip archive
    pub fn from_reader<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            // The declared size is untrusted; the capacity is a hint only
            let declared = usize::try_from(file.size()).unwrap_or(0);
            let mut data = Vec::with_capacity(declared.min(MAX_PART_PREALLOC));
            file.read_to_end(&mut data)?;
            parts.push((file.name().to_string(), data));
        }
        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// A part that must exist
    pub fn required_part(&self, name: &str) -> XlsxResult<&[u8]> {
        self.part(name)
            .ok_or_else(|| XlsxError::InvalidFormat(format!("missing part {}", name)))
    }

    pub fn parts(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.parts.iter().map(|(n, d)| (n.as_str(), d.as_slice()))
    }
}

/// A `<sheet>` entry of the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
struct SheetEntry {
    name: String,
    rid: String,
}

/// Resolve the active sheet (the `activeTab` of the first workbook view,
/// defaulting to the first sheet) to its part name in the archive
pub fn get_xlsx_sheet_path(package: &Package) -> XlsxResult<String> {
    // 1. Sheets and the active tab from xl/workbook.xml
    let mut sheets = Vec::new();
    let mut active_tab: Option<usize> = None;
    {
        let mut reader = Reader::from_reader(package.required_part(WORKBOOK_PART)?);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                    b"workbookView" if active_tab.is_none() => {
                        active_tab = match attribute(&e, b"activeTab")? {
                            Some(tab) => Some(parse_value("activeTab", &tab)?),
                            None => Some(0),
                        };
                    }
                    b"sheet" => {
                        let name = attribute(&e, b"name")?.unwrap_or_default();
                        let rid = attribute(&e, b"r:id")?.unwrap_or_default();
                        sheets.push(SheetEntry { name, rid });
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
    }

    let active_tab = active_tab.unwrap_or(0);
    let entry = sheets.get(active_tab).ok_or_else(|| {
        XlsxError::InvalidFormat(format!(
            "active sheet {} not found in workbook ({} sheets)",
            active_tab,
            sheets.len()
        ))
    })?;

    // 2. Resolve rId in xl/_rels/workbook.xml.rels
    let mut target = String::new();
    {
        let mut reader = Reader::from_reader(package.required_part(WORKBOOK_RELS_PART)?);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => {
                    if e.name().as_ref() == b"Relationship"
                        && attribute(&e, b"Id")?.as_deref() == Some(entry.rid.as_str())
                    {
                        target = attribute(&e, b"Target")?.unwrap_or_default();
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
    }

    if target.is_empty() {
        return Err(XlsxError::InvalidFormat(format!(
            "Relationship '{}' not found for sheet '{}'",
            entry.rid, entry.name
        )));
    }

    // Targets are relative to xl/ unless absolute within the package
    match target.strip_prefix('/') {
        Some(absolute) => Ok(absolute.to_string()),
        None => Ok(format!("xl/{}", target)),
    }
}

/// Shared string table; empty when the package has none
pub fn extract_shared_strings(package: &Package) -> XlsxResult<Vec<String>> {
    let mut strings = Vec::new();
    let Some(ss_xml) = package.part(SHARED_STRINGS_PART) else {
        return Ok(strings);
    };

    let mut reader = Reader::from_reader(ss_xml);
    let mut buf = Vec::new();
    let mut current_string = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"t" => current_string.push_str(&read_text_node(&mut reader)?),
                // Phonetic runs are not part of the value
                b"rPh" => skip_element(&mut reader)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"si" => {
                strings.push(std::mem::take(&mut current_string));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Base of a shared formula group
#[derive(Debug, Clone)]
struct SharedFormula {
    formula: String,
    row: u32,
    col: ColumnId,
    range: Option<((u32, ColumnId), (u32, ColumnId))>,
}

impl SharedFormula {
    fn covers(&self, row: u32, col: ColumnId) -> bool {
        match self.range {
            Some(((min_r, min_c), (max_r, max_c))) => {
                row >= min_r && row <= max_r && col >= min_c && col <= max_c
            }
            None => false,
        }
    }
}

/// Parse a worksheet part into a [`Sheet`]
pub fn parse_sheet_xml(xml: &[u8], shared_strings: &[String]) -> XlsxResult<Sheet> {
    let mut sheet = Sheet::new();
    let mut shared_formulas: HashMap<u32, Vec<SharedFormula>> = HashMap::new();

    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current_row = 0u32;
    let mut next_col = 1u32;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let has_children = matches!(event, Event::Start(_));
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                b"row" => {
                    current_row = match attribute(e, b"r")? {
                        Some(r) => parse_value("row", &r)?,
                        None => current_row + 1,
                    };
                    if let Some(ht) = attribute(e, b"ht")? {
                        sheet
                            .row_heights
                            .insert(current_row, parse_value("row height", &ht)?);
                    }
                    next_col = 1;
                }
                b"c" => {
                    let mut r_attr = None;
                    let mut style = None;
                    let mut t_attr = String::new();
                    for (key, value) in attributes(e)? {
                        match key.as_str() {
                            "r" => r_attr = Some(value),
                            "s" => style = Some(parse_value::<u32>("style", &value)?),
                            "t" => t_attr = value,
                            _ => {}
                        }
                    }

                    let (row, col) = match r_attr {
                        Some(r) => parse_cell_ref(&r).ok_or_else(|| {
                            XlsxError::InvalidFormat(format!("invalid cell reference '{}'", r))
                        })?,
                        None => {
                            let col = ColumnId::new(next_col).ok_or_else(|| {
                                XlsxError::InvalidFormat(format!(
                                    "too many cells in row {}",
                                    current_row
                                ))
                            })?;
                            (current_row, col)
                        }
                    };
                    next_col = col.index() + 1;

                    let contents = if has_children {
                        parse_cell_contents(&mut reader, &t_attr, shared_strings)?
                    } else {
                        CellContents::default()
                    };

                    let mut formula = contents.formula;
                    if let Some(si) = contents.shared_index {
                        if let Some(f) = formula.as_ref() {
                            shared_formulas.entry(si).or_default().push(SharedFormula {
                                formula: f.clone(),
                                row,
                                col,
                                range: contents.shared_ref.as_deref().and_then(parse_cell_range),
                            });
                        } else if let Some(defs) = shared_formulas.get(&si) {
                            // Prefer the definition whose range covers the cell
                            let base = defs
                                .iter()
                                .find(|def| def.covers(row, col))
                                .or_else(|| defs.last());
                            if let Some(base) = base {
                                let row_shift = i64::from(row) - i64::from(base.row);
                                let col_shift =
                                    i64::from(col.index()) - i64::from(base.col.index());
                                formula = Some(translate_shared_formula(
                                    &base.formula,
                                    row_shift,
                                    col_shift,
                                ));
                            }
                        }
                    }

                    let value = match formula {
                        Some(f) => CellValue::formula(f),
                        None => contents.value,
                    };
                    sheet.set_cell(row, col, Cell::new(value, style));
                }
                b"mergeCell" => {
                    if let Some(((first_row, first_col), (last_row, last_col))) =
                        attribute(e, b"ref")?.as_deref().and_then(parse_cell_range)
                    {
                        sheet.merged_cells.push(MergedRange {
                            first_row,
                            first_col,
                            last_row,
                            last_col,
                        });
                    }
                }
                _ => {}
            },
            Event::End(ref e) if e.name().as_ref() == b"worksheet" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheet)
}

/// Move the relative references of a formula by the given offsets.
///
/// String literals and function names (`LOG10(`) are left alone.
fn translate_shared_formula(formula: &str, row_shift: i64, col_shift: i64) -> String {
    thread_local! {
        static RE: regex::Regex = regex::Regex::new(r"(?P<sheet>(?:'[^']+'|[A-Za-z0-9_\.\-]+)!)?(?P<col_abs>\$?)(?P<col>[A-Z]+)(?P<row_abs>\$?)(?P<row>[0-9]+)(?P<call>\()?").unwrap();
    }
    RE.with(|re| {
        // Odd segments are inside "..." literals; "" escapes split into empty segments
        formula
            .split('"')
            .enumerate()
            .map(|(i, segment)| {
                if i % 2 == 1 {
                    segment.to_string()
                } else {
                    shift_references(re, segment, row_shift, col_shift)
                }
            })
            .collect::<Vec<_>>()
            .join("\"")
    })
}

fn shift_references(re: &regex::Regex, text: &str, row_shift: i64, col_shift: i64) -> String {
    re.replace_all(text, |caps: &regex::Captures| {
        let original = caps[0].to_string();
        if caps.name("call").is_some() {
            return original;
        }
        let sheet = caps.name("sheet").map(|m| m.as_str()).unwrap_or("");
        let col_abs = !caps["col_abs"].is_empty();
        let row_abs = !caps["row_abs"].is_empty();

        let (Ok(col), Ok(row)) = (caps["col"].parse::<ColumnId>(), caps["row"].parse::<u32>())
        else {
            return original;
        };

        let new_col = if col_abs {
            Some(col)
        } else {
            u32::try_from(i64::from(col.index()) + col_shift)
                .ok()
                .and_then(ColumnId::new)
        };
        let new_row = if row_abs {
            Some(row)
        } else {
            u32::try_from(i64::from(row) + row_shift)
                .ok()
                .filter(|r| *r > 0)
        };
        let (Some(new_col), Some(new_row)) = (new_col, new_row) else {
            return original;
        };

        let mut result = sheet.to_string();
        if col_abs {
            result.push('$');
        }
        result.push_str(&new_col.letters());
        if row_abs {
            result.push('$');
        }
        result.push_str(&new_row.to_string());
        result
    })
    .into_owned()
}

#[derive(Debug, Default)]
struct CellContents {
    value: CellValue,
    formula: Option<String>,
    shared_index: Option<u32>,
    shared_ref: Option<String>,
}

fn parse_cell_contents<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    t_attr: &str,
    shared_strings: &[String],
) -> XlsxResult<CellContents> {
    let mut contents = CellContents::default();
    let mut raw_value: Option<String> = None;
    let mut inline_text: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let has_children = matches!(event, Event::Start(_));
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                b"v" => {
                    raw_value = Some(if has_children {
                        read_text_node(reader)?
                    } else {
                        String::new()
                    });
                }
                b"f" => {
                    let mut si = None;
                    let mut is_shared = false;
                    for (key, value) in attributes(e)? {
                        match key.as_str() {
                            "si" => si = Some(parse_value::<u32>("si", &value)?),
                            "t" => is_shared = value == "shared",
                            "ref" => contents.shared_ref = Some(value),
                            _ => {}
                        }
                    }
                    if has_children {
                        let f_text = read_text_node(reader)?;
                        if !f_text.is_empty() {
                            contents.formula = Some(f_text);
                        }
                    }
                    if is_shared {
                        contents.shared_index = si;
                    }
                }
                b"is" if has_children => {
                    // Inline string can have multiple <t> tags
                    let mut is_text = String::new();
                    let mut is_buf = Vec::new();
                    loop {
                        match reader.read_event_into(&mut is_buf)? {
                            Event::Start(ref ee) if ee.name().as_ref() == b"t" => {
                                is_text.push_str(&read_text_node(reader)?);
                            }
                            Event::Start(ref ee) if ee.name().as_ref() == b"rPh" => {
                                skip_element(reader)?;
                            }
                            Event::End(ref ee) if ee.name().as_ref() == b"is" => break,
                            Event::Eof => break,
                            _ => {}
                        }
                        is_buf.clear();
                    }
                    inline_text = Some(is_text);
                }
                _ => {}
            },
            Event::End(ref e) if e.name().as_ref() == b"c" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    contents.value = match (t_attr, raw_value) {
        ("inlineStr", _) => inline_text.map(CellValue::Text).unwrap_or_default(),
        (_, None) => CellValue::Empty,
        ("s", Some(v)) => {
            let idx: usize = parse_value("shared string index", &v)?;
            let s = shared_strings.get(idx).ok_or_else(|| {
                XlsxError::InvalidFormat(format!("shared string {} out of range", idx))
            })?;
            CellValue::Text(s.clone())
        }
        ("b", Some(v)) => CellValue::Boolean(is_true(&v)),
        ("e", Some(v)) => CellValue::Error(v),
        ("str", Some(v)) => CellValue::Text(v),
        (_, Some(v)) if v.is_empty() => CellValue::Empty,
        (_, Some(v)) => match v.parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(v),
        },
    };
    Ok(contents)
}
