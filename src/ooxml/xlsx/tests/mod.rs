//! End-to-end tests that close workbooks and read the archives back.


use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::ooxml::xlsx::{ChartOptions, ChartSeries, ChartType, Workbook};

/// An archive read back into entry name → text, plus the entry order.
pub(super) struct Unpacked {
    pub(super) order: Vec<String>,
    pub(super) entries: BTreeMap<String, String>,
}

impl Unpacked {
    pub(super) fn read(bytes: &[u8]) -> Self {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut order = Vec::new();
        let mut entries = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            let mut text = String::new();
            file.read_to_string(&mut text).unwrap();
            order.push(file.name().to_string());
            entries.insert(file.name().to_string(), text);
        }
        Self { order, entries }
    }

    pub(super) fn part(&self, name: &str) -> &str {
        self.entries
            .get(name)
            .unwrap_or_else(|| panic!("missing part {name}, have {:?}", self.order))
    }
}

pub(super) fn close_in_memory(wb: &mut Workbook) -> Vec<u8> {
    wb.close_to_writer(Cursor::new(Vec::new())).unwrap().into_inner()
}

pub(super) fn assert_well_formed(name: &str, xml: &str) {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => panic!("{name} is not well-formed: {err}"),
        }
    }
}

/// A data worksheet followed by a chartsheet plotting it.
pub(super) fn data_and_chartsheet(wb: &mut Workbook) {
    let data = wb.add_worksheet(Some("Data")).unwrap();
    for (row, (label, value)) in [("Jan", 3.0), ("Feb", 5.5), ("Mar", 4.0)].into_iter().enumerate() {
        wb.write_cell(data, row as u32, 0, label, None).unwrap();
        wb.write_cell(data, row as u32, 1, value, None).unwrap();
    }
    let tab = wb.add_chartsheet(Some("Chart1")).unwrap();

    let sheet = wb.sheet(data).unwrap();
    let series = ChartSeries::new(sheet.range_ref(0, 1, 2, 1))
        .with_categories(sheet.range_ref(0, 0, 2, 0))
        .with_name("Totals");
    let chart = wb.add_chart(ChartType::Column).unwrap();
    wb.chart_mut(chart).unwrap().add_series(series);
    wb.attach_chart(tab, chart, ChartOptions::default()).unwrap();
}
