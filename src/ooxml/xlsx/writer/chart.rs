//! Chart parts (`xl/charts/chartN.xml`).

use std::io::Write;

use crate::common::xml::XmlWriter;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::xlsx::chart::{Chart, ChartSeries, ChartType};

/// Axis ids shared by every chart; they only need to be unique within one chart part.
const CATEGORY_AXIS_ID: &str = "50010001";
const VALUE_AXIS_ID: &str = "50010002";

/// Write a complete `c:chartSpace` document for `chart`.
pub(super) fn write_chart_xml<W: Write>(chart: &Chart, xml: &mut XmlWriter<W>) -> Result<()> {
    xml.decl()?;
    xml.start(
        "c:chartSpace",
        &[
            ("xmlns:c", namespace::DML_CHART),
            ("xmlns:a", namespace::DML_MAIN),
            ("xmlns:r", namespace::OFC_RELATIONSHIPS),
        ],
    )?;
    xml.empty("c:lang", &[("val", "en-US")])?;

    xml.start("c:chart", &[])?;
    if let Some(title) = chart.title() {
        write_title(title, xml)?;
    }
    xml.empty(
        "c:autoTitleDeleted",
        &[("val", if chart.title().is_some() { "0" } else { "1" })],
    )?;
    write_plot_area(chart, xml)?;

    xml.start("c:legend", &[])?;
    xml.empty("c:legendPos", &[("val", "r")])?;
    xml.empty("c:overlay", &[("val", "0")])?;
    xml.end("c:legend")?;
    xml.empty("c:plotVisOnly", &[("val", "1")])?;
    xml.empty("c:dispBlanksAs", &[("val", "gap")])?;
    xml.end("c:chart")?;

    xml.start("c:printSettings", &[])?;
    xml.empty("c:headerFooter", &[])?;
    xml.empty(
        "c:pageMargins",
        &[
            ("b", "0.75"),
            ("l", "0.7"),
            ("r", "0.7"),
            ("t", "0.75"),
            ("header", "0.3"),
            ("footer", "0.3"),
        ],
    )?;
    xml.empty("c:pageSetup", &[])?;
    xml.end("c:printSettings")?;

    xml.end("c:chartSpace")
}

fn write_title<W: Write>(title: &str, xml: &mut XmlWriter<W>) -> Result<()> {
    xml.start("c:title", &[])?;
    xml.start("c:tx", &[])?;
    xml.start("c:rich", &[])?;
    xml.empty("a:bodyPr", &[])?;
    xml.empty("a:lstStyle", &[])?;
    xml.start("a:p", &[])?;
    xml.start("a:pPr", &[])?;
    xml.empty("a:defRPr", &[])?;
    xml.end("a:pPr")?;
    xml.start("a:r", &[])?;
    xml.empty("a:rPr", &[("lang", "en-US")])?;
    xml.text_element("a:t", &[], title)?;
    xml.end("a:r")?;
    xml.end("a:p")?;
    xml.end("c:rich")?;
    xml.end("c:tx")?;
    xml.empty("c:overlay", &[("val", "0")])?;
    xml.end("c:title")
}

fn write_plot_area<W: Write>(chart: &Chart, xml: &mut XmlWriter<W>) -> Result<()> {
    let chart_type = chart.chart_type();
    let group = chart_type.xml_element_name();

    xml.start("c:plotArea", &[])?;
    xml.empty("c:layout", &[])?;
    xml.start(group, &[])?;

    match chart_type {
        ChartType::Bar => xml.empty("c:barDir", &[("val", "bar")])?,
        ChartType::Column => xml.empty("c:barDir", &[("val", "col")])?,
        ChartType::Scatter => xml.empty("c:scatterStyle", &[("val", "lineMarker")])?,
        _ => {}
    }
    match chart_type {
        ChartType::Bar | ChartType::Column => {
            xml.empty("c:grouping", &[("val", "clustered")])?
        }
        ChartType::Area | ChartType::Line => xml.empty("c:grouping", &[("val", "standard")])?,
        _ => {}
    }
    xml.empty("c:varyColors", &[("val", "0")])?;

    for (idx, series) in chart.series().iter().enumerate() {
        write_series(chart_type, idx, series, xml)?;
    }

    match chart_type {
        ChartType::Bar | ChartType::Column => xml.empty("c:gapWidth", &[("val", "150")])?,
        ChartType::Line => xml.empty("c:marker", &[("val", "1")])?,
        ChartType::Pie => xml.empty("c:firstSliceAng", &[("val", "0")])?,
        ChartType::Doughnut => {
            xml.empty("c:firstSliceAng", &[("val", "0")])?;
            xml.empty("c:holeSize", &[("val", "50")])?;
        }
        _ => {}
    }

    if chart_type.has_axes() {
        xml.empty("c:axId", &[("val", CATEGORY_AXIS_ID)])?;
        xml.empty("c:axId", &[("val", VALUE_AXIS_ID)])?;
    }
    xml.end(group)?;

    if chart_type.has_axes() {
        write_axes(chart_type, xml)?;
    }
    xml.end("c:plotArea")
}

fn write_series<W: Write>(
    chart_type: ChartType,
    idx: usize,
    series: &ChartSeries,
    xml: &mut XmlWriter<W>,
) -> Result<()> {
    let mut buf = itoa::Buffer::new();
    let idx = buf.format(idx);

    xml.start("c:ser", &[])?;
    xml.empty("c:idx", &[("val", idx)])?;
    xml.empty("c:order", &[("val", idx)])?;
    if let Some(name) = series.name() {
        xml.start("c:tx", &[])?;
        xml.text_element("c:v", &[], name)?;
        xml.end("c:tx")?;
    }
    if matches!(chart_type, ChartType::Bar | ChartType::Column) {
        xml.empty("c:invertIfNegative", &[("val", "0")])?;
    }

    if chart_type == ChartType::Scatter {
        if let Some(categories) = series.categories() {
            write_data_ref("c:xVal", "c:numRef", categories, xml)?;
        }
        write_data_ref("c:yVal", "c:numRef", series.values(), xml)?;
        xml.empty("c:smooth", &[("val", "0")])?;
    } else {
        if let Some(categories) = series.categories() {
            write_data_ref("c:cat", "c:strRef", categories, xml)?;
        }
        write_data_ref("c:val", "c:numRef", series.values(), xml)?;
        if chart_type == ChartType::Line {
            xml.empty("c:smooth", &[("val", "0")])?;
        }
    }
    xml.end("c:ser")
}

fn write_data_ref<W: Write>(
    element: &str,
    kind: &str,
    formula: &str,
    xml: &mut XmlWriter<W>,
) -> Result<()> {
    xml.start(element, &[])?;
    xml.start(kind, &[])?;
    xml.text_element("c:f", &[], formula)?;
    xml.end(kind)?;
    xml.end(element)
}

fn write_axes<W: Write>(chart_type: ChartType, xml: &mut XmlWriter<W>) -> Result<()> {
    // Horizontal bars swap the axis positions.
    let (cat_pos, val_pos) = if chart_type == ChartType::Bar {
        ("l", "b")
    } else {
        ("b", "l")
    };

    if chart_type == ChartType::Scatter {
        write_value_axis(CATEGORY_AXIS_ID, VALUE_AXIS_ID, "b", false, "midCat", xml)?;
        write_value_axis(VALUE_AXIS_ID, CATEGORY_AXIS_ID, "l", true, "midCat", xml)?;
        return Ok(());
    }

    xml.start("c:catAx", &[])?;
    xml.empty("c:axId", &[("val", CATEGORY_AXIS_ID)])?;
    write_scaling(xml)?;
    xml.empty("c:delete", &[("val", "0")])?;
    xml.empty("c:axPos", &[("val", cat_pos)])?;
    xml.empty("c:majorTickMark", &[("val", "out")])?;
    xml.empty("c:minorTickMark", &[("val", "none")])?;
    xml.empty("c:tickLblPos", &[("val", "nextTo")])?;
    xml.empty("c:crossAx", &[("val", VALUE_AXIS_ID)])?;
    xml.empty("c:crosses", &[("val", "autoZero")])?;
    xml.empty("c:auto", &[("val", "1")])?;
    xml.empty("c:lblAlgn", &[("val", "ctr")])?;
    xml.empty("c:lblOffset", &[("val", "100")])?;
    xml.end("c:catAx")?;

    write_value_axis(VALUE_AXIS_ID, CATEGORY_AXIS_ID, val_pos, true, "between", xml)
}

fn write_value_axis<W: Write>(
    id: &str,
    cross_id: &str,
    position: &str,
    gridlines: bool,
    cross_between: &str,
    xml: &mut XmlWriter<W>,
) -> Result<()> {
    xml.start("c:valAx", &[])?;
    xml.empty("c:axId", &[("val", id)])?;
    write_scaling(xml)?;
    xml.empty("c:delete", &[("val", "0")])?;
    xml.empty("c:axPos", &[("val", position)])?;
    if gridlines {
        xml.empty("c:majorGridlines", &[])?;
    }
    xml.empty("c:numFmt", &[("formatCode", "General"), ("sourceLinked", "1")])?;
    xml.empty("c:majorTickMark", &[("val", "out")])?;
    xml.empty("c:minorTickMark", &[("val", "none")])?;
    xml.empty("c:tickLblPos", &[("val", "nextTo")])?;
    xml.empty("c:crossAx", &[("val", cross_id)])?;
    xml.empty("c:crosses", &[("val", "autoZero")])?;
    xml.empty("c:crossBetween", &[("val", cross_between)])?;
    xml.end("c:valAx")
}

fn write_scaling<W: Write>(xml: &mut XmlWriter<W>) -> Result<()> {
    xml.start("c:scaling", &[])?;
    xml.empty("c:orientation", &[("val", "minMax")])?;
    xml.end("c:scaling")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::chart::ChartId;

    fn render(chart: &Chart) -> String {
        let mut xml = XmlWriter::new(Vec::new());
        write_chart_xml(chart, &mut xml).unwrap();
        String::from_utf8(xml.into_inner()).unwrap()
    }

    fn chart_with(chart_type: ChartType) -> Chart {
        let mut chart = Chart::new(ChartId(0), chart_type);
        chart.add_series(
            ChartSeries::new("Data!$B$1:$B$3")
                .with_categories("Data!$A$1:$A$3")
                .with_name("Sales"),
        );
        chart
    }

    #[test]
    fn test_column_chart() {
        let out = render(&chart_with(ChartType::Column));
        assert!(out.contains(r#"<c:barChart><c:barDir val="col"/><c:grouping val="clustered"/>"#));
        assert!(out.contains("<c:cat><c:strRef><c:f>Data!$A$1:$A$3</c:f></c:strRef></c:cat>"));
        assert!(out.contains("<c:val><c:numRef><c:f>Data!$B$1:$B$3</c:f></c:numRef></c:val>"));
        assert!(out.contains("<c:tx><c:v>Sales</c:v></c:tx>"));
        assert!(out.contains("<c:catAx>"));
        assert!(out.contains(r#"<c:crossBetween val="between"/>"#));
    }

    #[test]
    fn test_bar_chart_is_horizontal() {
        let out = render(&chart_with(ChartType::Bar));
        assert!(out.contains(r#"<c:barDir val="bar"/>"#));
        assert!(out.contains(r#"<c:catAx><c:axId val="50010001"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="l"/>"#));
    }

    #[test]
    fn test_pie_chart_has_no_axes() {
        let out = render(&chart_with(ChartType::Pie));
        assert!(out.contains("<c:pieChart>"));
        assert!(!out.contains("<c:axId"));
        assert!(!out.contains("<c:catAx>"));
        assert!(out.contains(r#"<c:firstSliceAng val="0"/>"#));
    }

    #[test]
    fn test_doughnut_chart_has_hole() {
        let out = render(&chart_with(ChartType::Doughnut));
        assert!(out.contains(r#"<c:holeSize val="50"/>"#));
    }

    #[test]
    fn test_scatter_chart_uses_value_axes() {
        let out = render(&chart_with(ChartType::Scatter));
        assert!(out.contains(r#"<c:scatterStyle val="lineMarker"/>"#));
        assert!(out.contains("<c:xVal><c:numRef>"));
        assert!(out.contains("<c:yVal><c:numRef>"));
        assert_eq!(out.matches("<c:valAx>").count(), 2);
        assert!(!out.contains("<c:catAx>"));
        assert!(out.contains(r#"<c:crossBetween val="midCat"/>"#));
    }

    #[test]
    fn test_title_is_escaped() {
        let mut chart = chart_with(ChartType::Line);
        chart.set_title("Q1 & Q2");
        let out = render(&chart);
        assert!(out.contains("<a:t>Q1 &amp; Q2</a:t>"));
        assert!(out.contains(r#"<c:autoTitleDeleted val="0"/>"#));
    }

    #[test]
    fn test_series_are_numbered_in_order() {
        let mut chart = chart_with(ChartType::Area);
        chart.add_series(ChartSeries::new("Data!$C$1:$C$3"));
        let out = render(&chart);
        assert!(out.contains(r#"<c:idx val="0"/><c:order val="0"/>"#));
        assert!(out.contains(r#"<c:idx val="1"/><c:order val="1"/>"#));
    }
}
