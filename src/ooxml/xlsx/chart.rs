//! Chart model.
//!
//! Charts live in the workbook's chart arena and are referenced by [`ChartId`]. A chart
//! belongs to at most one sheet; the owner, its anchor and the chart's part name are
//! recorded when it is attached.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::xlsx::sheet::SheetId;

/// EMUs per pixel at 96 DPI.
pub const EMU_PER_PIXEL: u32 = 9525;

/// Default chart width in pixels.
pub const DEFAULT_CHART_WIDTH: u32 = 480;

/// Default chart height in pixels.
pub const DEFAULT_CHART_HEIGHT: u32 = 288;

/// Largest drawing extent a consumer accepts, in EMUs (`ST_PositiveCoordinate`).
pub const MAX_EXTENT_EMU: u64 = 27_273_042_316_900;

/// Scaled size in EMUs, or `None` when it rounds to zero or exceeds [`MAX_EXTENT_EMU`].
fn scaled_emu(px: u32, scale: f64) -> Option<u64> {
    let pixels = (f64::from(px) * scale).round();
    let max_pixels = (MAX_EXTENT_EMU / u64::from(EMU_PER_PIXEL)) as f64;
    if !(1.0..=max_pixels).contains(&pixels) {
        return None;
    }
    (pixels as u64)
        .checked_mul(u64::from(EMU_PER_PIXEL))
        .filter(|&emu| emu <= MAX_EXTENT_EMU)
}

/// Stable handle to a chart in the workbook's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartId(pub(crate) usize);

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chart#{}", self.0)
    }
}

/// Chart type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartType {
    /// Area chart
    Area,
    /// Horizontal bars
    Bar,
    /// Vertical bars
    Column,
    /// Line chart
    Line,
    /// Pie chart
    Pie,
    /// Doughnut chart
    Doughnut,
    /// Scatter (XY) chart
    Scatter,
}

impl ChartType {
    /// Returns the XML element name for this chart type.
    #[inline]
    pub fn xml_element_name(&self) -> &'static str {
        match self {
            Self::Area => "c:areaChart",
            Self::Bar | Self::Column => "c:barChart",
            Self::Line => "c:lineChart",
            Self::Pie => "c:pieChart",
            Self::Doughnut => "c:doughnutChart",
            Self::Scatter => "c:scatterChart",
        }
    }

    /// Returns true if this chart type is drawn against a pair of axes.
    #[inline]
    pub const fn has_axes(&self) -> bool {
        !matches!(self, Self::Pie | Self::Doughnut)
    }
}

/// One data series, given as range formulas such as `Data!$B$1:$B$5`.
///
/// Build the references with [`Sheet::range_ref`](super::sheet::Sheet::range_ref) so
/// that sheet names are quoted correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    pub(crate) name: Option<String>,
    pub(crate) categories: Option<String>,
    pub(crate) values: String,
}

impl ChartSeries {
    /// Create a series over a value range.
    pub fn new(values: impl Into<String>) -> Self {
        Self {
            name: None,
            categories: None,
            values: values.into(),
        }
    }

    /// Set the category (or X value) range.
    pub fn with_categories(mut self, categories: impl Into<String>) -> Self {
        self.categories = Some(categories.into());
        self
    }

    /// Set a literal series name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn values(&self) -> &str {
        &self.values
    }

    #[inline]
    pub fn categories(&self) -> Option<&str> {
        self.categories.as_deref()
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Placement of a chart on a worksheet.
///
/// Chartsheets ignore the position and always fill the tab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    /// Zero-based anchor row
    pub row: u32,
    /// Zero-based anchor column
    pub col: u16,
    /// Horizontal offset from the anchor cell, in pixels
    pub x_offset: u32,
    /// Vertical offset from the anchor cell, in pixels
    pub y_offset: u32,
    pub x_scale: f64,
    pub y_scale: f64,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            x_offset: 0,
            y_offset: 0,
            x_scale: 1.0,
            y_scale: 1.0,
        }
    }
}

impl ChartOptions {
    /// Anchor the chart's top-left corner at a cell.
    pub fn at(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_offset(mut self, x_offset: u32, y_offset: u32) -> Self {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        self
    }

    #[inline]
    pub fn with_scale(mut self, x_scale: f64, y_scale: f64) -> Self {
        self.x_scale = x_scale;
        self.y_scale = y_scale;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let ok = |s: f64| s.is_finite() && s > 0.0;
        if !ok(self.x_scale) || !ok(self.y_scale) {
            return Err(OoxmlError::InvalidState(format!(
                "chart scale must be a positive number, got {}x{}",
                self.x_scale, self.y_scale
            )));
        }
        self.extent_emu().map(|_| ())
    }

    /// Extent of the scaled chart in EMUs.
    ///
    /// Fails with [`OoxmlError::InvalidState`] when either side rounds to zero pixels or
    /// exceeds [`MAX_EXTENT_EMU`].
    pub fn extent_emu(&self) -> Result<(u64, u64)> {
        match (
            scaled_emu(DEFAULT_CHART_WIDTH, self.x_scale),
            scaled_emu(DEFAULT_CHART_HEIGHT, self.y_scale),
        ) {
            (Some(cx), Some(cy)) => Ok((cx, cy)),
            _ => Err(OoxmlError::InvalidState(format!(
                "chart scale {}x{} gives an extent outside 1..={} EMU",
                self.x_scale, self.y_scale, MAX_EXTENT_EMU
            ))),
        }
    }
}

/// Where an attached chart lives.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChartPlacement {
    pub(crate) sheet: SheetId,
    pub(crate) options: ChartOptions,
    /// 1-based chart number, `N` in `chartN.xml`
    pub(crate) number: usize,
    pub(crate) partname: PackURI,
    /// Id of the drawing → chart relationship
    pub(crate) r_id: String,
}

/// A chart in the workbook's arena.
#[derive(Debug, Clone)]
pub struct Chart {
    id: ChartId,
    chart_type: ChartType,
    title: Option<String>,
    series: Vec<ChartSeries>,
    pub(crate) placement: Option<ChartPlacement>,
}

impl Chart {
    pub(crate) fn new(id: ChartId, chart_type: ChartType) -> Self {
        Self {
            id,
            chart_type,
            title: None,
            series: Vec::new(),
            placement: None,
        }
    }

    #[inline]
    pub fn id(&self) -> ChartId {
        self.id
    }

    #[inline]
    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    #[inline]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the chart title.
    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    /// Append a data series.
    pub fn add_series(&mut self, series: ChartSeries) -> &mut Self {
        self.series.push(series);
        self
    }

    #[inline]
    pub fn series(&self) -> &[ChartSeries] {
        &self.series
    }

    /// The sheet this chart is attached to, if any.
    pub fn owner(&self) -> Option<SheetId> {
        self.placement.as_ref().map(|p| p.sheet)
    }

    /// Id of the drawing → chart relationship, once attached.
    pub fn drawing_r_id(&self) -> Option<&str> {
        self.placement.as_ref().map(|p| p.r_id.as_str())
    }
}
