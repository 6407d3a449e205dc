//! Cell formats and the workbook style registry (`xl/styles.xml`).

use std::collections::HashMap;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::common::xml::XmlWriter;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::namespace;

/// First id available for custom number formats.
const FIRST_CUSTOM_NUM_FMT: u32 = 164;

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

impl HorizontalAlign {
    fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// A cell format as registered with [`Workbook::add_format`](super::workbook::Workbook::add_format).
///
/// Formats are plain values; registering the same format twice yields the same index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Font size in points
    pub font_size: Option<u16>,
    pub font_name: Option<String>,
    /// Font color as `0xRRGGBB`
    pub font_color: Option<u32>,
    /// Solid fill color as `0xRRGGBB`
    pub fill_color: Option<u32>,
    /// Number format code, e.g. `0.00%`
    pub num_format: Option<String>,
    pub align: Option<HorizontalAlign>,
    pub text_wrap: bool,
}

impl Format {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn font_size(mut self, points: u16) -> Self {
        self.font_size = Some(points);
        self
    }

    pub fn font_name(mut self, name: &str) -> Self {
        self.font_name = Some(name.to_string());
        self
    }

    pub fn font_color(mut self, rgb: u32) -> Self {
        self.font_color = Some(rgb);
        self
    }

    pub fn fill_color(mut self, rgb: u32) -> Self {
        self.fill_color = Some(rgb);
        self
    }

    pub fn num_format(mut self, code: &str) -> Self {
        self.num_format = Some(code.to_string());
        self
    }

    pub fn align(mut self, align: HorizontalAlign) -> Self {
        self.align = Some(align);
        self
    }

    pub fn text_wrap(mut self) -> Self {
        self.text_wrap = true;
        self
    }

    fn font(&self) -> FontKey {
        FontKey {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            size: self.font_size.unwrap_or(11),
            name: self.font_name.clone().unwrap_or_else(|| "Calibri".to_string()),
            color: self.font_color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    bold: bool,
    italic: bool,
    underline: bool,
    size: u16,
    name: String,
    color: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Xf {
    num_fmt_id: u32,
    font_id: usize,
    fill_id: usize,
    align: Option<HorizontalAlign>,
    text_wrap: bool,
}

/// Deduplicating registry of cell formats.
///
/// Index 0 is always the default format. Fonts, fills and number formats are
/// deduplicated independently so that distinct formats can share components.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    formats: HashMap<Format, u32>,
    xfs: Vec<Xf>,
    fonts: Vec<FontKey>,
    font_map: HashMap<FontKey, usize>,
    /// Solid fills after the two mandatory ones
    fills: Vec<u32>,
    num_fmts: Vec<String>,
    num_fmt_map: HashMap<String, u32>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRegistry {
    /// Create a registry holding only the default format.
    pub fn new() -> Self {
        let default_font = Format::default().font();
        let mut registry = Self {
            formats: HashMap::new(),
            xfs: Vec::new(),
            fonts: vec![default_font.clone()],
            font_map: HashMap::from([(default_font, 0)]),
            fills: Vec::new(),
            num_fmts: Vec::new(),
            num_fmt_map: HashMap::new(),
        };
        registry.add(&Format::default());
        registry
    }

    /// Register a format and return its style index.
    pub fn add(&mut self, format: &Format) -> u32 {
        if let Some(&idx) = self.formats.get(format) {
            return idx;
        }

        let font = format.font();
        let font_id = match self.font_map.get(&font) {
            Some(&id) => id,
            None => {
                let id = self.fonts.len();
                self.fonts.push(font.clone());
                self.font_map.insert(font, id);
                id
            }
        };

        // Fills 0 and 1 are the mandatory none/gray125 pair
        let fill_id = match format.fill_color {
            None => 0,
            Some(rgb) => match self.fills.iter().position(|&c| c == rgb) {
                Some(pos) => pos + 2,
                None => {
                    self.fills.push(rgb);
                    self.fills.len() + 1
                }
            },
        };

        let num_fmt_id = match &format.num_format {
            None => 0,
            Some(code) => match self.num_fmt_map.get(code) {
                Some(&id) => id,
                None => {
                    let id = FIRST_CUSTOM_NUM_FMT + self.num_fmts.len() as u32;
                    self.num_fmts.push(code.clone());
                    self.num_fmt_map.insert(code.clone(), id);
                    id
                }
            },
        };

        let idx = self.xfs.len() as u32;
        self.xfs.push(Xf {
            num_fmt_id,
            font_id,
            fill_id,
            align: format.align,
            text_wrap: format.text_wrap,
        });
        self.formats.insert(format.clone(), idx);
        idx
    }

    /// Number of registered cell formats, the default included.
    #[inline]
    pub fn len(&self) -> usize {
        self.xfs.len()
    }

    /// Always false; the default format is always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xfs.is_empty()
    }

    /// Serialize the registry as `xl/styles.xml`.
    pub fn write_xml<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<()> {
        let mut a = itoa::Buffer::new();
        let mut b = itoa::Buffer::new();
        let mut c = itoa::Buffer::new();

        xml.decl()?;
        xml.start("styleSheet", &[("xmlns", namespace::SML_MAIN)])?;

        if !self.num_fmts.is_empty() {
            xml.start("numFmts", &[("count", a.format(self.num_fmts.len()))])?;
            for (i, code) in self.num_fmts.iter().enumerate() {
                let id = FIRST_CUSTOM_NUM_FMT + i as u32;
                xml.empty("numFmt", &[("numFmtId", a.format(id)), ("formatCode", code)])?;
            }
            xml.end("numFmts")?;
        }

        xml.start("fonts", &[("count", a.format(self.fonts.len()))])?;
        for font in &self.fonts {
            xml.start("font", &[])?;
            if font.bold {
                xml.empty("b", &[])?;
            }
            if font.italic {
                xml.empty("i", &[])?;
            }
            if font.underline {
                xml.empty("u", &[])?;
            }
            xml.empty("sz", &[("val", a.format(font.size))])?;
            match font.color {
                Some(rgb) => xml.empty("color", &[("rgb", &argb(rgb))])?,
                None => xml.empty("color", &[("theme", "1")])?,
            }
            xml.empty("name", &[("val", &font.name)])?;
            xml.empty("family", &[("val", "2")])?;
            xml.end("font")?;
        }
        xml.end("fonts")?;

        xml.start("fills", &[("count", a.format(self.fills.len() + 2))])?;
        for pattern in ["none", "gray125"] {
            xml.start("fill", &[])?;
            xml.empty("patternFill", &[("patternType", pattern)])?;
            xml.end("fill")?;
        }
        for &rgb in &self.fills {
            xml.start("fill", &[])?;
            xml.start("patternFill", &[("patternType", "solid")])?;
            xml.empty("fgColor", &[("rgb", &argb(rgb))])?;
            xml.empty("bgColor", &[("indexed", "64")])?;
            xml.end("patternFill")?;
            xml.end("fill")?;
        }
        xml.end("fills")?;

        xml.start("borders", &[("count", "1")])?;
        xml.start("border", &[])?;
        for side in ["left", "right", "top", "bottom", "diagonal"] {
            xml.empty(side, &[])?;
        }
        xml.end("border")?;
        xml.end("borders")?;

        xml.start("cellStyleXfs", &[("count", "1")])?;
        xml.empty(
            "xf",
            &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")],
        )?;
        xml.end("cellStyleXfs")?;

        xml.start("cellXfs", &[("count", a.format(self.xfs.len()))])?;
        for xf in &self.xfs {
            let mut attrs: Vec<(&str, &str)> = vec![
                ("numFmtId", a.format(xf.num_fmt_id)),
                ("fontId", b.format(xf.font_id)),
                ("fillId", c.format(xf.fill_id)),
                ("borderId", "0"),
                ("xfId", "0"),
            ];
            if xf.num_fmt_id != 0 {
                attrs.push(("applyNumberFormat", "1"));
            }
            if xf.font_id != 0 {
                attrs.push(("applyFont", "1"));
            }
            if xf.fill_id != 0 {
                attrs.push(("applyFill", "1"));
            }
            let has_alignment = xf.align.is_some() || xf.text_wrap;
            if !has_alignment {
                xml.empty("xf", &attrs)?;
                continue;
            }
            attrs.push(("applyAlignment", "1"));
            xml.start("xf", &attrs)?;
            let mut align_attrs = Vec::with_capacity(2);
            if let Some(align) = xf.align {
                align_attrs.push(("horizontal", align.as_str()));
            }
            if xf.text_wrap {
                align_attrs.push(("wrapText", "1"));
            }
            xml.empty("alignment", &align_attrs)?;
            xml.end("xf")?;
        }
        xml.end("cellXfs")?;

        xml.start("cellStyles", &[("count", "1")])?;
        xml.empty("cellStyle", &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")])?;
        xml.end("cellStyles")?;
        xml.empty("dxfs", &[("count", "0")])?;
        xml.empty(
            "tableStyles",
            &[
                ("count", "0"),
                ("defaultTableStyle", "TableStyleMedium9"),
                ("defaultPivotStyle", "PivotStyleLight16"),
            ],
        )?;
        xml.end("styleSheet")
    }
}

fn argb(rgb: u32) -> String {
    format!("FF{:06X}", rgb & 0x00FF_FFFF)
}
