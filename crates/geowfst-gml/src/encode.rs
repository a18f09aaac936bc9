//! GML geometry encoding.
//!
//! Produces the GML 3.2 (or 3.1.1) fragment for a [`Geometry`], honouring
//! CRS axis order: the native order comes from the geometry's `srsName`
//! (or a pre-resolved flag), and an explicit invert option flips it. The
//! resolution happens once per encode call and is reused for every nested
//! collection member.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::axes::{effective_swap, srs_native_swap};
use crate::error::{GmlError, Result};
use crate::geometry::{Coord, Geometry, Line, Rings};

/// Target GML flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GmlVersion {
    /// GML 3.2, namespace `http://www.opengis.net/gml/3.2`.
    #[default]
    Gml32,
    /// GML 3.1.1, namespace `http://www.opengis.net/gml`.
    Gml311,
}

impl GmlVersion {
    /// The XML namespace URI of this flavour.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Gml32 => "http://www.opengis.net/gml/3.2",
            Self::Gml311 => "http://www.opengis.net/gml",
        }
    }
}

/// How many ordinates to emit per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordDimension {
    /// Always two ordinates; elevations are dropped.
    #[default]
    Two,
    /// Always three ordinates; a missing elevation becomes `0`.
    Three,
    /// Two or three, following the input coordinate.
    Auto,
}

impl CoordDimension {
    /// Ordinates per position, when fixed.
    #[must_use]
    pub fn stride(&self) -> Option<usize> {
        match self {
            Self::Two => Some(2),
            Self::Three => Some(3),
            Self::Auto => None,
        }
    }
}

/// Options controlling geometry encoding and the matching decode.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// GML flavour to emit.
    pub version: GmlVersion,
    /// Flip the resolved axis order.
    pub invert_axes: bool,
    /// Ordinates per position.
    pub dimension: CoordDimension,
    /// Use `gml:posList` for coordinate sequences; otherwise repeat
    /// `gml:pos`.
    pub use_pos_list: bool,
    /// Pre-resolved native axis swap. When `None` it is derived from the
    /// root geometry's `srsName`.
    pub native_swap: Option<bool>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            version: GmlVersion::Gml32,
            invert_axes: false,
            dimension: CoordDimension::Two,
            use_pos_list: true,
            native_swap: None,
        }
    }
}

/// Encodes a geometry into a GML fragment (no XML declaration).
///
/// # Errors
///
/// Returns [`GmlError::Write`] if the underlying writer fails.
///
/// # Examples
///
/// ```
/// use geowfst_gml::encode::{EncodeOptions, encode_geometry};
/// use geowfst_gml::geometry::{Coord, Geometry};
///
/// let point = Geometry::Point {
///     id: String::new(),
///     srs_name: "urn:ogc:def:crs:EPSG:4326".to_string(),
///     coordinates: Coord::new(10.0, 20.0),
/// };
/// let gml = encode_geometry(&point, &EncodeOptions::default()).unwrap();
/// assert!(gml.contains("<gml:pos>20 10</gml:pos>"));
/// ```
pub fn encode_geometry(geometry: &Geometry, options: &EncodeOptions) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_geometry(&mut writer, geometry, options)?;
    into_document_string(writer.into_inner())
}

/// Writes a geometry into an existing XML writer, for embedding inside a
/// larger document.
///
/// # Errors
///
/// Returns [`GmlError::Write`] if the underlying writer fails.
pub fn write_geometry<W: Write>(
    writer: &mut Writer<W>,
    geometry: &Geometry,
    options: &EncodeOptions,
) -> Result<()> {
    let native_swap = options
        .native_swap
        .unwrap_or_else(|| srs_native_swap(geometry.srs_name()));
    write_geometry_inner(writer, geometry, options, native_swap)
}

pub(crate) fn into_document_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| GmlError::Parse {
        message: format!("generated document is not UTF-8: {e}"),
    })
}

fn write_geometry_inner<W: Write>(
    writer: &mut Writer<W>,
    geometry: &Geometry,
    options: &EncodeOptions,
    native_swap: bool,
) -> Result<()> {
    let swap = effective_swap(native_swap, options.invert_axes);

    match geometry {
        Geometry::Point { coordinates, .. } => {
            writer.write_event(Event::Start(geometry_start("gml:Point", geometry)))?;
            write_text_element(
                writer,
                "gml:pos",
                &format_coord(*coordinates, swap, options.dimension),
            )?;
            writer.write_event(Event::End(BytesEnd::new("gml:Point")))?;
        },
        Geometry::LineString { coordinates, .. } => {
            writer.write_event(Event::Start(geometry_start("gml:LineString", geometry)))?;
            write_sequence(writer, coordinates, swap, options)?;
            writer.write_event(Event::End(BytesEnd::new("gml:LineString")))?;
        },
        Geometry::Polygon { rings, .. } => {
            writer.write_event(Event::Start(geometry_start("gml:Polygon", geometry)))?;
            write_rings(writer, rings, swap, options)?;
            writer.write_event(Event::End(BytesEnd::new("gml:Polygon")))?;
        },
        Geometry::MultiPoint { points, .. } => {
            writer.write_event(Event::Start(geometry_start("gml:MultiPoint", geometry)))?;
            for point in points {
                writer.write_event(Event::Start(BytesStart::new("gml:pointMember")))?;
                writer.write_event(Event::Start(BytesStart::new("gml:Point")))?;
                write_text_element(
                    writer,
                    "gml:pos",
                    &format_coord(*point, swap, options.dimension),
                )?;
                writer.write_event(Event::End(BytesEnd::new("gml:Point")))?;
                writer.write_event(Event::End(BytesEnd::new("gml:pointMember")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("gml:MultiPoint")))?;
        },
        Geometry::MultiCurve { lines, .. } => {
            write_curve_members(
                writer,
                geometry,
                lines,
                "gml:MultiCurve",
                "gml:curveMember",
                swap,
                options,
            )?;
        },
        Geometry::MultiLineString { lines, .. } => {
            // GML 3.2 retired gml:MultiLineString in favour of MultiCurve.
            let (root, member) = match options.version {
                GmlVersion::Gml311 => ("gml:MultiLineString", "gml:lineStringMember"),
                GmlVersion::Gml32 => ("gml:MultiCurve", "gml:curveMember"),
            };
            write_curve_members(writer, geometry, lines, root, member, swap, options)?;
        },
        Geometry::MultiPolygon { polygons, .. } => {
            write_surface_members(
                writer,
                geometry,
                polygons,
                "gml:MultiPolygon",
                "gml:polygonMember",
                swap,
                options,
            )?;
        },
        Geometry::MultiSurface { polygons, .. } => {
            write_surface_members(
                writer,
                geometry,
                polygons,
                "gml:MultiSurface",
                "gml:surfaceMember",
                swap,
                options,
            )?;
        },
        Geometry::MultiGeometry { geometries, .. }
        | Geometry::GeometryCollection { geometries, .. } => {
            writer.write_event(Event::Start(geometry_start("gml:MultiGeometry", geometry)))?;
            for child in geometries {
                writer.write_event(Event::Start(BytesStart::new("gml:geometryMember")))?;
                write_geometry_inner(writer, child, options, native_swap)?;
                writer.write_event(Event::End(BytesEnd::new("gml:geometryMember")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("gml:MultiGeometry")))?;
        },
    }

    Ok(())
}

fn geometry_start<'a>(tag: &'a str, geometry: &Geometry) -> BytesStart<'a> {
    let mut element = BytesStart::new(tag);
    if !geometry.id().is_empty() {
        element.push_attribute(("gml:id", geometry.id()));
    }
    if !geometry.srs_name().is_empty() {
        element.push_attribute(("srsName", geometry.srs_name()));
    }
    element
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_sequence<W: Write>(
    writer: &mut Writer<W>,
    coords: &[Coord],
    swap: bool,
    options: &EncodeOptions,
) -> Result<()> {
    if options.use_pos_list {
        let text = coords
            .iter()
            .map(|coord| format_coord(*coord, swap, options.dimension))
            .collect::<Vec<_>>()
            .join(" ");
        write_text_element(writer, "gml:posList", &text)
    } else {
        for coord in coords {
            write_text_element(
                writer,
                "gml:pos",
                &format_coord(*coord, swap, options.dimension),
            )?;
        }
        Ok(())
    }
}

fn write_rings<W: Write>(
    writer: &mut Writer<W>,
    rings: &Rings,
    swap: bool,
    options: &EncodeOptions,
) -> Result<()> {
    for (index, ring) in rings.iter().enumerate() {
        let boundary = if index == 0 {
            "gml:exterior"
        } else {
            "gml:interior"
        };
        writer.write_event(Event::Start(BytesStart::new(boundary)))?;
        writer.write_event(Event::Start(BytesStart::new("gml:LinearRing")))?;
        write_sequence(writer, ring, swap, options)?;
        writer.write_event(Event::End(BytesEnd::new("gml:LinearRing")))?;
        writer.write_event(Event::End(BytesEnd::new(boundary)))?;
    }
    Ok(())
}

fn write_curve_members<W: Write>(
    writer: &mut Writer<W>,
    geometry: &Geometry,
    lines: &[Line],
    root: &str,
    member: &str,
    swap: bool,
    options: &EncodeOptions,
) -> Result<()> {
    writer.write_event(Event::Start(geometry_start(root, geometry)))?;
    for line in lines {
        writer.write_event(Event::Start(BytesStart::new(member)))?;
        writer.write_event(Event::Start(BytesStart::new("gml:LineString")))?;
        write_sequence(writer, line, swap, options)?;
        writer.write_event(Event::End(BytesEnd::new("gml:LineString")))?;
        writer.write_event(Event::End(BytesEnd::new(member)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(root)))?;
    Ok(())
}

fn write_surface_members<W: Write>(
    writer: &mut Writer<W>,
    geometry: &Geometry,
    polygons: &[Rings],
    root: &str,
    member: &str,
    swap: bool,
    options: &EncodeOptions,
) -> Result<()> {
    writer.write_event(Event::Start(geometry_start(root, geometry)))?;
    for rings in polygons {
        writer.write_event(Event::Start(BytesStart::new(member)))?;
        writer.write_event(Event::Start(BytesStart::new("gml:Polygon")))?;
        write_rings(writer, rings, swap, options)?;
        writer.write_event(Event::End(BytesEnd::new("gml:Polygon")))?;
        writer.write_event(Event::End(BytesEnd::new(member)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(root)))?;
    Ok(())
}

fn format_coord(coord: Coord, swap: bool, dimension: CoordDimension) -> String {
    let (first, second) = if swap {
        (coord.y, coord.x)
    } else {
        (coord.x, coord.y)
    };
    match dimension {
        CoordDimension::Two => format!("{first} {second}"),
        CoordDimension::Three => {
            let elevation = coord.z.unwrap_or(0.0);
            format!("{first} {second} {elevation}")
        },
        CoordDimension::Auto => match coord.z {
            Some(elevation) => format!("{first} {second} {elevation}"),
            None => format!("{first} {second}"),
        },
    }
}
