//! Decoder for the GML subset produced by [`crate::encode`].
//!
//! This is not a general GML parser. It accepts exactly the element shapes
//! the encoder writes, applying the same axis-order rules in reverse so
//! that decoding an encoded geometry with the same options restores the
//! original coordinates.
//!
//! Two distinctions are erased on the wire and therefore do not survive a
//! round trip: `GeometryCollection` decodes as `MultiGeometry`, and a
//! `MultiLineString` encoded as GML 3.2 decodes as `MultiCurve` (the 3.2
//! element name carries no trace of the original variant).

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::axes::{effective_swap, srs_native_swap};
use crate::encode::{CoordDimension, EncodeOptions};
use crate::error::{GmlError, Result};
use crate::geometry::{Coord, Geometry, Line, Rings};

/// Decodes a GML fragment into a [`Geometry`].
///
/// `options` must match the options the fragment was encoded with; axis
/// swapping in particular is undone using the same resolution rules.
///
/// # Errors
///
/// Returns [`GmlError::UnsupportedGeometryType`] for element names outside
/// the encoder's subset, and [`GmlError::Parse`] /
/// [`GmlError::InvalidCoordinates`] for structural or numeric problems.
pub fn decode_geometry(xml: &str, options: &EncodeOptions) -> Result<Geometry> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {},
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::Start(start) => return read_geometry(&mut reader, &start, options, None),
            Event::Empty(_) => return Err(parse_err("empty geometry element")),
            Event::Eof => return Err(parse_err("no geometry element found")),
            _ => return Err(parse_err("unexpected content before geometry element")),
        }
    }
}

fn read_geometry(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    options: &EncodeOptions,
    inherited_native: Option<bool>,
) -> Result<Geometry> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let (id, srs_name) = read_common_attrs(start)?;

    // Nested members inherit the axis resolution of their root element,
    // mirroring the encoder.
    let native = inherited_native
        .or(options.native_swap)
        .unwrap_or_else(|| srs_native_swap(&srs_name));
    let swap = effective_swap(native, options.invert_axes);

    match name.as_str() {
        "gml:Point" => {
            let coordinates = read_single_pos(reader, "gml:Point", swap)?;
            Ok(Geometry::Point {
                id,
                srs_name,
                coordinates,
            })
        },
        "gml:LineString" => {
            let coordinates = read_sequence(reader, "gml:LineString", swap, options)?;
            Ok(Geometry::LineString {
                id,
                srs_name,
                coordinates,
            })
        },
        "gml:Polygon" => {
            let rings = read_polygon_rings(reader, "gml:Polygon", swap, options)?;
            Ok(Geometry::Polygon { id, srs_name, rings })
        },
        "gml:MultiPoint" => {
            let points = read_point_members(reader, swap)?;
            Ok(Geometry::MultiPoint {
                id,
                srs_name,
                points,
            })
        },
        "gml:MultiCurve" => {
            let lines =
                read_curve_members(reader, "gml:MultiCurve", "gml:curveMember", swap, options)?;
            Ok(Geometry::MultiCurve {
                id,
                srs_name,
                lines,
            })
        },
        "gml:MultiLineString" => {
            let lines = read_curve_members(
                reader,
                "gml:MultiLineString",
                "gml:lineStringMember",
                swap,
                options,
            )?;
            Ok(Geometry::MultiLineString {
                id,
                srs_name,
                lines,
            })
        },
        "gml:MultiSurface" => {
            let polygons = read_surface_members(
                reader,
                "gml:MultiSurface",
                "gml:surfaceMember",
                swap,
                options,
            )?;
            Ok(Geometry::MultiSurface {
                id,
                srs_name,
                polygons,
            })
        },
        "gml:MultiPolygon" => {
            let polygons = read_surface_members(
                reader,
                "gml:MultiPolygon",
                "gml:polygonMember",
                swap,
                options,
            )?;
            Ok(Geometry::MultiPolygon {
                id,
                srs_name,
                polygons,
            })
        },
        "gml:MultiGeometry" => {
            let geometries = read_geometry_members(reader, options, native)?;
            Ok(Geometry::MultiGeometry {
                id,
                srs_name,
                geometries,
            })
        },
        other => Err(GmlError::UnsupportedGeometryType {
            geometry_type: other.to_string(),
        }),
    }
}

fn read_common_attrs(start: &BytesStart<'_>) -> Result<(String, String)> {
    let mut id = String::new();
    let mut srs_name = String::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| GmlError::Parse {
            message: format!("bad attribute: {e}"),
        })?;
        match attr.key.as_ref() {
            b"gml:id" => id = unescape_text(&attr.value)?,
            b"srsName" => srs_name = unescape_text(&attr.value)?,
            _ => {},
        }
    }
    Ok((id, srs_name))
}

fn read_single_pos(reader: &mut Reader<&[u8]>, parent: &str, swap: bool) -> Result<Coord> {
    let mut coordinates = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"gml:pos" => {
                let text = read_element_text(reader, "gml:pos")?;
                coordinates = Some(parse_pos(&text, swap)?);
            },
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::End(end) if end.name().as_ref() == parent.as_bytes() => {
                return coordinates.ok_or_else(|| parse_err(format!("{parent} has no gml:pos")));
            },
            Event::Eof => return Err(parse_err(format!("missing </{parent}>"))),
            _ => return Err(parse_err(format!("unexpected content inside {parent}"))),
        }
    }
}

fn read_sequence(
    reader: &mut Reader<&[u8]>,
    parent: &str,
    swap: bool,
    options: &EncodeOptions,
) -> Result<Line> {
    let mut coords = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"gml:posList" => {
                let text = read_element_text(reader, "gml:posList")?;
                coords.extend(parse_pos_list(&text, swap, options.dimension)?);
            },
            Event::Start(e) if e.name().as_ref() == b"gml:pos" => {
                let text = read_element_text(reader, "gml:pos")?;
                coords.push(parse_pos(&text, swap)?);
            },
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::End(end) if end.name().as_ref() == parent.as_bytes() => return Ok(coords),
            Event::Eof => return Err(parse_err(format!("missing </{parent}>"))),
            _ => return Err(parse_err(format!("unexpected content inside {parent}"))),
        }
    }
}

fn read_polygon_rings(
    reader: &mut Reader<&[u8]>,
    parent: &str,
    swap: bool,
    options: &EncodeOptions,
) -> Result<Rings> {
    let mut rings = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e)
                if e.name().as_ref() == b"gml:exterior"
                    || e.name().as_ref() == b"gml:interior" =>
            {
                let boundary = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                expect_start(reader, "gml:LinearRing")?;
                let ring = read_sequence(reader, "gml:LinearRing", swap, options)?;
                expect_end(reader, &boundary)?;
                rings.push(ring);
            },
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::End(end) if end.name().as_ref() == parent.as_bytes() => return Ok(rings),
            Event::Eof => return Err(parse_err(format!("missing </{parent}>"))),
            _ => return Err(parse_err(format!("unexpected content inside {parent}"))),
        }
    }
}

fn read_point_members(reader: &mut Reader<&[u8]>, swap: bool) -> Result<Vec<Coord>> {
    let mut points = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"gml:pointMember" => {
                expect_start(reader, "gml:Point")?;
                points.push(read_single_pos(reader, "gml:Point", swap)?);
                expect_end(reader, "gml:pointMember")?;
            },
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::End(end) if end.name().as_ref() == b"gml:MultiPoint" => return Ok(points),
            Event::Eof => return Err(parse_err("missing </gml:MultiPoint>")),
            _ => return Err(parse_err("unexpected content inside gml:MultiPoint")),
        }
    }
}

fn read_curve_members(
    reader: &mut Reader<&[u8]>,
    parent: &str,
    member: &str,
    swap: bool,
    options: &EncodeOptions,
) -> Result<Vec<Line>> {
    let mut lines = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == member.as_bytes() => {
                expect_start(reader, "gml:LineString")?;
                lines.push(read_sequence(reader, "gml:LineString", swap, options)?);
                expect_end(reader, member)?;
            },
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::End(end) if end.name().as_ref() == parent.as_bytes() => return Ok(lines),
            Event::Eof => return Err(parse_err(format!("missing </{parent}>"))),
            _ => return Err(parse_err(format!("unexpected content inside {parent}"))),
        }
    }
}

fn read_surface_members(
    reader: &mut Reader<&[u8]>,
    parent: &str,
    member: &str,
    swap: bool,
    options: &EncodeOptions,
) -> Result<Vec<Rings>> {
    let mut polygons = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == member.as_bytes() => {
                expect_start(reader, "gml:Polygon")?;
                polygons.push(read_polygon_rings(reader, "gml:Polygon", swap, options)?);
                expect_end(reader, member)?;
            },
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::End(end) if end.name().as_ref() == parent.as_bytes() => return Ok(polygons),
            Event::Eof => return Err(parse_err(format!("missing </{parent}>"))),
            _ => return Err(parse_err(format!("unexpected content inside {parent}"))),
        }
    }
}

fn read_geometry_members(
    reader: &mut Reader<&[u8]>,
    options: &EncodeOptions,
    native: bool,
) -> Result<Vec<Geometry>> {
    let mut geometries = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"gml:geometryMember" => {
                geometries.push(read_member_geometry(reader, options, native)?);
                expect_end(reader, "gml:geometryMember")?;
            },
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::End(end) if end.name().as_ref() == b"gml:MultiGeometry" => {
                return Ok(geometries);
            },
            Event::Eof => return Err(parse_err("missing </gml:MultiGeometry>")),
            _ => return Err(parse_err("unexpected content inside gml:MultiGeometry")),
        }
    }
}

fn read_member_geometry(
    reader: &mut Reader<&[u8]>,
    options: &EncodeOptions,
    native: bool,
) -> Result<Geometry> {
    loop {
        match reader.read_event()? {
            Event::Start(start) => return read_geometry(reader, &start, options, Some(native)),
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::Eof => return Err(parse_err("missing geometry inside gml:geometryMember")),
            _ => return Err(parse_err("unexpected content inside gml:geometryMember")),
        }
    }
}

fn read_element_text(reader: &mut Reader<&[u8]>, end_tag: &str) -> Result<String> {
    let mut content = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(text) => content.push_str(&unescape_text(text.as_ref())?),
            Event::CData(text) => content.push_str(&String::from_utf8_lossy(text.as_ref())),
            Event::End(end) if end.name().as_ref() == end_tag.as_bytes() => return Ok(content),
            Event::Eof => return Err(parse_err(format!("missing </{end_tag}>"))),
            _ => return Err(parse_err(format!("unexpected content inside {end_tag}"))),
        }
    }
}

fn expect_start(reader: &mut Reader<&[u8]>, tag: &str) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == tag.as_bytes() => return Ok(()),
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::Eof => return Err(parse_err(format!("missing <{tag}>"))),
            _ => return Err(parse_err(format!("expected <{tag}>"))),
        }
    }
}

fn expect_end(reader: &mut Reader<&[u8]>, tag: &str) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::End(e) if e.name().as_ref() == tag.as_bytes() => return Ok(()),
            Event::Text(text) if is_blank(text.as_ref()) => {},
            Event::Eof => return Err(parse_err(format!("missing </{tag}>"))),
            _ => return Err(parse_err(format!("expected </{tag}>"))),
        }
    }
}

fn parse_pos(text: &str, swap: bool) -> Result<Coord> {
    let values = parse_numbers(text)?;
    match values.as_slice() {
        [a, b] => Ok(build_coord(*a, *b, None, swap)),
        [a, b, z] => Ok(build_coord(*a, *b, Some(*z), swap)),
        _ => Err(GmlError::InvalidCoordinates {
            text: text.to_string(),
            message: format!("expected 2 or 3 ordinates, found {}", values.len()),
        }),
    }
}

fn parse_pos_list(text: &str, swap: bool, dimension: CoordDimension) -> Result<Line> {
    let values = parse_numbers(text)?;
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let stride = match dimension.stride() {
        Some(stride) => stride,
        // Without a fixed dimension the stride is inferred: a count that is
        // a multiple of three but not of two can only be 3D.
        None => {
            if values.len() % 3 == 0 && values.len() % 2 != 0 {
                3
            } else {
                2
            }
        },
    };

    if values.len() % stride != 0 {
        return Err(GmlError::InvalidCoordinates {
            text: text.to_string(),
            message: format!("ordinate count {} is not a multiple of {stride}", values.len()),
        });
    }

    values
        .chunks(stride)
        .map(|chunk| match *chunk {
            [a, b] => Ok(build_coord(a, b, None, swap)),
            [a, b, z] => Ok(build_coord(a, b, Some(z), swap)),
            _ => Err(parse_err("invalid posList chunk")),
        })
        .collect()
}

fn parse_numbers(text: &str) -> Result<Vec<f64>> {
    text.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|e| GmlError::InvalidCoordinates {
                text: text.to_string(),
                message: format!("'{token}': {e}"),
            })
        })
        .collect()
}

fn build_coord(first: f64, second: f64, z: Option<f64>, swap: bool) -> Coord {
    let (x, y) = if swap { (second, first) } else { (first, second) };
    Coord { x, y, z }
}

fn unescape_text(bytes: &[u8]) -> Result<String> {
    let raw = String::from_utf8_lossy(bytes);
    match quick_xml::escape::unescape(&raw) {
        Ok(text) => Ok(text.into_owned()),
        Err(e) => Err(GmlError::Parse {
            message: format!("bad XML text: {e}"),
        }),
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn parse_err(message: impl Into<String>) -> GmlError {
    GmlError::Parse {
        message: message.into(),
    }
}
