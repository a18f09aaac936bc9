//! Axis-order resolution for coordinate reference systems.
//!
//! WFS 2.0 servers honour the official axis order of the CRS, which for the
//! common geographic systems (EPSG:4326 and friends) puts latitude before
//! longitude. The encoder has to know whether to swap ordinates, and that
//! decision comes either from real axis metadata or from the srsName string
//! itself.

const LON_CANDIDATES: [&str; 8] = ["lon", "long", "longitude", "lng", "e", "x", "easting", "east"];
const LAT_CANDIDATES: [&str; 6] = ["lat", "latitude", "n", "y", "northing", "north"];

/// True when an ordered axis-abbreviation list puts latitude before
/// longitude.
///
/// Unknown abbreviations never fail; anything unrecognized resolves to the
/// plain longitude/latitude order.
///
/// # Examples
///
/// ```
/// use geowfst_gml::axes::axes_swap_order;
///
/// assert!(axes_swap_order(&["Lat", "Lon"]));
/// assert!(!axes_swap_order(&["E", "N"]));
/// ```
#[must_use]
pub fn axes_swap_order(abbreviations: &[&str]) -> bool {
    let (Some(axis0), Some(axis1)) = (abbreviations.first(), abbreviations.get(1)) else {
        return false;
    };
    let axis0 = axis0.to_ascii_lowercase();
    let axis1 = axis1.to_ascii_lowercase();

    LAT_CANDIDATES.contains(&axis0.as_str()) && LON_CANDIDATES.contains(&axis1.as_str())
}

/// Resolves the native axis order for an srsName string.
///
/// Covers the spellings WFS servers actually advertise: plain
/// `authority:code`, OGC URNs with or without a version segment, and the
/// `/def/crs/` HTTP URIs. Unknown systems resolve to "no swap".
#[must_use]
pub fn srs_native_swap(srs_name: &str) -> bool {
    known_axes(srs_name).is_some_and(|axes| axes_swap_order(&axes))
}

/// Combines the native CRS requirement with the caller's invert flag.
#[must_use]
pub fn effective_swap(native_swap: bool, invert: bool) -> bool {
    if invert { !native_swap } else { native_swap }
}

/// Maps the exact `CRS:84` spelling to the URN GeoServer expects; all other
/// names pass through untouched.
#[must_use]
pub fn normalize_srs_name(srs_name: &str) -> &str {
    if srs_name == "CRS:84" {
        "urn:ogc:def:crs:EPSG:4326"
    } else {
        srs_name
    }
}

/// Latitude-first geographic systems commonly served over WFS.
const LAT_FIRST_CODES: [&str; 3] = ["4326", "4269", "4258"];

fn known_axes(srs_name: &str) -> Option<[&'static str; 2]> {
    let (authority, code) = parse_authority_code(srs_name)?;

    match (authority.as_str(), code.as_str()) {
        ("EPSG", code) if LAT_FIRST_CODES.contains(&code) => Some(["Lat", "Lon"]),
        ("OGC" | "CRS", "84" | "CRS84") => Some(["Lon", "Lat"]),
        _ => None,
    }
}

fn parse_authority_code(srs_name: &str) -> Option<(String, String)> {
    let trimmed = srs_name.trim();
    if trimmed.is_empty() {
        return None;
    }

    // http://www.opengis.net/def/crs/EPSG/0/4326
    if let Some(rest) = trimmed.split("/def/crs/").nth(1) {
        let mut segments = rest.split('/').filter(|s| !s.is_empty());
        let authority = segments.next()?;
        let code = segments.next_back()?;
        return Some((authority.to_ascii_uppercase(), code.to_string()));
    }

    let segments: Vec<&str> = trimmed.split(':').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        // urn:ogc:def:crs:EPSG::4326 or urn:ogc:def:crs:EPSG:6.9:4326
        ["urn", _, "def", "crs", rest @ ..] if !rest.is_empty() => {
            let authority = rest.first()?;
            let code = rest.last()?;
            Some((authority.to_ascii_uppercase(), (*code).to_string()))
        },
        // EPSG:4326
        [authority, code] => Some((authority.to_ascii_uppercase(), (*code).to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lat_lon_axes_require_swap() {
        assert!(axes_swap_order(&["Lat", "Lon"]));
        assert!(axes_swap_order(&["lat", "long"]));
        assert!(axes_swap_order(&["N", "E"]));
    }

    #[test]
    fn lon_lat_axes_do_not_swap() {
        assert!(!axes_swap_order(&["Lon", "Lat"]));
        assert!(!axes_swap_order(&["E", "N"]));
        assert!(!axes_swap_order(&["x", "y"]));
    }

    #[test]
    fn unknown_axes_default_to_no_swap() {
        assert!(!axes_swap_order(&["a", "b"]));
        assert!(!axes_swap_order(&["Lat"]));
        assert!(!axes_swap_order(&[]));
    }

    #[test]
    fn geographic_urns_swap() {
        assert!(srs_native_swap("urn:ogc:def:crs:EPSG::4326"));
        assert!(srs_native_swap("urn:ogc:def:crs:EPSG:4326"));
        assert!(srs_native_swap("urn:ogc:def:crs:EPSG:6.9:4326"));
        assert!(srs_native_swap("EPSG:4326"));
        assert!(srs_native_swap("http://www.opengis.net/def/crs/EPSG/0/4326"));
    }

    #[test]
    fn lon_lat_systems_do_not_swap() {
        assert!(!srs_native_swap("CRS:84"));
        assert!(!srs_native_swap("urn:ogc:def:crs:OGC:1.3:CRS84"));
        assert!(!srs_native_swap("EPSG:3857"));
        assert!(!srs_native_swap(""));
        assert!(!srs_native_swap("not a crs"));
    }

    #[test]
    fn invert_flag_flips_the_native_requirement() {
        assert!(effective_swap(true, false));
        assert!(!effective_swap(true, true));
        assert!(effective_swap(false, true));
        assert!(!effective_swap(false, false));
    }

    #[test]
    fn crs84_normalizes_to_epsg_urn() {
        assert_eq!(normalize_srs_name("CRS:84"), "urn:ogc:def:crs:EPSG:4326");
        assert_eq!(normalize_srs_name("EPSG:4326"), "EPSG:4326");
    }
}
