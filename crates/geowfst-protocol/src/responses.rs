//! WFS response documents.
//!
//! Servers answer transactions with summaries, lock requests with lock
//! metadata and failures with `ows:ExceptionReport` bodies. These parsers
//! never fail: a malformed document logs a warning and yields an empty
//! summary, so a broken server response degrades into "nothing happened"
//! instead of tearing down the client.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use serde::{Deserialize, Serialize};

use crate::requests::{FES_NAMESPACE, OWS_NAMESPACE, WFS_NAMESPACE};

/// Totals and identifiers pulled out of a `wfs:TransactionResponse` or a
/// `wfs:ReleaseLockResponse`. Every field is optional; servers only send
/// the parts that apply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub total_inserted: Option<String>,
    pub total_updated: Option<String>,
    pub total_deleted: Option<String>,
    pub total_replaced: Option<String>,
    /// Resource id assigned to the first inserted feature.
    pub resource_id: Option<String>,
    /// Present when the document is a `wfs:ReleaseLockResponse`.
    pub lock_id: Option<String>,
}

/// Lock metadata from a `wfs:FeatureCollection` (GetFeatureWithLock) or a
/// `wfs:LockFeatureResponse` root element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSummary {
    pub lock_id: Option<String>,
    pub number_matched: Option<String>,
    pub number_returned: Option<String>,
    pub time_stamp: Option<String>,
}

/// Code and message lifted from an `ows:ExceptionReport`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceException {
    pub code: Option<String>,
    pub text: Option<String>,
}

impl ServiceException {
    /// True when the document carried no recognizable exception.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.text.is_none()
    }
}

#[derive(Clone, Copy)]
enum TotalSlot {
    Inserted,
    Updated,
    Deleted,
    Replaced,
}

/// Reads the totals, the first inserted resource id and a release-lock id
/// from a transaction response. The first occurrence of each marker wins.
#[must_use]
pub fn parse_transaction_response(xml: &str) -> TransactionSummary {
    let mut summary = TransactionSummary::default();
    let mut reader = NsReader::from_str(xml);
    let mut pending: Option<TotalSlot> = None;

    loop {
        match reader.read_resolved_event() {
            Ok((resolve, Event::Start(e))) => {
                pending = match e.local_name().as_ref() {
                    b"totalInserted" if in_namespace(&resolve, WFS_NAMESPACE) => {
                        Some(TotalSlot::Inserted)
                    },
                    b"totalUpdated" if in_namespace(&resolve, WFS_NAMESPACE) => {
                        Some(TotalSlot::Updated)
                    },
                    b"totalDeleted" if in_namespace(&resolve, WFS_NAMESPACE) => {
                        Some(TotalSlot::Deleted)
                    },
                    b"totalReplaced" if in_namespace(&resolve, WFS_NAMESPACE) => {
                        Some(TotalSlot::Replaced)
                    },
                    _ => None,
                };
                if pending.is_none() {
                    collect_markers(&mut summary, &resolve, &e);
                }
            },
            Ok((resolve, Event::Empty(e))) => {
                collect_markers(&mut summary, &resolve, &e);
            },
            Ok((_, Event::Text(t))) => {
                if let Some(slot) = pending.take() {
                    store_total(&mut summary, slot, text_content(t.as_ref()));
                }
            },
            Ok((_, Event::CData(t))) => {
                if let Some(slot) = pending.take() {
                    store_total(
                        &mut summary,
                        slot,
                        String::from_utf8_lossy(t.as_ref()).trim().to_string(),
                    );
                }
            },
            Ok((_, Event::End(_))) => pending = None,
            Ok((_, Event::Eof)) => break,
            Ok(_) => {},
            Err(err) => {
                log::warn!("discarding malformed transaction response: {err}");
                return TransactionSummary::default();
            },
        }
    }
    summary
}

/// Reads lock metadata from the first `wfs:FeatureCollection` or
/// `wfs:LockFeatureResponse` element. Anything else yields an empty
/// summary.
#[must_use]
pub fn parse_lock_response(xml: &str) -> LockSummary {
    let mut reader = NsReader::from_str(xml);
    loop {
        match reader.read_resolved_event() {
            Ok((resolve, Event::Start(e) | Event::Empty(e))) => {
                if in_namespace(&resolve, WFS_NAMESPACE)
                    && matches!(
                        e.local_name().as_ref(),
                        b"FeatureCollection" | b"LockFeatureResponse"
                    )
                {
                    return LockSummary {
                        lock_id: attr(&e, b"lockId"),
                        number_matched: attr(&e, b"numberMatched"),
                        number_returned: attr(&e, b"numberReturned"),
                        time_stamp: attr(&e, b"timeStamp"),
                    };
                }
            },
            Ok((_, Event::Eof)) => return LockSummary::default(),
            Ok(_) => {},
            Err(err) => {
                log::warn!("discarding malformed lock response: {err}");
                return LockSummary::default();
            },
        }
    }
}

/// Reads the first exception code and message from an
/// `ows:ExceptionReport`. Documents without one yield an empty exception.
#[must_use]
pub fn parse_exception_report(xml: &str) -> ServiceException {
    let mut exception = ServiceException::default();
    let mut reader = NsReader::from_str(xml);
    let mut in_text = false;

    loop {
        match reader.read_resolved_event() {
            Ok((resolve, Event::Start(e))) => match e.local_name().as_ref() {
                b"Exception" if in_namespace(&resolve, OWS_NAMESPACE) => {
                    if let Some(code) = attr(&e, b"exceptionCode") {
                        set_once(&mut exception.code, code);
                    }
                },
                b"ExceptionText" if in_namespace(&resolve, OWS_NAMESPACE) => in_text = true,
                _ => {},
            },
            Ok((resolve, Event::Empty(e))) => {
                if e.local_name().as_ref() == b"Exception"
                    && in_namespace(&resolve, OWS_NAMESPACE)
                {
                    if let Some(code) = attr(&e, b"exceptionCode") {
                        set_once(&mut exception.code, code);
                    }
                }
            },
            Ok((_, Event::Text(t))) => {
                if in_text && exception.text.is_none() {
                    let value = text_content(t.as_ref());
                    if !value.is_empty() {
                        exception.text = Some(value);
                    }
                }
            },
            Ok((_, Event::CData(t))) => {
                if in_text && exception.text.is_none() {
                    let value = String::from_utf8_lossy(t.as_ref()).trim().to_string();
                    if !value.is_empty() {
                        exception.text = Some(value);
                    }
                }
            },
            Ok((_, Event::End(_))) => in_text = false,
            Ok((_, Event::Eof)) => break,
            Ok(_) => {},
            Err(err) => {
                log::warn!("discarding malformed exception report: {err}");
                return ServiceException::default();
            },
        }
    }
    exception
}

fn collect_markers(
    summary: &mut TransactionSummary,
    resolve: &ResolveResult<'_>,
    e: &BytesStart<'_>,
) {
    match e.local_name().as_ref() {
        b"ResourceId" if in_namespace(resolve, FES_NAMESPACE) => {
            if let Some(rid) = attr(e, b"rid") {
                set_once(&mut summary.resource_id, rid);
            }
        },
        b"ReleaseLockResponse" if in_namespace(resolve, WFS_NAMESPACE) => {
            if let Some(lock_id) = attr(e, b"lockId") {
                set_once(&mut summary.lock_id, lock_id);
            }
        },
        _ => {},
    }
}

fn store_total(summary: &mut TransactionSummary, slot: TotalSlot, value: String) {
    let target = match slot {
        TotalSlot::Inserted => &mut summary.total_inserted,
        TotalSlot::Updated => &mut summary.total_updated,
        TotalSlot::Deleted => &mut summary.total_deleted,
        TotalSlot::Replaced => &mut summary.total_replaced,
    };
    set_once(target, value);
}

fn set_once(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

/// Documents that never declare their namespaces still get matched by
/// local name; a prefix bound to a different namespace does not.
fn in_namespace(resolve: &ResolveResult<'_>, namespace: &str) -> bool {
    match resolve {
        ResolveResult::Bound(ns) => ns.as_ref() == namespace.as_bytes(),
        _ => true,
    }
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name {
            let raw = String::from_utf8_lossy(&attr.value);
            return match quick_xml::escape::unescape(&raw) {
                Ok(value) => Some(value.into_owned()),
                Err(_) => Some(raw.into_owned()),
            };
        }
    }
    None
}

fn text_content(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    let value = match quick_xml::escape::unescape(&raw) {
        Ok(value) => value.into_owned(),
        Err(_) => raw.into_owned(),
    };
    value.trim().to_string()
}
