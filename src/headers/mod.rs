//! Header-block validation and normalization.
//!
//! RFC 7540 §8.1.2 places a pile of constraints on HTTP/2 header
//! blocks: lowercase names, no connection-specific fields, pseudo-header
//! discipline, `:authority`/`host` agreement. This module enforces them
//! on blocks received from the peer ([`validate_inbound`]) and prepares
//! blocks the endpoint is about to send ([`normalize_outbound`] then
//! [`validate_outbound`]). The checks run as one fused pass per block;
//! the first check to fail is the one reported.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{Error, Protocol};
use crate::Result;

mod field;

pub use self::field::{HeaderField, Sensitivity};

/// Which checks apply to a given header block.
///
/// Chosen by the caller based on where the block appears: a request or
/// response head, a trailer, or a PUSH_PROMISE body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderValidationFlags {
    /// The validating endpoint is the client side of the connection.
    pub is_client: bool,
    /// The block is a trailer and may carry no pseudo-headers.
    pub is_trailer: bool,
    /// The block is a response head and must carry `:status`.
    pub is_response_header: bool,
    /// The block arrived in (or is bound for) a PUSH_PROMISE frame.
    pub is_push_promise: bool,
}

// Cookie values shorter than this are forced never-indexed. Matches the
// threshold used by Firefox and nghttp2.
const NEVER_INDEXED_COOKIE_LEN: usize = 20;

// RFC 7230's full whitespace set, not just SP and HTAB.
fn is_whitespace(octet: u8) -> bool {
    matches!(octet, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

// Hop-by-hop fields forbidden in HTTP/2, RFC 7540 §8.1.2.2.
fn is_connection_header(name: &[u8]) -> bool {
    matches!(
        name,
        b"connection" | b"proxy-connection" | b"keep-alive" | b"transfer-encoding" | b"upgrade"
    )
}

fn is_never_indexed_name(name: &[u8]) -> bool {
    // Both may carry basic credentials, which are open to dictionary
    // attacks once they land in a compression context.
    matches!(name, b"authorization" | b"proxy-authorization")
}

/// Validates a header block received from the peer.
///
/// Applies the RFC 7540 §8.1.2 checks in order and returns the block
/// unchanged, or the protocol error of the first check to fail. The
/// `flags` select the block-position checks: trailers may carry no
/// pseudo-headers, responses must carry `:status`, and only request
/// heads are held to `:authority`/`host` agreement.
pub fn validate_inbound<I>(headers: I, flags: HeaderValidationFlags) -> Result<Vec<HeaderField>>
where
    I: IntoIterator<Item = HeaderField>,
{
    let headers = headers.into_iter();
    let mut pseudo = PseudoSeen::default();
    let mut authority = AuthorityCheck::default();
    // :authority and host only matter on request heads.
    let check_authority = !(flags.is_response_header || flags.is_trailer);

    let mut block = Vec::with_capacity(headers.size_hint().0);
    for field in headers {
        reject_uppercase(&field)?;
        reject_surrounding_whitespace(&field)?;
        reject_te(&field)?;
        reject_connection_header(&field)?;
        pseudo.observe(&field)?;
        if check_authority {
            authority.observe(&field)?;
        }
        block.push(field);
    }

    pseudo.finish(flags)?;
    if check_authority {
        authority.finish()?;
    }

    trace!("validated inbound block of {} fields", block.len());
    Ok(block)
}

/// Normalizes a header block the endpoint is about to send.
///
/// Lowercases names, strips surrounding whitespace from names and
/// values, drops connection-specific fields, and forces the
/// never-indexed hint onto credential-bearing fields: `authorization`
/// and `proxy-authorization` always, `cookie` when the value is shorter
/// than 20 octets. Any sensitivity the caller already set is preserved.
/// The transformation is lazy and idempotent.
pub fn normalize_outbound<I>(
    headers: I,
    _flags: HeaderValidationFlags,
) -> impl Iterator<Item = HeaderField>
where
    I: IntoIterator<Item = HeaderField>,
{
    headers.into_iter().filter_map(|field| {
        let field = strip_surrounding_whitespace(lowercase_name(field));
        if is_connection_header(field.name()) {
            trace!("stripping connection header {:?}", field);
            return None;
        }
        Some(secure_header(field))
    })
}

/// Validates a header block the endpoint is about to send.
///
/// Assumes the block already went through [`normalize_outbound`], which
/// guarantees lowercase names and no surrounding whitespace; the
/// remaining semantic checks (`te`, connection headers, pseudo-header
/// discipline, authority agreement) run here. On failure no frame may
/// be emitted.
pub fn validate_outbound<I>(headers: I, flags: HeaderValidationFlags) -> Result<Vec<HeaderField>>
where
    I: IntoIterator<Item = HeaderField>,
{
    let headers = headers.into_iter();
    let mut pseudo = PseudoSeen::default();
    let mut authority = AuthorityCheck::default();
    let check_authority = !(flags.is_response_header || flags.is_trailer);

    let mut block = Vec::with_capacity(headers.size_hint().0);
    for field in headers {
        reject_te(&field)?;
        reject_connection_header(&field)?;
        pseudo.observe(&field)?;
        if check_authority {
            authority.observe(&field)?;
        }
        block.push(field);
    }

    pseudo.finish(flags)?;
    if check_authority {
        authority.finish()?;
    }

    Ok(block)
}

/// Extracts the request method from a header block.
///
/// The first `:method` field wins.
pub fn extract_method(headers: &[HeaderField]) -> Option<Bytes> {
    headers
        .iter()
        .find(|field| matches!(field.name(), b":method"))
        .map(|field| field.value_bytes().clone())
}

/// Extracts the authority from a header block.
///
/// The first `:authority` field wins. Scans the whole block, so call it
/// on request heads only.
pub fn extract_authority(headers: &[HeaderField]) -> Option<Bytes> {
    headers
        .iter()
        .find(|field| matches!(field.name(), b":authority"))
        .map(|field| field.value_bytes().clone())
}

/// Returns true if a header block is an informational (1xx) response.
///
/// Only the leading pseudo-header prefix is inspected; a well-formed
/// block keeps its pseudo-headers first, so the scan stops at the first
/// regular field.
pub fn is_informational_response(headers: &[HeaderField]) -> bool {
    for field in headers {
        if !field.is_pseudo() {
            return false;
        }
        if !matches!(field.name(), b":status") {
            continue;
        }
        // 1xx is decided by the first octet alone.
        return field.value().first() == Some(&b'1');
    }
    false
}

fn reject_uppercase(field: &HeaderField) -> Result<()> {
    if field.name().iter().any(|b| b.is_ascii_uppercase()) {
        debug!("rejecting uppercase header name {:?}", field.name());
        return Err(Error::new_protocol(Protocol::UppercaseHeaderName));
    }
    Ok(())
}

fn reject_surrounding_whitespace(field: &HeaderField) -> Result<()> {
    let name = field.name();
    if name.first().map_or(false, |b| is_whitespace(*b))
        || name.last().map_or(false, |b| is_whitespace(*b))
    {
        debug!("rejecting header name surrounded by whitespace");
        return Err(Error::new_protocol(Protocol::HeaderWhitespace));
    }
    // Empty values are allowed for RFC 7230 compatibility.
    let value = field.value();
    if !value.is_empty() && (is_whitespace(value[0]) || is_whitespace(value[value.len() - 1])) {
        debug!("rejecting header value surrounded by whitespace");
        return Err(Error::new_protocol(Protocol::HeaderWhitespace));
    }
    Ok(())
}

fn reject_te(field: &HeaderField) -> Result<()> {
    // Names are already lowercase by the time this check runs.
    if matches!(field.name(), b"te") && !field.value().eq_ignore_ascii_case(b"trailers") {
        debug!("rejecting te header with value {:?}", field.value());
        return Err(Error::new_protocol(Protocol::InvalidTeValue));
    }
    Ok(())
}

fn reject_connection_header(field: &HeaderField) -> Result<()> {
    if is_connection_header(field.name()) {
        debug!(
            "rejecting connection-specific header {:?}",
            field.name()
        );
        return Err(Error::new_protocol(Protocol::ConnectionHeader));
    }
    Ok(())
}

/// Tracks pseudo-header discipline over one block: no duplicates, none
/// after a regular field, only the five defined names.
#[derive(Default)]
struct PseudoSeen {
    method: bool,
    scheme: bool,
    authority: bool,
    path: bool,
    status: bool,
    any: bool,
    regular: bool,
}

impl PseudoSeen {
    fn observe(&mut self, field: &HeaderField) -> Result<()> {
        if !field.is_pseudo() {
            self.regular = true;
            return Ok(());
        }

        let known = match self.slot(field.name()) {
            Some(seen) => {
                if *seen {
                    debug!("rejecting duplicate pseudo-header {:?}", field.name());
                    return Err(Error::new_protocol(Protocol::DuplicatePseudoHeader));
                }
                *seen = true;
                true
            }
            None => false,
        };
        self.any = true;

        if self.regular {
            debug!("rejecting pseudo-header {:?} after regular field", field.name());
            return Err(Error::new_protocol(Protocol::PseudoAfterRegular));
        }
        if !known {
            debug!("rejecting unknown pseudo-header {:?}", field.name());
            return Err(Error::new_protocol(Protocol::UnknownPseudoHeader));
        }
        Ok(())
    }

    fn slot(&mut self, name: &[u8]) -> Option<&mut bool> {
        match name {
            b":method" => Some(&mut self.method),
            b":scheme" => Some(&mut self.scheme),
            b":authority" => Some(&mut self.authority),
            b":path" => Some(&mut self.path),
            b":status" => Some(&mut self.status),
            _ => None,
        }
    }

    fn finish(&self, flags: HeaderValidationFlags) -> Result<()> {
        // Pseudo-header fields MUST NOT appear in trailers, RFC 7540 §8.1.2.1.
        if flags.is_trailer && self.any {
            debug!("rejecting trailer block carrying pseudo-headers");
            return Err(Error::new_protocol(Protocol::PseudoInTrailer));
        }
        // Responses consist of a single :status, RFC 7540 §8.1.2.4.
        if flags.is_response_header && !self.status {
            debug!("rejecting response block without :status");
            return Err(Error::new_protocol(Protocol::MissingStatus));
        }
        Ok(())
    }
}

/// Captures `:authority` and `host` over one request block so their
/// agreement can be checked once the block ends.
#[derive(Default)]
struct AuthorityCheck {
    authority: Option<Bytes>,
    host: Option<Bytes>,
}

impl AuthorityCheck {
    fn observe(&mut self, field: &HeaderField) -> Result<()> {
        match field.name() {
            // At most one :authority survives pseudo-header discipline.
            b":authority" => self.authority = Some(field.value_bytes().clone()),
            b"host" => {
                if self.host.is_some() {
                    debug!("rejecting duplicate host header");
                    return Err(Error::new_protocol(Protocol::DuplicateHostHeader));
                }
                self.host = Some(field.value_bytes().clone());
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        match (&self.authority, &self.host) {
            (None, None) => {
                debug!("rejecting request block with neither :authority nor host");
                Err(Error::new_protocol(Protocol::MissingAuthority))
            }
            (Some(authority), Some(host)) if authority != host => {
                debug!(
                    "rejecting mismatched :authority {:?} and host {:?}",
                    authority, host
                );
                Err(Error::new_protocol(Protocol::MismatchedAuthority))
            }
            _ => Ok(()),
        }
    }
}

fn lowercase_name(mut field: HeaderField) -> HeaderField {
    if field.name().iter().any(|b| b.is_ascii_uppercase()) {
        let lowered = field.name().to_ascii_lowercase();
        field.set_name(lowered.into());
    }
    field
}

fn strip_surrounding_whitespace(mut field: HeaderField) -> HeaderField {
    if let Some(name) = trim(field.name_bytes()) {
        field.set_name(name);
    }
    if let Some(value) = trim(field.value_bytes()) {
        field.set_value(value);
    }
    field
}

// Returns the trimmed octets, or None if nothing needed trimming. The
// subslice shares the original allocation.
fn trim(bytes: &Bytes) -> Option<Bytes> {
    let start = match bytes.iter().position(|b| !is_whitespace(*b)) {
        Some(start) => start,
        None if bytes.is_empty() => return None,
        None => return Some(Bytes::new()),
    };
    let end = bytes.iter().rposition(|b| !is_whitespace(*b)).unwrap() + 1;
    if start == 0 && end == bytes.len() {
        None
    } else {
        Some(bytes.slice(start..end))
    }
}

fn secure_header(mut field: HeaderField) -> HeaderField {
    let force = is_never_indexed_name(field.name())
        || (matches!(field.name(), b"cookie") && field.value().len() < NEVER_INDEXED_COOKIE_LEN);
    if force {
        field.set_sensitivity(Sensitivity::NeverIndexed);
    }
    field
}
