//! Lists the selected folder as a lazy stream of parsed messages.

use async_imap::types::Fetch;
use async_imap::Session;
use futures_util::{stream, StreamExt};
use log::{debug, info};

use super::error::{EmailError, Result};
use super::mailbox::MessageStream;
use super::message::InboundMessage;
use super::session::TlsStream;

/// UIDs of every message in the selected folder, ascending.
pub(crate) async fn search_uids(session: &mut Session<TlsStream>) -> Result<Vec<u32>> {
    let found = session
        .uid_search("ALL")
        .await
        .map_err(|e| EmailError::ProtocolError(format!("UID SEARCH failed: {}", e)))?;

    let mut uids: Vec<u32> = found.into_iter().collect();
    uids.sort_unstable();
    info!("Mailbox lists {} messages", uids.len());
    Ok(uids)
}

/// Issues a single `UID FETCH` for `uids` whose responses are parsed one at
/// a time as the caller pulls from the stream.
///
/// `BODY.PEEK[]` leaves the `\Seen` flag untouched.
pub(crate) async fn fetch(
    session: &mut Session<TlsStream>,
    mut uids: Vec<u32>,
) -> Result<MessageStream<'_>> {
    if uids.is_empty() {
        return Ok(stream::empty().boxed());
    }
    uids.sort_unstable();

    let uid_set = compress_uid_set(&uids);
    debug!("Fetching UID set {}", uid_set);

    let fetches = session
        .uid_fetch(&uid_set, "(UID BODY.PEEK[])")
        .await
        .map_err(|e| EmailError::ProtocolError(format!("UID FETCH failed: {}", e)))?;

    Ok(fetches
        .map(|fetched| fetched.map_err(EmailError::from).and_then(parse_fetch))
        .boxed())
}

/// Parses mailbox identifiers back into IMAP UIDs.
pub(crate) fn parse_uids(uids: &[String]) -> Result<Vec<u32>> {
    uids.iter()
        .map(|uid| {
            uid.parse::<u32>()
                .map_err(|_| EmailError::ProtocolError(format!("'{}' is not an IMAP UID", uid)))
        })
        .collect()
}

fn parse_fetch(fetch: Fetch) -> Result<(String, InboundMessage)> {
    let uid = fetch
        .uid
        .ok_or_else(|| EmailError::ProtocolError("FETCH response without UID".to_string()))?
        .to_string();
    let body = fetch
        .body()
        .ok_or_else(|| EmailError::ProtocolError(format!("UID {} has no body", uid)))?;

    let message = InboundMessage::parse(uid.clone(), body.to_vec())?;
    Ok((uid, message))
}

/// Collapses sorted, de-duplicated UIDs into an IMAP sequence set,
/// e.g. `[1, 2, 3, 7, 9, 10]` becomes `1:3,7,9:10`.
pub fn compress_uid_set(uids: &[u32]) -> String {
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for &uid in uids {
        match ranges.last_mut() {
            Some((_, end)) if end.checked_add(1) == Some(uid) => *end = uid,
            Some((_, end)) if *end == uid => {}
            _ => ranges.push((uid, uid)),
        }
    }

    ranges
        .into_iter()
        .map(|(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}:{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
