//! Token parsing for filter and injection sections.
//!
//! Every list field accepts three forms: the wildcard `*`, the sentinel
//! `NONE` (case-insensitive) or a comma separated token list. Unknown or
//! malformed list tokens are logged and skipped; they never abort parsing.

use dlt_types::{ClientMask, ConnectionType, ServiceId};
use tracing::warn;

use super::bitset::ServiceBitset;
use super::segment::InjectionWhitelist;
use crate::error::FilterError;

/// Wildcard token.
pub const WILDCARD: &str = "*";

/// "Nothing" sentinel token.
pub const NONE_TOKEN: &str = "NONE";

enum ListForm<'a> {
    All,
    Nothing,
    Tokens(Vec<&'a str>),
}

fn classify(raw: &str) -> ListForm<'_> {
    let trimmed = raw.trim();
    if trimmed == WILDCARD {
        ListForm::All
    } else if trimmed.eq_ignore_ascii_case(NONE_TOKEN) || trimmed.is_empty() {
        ListForm::Nothing
    } else {
        ListForm::Tokens(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }
}

/// Types enabled by a single client keyword.
#[must_use]
pub fn client_keyword_mask(keyword: &str) -> Option<ClientMask> {
    match keyword {
        "Serial" => Some(ClientMask::of(&[ConnectionType::ClientMsgSerial])),
        "TCP" => Some(ClientMask::of(&[
            ConnectionType::ClientConnect,
            ConnectionType::ClientMsgTcp,
        ])),
        "Logstorage" => Some(ClientMask::of(&[ConnectionType::OfflineLogstorage])),
        "Trace" => Some(ClientMask::of(&[ConnectionType::OfflineTrace])),
        _ => None,
    }
}

/// Parse a client list into a mask.
///
/// The default mask is always part of the result so that the daemon's own
/// plumbing keeps running at every level.
pub fn parse_client_mask(section: &str, raw: &str) -> ClientMask {
    match classify(raw) {
        ListForm::All => ClientMask::ALL,
        ListForm::Nothing => ClientMask::DEFAULT,
        ListForm::Tokens(tokens) => tokens.into_iter().fold(ClientMask::DEFAULT, |mask, t| {
            match client_keyword_mask(t) {
                Some(bits) => mask.union(bits),
                None => {
                    warn!(section, token = t, "Ignoring unknown client keyword");
                    mask
                }
            }
        }),
    }
}

fn parse_hex(token: &str) -> Option<ServiceId> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    ServiceId::from_str_radix(digits, 16).ok()
}

/// Parse a control message list into a bitset.
pub fn parse_control_mask(section: &str, raw: &str) -> ServiceBitset {
    let mut set = ServiceBitset::new();
    match classify(raw) {
        ListForm::All => set.enable_all(),
        ListForm::Nothing => set.clear(),
        ListForm::Tokens(tokens) => {
            for token in tokens {
                let Some(id) = parse_hex(token) else {
                    warn!(section, token, "Ignoring malformed control message id");
                    continue;
                };
                if set.set(id).is_err() {
                    warn!(section, id = format_args!("{id:#x}"), "Ignoring out-of-range control message id");
                }
            }
        }
    }
    set
}

/// Parse an injection name list.
///
/// Names are kept verbatim; resolution against the registry happens later.
pub fn parse_injection_list(raw: &str) -> InjectionWhitelist {
    match classify(raw) {
        ListForm::All => InjectionWhitelist::All,
        ListForm::Nothing => InjectionWhitelist::Nothing,
        ListForm::Tokens(tokens) => {
            InjectionWhitelist::Names(tokens.into_iter().map(str::to_string).collect())
        }
    }
}

/// Parse a decimal service id list of an injection section.
pub fn parse_service_ids(section: &str, raw: &str) -> Result<Vec<ServiceId>, FilterError> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<ServiceId>().map_err(|_| {
                FilterError::ConfigInvalid(format!(
                    "injection '{section}': service id '{t}' is not a decimal integer"
                ))
            })
        })
        .collect()
}
