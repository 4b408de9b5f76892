//! Messages crossing the publish, request and query boundaries

use serde::{Deserialize, Serialize};

use crate::instrument::InstrumentCategory;
use crate::signal::Signal;

/// Server → client envelope: `{"type": "...", "data": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum OutboundMessage {
    Signal(Signal),
    Log(String),
}

impl OutboundMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Client → server requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    #[serde(rename = "reqSignalNow")]
    SignalNow {
        #[serde(default, alias = "symbol")]
        instrument: Option<String>,
        #[serde(default)]
        market: Option<String>,
    },
}

/// Watch-list entry returned by the pairs listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairInfo {
    pub symbol: String,
    #[serde(rename = "type")]
    pub category: InstrumentCategory,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_envelope() {
        let json = OutboundMessage::Log("Signal BTCUSDT CALL conf:71".into())
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"type":"log","data":"Signal BTCUSDT CALL conf:71"}"#);
    }

    #[test]
    fn test_parse_signal_request() {
        let req: ClientRequest =
            serde_json::from_str(r#"{"type":"reqSignalNow","instrument":"eurusd","market":"binary"}"#)
                .unwrap();
        assert_eq!(
            req,
            ClientRequest::SignalNow {
                instrument: Some("eurusd".into()),
                market: Some("binary".into()),
            }
        );
    }

    #[test]
    fn test_parse_request_symbol_alias_and_defaults() {
        let req: ClientRequest =
            serde_json::from_str(r#"{"type":"reqSignalNow","symbol":"USDJPY"}"#).unwrap();
        assert_eq!(
            req,
            ClientRequest::SignalNow {
                instrument: Some("USDJPY".into()),
                market: None,
            }
        );

        let req: ClientRequest = serde_json::from_str(r#"{"type":"reqSignalNow"}"#).unwrap();
        assert_eq!(
            req,
            ClientRequest::SignalNow {
                instrument: None,
                market: None,
            }
        );
    }

    #[test]
    fn test_unknown_request_type_is_rejected() {
        assert!(serde_json::from_str::<ClientRequest>(r#"{"type":"subscribe"}"#).is_err());
    }
}
