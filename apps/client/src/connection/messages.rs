//! Push channel payloads
//!
//! Payloads are bare strings; anything not listed here is ignored.

/// Hint that the server moved to a new question
pub const NEW_QUESTION: &str = "nova-questao";

/// Hint that intermediate standings should be shown now
pub const SHOW_STANDINGS: &str = "mostrar-posicao";

/// Keep-alive payload sent by the client
pub const PING: &str = "ping";

/// A recognised push payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMessage {
    NewQuestion,
    ShowStandings,
    Ping,
}

impl PushMessage {
    /// Parse a payload; unrecognised payloads yield `None`
    pub fn parse(payload: &str) -> Option<Self> {
        match payload.trim() {
            NEW_QUESTION => Some(Self::NewQuestion),
            SHOW_STANDINGS => Some(Self::ShowStandings),
            PING => Some(Self::Ping),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewQuestion => NEW_QUESTION,
            Self::ShowStandings => SHOW_STANDINGS,
            Self::Ping => PING,
        }
    }

    /// Whether the payload asks the client to reconcile with the server
    pub fn is_reconciliation_hint(&self) -> bool {
        matches!(self, Self::NewQuestion | Self::ShowStandings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_payloads() {
        assert_eq!(PushMessage::parse("nova-questao"), Some(PushMessage::NewQuestion));
        assert_eq!(
            PushMessage::parse(" mostrar-posicao\n"),
            Some(PushMessage::ShowStandings)
        );
        assert_eq!(PushMessage::parse("ping"), Some(PushMessage::Ping));
    }

    #[test]
    fn test_unknown_payload_ignored() {
        assert_eq!(PushMessage::parse(""), None);
        assert_eq!(PushMessage::parse("{\"type\":\"hello\"}"), None);
        assert_eq!(PushMessage::parse("NOVA-QUESTAO"), None);
    }

    #[test]
    fn test_round_trip_names() {
        for msg in [
            PushMessage::NewQuestion,
            PushMessage::ShowStandings,
            PushMessage::Ping,
        ] {
            assert_eq!(PushMessage::parse(msg.as_str()), Some(msg));
        }
    }
}
