//! Fixed user-facing strings.
//!
//! Product copy ships in Portuguese; every string here is shown verbatim.

use super::failure::{Call, FailureKind};

/// Direct reply for text classified as `normal`.
pub const DIRECT_REPLY: &str = "Entendi. O que pesa mais nisso agora?";

/// Acknowledgement shown when the user postpones support.
pub const CONSENT_LATER_ACK: &str = "Fechado. Quando quiser, aperta de novo.";

/// Consent prompt heading.
pub const CONSENT_TITLE: &str = "Estado elevado detectado";

/// Consent prompt question.
pub const CONSENT_QUESTION: &str = "Quer apoio agora?";

pub const CLASSIFY_UNREACHABLE: &str =
    "Falha ao conectar. Confere a URL do serviço e a conexão.";

pub const CLASSIFY_REJECTED: &str =
    "O serviço recusou a classificação. Tenta de novo em instantes.";

pub const RESPOND_FAILED: &str = "Falha ao gerar resposta. Confere os logs do serviço.";

/// Message a failed call settles with.
///
/// Classification keeps the connect/status distinction; generation failures
/// collapse into one message.
pub fn failure_message(call: Call, failure: FailureKind) -> &'static str {
    match (call, failure) {
        (Call::Classify, FailureKind::Network) => CLASSIFY_UNREACHABLE,
        (Call::Classify, FailureKind::Service) => CLASSIFY_REJECTED,
        (Call::Respond, _) => RESPOND_FAILED,
    }
}
