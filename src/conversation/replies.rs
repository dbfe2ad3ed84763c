//! Everything the bot says to requesters, plus the approver's alert.

use crate::model::request::{DATE_FORMAT, Request, RequestDetails, RequestKind};

pub const LEAVE_BUTTON: &str = "🏖️ Chiedi Ferie";
pub const ABSENCE_BUTTON: &str = "📝 Chiedi Permesso";
pub const HELP_BUTTON: &str = "ℹ️ Aiuto";
pub const CONFIRM_YES_BUTTON: &str = "Sì 👍";
pub const CONFIRM_NO_BUTTON: &str = "No 👎";
pub const APPROVE_BUTTON: &str = "✅ Approva";
pub const DENY_BUTTON: &str = "❌ Rifiuta";

pub const HELP: &str = "🤖 Come usare il bot:\n\
    Premi '🏖️ Chiedi Ferie' per avviare una richiesta di ferie.\n\
    Premi '📝 Chiedi Permesso' per avviare una richiesta di permesso.\n\n\
    Segui le istruzioni e rispondi alle domande del bot.\n\
    Lo store manager riceverà una notifica e potrà approvare o rifiutare la tua richiesta.\n\
    Sarai avvisato dell'esito.\n\n\
    Puoi annullare una richiesta in qualsiasi momento digitando /annulla.";

pub const LEAVE_START: &str = "🏖️ Ottimo! Iniziamo con la richiesta di ferie.\n\
    🗓️ Quando vorresti iniziare le ferie? (formato GG/MM/AAAA)";
pub const LEAVE_ASK_END: &str = "🗓️ Quando vorresti terminare le ferie? (formato GG/MM/AAAA)";
pub const END_BEFORE_START: &str =
    "⚠️ La data di fine non può essere precedente alla data di inizio. Riprova (formato GG/MM/AAAA).";

pub const ABSENCE_START: &str = "📝 Bene! Iniziamo con la richiesta di permesso.\n\
    🗓️ Per quale giorno richiedi il permesso? (formato GG/MM/AAAA)";
pub const ABSENCE_ASK_DURATION: &str = "⏰ Indica le ore di permesso o una breve descrizione \
    (es. 'dalle 9 alle 11', '2 ore al mattino', 'giornata intera per visita medica').";
pub const FIELD_TOO_LONG: &str =
    "⚠️ Testo troppo lungo (massimo 1000 caratteri). Riprova con una versione più breve.";
pub const EMPTY_DURATION: &str = "⚠️ Scrivi le ore o una breve descrizione del permesso.";

pub const INVALID_DATE: &str = "⚠️ Data non valida. Usa il formato GG/MM/AAAA (es. 10/07/2025).";
pub const ASK_REASON: &str = "📝 Vuoi aggiungere una motivazione? (opzionale, scrivi 'no' se non serve)";

pub const DECLINED: &str = "❌ Richiesta annullata. Cosa vuoi fare ora?";
pub const UNRECOGNIZED_CONFIRMATION: &str =
    "🤔 Risposta non riconosciuta, la richiesta è stata annullata. Cosa vuoi fare ora?";
pub const CANCELLED: &str = "Operazione annullata. Dimmi pure se hai bisogno di altro!";
pub const UNKNOWN_INPUT: &str = "Non ho capito. Usa i pulsanti qui sotto per interagire con me.";
pub const SUBMIT_FAILED: &str = "⚠️ Non è stato possibile registrare la tua richiesta. \
    Riprova più tardi o contatta l'amministrazione.";
pub const MANAGER_UNREACHABLE: &str = "⚠️ Si è verificato un errore tecnico nell'invio della notifica al manager. \
    Riprova più tardi o contatta l'amministrazione.";

pub fn welcome(first_name: &str) -> String {
    format!(
        "Ciao {}! 👋 Sono il tuo assistente per le richieste di ferie e permessi.\n\nCosa vorresti fare?",
        first_name
    )
}

pub fn reason_label(reason: Option<&str>) -> &str {
    reason.unwrap_or("Nessuna")
}

pub fn details(details: &RequestDetails, reason: Option<&str>) -> String {
    match details {
        RequestDetails::Leave {
            start_date,
            end_date,
        } => format!(
            "📅 Periodo: dal {} al {}\n💬 Motivazione: {}",
            start_date.format(DATE_FORMAT),
            end_date.format(DATE_FORMAT),
            reason_label(reason)
        ),
        RequestDetails::ShortAbsence { date, duration } => format!(
            "📅 Giorno: {}\n⏰ Orario/Descrizione: {}\n💬 Motivazione: {}",
            date.format(DATE_FORMAT),
            duration,
            reason_label(reason)
        ),
    }
}

pub fn summary(request: &RequestDetails, reason: Option<&str>) -> String {
    format!(
        "📋 Riepilogo richiesta {}:\n{}\n\nConfermi l'invio? (Sì/No)",
        request.kind().label().to_uppercase(),
        details(request, reason)
    )
}

pub fn submitted(kind: RequestKind) -> String {
    format!(
        "✅ La tua richiesta di {} è stata inviata con successo allo store manager!",
        kind.label().to_lowercase()
    )
}

pub fn approver_alert(request: &Request) -> String {
    format!(
        "🔔 Nuova richiesta di {} da {} (ID utente: {}):\n\n{}\n\n🆔 ID Richiesta: {}",
        request.kind().label(),
        request.requester_name,
        request.requester_id,
        details(&request.details, request.reason.as_deref()),
        request.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::participant::Participant;
    use crate::model::request::{NewRequest, RequestId};
    use chrono::{NaiveDate, Utc};

    #[test]
    fn leave_summary_shows_period_and_missing_reason() {
        let details = RequestDetails::Leave {
            start_date: NaiveDate::from_ymd_opt(2025, 7, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 20).unwrap(),
        };

        let text = summary(&details, None);
        assert!(text.starts_with("📋 Riepilogo richiesta FERIE:"));
        assert!(text.contains("dal 10/07/2025 al 20/07/2025"));
        assert!(text.contains("Motivazione: Nessuna"));
    }

    #[test]
    fn approver_alert_names_requester_and_id() {
        let who = Participant::new(7, "Lucia", Some("Bianchi"));
        let request = Request::from_new(
            RequestId::new("00ff00ff00ff00ff"),
            NewRequest::new(
                &who,
                RequestDetails::ShortAbsence {
                    date: NaiveDate::from_ymd_opt(2025, 9, 3).unwrap(),
                    duration: "2 ore al mattino".into(),
                },
                Some("visita medica".into()),
            ),
            Utc::now(),
        );

        let text = approver_alert(&request);
        assert!(text.starts_with("🔔 Nuova richiesta di Permesso da Lucia Bianchi (ID utente: 7)"));
        assert!(text.contains("⏰ Orario/Descrizione: 2 ore al mattino"));
        assert!(text.ends_with("🆔 ID Richiesta: 00ff00ff00ff00ff"));
    }

    #[test]
    fn longest_accepted_alert_fits_in_one_message() {
        use crate::conversation::session::MAX_FIELD_CHARS;

        // Telegram caps first and last names at 64 characters each.
        let who = Participant::new(i64::MAX, &"N".repeat(64), Some("C".repeat(64).as_str()));
        let request = Request::from_new(
            RequestId::new("00ff00ff00ff00ff"),
            NewRequest::new(
                &who,
                RequestDetails::ShortAbsence {
                    date: NaiveDate::from_ymd_opt(2025, 9, 3).unwrap(),
                    duration: "d".repeat(MAX_FIELD_CHARS),
                },
                Some("r".repeat(MAX_FIELD_CHARS)),
            ),
            Utc::now(),
        );

        let alert = approver_alert(&request);
        let annotated = format!("{}\n\n{}", alert, "--- ESITO: ❌ RIFIUTATA ---");
        assert!(annotated.chars().count() < 4096);
    }
}
