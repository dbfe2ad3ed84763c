/// Answer to the "Confermi l'invio?" question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    Unrecognized,
}

/// Last code point of Latin Extended-B. Symbols such as ℹ are letters to
/// Unicode but decoration here.
const LATIN_END: char = '\u{024F}';

#[inline]
fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        other => other,
    }
}

/// Lowercases, folds accents and drops emoji and punctuation, so
/// "Sì 👍" and "si" compare equal. Inner whitespace collapses to one space.
pub fn normalize(text: &str) -> String {
    let kept: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .filter(|c| (c.is_alphanumeric() && *c <= LATIN_END) || c.is_whitespace())
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn parse_confirmation(text: &str) -> Confirmation {
    match normalize(text).as_str() {
        "si" | "yes" => Confirmation::Yes,
        "no" => Confirmation::No,
        _ => Confirmation::Unrecognized,
    }
}

/// `true` when the user declined to give a reason.
pub fn is_no(text: &str) -> bool {
    normalize(text) == "no"
}

/// Command name of a `/command` or `/command@bot_name` message, lowercased.
pub fn command(text: &str) -> Option<String> {
    let word = text.trim().split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);

    if name.is_empty() {
        None
    } else {
        Some(name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decorated_affirmatives_match() {
        for input in ["Sì 👍", "sì", "si", "SI", "Si!", " yes ", "Yes ✅"] {
            assert_eq!(parse_confirmation(input), Confirmation::Yes, "{input}");
        }
    }

    #[test]
    fn decorated_negatives_match() {
        for input in ["No 👎", "no", "NO", "No."] {
            assert_eq!(parse_confirmation(input), Confirmation::No, "{input}");
        }
    }

    #[test]
    fn anything_else_is_unrecognized() {
        for input in ["maybe", "forse", "", "👍", "si no"] {
            assert_eq!(parse_confirmation(input), Confirmation::Unrecognized, "{input}");
        }
    }

    #[test]
    fn menu_labels_normalize_to_plain_words() {
        assert_eq!(normalize("🏖️ Chiedi Ferie"), "chiedi ferie");
        assert_eq!(normalize("📝  Chiedi   Permesso"), "chiedi permesso");
        assert_eq!(normalize("ℹ️ Aiuto"), "aiuto");
    }

    #[test]
    fn commands_are_extracted() {
        assert_eq!(command("/annulla").as_deref(), Some("annulla"));
        assert_eq!(command("/Start@ferie_bot now").as_deref(), Some("start"));
        assert_eq!(command("annulla"), None);
        assert_eq!(command("/"), None);
    }

    #[test]
    fn reason_no_is_detected() {
        assert!(is_no("No"));
        assert!(is_no(" no 👎"));
        assert!(!is_no("nonna malata"));
    }
}
