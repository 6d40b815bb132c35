//! Reason-to-procedure matching heuristic.
//!
//! Matching is deterministic and order-dependent: multi-word keywords first,
//! then single-word keywords, then token overlap, then the first procedure in
//! the department's list. The precedence is kept exactly as deployed — the
//! first-in-list fallback for unmatched reasons is intentional behavior.

use records_client::Procedure;

/// Keyword → expected procedure name within the chosen department.
const KEYWORD_TABLE: &[(&str, &str)] = &[
    // Registro Civil y DNI
    ("dni", "Solicitud de DNI"),
    ("documento", "Solicitud de DNI"),
    ("reposicion", "Solicitud de DNI"),
    ("extravio", "Solicitud de DNI"),
    ("perdi", "Solicitud de DNI"),
    ("partida", "Partidas de Nacimiento"),
    ("nacimiento", "Partidas de Nacimiento"),
    ("pasaporte", "Pasaporte"),
    // Licencias
    ("licencia", "Licencia de Conducir"),
    ("conducir", "Licencia de Conducir"),
    ("sacar licencia", "Licencia de Conducir"),
    ("renovacion", "Renovación de Licencia"),
    ("renovar", "Renovación de Licencia"),
    ("vencio", "Renovación de Licencia"),
    ("duplicado", "Duplicado de Licencia"),
    // Impuestos
    ("agip", "AGIP – Impuestos"),
    ("impuesto", "AGIP – Impuestos"),
    ("rentas", "AGIP – Impuestos"),
    ("habilitacion", "Habilitación Comercial"),
    ("habilitacion comercial", "Habilitación Comercial"),
    ("comercio", "Habilitación Comercial"),
];

/// Lowercases and folds Spanish diacritics so "perdí" matches "perdi" and
/// "Renovación" matches "renovacion".
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Selects the procedure for a free-text reason. `procedures` must be
/// non-empty; given that, selection always succeeds:
/// 1. keyword table, multi-word keys before single-word keys, substring
///    containment in the normalized reason, expected name looked up in the
///    department's list;
/// 2. token overlap: first procedure whose normalized name contains any
///    reason token of length >= 3;
/// 3. the first procedure in the list.
pub fn select_procedure<'a>(procedures: &'a [Procedure], reason: &str) -> &'a Procedure {
    let reason = normalize(reason);

    let multi_word = KEYWORD_TABLE.iter().filter(|(k, _)| k.contains(' '));
    let single_word = KEYWORD_TABLE.iter().filter(|(k, _)| !k.contains(' '));
    for (keyword, expected) in multi_word.chain(single_word) {
        if reason.contains(keyword) {
            let expected = normalize(expected);
            if let Some(found) = procedures.iter().find(|p| normalize(&p.name) == expected) {
                return found;
            }
        }
    }

    let tokens: Vec<&str> = reason
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= 3)
        .collect();
    if let Some(found) = procedures.iter().find(|p| {
        let name = normalize(&p.name);
        tokens.iter().any(|t| name.contains(t))
    }) {
        return found;
    }

    &procedures[0]
}
