//! Identity gate: does the name on the form appear on the supporting documents?

use crate::model::{DocumentIdentity, IdentityVerdict, PersonName};
use crate::normalize::normalize_name;

/// Case- and accent-insensitive equality of family and given names.
pub fn names_match(a: &PersonName, b: &PersonName) -> bool {
    normalize_name(&a.last) == normalize_name(&b.last)
        && normalize_name(&a.first) == normalize_name(&b.first)
}

/// A document name is usable only when both fields survive normalization.
/// Blank fields mean the name could not be read off the document.
pub fn is_readable(doc: &DocumentIdentity) -> bool {
    !normalize_name(&doc.name.last).is_empty() && !normalize_name(&doc.name.first).is_empty()
}

/// Usurpation is asserted only on evidence: at least one document name was
/// read and none of them matches the form. Unreadable names are not evidence,
/// so a list holding only those is treated like an empty one.
pub fn verify_identity(form_name: &PersonName, document_names: &[DocumentIdentity]) -> IdentityVerdict {
    let (readable, unreadable): (Vec<&DocumentIdentity>, Vec<&DocumentIdentity>) =
        document_names.iter().partition(|doc| is_readable(doc));
    if !unreadable.is_empty() {
        log::debug!("ignoring {} unreadable document name(s)", unreadable.len());
    }

    let mismatches: Vec<&DocumentIdentity> = readable
        .iter()
        .copied()
        .filter(|doc| !names_match(form_name, &doc.name))
        .collect();

    let any_match = mismatches.len() < readable.len();
    let usurpation_detected = !readable.is_empty() && !any_match;

    let mut notes = Vec::new();
    if usurpation_detected {
        let found: Vec<String> = mismatches.iter().map(|doc| doc.to_string()).collect();
        log::warn!(
            "identity mismatch: form says {form_name}, documents say {}",
            found.join(", ")
        );
        notes.push(format!(
            "name on form ({form_name}) not found on any document; documents name {}",
            found.join(", ")
        ));
    } else if readable.is_empty() {
        notes.push("no name could be read from the supporting documents".to_string());
    }
    if !unreadable.is_empty() {
        let documents: Vec<&str> = unreadable
            .iter()
            .map(|doc| doc.source_document.as_deref().unwrap_or("unnamed document"))
            .collect();
        notes.push(format!("unreadable name ignored on {}", documents.join(", ")));
    }

    IdentityVerdict {
        form_name: form_name.clone(),
        document_names: document_names.to_vec(),
        usurpation_detected,
        identity_confirmed: any_match,
        detail: if notes.is_empty() { None } else { Some(notes.join("; ")) },
    }
}
