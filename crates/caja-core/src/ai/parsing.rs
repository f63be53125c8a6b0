//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the payload in prose or markdown fences, so these
//! functions locate the outermost JSON array or object before decoding.

use crate::error::{Error, Result};

use super::types::{LedgerMatchResponse, ProposedLedgerAccount};

/// Truncate long model output for error messages
fn truncate(raw: &str) -> String {
    if raw.chars().count() > 200 {
        let cut: String = raw.chars().take(200).collect();
        format!("{}...", cut)
    } else {
        raw.to_string()
    }
}

/// Slice between the first `open` and the last `close`, inclusive
fn delimited(response: &str, open: char, close: char) -> Option<&str> {
    let start = response.find(open)?;
    let end = response.rfind(close)?;
    (start < end).then(|| &response[start..=end])
}

/// Parse a chart of accounts (JSON array) from AI response
///
/// An object, an empty array or anything unparseable is an error.
pub fn parse_chart_of_accounts(response: &str) -> Result<Vec<ProposedLedgerAccount>> {
    let response = response.trim();
    // An object wrapping an array (`{"cuentas": [...]}`) is not a chart
    if let (Some(brace), Some(bracket)) = (response.find('{'), response.find('[')) {
        if brace < bracket {
            return Err(Error::InvalidData(format!(
                "Expected a JSON array of accounts, got an object | Raw: {}",
                truncate(response)
            )));
        }
    }
    let json_str = delimited(response, '[', ']').ok_or_else(|| {
        Error::InvalidData(format!(
            "No JSON array found in AI response | Raw: {}",
            truncate(response)
        ))
    })?;

    let accounts: Vec<ProposedLedgerAccount> = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid chart of accounts JSON from AI: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    if accounts.is_empty() {
        return Err(Error::InvalidData("AI returned an empty chart of accounts".into()));
    }
    Ok(accounts)
}

/// Parse a single ledger account proposal (JSON object) from AI response
pub fn parse_ledger_proposal(response: &str) -> Result<ProposedLedgerAccount> {
    let response = response.trim();
    let json_str = delimited(response, '{', '}').ok_or_else(|| {
        Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate(response)
        ))
    })?;

    serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid ledger proposal JSON from AI: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })
}

/// Parse a match answer (`{"asientoId": n | null}`) from AI response
pub fn parse_ledger_match(response: &str) -> Result<Option<i64>> {
    let response = response.trim();
    let json_str = delimited(response, '{', '}').ok_or_else(|| {
        Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate(response)
        ))
    })?;

    let parsed: LedgerMatchResponse = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid ledger match JSON from AI: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;
    Ok(parsed.asiento_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_with_prose() {
        let response = r#"Claro, acá va:
```json
[{"code": "4.1", "name": "Ventas"}, {"code": "5.1", "name": "Alquiler", "description": "Local"}]
```"#;
        let accounts = parse_chart_of_accounts(response).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].description.as_deref(), Some("Local"));
    }

    #[test]
    fn test_parse_chart_rejects_non_sequence() {
        assert!(parse_chart_of_accounts(r#"{"code": "4.1", "name": "Ventas"}"#).is_err());
        assert!(parse_chart_of_accounts("[]").is_err());
        assert!(parse_chart_of_accounts("no idea").is_err());
        assert!(parse_chart_of_accounts(r#"["4.1", "5.1"]"#).is_err());
    }

    #[test]
    fn test_parse_chart_rejects_wrapped_array() {
        let wrapped = r#"{"cuentas": [{"code": "4.1", "name": "Ventas"}]}"#;
        assert!(parse_chart_of_accounts(wrapped).is_err());

        let fenced = "```json\n{\"cuentas\": [{\"code\": \"4.1\", \"name\": \"Ventas\"}]}\n```";
        assert!(parse_chart_of_accounts(fenced).is_err());
    }

    #[test]
    fn test_parse_ledger_proposal() {
        let response = r#"{"code": "5.3", "name": "Internet", "description": null}"#;
        let proposal = parse_ledger_proposal(response).unwrap();
        assert_eq!(proposal.code, "5.3");
        assert!(proposal.description.is_none());
    }

    #[test]
    fn test_parse_ledger_match() {
        assert_eq!(parse_ledger_match(r#"{"asientoId": 12}"#).unwrap(), Some(12));
        assert_eq!(parse_ledger_match(r#"{"asientoId": null}"#).unwrap(), None);
        assert_eq!(parse_ledger_match(r#"Result: {"id": 3}"#).unwrap(), Some(3));
        assert!(parse_ledger_match("12").is_err());
    }

    #[test]
    fn test_truncate_multibyte() {
        let long = "ñ".repeat(300);
        let out = truncate(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
    }
}
