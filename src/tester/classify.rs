//! Mapping of driver manager diagnostics onto [`FailureKind`]

use super::connector::ConnectorOutcome;
use crate::models::FailureDetail;
use crate::types::FailureKind;
use regex::Regex;
use std::sync::OnceLock;

fn sqlstate_assignment() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)SQLSTATE\s*[=:]?\s*([0-9A-Z]{5})\b").ok())
        .as_ref()
}

fn sqlstate_bracket() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([0-9A-Z]{5})\]").ok()).as_ref()
}

/// Message fragments used when no SQLSTATE is present, checked in order
const MESSAGE_PATTERNS: &[(&str, FailureKind)] = &[
    ("data source name not found", FailureKind::DriverNotFound),
    ("no default driver specified", FailureKind::DriverNotFound),
    ("can't open lib", FailureKind::DriverLoadFailed),
    ("cannot open lib", FailureKind::DriverLoadFailed),
    ("driver could not be loaded", FailureKind::DriverLoadFailed),
    ("login failed", FailureKind::AuthenticationRejected),
    ("authentication failed", FailureKind::AuthenticationRejected),
    ("access denied", FailureKind::AuthenticationRejected),
    ("bad login", FailureKind::AuthenticationRejected),
    ("connection refused", FailureKind::ConnectionRejected),
    ("unknown host", FailureKind::HostUnreachable),
    ("could not resolve", FailureKind::HostUnreachable),
    ("no route to host", FailureKind::HostUnreachable),
    ("network is unreachable", FailureKind::HostUnreachable),
    ("unable to connect", FailureKind::HostUnreachable),
    ("timed out", FailureKind::Timeout),
    ("timeout expired", FailureKind::Timeout),
];

/// Pull the first SQLSTATE out of driver manager output.
///
/// `SQLSTATE=XXXXX` wins over a bracketed `[XXXXX]`; bracketed tokens
/// without a digit (`[ISQL]`, `[ERROR]`) are not SQLSTATEs.
pub fn extract_sqlstate(message: &str) -> Option<String> {
    if let Some(captures) = sqlstate_assignment().and_then(|re| re.captures(message)) {
        return Some(captures[1].to_uppercase());
    }

    sqlstate_bracket()?
        .captures_iter(message)
        .map(|c| c[1].to_string())
        .find(|state| state.chars().any(|ch| ch.is_ascii_digit()))
}

/// Classification of a known SQLSTATE
pub fn kind_for_sqlstate(sqlstate: &str) -> Option<FailureKind> {
    match sqlstate {
        "IM002" => Some(FailureKind::DriverNotFound),
        "IM003" => Some(FailureKind::DriverLoadFailed),
        "28000" | "28P01" => Some(FailureKind::AuthenticationRejected),
        "08001" | "08S01" => Some(FailureKind::HostUnreachable),
        "08004" => Some(FailureKind::ConnectionRejected),
        "HYT00" | "HYT01" => Some(FailureKind::Timeout),
        _ => None,
    }
}

/// Fallback classification by message text
pub fn kind_from_message(message: &str) -> Option<FailureKind> {
    let lowered = message.to_lowercase();
    MESSAGE_PATTERNS
        .iter()
        .find(|(fragment, _)| lowered.contains(fragment))
        .map(|(_, kind)| *kind)
}

/// Classify a raw outcome; `None` means success
pub fn classify(outcome: &ConnectorOutcome) -> Option<FailureDetail> {
    match outcome {
        ConnectorOutcome::Success => None,
        ConnectorOutcome::TimedOut { after } => Some(FailureDetail {
            kind: FailureKind::Timeout,
            sqlstate: None,
            message: format!("No response within {:.1}s", after.as_secs_f64()),
        }),
        ConnectorOutcome::Unavailable { message } => Some(FailureDetail {
            kind: FailureKind::BackendUnavailable,
            sqlstate: None,
            message: message.clone(),
        }),
        ConnectorOutcome::Failed { message } => {
            let sqlstate = extract_sqlstate(message);
            let kind = sqlstate
                .as_deref()
                .and_then(kind_for_sqlstate)
                .or_else(|| kind_from_message(message))
                .unwrap_or(FailureKind::Unclassified);

            Some(FailureDetail { kind, sqlstate, message: message.clone() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn failed(message: &str) -> FailureDetail {
        classify(&ConnectorOutcome::Failed { message: message.to_string() }).unwrap()
    }

    #[test]
    fn test_extract_sqlstate_forms() {
        assert_eq!(
            extract_sqlstate("[IM002][unixODBC][Driver Manager]Data source name not found"),
            Some("IM002".to_string())
        );
        assert_eq!(
            extract_sqlstate("1: SQLDriverConnect = [iODBC][Driver Manager]Specified driver could not be loaded (0) SQLSTATE=IM003"),
            Some("IM003".to_string())
        );
        assert_eq!(extract_sqlstate("[ISQL]ERROR: Could not SQLConnect"), None);
        assert_eq!(extract_sqlstate("[ERROR] nothing here"), None);
    }

    #[test]
    fn test_assignment_form_preferred() {
        assert_eq!(extract_sqlstate("[08001] first, SQLSTATE=28000 second"), Some("28000".to_string()));
    }

    #[test]
    fn test_sqlstate_taxonomy() {
        assert_eq!(failed("[IM002] x").kind, FailureKind::DriverNotFound);
        assert_eq!(failed("[IM003] x").kind, FailureKind::DriverLoadFailed);
        assert_eq!(failed("SQLSTATE=28000").kind, FailureKind::AuthenticationRejected);
        assert_eq!(failed("[28P01] password authentication failed").kind, FailureKind::AuthenticationRejected);
        assert_eq!(failed("[08001] x").kind, FailureKind::HostUnreachable);
        assert_eq!(failed("[08S01] x").kind, FailureKind::HostUnreachable);
        assert_eq!(failed("[08004] x").kind, FailureKind::ConnectionRejected);
        assert_eq!(failed("[HYT00] x").kind, FailureKind::Timeout);
    }

    #[test]
    fn test_message_fallback() {
        let detail = failed("[unixODBC][Driver Manager]Can't open lib '/opt/foo.so' : file not found");
        assert_eq!(detail.kind, FailureKind::DriverLoadFailed);
        assert_eq!(detail.sqlstate, None);

        assert_eq!(failed("Connection refused").kind, FailureKind::ConnectionRejected);
    }

    #[test]
    fn test_unknown_sqlstate_falls_back_to_message() {
        let detail = failed("[HY000] Login failed for user 'scott'");
        assert_eq!(detail.kind, FailureKind::AuthenticationRejected);
        assert_eq!(detail.sqlstate.as_deref(), Some("HY000"));
    }

    #[test]
    fn test_unclassified_keeps_message() {
        let detail = failed("something odd happened");
        assert_eq!(detail.kind, FailureKind::Unclassified);
        assert_eq!(detail.message, "something odd happened");
    }

    #[test]
    fn test_timeout_and_unavailable() {
        let timed_out = classify(&ConnectorOutcome::TimedOut { after: Duration::from_secs(2) }).unwrap();
        assert_eq!(timed_out.kind, FailureKind::Timeout);

        let unavailable = classify(&ConnectorOutcome::Unavailable { message: "isql not found".into() }).unwrap();
        assert_eq!(unavailable.kind, FailureKind::BackendUnavailable);

        assert!(classify(&ConnectorOutcome::Success).is_none());
    }
}
