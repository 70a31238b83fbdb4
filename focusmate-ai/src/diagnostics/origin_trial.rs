// Origin-trial token decoding and validation
//
// Wire format: base64( version:u8 | signature:[u8; 64] | length:u32 BE | JSON payload ).
// Hand-written test tokens are sometimes plain base64 JSON; both are accepted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TokenError;

/// Features the page needs an active token for
pub const REQUIRED_FEATURES: [&str; 3] = [
    "AIPromptAPIMultimodalInput",
    "AISummarizationAPI",
    "AIRewriterAPI",
];

const SIGNATURE_SIZE: usize = 64;
const HEADER_SIZE: usize = 1 + SIGNATURE_SIZE + 4;

static META_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+http-equiv\s*=\s*["']origin-trial["']\s+content\s*=\s*["']([^"']*)["']\s*/?>"#)
        .expect("Invalid regex pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginTrialToken {
    pub feature: String,
    pub origin: String,
    /// Seconds since the Unix epoch
    pub expiry: i64,
    #[serde(default)]
    pub is_subdomain: bool,
}

impl OriginTrialToken {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.expiry, 0).single()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry < now.timestamp()
    }

    /// Whether the token authorizes `page`
    pub fn matches_origin(&self, page: &Url) -> bool {
        let Ok(token_origin) = Url::parse(&self.origin) else {
            return false;
        };
        let (Some(token_host), Some(page_host)) = (token_origin.host_str(), page.host_str()) else {
            return false;
        };

        if token_origin.scheme() != page.scheme()
            || token_origin.port_or_known_default() != page.port_or_known_default()
        {
            return false;
        }

        page_host == token_host
            || (self.is_subdomain && page_host.ends_with(&format!(".{}", token_host)))
    }
}

/// Decode one token string
pub fn decode_token(token: &str) -> Result<OriginTrialToken, TokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Empty);
    }

    let bytes = STANDARD
        .decode(token)
        .map_err(|e| TokenError::Base64(e.to_string()))?;

    let payload = if bytes.first() == Some(&b'{') {
        &bytes[..]
    } else {
        signed_payload(&bytes)?
    };

    serde_json::from_slice(payload).map_err(|e| TokenError::Json(e.to_string()))
}

fn signed_payload(bytes: &[u8]) -> Result<&[u8], TokenError> {
    if bytes.len() < HEADER_SIZE {
        return Err(TokenError::Truncated);
    }

    let mut length = [0u8; 4];
    length.copy_from_slice(&bytes[1 + SIGNATURE_SIZE..HEADER_SIZE]);
    let length = u32::from_be_bytes(length) as usize;

    bytes
        .get(HEADER_SIZE..HEADER_SIZE + length)
        .ok_or(TokenError::Truncated)
}

/// Contents of every `<meta http-equiv="origin-trial">` tag, in document order
pub fn extract_tokens_from_html(html: &str) -> Vec<String> {
    META_TAG_REGEX
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TokenState {
    Active {
        token: OriginTrialToken,
        /// `None` when the page URL is unknown
        matches_origin: Option<bool>,
    },
    Expired {
        token: OriginTrialToken,
    },
    Invalid {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCheck {
    /// 1-based position in the page
    pub index: usize,
    pub state: TokenState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenReport {
    pub results: Vec<TokenCheck>,
    pub missing_features: Vec<String>,
}

impl TokenReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn active(&self) -> usize {
        self.count(|s| matches!(s, TokenState::Active { .. }))
    }

    pub fn expired(&self) -> usize {
        self.count(|s| matches!(s, TokenState::Expired { .. }))
    }

    pub fn invalid(&self) -> usize {
        self.count(|s| matches!(s, TokenState::Invalid { .. }))
    }

    /// Active tokens that are known not to cover the page origin
    pub fn origin_mismatches(&self) -> usize {
        self.count(|s| {
            matches!(
                s,
                TokenState::Active {
                    matches_origin: Some(false),
                    ..
                }
            )
        })
    }

    /// No invalid or expired tokens and every required feature covered
    pub fn is_healthy(&self) -> bool {
        self.total() > 0 && self.invalid() == 0 && self.expired() == 0 && self.missing_features.is_empty()
    }

    fn count(&self, predicate: impl Fn(&TokenState) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.state)).count()
    }
}

/// Decode and classify every token, then check the required feature set
pub fn validate_tokens(tokens: &[String], page: Option<&Url>, now: DateTime<Utc>) -> TokenReport {
    let results: Vec<TokenCheck> = tokens
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let state = match decode_token(raw) {
                Err(e) => TokenState::Invalid { error: e.to_string() },
                Ok(token) if token.is_expired(now) => TokenState::Expired { token },
                Ok(token) => TokenState::Active {
                    matches_origin: page.map(|url| token.matches_origin(url)),
                    token,
                },
            };
            TokenCheck { index: i + 1, state }
        })
        .collect();

    let missing_features = REQUIRED_FEATURES
        .iter()
        .filter(|feature| {
            !results.iter().any(|r| {
                matches!(&r.state, TokenState::Active { token, .. } if token.feature == **feature)
            })
        })
        .map(|feature| feature.to_string())
        .collect();

    TokenReport {
        results,
        missing_features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_token(payload: &str) -> String {
        let mut bytes = vec![3u8];
        bytes.extend_from_slice(&[7u8; SIGNATURE_SIZE]);
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(payload.as_bytes());
        STANDARD.encode(bytes)
    }

    fn payload(feature: &str, expiry: i64, subdomain: bool) -> String {
        format!(
            r#"{{"origin":"https://focusmate.vercel.app:443","feature":"{}","expiry":{},"isSubdomain":{}}}"#,
            feature, expiry, subdomain
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000, 0).unwrap()
    }

    #[test]
    fn test_decode_signed_token() {
        let token = decode_token(&signed_token(&payload("AISummarizationAPI", 1_800_000_000, true))).unwrap();
        assert_eq!(token.feature, "AISummarizationAPI");
        assert!(token.is_subdomain);
        assert!(!token.is_expired(now()));
    }

    #[test]
    fn test_decode_plain_json_token() {
        let raw = STANDARD.encode(payload("AIRewriterAPI", 1_700_000_000, false));
        let token = decode_token(&raw).unwrap();
        assert_eq!(token.feature, "AIRewriterAPI");
        assert!(token.is_expired(now()));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode_token("  "), Err(TokenError::Empty));
        assert!(matches!(decode_token("not base64!!"), Err(TokenError::Base64(_))));
        assert_eq!(decode_token(&STANDARD.encode([3u8; 10])), Err(TokenError::Truncated));

        let mut short = signed_token(&payload("AISummarizationAPI", 1, false));
        short.truncate(short.len() - 12);
        assert!(decode_token(&short).is_err());
    }

    #[test]
    fn test_extract_from_html() {
        let html = r#"<head>
            <meta charset="utf-8">
            <meta http-equiv="origin-trial" content="AAA=">
            <META HTTP-EQUIV="origin-trial" CONTENT="BBB=" />
        </head>"#;
        assert_eq!(extract_tokens_from_html(html), vec!["AAA=", "BBB="]);
    }

    #[test]
    fn test_origin_matching() {
        let token = decode_token(&signed_token(&payload("AISummarizationAPI", 1_800_000_000, true))).unwrap();
        assert!(token.matches_origin(&Url::parse("https://focusmate.vercel.app/dashboard").unwrap()));
        assert!(token.matches_origin(&Url::parse("https://preview.focusmate.vercel.app/").unwrap()));
        assert!(!token.matches_origin(&Url::parse("http://focusmate.vercel.app/").unwrap()));
        assert!(!token.matches_origin(&Url::parse("https://other.app/").unwrap()));
    }

    #[test]
    fn test_validate_reports_missing_features() {
        let tokens = vec![
            signed_token(&payload("AISummarizationAPI", 1_800_000_000, false)),
            signed_token(&payload("AIRewriterAPI", 1_700_000_000, false)),
            "garbage".to_string(),
        ];
        let page = Url::parse("https://focusmate.vercel.app/").unwrap();
        let report = validate_tokens(&tokens, Some(&page), now());

        assert_eq!(report.total(), 3);
        assert_eq!(report.active(), 1);
        assert_eq!(report.expired(), 1);
        assert_eq!(report.invalid(), 1);
        assert_eq!(report.origin_mismatches(), 0);
        assert_eq!(
            report.missing_features,
            vec!["AIPromptAPIMultimodalInput".to_string(), "AIRewriterAPI".to_string()]
        );
        assert!(!report.is_healthy());
    }
}
