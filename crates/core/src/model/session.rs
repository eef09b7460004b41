use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Joins the three session fields into an identifier.
pub const SESSION_ID_SEPARATOR: &str = "__";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("operator cannot be empty")]
    EmptyOperator,

    #[error("patrol date cannot be empty")]
    EmptyDate,

    #[error("attribute must be selected")]
    EmptyAttribute,

    #[error("unknown session id scheme: {0}")]
    UnknownScheme(String),
}

/// One patrol run: who, when, and against which checklist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SessionDraft")]
pub struct Session {
    operator: String,
    date: String,
    attribute_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionDraft {
    #[serde(default)]
    operator: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    attribute_id: String,
}

impl TryFrom<SessionDraft> for Session {
    type Error = SessionError;

    fn try_from(draft: SessionDraft) -> Result<Self, Self::Error> {
        Session::new(draft.operator, draft.date, draft.attribute_id)
    }
}

impl Session {
    /// Build a session from form input. The operator name is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if any field is empty after normalization.
    pub fn new(
        operator: impl Into<String>,
        date: impl Into<String>,
        attribute_id: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let operator = operator.into().trim().to_owned();
        let date = date.into();
        let attribute_id = attribute_id.into();

        if operator.is_empty() {
            return Err(SessionError::EmptyOperator);
        }
        if date.is_empty() {
            return Err(SessionError::EmptyDate);
        }
        if attribute_id.is_empty() {
            return Err(SessionError::EmptyAttribute);
        }

        Ok(Self {
            operator,
            date,
            attribute_id,
        })
    }

    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    #[must_use]
    pub fn attribute_id(&self) -> &str {
        &self.attribute_id
    }

    /// True when a field contains the separator, so `Joined` ids may collide.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.fields()
            .iter()
            .any(|field| field.contains(SESSION_ID_SEPARATOR))
    }

    fn fields(&self) -> [&str; 3] {
        [&self.operator, &self.date, &self.attribute_id]
    }
}

/// Key of a progress record in the results map.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an id read back from storage.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How session fields are turned into a `SessionId`.
///
/// `Joined` concatenates the raw fields and matches ids already on disk, but two
/// sessions collide if a field contains `__`. `Escaped` percent-escapes `%` and `_`
/// in every field first, which keeps ids unique; for fields free of both characters
/// the two schemes agree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionIdScheme {
    #[default]
    Joined,
    Escaped,
}

impl SessionIdScheme {
    #[must_use]
    pub fn session_id(self, session: &Session) -> SessionId {
        let parts: Vec<String> = session
            .fields()
            .iter()
            .map(|field| match self {
                SessionIdScheme::Joined => (*field).to_owned(),
                SessionIdScheme::Escaped => escape_field(field),
            })
            .collect();
        SessionId(parts.join(SESSION_ID_SEPARATOR))
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionIdScheme::Joined => "joined",
            SessionIdScheme::Escaped => "escaped",
        }
    }
}

impl FromStr for SessionIdScheme {
    type Err = SessionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "joined" => Ok(Self::Joined),
            "escaped" => Ok(Self::Escaped),
            other => Err(SessionError::UnknownScheme(other.to_owned())),
        }
    }
}

fn escape_field(field: &str) -> String {
    // `%` first, otherwise the escapes themselves would be re-escaped.
    field.replace('%', "%25").replace('_', "%5F")
}

/// Identifier under the default `Joined` scheme.
#[must_use]
pub fn make_session_id(session: &Session) -> SessionId {
    SessionIdScheme::Joined.session_id(session)
}
