/// Failures while declaring or resolving assets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("no asset provides {0:?}")]
    NotRegistered(String),

    #[error("more than one bundle ({count}) claims {label:?}")]
    AmbiguousBundle { label: String, count: usize },

    #[error("bundle {bundle:?}: member {member:?} does not resolve to a concrete asset")]
    BundleMember { bundle: String, member: String },

    #[error("asset manager is already resolved")]
    Sealed,

    #[error("asset manager failed to resolve and cannot be used")]
    Aborted,

    #[error("could not determine rel for extension {0:?}")]
    UnknownRel(String),
}

/// Failures while building or parsing component trees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HtmlError {
    #[error("cannot modify {0:?} via attrs")]
    ReservedAttr(String),

    #[error("invalid html attribute name: {0:?}")]
    InvalidAttrName(String),

    #[error("Parser error: {0}")]
    Parse(String),
}

/// Failures of the tagged JSON envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonError {
    #[error("invalid type: {{\"@\": {0:?}, ...}}")]
    UnknownType(String),

    #[error("malformed {kind} payload: {reason}")]
    Malformed { kind: String, reason: String },

    #[error("invalid json: {0}")]
    Syntax(String),
}

impl JsonError {
    pub(crate) fn malformed(kind: &str, reason: impl Into<String>) -> Self {
        JsonError::Malformed {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}
