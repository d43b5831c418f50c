//! METRC tag registry rules: format validation, the forward-only status
//! machine, and import planning.
//!
//! ```text
//! available ──assign──▶ assigned ──plant terminal / superseded──▶ used
//!     │
//!     └──void──▶ voided
//! ```
//!
//! `used` and `voided` are terminal. Nothing ever returns a tag to
//! `available`.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::Serialize;

use crate::error::GrowError;

/// Every METRC tag issued to this licensee starts with this prefix.
pub const TAG_PREFIX: &str = "1A4";

/// Minimum number of alphanumeric characters after [`TAG_PREFIX`].
pub const MIN_TAG_BODY_LEN: usize = 18;

static TAG_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^1A4[A-Z0-9]{18,}$").expect("valid regex"));

text_enum! {
    /// Registry status of a tag.
    TagStatus as "tag status" {
        Available => "available",
        Assigned => "assigned",
        Used => "used",
        Voided => "voided",
    }
}

impl TagStatus {
    /// `used` and `voided` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, TagStatus::Used | TagStatus::Voided)
    }

    /// Whether `self -> next` is an edge of the status machine.
    pub fn can_transition_to(self, next: TagStatus) -> bool {
        matches!(
            (self, next),
            (TagStatus::Available, TagStatus::Assigned)
                | (TagStatus::Available, TagStatus::Voided)
                | (TagStatus::Assigned, TagStatus::Used)
        )
    }

    /// Apply a transition, rejecting anything off the forward-only graph.
    pub fn transition(self, next: TagStatus) -> Result<TagStatus, GrowError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(GrowError::InvalidTagTransition {
                from: self,
                to: next,
            })
        }
    }
}

text_enum! {
    /// Why an assigned tag became `used`.
    UsedReason as "used reason" {
        /// The owning plant was harvested, destroyed or removed.
        Consumed => "consumed",
        /// The plant was re-tagged; this tag's binding was retired.
        Superseded => "superseded",
    }
}

/// Precondition for `assignTag`: the tag must be `available`.
pub fn ensure_assignable(tag: &str, status: TagStatus) -> Result<(), GrowError> {
    if status == TagStatus::Available {
        Ok(())
    } else {
        Err(GrowError::TagNotAvailable {
            tag: tag.to_string(),
            status,
        })
    }
}

/// Precondition for `voidTag`: only unassigned tags can be voided.
pub fn ensure_voidable(tag: &str, status: TagStatus) -> Result<(), GrowError> {
    if status == TagStatus::Available {
        Ok(())
    } else {
        Err(GrowError::TagAlreadyAssigned {
            tag: tag.to_string(),
            status,
        })
    }
}

// ---------------------------------------------------------------------------
// Format validation
// ---------------------------------------------------------------------------

/// The specific way a tag string is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagFormatIssue {
    Empty,
    MissingPrefix,
    TooShort,
    InvalidCharacters,
}

impl std::fmt::Display for TagFormatIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            TagFormatIssue::Empty => "tag is empty".to_string(),
            TagFormatIssue::MissingPrefix => format!("tag must start with {TAG_PREFIX}"),
            TagFormatIssue::TooShort => format!(
                "tag needs at least {MIN_TAG_BODY_LEN} characters after {TAG_PREFIX}"
            ),
            TagFormatIssue::InvalidCharacters => "tag may only contain A-Z and 0-9".to_string(),
        };
        f.write_str(&msg)
    }
}

/// Trim and upper-case a raw tag.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Normalise and check a tag, returning the canonical form or the issue.
fn check_tag(raw: &str) -> Result<String, TagFormatIssue> {
    let tag = normalize_tag(raw);
    if tag.is_empty() {
        return Err(TagFormatIssue::Empty);
    }
    if !tag.starts_with(TAG_PREFIX) {
        return Err(TagFormatIssue::MissingPrefix);
    }
    if !tag.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(TagFormatIssue::InvalidCharacters);
    }
    if !TAG_RE.is_match(&tag) {
        return Err(TagFormatIssue::TooShort);
    }
    Ok(tag)
}

/// Normalise and validate a tag, returning the canonical form.
pub fn validate_tag(raw: &str) -> Result<String, GrowError> {
    check_tag(raw).map_err(|issue| GrowError::InvalidTagFormat {
        tag: raw.to_string(),
        issue,
    })
}

/// Build a full tag from a shared prefix and a per-plant suffix (quick entry).
pub fn compose_tag(prefix: &str, suffix: &str) -> String {
    format!("{}{}", prefix.trim(), suffix.trim())
}

// ---------------------------------------------------------------------------
// Bulk import
// ---------------------------------------------------------------------------

/// Why a single tag in an import was not inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TagRejectReason {
    InvalidFormat { issue: TagFormatIssue },
    DuplicateInRequest,
    AlreadyRegistered,
}

impl std::fmt::Display for TagRejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagRejectReason::InvalidFormat { issue } => write!(f, "{issue}"),
            TagRejectReason::DuplicateInRequest => f.write_str("tag appears more than once"),
            TagRejectReason::AlreadyRegistered => f.write_str("tag is already registered"),
        }
    }
}

/// One rejected input, reported individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRejection {
    pub tag: String,
    pub reason: TagRejectReason,
    pub message: String,
}

impl TagRejection {
    pub fn new(tag: impl Into<String>, reason: TagRejectReason) -> Self {
        let message = reason.to_string();
        Self {
            tag: tag.into(),
            reason,
            message,
        }
    }
}

/// Validated import input: canonical tags to insert, in input order, plus
/// per-item rejections found before touching the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagImportPlan {
    pub valid: Vec<String>,
    pub rejected: Vec<TagRejection>,
}

/// Validate each raw tag independently.
pub fn plan_import<S: AsRef<str>>(raw_tags: &[S]) -> TagImportPlan {
    let mut plan = TagImportPlan::default();
    let mut seen = HashSet::new();

    for raw in raw_tags {
        let raw = raw.as_ref();
        match check_tag(raw) {
            Ok(tag) if seen.insert(tag.clone()) => plan.valid.push(tag),
            Ok(_) => plan
                .rejected
                .push(TagRejection::new(raw, TagRejectReason::DuplicateInRequest)),
            Err(issue) => plan
                .rejected
                .push(TagRejection::new(raw, TagRejectReason::InvalidFormat { issue })),
        }
    }

    plan
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagImportReport {
    pub inserted: Vec<String>,
    pub rejected: Vec<TagRejection>,
    pub inserted_count: usize,
    pub rejected_count: usize,
}

impl TagImportReport {
    pub fn new(inserted: Vec<String>, rejected: Vec<TagRejection>) -> Self {
        Self {
            inserted_count: inserted.len(),
            rejected_count: rejected.len(),
            inserted,
            rejected,
        }
    }
}
