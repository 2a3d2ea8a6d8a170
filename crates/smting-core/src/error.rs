use thiserror::Error;

/// Errors produced by the persistence collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A row the operation depends on does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A debit would take the balance below zero. Raised by the store's own
    /// guard, so it also catches races the caller's pre-check missed.
    #[error("insufficient funds: balance {balance}, debit {debit}")]
    InsufficientFunds { balance: i64, debit: i64 },

    /// A stored value could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// The write was refused because the merged record failed its check.
    /// Nothing was written.
    #[error("rejected: {0}")]
    Rejected(#[from] ValidationError),

    /// Anything the backend itself reports (I/O, SQL, network).
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Input rejected before any persistence call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("nickname must be 1 to {max} characters")]
    Nickname { max: usize },

    #[error("age {0} is outside the allowed range")]
    Age(u8),

    #[error("intro exceeds {max} characters")]
    Intro { max: usize },

    #[error("at most {max} top tags are allowed, got {got}")]
    TooManyTopTags { max: usize, got: usize },

    #[error("top tag {0:?} is not one of the interest tags")]
    TopTagNotInterest(String),

    #[error("duplicate top tag {0:?}")]
    DuplicateTopTag(String),

    #[error("tag must not be blank")]
    BlankTag,

    #[error("coordinates out of range: ({latitude}, {longitude})")]
    Coordinates { latitude: f64, longitude: f64 },

    #[error("message content must be 1 to {max} characters")]
    MessageContent { max: usize },

    #[error("cannot target yourself")]
    SelfTarget,

    #[error("post content must not be blank")]
    EmptyPost,

    #[error("{0} kane is not an available package")]
    UnknownPackage(i64),
}

/// Typed failure surface of the core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The sender cannot pay for a new conversation. No side effects happened.
    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: i64, required: i64 },

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// A step of a multi-write ledger operation failed after an earlier step
    /// succeeded. Any compensation has already run; the caller may retry.
    #[error("transaction persistence failure: {0}")]
    TransactionPersistence(#[source] StoreError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionPersistence(_) | Self::Store(_))
    }
}
