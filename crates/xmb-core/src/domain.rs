/// Tweet/mention id (opaque string, X API v2).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MentionId(pub String);

/// X account id (opaque string).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountId(pub String);

/// A mention of the bot account, fetched fresh each polling cycle.
#[derive(Clone, Debug)]
pub struct Mention {
    pub id: MentionId,
    pub author_id: AccountId,
    pub text: String,
}

/// The authenticated account, as reported by the platform.
#[derive(Clone, Debug)]
pub struct AccountIdentity {
    pub id: AccountId,
    pub username: String,
    pub name: String,
}

/// Receipt for a submitted reply.
#[derive(Clone, Debug)]
pub struct PostReceipt {
    pub id: MentionId,
}

impl std::fmt::Display for MentionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
