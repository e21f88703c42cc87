use async_trait::async_trait;

/// The signed-in identity and the bearer token used for the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub access_token: String,
}

#[async_trait]
pub trait Auth: Send + Sync {
    /// Returns `None` when nobody is signed in.
    async fn current_user(&self) -> Option<AuthUser>;
}

/// Identity fixed at startup from configuration.
pub struct StaticAuth {
    user: Option<AuthUser>,
}

impl StaticAuth {
    pub fn new(user: Option<AuthUser>) -> Self {
        Self { user }
    }
}

#[async_trait]
impl Auth for StaticAuth {
    async fn current_user(&self) -> Option<AuthUser> {
        self.user.clone()
    }
}
