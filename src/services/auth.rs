use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, ApiResult};
use crate::types::{AuthResponse, User};

const REGISTER: &str = "/auth/register";
const LOGIN: &str = "/auth/login";
const ME: &str = "/auth/me";

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: User,
}

/// Account endpoints
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Create an account; the response carries a fresh token
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<AuthResponse> {
        self.client
            .post(
                REGISTER,
                &RegisterBody {
                    username,
                    email,
                    password,
                },
            )
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.client
            .post(LOGIN, &LoginBody { email, password })
            .await
    }

    /// User owning the current bearer token
    pub async fn current_user(&self) -> ApiResult<User> {
        let response: MeResponse = self.client.get(ME).await?;
        Ok(response.user)
    }
}
