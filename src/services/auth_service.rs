use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::JwtService;

/// Issues bearer tokens for API clients.
///
/// No credential check happens here: any non-blank username gets a token.
#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }

    pub fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let username = request.username.trim();
        if username.is_empty() {
            return Err(AppError::ValidationError(
                "username is required".to_string(),
            ));
        }

        let token = self.jwt_service.generate_token(username)?;
        log::info!("Issued token for {username}");

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.expires_in(),
        })
    }
}
