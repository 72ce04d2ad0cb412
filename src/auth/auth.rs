use crate::{
    auth::jwt::verify_token, config::Config, error::AppError, model::user_type::UserType,
    models::TokenType,
};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub user_type: UserType,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::Internal("Config missing".into()))?;

    let claims = verify_token(token, &config.jwt_secret)?;
    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized("Access token required".into()));
    }

    AuthUser::from_claims(claims.user_id, claims.sub, claims.user_type)
        .ok_or_else(|| AppError::Unauthorized("Invalid user type".into()))
}

impl AuthUser {
    pub fn from_claims(user_id: u64, email: String, user_type: u8) -> Option<Self> {
        Some(Self {
            user_id,
            email,
            user_type: UserType::from_id(user_type)?,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only".into()))
        }
    }

    pub fn require_self_or_admin(&self, user_id: u64) -> Result<(), AppError> {
        if self.is_admin() || self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not allowed to access another user".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_type: UserType) -> AuthUser {
        AuthUser {
            user_id: 10,
            email: "x@company.com".into(),
            user_type,
        }
    }

    #[test]
    fn admin_passes_every_guard() {
        let admin = user(UserType::Admin);
        assert!(admin.require_admin().is_ok());
        assert!(admin.require_self_or_admin(99).is_ok());
    }

    #[test]
    fn regular_user_only_reaches_self() {
        let regular = user(UserType::User);
        assert!(matches!(regular.require_admin(), Err(AppError::Forbidden(_))));
        assert!(regular.require_self_or_admin(10).is_ok());
        assert!(regular.require_self_or_admin(11).is_err());
    }

    #[test]
    fn unknown_user_type_in_claims_is_rejected() {
        assert!(AuthUser::from_claims(1, "a@b.c".into(), 9).is_none());
    }
}
