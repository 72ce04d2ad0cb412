use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::{AppError, AppResult},
    models::{LoginReqDto, TokenPair, TokenType},
    service::{auth_token, user as user_service},
};
use actix_web::{HttpRequest, HttpResponse, web};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

async fn issue_pair(
    pool: &MySqlPool,
    config: &Config,
    user_id: u64,
    email: &str,
    user_type: u8,
) -> AppResult<TokenPair> {
    let access_token = generate_access_token(
        user_id,
        email,
        user_type,
        &config.jwt_secret,
        config.access_token_ttl,
    )?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user_id,
        email,
        user_type,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )?;

    debug!(user_id, jti = %refresh_claims.jti, "Storing refresh token");
    auth_token::store(pool, &refresh_claims).await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
    })
}

/// Log in with e-mail and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Access and refresh tokens", body = TokenPair),
        (status = 400, description = "Missing credentials", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse),
        (status = 403, description = "Account disabled", body = crate::error::ErrorResponse)
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, body),
    fields(email = %body.email)
)]
pub async fn login(
    body: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::InvalidInput("Email and password are required".into()));
    }

    let db_user = match user_service::get_by_email(pool.get_ref(), &body.email).await? {
        Some(user) => user,
        None => {
            info!("Invalid credentials: user not found");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !verify_password(&body.password, &db_user.password_hash) {
        info!(user_id = db_user.id, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    if !db_user.is_active {
        info!(user_id = db_user.id, "Login refused: account disabled");
        return Err(AppError::Forbidden("Account is disabled".into()));
    }

    let pair = issue_pair(
        pool.get_ref(),
        &config,
        db_user.id,
        &db_user.email,
        db_user.user_type().id(),
    )
    .await?;

    if let Err(e) = user_service::touch_last_login(pool.get_ref(), db_user.id).await {
        // not fatal for the login itself
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = db_user.id, "Login successful");
    Ok(HttpResponse::Ok().json(pair))
}

/// A refresh token whose user was deleted is unauthorized; other failures pass through.
fn missing_user_unauthorized(err: AppError) -> AppError {
    match err {
        AppError::NotFound(_) => AppError::Unauthorized("User no longer exists".into()),
        other => other,
    }
}

/// Exchange a refresh token (sent as Bearer) for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair; the old refresh token is revoked", body = TokenPair),
        (status = 401, description = "Missing, invalid or revoked refresh token", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let token = bearer(&req).ok_or_else(|| AppError::Unauthorized("No token".into()))?;
    let claims = verify_token(token, &config.jwt_secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized("Refresh token required".into()));
    }

    let record = auth_token::find_active(pool.get_ref(), &claims.jti)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Refresh token revoked or expired".into()))?;

    // a concurrent refresh may have won the rotation
    if !auth_token::revoke(pool.get_ref(), &claims.jti).await? {
        return Err(AppError::Unauthorized("Refresh token revoked or expired".into()));
    }

    // re-read the user so deactivation and type changes apply immediately
    let user = user_service::find_row(pool.get_ref(), record.user_id)
        .await
        .map_err(missing_user_unauthorized)?;
    if !user.is_active {
        return Err(AppError::Unauthorized("Account is disabled".into()));
    }

    debug!(token_id = record.id, user_id = user.id, "Rotating refresh token");
    let pair = issue_pair(
        pool.get_ref(),
        &config,
        user.id,
        &user.email,
        user.user_type().id(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(pair))
}

/// Revoke a refresh token (sent as Bearer). Always 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logged out")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Some(token) = bearer(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    // idempotent, success even if the token didn't exist
    if let Err(e) = auth_token::revoke(pool.get_ref(), &claims.jti).await {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_user_maps_to_unauthorized() {
        let err = missing_user_unauthorized(AppError::NotFound("User".into()));
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn database_failure_is_not_masked() {
        let err = missing_user_unauthorized(AppError::Database("pool timed out".into()));
        assert!(matches!(err, AppError::Database(_)));
    }
}
