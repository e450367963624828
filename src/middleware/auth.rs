//! Middleware de autenticação JWT
//!
//! Extrai o token do header Authorization, valida as claims e recarrega o
//! perfil atual do usuário no store. O papel usado na autorização é sempre o
//! do perfil vivo, de modo que rebaixamentos de papel ou exclusões de conta
//! têm efeito imediato, independente do que o token afirme.

use axum::{extract::{Request, State}, http::header, middleware::Next, response::Response};

use crate::{
    models::user::{AppUser, Role},
    state::AppState,
    store::{self, Collection},
    utils::{errors::AppError, jwt},
};

/// Identidade autenticada injetada nas requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub name: String,
    pub matricula: String,
    pub role: Role,
}

impl From<&AppUser> for AuthenticatedUser {
    fn from(user: &AppUser) -> Self {
        Self {
            user_id: user.id.clone(),
            name: user.name.clone(),
            matricula: user.matricula.clone(),
            role: user.role,
        }
    }
}

/// Middleware de autenticação para as rotas protegidas
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Token de autorização requerido".to_string()))?;

    let jwt_config = jwt::JwtConfig::from(&state.config);
    let claims = jwt::verify_token(token, &jwt_config)?;

    let profile: AppUser = store::get_typed(state.store.as_ref(), Collection::Users, &claims.sub)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized("Perfil do usuário não existe mais no sistema".to_string())
        })?;

    request.extensions_mut().insert(AuthenticatedUser::from(&profile));

    Ok(next.run(request).await)
}
