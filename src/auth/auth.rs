use crate::{
    auth::jwt::verify_token,
    config::Config,
    error::{AppError, AppResult},
    model::access::AccessRole,
    models::TokenType,
};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest,
    dev::Payload,
    error::{ErrorInternalServerError, ErrorUnauthorized},
    web::Data,
};
use futures::future::{Ready, ready};

/// The authenticated caller, passed explicitly to every handler.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: u64,
    pub username: String,
    pub role: AccessRole,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

fn from_bearer(req: &HttpRequest) -> actix_web::Result<CurrentUser> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ErrorUnauthorized("Missing token"))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| ErrorInternalServerError("Config missing"))?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|_| ErrorUnauthorized("Invalid token"))?;
    if claims.token_type != TokenType::Access {
        return Err(ErrorUnauthorized("Access token required"));
    }
    let role = AccessRole::from_id(claims.role).ok_or_else(|| ErrorUnauthorized("Invalid role"))?;

    Ok(CurrentUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
    })
}

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // the auth middleware has usually done the work already
        if let Some(user) = req.extensions().get::<CurrentUser>() {
            return ready(Ok(user.clone()));
        }
        ready(from_bearer(req))
    }
}

impl CurrentUser {
    pub fn require_admin(&self) -> AppResult<()> {
        if self.role == AccessRole::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only".into()))
        }
    }

    pub fn require_hr_or_admin(&self) -> AppResult<()> {
        if self.has_elevated_view() {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR/Admin only".into()))
        }
    }

    /// Admin and HR may read any employee's records.
    pub fn has_elevated_view(&self) -> bool {
        matches!(self.role, AccessRole::Admin | AccessRole::Hr)
    }

    /// The caller's employee id, for self-service actions.
    pub fn require_employee(&self) -> AppResult<u64> {
        self.employee_id
            .ok_or_else(|| AppError::Forbidden("No employee profile".into()))
    }
}
