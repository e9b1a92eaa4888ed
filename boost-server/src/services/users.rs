//! Login and admin account management

use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AdminAction, CreateUserRequest, LoginRequest, PlatformCredentials, QuotaLedger, Role,
    SetQuotaRequest, UpdateUserRequest, User, UserQuery,
};
use shared::response::{Page, PaginatedResponse};
use shared::util::{non_blank, now_millis, snowflake_id};

use crate::auth::CurrentUser;
use crate::auth::session::create_token;
use crate::db::UserFilter;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::util::{MIN_PASSWORD_LEN, hash_password, verify_password};

/// Verify credentials and issue a session token
pub async fn login(state: &AppState, req: LoginRequest) -> ServiceResult<(String, User)> {
    let user = state
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &user.hashed_password) {
        tracing::info!(username = %user.username, "Login rejected: wrong password");
        return Err(AppError::invalid_credentials().into());
    }
    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled).into());
    }

    let token = create_token(user.id, &user.username, user.role, &state.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    tracing::info!(user_id = user.id, role = %user.role, "Login succeeded");
    Ok((token, user))
}

/// `GET /auth/me`
pub async fn me(state: &AppState, actor: &CurrentUser) -> ServiceResult<User> {
    let user = state
        .users
        .find_by_id(actor.id)
        .await?
        .ok_or_else(|| AppError::not_found("사용자"))?;
    Ok(user)
}

/// `GET /admin/users`
pub async fn list_clients(
    state: &AppState,
    actor: &CurrentUser,
    query: UserQuery,
) -> ServiceResult<PaginatedResponse<User>> {
    actor.require_staff()?;
    let filter = UserFilter {
        is_active: query.is_active,
        search: non_blank(query.search.as_deref()).map(str::to_string),
    };
    let page = Page::new(query.page, query.per_page);
    let (items, total) = state.users.list_clients(&filter, page).await?;
    Ok(PaginatedResponse::new(items, page, total))
}

/// `GET /admin/users/:id`
pub async fn get_client(state: &AppState, actor: &CurrentUser, id: i64) -> ServiceResult<User> {
    actor.require_staff()?;
    find_client(state, id).await
}

async fn find_client(state: &AppState, id: i64) -> ServiceResult<User> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .filter(|u| u.role == Role::Client)
        .ok_or_else(|| AppError::new(ErrorCode::ClientNotFound))?;
    Ok(user)
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort));
    }
    Ok(())
}

fn hash(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })
}

fn check_contract(user: &User) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (user.contract_start_date, user.contract_end_date)
        && start > end
    {
        return Err(AppError::validation("계약 종료일이 시작일보다 빠릅니다")
            .with_detail("field", "contractEndDate"));
    }
    Ok(())
}

/// `POST /admin/users`
///
/// Clients get their plan's preset ledger unless an explicit snapshot is
/// given. Only a superadmin may create staff accounts.
pub async fn create_user(
    state: &AppState,
    actor: &CurrentUser,
    req: CreateUserRequest,
) -> ServiceResult<User> {
    actor.require_staff()?;
    let role = req.role.unwrap_or(Role::Client);
    if role != Role::Client {
        actor.require_superadmin()?;
    }

    let username = non_blank(Some(req.username.as_str()))
        .ok_or_else(|| AppError::validation("아이디를 입력해주세요").with_detail("field", "username"))?
        .to_string();
    check_password(&req.password)?;

    let quota = match (role, &req.quota) {
        (Role::Client, Some(snapshot)) => QuotaLedger::from_snapshot(snapshot)?,
        (Role::Client, None) => req.plan.map(|p| p.initial_quota()).unwrap_or_default(),
        _ => QuotaLedger::new(),
    };

    let now = now_millis();
    let mut user = User {
        id: snowflake_id(),
        username,
        hashed_password: hash(&req.password)?,
        role,
        company_name: non_blank(req.company_name.as_deref()).map(str::to_string),
        plan: req
            .plan
            .filter(|_| role == Role::Client)
            .map(|p| p.as_str().to_string()),
        quota: QuotaLedger::new(),
        remaining_quota: 0,
        points: 0,
        contract_start_date: req.contract_start_date,
        contract_end_date: req.contract_end_date,
        is_active: true,
        encrypted_credentials: None,
        created_at: now,
        updated_at: now,
    };
    user.set_quota(quota);
    check_contract(&user)?;

    state.users.insert(&user).await?;

    state.audit.log(
        actor,
        AdminAction::UserCreate,
        Some(user.id),
        json!({
            "username": user.username,
            "role": user.role,
            "plan": user.plan,
            "quota": user.quota,
        }),
    );
    Ok(user)
}

/// `PATCH /admin/users/:id`
pub async fn update_client(
    state: &AppState,
    actor: &CurrentUser,
    id: i64,
    req: UpdateUserRequest,
) -> ServiceResult<User> {
    actor.require_staff()?;
    let mut user = find_client(state, id).await?;
    let mut changed = Vec::new();

    if let Some(name) = &req.company_name {
        user.company_name = non_blank(Some(name.as_str())).map(str::to_string);
        changed.push("companyName");
    }
    if let Some(start) = req.contract_start_date {
        user.contract_start_date = Some(start);
        changed.push("contractStartDate");
    }
    if let Some(end) = req.contract_end_date {
        user.contract_end_date = Some(end);
        changed.push("contractEndDate");
    }
    if let Some(password) = &req.password {
        check_password(password)?;
        user.hashed_password = hash(password)?;
        changed.push("password");
    }
    check_contract(&user)?;

    if changed.is_empty() {
        return Ok(user);
    }
    user.updated_at = now_millis();
    if !state.users.update_profile(&user).await? {
        return Err(AppError::new(ErrorCode::ClientNotFound).into());
    }

    state.audit.log(
        actor,
        AdminAction::UserUpdate,
        Some(user.id),
        json!({ "fields": changed }),
    );
    Ok(user)
}

/// `PUT /admin/users/:id/quota`: replace the whole ledger
pub async fn set_quota(
    state: &AppState,
    actor: &CurrentUser,
    id: i64,
    req: SetQuotaRequest,
) -> ServiceResult<User> {
    actor.require_staff()?;
    let (before, user) = state
        .users
        .set_quota(id, &req.quota, now_millis())
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ClientNotFound))?;

    state.audit.log(
        actor,
        AdminAction::QuotaUpdate,
        Some(user.id),
        json!({
            "before": before,
            "after": user.quota,
            "remainingQuota": user.remaining_quota,
        }),
    );
    Ok(user)
}

/// `POST /admin/users/:id/block` and `/unblock`
pub async fn set_active(
    state: &AppState,
    actor: &CurrentUser,
    id: i64,
    active: bool,
) -> ServiceResult<User> {
    actor.require_staff()?;
    let mut user = find_client(state, id).await?;
    let now = now_millis();
    if !state.users.set_active(id, active, now).await? {
        return Err(AppError::new(ErrorCode::ClientNotFound).into());
    }
    user.is_active = active;
    user.updated_at = now;

    let action = if active {
        AdminAction::UserUnblock
    } else {
        AdminAction::UserBlock
    };
    state
        .audit
        .log(actor, action, Some(id), json!({ "username": user.username }));
    Ok(user)
}

/// `DELETE /admin/users/:id`: the client's orders and charges go with it
pub async fn delete_client(state: &AppState, actor: &CurrentUser, id: i64) -> ServiceResult<()> {
    actor.require_staff()?;
    let user = find_client(state, id).await?;
    if !state.users.delete(id).await? {
        return Err(AppError::new(ErrorCode::ClientNotFound).into());
    }

    state.audit.log(
        actor,
        AdminAction::UserDelete,
        Some(id),
        json!({
            "username": user.username,
            "companyName": user.company_name,
        }),
    );
    Ok(())
}

/// `GET /admin/users/:id/credentials`: decrypts and reveals, always audited
pub async fn get_credentials(
    state: &AppState,
    actor: &CurrentUser,
    id: i64,
) -> ServiceResult<PlatformCredentials> {
    actor.require_staff()?;
    let user = find_client(state, id).await?;
    let blob = user
        .encrypted_credentials
        .as_deref()
        .ok_or_else(|| AppError::new(ErrorCode::CredentialsNotFound))?;

    let credentials: PlatformCredentials = state.master_key.open_json(blob).map_err(|e| {
        tracing::error!(user_id = id, "Credential decryption failed: {e}");
        AppError::internal("저장된 계정 정보를 읽을 수 없습니다")
    })?;

    state.audit.log(
        actor,
        AdminAction::CredentialView,
        Some(id),
        json!({ "platformId": credentials.platform_id }),
    );
    Ok(credentials)
}

/// `PUT /admin/users/:id/credentials`
pub async fn put_credentials(
    state: &AppState,
    actor: &CurrentUser,
    id: i64,
    credentials: PlatformCredentials,
) -> ServiceResult<()> {
    actor.require_staff()?;
    if non_blank(Some(credentials.platform_id.as_str())).is_none() {
        return Err(AppError::validation("플랫폼 아이디를 입력해주세요")
            .with_detail("field", "platformId")
            .into());
    }
    if credentials.platform_password.is_empty() {
        return Err(AppError::validation("플랫폼 비밀번호를 입력해주세요")
            .with_detail("field", "platformPassword")
            .into());
    }
    find_client(state, id).await?;

    let sealed = state.master_key.seal_json(&credentials).map_err(|e| {
        tracing::error!(user_id = id, "Credential encryption failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    if !state
        .users
        .set_credentials(id, Some(&sealed), now_millis())
        .await?
    {
        return Err(AppError::new(ErrorCode::ClientNotFound).into());
    }

    state.audit.log(
        actor,
        AdminAction::CredentialUpdate,
        Some(id),
        json!({ "platformId": credentials.platform_id }),
    );
    Ok(())
}
