use crate::config::AdminConfig;
use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let email = normalize_email(&request.email);

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        // 用户不存在与密码错误返回同样的信息
        if !verify_password(&request.password, &user.password_hash)? {
            log::warn!("Failed login for user {}", user.id);
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        let token = self
            .jwt_service
            .generate_token(user.id, &user.email, &user.role)?;

        log::info!("User {} logged in", user.id);
        Ok(LoginResponse {
            token,
            expires_in: self.jwt_service.get_expires_in(),
            user: user.into(),
        })
    }

    /// 启动时确保配置的管理员存在；已存在时同步角色和密码
    pub async fn ensure_admin(&self, config: &AdminConfig) -> AppResult<()> {
        let (Some(email), Some(password)) = (&config.email, &config.password) else {
            log::info!("Admin bootstrap skipped: ADMIN_EMAIL / ADMIN_PASSWORD not set");
            return Ok(());
        };
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(AppError::ConfigError("ADMIN_PASSWORD is empty".to_string()));
        }

        let password_hash = hash_password(password)?;
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.pool)
            .await?;

        match existing {
            Some(user) => {
                let mut am = user.into_active_model();
                am.password_hash = Set(password_hash);
                am.role = Set(ROLE_ADMIN.to_string());
                am.update(&self.pool).await?;
            }
            None => {
                users::ActiveModel {
                    email: Set(email.clone()),
                    password_hash: Set(password_hash),
                    role: Set(ROLE_ADMIN.to_string()),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
            }
        }

        log::info!("Admin account ensured for {email}");
        Ok(())
    }
}
