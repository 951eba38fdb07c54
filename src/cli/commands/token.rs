use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(
    config: &AppConfig,
    tenant: Uuid,
    user: Option<Uuid>,
    hours: Option<u64>,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let claims = Claims::new(
        tenant,
        user.unwrap_or_else(Uuid::new_v4),
        hours.unwrap_or(config.security.jwt_expiry_hours),
    );
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;

    match output {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => println!(
            "{}",
            json!({
                "token": token,
                "tenant_id": claims.tenant_id,
                "user_id": claims.sub,
                "expires_at": claims.exp,
            })
        ),
    }
    Ok(())
}
