//! PostgreSQL implementation of UserRecordStore.
//!
//! One row per identity in `user_billing_records`, keyed by
//! (identity_kind, identity_value). Updates are built dynamically so a
//! patch only touches the columns it names.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::billing::{Platform, RecordPatch, UserBillingRecord, UserIdentity};
use crate::ports::{StoreError, UpdateOutcome, UserRecordStore};

/// PostgreSQL implementation of the UserRecordStore port.
pub struct PostgresUserRecordStore {
    pool: PgPool,
}

impl PostgresUserRecordStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a billing record.
#[derive(Debug, sqlx::FromRow)]
struct BillingRecordRow {
    identity_kind: String,
    identity_value: String,
    is_premium: bool,
    current_period_end: Option<chrono::DateTime<chrono::Utc>>,
    provider_customer_id: Option<String>,
    provider_subscription_id: Option<String>,
    grace_until: Option<chrono::DateTime<chrono::Utc>>,
    platform: String,
}

impl TryFrom<BillingRecordRow> for UserBillingRecord {
    type Error = StoreError;

    fn try_from(row: BillingRecordRow) -> Result<Self, Self::Error> {
        let identity = parse_identity(&row.identity_kind, row.identity_value)?;
        let platform = Platform::parse(&row.platform).ok_or_else(|| {
            StoreError::Database(format!("Invalid platform value: {}", row.platform))
        })?;

        Ok(UserBillingRecord {
            identity,
            is_premium: row.is_premium,
            current_period_end: row.current_period_end,
            provider_customer_id: row.provider_customer_id,
            provider_subscription_id: row.provider_subscription_id,
            grace_until: row.grace_until,
            platform,
        })
    }
}

fn parse_identity(kind: &str, value: String) -> Result<UserIdentity, StoreError> {
    match kind {
        "email" => Ok(UserIdentity::Email(value)),
        "external_token" => Ok(UserIdentity::ExternalToken(value)),
        _ => Err(StoreError::Database(format!(
            "Invalid identity_kind value: {}",
            kind
        ))),
    }
}

fn identity_kind(identity: &UserIdentity) -> &'static str {
    match identity {
        UserIdentity::Email(_) => "email",
        UserIdentity::ExternalToken(_) => "external_token",
    }
}

const SELECT_COLUMNS: &str = "identity_kind, identity_value, is_premium, current_period_end, \
     provider_customer_id, provider_subscription_id, grace_until, platform";

#[async_trait]
impl UserRecordStore for PostgresUserRecordStore {
    async fn find_by_identity(
        &self,
        identity: &UserIdentity,
    ) -> Result<Option<UserBillingRecord>, StoreError> {
        let row: Option<BillingRecordRow> = sqlx::query_as(&format!(
            "SELECT {} FROM user_billing_records WHERE identity_kind = $1 AND identity_value = $2",
            SELECT_COLUMNS
        ))
        .bind(identity_kind(identity))
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to find record: {}", e)))?;

        row.map(UserBillingRecord::try_from).transpose()
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserBillingRecord>, StoreError> {
        let row: Option<BillingRecordRow> = sqlx::query_as(&format!(
            "SELECT {} FROM user_billing_records WHERE provider_customer_id = $1",
            SELECT_COLUMNS
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to find record by customer: {}", e)))?;

        row.map(UserBillingRecord::try_from).transpose()
    }

    async fn update(
        &self,
        identity: &UserIdentity,
        patch: &RecordPatch,
    ) -> Result<UpdateOutcome, StoreError> {
        if patch.is_empty() {
            // Nothing to write; report based on existence alone
            return Ok(match self.find_by_identity(identity).await? {
                Some(_) => UpdateOutcome::Updated,
                None => UpdateOutcome::NotFound,
            });
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE user_billing_records SET updated_at = NOW()");

        if let Some(is_premium) = patch.is_premium {
            builder.push(", is_premium = ").push_bind(is_premium);
        }
        if let Some(period_end) = patch.current_period_end {
            builder.push(", current_period_end = ").push_bind(period_end);
        }
        if let Some(customer_id) = &patch.provider_customer_id {
            builder
                .push(", provider_customer_id = ")
                .push_bind(customer_id.clone());
        }
        if let Some(subscription_id) = &patch.provider_subscription_id {
            builder
                .push(", provider_subscription_id = ")
                .push_bind(subscription_id.clone());
        }
        if let Some(grace_until) = patch.grace_until {
            builder.push(", grace_until = ").push_bind(grace_until);
        }
        if let Some(platform) = patch.platform {
            builder.push(", platform = ").push_bind(platform.as_str());
        }

        builder
            .push(" WHERE identity_kind = ")
            .push_bind(identity_kind(identity))
            .push(" AND identity_value = ")
            .push_bind(identity.as_str());

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to update record: {}", e)))?;

        if result.rows_affected() == 0 {
            return Ok(UpdateOutcome::NotFound);
        }

        Ok(UpdateOutcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_identity_works_for_both_kinds() {
        assert_eq!(
            parse_identity("email", "a@b.com".to_string()).unwrap(),
            UserIdentity::Email("a@b.com".to_string())
        );
        assert_eq!(
            parse_identity("external_token", "tok_1".to_string()).unwrap(),
            UserIdentity::ExternalToken("tok_1".to_string())
        );
    }

    #[test]
    fn parse_identity_rejects_unknown_kind() {
        assert!(parse_identity("phone", "555".to_string()).is_err());
    }

    #[test]
    fn identity_kind_roundtrip() {
        for identity in [
            UserIdentity::email("a@b.com"),
            UserIdentity::external_token("tok"),
        ] {
            let kind = identity_kind(&identity);
            let parsed = parse_identity(kind, identity.as_str().to_string()).unwrap();
            assert_eq!(parsed, identity);
        }
    }

    #[test]
    fn row_conversion_rejects_bad_platform() {
        let row = BillingRecordRow {
            identity_kind: "email".to_string(),
            identity_value: "a@b.com".to_string(),
            is_premium: true,
            current_period_end: None,
            provider_customer_id: None,
            provider_subscription_id: None,
            grace_until: None,
            platform: "playstation".to_string(),
        };
        assert!(UserBillingRecord::try_from(row).is_err());
    }

    #[test]
    fn row_conversion_maps_all_fields() {
        let row = BillingRecordRow {
            identity_kind: "external_token".to_string(),
            identity_value: "tok_42".to_string(),
            is_premium: true,
            current_period_end: None,
            provider_customer_id: Some("cus_1".to_string()),
            provider_subscription_id: Some("sub_1".to_string()),
            grace_until: None,
            platform: "apple_iap".to_string(),
        };

        let record = UserBillingRecord::try_from(row).unwrap();

        assert_eq!(record.identity, UserIdentity::external_token("tok_42"));
        assert!(record.is_premium);
        assert_eq!(record.provider_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(record.platform, Platform::AppleIap);
    }
}
