//! Shipping address book routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use bazaar_core::{policy, ShippingAddress};
use bazaar_db::repository::address::NewAddress;
use bazaar_db::DbError;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

fn require_fields(req: &CreateAddressRequest) -> Result<(), ApiError> {
    for (field, value) in [
        ("street", &req.street),
        ("city", &req.city),
        ("state", &req.state),
        ("postal_code", &req.postal_code),
        ("country", &req.country),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::validation(format!("{} is required", field)));
        }
    }
    Ok(())
}

/// `GET /addresses`
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ShippingAddress>>, ApiError> {
    let addresses = state.db.addresses().list_for_user(user.id).await?;
    Ok(Json(addresses))
}

/// `POST /addresses`
///
/// The address book belongs to shoppers; sellers and admins have no
/// checkout destination to record.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<ShippingAddress>), ApiError> {
    policy::ensure_can_manage_addresses(user.role)?;
    require_fields(&req)?;

    let address = state
        .db
        .addresses()
        .create(NewAddress {
            user_id: user.id,
            street: req.street,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
            country: req.country,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(address)))
}

/// `PUT /addresses/:id`
///
/// Orders reference addresses by id, so an edit shows through past
/// orders too; add a new address for a different destination.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<CreateAddressRequest>,
) -> Result<Json<ShippingAddress>, ApiError> {
    policy::ensure_can_manage_addresses(user.role)?;
    require_fields(&req)?;

    let address = state
        .db
        .addresses()
        .update(
            user.id,
            id,
            NewAddress {
                user_id: user.id,
                street: req.street,
                city: req.city,
                state: req.state,
                postal_code: req.postal_code,
                country: req.country,
            },
        )
        .await?;

    Ok(Json(address))
}

/// `DELETE /addresses/:id`
///
/// An address an order references cannot be deleted; orders keep their
/// shipping destination for their lifetime.
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .db
        .addresses()
        .delete(user.id, id)
        .await
        .map_err(|e| match e {
            DbError::ForeignKeyViolation { .. } => {
                ApiError::validation("Address is referenced by an order and cannot be deleted")
            }
            other => ApiError::from(other),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtManager;
    use crate::error::ErrorCode;
    use bazaar_core::Role;
    use bazaar_db::repository::user::NewUser;
    use bazaar_db::{Database, DbConfig};

    async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::new(db, JwtManager::new("test-secret".to_string(), 3600))
    }

    async fn auth_user(state: &AppState, role: Role, email: &str, phone: &str) -> AuthUser {
        let user = state
            .db
            .users()
            .create(NewUser {
                user_name: "Test".to_string(),
                email: email.to_string(),
                phone_number: phone.to_string(),
                password_hash: "hash".to_string(),
                role,
            })
            .await
            .unwrap();
        AuthUser {
            id: user.id,
            role: user.role,
            user,
        }
    }

    fn address_request() -> CreateAddressRequest {
        CreateAddressRequest {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62701".to_string(),
            country: "US".to_string(),
        }
    }

    #[tokio::test]
    async fn test_customer_creates_address() {
        let state = test_state().await;
        let buyer = auth_user(&state, Role::Customer, "buyer@example.com", "0000000001").await;
        let buyer_id = buyer.id;

        let (status, Json(address)) = create(State(state), buyer, Json(address_request()))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(address.user_id, buyer_id);
    }

    #[tokio::test]
    async fn test_seller_cannot_create_address() {
        let state = test_state().await;
        let seller = auth_user(&state, Role::Seller, "seller@example.com", "0000000002").await;

        let err = create(State(state.clone()), seller, Json(address_request()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        // Nothing was written
        assert!(state
            .db
            .addresses()
            .list_for_user(1)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_admin_cannot_edit_addresses() {
        let state = test_state().await;
        let admin = auth_user(&state, Role::Admin, "admin@example.com", "0000000003").await;

        let err = update(State(state), admin, Path(1), Json(address_request()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
