//! Route handlers for creating, listing, reading and deleting categories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    AppState, Error, User,
    category::{
        Category, CategoryId, CategoryName, create_category, delete_category, get_categories,
        get_category,
    },
    db::lock_connection,
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryData {
    pub name: String,
}

/// Create a category owned by the calling user.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user): Extension<User>,
    Json(data): Json<CategoryData>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let name = CategoryName::new(&data.name)?;
    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(name, user.id, &connection)?;

    tracing::debug!("user {} created category {}", user.id, category.id);

    Ok((StatusCode::CREATED, Json(category)))
}

/// List the calling user's categories.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_categories(user.id, &connection).map(Json)
}

/// Get one of the calling user's categories.
pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user): Extension<User>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_category(category_id, user.id, &connection).map(Json)
}

/// Delete one of the calling user's categories.
///
/// Expenses in the category are kept and become uncategorized.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user): Extension<User>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let category = delete_category(category_id, user.id, &connection)?;

    tracing::info!("user {} deleted category {}", user.id, category.id);

    Ok(Json(json!({
        "message": format!("Deleted {} category", category.name)
    })))
}

#[cfg(test)]
mod category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash, User,
        category::{CategoryName, create_category, get_categories},
        db::initialize,
        user::{Username, create_user, parse_email},
    };

    use super::{
        CategoryData, CategoryState, create_category_endpoint, delete_category_endpoint,
        get_categories_endpoint, get_category_endpoint,
    };

    fn get_test_state() -> (CategoryState, User, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let alice = create_user(
            Username::new_unchecked("alice"),
            parse_email("a@x.com").unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let bob = create_user(
            Username::new_unchecked("bob"),
            parse_email("b@x.com").unwrap(),
            PasswordHash::new_unchecked("hunter3"),
            &connection,
        )
        .unwrap();

        let state = CategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, alice, bob)
    }

    #[tokio::test]
    async fn create_category_trims_name() {
        let (state, alice, _) = get_test_state();

        let (status, Json(category)) = create_category_endpoint(
            State(state.clone()),
            Extension(alice),
            Json(CategoryData {
                name: "  Food ".to_owned(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(category.name.as_ref(), "Food");
    }

    #[tokio::test]
    async fn create_category_rejects_blank_name() {
        let (state, alice, _) = get_test_state();

        let result = create_category_endpoint(
            State(state.clone()),
            Extension(alice.clone()),
            Json(CategoryData {
                name: "   ".to_owned(),
            }),
        )
        .await;

        assert_eq!(result.err(), Some(Error::EmptyCategoryName));
        let categories = get_categories(alice.id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(categories.is_empty());
    }

    #[tokio::test]
    async fn list_categories_only_shows_own() {
        let (state, alice, bob) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_category(CategoryName::new_unchecked("Food"), alice.id, &connection).unwrap();
            create_category(CategoryName::new_unchecked("Rent"), bob.id, &connection).unwrap();
        }

        let Json(categories) = get_categories_endpoint(State(state), Extension(alice))
            .await
            .unwrap();

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name.as_ref(), "Food");
    }

    #[tokio::test]
    async fn get_category_of_other_user_is_not_found() {
        let (state, alice, bob) = get_test_state();
        let category = create_category(
            CategoryName::new_unchecked("Food"),
            alice.id,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let result =
            get_category_endpoint(State(state), Extension(bob), Path(category.id)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn delete_category_returns_message() {
        let (state, alice, _) = get_test_state();
        let category = create_category(
            CategoryName::new_unchecked("Food"),
            alice.id,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let Json(body) = delete_category_endpoint(
            State(state.clone()),
            Extension(alice.clone()),
            Path(category.id),
        )
        .await
        .unwrap();

        assert_eq!(body["message"], "Deleted Food category");
        let result =
            get_category_endpoint(State(state), Extension(alice), Path(category.id)).await;
        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn delete_category_of_other_user_is_not_found() {
        let (state, alice, bob) = get_test_state();
        let category = create_category(
            CategoryName::new_unchecked("Food"),
            alice.id,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let result =
            delete_category_endpoint(State(state.clone()), Extension(bob), Path(category.id)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
        let categories = get_categories(alice.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(categories, vec![category]);
    }
}
