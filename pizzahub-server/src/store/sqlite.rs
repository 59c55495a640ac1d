//! SQLite-based storage implementation
//!
//! Line items, size prices and toppings are stored as JSON text columns.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use pizzahub_core::{OrderStatus, StatusTimeline};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::{
    CatalogStore, EmailVerification, NewOrder, NewPizza, NewUser, Order, OrderId, OrderStore,
    Pizza, PizzaChanges, PizzaId, StoreResult, User, UserId, UserStore,
};
use crate::error::ApiError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, verified, blocked, phone, created_at, updated_at";

const PIZZA_COLUMNS: &str = "id, name, description, image, base_price, sizes, toppings, \
     category, popular, available, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, items, total, payment, address, phone, status, \
     created_at, updated_at, confirmed_at, preparing_at, baking_at, out_for_delivery_at, \
     delivered_at, cancelled_at";

fn storage(e: rusqlite::Error) -> ApiError {
    ApiError::Storage(e.to_string())
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
fn to_sql_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn time_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn optional_time_at(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn uuid_at(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn parsed_at<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_error(idx, e))
}

fn json_at<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| ApiError::Storage(e.to_string()))
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(uuid_at(row, 0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: parsed_at(row, 4)?,
        verified: row.get(5)?,
        blocked: row.get(6)?,
        phone: row.get(7)?,
        created_at: time_at(row, 8)?,
        updated_at: time_at(row, 9)?,
    })
}

fn pizza_from_row(row: &Row) -> rusqlite::Result<Pizza> {
    Ok(Pizza {
        id: PizzaId(uuid_at(row, 0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        image: row.get(3)?,
        base_price: row.get::<_, i64>(4)?.into(),
        sizes: json_at(row, 5)?,
        toppings: json_at(row, 6)?,
        category: parsed_at(row, 7)?,
        popular: row.get(8)?,
        available: row.get(9)?,
        created_at: time_at(row, 10)?,
        updated_at: time_at(row, 11)?,
    })
}

fn order_from_row(row: &Row) -> rusqlite::Result<Order> {
    Ok(Order {
        id: OrderId(uuid_at(row, 0)?),
        user_id: UserId(uuid_at(row, 1)?),
        items: json_at(row, 2)?,
        total: row.get(3)?,
        payment: row.get(4)?,
        address: row.get(5)?,
        phone: row.get(6)?,
        status: parsed_at(row, 7)?,
        created_at: time_at(row, 8)?,
        updated_at: time_at(row, 9)?,
        timeline: StatusTimeline {
            confirmed_at: optional_time_at(row, 10)?,
            preparing_at: optional_time_at(row, 11)?,
            baking_at: optional_time_at(row, 12)?,
            out_for_delivery_at: optional_time_at(row, 13)?,
            delivered_at: optional_time_at(row, 14)?,
            cancelled_at: optional_time_at(row, 15)?,
        },
    })
}

/// SQLite-based store implementing every store trait
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, ApiError> {
        let conn = Connection::open(path).map_err(storage)?;
        Self::init(conn)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self, ApiError> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, ApiError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(storage)?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ApiError::Storage("sqlite connection lock poisoned".to_string()))
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), ApiError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(storage)?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ApiError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master \
                 WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(storage)?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(storage)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), ApiError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'USER',
                verified INTEGER NOT NULL DEFAULT 0,
                blocked INTEGER NOT NULL DEFAULT 0,
                phone TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- One live code per email
            CREATE TABLE IF NOT EXISTS email_verifications (
                email TEXT PRIMARY KEY,
                code_hash TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pizzas (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                image TEXT,
                base_price INTEGER NOT NULL DEFAULT 0,
                sizes TEXT NOT NULL DEFAULT '{}',
                toppings TEXT NOT NULL DEFAULT '[]',
                category TEXT NOT NULL DEFAULT 'veg',
                popular INTEGER NOT NULL DEFAULT 0,
                available INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                items TEXT NOT NULL,
                total INTEGER NOT NULL,
                payment TEXT,
                address TEXT NOT NULL,
                phone TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                confirmed_at TEXT,
                preparing_at TEXT,
                baking_at TEXT,
                out_for_delivery_at TEXT,
                delivered_at TEXT,
                cancelled_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_orders_user_created ON orders(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_orders_created ON orders(created_at);
            "#,
        )
        .map_err(storage)?;

        Ok(())
    }

    fn query_order(conn: &Connection, order_id: OrderId) -> StoreResult<Option<Order>> {
        conn.query_row(
            &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS),
            params![order_id.to_string()],
            order_from_row,
        )
        .optional()
        .map_err(storage)
    }

    fn query_pizza(conn: &Connection, pizza_id: PizzaId) -> StoreResult<Option<Pizza>> {
        conn.query_row(
            &format!("SELECT {} FROM pizzas WHERE id = ?1", PIZZA_COLUMNS),
            params![pizza_id.to_string()],
            pizza_from_row,
        )
        .optional()
        .map_err(storage)
    }

    fn query_user(conn: &Connection, user_id: UserId) -> StoreResult<Option<User>> {
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![user_id.to_string()],
            user_from_row,
        )
        .optional()
        .map_err(storage)
    }

    fn query_orders<P: rusqlite::Params>(
        conn: &Connection,
        sql: &str,
        params: P,
    ) -> StoreResult<Vec<Order>> {
        let mut stmt = conn.prepare(sql).map_err(storage)?;
        let orders = stmt
            .query_map(params, order_from_row)
            .map_err(storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;
        Ok(orders)
    }
}

impl UserStore for SqliteStore {
    fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let conn = self.conn()?;
        let now = Utc::now();
        let id = UserId::new();

        conn.execute(
            &format!(
                "INSERT INTO users ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?8)",
                USER_COLUMNS
            ),
            params![
                id.to_string(),
                user.name,
                user.email,
                user.password_hash,
                user.role.as_str(),
                user.verified,
                user.phone,
                to_sql_time(&now),
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return ApiError::EmailInUse;
                }
            }
            storage(e)
        })?;

        Self::query_user(&conn, id)?
            .ok_or_else(|| ApiError::Storage("user vanished after insert".to_string()))
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        Self::query_user(&conn, user_id)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.conn()?;

        conn.query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(storage)
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM users ORDER BY created_at ASC, rowid ASC",
                USER_COLUMNS
            ))
            .map_err(storage)?;

        let users = stmt
            .query_map([], user_from_row)
            .map_err(storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;

        Ok(users)
    }

    fn mark_verified(&self, email: &str) -> StoreResult<()> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                "UPDATE users SET verified = 1, updated_at = ?1 WHERE email = ?2",
                params![to_sql_time(&Utc::now()), email],
            )
            .map_err(storage)?;

        if rows_affected == 0 {
            return Err(ApiError::UnknownEmail);
        }

        Ok(())
    }

    fn set_blocked(&self, user_id: UserId, blocked: bool) -> StoreResult<Option<User>> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                "UPDATE users SET blocked = ?1, updated_at = ?2 WHERE id = ?3",
                params![blocked, to_sql_time(&Utc::now()), user_id.to_string()],
            )
            .map_err(storage)?;

        if rows_affected == 0 {
            return Ok(None);
        }

        Self::query_user(&conn, user_id)
    }

    fn upsert_verification(&self, verification: EmailVerification) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO email_verifications (email, code_hash, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO UPDATE SET code_hash = excluded.code_hash,
                                              expires_at = excluded.expires_at",
            params![
                verification.email,
                verification.code_hash,
                to_sql_time(&verification.expires_at),
            ],
        )
        .map_err(storage)?;

        Ok(())
    }

    fn get_verification(&self, email: &str) -> StoreResult<Option<EmailVerification>> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT email, code_hash, expires_at FROM email_verifications WHERE email = ?1",
            params![email],
            |row| {
                Ok(EmailVerification {
                    email: row.get(0)?,
                    code_hash: row.get(1)?,
                    expires_at: time_at(row, 2)?,
                })
            },
        )
        .optional()
        .map_err(storage)
    }

    fn delete_verification(&self, email: &str) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            "DELETE FROM email_verifications WHERE email = ?1",
            params![email],
        )
        .map_err(storage)?;

        Ok(())
    }
}

impl CatalogStore for SqliteStore {
    fn create_pizza(&self, pizza: NewPizza) -> StoreResult<Pizza> {
        let conn = self.conn()?;
        let id = PizzaId::new();
        let now = to_sql_time(&Utc::now());

        conn.execute(
            &format!(
                "INSERT INTO pizzas ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                PIZZA_COLUMNS
            ),
            params![
                id.to_string(),
                pizza.name,
                pizza.description,
                pizza.image,
                pizza.base_price.amount(),
                to_json(&pizza.sizes)?,
                to_json(&pizza.toppings)?,
                pizza.category.as_str(),
                pizza.popular,
                pizza.available,
                now,
            ],
        )
        .map_err(storage)?;

        Self::query_pizza(&conn, id)?
            .ok_or_else(|| ApiError::Storage("pizza vanished after insert".to_string()))
    }

    fn get_pizza(&self, pizza_id: PizzaId) -> StoreResult<Option<Pizza>> {
        let conn = self.conn()?;
        Self::query_pizza(&conn, pizza_id)
    }

    fn list_pizzas(&self, available_only: bool) -> StoreResult<Vec<Pizza>> {
        let conn = self.conn()?;

        let sql = if available_only {
            format!(
                "SELECT {} FROM pizzas WHERE available = 1 ORDER BY created_at ASC, rowid ASC",
                PIZZA_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM pizzas ORDER BY created_at ASC, rowid ASC",
                PIZZA_COLUMNS
            )
        };

        let mut stmt = conn.prepare(&sql).map_err(storage)?;
        let pizzas = stmt
            .query_map([], pizza_from_row)
            .map_err(storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;

        Ok(pizzas)
    }

    fn update_pizza(&self, pizza_id: PizzaId, changes: PizzaChanges) -> StoreResult<Option<Pizza>> {
        let conn = self.conn()?;

        let Some(mut pizza) = Self::query_pizza(&conn, pizza_id)? else {
            return Ok(None);
        };
        changes.apply(&mut pizza, Utc::now());

        conn.execute(
            "UPDATE pizzas SET name = ?1, description = ?2, image = ?3, base_price = ?4,
                    sizes = ?5, toppings = ?6, category = ?7, popular = ?8, available = ?9,
                    updated_at = ?10
             WHERE id = ?11",
            params![
                pizza.name,
                pizza.description,
                pizza.image,
                pizza.base_price.amount(),
                to_json(&pizza.sizes)?,
                to_json(&pizza.toppings)?,
                pizza.category.as_str(),
                pizza.popular,
                pizza.available,
                to_sql_time(&pizza.updated_at),
                pizza_id.to_string(),
            ],
        )
        .map_err(storage)?;

        Ok(Some(pizza))
    }

    fn delete_pizza(&self, pizza_id: PizzaId) -> StoreResult<bool> {
        let conn = self.conn()?;

        let rows_deleted = conn
            .execute(
                "DELETE FROM pizzas WHERE id = ?1",
                params![pizza_id.to_string()],
            )
            .map_err(storage)?;

        Ok(rows_deleted > 0)
    }
}

impl OrderStore for SqliteStore {
    fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        let conn = self.conn()?;
        let id = OrderId::new();
        let now = to_sql_time(&Utc::now());

        conn.execute(
            "INSERT INTO orders (id, user_id, items, total, payment, address, phone, status,
                                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                id.to_string(),
                order.user_id.to_string(),
                to_json(&order.items)?,
                order.total,
                order.payment,
                order.address,
                order.phone,
                OrderStatus::Pending.as_str(),
                now,
            ],
        )
        .map_err(storage)?;

        Self::query_order(&conn, id)?
            .ok_or_else(|| ApiError::Storage("order vanished after insert".to_string()))
    }

    fn get_order(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        let conn = self.conn()?;
        Self::query_order(&conn, order_id)
    }

    fn list_orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        let conn = self.conn()?;
        Self::query_orders(
            &conn,
            &format!(
                "SELECT {} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
                ORDER_COLUMNS
            ),
            params![user_id.to_string()],
        )
    }

    fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let conn = self.conn()?;
        Self::query_orders(
            &conn,
            &format!(
                "SELECT {} FROM orders ORDER BY created_at DESC, rowid DESC",
                ORDER_COLUMNS
            ),
            [],
        )
    }

    fn record_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        timeline: &StatusTimeline,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Order>> {
        let conn = self.conn()?;
        let stamp = |t: Option<DateTime<Utc>>| t.as_ref().map(to_sql_time);

        let rows_affected = conn
            .execute(
                "UPDATE orders SET status = ?1, updated_at = ?2,
                        confirmed_at = COALESCE(confirmed_at, ?3),
                        preparing_at = COALESCE(preparing_at, ?4),
                        baking_at = COALESCE(baking_at, ?5),
                        out_for_delivery_at = COALESCE(out_for_delivery_at, ?6),
                        delivered_at = COALESCE(delivered_at, ?7),
                        cancelled_at = COALESCE(cancelled_at, ?8)
                 WHERE id = ?9",
                params![
                    status.as_str(),
                    to_sql_time(&at),
                    stamp(timeline.confirmed_at),
                    stamp(timeline.preparing_at),
                    stamp(timeline.baking_at),
                    stamp(timeline.out_for_delivery_at),
                    stamp(timeline.delivered_at),
                    stamp(timeline.cancelled_at),
                    order_id.to_string(),
                ],
            )
            .map_err(storage)?;

        if rows_affected == 0 {
            return Ok(None);
        }

        Self::query_order(&conn, order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pizzahub_core::Role;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
        (store, dir) // Return dir to keep it alive
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hashed_password".to_string(),
            phone: Some("555-0100".to_string()),
            role: Role::User,
            verified: false,
        }
    }

    #[test]
    fn test_create_and_fetch_user() {
        let (store, _dir) = create_test_store();

        let user = store.create_user(new_user("test@example.com")).unwrap();
        let fetched = store.get_user_by_email("test@example.com").unwrap().unwrap();

        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.role, Role::User);
        assert!(!fetched.verified);
        assert!(!fetched.blocked);
        assert_eq!(fetched.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (store, _dir) = create_test_store();

        store.create_user(new_user("test@example.com")).unwrap();
        let result = store.create_user(new_user("test@example.com"));
        assert!(matches!(result, Err(ApiError::EmailInUse)));
    }

    #[test]
    fn test_mark_verified_and_block() {
        let (store, _dir) = create_test_store();

        let user = store.create_user(new_user("test@example.com")).unwrap();
        store.mark_verified("test@example.com").unwrap();
        let blocked = store.set_blocked(user.id, true).unwrap().unwrap();

        assert!(blocked.verified);
        assert!(blocked.blocked);
        assert!(store.set_blocked(UserId::new(), true).unwrap().is_none());
        assert!(matches!(
            store.mark_verified("nobody@example.com"),
            Err(ApiError::UnknownEmail)
        ));
    }

    #[test]
    fn test_verification_upsert() {
        let (store, _dir) = create_test_store();
        let now = Utc::now();

        store
            .upsert_verification(EmailVerification::issue("a@x.com", "first".into(), now))
            .unwrap();
        store
            .upsert_verification(EmailVerification::issue("a@x.com", "second".into(), now))
            .unwrap();

        let count: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM email_verifications", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let v = store.get_verification("a@x.com").unwrap().unwrap();
        assert_eq!(v.code_hash, "second");
    }

    fn new_order(user_id: UserId) -> NewOrder {
        NewOrder {
            user_id,
            items: serde_json::from_value(serde_json::json!([
                {"name": "Margherita", "price": 299, "quantity": 2, "crust": "thin"}
            ]))
            .unwrap(),
            total: 598,
            payment: None,
            address: "1 Main St".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    #[test]
    fn test_order_roundtrip_and_ordering() {
        let (store, _dir) = create_test_store();
        let user = store.create_user(new_user("test@example.com")).unwrap();

        let first = store.create_order(new_order(user.id)).unwrap();
        let second = store.create_order(new_order(user.id)).unwrap();

        assert_eq!(first.status, OrderStatus::Pending);
        assert_eq!(first.items[0].extra["crust"], "thin");
        assert_eq!(first.timeline, StatusTimeline::default());

        let mine = store.list_orders_for_user(user.id).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, second.id);
        assert_eq!(store.list_orders().unwrap()[1].id, first.id);
    }

    #[test]
    fn test_record_status_never_overwrites_stamps() {
        let (store, _dir) = create_test_store();
        let user = store.create_user(new_user("test@example.com")).unwrap();
        let order = store.create_order(new_order(user.id)).unwrap();
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::minutes(5);

        let confirmed = store
            .record_status(
                order.id,
                OrderStatus::Confirmed,
                &StatusTimeline {
                    confirmed_at: Some(t0),
                    ..Default::default()
                },
                t0,
            )
            .unwrap()
            .unwrap();
        let stored_t0 = confirmed.timeline.confirmed_at;
        assert!(stored_t0.is_some());

        let again = store
            .record_status(
                order.id,
                OrderStatus::Confirmed,
                &StatusTimeline {
                    confirmed_at: Some(t1),
                    baking_at: Some(t1),
                    ..Default::default()
                },
                t1,
            )
            .unwrap()
            .unwrap();

        assert_eq!(again.timeline.confirmed_at, stored_t0);
        assert!(again.timeline.baking_at.is_some());
        assert!(again.timeline.delivered_at.is_none());
        assert!(store
            .record_status(OrderId::new(), OrderStatus::Baking, &StatusTimeline::default(), t1)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_pizza_crud() {
        let (store, _dir) = create_test_store();

        let pizza = store
            .create_pizza(
                NewPizza {
                    name: "Margherita".to_string(),
                    description: String::new(),
                    image: None,
                    base_price: 299.into(),
                    sizes: Default::default(),
                    toppings: vec!["Basil".to_string()],
                    category: Default::default(),
                    popular: true,
                    available: true,
                }
                .with_complete_sizes(),
            )
            .unwrap();
        assert_eq!(pizza.sizes.len(), 3);
        assert_eq!(pizza.toppings, vec!["Basil".to_string()]);

        let updated = store
            .update_pizza(
                pizza.id,
                PizzaChanges {
                    available: Some(false),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert!(!updated.available);

        assert!(store.list_pizzas(true).unwrap().is_empty());
        assert_eq!(store.list_pizzas(false).unwrap().len(), 1);
        assert!(store.get_pizza(pizza.id).unwrap().is_some());

        assert!(store.delete_pizza(pizza.id).unwrap());
        assert!(!store.delete_pizza(pizza.id).unwrap());
        assert!(store
            .update_pizza(pizza.id, PizzaChanges::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_reopen_keeps_schema_and_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::open(path).unwrap();
            store.create_user(new_user("keep@example.com")).unwrap();
        }

        let store = SqliteStore::open(path).unwrap();
        assert!(store.get_user_by_email("keep@example.com").unwrap().is_some());
    }
}
