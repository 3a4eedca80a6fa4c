//! SQLite-backed order store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{CreateOrderRequest, Order, OrderError, OrderFilter, OrderItem, OrderStatus, OrderStore};

/// SQLite-backed order store.
pub struct SqliteOrderStore {
    conn: Mutex<Connection>,
}

impl SqliteOrderStore {
    /// Create a new SQLite order store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, OrderError> {
        let conn = Connection::open(path).map_err(|e| OrderError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite order store (useful for testing).
    pub fn in_memory() -> Result<Self, OrderError> {
        let conn =
            Connection::open_in_memory().map_err(|e| OrderError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), OrderError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                customer_name TEXT NOT NULL,
                item TEXT NOT NULL,
                status TEXT NOT NULL,
                price_cents INTEGER NOT NULL,
                estimated_time TEXT NOT NULL,
                created_at TEXT NOT NULL,
                queued_at TEXT NOT NULL,
                processed_at TEXT,
                completed_at TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
            CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_name);
            CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders(created_at);
            "#,
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &OrderFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }

        if let Some(ref customer_name) = filter.customer_name {
            conditions.push("customer_name = ?");
            params.push(Box::new(customer_name.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_order(row: &rusqlite::Row) -> rusqlite::Result<Order> {
        let id: String = row.get(0)?;
        let customer_name: String = row.get(1)?;
        let item_json: String = row.get(2)?;
        let status_str: String = row.get(3)?;
        let price_cents: i64 = row.get(4)?;
        let estimated_time: String = row.get(5)?;
        let created_at_str: String = row.get(6)?;
        let queued_at_str: String = row.get(7)?;
        let processed_at_str: Option<String> = row.get(8)?;
        let completed_at_str: Option<String> = row.get(9)?;
        let updated_at_str: String = row.get(10)?;

        let item: OrderItem =
            serde_json::from_str(&item_json).unwrap_or_else(|_| OrderItem::new("unknown", "unknown"));

        let status = OrderStatus::parse(&status_str).unwrap_or(OrderStatus::Pending);

        Ok(Order {
            id,
            customer_name,
            item,
            status,
            price_cents,
            estimated_time,
            created_at: parse_timestamp(&created_at_str),
            queued_at: parse_timestamp(&queued_at_str),
            processed_at: processed_at_str.as_deref().map(parse_timestamp),
            completed_at: completed_at_str.as_deref().map(parse_timestamp),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }
}

const SELECT_COLUMNS: &str = "id, customer_name, item, status, price_cents, estimated_time, created_at, queued_at, processed_at, completed_at, updated_at";

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl OrderStore for SqliteOrderStore {
    fn create(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let item_json = serde_json::to_string(&request.item)
            .map_err(|e| OrderError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO orders (id, customer_name, item, status, price_cents, estimated_time, created_at, queued_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.customer_name,
                item_json,
                OrderStatus::Pending.as_str(),
                request.price_cents,
                request.estimated_time,
                now.to_rfc3339(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        Ok(Order {
            id,
            customer_name: request.customer_name,
            item: request.item,
            status: OrderStatus::Pending,
            price_cents: request.price_cents,
            estimated_time: request.estimated_time,
            created_at: now,
            queued_at: now,
            processed_at: None,
            completed_at: None,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Order>, OrderError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {} FROM orders WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_order,
        );

        match result {
            Ok(order) => Ok(Some(order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(OrderError::Database(e.to_string())),
        }
    }

    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM orders {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| OrderError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_order)
            .map_err(|e| OrderError::Database(e.to_string()))?;

        let mut orders = Vec::new();
        for row_result in rows {
            let order = row_result.map_err(|e| OrderError::Database(e.to_string()))?;
            orders.push(order);
        }

        Ok(orders)
    }

    fn count(&self, filter: &OrderFilter) -> Result<i64, OrderError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM orders {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| OrderError::Database(e.to_string()))?;

        Ok(count)
    }

    fn begin_preparing(&self, id: &str, now: DateTime<Utc>) -> Result<Order, OrderError> {
        {
            let conn = self.conn.lock().unwrap();

            // A completed order is never pulled back into preparing; the
            // caller sees the untouched record and skips the redelivery.
            conn.execute(
                "UPDATE orders SET status = 'preparing', processed_at = COALESCE(processed_at, ?1), updated_at = ?1 WHERE id = ?2 AND status != 'completed'",
                params![now.to_rfc3339(), id],
            )
            .map_err(|e| OrderError::Database(e.to_string()))?;
        }

        self.get(id)?.ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    fn complete(&self, id: &str, now: DateTime<Utc>) -> Result<bool, OrderError> {
        let changed = {
            let conn = self.conn.lock().unwrap();

            conn.execute(
                "UPDATE orders SET status = 'completed', completed_at = ?1, updated_at = ?1 WHERE id = ?2 AND status IN ('pending', 'preparing')",
                params![now.to_rfc3339(), id],
            )
            .map_err(|e| OrderError::Database(e.to_string()))?
        };

        if changed == 1 {
            return Ok(true);
        }

        // Distinguish "already past preparing" from a missing record.
        match self.get(id)? {
            Some(_) => Ok(false),
            None => Err(OrderError::NotFound(id.to_string())),
        }
    }

    fn cancel(&self, id: &str, now: DateTime<Utc>) -> Result<Order, OrderError> {
        {
            let conn = self.conn.lock().unwrap();

            conn.execute(
                "UPDATE orders SET status = 'cancelled', updated_at = ?1 WHERE id = ?2 AND status != 'completed'",
                params![now.to_rfc3339(), id],
            )
            .map_err(|e| OrderError::Database(e.to_string()))?;
        }

        self.get(id)?.ok_or_else(|| OrderError::NotFound(id.to_string()))
    }
}
