use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Opts, Params, Pool, Row, Value};

use normform_sql::clause::SqlValue;
use normform_sql::error::SqlError;
use normform_sql::executor::{Executor, QueryResult, Transaction};

/// The live `Executor` this service dispatches through: a process-wide
/// `mysql_async::Pool`, cloned per request (cloning a pool is cheap, it is
/// itself a handle to shared internal state), with scoped connection
/// acquisition on every call.
pub struct MySqlExecutor {
    pool: Pool,
}

impl MySqlExecutor {
    pub fn new(database_url: &str) -> Result<Self, SqlError> {
        let opts = Opts::from_url(database_url).map_err(|e| SqlError::ConnectionFailure(e.to_string()))?;
        Ok(MySqlExecutor { pool: Pool::new(opts) })
    }
}

fn to_mysql_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Bool(b) => Value::Int(if *b { 1 } else { 0 }),
        SqlValue::Int(i) => Value::Int(*i),
        SqlValue::Float(f) => Value::Double(*f),
        SqlValue::Text(s) => Value::Bytes(s.clone().into_bytes()),
    }
}

fn to_params(values: &[SqlValue]) -> Params {
    if values.is_empty() {
        Params::Empty
    } else {
        Params::Positional(values.iter().map(to_mysql_value).collect())
    }
}

fn from_mysql_value(value: &Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Int(i) => SqlValue::Int(*i),
        Value::UInt(u) => SqlValue::Int(*u as i64),
        Value::Float(f) => SqlValue::Float(*f as f64),
        Value::Double(d) => SqlValue::Float(*d),
        Value::Bytes(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        other => SqlValue::Text(format!("{other:?}")),
    }
}

fn row_to_values(row: Row) -> Vec<SqlValue> {
    (0..row.len())
        .map(|i| row.as_ref(i).map(from_mysql_value).unwrap_or(SqlValue::Null))
        .collect()
}

fn map_mysql_error(err: mysql_async::Error, sql_attempted: &str) -> SqlError {
    match err {
        mysql_async::Error::Server(server_err) => {
            SqlError::database(server_err.code, server_err.message.clone(), Some(sql_attempted.to_string()))
        }
        other => SqlError::ConnectionFailure(other.to_string()),
    }
}

async fn run_query(conn: &mut mysql_async::Conn, sql: &str, params: &[SqlValue]) -> Result<QueryResult, SqlError> {
    let mut result = conn
        .exec_iter(sql, to_params(params))
        .await
        .map_err(|e| map_mysql_error(e, sql))?;

    let columns: Vec<String> = result
        .columns()
        .map(|cols| cols.iter().map(|c| c.name_str().into_owned()).collect())
        .unwrap_or_default();

    let raw_rows: Vec<Row> = result.collect().await.map_err(|e| map_mysql_error(e, sql))?;
    let rows = raw_rows.into_iter().map(row_to_values).collect();

    Ok(QueryResult { columns, rows })
}

async fn run_execute(conn: &mut mysql_async::Conn, sql: &str, params: &[SqlValue]) -> Result<u64, SqlError> {
    conn.exec_drop(sql, to_params(params)).await.map_err(|e| map_mysql_error(e, sql))?;
    Ok(conn.affected_rows())
}

#[async_trait]
impl Executor for MySqlExecutor {
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult, SqlError> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| SqlError::ConnectionFailure(e.to_string()))?;
        run_query(&mut conn, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, SqlError> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| SqlError::ConnectionFailure(e.to_string()))?;
        run_execute(&mut conn, sql, params).await
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, SqlError> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| SqlError::ConnectionFailure(e.to_string()))?;
        conn.query_drop("START TRANSACTION;")
            .await
            .map_err(|e| map_mysql_error(e, "START TRANSACTION;"))?;
        Ok(Box::new(MySqlTransaction { conn: Some(conn) }))
    }
}

/// A scoped transaction over a single checked-out connection. `COMMIT`/
/// `ROLLBACK` are issued as plain statements rather than through a borrowed
/// `mysql_async::Transaction<'_>`, so the handle can be owned and boxed
/// behind the `Transaction` trait object the orchestrator needs.
pub struct MySqlTransaction {
    conn: Option<mysql_async::Conn>,
}

impl MySqlTransaction {
    fn conn_mut(&mut self) -> &mut mysql_async::Conn {
        self.conn.as_mut().expect("transaction used after commit/rollback")
    }
}

#[async_trait]
impl Transaction for MySqlTransaction {
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<QueryResult, SqlError> {
        run_query(self.conn_mut(), sql, params).await
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, SqlError> {
        run_execute(self.conn_mut(), sql, params).await
    }

    async fn commit(mut self: Box<Self>) -> Result<(), SqlError> {
        let mut conn = self.conn.take().expect("transaction used after commit/rollback");
        conn.query_drop("COMMIT;").await.map_err(|e| map_mysql_error(e, "COMMIT;"))
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), SqlError> {
        let mut conn = self.conn.take().expect("transaction used after commit/rollback");
        conn.query_drop("ROLLBACK;").await.map_err(|e| map_mysql_error(e, "ROLLBACK;"))
    }
}
