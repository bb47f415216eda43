//! `MySQL` pool construction and statement execution.

use std::sync::Arc;

use ::mysql::prelude::Queryable;
use ::mysql::{Opts, OptsBuilder, Params, Pool, PoolConstraints, PoolOpts, PooledConn};
use effinova_settings::MySqlSettings;
use tracing::info;

use crate::errors::{Result, StoreError};
use crate::value::{Row, Value};

/// Character set id of binary (non-text) columns.
const BINARY_CHARSET: u16 = 63;

/// Build a pool from settings. Every session runs `SET NAMES` first, and
/// `SET autocommit = 0` when autocommit is disabled.
pub(crate) fn new_pool(settings: &MySqlSettings) -> Result<Pool> {
    let constraints = PoolConstraints::new(1, settings.pool_size.max(1) as usize).ok_or_else(|| {
        StoreError::Connectivity(format!("invalid mysql pool size {}", settings.pool_size))
    })?;

    let mut init = vec![format!(
        "SET NAMES {} COLLATE {}",
        settings.charset, settings.collation
    )];
    if !settings.autocommit {
        init.push("SET autocommit = 0".to_string());
    }

    let opts: Opts = OptsBuilder::new()
        .ip_or_hostname(Some(settings.host.clone()))
        .tcp_port(settings.port)
        .user(Some(settings.user.clone()))
        .pass(Some(settings.password.clone()))
        .db_name(Some(settings.database.clone()))
        .init(init)
        .pool_opts(PoolOpts::default().with_constraints(constraints))
        .into();

    let pool = Pool::new(opts)?;
    info!(
        host = %settings.host,
        port = settings.port,
        database = %settings.database,
        "mysql pool ready"
    );
    Ok(pool)
}

pub(crate) fn fetch(
    conn: &mut PooledConn,
    sql: &str,
    params: &[Value],
) -> ::mysql::Result<(Arc<[String]>, Vec<Row>)> {
    let mut result = conn.exec_iter(sql, to_params(params))?;
    let (columns, binary) = {
        let set_columns = result.columns();
        let meta = set_columns.as_ref();
        let columns: Arc<[String]> = meta.iter().map(|c| c.name_str().into_owned()).collect();
        let binary: Vec<bool> = meta
            .iter()
            .map(|c| c.character_set() == BINARY_CHARSET)
            .collect();
        (columns, binary)
    };

    let mut rows = Vec::new();
    for row in result.by_ref() {
        let values = row?
            .unwrap_raw()
            .into_iter()
            .zip(binary.iter())
            .map(|(v, is_binary)| from_mysql(v.unwrap_or(::mysql::Value::NULL), *is_binary))
            .collect();
        rows.push(Row::new(Arc::clone(&columns), values));
    }
    Ok((columns, rows))
}

pub(crate) fn mutate(
    conn: &mut PooledConn,
    sql: &str,
    params: &[Value],
    commit: bool,
) -> ::mysql::Result<(u64, Option<i64>)> {
    conn.exec_drop(sql, to_params(params))?;
    let affected = conn.affected_rows();
    let last_id = i64::try_from(conn.last_insert_id()).ok().filter(|id| *id > 0);
    if commit {
        conn.query_drop("COMMIT")?;
    }
    Ok((affected, last_id))
}

pub(crate) fn control(conn: &mut PooledConn, sql: &str) -> ::mysql::Result<()> {
    conn.query_drop(sql)
}

fn to_params(params: &[Value]) -> Params {
    if params.is_empty() {
        return Params::Empty;
    }
    Params::Positional(params.iter().map(to_mysql).collect())
}

fn to_mysql(value: &Value) -> ::mysql::Value {
    match value {
        Value::Null => ::mysql::Value::NULL,
        Value::Integer(i) => ::mysql::Value::Int(*i),
        Value::Real(f) => ::mysql::Value::Double(*f),
        Value::Text(s) => ::mysql::Value::Bytes(s.as_bytes().to_vec()),
        Value::Blob(b) => ::mysql::Value::Bytes(b.clone()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn from_mysql(value: ::mysql::Value, binary: bool) -> Value {
    match value {
        ::mysql::Value::NULL => Value::Null,
        ::mysql::Value::Bytes(bytes) if binary => Value::Blob(bytes),
        ::mysql::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Blob(e.into_bytes()),
        },
        ::mysql::Value::Int(i) => Value::Integer(i),
        ::mysql::Value::UInt(u) => i64::try_from(u).map_or(Value::Real(u as f64), Value::Integer),
        ::mysql::Value::Float(f) => Value::Real(f64::from(f)),
        ::mysql::Value::Double(f) => Value::Real(f),
        ::mysql::Value::Date(year, month, day, 0, 0, 0, 0) => {
            Value::Text(format!("{year:04}-{month:02}-{day:02}"))
        }
        ::mysql::Value::Date(year, month, day, hour, minute, second, _micros) => {
            Value::Text(format!(
                "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
            ))
        }
        ::mysql::Value::Time(negative, days, hours, minutes, seconds, _micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = u64::from(days) * 24 + u64::from(hours);
            Value::Text(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}"))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
