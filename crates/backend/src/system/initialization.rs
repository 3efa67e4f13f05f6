use anyhow::Result;
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult, Statement, Value};

const DEMO_STATES: &[(&str, &str)] = &[
    ("CA", "California"),
    ("NY", "New York"),
    ("TX", "Texas"),
    ("WA", "Washington"),
];
const DEMO_PRODUCTS: &[&str] = &["Bike", "Gloves", "Helmet", "Jersey"];
const DEMO_SELLERS: &[(&str, &str)] = &[("Jane", "Doe"), ("John", "Smith"), ("Ana", "Lima")];
const DEMO_STORES: &[&str] = &["Store A", "Store B", "Store C"];

/// Fill the sales tables with a small two-year demo dataset when they are empty
pub async fn seed_demo_sales_if_empty<C: ConnectionTrait>(conn: &C) -> Result<()> {
    #[derive(Debug, FromQueryResult)]
    struct Count {
        total: i64,
    }

    let stmt = Statement::from_string(
        DatabaseBackend::Sqlite,
        "SELECT COUNT(*) AS total FROM d402_sales_order".to_string(),
    );
    let existing = Count::find_by_statement(stmt)
        .one(conn)
        .await?
        .map(|c| c.total)
        .unwrap_or(0);

    if existing > 0 {
        tracing::info!("Sales tables already hold {} orders, skipping demo seed", existing);
        return Ok(());
    }

    tracing::info!("Seeding demo sales data");

    for (idx, (code, name)) in DEMO_STATES.iter().enumerate() {
        insert_state(conn, idx as i64 + 1, code, name).await?;
    }
    for (idx, name) in DEMO_PRODUCTS.iter().enumerate() {
        insert_product(conn, idx as i64 + 1, name).await?;
    }
    for (idx, (first, last)) in DEMO_SELLERS.iter().enumerate() {
        insert_sales_person(conn, idx as i64 + 1, first, last).await?;
    }
    for (idx, name) in DEMO_STORES.iter().enumerate() {
        insert_store(conn, idx as i64 + 1, name).await?;
    }

    let mut order_id = 0_i64;
    for month in 0..24_i64 {
        let year = 2023 + month / 12;
        let month_of_year = month % 12 + 1;
        for state in 0..DEMO_STATES.len() as i64 {
            order_id += 1;
            let day = (state * 7) % 28 + 1;
            let date = format!("{:04}-{:02}-{:02}", year, month_of_year, day);
            // Every fourth order has no salesperson / no store
            let seller = Some((month + state) % 4 + 1).filter(|id| *id <= 3);
            let store = Some((month + 2 * state) % 4 + 1).filter(|id| *id <= 3);
            let first_product = (month + state) % 4 + 1;
            let second_product = (month + state + 1) % 4 + 1;
            let lines = [
                (first_product, 100.0 + 10.0 * month as f64 + 5.0 * state as f64),
                (second_product, 25.0 + 2.5 * state as f64),
            ];
            insert_order(conn, order_id, &date, state + 1, seller, store, &lines).await?;
        }
    }

    tracing::info!("Demo sales data seeded: {} orders", order_id);
    Ok(())
}

async fn execute<C: ConnectionTrait>(
    conn: &C,
    sql: &str,
    values: Vec<Value>,
) -> Result<(), sea_orm::DbErr> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        values,
    ))
    .await?;
    Ok(())
}

pub(crate) async fn insert_state<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    code: &str,
    name: &str,
) -> Result<(), sea_orm::DbErr> {
    execute(
        conn,
        "INSERT INTO d402_state_province (id, code, name, country_code) VALUES (?, ?, ?, 'US')",
        vec![id.into(), code.into(), name.into()],
    )
    .await
}

pub(crate) async fn insert_product<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    name: &str,
) -> Result<(), sea_orm::DbErr> {
    execute(
        conn,
        "INSERT INTO d402_product (id, name) VALUES (?, ?)",
        vec![id.into(), name.into()],
    )
    .await
}

pub(crate) async fn insert_sales_person<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    first_name: &str,
    last_name: &str,
) -> Result<(), sea_orm::DbErr> {
    execute(
        conn,
        "INSERT INTO d402_sales_person (id, first_name, last_name) VALUES (?, ?, ?)",
        vec![id.into(), first_name.into(), last_name.into()],
    )
    .await
}

pub(crate) async fn insert_store<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    name: &str,
) -> Result<(), sea_orm::DbErr> {
    execute(
        conn,
        "INSERT INTO d402_store (id, name) VALUES (?, ?)",
        vec![id.into(), name.into()],
    )
    .await
}

/// Insert an order header and its product lines `(product_id, line_total)`
pub(crate) async fn insert_order<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    order_date: &str,
    ship_state_id: i64,
    sales_person_id: Option<i64>,
    store_id: Option<i64>,
    lines: &[(i64, f64)],
) -> Result<(), sea_orm::DbErr> {
    execute(
        conn,
        "INSERT INTO d402_sales_order (id, order_date, ship_state_id, sales_person_id, store_id) \
         VALUES (?, ?, ?, ?, ?)",
        vec![
            id.into(),
            order_date.into(),
            ship_state_id.into(),
            sales_person_id.into(),
            store_id.into(),
        ],
    )
    .await?;

    for (product_id, line_total) in lines {
        execute(
            conn,
            "INSERT INTO d402_sales_order_detail (order_id, product_id, line_total) VALUES (?, ?, ?)",
            vec![id.into(), (*product_id).into(), (*line_total).into()],
        )
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::memory_connection;

    #[tokio::test]
    async fn test_seed_runs_once() {
        let conn = memory_connection().await;
        seed_demo_sales_if_empty(&conn).await.unwrap();
        seed_demo_sales_if_empty(&conn).await.unwrap();

        #[derive(Debug, FromQueryResult)]
        struct Count {
            total: i64,
        }
        let stmt = Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) AS total FROM d402_sales_order".to_string(),
        );
        let count = Count::find_by_statement(stmt).one(&conn).await.unwrap().unwrap();
        assert_eq!(count.total, 24 * DEMO_STATES.len() as i64);
    }
}
